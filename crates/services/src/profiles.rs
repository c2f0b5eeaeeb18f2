//! User profile overrides, merged over what the identity provider reports.

use domains::{to_fields, validate_link, Author, AppError, DocPath, DocumentStore, Identity, Platform, Result, UserProfile};

const MAX_DISPLAY_NAME_CHARS: usize = 50;
const ANONYMOUS: &str = "Anonymous";

/// The stored profile of `user_id`; missing or malformed profiles read as
/// empty.
pub async fn load_profile(store: &dyn DocumentStore, user_id: &str) -> Result<UserProfile> {
    let Some(doc) = store.get(&DocPath::profile(user_id)).await? else {
        return Ok(UserProfile::default());
    };
    match serde_json::from_value(serde_json::Value::Object(doc.fields)) {
        Ok(profile) => Ok(profile),
        Err(e) => {
            tracing::warn!(user_id, error = %e, "ignoring malformed profile");
            Ok(UserProfile::default())
        }
    }
}

/// Saves the given overrides, leaving fields that are `None` untouched.
pub async fn save_profile(store: &dyn DocumentStore, user_id: &str, profile: &UserProfile) -> Result<()> {
    let mut cleaned = UserProfile::default();

    if let Some(name) = profile.display_name.as_deref().map(str::trim) {
        if name.is_empty() || name.chars().count() > MAX_DISPLAY_NAME_CHARS {
            return Err(AppError::validation(format!(
                "display names must be 1 to {MAX_DISPLAY_NAME_CHARS} characters"
            )));
        }
        cleaned.display_name = Some(name.to_string());
    }
    if let Some(url) = profile.avatar_url.as_deref().map(str::trim) {
        validate_link(Platform::Other, url)
            .map_err(|_| AppError::validation("the avatar must be an http(s) URL"))?;
        cleaned.avatar_url = Some(url.to_string());
    }

    store
        .set(&DocPath::profile(user_id), to_fields(&cleaned)?, true)
        .await?;
    tracing::info!(user_id, "profile updated");
    Ok(())
}

/// Name and avatar to stamp on content: profile first, then identity.
pub fn effective_author(identity: &Identity, profile: &UserProfile) -> Author {
    let name = profile
        .display_name
        .clone()
        .or_else(|| identity.display_name.clone())
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| ANONYMOUS.to_string());

    Author {
        id: identity.uid.clone(),
        name,
        avatar_url: profile.avatar_url.clone().or_else(|| identity.photo_url.clone()),
    }
}
