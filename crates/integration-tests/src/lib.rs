//! Shared fixtures for the cross-crate scenarios under `tests/`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use domains::{
    encode_timestamp, Fields, Identity, MatchPeriod, MockIdentityProvider, Platform,
    Quality, CREATED_AT,
};
use serde_json::Value;
use services::{ClientDeps, LifecycleConfig, StreamSubmission, UltragolClient};
use storage_adapters::MemoryLocalStorage;

pub fn submission(teams: &str, platform: Platform, link: &str) -> StreamSubmission {
    StreamSubmission {
        teams: teams.to_string(),
        platform,
        other_platform_label: String::new(),
        link: link.to_string(),
        match_period: MatchPeriod::FirstHalf,
        league: "laliga".into(),
        other_league_label: String::new(),
        quality: Quality::P1080,
        language: "es".into(),
        has_commentary: false,
        cover_image_url: None,
    }
}

/// Raw store fields of a valid post, as another client would have written it.
pub fn stream_fields(teams: &str, created_at: DateTime<Utc>) -> Fields {
    let mut fields = Fields::new();
    fields.insert("teams".into(), Value::from(teams));
    fields.insert("platform".into(), Value::from("youtube"));
    fields.insert("link".into(), Value::from("https://youtu.be/live"));
    fields.insert("league".into(), Value::from("premier"));
    fields.insert("quality".into(), Value::from("720p"));
    fields.insert("matchPeriod".into(), Value::from("second-half"));
    fields.insert("authorId".into(), Value::from("seed"));
    fields.insert(CREATED_AT.into(), Value::String(encode_timestamp(created_at)));
    fields
}

pub fn identity(uid: &str, name: &str) -> Identity {
    Identity {
        uid: uid.to_string(),
        display_name: Some(name.to_string()),
        photo_url: None,
    }
}

/// An identity provider that reports `identity` as already signed in.
pub fn signed_in_as(identity: Identity) -> MockIdentityProvider {
    let mut provider = MockIdentityProvider::new();
    provider
        .expect_current()
        .returning(move || Some(identity.clone()));
    provider
}

pub fn signed_out() -> MockIdentityProvider {
    let mut provider = MockIdentityProvider::new();
    provider.expect_current().returning(|| None);
    provider
}

/// Starts a client on `store` with fresh local storage and the wall clock.
pub async fn client_on(
    store: Arc<dyn domains::DocumentStore>,
    provider: MockIdentityProvider,
) -> Arc<UltragolClient> {
    UltragolClient::start(ClientDeps {
        store,
        storage: Arc::new(MemoryLocalStorage::new()),
        identity: Arc::new(provider),
        clock: Arc::new(domains::SystemClock),
        lifecycle: LifecycleConfig::default(),
    })
    .await
    .expect("client starts")
}
