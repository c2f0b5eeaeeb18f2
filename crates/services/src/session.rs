//! Glue between the identity provider and the rest of the client: who is
//! signed in, and under which name and avatar they post.

use std::sync::Arc;

use domains::{AppError, Author, DocumentStore, Identity, IdentityProvider, Result, UserProfile};
use tokio::sync::watch;

use crate::profiles::{effective_author, load_profile, save_profile};

pub struct Session {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
    author: watch::Sender<Option<Author>>,
}

impl Session {
    /// Picks up an existing sign-in, if the provider has one.
    pub async fn restore(provider: Arc<dyn IdentityProvider>, store: Arc<dyn DocumentStore>) -> Self {
        let (author, _) = watch::channel(None);
        let session = Self {
            provider,
            store,
            author,
        };
        if let Some(identity) = session.provider.current() {
            let author = session.resolve(&identity).await;
            session.author.send_replace(Some(author));
        }
        session
    }

    async fn resolve(&self, identity: &Identity) -> Author {
        let profile = load_profile(self.store.as_ref(), &identity.uid)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(user_id = %identity.uid, error = %e, "could not load profile");
                UserProfile::default()
            });
        effective_author(identity, &profile)
    }

    pub async fn sign_in(&self) -> Result<Author> {
        let identity = self.provider.sign_in().await?;
        let author = self.resolve(&identity).await;
        tracing::info!(user_id = %author.id, "signed in");
        self.author.send_replace(Some(author.clone()));
        Ok(author)
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.provider.sign_out().await?;
        self.author.send_replace(None);
        tracing::info!("signed out");
        Ok(())
    }

    pub fn author(&self) -> Option<Author> {
        self.author.borrow().clone()
    }

    pub fn require_author(&self) -> Result<Author> {
        self.author()
            .ok_or_else(|| AppError::Unauthorized("please sign in first".into()))
    }

    pub fn watch(&self) -> watch::Receiver<Option<Author>> {
        self.author.subscribe()
    }

    /// Saves profile overrides and re-derives the posting identity.
    pub async fn update_profile(&self, profile: &UserProfile) -> Result<Author> {
        let identity = self
            .provider
            .current()
            .ok_or_else(|| AppError::Unauthorized("please sign in first".into()))?;
        save_profile(self.store.as_ref(), &identity.uid, profile).await?;
        let author = self.resolve(&identity).await;
        self.author.send_replace(Some(author.clone()));
        Ok(author)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::MockIdentityProvider;
    use storage_adapters::MemoryDocumentStore;

    fn ana() -> Identity {
        Identity {
            uid: "u1".into(),
            display_name: Some("Ana".into()),
            photo_url: None,
        }
    }

    #[tokio::test]
    async fn sign_in_and_out_update_the_author() {
        let mut provider = MockIdentityProvider::new();
        provider.expect_current().returning(|| None);
        provider.expect_sign_in().returning(|| Ok(ana()));
        provider.expect_sign_out().returning(|| Ok(()));

        let session = Session::restore(Arc::new(provider), Arc::new(MemoryDocumentStore::new())).await;
        assert!(matches!(session.require_author(), Err(AppError::Unauthorized(_))));

        let author = session.sign_in().await.unwrap();
        assert_eq!(author.name, "Ana");
        assert_eq!(session.author(), Some(author));

        session.sign_out().await.unwrap();
        assert!(session.author().is_none());
    }

    #[tokio::test]
    async fn restore_applies_stored_profile() {
        let store = Arc::new(MemoryDocumentStore::new());
        save_profile(
            store.as_ref(),
            "u1",
            &UserProfile {
                display_name: Some("La Ana".into()),
                avatar_url: None,
            },
        )
        .await
        .unwrap();

        let mut provider = MockIdentityProvider::new();
        provider.expect_current().returning(|| Some(ana()));

        let session = Session::restore(Arc::new(provider), store).await;
        assert_eq!(session.require_author().unwrap().name, "La Ana");
    }
}
