//! Client-side favorites overlay. Membership only; never sent to the store.

use std::collections::BTreeSet;
use std::sync::Arc;

use domains::{LocalStorage, Result};

/// Local storage key holding the JSON array of favorited post ids.
pub const FAVORITES_KEY: &str = "ultragol.favorites";

pub struct Favorites {
    storage: Arc<dyn LocalStorage>,
    ids: BTreeSet<String>,
}

impl Favorites {
    /// Reads the persisted set. Unreadable or corrupt storage starts empty.
    pub async fn load(storage: Arc<dyn LocalStorage>) -> Self {
        let ids = match storage.get_item(FAVORITES_KEY).await {
            Ok(Some(raw)) => serde_json::from_str::<BTreeSet<String>>(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "ignoring corrupt favorites");
                BTreeSet::new()
            }),
            Ok(None) => BTreeSet::new(),
            Err(e) => {
                tracing::warn!(error = %e, "could not read favorites");
                BTreeSet::new()
            }
        };
        tracing::debug!(count = ids.len(), "favorites loaded");
        Self { storage, ids }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn ids(&self) -> &BTreeSet<String> {
        &self.ids
    }

    /// Flips membership of `id` and persists the whole set. Returns whether
    /// the post is now a favorite. On a failed write the set is left as it
    /// was.
    pub async fn toggle(&mut self, id: &str) -> Result<bool> {
        let now_favorite = if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        };

        if let Err(e) = self.persist().await {
            if now_favorite {
                self.ids.remove(id);
            } else {
                self.ids.insert(id.to_string());
            }
            return Err(e);
        }
        Ok(now_favorite)
    }

    async fn persist(&self) -> Result<()> {
        let raw = serde_json::to_string(&self.ids)?;
        self.storage.set_item(FAVORITES_KEY, &raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{AppError, MockLocalStorage};
    use storage_adapters::MemoryLocalStorage;

    #[tokio::test]
    async fn toggling_twice_restores_membership_and_storage() {
        let storage = Arc::new(MemoryLocalStorage::new());
        storage.set_item(FAVORITES_KEY, "[\"a\"]").await.unwrap();

        let mut favorites = Favorites::load(storage.clone()).await;
        assert!(favorites.contains("a"));

        assert!(favorites.toggle("b").await.unwrap());
        assert_eq!(
            storage.get_item(FAVORITES_KEY).await.unwrap().as_deref(),
            Some("[\"a\",\"b\"]")
        );

        assert!(!favorites.toggle("b").await.unwrap());
        assert!(!favorites.contains("b"));
        assert_eq!(
            storage.get_item(FAVORITES_KEY).await.unwrap().as_deref(),
            Some("[\"a\"]")
        );
    }

    #[tokio::test]
    async fn corrupt_storage_starts_empty() {
        let storage = Arc::new(MemoryLocalStorage::new());
        storage.set_item(FAVORITES_KEY, "{oops").await.unwrap();
        let favorites = Favorites::load(storage).await;
        assert!(favorites.ids().is_empty());
    }

    #[tokio::test]
    async fn failed_write_rolls_back() {
        let mut storage = MockLocalStorage::new();
        storage.expect_get_item().returning(|_| Ok(None));
        storage
            .expect_set_item()
            .returning(|_, _| Err(AppError::Unavailable("disk full".into())));

        let mut favorites = Favorites::load(Arc::new(storage)).await;
        assert!(favorites.toggle("a").await.is_err());
        assert!(!favorites.contains("a"));
    }
}
