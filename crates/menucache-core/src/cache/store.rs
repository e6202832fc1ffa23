use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::CacheError;
use crate::models::MenuCollection;

use super::StorageBackend;

/// Storage key for the persisted menu collection
pub const MENU_ITEMS_KEY: &str = "menu_items";

/// Durable mirror of the last-known-good menu.
#[derive(Clone)]
pub struct LocalMenuStore {
    backend: Arc<dyn StorageBackend>,
}

impl LocalMenuStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Load the persisted menu, or an empty one if there is none or it cannot
    /// be read.
    pub async fn load(&self) -> MenuCollection {
        match self.try_load().await {
            Ok(Some(menu)) => {
                debug!(count = menu.len(), "Loaded cached menu");
                menu
            }
            Ok(None) => {
                debug!("No cached menu");
                MenuCollection::empty()
            }
            Err(e) => {
                warn!(error = %e, "Failed to load cached menu, treating as empty");
                MenuCollection::empty()
            }
        }
    }

    async fn try_load(&self) -> Result<Option<MenuCollection>, CacheError> {
        match self.backend.read(MENU_ITEMS_KEY).await? {
            Some(contents) => MenuCollection::from_json(&contents).map(Some),
            None => Ok(None),
        }
    }

    /// Persist `items`. Returns whether the write landed; failures are
    /// logged, never propagated.
    pub async fn save(&self, items: &MenuCollection) -> bool {
        match self.try_save(items).await {
            Ok(()) => {
                debug!(count = items.len(), "Cached menu written");
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to write menu cache");
                false
            }
        }
    }

    async fn try_save(&self, items: &MenuCollection) -> Result<(), CacheError> {
        let contents = items.to_json()?;
        self.backend.write(MENU_ITEMS_KEY, contents).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{FileStorage, MemoryStorage};
    use crate::models::{sample_menu, MenuItem};

    fn store_with(storage: MemoryStorage) -> (LocalMenuStore, Arc<MemoryStorage>) {
        let storage = Arc::new(storage);
        (LocalMenuStore::new(storage.clone()), storage)
    }

    #[tokio::test]
    async fn test_load_empty_when_nothing_written() {
        let (store, _) = store_with(MemoryStorage::new());
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_load_returns_last_saved() {
        let (store, _) = store_with(MemoryStorage::new());
        let menu = sample_menu();
        assert!(store.save(&menu).await);
        assert_eq!(store.load().await, menu);
    }

    #[tokio::test]
    async fn test_corrupt_payload_loads_empty() {
        let (store, _) = store_with(MemoryStorage::with_entry(MENU_ITEMS_KEY, "{not json"));
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_payload_loads_empty() {
        let dupes = r#"[{"id":"1","name":"A","price":1},{"id":"1","name":"B","price":2}]"#;
        let (store, _) = store_with(MemoryStorage::with_entry(MENU_ITEMS_KEY, dupes));
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_save_is_idempotent() {
        let (store, storage) = store_with(MemoryStorage::new());
        let menu = sample_menu();

        assert!(store.save(&menu).await);
        let first = storage.raw(MENU_ITEMS_KEY);
        assert!(store.save(&menu.clone()).await);
        assert_eq!(storage.raw(MENU_ITEMS_KEY), first);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_previous_value() {
        let (store, storage) = store_with(MemoryStorage::new());
        let original = MenuCollection::new(vec![MenuItem::new("1", "Soup", 6.0)]);
        assert!(store.save(&original).await);

        storage.set_fail_writes(true);
        assert!(!store.save(&sample_menu()).await);
        assert_eq!(store.load().await, original);
    }

    #[tokio::test]
    async fn test_file_backed_store_survives_reopen() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let menu = sample_menu();
        {
            let storage = FileStorage::new(dir.path().to_path_buf()).expect("create storage");
            let store = LocalMenuStore::new(Arc::new(storage));
            assert!(store.save(&menu).await);
        }

        let storage = FileStorage::new(dir.path().to_path_buf()).expect("reopen storage");
        let store = LocalMenuStore::new(Arc::new(storage));
        assert_eq!(store.load().await, menu);
    }
}
