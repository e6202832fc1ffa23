use futures::future::BoxFuture;

use crate::error::CacheError;
use crate::models::MenuCollection;

/// Where the authoritative menu lives when the network is reachable.
///
/// Both operations fail with `CacheError::RemoteUnavailable` on network or
/// parse failure. Implementations must not retry on their own; the
/// coordinator decides when to try again.
pub trait MenuSource: Send + Sync {
    fn fetch_menu_items(&self) -> BoxFuture<'_, Result<MenuCollection, CacheError>>;

    fn save_menu_items<'a>(
        &'a self,
        items: &'a MenuCollection,
    ) -> BoxFuture<'a, Result<(), CacheError>>;
}
