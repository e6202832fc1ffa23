//! Offline-aware menu data cache.
//!
//! `menucache-core` keeps an authoritative in-memory copy of a restaurant
//! menu, mirrors it into durable local storage, watches connectivity
//! transitions and reconciles with the remote menu source when the network
//! comes back.
//!
//! - [`connectivity`]: `ConnectivityMonitor`, the online/offline signal
//! - [`cache`]: `LocalMenuStore` and its storage backends
//! - [`api`]: the `MenuSource` capability and its HTTP client
//! - [`sync`]: the coordinator state machine and the `MenuCache` service
//! - [`view`]: `MenuView`, the read-only projection handed to UIs

pub mod api;
pub mod cache;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod models;
pub mod sync;
pub mod utils;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiClient, ApiError, MenuSource};
pub use cache::{FileStorage, LocalMenuStore, MemoryStorage, StorageBackend};
pub use config::Config;
pub use connectivity::{Connectivity, ConnectivityMonitor, ConnectivityState, ListenerId};
pub use error::CacheError;
pub use models::{sample_menu, MenuCollection, MenuItem};
pub use sync::{DataSource, MenuCache, SyncStatus};
pub use view::MenuView;
