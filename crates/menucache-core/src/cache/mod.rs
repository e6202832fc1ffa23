//! Durable local mirror of the menu.
//!
//! `LocalMenuStore` persists the last-known-good `MenuCollection` so the menu
//! survives restarts and stays readable offline. It never fails outward: a
//! missing, unreadable or corrupt entry loads as an empty collection, and
//! failed writes are logged and swallowed.
//!
//! The bytes themselves live in a `StorageBackend`:
//! - `FileStorage`: one JSON file per key under the cache directory
//! - `MemoryStorage`: process-local, for tests and embedding

pub mod backend;
pub mod store;

pub use backend::{FileStorage, MemoryStorage, StorageBackend};
pub use store::LocalMenuStore;
