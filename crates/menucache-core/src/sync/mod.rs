//! Synchronisation between the remote menu, the local store and the UI.
//!
//! The [`SyncCoordinator`](coordinator::SyncCoordinator) is the state machine
//! deciding which collection is active. It is owned by a single event-loop
//! task started by [`MenuCache::start`]; connectivity changes, fetch and save
//! completions and UI commands all arrive there as [`CacheEvent`]s, so no two
//! reactions ever run at the same time.

pub mod coordinator;
pub mod service;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::connectivity::Connectivity;
use crate::error::CacheError;
use crate::models::MenuCollection;

pub use coordinator::SyncCoordinator;
pub use service::MenuCache;

/// Which collection the coordinator currently treats as authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub enum DataSource {
    Remote,
    Cache,
}

/// Reconciliation activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub enum SyncStatus {
    Idle,
    Syncing,
    Failed,
}

/// Identifies one fetch. `revision` is the coordinator's revision when the
/// fetch started; a result is stale if anything was applied since.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub revision: u64,
    pub initial: bool,
}

/// Everything the event loop reacts to.
#[derive(Debug)]
pub enum CacheEvent {
    Connectivity(Connectivity),
    Refresh,
    Save {
        items: MenuCollection,
        reply: oneshot::Sender<Result<(), CacheError>>,
    },
    FetchFinished {
        ticket: FetchTicket,
        result: Result<MenuCollection, CacheError>,
    },
    SaveFinished {
        items: MenuCollection,
        result: Result<(), CacheError>,
        reply: oneshot::Sender<Result<(), CacheError>>,
    },
    Shutdown,
}
