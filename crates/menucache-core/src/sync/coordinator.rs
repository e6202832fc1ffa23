//! The cache state machine.
//!
//! States are `{Remote, Cache} × {Idle, Syncing, Failed}`. The coordinator
//! starts on `Remote, Idle`, seeded either by an initial fetch or, when no
//! remote source is configured, by whatever is cached (falling back to the
//! bundled sample menu).
//!
//! - Offline: the active collection becomes the cached one.
//! - Online after Offline: status `Syncing`, one fetch. Success replaces the
//!   remote collection, writes it through and switches back to `Remote`;
//!   failure leaves `Cache` active and marks `Failed`. Nothing retries until
//!   the next reconnect or an explicit refresh.
//! - Every change to the authoritative collection is written to the local
//!   store before the view is republished.
//!
//! At most one fetch is in flight. Triggers that arrive meanwhile are dropped,
//! and a fetch result is discarded if a newer change was applied after the
//! fetch started.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::api::MenuSource;
use crate::cache::LocalMenuStore;
use crate::connectivity::Connectivity;
use crate::error::CacheError;
use crate::models::{sample_menu, MenuCollection};
use crate::view::MenuView;

use super::{CacheEvent, DataSource, FetchTicket, SyncStatus};

pub struct SyncCoordinator {
    remote: Option<Arc<dyn MenuSource>>,
    store: LocalMenuStore,
    events: mpsc::UnboundedSender<CacheEvent>,

    remote_items: Option<MenuCollection>,
    /// Mirror of what the local store last accepted
    cached_items: MenuCollection,

    source: DataSource,
    status: SyncStatus,
    connectivity: Connectivity,
    loading: bool,
    error: Option<CacheError>,

    in_flight: Option<FetchTicket>,
    /// Incremented on every authoritative change
    revision: u64,
    last_synced_at: Option<DateTime<Utc>>,
}

impl SyncCoordinator {
    pub fn new(
        remote: Option<Arc<dyn MenuSource>>,
        store: LocalMenuStore,
        connectivity: Connectivity,
        events: mpsc::UnboundedSender<CacheEvent>,
    ) -> Self {
        Self {
            remote,
            store,
            events,
            remote_items: None,
            cached_items: MenuCollection::empty(),
            source: DataSource::Remote,
            status: SyncStatus::Idle,
            connectivity,
            loading: true,
            error: None,
            in_flight: None,
            revision: 0,
            last_synced_at: None,
        }
    }

    /// Cold start: read the local store, then seed the remote collection.
    pub async fn start(&mut self) {
        self.cached_items = self.store.load().await;
        info!(
            cached = self.cached_items.len(),
            online = self.connectivity.is_online(),
            "Menu cache starting"
        );

        if !self.connectivity.is_online() {
            info!("Starting offline, serving cached menu");
            self.source = DataSource::Cache;
            self.loading = false;
            return;
        }

        if self.remote.is_some() {
            // Cached items stay visible while the first fetch runs
            self.loading = self.cached_items.is_empty();
            self.begin_fetch(true).await;
        } else {
            let seed = self.local_seed();
            self.apply_authoritative(seed).await;
            self.loading = false;
        }
    }

    pub async fn handle_event(&mut self, event: CacheEvent) {
        match event {
            CacheEvent::Connectivity(status) => self.on_connectivity(status).await,
            CacheEvent::Refresh => self.refresh().await,
            CacheEvent::Save { items, reply } => self.save(items, reply).await,
            CacheEvent::FetchFinished { ticket, result } => {
                self.finish_fetch(ticket, result).await
            }
            CacheEvent::SaveFinished {
                items,
                result,
                reply,
            } => self.finish_save(items, result, reply).await,
            CacheEvent::Shutdown => {}
        }
    }

    async fn on_connectivity(&mut self, status: Connectivity) {
        let previous = std::mem::replace(&mut self.connectivity, status);
        if previous == status {
            return;
        }

        match status {
            Connectivity::Offline => {
                info!(cached = self.cached_items.len(), "Offline, switching to cached menu");
                self.source = DataSource::Cache;
                self.loading = false;
            }
            Connectivity::Online => {
                info!("Back online, reconciling menu");
                self.begin_fetch(false).await;
            }
        }
    }

    async fn refresh(&mut self) {
        if !self.connectivity.is_online() {
            debug!("Refresh ignored while offline");
            return;
        }
        self.begin_fetch(false).await;
    }

    async fn begin_fetch(&mut self, initial: bool) {
        if let Some(ticket) = self.in_flight {
            debug!(revision = ticket.revision, "Fetch already in flight, coalescing");
            return;
        }

        let ticket = FetchTicket {
            revision: self.revision,
            initial,
        };
        if !initial {
            self.status = SyncStatus::Syncing;
        }

        self.in_flight = Some(ticket);
        let events = self.events.clone();
        let remote = match &self.remote {
            Some(remote) => Arc::clone(remote),
            None => {
                // Queued so the syncing state is published before it settles
                let result = Ok(self.local_seed());
                if events
                    .send(CacheEvent::FetchFinished { ticket, result })
                    .is_err()
                {
                    debug!("Menu cache stopped before local resync");
                }
                return;
            }
        };

        tokio::spawn(async move {
            let result = remote.fetch_menu_items().await;
            if events
                .send(CacheEvent::FetchFinished { ticket, result })
                .is_err()
            {
                debug!("Menu cache stopped before fetch completed");
            }
        });
    }

    async fn finish_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<MenuCollection, CacheError>,
    ) {
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
        }

        match result {
            Ok(items) => {
                if ticket.revision < self.revision {
                    info!(
                        started_at = ticket.revision,
                        current = self.revision,
                        "Discarding fetch superseded by a newer change"
                    );
                    self.status = SyncStatus::Idle;
                    self.loading = false;
                    return;
                }
                info!(count = items.len(), "Menu synced from remote");
                self.last_synced_at = Some(Utc::now());
                self.apply_authoritative(items).await;
                self.status = SyncStatus::Idle;
                self.loading = false;
                self.error = None;
            }
            Err(e) => {
                warn!(error = %e, initial = ticket.initial, "Menu fetch failed");
                self.status = SyncStatus::Failed;
                if self.remote_items.is_none() {
                    // Never had remote data: only the cache is left
                    self.source = DataSource::Cache;
                    self.loading = false;
                    if self.cached_items.is_empty() {
                        self.error = Some(e);
                    }
                }
            }
        }
    }

    async fn save(
        &mut self,
        items: MenuCollection,
        reply: oneshot::Sender<Result<(), CacheError>>,
    ) {
        if let Err(e) = items.validate() {
            warn!(error = %e, "Rejecting invalid menu save");
            let _ = reply.send(Err(e));
            return;
        }

        let remote = match &self.remote {
            Some(remote) => Arc::clone(remote),
            None => {
                self.finish_save(items, Ok(()), reply).await;
                return;
            }
        };

        let events = self.events.clone();
        tokio::spawn(async move {
            let result = remote.save_menu_items(&items).await;
            if events
                .send(CacheEvent::SaveFinished {
                    items,
                    result,
                    reply,
                })
                .is_err()
            {
                debug!("Menu cache stopped before save completed");
            }
        });
    }

    async fn finish_save(
        &mut self,
        items: MenuCollection,
        result: Result<(), CacheError>,
        reply: oneshot::Sender<Result<(), CacheError>>,
    ) {
        let outcome = match result {
            Ok(()) => {
                info!(count = items.len(), "Menu saved");
                self.apply_authoritative(items).await;
                self.loading = false;
                self.error = None;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Menu save failed");
                Err(e)
            }
        };
        if reply.send(outcome).is_err() {
            debug!("Save caller went away before the result");
        }
    }

    /// Make `items` the authoritative collection, writing it through first.
    async fn apply_authoritative(&mut self, items: MenuCollection) {
        self.revision += 1;
        if self.store.save(&items).await {
            self.cached_items = items.clone();
        }
        self.remote_items = Some(items);
        if self.connectivity.is_online() {
            self.source = DataSource::Remote;
        }
    }

    /// Stand-in for a fetch when no remote source is configured.
    fn local_seed(&self) -> MenuCollection {
        if let Some(items) = &self.remote_items {
            items.clone()
        } else if !self.cached_items.is_empty() {
            self.cached_items.clone()
        } else {
            sample_menu()
        }
    }

    fn active_items(&self) -> &MenuCollection {
        match (self.source, &self.remote_items) {
            (DataSource::Remote, Some(items)) => items,
            _ => &self.cached_items,
        }
    }

    pub fn view(&self) -> MenuView {
        MenuView {
            items: self.active_items().clone(),
            loading: self.loading,
            error: self.error.clone(),
            is_offline: !self.connectivity.is_online(),
            is_syncing: self.status == SyncStatus::Syncing,
            source: self.source,
            sync_status: self.status,
            last_synced_at: self.last_synced_at,
        }
    }

    pub fn source(&self) -> DataSource {
        self.source
    }

    pub fn status(&self) -> SyncStatus {
        self.status
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStorage;
    use crate::testing::{menu, ScriptedSource};

    fn coordinator(
        remote: Option<Arc<ScriptedSource>>,
        connectivity: Connectivity,
    ) -> (SyncCoordinator, mpsc::UnboundedReceiver<CacheEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let store = LocalMenuStore::new(Arc::new(MemoryStorage::new()));
        let remote = remote.map(|r| r as Arc<dyn MenuSource>);
        (SyncCoordinator::new(remote, store, connectivity, tx), rx)
    }

    #[tokio::test]
    async fn test_initial_fetch_keeps_idle_status() {
        let remote = Arc::new(ScriptedSource::new());
        remote.push_fetch(Ok(menu(&["1"])));
        let (mut coordinator, mut rx) = coordinator(Some(remote), Connectivity::Online);

        coordinator.start().await;
        assert_eq!(coordinator.source(), DataSource::Remote);
        assert_eq!(coordinator.status(), SyncStatus::Idle);
        assert!(coordinator.is_fetching());
        assert!(coordinator.view().loading);

        let event = rx.recv().await.expect("fetch completion");
        assert!(matches!(event, CacheEvent::FetchFinished { ticket, .. } if ticket.initial));
        coordinator.handle_event(event).await;
        assert!(!coordinator.is_fetching());
        assert_eq!(coordinator.view().items, menu(&["1"]));
    }

    #[tokio::test]
    async fn test_repeated_online_is_not_a_transition() {
        let remote = Arc::new(ScriptedSource::new());
        remote.push_fetch(Ok(menu(&["1"])));
        let (mut coordinator, mut rx) = coordinator(Some(remote.clone()), Connectivity::Online);
        coordinator.start().await;
        let done = rx.recv().await.expect("fetch completion");
        coordinator.handle_event(done).await;

        coordinator
            .handle_event(CacheEvent::Connectivity(Connectivity::Online))
            .await;
        assert_eq!(coordinator.status(), SyncStatus::Idle);
        assert_eq!(remote.fetch_calls(), 1);
    }

    #[tokio::test]
    async fn test_offline_event_switches_source() {
        let (mut coordinator, _rx) = coordinator(None, Connectivity::Online);
        coordinator.start().await;
        assert_eq!(coordinator.source(), DataSource::Remote);

        coordinator
            .handle_event(CacheEvent::Connectivity(Connectivity::Offline))
            .await;
        let view = coordinator.view();
        assert_eq!(coordinator.source(), DataSource::Cache);
        assert!(view.is_offline);
        assert_eq!(view.items, sample_menu());
    }

    #[tokio::test]
    async fn test_reconnect_without_remote_passes_through_syncing() {
        let (mut coordinator, mut rx) = coordinator(None, Connectivity::Offline);
        coordinator.start().await;
        assert!(coordinator.view().items.is_empty());

        coordinator
            .handle_event(CacheEvent::Connectivity(Connectivity::Online))
            .await;
        assert!(coordinator.view().is_syncing);
        assert!(coordinator.is_fetching());

        let event = rx.recv().await.expect("local resync");
        assert!(matches!(event, CacheEvent::FetchFinished { ticket, .. } if !ticket.initial));
        coordinator.handle_event(event).await;
        assert!(!coordinator.is_fetching());
        assert_eq!(coordinator.source(), DataSource::Remote);
        assert_eq!(coordinator.status(), SyncStatus::Idle);
        assert_eq!(coordinator.view().items, sample_menu());
    }
}
