use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::api::MenuSource;
use crate::cache::LocalMenuStore;
use crate::connectivity::{ConnectivityMonitor, ListenerId};
use crate::error::CacheError;
use crate::models::MenuCollection;
use crate::view::MenuView;

use super::{CacheEvent, SyncCoordinator};

/// Handle to a running menu cache.
///
/// Owns the event-loop task that drives the [`SyncCoordinator`]. UIs read
/// the current [`MenuView`] with `view` or follow changes with `subscribe`.
pub struct MenuCache {
    events: mpsc::UnboundedSender<CacheEvent>,
    view: watch::Receiver<MenuView>,
    monitor: ConnectivityMonitor,
    listener: ListenerId,
    task: JoinHandle<()>,
}

impl MenuCache {
    /// Load the local store, seed the menu and start reacting to `monitor`.
    ///
    /// `remote` is the menu source; with `None` the cached menu (or the
    /// bundled sample) stands in for it.
    pub async fn start(
        monitor: ConnectivityMonitor,
        store: LocalMenuStore,
        remote: Option<Arc<dyn MenuSource>>,
    ) -> Self {
        let (events, rx) = mpsc::unbounded_channel();

        // Subscribe before reading the status so no transition slips through
        let tx = events.clone();
        let listener = monitor.on_change(move |status| {
            if tx.send(CacheEvent::Connectivity(status)).is_err() {
                debug!(?status, "Menu cache stopped, dropping connectivity change");
            }
        });

        let mut coordinator =
            SyncCoordinator::new(remote, store, monitor.current().status, events.clone());
        coordinator.start().await;

        let (view_tx, view) = watch::channel(coordinator.view());
        let task = tokio::spawn(run(coordinator, rx, view_tx));

        Self {
            events,
            view,
            monitor,
            listener,
            task,
        }
    }

    /// Snapshot of the current view.
    pub fn view(&self) -> MenuView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MenuView> {
        self.view.clone()
    }

    /// Retry reconciliation now. Ignored while offline or while a fetch is
    /// already running.
    pub fn refresh(&self) {
        self.send(CacheEvent::Refresh);
    }

    /// Save an edited menu through the remote source and, once it is
    /// accepted, make it the authoritative collection.
    pub async fn save_menu_items(&self, items: MenuCollection) -> Result<(), CacheError> {
        let (reply, response) = oneshot::channel();
        self.send(CacheEvent::Save { items, reply });
        response.await.unwrap_or_else(|_| {
            Err(CacheError::RemoteUnavailable("menu cache stopped".to_string()))
        })
    }

    /// Stop listening for connectivity changes and wait for the event loop
    /// to finish.
    pub async fn shutdown(mut self) {
        self.monitor.unsubscribe(self.listener);
        self.send(CacheEvent::Shutdown);
        if let Err(e) = (&mut self.task).await {
            error!(error = %e, "Menu cache task failed");
        }
    }

    fn send(&self, event: CacheEvent) {
        if self.events.send(event).is_err() {
            error!("Menu cache event loop is not running");
        }
    }
}

impl Drop for MenuCache {
    fn drop(&mut self) {
        self.monitor.unsubscribe(self.listener);
        // Already closed after `shutdown`
        let _ = self.events.send(CacheEvent::Shutdown);
    }
}

async fn run(
    mut coordinator: SyncCoordinator,
    mut rx: mpsc::UnboundedReceiver<CacheEvent>,
    view_tx: watch::Sender<MenuView>,
) {
    info!("Menu cache event loop started");
    loop {
        let event = tokio::select! {
            event = rx.recv() => event,
            _ = view_tx.closed() => {
                debug!("Every menu view was dropped");
                None
            }
        };
        let Some(event) = event else { break };
        if matches!(event, CacheEvent::Shutdown) {
            break;
        }
        coordinator.handle_event(event).await;

        let next = coordinator.view();
        view_tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
    info!("Menu cache event loop stopped");
}
