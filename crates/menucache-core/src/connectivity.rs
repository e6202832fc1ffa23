//! Connectivity monitor.
//!
//! The host environment tells the monitor when reachability changes by
//! calling [`ConnectivityMonitor::report`]. Listeners registered with
//! [`ConnectivityMonitor::on_change`] are called synchronously on every
//! transition. After an Offline→Online transition `just_reconnected` stays
//! true for a fixed window (3 seconds by default) and is then cleared by a
//! single debounced timer.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How long `just_reconnected` stays raised after coming back online.
pub const DEFAULT_RECONNECT_WINDOW: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub enum Connectivity {
    Online,
    Offline,
}

impl Connectivity {
    pub fn is_online(self) -> bool {
        self == Connectivity::Online
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityState {
    pub status: Connectivity,
    pub just_reconnected: bool,
}

/// Handle returned by `on_change`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(Connectivity) + Send + Sync>;

struct MonitorInner {
    state: ConnectivityState,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
    reset_timer: Option<JoinHandle<()>>,
    /// Bumped on every transition so a stale timer never clears a newer flag
    epoch: u64,
}

/// Cheap to clone; clones share state and listeners.
#[derive(Clone)]
pub struct ConnectivityMonitor {
    inner: Arc<Mutex<MonitorInner>>,
    reconnect_window: Duration,
}

impl ConnectivityMonitor {
    pub fn new(initial: Connectivity) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MonitorInner {
                state: ConnectivityState {
                    status: initial,
                    just_reconnected: false,
                },
                listeners: Vec::new(),
                next_listener: 0,
                reset_timer: None,
                epoch: 0,
            })),
            reconnect_window: DEFAULT_RECONNECT_WINDOW,
        }
    }

    pub fn with_reconnect_window(mut self, window: Duration) -> Self {
        self.reconnect_window = window;
        self
    }

    pub fn current(&self) -> ConnectivityState {
        self.lock().state
    }

    pub fn on_change<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(Connectivity) + Send + Sync + 'static,
    {
        let mut inner = self.lock();
        let id = ListenerId(inner.next_listener);
        inner.next_listener += 1;
        inner.listeners.push((id, Arc::new(listener)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut inner = self.lock();
        let before = inner.listeners.len();
        inner.listeners.retain(|(existing, _)| *existing != id);
        inner.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Record an environment reachability signal.
    ///
    /// Signals that repeat the current status are not transitions and are
    /// dropped. Must be called from within a tokio runtime so the reconnect
    /// timer can be scheduled.
    pub fn report(&self, status: Connectivity) {
        let listeners: Vec<Listener> = {
            let mut inner = self.lock();
            if inner.state.status == status {
                debug!(?status, "Connectivity unchanged");
                return;
            }

            inner.state.status = status;
            inner.epoch += 1;
            if let Some(timer) = inner.reset_timer.take() {
                timer.abort();
            }

            match status {
                Connectivity::Online => {
                    info!("Network online");
                    inner.state.just_reconnected = true;
                    inner.reset_timer = self.schedule_reset(inner.epoch);
                    if inner.reset_timer.is_none() {
                        inner.state.just_reconnected = false;
                    }
                }
                Connectivity::Offline => {
                    warn!("Network offline");
                    inner.state.just_reconnected = false;
                }
            }

            inner.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
        };

        // Called outside the lock so listeners may query the monitor
        for listener in listeners {
            listener(status);
        }
    }

    fn schedule_reset(&self, epoch: u64) -> Option<JoinHandle<()>> {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("No tokio runtime, cannot schedule reconnect window");
                return None;
            }
        };

        let inner = Arc::clone(&self.inner);
        let window = self.reconnect_window;
        Some(runtime.spawn(async move {
            tokio::time::sleep(window).await;
            let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);
            if inner.epoch == epoch {
                inner.state.just_reconnected = false;
                inner.reset_timer = None;
                debug!("Reconnect window elapsed");
            }
        }))
    }

    fn lock(&self) -> MutexGuard<'_, MonitorInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ConnectivityMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("ConnectivityMonitor")
            .field("state", &inner.state)
            .field("listeners", &inner.listeners.len())
            .field("reconnect_window", &self.reconnect_window)
            .finish()
    }
}
