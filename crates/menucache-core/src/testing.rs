//! Fakes shared by the cache tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::{watch, Semaphore};

use crate::api::MenuSource;
use crate::error::CacheError;
use crate::models::{MenuCollection, MenuItem};
use crate::view::MenuView;

/// A `MenuSource` that replays queued responses.
///
/// When gated, every fetch waits for `release_fetch` before answering.
#[derive(Default)]
pub struct ScriptedSource {
    fetches: Mutex<VecDeque<Result<MenuCollection, CacheError>>>,
    save_error: Mutex<Option<CacheError>>,
    saved: Mutex<Vec<MenuCollection>>,
    fetch_calls: AtomicUsize,
    gate: Option<Semaphore>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::default()
        }
    }

    pub fn push_fetch(&self, result: Result<MenuCollection, CacheError>) {
        self.fetches.lock().unwrap().push_back(result);
    }

    pub fn fail_saves_with(&self, error: CacheError) {
        *self.save_error.lock().unwrap() = Some(error);
    }

    pub fn release_fetch(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn saved(&self) -> Vec<MenuCollection> {
        self.saved.lock().unwrap().clone()
    }
}

impl MenuSource for ScriptedSource {
    fn fetch_menu_items(&self) -> BoxFuture<'_, Result<MenuCollection, CacheError>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        async move {
            if let Some(gate) = &self.gate {
                gate.acquire().await.expect("gate closed").forget();
            }
            self.fetches
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(CacheError::RemoteUnavailable("no scripted response".into())))
        }
        .boxed()
    }

    fn save_menu_items<'a>(
        &'a self,
        items: &'a MenuCollection,
    ) -> BoxFuture<'a, Result<(), CacheError>> {
        let result = match self.save_error.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => {
                self.saved.lock().unwrap().push(items.clone());
                Ok(())
            }
        };
        async move { result }.boxed()
    }
}

pub fn menu(ids: &[&str]) -> MenuCollection {
    ids.iter()
        .map(|id| MenuItem::new(*id, format!("Item {}", id), 5.0).with_stock(3))
        .collect()
}

pub fn offline() -> CacheError {
    CacheError::RemoteUnavailable("connection refused".into())
}

/// Wait until the published view satisfies `pred`.
pub async fn wait_for_view(
    rx: &mut watch::Receiver<MenuView>,
    pred: impl FnMut(&MenuView) -> bool,
) -> MenuView {
    let view = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(pred))
        .await
        .expect("timed out waiting for menu view")
        .expect("menu cache stopped");
    view.clone()
}
