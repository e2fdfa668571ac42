pub mod clock;
pub mod competition;
pub mod reconciler;
mod sse;
pub mod view;

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::sync::{RwLock, watch};

use crate::dao::competition_store::CompetitionStore;

pub use self::sse::SseHub;
use self::{
    clock::{Clock, SystemClock},
    view::{CompetitionView, ViewHandle},
};

pub type SharedState = Arc<AppState>;
pub const DEFAULT_MUTATION_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_SSE_CAPACITY: usize = 64;

/// Central application state: storage handle, loaded competition views and SSE hub.
pub struct AppState {
    store: RwLock<Option<Arc<dyn CompetitionStore>>>,
    sse: SseHub,
    views: DashMap<i64, ViewHandle>,
    degraded: watch::Sender<bool>,
    clock: Arc<dyn Clock>,
    mutation_timeout: Option<Duration>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new() -> SharedState {
        Self::with_settings(
            Arc::new(SystemClock),
            Some(DEFAULT_MUTATION_TIMEOUT),
            DEFAULT_SSE_CAPACITY,
        )
    }

    /// Construct the state with an explicit clock, mutation timeout and SSE capacity.
    pub fn with_settings(
        clock: Arc<dyn Clock>,
        mutation_timeout: Option<Duration>,
        sse_capacity: usize,
    ) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            store: RwLock::new(None),
            sse: SseHub::new(sse_capacity),
            views: DashMap::new(),
            degraded: degraded_tx,
            clock,
            mutation_timeout,
        })
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn store(&self) -> Option<Arc<dyn CompetitionStore>> {
        let guard = self.store.read().await;
        guard.as_ref().cloned()
    }

    /// Install a new store implementation and leave degraded mode.
    pub async fn install_store(&self, store: Arc<dyn CompetitionStore>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current store and enter degraded mode.
    pub async fn clear_store(&self) {
        {
            let mut guard = self.store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.store.read().await;
        guard.is_none()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.sse
    }

    /// Handle on a loaded competition view.
    pub fn view(&self, competition_id: i64) -> Option<ViewHandle> {
        self.views
            .get(&competition_id)
            .map(|entry| entry.value().clone())
    }

    /// Replace the view of a competition with a freshly loaded one.
    pub fn install_view(&self, view: CompetitionView) -> ViewHandle {
        let handle = ViewHandle::new(view, self.clock.clone(), self.mutation_timeout);
        self.views.insert(handle.competition_id(), handle.clone());
        handle
    }

    /// Number of loaded competition views.
    pub fn loaded_views(&self) -> usize {
        self.views.len()
    }

    fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }
}
