use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{competition_store::CompetitionStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy)]
struct Timing {
    initial_delay: Duration,
    max_delay: Duration,
    health_poll: Duration,
}

const DEFAULT_TIMING: Timing = Timing {
    initial_delay: INITIAL_DELAY,
    max_delay: MAX_DELAY,
    health_poll: HEALTH_POLL_INTERVAL,
};

/// Reconnect to the storage backend and keep the shared state in degraded mode when it is unavailable.
pub async fn run<F, Fut>(state: SharedState, connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn CompetitionStore>, StorageError>> + Send,
{
    supervise(state, connect, DEFAULT_TIMING).await
}

async fn supervise<F, Fut>(state: SharedState, mut connect: F, timing: Timing)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn CompetitionStore>, StorageError>> + Send,
{
    let mut delay = timing.initial_delay;

    loop {
        let store = match connect().await {
            Ok(store) => store,
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(timing.max_delay);
                continue;
            }
        };

        if let Err(err) = store.health_check().await {
            warn!(error = %err, "storage backend unreachable; staying in degraded mode");
            sleep(delay).await;
            delay = (delay * 2).min(timing.max_delay);
            continue;
        }

        state.install_store(store.clone()).await;
        info!("storage connection established; leaving degraded mode");
        delay = timing.initial_delay;

        loop {
            sleep(timing.health_poll).await;
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed; entering degraded mode");
                state.clear_store().await;
                break;
            }
        }

        sleep(delay).await;
        delay = (delay * 2).min(timing.max_delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::{
            competition_store::memory::{MemoryCompetitionStore, Operation},
            models::UserEntity,
        },
        state::AppState,
    };

    const FAST: Timing = Timing {
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(40),
        health_poll: Duration::from_millis(10),
    };

    fn store() -> MemoryCompetitionStore {
        MemoryCompetitionStore::new(UserEntity {
            id: Some(1),
            pk: None,
            username: "ana".into(),
            email: None,
        })
    }

    #[tokio::test]
    async fn degraded_mode_follows_backend_health() {
        let state = AppState::new();
        let store = store();
        let connect_store = store.clone();
        let supervisor = tokio::spawn(supervise(
            state.clone(),
            move || {
                let store = connect_store.clone();
                async move { Ok::<_, StorageError>(Arc::new(store) as Arc<dyn CompetitionStore>) }
            },
            FAST,
        ));

        let mut degraded = state.degraded_watcher();
        degraded.wait_for(|value| !*value).await.unwrap();
        assert!(state.store().await.is_some());

        store.fail(Operation::HealthCheck);
        degraded.wait_for(|value| *value).await.unwrap();
        assert!(state.store().await.is_none());

        store.recover(Operation::HealthCheck);
        degraded.wait_for(|value| !*value).await.unwrap();

        supervisor.abort();
    }

    #[tokio::test]
    async fn unreachable_backend_is_never_installed() {
        let state = AppState::new();
        let store = store();
        store.fail(Operation::HealthCheck);
        let connect_store = store.clone();
        let supervisor = tokio::spawn(supervise(
            state.clone(),
            move || {
                let store = connect_store.clone();
                async move { Ok::<_, StorageError>(Arc::new(store) as Arc<dyn CompetitionStore>) }
            },
            FAST,
        ));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(state.is_degraded().await);

        supervisor.abort();
    }
}
