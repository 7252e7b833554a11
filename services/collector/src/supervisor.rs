//! Periodic restart of stopped watchers.
//!
//! Ported from `original_source/collector/collector.go`'s `CreateWatchers`
//! and `RestartWatchers`, generalized to async tasks. The supervisor owns
//! exactly one watcher per source id, built once at startup; duplicate
//! ids are rejected there, not here.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use seismo_core::{is_zero_time, Watcher, WatcherConfig, WatcherState};
use seismo_store::StoreAdapter;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::factory::{build_watcher, BuildWatcherError};

/// Builds one watcher per entry in `configs`, keyed by its own id.
///
/// Mirrors `CreateWatchers`: the config map's own keys are ignored in
/// favor of each [`WatcherConfig::id`], and a duplicate id is an error —
/// unreachable in practice once [`crate::config::load_config`] has
/// already checked key/id agreement, but checked again here so this
/// function stays correct if ever called directly with hand-built
/// configs.
pub fn create_watchers(
    configs: impl IntoIterator<Item = WatcherConfig>,
) -> Result<HashMap<String, Arc<dyn Watcher>>, CreateWatchersError> {
    let mut watchers = HashMap::new();
    for config in configs {
        let watcher = build_watcher(config)?;
        let id = watcher.config().id.clone();
        if watchers.insert(id.clone(), watcher).is_some() {
            return Err(CreateWatchersError::DuplicateId(id));
        }
    }
    Ok(watchers)
}

#[derive(Debug, thiserror::Error)]
pub enum CreateWatchersError {
    #[error(transparent)]
    Build(#[from] BuildWatcherError),
    #[error("createWatchers: duplicated watcher id in config: {0:?}")]
    DuplicateId(String),
}

/// Pushes one freshly-started stream per currently-`Stopped` watcher onto
/// `watch_pipes`. Errors querying the store or starting a watcher are
/// logged and that watcher is simply retried on the next tick.
pub async fn restart_watchers(
    watchers: &HashMap<String, Arc<dyn Watcher>>,
    store: &dyn StoreAdapter,
    cancel: &CancellationToken,
    watch_pipes: &mpsc::Sender<mpsc::Receiver<seismo_core::Message>>,
) {
    for (id, watcher) in watchers {
        if watcher.state_info().await != WatcherState::Stopped {
            continue;
        }

        let mut from = match store.get_last_time(id).await {
            Ok(t) => t,
            Err(err) => {
                tracing::warn!(watcher = %id, error = %err, "restart_watchers: get_last_time failed, retrying next tick");
                continue;
            }
        };
        if is_zero_time(from) {
            from = Utc::now();
        }

        let stream = match watcher.start_watch(cancel.clone(), from).await {
            Ok(stream) => stream,
            Err(err) => {
                tracing::warn!(watcher = %id, error = %err, "restart_watchers: start_watch failed, retrying next tick");
                continue;
            }
        };

        if watch_pipes.send(stream).await.is_err() {
            tracing::debug!(watcher = %id, "restart_watchers: merger pipe-of-pipes closed, stopping");
            return;
        }
    }
}

/// Runs `restart_watchers` on every tick of `maintain_period`, until
/// `cancel` fires.
pub async fn run(
    watchers: HashMap<String, Arc<dyn Watcher>>,
    store: Arc<dyn StoreAdapter>,
    maintain_period: Duration,
    watch_pipes: mpsc::Sender<mpsc::Receiver<seismo_core::Message>>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(maintain_period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                restart_watchers(&watchers, store.as_ref(), &cancel, &watch_pipes).await;
            }
            () = cancel.cancelled() => {
                tracing::debug!("supervisor: cancelled, exiting");
                return;
            }
        }
    }
}
