//! The watcher contract every source (pseudo, SEISHUB, ...) implements.
//!
//! Ported from `original_source/provider/watcher.go` and
//! `original_source/provider/watcher_conf.go`.

use crate::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// The stream a watcher emits messages on. A plain bounded `mpsc` channel;
/// the supervisor hands the receive side to the merger, and emission
/// blocks on whatever backpressure the merger's forwarder applies.
pub type MessageStream = mpsc::Receiver<Message>;

/// Which concrete watcher a [`WatcherConfig`] builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatcherVariant {
    Pseudo,
    Seishub,
}

/// Configuration for one watcher instance, as read from the collector config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatcherConfig {
    pub id: String,
    #[serde(rename = "t")]
    pub variant: WatcherVariant,
    #[serde(default)]
    pub conn_str: String,
    pub timeout: u64,
    pub check_period: u64,
}

impl WatcherConfig {
    pub fn default_pseudo(id: impl Into<String>) -> Self {
        WatcherConfig {
            id: id.into(),
            variant: WatcherVariant::Pseudo,
            conn_str: String::new(),
            timeout: 120,
            check_period: 2,
        }
    }
}

/// A watcher's externally observable lifecycle state.
///
/// Created `Stopped`; transitions to `Running` when `start_watch` succeeds,
/// and back to `Stopped` exactly when the emitted stream closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Stopped,
    Running,
}

/// Returned by `start_watch` when the watcher is already `Running`.
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
#[error("watcher is already running")]
pub struct AlreadyRunningError;

/// A source of seismic-event messages, resumable from a point in time.
///
/// Ported from `original_source/provider/watcher.go`'s `Watcher` interface.
/// `async_trait` is used (rather than a hand-rolled boxed-future trait)
/// because the collector stores a heterogeneous `HashMap<String, Arc<dyn
/// Watcher>>` and needs dynamic dispatch across the pseudo and SEISHUB
/// implementations.
#[async_trait::async_trait]
pub trait Watcher: Send + Sync {
    /// Begins emission of messages whose `focus_time` is `>= from` (best
    /// effort for SEISHUB; see its discovery algorithm). Fails with
    /// [`AlreadyRunningError`] if already `Running`. Cancelling `cancel`
    /// closes the returned stream and returns the watcher to `Stopped`.
    async fn start_watch(
        &self,
        cancel: CancellationToken,
        from: DateTime<Utc>,
    ) -> Result<MessageStream, StartWatchError>;

    async fn state_info(&self) -> WatcherState;

    fn config(&self) -> &WatcherConfig;
}

#[derive(Debug, thiserror::Error)]
pub enum StartWatchError {
    #[error(transparent)]
    AlreadyRunning(#[from] AlreadyRunningError),
    #[error("cannot start watching in the future: from={from}, now={now}")]
    FromInFuture {
        from: DateTime<Utc>,
        now: DateTime<Utc>,
    },
}
