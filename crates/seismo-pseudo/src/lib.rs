//! The pseudo watcher: a synthetic source for exercising the rest of the
//! pipeline without a real SEISHUB mirror.
//!
//! Ported from `original_source/provider/pseudo/hub.go`. FocusTime
//! semantics deliberately depart from the original: where the Go source
//! stamps every generated message with `time.Now().UTC()` and simply
//! ignores `from`, this implementation preserves the caller's requested
//! offset for the lifetime of the run (`now() - (start_time - from)`),
//! so a test resuming from a historical instant keeps observing
//! historical-looking timestamps instead of jumping to the present.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use seismo_core::{
    AlreadyRunningError, EventType, Message, MessageStream, Quality, StartWatchError, Watcher,
    WatcherConfig, WatcherState,
};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

const OUTPUT_BUFFER: usize = 16;
const LAT_BASE: f64 = 40.0;
const LAT_SPAN: f64 = 20.0;
const LONG_BASE: f64 = 70.0;
const LONG_SPAN: f64 = 30.0;
const MAGNITUDE_BASE: f64 = 0.1;
const MAGNITUDE_SPAN: f64 = 6.0;

/// Generates 1-3 synthetic messages every `CheckPeriod`, all sharing one
/// random event id, coordinates, and magnitude.
pub struct PseudoWatcher {
    config: WatcherConfig,
    state: std::sync::Arc<Mutex<WatcherState>>,
}

impl PseudoWatcher {
    pub fn new(config: WatcherConfig) -> Self {
        PseudoWatcher {
            config,
            state: std::sync::Arc::new(Mutex::new(WatcherState::Stopped)),
        }
    }
}

#[async_trait::async_trait]
impl Watcher for PseudoWatcher {
    async fn start_watch(
        &self,
        cancel: CancellationToken,
        from: DateTime<Utc>,
    ) -> Result<MessageStream, StartWatchError> {
        let now = Utc::now();
        if from > now {
            return Err(StartWatchError::FromInFuture { from, now });
        }

        {
            let mut state = self.state.lock().await;
            if *state == WatcherState::Running {
                return Err(StartWatchError::AlreadyRunning(AlreadyRunningError));
            }
            *state = WatcherState::Running;
        }

        let (tx, rx) = mpsc::channel(OUTPUT_BUFFER);
        let source_id = self.config.id.clone();
        let check_period = Duration::from_secs(self.config.check_period);
        let state = std::sync::Arc::clone(&self.state);
        let start_time = Utc::now();

        tokio::spawn(generate_messages(
            source_id,
            tx,
            check_period,
            start_time,
            from,
            cancel,
            state,
        ));

        Ok(rx)
    }

    async fn state_info(&self) -> WatcherState {
        *self.state.lock().await
    }

    fn config(&self) -> &WatcherConfig {
        &self.config
    }
}

async fn generate_messages(
    source_id: String,
    out: mpsc::Sender<Message>,
    check_period: Duration,
    start_time: DateTime<Utc>,
    from: DateTime<Utc>,
    cancel: CancellationToken,
    state: std::sync::Arc<Mutex<WatcherState>>,
) {
    let offset = start_time.signed_duration_since(from);

    'outer: loop {
        for msg in create_rand_msgs(&source_id, offset) {
            tokio::select! {
                res = out.send(msg) => {
                    if res.is_err() {
                        break 'outer;
                    }
                }
                _ = cancel.cancelled() => {
                    break 'outer;
                }
            }
        }

        tokio::select! {
            () = tokio::time::sleep(check_period) => {}
            _ = cancel.cancelled() => break 'outer,
        }
    }

    *state.lock().await = WatcherState::Stopped;
}

/// Builds 1-3 messages sharing one random event id, location, and
/// magnitude, each stamped `now() - offset`.
fn create_rand_msgs(source_id: &str, offset: chrono::Duration) -> Vec<Message> {
    let mut rng = rand::thread_rng();
    let count = rng.gen_range(1..=3);

    let event_id = uuid::Uuid::new_v4().to_string();
    let lat = rng.gen_range(LAT_BASE..(LAT_BASE + LAT_SPAN));
    let long = rng.gen_range(LONG_BASE..(LONG_BASE + LONG_SPAN));
    let magnitude = rng.gen_range(MAGNITUDE_BASE..(MAGNITUDE_BASE + MAGNITUDE_SPAN));

    (0..count)
        .map(|_| Message {
            source_id: source_id.to_owned(),
            event_id: event_id.clone(),
            focus_time: Utc::now() - offset,
            latitude: lat + lat * ((rng.gen::<f64>() - 0.5) / 100.0),
            longitude: long + long * ((rng.gen::<f64>() - 0.5) / 100.0),
            magnitude,
            event_type: rand_event_type(&mut rng),
            quality: rand_event_quality(&mut rng),
            link: String::new(),
        })
        .collect()
}

fn rand_event_type(rng: &mut impl Rng) -> EventType {
    match rng.gen_range(0..3) {
        0 => EventType::Unknown,
        1 => EventType::Earthquake,
        _ => EventType::QuarryBlast,
    }
}

fn rand_event_quality(rng: &mut impl Rng) -> Quality {
    match rng.gen_range(0..4) {
        0 => Quality::Unknown,
        1 => Quality::Preliminary,
        2 => Quality::Good,
        _ => Quality::Excellent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seismo_core::WatcherVariant;

    fn config(id: &str, check_period: u64) -> WatcherConfig {
        WatcherConfig {
            id: id.to_owned(),
            variant: WatcherVariant::Pseudo,
            conn_str: String::new(),
            timeout: 0,
            check_period,
        }
    }

    #[tokio::test]
    async fn start_watch_emits_messages_sharing_one_event_id() {
        let watcher = PseudoWatcher::new(config("pseudo-1", 1));
        let mut stream = watcher
            .start_watch(CancellationToken::new(), Utc::now())
            .await
            .unwrap();

        let first = stream.recv().await.unwrap();
        assert_eq!(first.source_id, "pseudo-1");
        assert!(!first.event_id.is_empty());
    }

    #[tokio::test]
    async fn start_watch_preserves_the_requested_offset() {
        let watcher = PseudoWatcher::new(config("pseudo-2", 1));
        let from = Utc::now() - chrono::Duration::days(30);

        let mut stream = watcher
            .start_watch(CancellationToken::new(), from)
            .await
            .unwrap();
        let msg = stream.recv().await.unwrap();

        let delta = (Utc::now() - msg.focus_time) - chrono::Duration::days(30);
        assert!(delta.num_seconds().abs() < 5);
    }

    #[tokio::test]
    async fn start_watch_twice_fails_with_already_running() {
        let watcher = PseudoWatcher::new(config("pseudo-3", 5));
        let _stream = watcher
            .start_watch(CancellationToken::new(), Utc::now())
            .await
            .unwrap();

        let second = watcher.start_watch(CancellationToken::new(), Utc::now()).await;
        assert!(matches!(
            second,
            Err(StartWatchError::AlreadyRunning(_))
        ));
    }

    #[tokio::test]
    async fn cancellation_closes_the_stream_and_returns_to_stopped() {
        let watcher = PseudoWatcher::new(config("pseudo-4", 1));
        let cancel = CancellationToken::new();
        let mut stream = watcher.start_watch(cancel.clone(), Utc::now()).await.unwrap();

        stream.recv().await.unwrap();
        cancel.cancel();

        while stream.recv().await.is_some() {}
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(watcher.state_info().await, WatcherState::Stopped);
    }

    #[tokio::test]
    async fn rejects_a_from_in_the_future() {
        let watcher = PseudoWatcher::new(config("pseudo-5", 1));
        let from = Utc::now() + chrono::Duration::days(1);
        let result = watcher.start_watch(CancellationToken::new(), from).await;
        assert!(matches!(result, Err(StartWatchError::FromInFuture { .. })));
    }
}
