//! The SEISHUB watcher: resume-point discovery followed by a sequential
//! cross-month scan.
//!
//! Ported from `original_source/provider/seishub/hub.go`'s `Hub`: the
//! state-pattern split into `stoppedState`/`runState` collapses into a
//! single [`WatcherState`] field, since the two states and their
//! transitions are straightforward enough not to need separate state
//! objects; `getStartMsgNum`/`watch`/`checkMsg` become the
//! [`locate`]/[`scan`]/[`advance`] functions below.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use seismo_core::{
    AlreadyRunningError, Message, MessageStream, MonthYear, StartWatchError, Watcher,
    WatcherConfig, WatcherState,
};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::client::SeishubClient;
use crate::discovery::find_start_msg_num;
use crate::extract::extract;
use crate::parser::parse_msg;
use crate::FetchError;

const OUTPUT_BUFFER: usize = 32;

/// Watches one SEISHUB mirror for new messages, resuming from a given
/// instant and scanning forward across monthly archive boundaries.
pub struct SeishubWatcher {
    config: WatcherConfig,
    client: SeishubClient,
    state: Arc<Mutex<WatcherState>>,
}

impl SeishubWatcher {
    pub fn new(config: WatcherConfig) -> Self {
        let client = SeishubClient::new(
            config.conn_str.clone(),
            Duration::from_secs(config.timeout),
        );
        SeishubWatcher {
            config,
            client,
            state: Arc::new(Mutex::new(WatcherState::Stopped)),
        }
    }
}

#[async_trait::async_trait]
impl Watcher for SeishubWatcher {
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

        let (out_tx, out_rx) = mpsc::channel(OUTPUT_BUFFER);
        let (start_tx, start_rx) = mpsc::channel(1);

        let check_period = Duration::from_secs(self.config.check_period);
        let locator_client = self.client.clone();
        let locator_cancel = cancel.clone();
        tokio::spawn(locate(locator_client, start_tx, from, check_period, locator_cancel));

        let scanner_client = self.client.clone();
        let source_id = self.config.id.clone();
        let state = Arc::clone(&self.state);
        tokio::spawn(scan(
            scanner_client,
            source_id,
            out_tx,
            start_rx,
            from,
            check_period,
            cancel,
            state,
        ));

        Ok(out_rx)
    }

    async fn state_info(&self) -> WatcherState {
        *self.state.lock().await
    }

    fn config(&self) -> &WatcherConfig {
        &self.config
    }
}

/// Determines the starting message number by repeatedly fetching the
/// target month's index until it is non-empty, then applying
/// [`find_start_msg_num`]. Sends the result once on a single-slot channel
/// and exits; never sends if cancelled first.
async fn locate(
    client: SeishubClient,
    start_tx: mpsc::Sender<u32>,
    from: DateTime<Utc>,
    check_period: Duration,
    cancel: CancellationToken,
) {
    let month = MonthYear::from_datetime(from);
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + check_period, check_period);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match extract(&client, month, month, 0).await {
                    Ok(msgs) if !msgs.is_empty() => {
                        match find_start_msg_num(&msgs, from) {
                            Ok(n) => {
                                let _ = start_tx.send(n).await;
                            }
                            Err(err) => {
                                tracing::error!(error = %err, "locate: could not determine start message number");
                            }
                        }
                        return;
                    }
                    Ok(_) => continue,
                    Err(err) => {
                        tracing::error!(error = %err, "locate: could not fetch month index");
                        return;
                    }
                }
            }
            _ = cancel.cancelled() => {
                tracing::debug!("locate: cancelled while waiting for the month's first message");
                return;
            }
        }
    }
}

/// Waits for the starting message number from [`locate`], then ticks at
/// `check_period`, calling [`advance`] and forwarding whatever message (if
/// any) comes back. Returns (closing `out`, and transitioning the watcher
/// back to `Stopped`) on cancellation or once the start-number channel
/// closes without ever sending.
#[allow(clippy::too_many_arguments)]
async fn scan(
    client: SeishubClient,
    source_id: String,
    out: mpsc::Sender<Message>,
    mut start_rx: mpsc::Receiver<u32>,
    from: DateTime<Utc>,
    check_period: Duration,
    cancel: CancellationToken,
    state: Arc<Mutex<WatcherState>>,
) {
    let result = async {
        let Some(mut msg_num) = start_rx.recv().await else {
            tracing::debug!("scan: start message number channel closed, exiting");
            return;
        };
        let mut month = MonthYear::from_datetime(from);
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + check_period, check_period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match advance(&client, &source_id, msg_num, month).await {
                        Ok(Some((msg, next_num, next_month))) => {
                            msg_num = next_num;
                            month = next_month;
                            if out.send(msg).await.is_err() {
                                return;
                            }
                        }
                        Ok(None) => {}
                        Err(err) => {
                            tracing::warn!(error = %err, "scan: advance failed, will retry next tick");
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    tracing::debug!("scan: cancelled");
                    return;
                }
            }
        }
    }
    .await;

    *state.lock().await = WatcherState::Stopped;
    result
}

#[derive(Debug, thiserror::Error)]
enum AdvanceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] crate::parser::ParseMsgError),
}

/// Tries message number `msg_num` in `month`; on 404, tries the same
/// number in `month + 1`. Returns `Ok(None)` when neither exists yet
/// (the number is simply not produced, not a gap). On a hit, returns the
/// parsed message along with the next `(msg_num, month)` the scanner
/// should use.
async fn advance(
    client: &SeishubClient,
    source_id: &str,
    msg_num: u32,
    month: MonthYear,
) -> Result<Option<(Message, u32, MonthYear)>, AdvanceError> {
    let name = crate::discovery::msg_num_to_name(msg_num);

    let link = client.join(&format!("{}/{name}", month.path_segment()));
    match fetch_and_parse(client, source_id, &link).await {
        Ok(msg) => return Ok(Some((msg, msg_num + 1, month))),
        Err(AdvanceError::Fetch(FetchError::NotFound(_))) => {}
        Err(err) => return Err(err),
    }

    let next_month = month.add_month(1);
    let link = client.join(&format!("{}/{name}", next_month.path_segment()));
    match fetch_and_parse(client, source_id, &link).await {
        Ok(msg) => Ok(Some((msg, msg_num + 1, next_month))),
        Err(AdvanceError::Fetch(FetchError::NotFound(_))) => Ok(None),
        Err(err) => Err(err),
    }
}

async fn fetch_and_parse(
    client: &SeishubClient,
    source_id: &str,
    link: &str,
) -> Result<Message, AdvanceError> {
    let body = client.get_page(link).await?;
    let mut msg = parse_msg(&body)?;
    msg.source_id = source_id.to_owned();
    msg.link = link.to_owned();
    Ok(msg)
}
