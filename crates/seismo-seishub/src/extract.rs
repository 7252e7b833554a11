//! Bulk historical extraction across a month range.
//!
//! Ported from `original_source/provider/seishub/hub.go`'s `Extract`: walk
//! month by month, fan links for that month's messages out to a bounded
//! worker pool, and collect whatever comes back. Result order does not
//! reflect source order.

use seismo_core::{Message, MonthYear};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::client::SeishubClient;
use crate::parser::parse_msg;
use crate::FetchError;

/// Default worker count, matching the Go source's `defParal`.
pub const DEFAULT_PARALLELISM: usize = 7;

/// Default channel/result capacity hint (average messages per month).
const AVG_MONTH_MSG_NUM: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("extract: \"from\" ({from}) must not be after \"to\" ({to})")]
    FromAfterTo { from: MonthYear, to: MonthYear },
    #[error("extract: fetching index for {month}: {source}")]
    Index {
        month: MonthYear,
        #[source]
        source: FetchError,
    },
}

/// Fetches every message in `[from, to]` (inclusive, by month), using
/// `parallelism` worker tasks (falls back to [`DEFAULT_PARALLELISM`] when
/// 0). A 404 on a month's index is logged and that month is skipped; any
/// other index error aborts the whole extraction. A per-message fetch or
/// parse error is logged and that message is simply dropped.
pub async fn extract(
    client: &SeishubClient,
    from: MonthYear,
    to: MonthYear,
    parallelism: usize,
) -> Result<Vec<Message>, ExtractError> {
    let month_count = to.diff(&from) + 1;
    if month_count <= 0 {
        return Err(ExtractError::FromAfterTo { from, to });
    }
    let parallelism = if parallelism == 0 {
        DEFAULT_PARALLELISM
    } else {
        parallelism
    };

    let (links_tx, links_rx) = async_channel::bounded::<String>(parallelism.max(1));
    let (results_tx, mut results_rx) = mpsc::channel::<Message>(AVG_MONTH_MSG_NUM);

    let mut workers = JoinSet::new();
    for _ in 0..parallelism {
        let links_rx = links_rx.clone();
        let results_tx = results_tx.clone();
        let client = client.clone();
        workers.spawn(async move {
            while let Ok(link) = links_rx.recv().await {
                match client.get_page(&link).await {
                    Ok(body) => match parse_msg(&body) {
                        Ok(mut msg) => {
                            msg.link = link;
                            if results_tx.send(msg).await.is_err() {
                                break;
                            }
                        }
                        Err(err) => {
                            tracing::warn!(%link, error = %err, "extract: dropping unparsable message");
                        }
                    },
                    Err(err) => {
                        tracing::warn!(%link, error = %err, "extract: dropping unreachable message");
                    }
                }
            }
        });
    }
    drop(results_tx);

    let mut month = from;
    loop {
        let dir = client.join(&month.path_segment());
        match client.get_msg_names(&dir).await {
            Ok(names) => {
                for name in names {
                    let link = client.join(&format!("{}/{name}", month.path_segment()));
                    if links_tx.send(link).await.is_err() {
                        break;
                    }
                }
            }
            Err(FetchError::NotFound(_)) => {
                tracing::info!(%month, "extract: no index for month, skipping");
            }
            Err(source) => return Err(ExtractError::Index { month, source }),
        }

        if month == to {
            break;
        }
        month = month.add_month(1);
    }
    drop(links_tx);

    let mut messages = Vec::with_capacity(AVG_MONTH_MSG_NUM * month_count as usize);
    while let Some(msg) = results_rx.recv().await {
        messages.push(msg);
    }
    while workers.join_next().await.is_some() {}

    Ok(messages)
}
