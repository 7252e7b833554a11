//! Fan-in of dynamically-arriving per-watcher streams into one stream.
//!
//! Ported from `original_source/collector/collector.go::MergeWatchPipes`:
//! one forwarder task per incoming stream, copying messages to a shared
//! output channel until its source closes. No ordering is imposed across
//! watchers; each forwarder preserves its own stream's order.

use seismo_core::Message;
use tokio::sync::mpsc;

const OUTPUT_BUFFER: usize = 64;

/// Spawns the merger task and returns the shared output stream.
///
/// The returned receiver stays open for as long as `watch_pipes` is open
/// or any forwarder it spawned is still copying; it closes once
/// `watch_pipes` closes and every forwarder it spawned has finished.
pub fn merge(mut watch_pipes: mpsc::Receiver<mpsc::Receiver<Message>>) -> mpsc::Receiver<Message> {
    let (out_tx, out_rx) = mpsc::channel(OUTPUT_BUFFER);

    tokio::spawn(async move {
        let mut forwarders = tokio::task::JoinSet::new();

        while let Some(stream) = watch_pipes.recv().await {
            let out_tx = out_tx.clone();
            forwarders.spawn(forward(stream, out_tx));
        }

        drop(out_tx);
        while forwarders.join_next().await.is_some() {}
    });

    out_rx
}

/// Copies every message from `stream` to `out` until `stream` closes (the
/// watcher stopped) or `out` closes (the merger itself is shutting down).
async fn forward(mut stream: mpsc::Receiver<Message>, out: mpsc::Sender<Message>) {
    while let Some(msg) = stream.recv().await {
        if out.send(msg).await.is_err() {
            return;
        }
    }
}
