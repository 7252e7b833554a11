//! S6: two pseudo watchers, a stub store, a cancel-then-restart cycle
//! should yield exactly one new stream per stopped watcher on the next
//! supervisor tick.

use std::sync::Arc;
use std::time::Duration;

use collector::supervisor::{create_watchers, restart_watchers};
use seismo_core::{WatcherConfig, WatcherState, WatcherVariant};
use seismo_store::StoreAdapter;
use tokio_util::sync::CancellationToken;

fn pseudo_config(id: &str) -> WatcherConfig {
    WatcherConfig {
        id: id.to_owned(),
        variant: WatcherVariant::Pseudo,
        conn_str: String::new(),
        timeout: 5,
        check_period: 1,
    }
}

#[tokio::test]
async fn restart_cycle_yields_one_new_stream_per_stopped_watcher() {
    let watchers = create_watchers([pseudo_config("p1"), pseudo_config("p2")]).unwrap();
    let store: Arc<dyn StoreAdapter> = Arc::new(seismo_store::StubAdapter::new());
    let (tx, mut rx) = tokio::sync::mpsc::channel(4);

    let cancel = CancellationToken::new();
    restart_watchers(&watchers, store.as_ref(), &cancel, &tx).await;
    let first_round = drain_available(&mut rx).await;
    assert_eq!(first_round, 2);

    cancel.cancel();
    // Give each watcher's generator task a moment to notice cancellation
    // and transition back to Stopped.
    tokio::time::sleep(Duration::from_millis(50)).await;
    for watcher in watchers.values() {
        assert_eq!(
            seismo_core::Watcher::state_info(watcher.as_ref()).await,
            WatcherState::Stopped
        );
    }

    let fresh_cancel = CancellationToken::new();
    restart_watchers(&watchers, store.as_ref(), &fresh_cancel, &tx).await;
    drop(tx);
    let second_round = drain_available(&mut rx).await;
    assert_eq!(second_round, 2);
}

async fn drain_available(rx: &mut tokio::sync::mpsc::Receiver<tokio::sync::mpsc::Receiver<seismo_core::Message>>) -> usize {
    let mut count = 0;
    while let Ok(Some(_stream)) = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await {
        count += 1;
    }
    count
}
