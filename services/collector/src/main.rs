//! collector: ingests seismic-event messages from every configured
//! watcher and persists each one exactly once.
//!
//! Ported from `original_source/cmd/collector/main.go`, restated with the
//! pack's usual binary shape (`tracing_subscriber::fmt()` init, then
//! config load with a fatal `exit(1)` on failure — see
//! `services/forwarder/src/main.rs`).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use seismo_core::Watcher;
use seismo_store::StoreAdapter;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use collector::config::load_config;
use collector::supervisor::create_watchers;

#[derive(Debug, Parser)]
#[command(name = "collector", about = "Seismic-event ingestion pipeline")]
struct Cli {
    /// Path to the collector's JSON config file. Falls back to
    /// SEISMO_COLLECTOR_CONFIG when omitted.
    #[arg(long = "conf-file")]
    conf_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "collector starting");

    let cli = Cli::parse();

    let config = match load_config(cli.conf_file.as_deref()) {
        Ok(c) => c,
        Err(err) => {
            error!(error = %err, "cannot read config file");
            std::process::exit(1);
        }
    };

    let watchers = match create_watchers(config.watchers.into_values()) {
        Ok(w) => w,
        Err(err) => {
            error!(error = %err, "cannot create watchers");
            std::process::exit(1);
        }
    };

    let mut store_adapter = seismo_store::new_adapter(&config.db);
    if let Err(err) = store_adapter.connect(&config.db.conn_str).await {
        error!(error = %err, "cannot connect to database");
        std::process::exit(1);
    }
    let store: Arc<dyn StoreAdapter> = Arc::from(store_adapter);

    let cancel = CancellationToken::new();
    let (watch_pipes_tx, watch_pipes_rx) = mpsc::channel::<mpsc::Receiver<seismo_core::Message>>(1);
    let mut merged = collector::merger::merge(watch_pipes_rx);

    let maintain_period = Duration::from_secs(config.maintain_period.max(1));
    let supervisor_cancel = cancel.clone();
    let supervisor_store = Arc::clone(&store);
    let watchers: std::collections::HashMap<String, Arc<dyn Watcher>> = watchers;
    tokio::spawn(collector::supervisor::run(
        watchers,
        supervisor_store,
        maintain_period,
        watch_pipes_tx,
        supervisor_cancel,
    ));

    // SIGINT cancels the root context; every watcher stream, the
    // supervisor, and the merger unwind from there.
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_cancel.cancel();
        }
    });

    loop {
        tokio::select! {
            msg = merged.recv() => {
                let Some(msg) = msg else {
                    info!("collector: merged stream closed, exiting");
                    break;
                };
                if let Err(err) = store.save_msg(std::slice::from_ref(&msg)).await {
                    error!(error = %err, "cannot save message, exiting");
                    std::process::exit(1);
                }
            }
            () = cancel.cancelled() => {
                info!("collector: cancelled, exiting");
                break;
            }
        }
    }
}
