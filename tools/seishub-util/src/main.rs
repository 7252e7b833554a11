//! seishub-util: a one-shot bulk extraction utility, off by default in
//! the collector's own startup path.
//!
//! Ported from `original_source/cmd/seishub-util/main.go`: the same two
//! modes (`list-pages` fetches and saves each month's raw index page;
//! `msg-pages` fetches and saves every individual message page in a
//! month range), the same "from must not be after to" validation, `clap`
//! (derive) standing in for Go's `flag` package.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{Datelike, Utc};
use clap::{Parser, ValueEnum};
use seismo_core::MonthYear;
use seismo_seishub::SeishubClient;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Fetch and save each month's raw index page.
    ListPages,
    /// Fetch and save every individual message page in the range.
    MsgPages,
}

#[derive(Debug, Parser)]
#[command(name = "seishub-util", about = "Bulk historical extraction from the SEISHUB archive")]
struct Cli {
    /// Start of the month range, as "YYYY-MM". Defaults to the current month.
    #[arg(long)]
    from: Option<String>,

    /// End of the month range, as "YYYY-MM". Defaults to the current month.
    #[arg(long)]
    to: Option<String>,

    /// SEISHUB archive base address. Defaults to the documented archive URL.
    #[arg(long, default_value = "")]
    base_addr: String,

    #[arg(long, value_enum, default_value = "list-pages")]
    mode: Mode,

    /// Output directory. Defaults to "./out".
    #[arg(long)]
    out: Option<PathBuf>,

    /// Per-request HTTP timeout, in seconds.
    #[arg(long, default_value_t = 60)]
    timeout: u64,
}

fn parse_month_year(s: &str) -> Result<MonthYear, String> {
    let (year, month) = s
        .split_once('-')
        .ok_or_else(|| format!("expected \"YYYY-MM\", got {s:?}"))?;
    let year: i32 = year.parse().map_err(|_| format!("invalid year in {s:?}"))?;
    let month: u32 = month.parse().map_err(|_| format!("invalid month in {s:?}"))?;
    MonthYear::new(year, month).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let now = Utc::now();
    let current_month = MonthYear::new(now.year(), now.month()).expect("chrono year/month is always valid");

    let from = match cli.from.as_deref().map(parse_month_year).transpose() {
        Ok(my) => my.unwrap_or(current_month),
        Err(err) => {
            error!(error = %err, "invalid --from");
            std::process::exit(1);
        }
    };
    let to = match cli.to.as_deref().map(parse_month_year).transpose() {
        Ok(my) => my.unwrap_or(current_month),
        Err(err) => {
            error!(error = %err, "invalid --to");
            std::process::exit(1);
        }
    };
    if from.after(&to) {
        error!(%from, %to, "the \"from\" value cannot be after the \"to\" value");
        std::process::exit(1);
    }

    let out_dir = cli.out.unwrap_or_else(|| PathBuf::from("out"));
    if let Err(err) = std::fs::create_dir_all(&out_dir) {
        error!(error = %err, dir = %out_dir.display(), "cannot create output directory");
        std::process::exit(1);
    }

    let client = SeishubClient::new(cli.base_addr, Duration::from_secs(cli.timeout));

    let result = match cli.mode {
        Mode::ListPages => get_list_pages(&client, from, to, &out_dir).await,
        Mode::MsgPages => get_msg_pages(&client, from, to, &out_dir).await,
    };

    if let Err(err) = result {
        error!(error = %err, "extraction failed");
        std::process::exit(1);
    }
}

/// Fetches and saves each month's raw index page as `<out>/<month>.html`.
async fn get_list_pages(
    client: &SeishubClient,
    from: MonthYear,
    to: MonthYear,
    out_dir: &std::path::Path,
) -> std::io::Result<()> {
    let mut month = from;
    loop {
        let dir = client.join(&month.path_segment());
        match client.get_page(&dir).await {
            Ok(page) => {
                let path = out_dir.join(format!("{}.html", month.path_segment()));
                std::fs::write(path, page)?;
                info!(%month, "saved month index page");
            }
            Err(err) => warn!(%month, error = %err, "could not fetch month index page, skipping"),
        }

        if month == to {
            return Ok(());
        }
        month = month.add_month(1);
    }
}

/// Fetches and saves every message page in the range under
/// `<out>/<month>/<name>`.
async fn get_msg_pages(
    client: &SeishubClient,
    from: MonthYear,
    to: MonthYear,
    out_dir: &std::path::Path,
) -> std::io::Result<()> {
    let mut month = from;
    loop {
        let dir = client.join(&month.path_segment());
        match client.get_msg_names(&dir).await {
            Ok(names) => {
                let month_dir = out_dir.join(month.path_segment());
                std::fs::create_dir_all(&month_dir)?;
                for name in names {
                    let link = client.join(&format!("{}/{name}", month.path_segment()));
                    match client.get_page(&link).await {
                        Ok(body) => {
                            std::fs::write(month_dir.join(&name), body)?;
                        }
                        Err(err) => {
                            warn!(%link, error = %err, "could not fetch message page, skipping");
                        }
                    }
                }
                info!(%month, "saved month's message pages");
            }
            Err(err) => warn!(%month, error = %err, "could not fetch month index, skipping"),
        }

        if month == to {
            return Ok(());
        }
        month = month.add_month(1);
    }
}
