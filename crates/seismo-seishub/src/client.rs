//! HTTP access to the SEISHUB mail archive.
//!
//! Ported from `original_source/provider/seishub/seishub.go`'s
//! `GetMsgNamesPage`/`GetMsgPage`: a 404 is distinguished from any other
//! transport or status error so that callers (the scanner, in particular)
//! can treat "not found yet" as a first-class, non-fatal outcome.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::{Client, StatusCode};

/// The default SEISHUB archive root, used when a watcher's `conn_str` is empty.
pub const DEFAULT_BASE_ADDR: &str = "http://seishub.ru/pipermail/seismic-report/";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The page does not exist (HTTP 404). Never fatal on its own: the
    /// scanner interprets it as "not produced yet".
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unexpected status {status} fetching {link}")]
    Status { status: StatusCode, link: String },
    #[error("transport error fetching {link}: {source}")]
    Transport {
        link: String,
        #[source]
        source: reqwest::Error,
    },
}

/// A thin HTTP client for one SEISHUB watcher instance.
///
/// Never shared across watchers: each watcher owns its own `SeishubClient`
/// with its own configured timeout, so one watcher's slow archive mirror
/// can't starve another's requests.
#[derive(Debug, Clone)]
pub struct SeishubClient {
    http: Client,
    pub base_addr: String,
}

impl SeishubClient {
    pub fn new(base_addr: impl Into<String>, timeout: Duration) -> Self {
        let base_addr = {
            let b = base_addr.into();
            if b.is_empty() {
                DEFAULT_BASE_ADDR.to_owned()
            } else {
                b
            }
        };
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client configuration is always valid here");
        SeishubClient { http, base_addr }
    }

    /// Fetch the raw page body at `link`, distinguishing 404 from other errors.
    pub async fn get_page(&self, link: &str) -> Result<String, FetchError> {
        let resp = self
            .http
            .get(link)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                link: link.to_owned(),
                source,
            })?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(link.to_owned()));
        }
        if !resp.status().is_success() {
            return Err(FetchError::Status {
                status: resp.status(),
                link: link.to_owned(),
            });
        }

        resp.text().await.map_err(|source| FetchError::Transport {
            link: link.to_owned(),
            source,
        })
    }

    /// Join `base_addr` with a path segment, keeping exactly one `/` between parts.
    pub fn join(&self, segment: &str) -> String {
        join_url(&self.base_addr, segment)
    }

    /// Fetches a month's index page and returns the message names (e.g.
    /// `"017538.html"`) found on it.
    pub async fn get_msg_names(&self, dir: &str) -> Result<Vec<String>, FetchError> {
        let page = self.get_page(dir).await?;
        Ok(parse_msg_names(&page))
    }
}

static MSG_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.html").expect("static regex is valid"));

/// Finds all message names embedded in a month index page's HTML.
pub fn parse_msg_names(page: &str) -> Vec<String> {
    MSG_NAME_RE
        .find_iter(page)
        .map(|m| m.as_str().to_owned())
        .collect()
}

/// Joins two URL path components, tolerating either side carrying or
/// missing its separating slash.
pub fn join_url(base: &str, segment: &str) -> String {
    let base = base.trim_end_matches('/');
    let segment = segment.trim_start_matches('/');
    format!("{base}/{segment}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_normalizes_slashes() {
        assert_eq!(
            join_url("http://seishub.ru/pipermail/seismic-report/", "2022-April"),
            "http://seishub.ru/pipermail/seismic-report/2022-April"
        );
        assert_eq!(
            join_url("http://seishub.ru/pipermail/seismic-report", "/2022-April"),
            "http://seishub.ru/pipermail/seismic-report/2022-April"
        );
    }

    #[test]
    fn new_substitutes_default_base_addr_for_empty_conn_str() {
        let c = SeishubClient::new("", Duration::from_secs(1));
        assert_eq!(c.base_addr, DEFAULT_BASE_ADDR);
    }

    #[test]
    fn parse_msg_names_finds_all_names_on_an_index_page() {
        let page = r#"<html><a href="017538.html">017538.html</a> <a href="017539.html">017539.html</a></html>"#;
        assert_eq!(parse_msg_names(page), vec!["017538.html", "017539.html"]);
    }
}
