//! Extracting a [`Message`] from one SEISHUB message page's raw text.
//!
//! Ported field-for-field from `original_source/provider/seishub/seishub.go`'s
//! `ParseMsg`, `defineEventType`, and `defineEventQuality`. SEISHUB reports
//! are emitted in Russian; the field labels below are the ones the source
//! actually contains and are not translated.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use seismo_core::{EventType, Message, Quality};

#[derive(Debug, thiserror::Error)]
pub enum ParseMsgError {
    #[error("message has no EVENT PUBLIC ID field")]
    MissingEventId,
    #[error("message has no ВРЕМЯ В ОЧАГЕ (UTC) field")]
    MissingFocusTime,
    #[error("could not parse focus time {0:?}")]
    InvalidFocusTime(String),
    #[error("message has no ШИРОТА field")]
    MissingLatitude,
    #[error("could not parse latitude {0:?}")]
    InvalidLatitude(String),
    #[error("message has no ДОЛГОТА field")]
    MissingLongitude,
    #[error("could not parse longitude {0:?}")]
    InvalidLongitude(String),
    #[error("could not parse magnitude {0:?}")]
    InvalidMagnitude(String),
}

static EVENT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"EVENT PUBLIC ID:\s*\w+").unwrap());
static FOCUS_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ВРЕМЯ В ОЧАГЕ \(UTC\):\s*[0-9\-:. ]+").unwrap());
static LATITUDE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"ШИРОТА:\s*[0-9\-.]+").unwrap());
static LONGITUDE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ДОЛГОТА:\s*[0-9\-.]+").unwrap());
static MAGNITUDE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"МАГНИТУДА:\s*[0-9.]+").unwrap());
static EVENT_TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ТИП СОБЫТИЯ:\s*[A-Za-z ]+").unwrap());
static QUALITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ОЦЕНКА КАЧЕСТВА РЕШЕНИЯ:\s*[А-Яа-я, ]+").unwrap());

fn field_value<'a>(re: &Regex, prefix: &str, msg: &'a str) -> Option<&'a str> {
    let found = re.find(msg)?.as_str();
    Some(found.trim_start_matches(prefix).trim())
}

/// Parses one message page body into a [`Message`]. `source_id` and
/// `link` are filled in by the caller (the client doesn't know either).
pub fn parse_msg(body: &str) -> Result<Message, ParseMsgError> {
    let event_id = field_value(&EVENT_ID_RE, "EVENT PUBLIC ID:", body)
        .filter(|s| !s.is_empty())
        .ok_or(ParseMsgError::MissingEventId)?
        .to_owned();

    let focus_time_raw = field_value(&FOCUS_TIME_RE, "ВРЕМЯ В ОЧАГЕ (UTC):", body)
        .ok_or(ParseMsgError::MissingFocusTime)?
        .replace('-', ".");
    let focus_time = parse_focus_time(&focus_time_raw)
        .ok_or_else(|| ParseMsgError::InvalidFocusTime(focus_time_raw.clone()))?;

    let lat_raw = field_value(&LATITUDE_RE, "ШИРОТА:", body).ok_or(ParseMsgError::MissingLatitude)?;
    let latitude = lat_raw
        .parse::<f64>()
        .map_err(|_| ParseMsgError::InvalidLatitude(lat_raw.to_owned()))?;

    let long_raw =
        field_value(&LONGITUDE_RE, "ДОЛГОТА:", body).ok_or(ParseMsgError::MissingLongitude)?;
    let longitude = long_raw
        .parse::<f64>()
        .map_err(|_| ParseMsgError::InvalidLongitude(long_raw.to_owned()))?;

    let magnitude = match field_value(&MAGNITUDE_RE, "МАГНИТУДА:", body) {
        Some(raw) if !raw.is_empty() => raw
            .parse::<f64>()
            .map_err(|_| ParseMsgError::InvalidMagnitude(raw.to_owned()))?,
        _ => 0.0,
    };

    let event_type = field_value(&EVENT_TYPE_RE, "ТИП СОБЫТИЯ:", body)
        .map(define_event_type)
        .unwrap_or_default();
    let quality = field_value(&QUALITY_RE, "ОЦЕНКА КАЧЕСТВА РЕШЕНИЯ:", body)
        .map(define_quality)
        .unwrap_or_default();

    Ok(Message {
        source_id: String::new(),
        event_id,
        focus_time,
        latitude,
        longitude,
        magnitude,
        event_type,
        quality,
        link: String::new(),
    })
}

/// Parses SEISHUB's `2023.03.01 05:13:16.43` focus-time format. Fractional
/// seconds are truncated, matching the Go source's `"2006.01.02 15:04:5"`
/// layout (which likewise discards sub-second precision).
fn parse_focus_time(s: &str) -> Option<DateTime<Utc>> {
    let truncated = s.split('.').take(3).collect::<Vec<_>>();
    if truncated.len() < 3 {
        return None;
    }
    // truncated[0..2] is "YYYY.MM.DD" split on the date separators; reassemble
    // from the original since we only wanted to drop a trailing fractional part.
    let without_fraction = match s.rfind(':') {
        Some(colon) => {
            let tail = &s[colon + 1..];
            match tail.find('.') {
                Some(dot) => &s[..colon + 1 + dot],
                None => s,
            }
        }
        None => s,
    };
    NaiveDateTime::parse_from_str(without_fraction, "%Y.%m.%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

fn define_event_type(s: &str) -> EventType {
    match s.to_lowercase().as_str() {
        "quarry blast" => EventType::QuarryBlast,
        "earthquake" => EventType::Earthquake,
        _ => EventType::Unknown,
    }
}

fn define_quality(s: &str) -> Quality {
    match s.to_lowercase().as_str() {
        "наилучшее, обработано аналитиком" => Quality::Excellent,
        "предварительная оценка" => Quality::Preliminary,
        "хорошо" => Quality::Good,
        _ => Quality::Unknown,
    }
}
