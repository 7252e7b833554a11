//! The domain record: one seismic-event report from one source.
//!
//! Ported from `original_source/provider/message.go`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The type of a seismic event, as classified by the source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    #[default]
    Unknown,
    Earthquake,
    QuarryBlast,
}

/// Quality of a source's assessment of an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    #[default]
    Unknown,
    Preliminary,
    Good,
    Excellent,
}

/// A seismic-event message as reported by one watcher.
///
/// `(source_id, event_id)` is the logical natural key. `focus_time` is the
/// primary ordering key across the whole system; [`Message::is_focus_time_set`]
/// distinguishes a real timestamp from the Rust analogue of Go's zero
/// `time.Time` value, used by the store adapter's `GetLastTime` to mean
/// "nothing persisted yet" (see [`zero_time`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub source_id: String,
    pub event_id: String,
    pub focus_time: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub magnitude: f64,
    pub event_type: EventType,
    pub quality: Quality,
    pub link: String,
}

/// The sentinel "no value" instant, the Rust analogue of Go's zero `time.Time`.
///
/// Used by [`crate::Watcher`] resume semantics and by store adapters'
/// `GetLastTime` to signal "no prior message for this source".
pub fn zero_time() -> DateTime<Utc> {
    DateTime::<Utc>::MIN_UTC
}

/// Whether `t` is the zero sentinel produced by [`zero_time`].
pub fn is_zero_time(t: DateTime<Utc>) -> bool {
    t == zero_time()
}

impl Message {
    /// Validates the invariants required before a message may reach the store:
    /// non-empty `source_id`/`event_id`, and a non-zero `focus_time`.
    pub fn validate(&self) -> Result<(), MessageError> {
        if self.source_id.is_empty() {
            return Err(MessageError::EmptySourceId);
        }
        if self.event_id.is_empty() {
            return Err(MessageError::EmptyEventId);
        }
        if is_zero_time(self.focus_time) {
            return Err(MessageError::ZeroFocusTime);
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("source_id must not be empty")]
    EmptySourceId,
    #[error("event_id must not be empty")]
    EmptyEventId,
    #[error("focus_time must not be the zero instant")]
    ZeroFocusTime,
}
