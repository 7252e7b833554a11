//! Domain model and watcher contract shared by every seismic-event source.
//!
//! Ported from the `seismo/provider` and `seismo` Go packages: `Message`,
//! `MonthYear`, `WatcherConfig`, and the `Watcher` trait are the stable
//! vocabulary every watcher implementation and the collector's supervisor
//! build on.

pub mod message;
pub mod month_year;
pub mod watcher;

pub use message::{is_zero_time, zero_time, EventType, Message, MessageError, Quality};
pub use month_year::MonthYear;
pub use watcher::{
    AlreadyRunningError, MessageStream, StartWatchError, Watcher, WatcherConfig, WatcherState,
    WatcherVariant,
};
