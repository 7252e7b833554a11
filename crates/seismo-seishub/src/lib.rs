//! The SEISHUB watcher: HTTP access, message parsing, resume-point
//! discovery, and the sequential cross-month scan that makes it up.

pub mod client;
pub mod discovery;
pub mod extract;
pub mod parser;
pub mod watcher;

pub use client::{FetchError, SeishubClient, DEFAULT_BASE_ADDR};
pub use discovery::{find_start_msg_num, msg_num_to_name, parse_msg_num};
pub use extract::{extract, ExtractError};
pub use parser::{parse_msg, ParseMsgError};
pub use watcher::SeishubWatcher;
