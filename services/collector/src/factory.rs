//! Builds the concrete watcher a [`WatcherConfig`] asks for.
//!
//! Ported from `original_source/provider/crt/crt.go::NewWatcher`. Unlike
//! the Go source, an unrecognized variant can no longer reach this
//! function at all (`WatcherVariant` is a closed enum rejected at config
//! deserialization); what remains here is the bound checking the original
//! left to each hub's own constructor.

use std::sync::Arc;

use seismo_core::{Watcher, WatcherConfig, WatcherVariant};
use seismo_pseudo::PseudoWatcher;
use seismo_seishub::SeishubWatcher;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BuildWatcherError {
    #[error("watcher {id:?}: check_period must be >= 1s, got {check_period}")]
    CheckPeriodTooShort { id: String, check_period: u64 },
    #[error("watcher {id:?}: timeout must be >= 1s, got {timeout}")]
    TimeoutTooShort { id: String, timeout: u64 },
}

/// Builds the watcher instance `config` describes. A `check_period` under
/// one second would tick the watcher continuously, and for the SEISHUB
/// variant a `timeout` under one second would time out every request
/// before the archive mirror can respond; both are rejected here, before
/// the watcher ever starts.
pub fn build_watcher(config: WatcherConfig) -> Result<Arc<dyn Watcher>, BuildWatcherError> {
    if config.check_period < 1 {
        return Err(BuildWatcherError::CheckPeriodTooShort {
            id: config.id,
            check_period: config.check_period,
        });
    }

    match config.variant {
        WatcherVariant::Pseudo => Ok(Arc::new(PseudoWatcher::new(config))),
        WatcherVariant::Seishub => {
            if config.timeout < 1 {
                return Err(BuildWatcherError::TimeoutTooShort {
                    id: config.id,
                    timeout: config.timeout,
                });
            }
            Ok(Arc::new(SeishubWatcher::new(config)))
        }
    }
}
