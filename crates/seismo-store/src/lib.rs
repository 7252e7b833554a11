//! The persistent store adapter: one narrow interface, two implementations.
//!
//! Ported from `original_source/collector/db/db.go` and its `stubdb`/
//! `mongodb` sub-packages. `GetLastTime` returning [`seismo_core::zero_time`]
//! means "nothing has ever been saved for this source" — the supervisor
//! substitutes `now()` in that case (see the collector's supervisor module).

use chrono::{DateTime, Utc};
use seismo_core::Message;
use serde::{Deserialize, Serialize};

mod mongo;
mod stub;

pub use mongo::MongoAdapter;
pub use stub::StubAdapter;

/// Which store backend a [`DbConfig`] selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DbType {
    StubDb,
    MongoDb,
}

impl Default for DbType {
    fn default() -> Self {
        DbType::StubDb
    }
}

/// Store configuration, as read from the collector config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DbConfig {
    #[serde(rename = "T")]
    pub db_type: DbType,
    #[serde(rename = "ConnStr", default)]
    pub conn_str: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store: not connected")]
    NotConnected,
    #[error("store: connect failed: {0}")]
    Connect(String),
    #[error("store: close failed: {0}")]
    Close(String),
    #[error("store: save failed: {0}")]
    Save(String),
    #[error("store: query failed: {0}")]
    Query(String),
}

/// The narrow interface every store backend implements. Shared between
/// the supervisor (`get_last_time`) and the main loop (`save_msg`);
/// implementations must tolerate concurrent calls from those two sites.
#[async_trait::async_trait]
pub trait StoreAdapter: Send + Sync {
    async fn connect(&mut self, conn_str: &str) -> Result<(), StoreError>;
    async fn close(&mut self) -> Result<(), StoreError>;
    async fn save_msg(&self, msgs: &[Message]) -> Result<(), StoreError>;
    /// Returns [`seismo_core::zero_time`] when no message has ever been
    /// saved for `source_id`.
    async fn get_last_time(&self, source_id: &str) -> Result<DateTime<Utc>, StoreError>;
}

/// Builds the adapter selected by `config`. The adapter is returned
/// unconnected; the caller must call `connect` before use.
///
/// `DbType` is a closed enum, so an unrecognized `"T"` value is already
/// rejected by config deserialization (`serde`'s own unknown-variant
/// error) before this function is ever reached — which is where the
/// design's "unknown DbType is a startup error" requirement actually
/// bites.
pub fn new_adapter(config: &DbConfig) -> Box<dyn StoreAdapter> {
    match config.db_type {
        DbType::StubDb => Box::new(StubAdapter::new()),
        DbType::MongoDb => Box::new(MongoAdapter::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_config_deserializes_the_documented_json_shape() {
        let json = r#"{"T":"MongoDb","ConnStr":"mongodb://localhost/seismo"}"#;
        let config: DbConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.db_type, DbType::MongoDb);
        assert_eq!(config.conn_str, "mongodb://localhost/seismo");
    }

    #[test]
    fn new_adapter_selects_stub_for_stub_db() {
        let config = DbConfig {
            db_type: DbType::StubDb,
            conn_str: String::new(),
        };
        let _adapter = new_adapter(&config);
    }
}
