//! An in-memory store adapter, for tests and standalone demos.
//!
//! Ported from `original_source/collector/db/stubdb/adapter.go`. The Go
//! stub is a pure no-op (`SaveMsg` discards everything, `GetLastTime`
//! always answers "now"), which makes the supervisor's resume logic
//! untestable against it. This version actually records what it is
//! given, so `get_last_time` reflects real save history while still
//! honoring the documented "zero means nothing saved yet" contract.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use seismo_core::{zero_time, Message};

use crate::{StoreAdapter, StoreError};

#[derive(Debug, Default)]
pub struct StubAdapter {
    last_time: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl StubAdapter {
    pub fn new() -> Self {
        StubAdapter {
            last_time: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait::async_trait]
impl StoreAdapter for StubAdapter {
    async fn connect(&mut self, _conn_str: &str) -> Result<(), StoreError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn save_msg(&self, msgs: &[Message]) -> Result<(), StoreError> {
        let mut last_time = self.last_time.lock().expect("stub adapter mutex poisoned");
        for msg in msgs {
            let entry = last_time
                .entry(msg.source_id.clone())
                .or_insert_with(zero_time);
            if msg.focus_time > *entry {
                *entry = msg.focus_time;
            }
        }
        Ok(())
    }

    async fn get_last_time(&self, source_id: &str) -> Result<DateTime<Utc>, StoreError> {
        let last_time = self.last_time.lock().expect("stub adapter mutex poisoned");
        Ok(last_time.get(source_id).copied().unwrap_or_else(zero_time))
    }
}
