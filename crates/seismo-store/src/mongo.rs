//! A MongoDB-backed store adapter.
//!
//! Ported from `original_source/collector/db/mongodb/adapter.go`: messages
//! land in a single `messages` collection; `get_last_time` runs the same
//! match-then-group-max aggregation the Go source does, rather than a
//! `find().sort().limit(1)`, so an index on `(source_id, focus_time)` is
//! the only one this adapter ever needs.

use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::bson::{doc, Bson};
use mongodb::{Client, Database};
use seismo_core::{zero_time, Message};

use crate::{StoreAdapter, StoreError};

const MSG_COLLECTION: &str = "messages";

/// Store adapter backed by a MongoDB database.
///
/// The database name is taken from the connection string's path component
/// (`mongodb://host/dbname`), matching the Go adapter's `path.Base(connStr)`.
pub struct MongoAdapter {
    client: Option<Client>,
    db_name: String,
}

impl MongoAdapter {
    pub fn new() -> Self {
        MongoAdapter {
            client: None,
            db_name: String::new(),
        }
    }

    fn database(&self) -> Result<Database, StoreError> {
        let client = self.client.as_ref().ok_or(StoreError::NotConnected)?;
        Ok(client.database(&self.db_name))
    }
}

impl Default for MongoAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl StoreAdapter for MongoAdapter {
    async fn connect(&mut self, conn_str: &str) -> Result<(), StoreError> {
        let client = Client::with_uri_str(conn_str)
            .await
            .map_err(|e| StoreError::Connect(e.to_string()))?;
        let db_name = conn_str
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("seismo")
            .to_owned();
        self.client = Some(client);
        self.db_name = db_name;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        // The mongodb driver's client shuts down its connection pool on drop;
        // there is no explicit disconnect call to propagate errors from.
        self.client = None;
        Ok(())
    }

    async fn save_msg(&self, msgs: &[Message]) -> Result<(), StoreError> {
        if msgs.is_empty() {
            return Ok(());
        }
        let coll = self.database()?.collection::<Message>(MSG_COLLECTION);
        coll.insert_many(msgs)
            .await
            .map_err(|e| StoreError::Save(e.to_string()))?;
        Ok(())
    }

    async fn get_last_time(&self, source_id: &str) -> Result<DateTime<Utc>, StoreError> {
        let coll = self.database()?.collection::<mongodb::bson::Document>(MSG_COLLECTION);

        let pipeline = vec![
            doc! { "$match": { "source_id": source_id } },
            doc! { "$group": { "_id": "$source_id", "time": { "$max": "$focus_time" } } },
        ];

        let mut cursor = coll
            .aggregate(pipeline)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let Some(first) = cursor
            .try_next()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?
        else {
            return Ok(zero_time());
        };

        match first.get("time") {
            Some(Bson::DateTime(dt)) => Ok(dt.to_chrono()),
            other => Err(StoreError::Query(format!(
                "get_last_time: unexpected type for time field: {other:?}"
            ))),
        }
    }
}
