use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::{
    db::{helpers::format_datetime, Database},
    store::KeyValueStore,
};

impl Database {
    pub async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.execute(move |conn| {
            let value = conn
                .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                    row.get::<_, String>(0)
                })
                .optional()
                .with_context(|| "failed to read kv entry")?;
            Ok(value)
        })
        .await
    }

    pub async fn set_value(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO kv (key, value, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                     value = excluded.value,
                     updated_at = excluded.updated_at",
                params![key, value, format_datetime(&Utc::now())],
            )
            .with_context(|| "failed to write kv entry")?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl KeyValueStore for Database {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.get_value(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_value(key, value).await
    }
}
