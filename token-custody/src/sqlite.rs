use crate::config::SqliteStoreConfig;
use crate::error::{Error, Result};
use crate::store::UserTokenStore;
use crate::token::TokenRecord;
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::{Mutex, OnceCell};

const SCHEMA_SQL: &str = include_str!("../migrations/001_tokenstore.sql");

/// SQLite-backed token store with a write-through in-memory cache.
///
/// Reads are served from memory when possible and fall back to the backing
/// table on a miss, repopulating the cache from what they find. Writes update
/// memory and the table inside one critical section, so concurrent refreshes
/// for the same subject cannot leave the two views disagreeing. The database
/// connection is opened on first use and the schema created if absent.
pub struct SqliteTokenStore {
    config: SqliteStoreConfig,
    tokens: RwLock<HashMap<String, TokenRecord>>,
    // serializes store/clear and the miss-path read-populate sequence
    write_guard: Mutex<()>,
    pool: OnceCell<SqlitePool>,
}

impl SqliteTokenStore {
    /// Create a store over the configured database. No connection is opened
    /// until the first operation needs one.
    pub fn new(config: SqliteStoreConfig) -> Self {
        Self {
            config,
            tokens: RwLock::new(HashMap::new()),
            write_guard: Mutex::new(()),
            pool: OnceCell::new(),
        }
    }

    /// Close the connection pool if it was ever opened. Safe to call more
    /// than once. Later reads are served from memory only; later writes fail.
    pub async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
        }
    }

    /// Open the connection pool and apply the schema on first use. Concurrent
    /// first-use callers are serialized by the cell, so the open-and-create
    /// sequence runs at most once.
    async fn pool(&self) -> Result<&SqlitePool> {
        self.pool
            .get_or_try_init(|| async {
                let pool = SqlitePoolOptions::new()
                    .max_connections(self.config.max_connections)
                    .connect(&self.config.database_url)
                    .await
                    .map_err(|e| Error::SchemaInit(e.to_string()))?;

                sqlx::raw_sql(SCHEMA_SQL)
                    .execute(&pool)
                    .await
                    .map_err(|e| Error::SchemaInit(e.to_string()))?;

                tracing::info!("sqlite token store ready at {}", self.config.database_url);
                Ok(pool)
            })
            .await
    }

    async fn fetch(&self, pool: &SqlitePool, subject: &str) -> Result<Option<TokenRecord>> {
        let row = sqlx::query(
            r#"
            SELECT access_token, expiration, refresh_token
            FROM tokenstore
            WHERE sub = ?
            "#,
        )
        .bind(subject)
        .fetch_optional(pool)
        .await
        .map_err(|e| Error::Storage(e.to_string()))?;

        if let Some(row) = row {
            let access_token: String = row
                .try_get("access_token")
                .map_err(|e| Error::Storage(e.to_string()))?;
            let expiration: String = row
                .try_get("expiration")
                .map_err(|e| Error::Storage(e.to_string()))?;
            let refresh_token: Option<String> = row.try_get("refresh_token").ok();

            let expiration = chrono::DateTime::parse_from_rfc3339(&expiration)
                .map_err(|e| Error::Storage(e.to_string()))?
                .with_timezone(&chrono::Utc);

            let mut record = TokenRecord::new(subject, access_token, expiration);
            if let Some(refresh_token) = refresh_token {
                record = record.with_refresh_token(refresh_token);
            }
            Ok(Some(record))
        } else {
            Ok(None)
        }
    }
}

#[async_trait]
impl UserTokenStore for SqliteTokenStore {
    async fn get(&self, subject: &str) -> Result<Option<TokenRecord>> {
        if subject.is_empty() {
            return Err(Error::InvalidSubject);
        }
        tracing::trace!("get token for {}", subject);
        if let Some(record) = self.tokens.read().unwrap().get(subject) {
            return Ok(Some(record.clone()));
        }

        let _guard = self.write_guard.lock().await;
        // another task may have populated the entry while we waited
        if let Some(record) = self.tokens.read().unwrap().get(subject) {
            return Ok(Some(record.clone()));
        }

        let pool = self.pool().await?;
        tracing::debug!("reading token for {} from backing store", subject);
        let record = match self.fetch(pool, subject).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("backing store read for {} failed, treating token as absent: {}", subject, e);
                return Ok(None);
            }
        };

        if let Some(record) = &record {
            tracing::trace!("token for {} found", subject);
            self.tokens
                .write()
                .unwrap()
                .insert(subject.to_string(), record.clone());
        }
        Ok(record)
    }

    async fn store(&self, record: TokenRecord) -> Result<()> {
        if record.subject.is_empty() {
            return Err(Error::InvalidSubject);
        }
        tracing::debug!("store token for {}", record.subject);
        let pool = self.pool().await?;

        let _guard = self.write_guard.lock().await;
        let prior = self
            .tokens
            .write()
            .unwrap()
            .insert(record.subject.clone(), record.clone());

        let written = sqlx::query(
            r#"
            INSERT INTO tokenstore (sub, access_token, expiration, refresh_token)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(sub) DO UPDATE SET
                access_token = excluded.access_token,
                expiration = excluded.expiration,
                refresh_token = excluded.refresh_token
            "#,
        )
        .bind(&record.subject)
        .bind(&record.access_token)
        .bind(record.expiration.to_rfc3339())
        .bind(&record.refresh_token)
        .execute(pool)
        .await;

        if let Err(e) = written {
            // memory must not claim a token the durable store did not accept
            let mut tokens = self.tokens.write().unwrap();
            match prior {
                Some(prior) => {
                    tokens.insert(record.subject.clone(), prior);
                }
                None => {
                    tokens.remove(&record.subject);
                }
            }
            return Err(Error::Storage(e.to_string()));
        }
        Ok(())
    }

    async fn clear(&self, subject: &str) -> Result<()> {
        if subject.is_empty() {
            return Err(Error::InvalidSubject);
        }
        tracing::debug!("clear token for {}", subject);
        let pool = self.pool().await?;

        let _guard = self.write_guard.lock().await;
        let prior = self.tokens.write().unwrap().remove(subject);

        let deleted = sqlx::query("DELETE FROM tokenstore WHERE sub = ?")
            .bind(subject)
            .execute(pool)
            .await;

        if let Err(e) = deleted {
            if let Some(prior) = prior {
                self.tokens
                    .write()
                    .unwrap()
                    .insert(subject.to_string(), prior);
            }
            return Err(Error::Storage(e.to_string()));
        }
        Ok(())
    }
}
