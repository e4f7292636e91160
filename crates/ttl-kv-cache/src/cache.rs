//! SQLite storage with per-entry TTL

use crate::error::Result;
use crate::types::{CacheEntry, CacheOptions};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tokio::fs;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

const DB_FILE_NAME: &str = "cache.db";

/// Byte-oriented key/value store with per-entry time-to-live.
///
/// `get` returns `None` both for absent keys and for entries whose expiry has
/// passed. `set` is an unconditional upsert. Implementations must tolerate
/// concurrent callers; the last `set` for a key wins.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;

    /// Succeeds whether or not the key exists
    async fn delete(&self, key: &str) -> Result<()>;

    async fn clear(&self) -> Result<()>;

    /// Release the underlying storage. No further calls are valid afterwards.
    async fn close(&self) -> Result<()>;
}

/// Cache persisted in a single SQLite file, surviving process restarts
pub struct SqliteCache {
    pool: SqlitePool,
    path: PathBuf,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl SqliteCache {
    /// Open (or create) the cache in `directory` with the default sweep interval
    pub async fn open(directory: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(CacheOptions {
            directory: directory.as_ref().to_path_buf(),
            ..CacheOptions::default()
        })
        .await
    }

    /// Open (or create) the cache described by `options`.
    ///
    /// The directory is created if missing. A zero `sweep_interval` disables
    /// the background sweep; expired entries are then only removed on read or
    /// by calling [`SqliteCache::sweep_expired`].
    pub async fn open_with(options: CacheOptions) -> Result<Self> {
        fs::create_dir_all(&options.directory).await?;
        let path = options.directory.join(DB_FILE_NAME);

        let connect = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(connect)
            .await?;

        if let Err(e) = create_schema(&pool).await {
            pool.close().await;
            return Err(e);
        }

        let sweeper = if options.sweep_interval.is_zero() {
            debug!("Background sweep disabled");
            None
        } else {
            Some(spawn_sweeper(pool.clone(), options.sweep_interval))
        };

        info!(path = ?path, "Cache opened");

        Ok(Self {
            pool,
            path,
            sweeper: Mutex::new(sweeper),
        })
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fetch the raw row for `key`, including an expired one that has not
    /// been swept yet
    pub async fn entry(&self, key: &str) -> Result<Option<CacheEntry>> {
        let row: Option<(String, Vec<u8>, i64, i64)> = sqlx::query_as(
            "SELECT key, value, expires_at, created_at FROM cache WHERE key = ?1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(key, value, expires_at, created_at)| CacheEntry {
            key,
            value,
            expires_at: from_millis(expires_at),
            created_at: from_millis(created_at),
        }))
    }

    /// Delete every expired row in one statement, returning how many went
    pub async fn sweep_expired(&self) -> Result<u64> {
        sweep(&self.pool).await
    }

    /// Number of entries that have not expired
    pub async fn len(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cache WHERE expires_at > ?1")
            .bind(Utc::now().timestamp_millis())
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    fn stop_sweeper(&self) {
        if let Some(handle) = self.sweeper.lock().ok().and_then(|mut s| s.take()) {
            handle.abort();
        }
    }
}

#[async_trait]
impl Cache for SqliteCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entry = match self.entry(key).await? {
            Some(entry) => entry,
            None => return Ok(None),
        };

        let now = Utc::now();
        if entry.is_expired_at(now) {
            debug!(key = %key, "Cache entry expired");
            // Guarded on expiry so a concurrent fresh `set` survives
            if let Err(e) = sqlx::query("DELETE FROM cache WHERE key = ?1 AND expires_at <= ?2")
                .bind(key)
                .bind(now.timestamp_millis())
                .execute(&self.pool)
                .await
            {
                debug!(key = %key, error = %e, "Failed to delete expired entry");
            }
            return Ok(None);
        }

        Ok(Some(entry.value))
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let now = Utc::now().timestamp_millis();
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at = now.saturating_add(ttl_ms);

        sqlx::query(
            "INSERT OR REPLACE INTO cache (key, value, expires_at, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(key = %key, size = value.len(), ttl_ms, "Cached value");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM cache WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let result = sqlx::query("DELETE FROM cache").execute(&self.pool).await?;
        info!(removed = result.rows_affected(), "Cache cleared");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.stop_sweeper();
        self.pool.close().await;
        Ok(())
    }
}

impl Drop for SqliteCache {
    fn drop(&mut self) {
        self.stop_sweeper();
    }
}

async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cache (
            key TEXT PRIMARY KEY,
            value BLOB NOT NULL,
            expires_at INTEGER NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_cache_expires_at ON cache(expires_at)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn sweep(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM cache WHERE expires_at <= ?1")
        .bind(Utc::now().timestamp_millis())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

fn spawn_sweeper(pool: SqlitePool, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if pool.is_closed() {
                break;
            }
            match sweep(&pool).await {
                Ok(0) => {}
                Ok(removed) => debug!(removed, "Swept expired cache entries"),
                Err(e) => warn!(error = %e, "Cache sweep failed"),
            }
        }
    })
}

fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or(if ms < 0 {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}
