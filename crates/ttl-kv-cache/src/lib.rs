//! SQLite-backed key/value cache with TTL expiration
//!
//! Values are opaque byte blobs stored in a single embedded database file.
//! Every entry carries its own expiry; expired entries read as absent and are
//! deleted lazily on read, and a background task sweeps the rest in bulk.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use ttl_kv_cache::{generate_key, Cache, SqliteCache};
//!
//! # async fn example() -> ttl_kv_cache::Result<()> {
//! let cache = SqliteCache::open(".my-cache").await?;
//!
//! let key = generate_key(["repo", "rust-lang/rust"]);
//! cache.set(&key, b"payload", Duration::from_secs(3600)).await?;
//!
//! if let Some(value) = cache.get(&key).await? {
//!     println!("{} bytes", value.len());
//! }
//!
//! cache.close().await?;
//! # Ok(())
//! # }
//! ```

mod cache;
mod error;
mod key;
mod types;

pub use cache::{Cache, SqliteCache};
pub use error::{CacheError, Result};
pub use key::generate_key;
pub use types::{CacheEntry, CacheOptions, DEFAULT_CACHE_DIR, DEFAULT_SWEEP_INTERVAL};
