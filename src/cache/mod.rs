//! Persistent catalog cache.
//!
//! A provider whose metadata version has not moved can be initialized from
//! this cache without refetching its catalog. Everything lives in one SQLite
//! file (`~/.reportgen/cache.db` by default) holding JSON documents under
//! provider-scoped keys:
//!
//! ```text
//! voyanta:version             -> 1234
//! voyanta:operators           -> [Operator, ...]
//! voyanta:dimensions          -> [DimensionMeta, ...]
//! voyanta:dimension_details   -> [DimensionDetailMeta, ...]
//! voyanta:facts               -> [FactMeta, ...]
//! ```
//!
//! The layout is tracked in SQLite's `user_version`; opening a file written
//! with another layout drops its entries.

mod store;

pub use store::{CachedMetadataStore, MetadataStore};

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};

/// Bumped whenever the shape of a cached document changes.
const LAYOUT_VERSION: i64 = 2;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("cached document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no home directory to place the cache in")]
    NoCacheDir,

    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// JSON documents in SQLite, addressed by string key.
pub struct MetadataCache {
    db: Connection,
}

impl MetadataCache {
    /// Open the cache file at `path`, creating parent directories as needed.
    pub fn open<P: AsRef<Path>>(path: P) -> CacheResult<Self> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        tracing::debug!(path = %path.display(), "opening metadata cache");
        Self::prepare(Connection::open(path)?)
    }

    pub fn open_in_memory() -> CacheResult<Self> {
        Self::prepare(Connection::open_in_memory()?)
    }

    /// `~/.reportgen/cache.db`
    pub fn default_path() -> CacheResult<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(".reportgen").join("cache.db"))
            .ok_or(CacheError::NoCacheDir)
    }

    fn prepare(db: Connection) -> CacheResult<Self> {
        let found: i64 = db.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if found != LAYOUT_VERSION {
            if found != 0 {
                tracing::info!(found, expected = LAYOUT_VERSION, "cache layout changed, discarding entries");
            }
            db.execute_batch("DROP TABLE IF EXISTS entries")?;
            db.pragma_update(None, "user_version", LAYOUT_VERSION)?;
        }
        db.execute_batch(
            "CREATE TABLE IF NOT EXISTS entries (
                 key       TEXT PRIMARY KEY,
                 document  TEXT NOT NULL,
                 stored_at TEXT NOT NULL DEFAULT (datetime('now'))
             )",
        )?;
        Ok(Self { db })
    }

    /// Decode the document under `key`, if there is one.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        let document: Option<String> = self
            .db
            .query_row(
                "SELECT document FROM entries WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        document
            .map(|text| serde_json::from_str(&text))
            .transpose()
            .map_err(CacheError::from)
    }

    /// Store `value` under `key`, replacing what was there.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> CacheResult<()> {
        let document = serde_json::to_string(value)?;
        self.db.execute(
            "INSERT INTO entries (key, document) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET document = excluded.document,
                                            stored_at = datetime('now')",
            params![key, document],
        )?;
        Ok(())
    }

    /// True if an entry was removed.
    pub fn delete(&self, key: &str) -> CacheResult<bool> {
        let removed = self
            .db
            .execute("DELETE FROM entries WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }

    /// Remove every key starting with `prefix`, returning how many went.
    ///
    /// Matching is literal, so `_` and `%` in provider names are safe.
    pub fn delete_prefix(&self, prefix: &str) -> CacheResult<usize> {
        let removed = self.db.execute(
            "DELETE FROM entries WHERE substr(key, 1, length(?1)) = ?1",
            params![prefix],
        )?;
        Ok(removed)
    }

    pub fn clear_all(&self) -> CacheResult<()> {
        self.db.execute("DELETE FROM entries", [])?;
        Ok(())
    }

    /// Drop every collection cached for `provider`, its version included.
    pub fn clear_provider(&self, provider: &str) -> CacheResult<usize> {
        let removed = self.delete_prefix(&CacheKey::scope(provider))?;
        tracing::debug!(provider, removed, "cleared cached catalog");
        Ok(removed)
    }

    /// Keys starting with `prefix`, sorted.
    pub fn keys_with_prefix(&self, prefix: &str) -> CacheResult<Vec<String>> {
        let mut stmt = self.db.prepare(
            "SELECT key FROM entries WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
        )?;
        let keys = stmt
            .query_map(params![prefix], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    pub fn stats(&self) -> CacheResult<CacheStats> {
        let (entries, bytes): (i64, i64) = self.db.query_row(
            "SELECT COUNT(*), COALESCE(SUM(LENGTH(document)), 0) FROM entries",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(CacheStats {
            entry_count: usize::try_from(entries).unwrap_or_default(),
            total_size_bytes: usize::try_from(bytes).unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entry_count: usize,
    /// Sum of stored document lengths.
    pub total_size_bytes: usize,
}

/// Provider-scoped key names.
pub struct CacheKey;

impl CacheKey {
    /// Prefix shared by every key of `provider`.
    pub fn scope(provider: &str) -> String {
        format!("{}:", provider)
    }

    fn slot(provider: &str, slot: &str) -> String {
        format!("{}{}", Self::scope(provider), slot)
    }

    pub fn version(provider: &str) -> String {
        Self::slot(provider, "version")
    }

    pub fn operators(provider: &str) -> String {
        Self::slot(provider, "operators")
    }

    pub fn dimensions(provider: &str) -> String {
        Self::slot(provider, "dimensions")
    }

    pub fn dimension_details(provider: &str) -> String {
        Self::slot(provider, "dimension_details")
    }

    pub fn facts(provider: &str) -> String {
        Self::slot(provider, "facts")
    }
}
