//! Transient, TTL-bound store for comparison results.
//!
//! Results are kept in memory only and vanish on restart. Expired entries are
//! evicted lazily on every `put`, on read, and by an optional background
//! sweeper thread owned through a [`SweepHandle`].

mod sweeper;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::compare::CompareResult;
use crate::diff::DiffResult;
use crate::error::OptionsError;

pub use sweeper::SweepHandle;

/// Cache lifetimes. Absent fields take the documented defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheOptions {
    /// How long a stored result stays readable.
    pub ttl_seconds: u64,
    /// Interval between background sweeps.
    pub sweep_interval_seconds: u64,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self { ttl_seconds: 24 * 60 * 60, sweep_interval_seconds: 60 * 60 }
    }
}

impl CacheOptions {
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.ttl_seconds == 0 {
            return Err(OptionsError::ZeroDuration("ttlSeconds"));
        }
        if self.sweep_interval_seconds == 0 {
            return Err(OptionsError::ZeroDuration("sweepIntervalSeconds"));
        }
        Ok(())
    }

    pub fn ttl(&self) -> chrono::Duration {
        // chrono panics beyond i64::MAX milliseconds.
        let secs = self.ttl_seconds.min((i64::MAX / 1000) as u64) as i64;
        chrono::Duration::seconds(secs)
    }

    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_seconds)
    }
}

/// Payload kinds the cache can hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "result", rename_all = "lowercase")]
pub enum CachedResult {
    Compare(CompareResult),
    Diff(DiffResult),
}

impl CachedResult {
    pub fn kind(&self) -> &'static str {
        match self {
            CachedResult::Compare(_) => "compare",
            CachedResult::Diff(_) => "diff",
        }
    }

    fn id_prefix(&self) -> &'static str {
        match self {
            CachedResult::Compare(_) => "cmp",
            CachedResult::Diff(_) => "diff",
        }
    }
}

/// A cached result with its lifetime bounds.
#[derive(Debug, Clone)]
pub struct StoredComparison {
    pub result: Arc<CachedResult>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl StoredComparison {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntryInfo {
    pub id: String,
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub count: usize,
    pub entries: Vec<CacheEntryInfo>,
}

/// In-memory result store guarded by a single mutex.
#[derive(Debug)]
pub struct ResultCache {
    options: CacheOptions,
    entries: Mutex<HashMap<String, StoredComparison>>,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(CacheOptions::default())
    }
}

impl ResultCache {
    pub fn new(options: CacheOptions) -> Self {
        Self { options, entries: Mutex::new(HashMap::new()) }
    }

    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    /// Store `result` and return its URL-safe id (`cmp-…` or `diff-…`).
    pub fn put(&self, result: CachedResult) -> String {
        let now = Utc::now();
        let id = format!("{}-{}", result.id_prefix(), Uuid::new_v4().simple());
        let stored = StoredComparison {
            result: Arc::new(result),
            created_at: now,
            expires_at: now.checked_add_signed(self.options.ttl()).unwrap_or(DateTime::<Utc>::MAX_UTC),
        };

        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now));
        let evicted = before - entries.len();
        entries.insert(id.clone(), stored);
        debug!(id = %id, evicted, size = entries.len(), "cached result");
        id
    }

    /// Fetch a live entry. Expired entries are evicted and reported as absent.
    pub fn get(&self, id: &str) -> Option<Arc<CachedResult>> {
        let now = Utc::now();
        let mut entries = self.entries.lock();
        match entries.get(id) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(id);
                debug!(id, "evicted expired result on read");
                None
            }
            Some(entry) => Some(Arc::clone(&entry.result)),
            None => None,
        }
    }

    /// Remove an entry; `true` if it existed.
    pub fn delete(&self, id: &str) -> bool {
        self.entries.lock().remove(id).is_some()
    }

    /// Move an entry's expiry; `false` if the id is unknown.
    pub fn set_expires_at(&self, id: &str, expires_at: DateTime<Utc>) -> bool {
        match self.entries.lock().get_mut(id) {
            Some(entry) => {
                entry.expires_at = expires_at;
                true
            }
            None => false,
        }
    }

    /// Drop every expired entry and return how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now));
        before - entries.len()
    }

    /// Snapshot of stored ids and lifetimes, oldest first.
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock();
        let mut infos: Vec<CacheEntryInfo> = entries
            .iter()
            .map(|(id, e)| CacheEntryInfo {
                id: id.clone(),
                kind: e.result.kind().to_string(),
                created_at: e.created_at,
                expires_at: e.expires_at,
            })
            .collect();
        infos.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        CacheStats { count: infos.len(), entries: infos }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
