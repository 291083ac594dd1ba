//! Time-bounded snapshot of the container inventory.
//!
//! The cache owns one immutable [`Snapshot`] behind an `Arc`.  Readers
//! clone the `Arc` and never see a map under construction; a refresh
//! builds a complete new snapshot and swaps the pointer.
//!
//! Refreshes are single-flight: callers that find the snapshot stale
//! queue on `refresh_lock`, and whoever gets the lock first does the
//! work.  The others notice that an attempt finished while they were
//! waiting and take its outcome, the new snapshot or the same error,
//! instead of listing the inventory again.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::debug;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use crate::error::ProviderError;
use crate::record::ContainerRecord;
use crate::refresher::Refresher;

/// How long a snapshot may be served before it is rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreshnessWindow {
    /// Every query rebuilds the snapshot.
    Disabled,
    Within(Duration),
}

impl FreshnessWindow {
    /// Negative values are the "no caching" sentinel.
    pub fn from_millis(millis: i64) -> Self {
        match u64::try_from(millis) {
            Ok(ms) => FreshnessWindow::Within(Duration::from_millis(ms)),
            Err(_) => FreshnessWindow::Disabled,
        }
    }
}

/// Every container record at one point in time.
#[derive(Debug)]
pub struct Snapshot {
    records: Vec<ContainerRecord>,
    by_key: HashMap<String, usize>,
    captured_at: Instant,
    captured_wall: DateTime<Utc>,
}

impl Snapshot {
    /// Builds a snapshot from keyed records, in inventory order. A later
    /// record with an already-seen key replaces the earlier one.
    pub fn new(entries: Vec<(String, ContainerRecord)>) -> Self {
        let mut records = Vec::with_capacity(entries.len());
        let mut by_key = HashMap::with_capacity(entries.len());
        for (key, record) in entries {
            match by_key.get(&key) {
                Some(&idx) => records[idx] = record,
                None => {
                    by_key.insert(key, records.len());
                    records.push(record);
                }
            }
        }
        Self {
            records,
            by_key,
            captured_at: Instant::now(),
            captured_wall: Utc::now(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ContainerRecord> {
        self.by_key.get(key).map(|&idx| &self.records[idx])
    }

    /// Records in the order the inventory listed them.
    pub fn records(&self) -> impl Iterator<Item = &ContainerRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn captured_wall(&self) -> DateTime<Utc> {
        self.captured_wall
    }

    fn is_fresh(&self, window: FreshnessWindow) -> bool {
        match window {
            FreshnessWindow::Disabled => false,
            FreshnessWindow::Within(max_age) => self.captured_at.elapsed() <= max_age,
        }
    }
}

pub struct SnapshotCache {
    refresher: Refresher,
    window: FreshnessWindow,
    current: RwLock<Option<Arc<Snapshot>>>,
    /// Error of the most recent attempt, `None` if it succeeded.
    last_failure: RwLock<Option<Arc<ProviderError>>>,
    /// Completed refresh attempts, successful or not.
    attempts: AtomicU64,
    refresh_lock: Mutex<()>,
}

impl SnapshotCache {
    pub fn new(refresher: Refresher, window: FreshnessWindow) -> Self {
        Self {
            refresher,
            window,
            current: RwLock::new(None),
            last_failure: RwLock::new(None),
            attempts: AtomicU64::new(0),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Returns the current snapshot, rebuilding it first if it is stale.
    ///
    /// A failed rebuild leaves the previous snapshot (or its absence)
    /// untouched and hands the error back, to this caller and to every
    /// caller queued behind it.
    pub async fn get(&self) -> Result<Arc<Snapshot>, Arc<ProviderError>> {
        let seen = self.attempts.load(Ordering::Acquire);
        if let Some(snapshot) = self.fresh().await {
            return Ok(snapshot);
        }

        let _guard = self.refresh_lock.lock().await;

        // An attempt finished while we were queued.
        if self.attempts.load(Ordering::Acquire) != seen {
            if let Some(err) = self.last_failure.read().await.clone() {
                debug!("Joined failed snapshot refresh");
                return Err(err);
            }
            if let Some(snapshot) = self.current.read().await.clone() {
                debug!("Joined in-flight snapshot refresh");
                return Ok(snapshot);
            }
        }
        if let Some(snapshot) = self.fresh().await {
            return Ok(snapshot);
        }

        let outcome = self.refresher.refresh().await;
        let result = match outcome {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                *self.current.write().await = Some(Arc::clone(&snapshot));
                *self.last_failure.write().await = None;
                Ok(snapshot)
            }
            Err(e) => {
                let err = Arc::new(e);
                *self.last_failure.write().await = Some(Arc::clone(&err));
                Err(err)
            }
        };
        self.attempts.fetch_add(1, Ordering::AcqRel);
        result
    }

    async fn fresh(&self) -> Option<Arc<Snapshot>> {
        let current = self.current.read().await;
        current
            .as_ref()
            .filter(|s| s.is_fresh(self.window))
            .cloned()
    }
}
