//! Per-date critical sections.
//!
//! Planning reads the already-scheduled set and then inserts; a move checks
//! for a collision and then re-links. Both must not interleave with another
//! writer on the same date, so they run while holding that date's lock.
//! Locks only cover this process.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry of one async mutex per date.
#[derive(Debug, Default, Clone)]
pub struct DateLocks {
    inner: Arc<Mutex<HashMap<NaiveDate, Arc<AsyncMutex<()>>>>>,
}

/// Held locks; released on drop.
#[derive(Debug)]
pub struct DateGuard {
    dates: Vec<NaiveDate>,
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl DateGuard {
    /// Dates covered by this guard, ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }
}

impl DateLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, date: NaiveDate) -> Arc<AsyncMutex<()>> {
        let mut map = self.inner.lock();
        // Drop entries nobody is holding or waiting on.
        map.retain(|d, m| *d == date || Arc::strong_count(m) > 1);
        map.entry(date)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Lock a single date.
    pub async fn lock(&self, date: NaiveDate) -> DateGuard {
        self.lock_many(&[date]).await
    }

    /// Lock several dates. Dates are deduplicated and taken in ascending
    /// order, so two callers with overlapping sets cannot deadlock.
    pub async fn lock_many(&self, dates: &[NaiveDate]) -> DateGuard {
        let mut ordered = dates.to_vec();
        ordered.sort();
        ordered.dedup();

        let mut guards = Vec::with_capacity(ordered.len());
        for date in &ordered {
            guards.push(self.slot(*date).lock_owned().await);
        }
        DateGuard {
            dates: ordered,
            _guards: guards,
        }
    }

    /// Number of dates currently tracked.
    pub fn tracked(&self) -> usize {
        self.inner.lock().len()
    }
}
