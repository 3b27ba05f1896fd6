//! Bounded, rate-limited history of battery samples.
//!
//! The whole history lives in memory and is mirrored to the key-value backend
//! as one JSON list after every change. Samples stay ordered by timestamp and
//! the oldest are evicted once the configured cap is reached.

use std::collections::VecDeque;

use battwise_core::BatterySample;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, trace, warn};

use crate::config::HistoryConfig;
use crate::storage::{KeyValueStore, StorageError, READINGS_KEY};

const MS_PER_HOUR: f64 = 3_600_000.0;

/// What `record` did with a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOutcome {
    Stored,
    /// Same level as the last sample, too soon after it.
    Throttled,
    /// Older than the last stored sample.
    OutOfOrder,
    /// Same timestamp as the last stored sample.
    DuplicateTimestamp,
    /// The backend rejected the write; history is unchanged.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreStats {
    pub sample_count: usize,
    pub oldest_sample: Option<i64>,
    pub newest_sample: Option<i64>,
    pub size_bytes: u64,
}

pub struct ReadingStore<S> {
    backend: S,
    samples: VecDeque<BatterySample>,
    max_samples: usize,
    min_interval_ms: i64,
}

impl<S: KeyValueStore> ReadingStore<S> {
    /// Open the store, loading any history already in the backend.
    pub fn open(backend: S, config: &HistoryConfig) -> Self {
        let max_samples = config.max_samples.max(1);
        let samples = load_history(&backend, max_samples);

        debug!(
            samples = samples.len(),
            max_samples,
            min_interval_secs = config.min_interval_secs,
            "Reading store opened"
        );

        Self {
            backend,
            samples,
            max_samples,
            min_interval_ms: i64::try_from(config.min_interval_secs)
                .unwrap_or(i64::MAX / 1000)
                .saturating_mul(1000),
        }
    }

    /// Append a sample unless it is throttled or out of order.
    ///
    /// Timestamps are strictly increasing: a sample at the last stored
    /// timestamp is refused whether or not its content matches.
    /// `force` bypasses the throttle but never the ordering checks. Backend
    /// failures are logged and rolled back; they never escape.
    pub fn record(&mut self, sample: BatterySample, force: bool) -> RecordOutcome {
        if let Some(last) = self.samples.back() {
            if sample.timestamp() < last.timestamp() {
                debug!(
                    timestamp = sample.timestamp(),
                    last = last.timestamp(),
                    "Refusing out-of-order sample"
                );
                return RecordOutcome::OutOfOrder;
            }

            if sample.timestamp() == last.timestamp() {
                if sample == *last {
                    trace!(timestamp = sample.timestamp(), "Dropping repeated sample");
                } else {
                    debug!(
                        timestamp = sample.timestamp(),
                        "Refusing second sample at the same timestamp"
                    );
                }
                return RecordOutcome::DuplicateTimestamp;
            }

            let too_soon = sample.timestamp() - last.timestamp() < self.min_interval_ms;
            if !force && too_soon && sample.level() == last.level() {
                trace!(level = sample.level(), "Sample throttled");
                return RecordOutcome::Throttled;
            }
        }

        self.samples.push_back(sample);
        let mut evicted = Vec::new();
        while self.samples.len() > self.max_samples {
            if let Some(oldest) = self.samples.pop_front() {
                evicted.push(oldest);
            }
        }

        match self.persist() {
            Ok(()) => {
                trace!(
                    level = sample.level(),
                    charging = sample.is_charging(),
                    count = self.samples.len(),
                    "Sample stored"
                );
                RecordOutcome::Stored
            }
            Err(e) => {
                error!(error = %e, "Failed to persist reading history");
                self.samples.pop_back();
                for oldest in evicted.into_iter().rev() {
                    self.samples.push_front(oldest);
                }
                RecordOutcome::Failed
            }
        }
    }

    /// The full bounded history, oldest first.
    pub fn all(&self) -> Vec<BatterySample> {
        self.samples.iter().copied().collect()
    }

    /// Samples from the last `hours` hours.
    pub fn all_since(&self, hours: f64) -> Vec<BatterySample> {
        self.all_since_at(hours, Utc::now().timestamp_millis())
    }

    pub fn all_since_at(&self, hours: f64, now_ms: i64) -> Vec<BatterySample> {
        let cutoff = now_ms - (hours * MS_PER_HOUR) as i64;
        self.samples
            .iter()
            .filter(|s| s.timestamp() >= cutoff)
            .copied()
            .collect()
    }

    /// Drop all history, in memory and in the backend.
    ///
    /// Memory is cleared even when the backend fails, so the next successful
    /// write overwrites whatever the backend still holds.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        let dropped = self.samples.len();
        self.samples.clear();

        if let Err(e) = self.backend.remove(READINGS_KEY) {
            warn!(error = %e, "Failed to clear stored history");
            return Err(e);
        }

        debug!(dropped, "Reading history cleared");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            sample_count: self.samples.len(),
            oldest_sample: self.samples.front().map(BatterySample::timestamp),
            newest_sample: self.samples.back().map(BatterySample::timestamp),
            size_bytes: self.backend.size_bytes().unwrap_or_else(|e| {
                warn!(error = %e, "Failed to read store size");
                0
            }),
        }
    }

    fn persist(&mut self) -> Result<(), StorageError> {
        let json = serde_json::to_string(&self.samples)?;
        self.backend.set(READINGS_KEY, &json)
    }
}

fn load_history<S: KeyValueStore>(backend: &S, max_samples: usize) -> VecDeque<BatterySample> {
    let json = match backend.get(READINGS_KEY) {
        Ok(Some(json)) => json,
        Ok(None) => return VecDeque::new(),
        Err(e) => {
            error!(error = %e, "Failed to load reading history");
            return VecDeque::new();
        }
    };

    let mut samples: Vec<BatterySample> = match serde_json::from_str(&json) {
        Ok(samples) => samples,
        Err(e) => {
            warn!(error = %e, "Discarding unreadable reading history");
            return VecDeque::new();
        }
    };

    samples.sort_by_key(BatterySample::timestamp);
    samples.dedup_by_key(|s| s.timestamp());
    let excess = samples.len().saturating_sub(max_samples);
    samples.drain(..excess);
    samples.into()
}
