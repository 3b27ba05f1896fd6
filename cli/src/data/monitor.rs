//! Polling and refresh orchestration.
//!
//! A [`Monitor`] owns the reading store and the last snapshot behind one async
//! mutex. A second mutex is held for the whole of a cycle, so contention on it
//! means a cycle is in flight. Each cycle acquires a snapshot, records a sample when warranted,
//! recomputes derived metrics and publishes a [`DashboardState`] on a watch
//! channel.

use std::future::Future;
use std::time::Duration;

use battwise_core::metrics::{compute, DerivedMetrics};
use battwise_core::{BatterySample, BatterySnapshot};
use chrono::Utc;
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace};

use crate::data::acquisition::Acquisition;
use crate::data::store::{ReadingStore, RecordOutcome, StoreStats};
use crate::storage::{KeyValueStore, StorageError};

/// An unchanged level is not re-recorded within this window.
const SAVE_DEDUP_MS: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Acquiring,
    Recording,
}

/// Everything a consumer needs to render the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct DashboardState {
    pub phase: Phase,
    pub loading: bool,
    pub snapshot: Option<BatterySnapshot>,
    pub metrics: DerivedMetrics,
    pub sample_count: usize,
    /// Outcome of the last record attempt; `None` when the cycle skipped it.
    pub last_record: Option<RecordOutcome>,
    /// Milliseconds since the Unix epoch of the last completed cycle.
    pub updated_at: Option<i64>,
}

#[derive(Debug, Clone, Copy)]
struct LastSaved {
    level: u8,
    at: i64,
}

struct Cycle<S> {
    store: ReadingStore<S>,
    snapshot: Option<BatterySnapshot>,
    last_saved: Option<LastSaved>,
}

pub struct Monitor<S> {
    acquisition: Acquisition,
    in_flight: Mutex<()>,
    cycle: Mutex<Cycle<S>>,
    state: watch::Sender<DashboardState>,
    interval: Duration,
}

impl<S: KeyValueStore> Monitor<S> {
    pub fn new(acquisition: Acquisition, store: ReadingStore<S>, interval: Duration) -> Self {
        let initial = DashboardState {
            loading: true,
            metrics: compute(&store.all(), None),
            sample_count: store.len(),
            ..Default::default()
        };
        let (state, _) = watch::channel(initial);

        Self {
            acquisition,
            in_flight: Mutex::new(()),
            cycle: Mutex::new(Cycle {
                store,
                snapshot: None,
                last_saved: None,
            }),
            state,
            interval,
        }
    }

    pub fn acquisition(&self) -> &Acquisition {
        &self.acquisition
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    /// Run a cycle now.
    ///
    /// When a cycle is already in flight this waits for it and returns its
    /// result instead of starting a second one.
    pub async fn refresh(&self) -> DashboardState {
        match self.in_flight.try_lock() {
            Ok(_running) => self.run_cycle().await,
            Err(_) => {
                debug!("Refresh coalesced with in-flight cycle");
                drop(self.in_flight.lock().await);
            }
        }
        self.current()
    }

    /// Timer-driven cycle. Dropped when another cycle is in flight.
    pub async fn tick(&self) -> bool {
        match self.in_flight.try_lock() {
            Ok(_running) => {
                self.run_cycle().await;
                true
            }
            Err(_) => {
                trace!("Tick dropped, cycle in flight");
                false
            }
        }
    }

    /// Tick until `shutdown` resolves.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!(interval_ms = self.interval.as_millis() as u64, "Monitor started");

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        info!("Monitor stopped");
    }

    /// Clear stored history and the last-saved bookkeeping, then republish.
    pub async fn clear_data(&self) -> Result<(), StorageError> {
        let mut cycle = self.cycle.lock().await;
        let result = cycle.store.clear();
        cycle.last_saved = None;
        self.publish(&cycle, None);
        info!("History cleared");
        result
    }

    /// The full bounded history, oldest first.
    pub async fn history(&self) -> Vec<BatterySample> {
        self.cycle.lock().await.store.all()
    }

    /// Samples no older than `hours`.
    #[cfg(test)]
    pub async fn samples_since(&self, hours: f64) -> Vec<BatterySample> {
        self.cycle.lock().await.store.all_since(hours)
    }

    pub async fn stats(&self) -> StoreStats {
        self.cycle.lock().await.store.stats()
    }

    async fn run_cycle(&self) {
        let mut cycle = self.cycle.lock().await;
        self.state.send_modify(|state| {
            state.phase = Phase::Acquiring;
            state.loading = true;
        });

        let acquired = self.acquisition.acquire().await;

        self.state.send_modify(|state| state.phase = Phase::Recording);
        let outcome = acquired
            .as_ref()
            .and_then(|snapshot| record_snapshot(&mut cycle, snapshot));
        if let Some(snapshot) = acquired {
            cycle.snapshot = Some(snapshot);
        }

        self.publish(&cycle, outcome);
    }

    fn publish(&self, cycle: &Cycle<S>, outcome: Option<RecordOutcome>) {
        let samples = cycle.store.all();
        let metrics = compute(&samples, cycle.snapshot.as_ref());

        self.state.send_modify(|state| {
            state.phase = Phase::Idle;
            state.loading = false;
            state.snapshot = cycle.snapshot.clone();
            state.metrics = metrics;
            state.sample_count = samples.len();
            state.last_record = outcome;
            state.updated_at = Some(Utc::now().timestamp_millis());
        });
    }
}

fn record_snapshot<S: KeyValueStore>(
    cycle: &mut Cycle<S>,
    snapshot: &BatterySnapshot,
) -> Option<RecordOutcome> {
    let sample = match BatterySample::from_snapshot(snapshot) {
        Ok(sample) => sample,
        Err(e) => {
            debug!(error = %e, "Not recording snapshot");
            return None;
        }
    };

    if let Some(last) = cycle.last_saved {
        if last.level == sample.level() && sample.timestamp() - last.at < SAVE_DEDUP_MS {
            trace!(level = last.level, "Level unchanged since last save");
            return None;
        }
    }

    let outcome = cycle.store.record(sample, false);
    if outcome != RecordOutcome::Failed {
        cycle.last_saved = Some(LastSaved {
            level: sample.level(),
            at: sample.timestamp(),
        });
    }
    Some(outcome)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc, Mutex as StdMutex};

    use battwise_core::{Capability, RawBatteryInfo};
    use battwise_platform::BatteryProvider;
    use color_eyre::eyre::Result;

    use super::*;
    use crate::config::HistoryConfig;
    use crate::data::acquisition::fake::ScriptedBattery;
    use crate::storage::memory::MemoryStore;

    fn monitor_with(battery: impl BatteryProvider + 'static) -> Monitor<MemoryStore> {
        let store = ReadingStore::open(MemoryStore::new(), &HistoryConfig::default());
        Monitor::new(
            Acquisition::new(Box::new(battery)),
            store,
            Duration::from_millis(10),
        )
    }

    /// Blocks every read until the test releases it.
    struct GatedBattery {
        gate: Arc<StdMutex<mpsc::Receiver<()>>>,
        reads: Arc<AtomicUsize>,
    }

    impl BatteryProvider for GatedBattery {
        fn read(&mut self) -> Result<RawBatteryInfo> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            let _ = self.gate.lock().unwrap().recv();
            Ok(RawBatteryInfo {
                level: 55,
                charging_status: "Discharging".to_string(),
                ..Default::default()
            })
        }

        fn capability(&self) -> Capability {
            Capability::Limited
        }

        fn name(&self) -> &'static str {
            "gated"
        }
    }

    #[tokio::test]
    async fn test_refresh_records_and_publishes() {
        let battery = ScriptedBattery::new(Capability::Limited);
        battery.push_level(72, "Discharging");
        let monitor = monitor_with(battery);
        assert!(monitor.current().loading);

        let state = monitor.refresh().await;
        assert_eq!(state.phase, Phase::Idle);
        assert!(!state.loading);
        assert_eq!(state.last_record, Some(RecordOutcome::Stored));
        assert_eq!(state.sample_count, 1);
        assert_eq!(state.snapshot.and_then(|s| s.level), Some(72));
        assert!(state.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_unchanged_level_is_deduplicated() {
        let battery = ScriptedBattery::new(Capability::Limited);
        battery.push_level(72, "Discharging");
        battery.push_level(72, "Discharging");
        let monitor = monitor_with(battery);

        monitor.refresh().await;
        let state = monitor.refresh().await;
        assert_eq!(state.last_record, None);
        assert_eq!(state.sample_count, 1);
    }

    #[tokio::test]
    async fn test_clear_then_same_level_is_stored() {
        let battery = ScriptedBattery::new(Capability::Limited);
        battery.push_level(80, "Discharging");
        battery.push_level(80, "Discharging");
        let monitor = monitor_with(battery);

        monitor.refresh().await;
        monitor.clear_data().await.unwrap();
        assert_eq!(monitor.current().sample_count, 0);

        let state = monitor.refresh().await;
        assert_eq!(state.last_record, Some(RecordOutcome::Stored));
        assert_eq!(state.sample_count, 1);
    }

    #[tokio::test]
    async fn test_failed_read_keeps_previous_snapshot() {
        let battery = ScriptedBattery::new(Capability::Limited);
        battery.push_level(64, "Charging");
        battery.push(None);
        let monitor = monitor_with(battery);

        monitor.refresh().await;
        let state = monitor.refresh().await;
        assert_eq!(state.snapshot.map(|s| s.level), Some(Some(64)));
        assert_eq!(state.last_record, None);
        assert_eq!(state.sample_count, 1);
    }

    #[tokio::test]
    async fn test_unknown_level_is_not_recorded() {
        let battery = ScriptedBattery::new(Capability::Limited);
        battery.push(Some(RawBatteryInfo::default()));
        let monitor = monitor_with(battery);

        let state = monitor.refresh().await;
        assert!(state.snapshot.is_some());
        assert_eq!(state.sample_count, 0);
        assert_eq!(state.metrics.health_label(), "Insufficient data");
    }

    #[tokio::test]
    async fn test_overlapping_refresh_is_coalesced() {
        let (release, gate) = mpsc::channel();
        let reads = Arc::new(AtomicUsize::new(0));
        let monitor = Arc::new(monitor_with(GatedBattery {
            gate: Arc::new(StdMutex::new(gate)),
            reads: Arc::clone(&reads),
        }));

        let mut updates = monitor.subscribe();
        let first = tokio::spawn({
            let monitor = Arc::clone(&monitor);
            async move { monitor.refresh().await }
        });
        updates
            .wait_for(|s| s.phase == Phase::Acquiring)
            .await
            .unwrap();

        assert!(!monitor.tick().await);

        // Sending and parking on the in-flight cycle happen in one poll.
        let (parked, parked_rx) = tokio::sync::oneshot::channel();
        let second = tokio::spawn({
            let monitor = Arc::clone(&monitor);
            async move {
                let _ = parked.send(());
                monitor.refresh().await
            }
        });
        parked_rx.await.unwrap();

        release.send(()).unwrap();
        drop(release);
        let first = first.await.unwrap();
        let second = second.await.unwrap();

        assert_eq!(reads.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
        assert_eq!(second.sample_count, 1);
    }

    #[tokio::test]
    async fn test_refresh_runs_while_history_is_read() {
        let battery = ScriptedBattery::new(Capability::Limited);
        battery.push_level(70, "Discharging");
        let monitor = Arc::new(monitor_with(battery));

        let reader = monitor.cycle.lock().await;
        let refresh = tokio::spawn({
            let monitor = Arc::clone(&monitor);
            async move { monitor.refresh().await }
        });
        tokio::task::yield_now().await;
        drop(reader);

        let state = refresh.await.unwrap();
        assert_eq!(state.last_record, Some(RecordOutcome::Stored));
        assert_eq!(state.sample_count, 1);
        assert_eq!(monitor.history().await.len(), 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let battery = ScriptedBattery::new(Capability::Limited);
        for level in [90, 89, 88] {
            battery.push_level(level, "Discharging");
        }
        let monitor = monitor_with(battery);
        let mut updates = monitor.subscribe();

        monitor
            .run(async {
                updates
                    .wait_for(|s| s.sample_count >= 1 && !s.loading)
                    .await
                    .ok();
            })
            .await;

        assert!(!monitor.samples_since(1.0).await.is_empty());
    }
}
