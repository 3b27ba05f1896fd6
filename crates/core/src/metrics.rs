//! Derived metrics over the reading history and the live snapshot.
//!
//! Everything here is a pure function of `(samples, snapshot)`. Two strategies
//! exist side by side:
//!
//! - the hardware strategy, used when the snapshot comes from a full-telemetry
//!   source, which works from measured current, charge counter and design
//!   capacity and never guesses a missing figure;
//! - the history heuristic, used otherwise, which works from the stored
//!   percentage history and may fall back to a flat assumed drain, flagged as
//!   approximate.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::format::format_duration_minutes;
use crate::sample::BatterySample;
use crate::snapshot::{BatterySnapshot, HardwareHealth};

const MS_PER_HOUR: f64 = 3_600_000.0;
const MS_PER_MINUTE: f64 = 60_000.0;

/// Pairs closer than this (about 36 seconds) are treated as duplicates.
pub const MIN_INTERVAL_HOURS: f64 = 0.01;
/// Per-interval drain rates outside this window are noise or sleep gaps.
pub const PLAUSIBLE_DRAIN_PERCENT_PER_HOUR: std::ops::RangeInclusive<f64> = 0.1..=50.0;
/// Flat drain assumed by the history heuristic when nothing was measured.
pub const ASSUMED_DRAIN_PERCENT_PER_HOUR: f64 = 5.0;
/// Capacity inference is only meaningful close to a full charge.
pub const CAPACITY_HEALTH_MIN_LEVEL: u8 = 95;

/// Ordinal health grade from the history heuristic, worst first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthGrade {
    Poor,
    /// Level-only verdict when the battery is nearly empty and history is too short.
    Low,
    Fair,
    Good,
    Excellent,
}

impl HealthGrade {
    pub fn label(&self) -> &'static str {
        match self {
            HealthGrade::Poor => "Poor",
            HealthGrade::Low => "Low",
            HealthGrade::Fair => "Fair",
            HealthGrade::Good => "Good",
            HealthGrade::Excellent => "Excellent",
        }
    }
}

impl fmt::Display for HealthGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Time-remaining estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimeRemaining {
    /// Platform-provided time until full.
    ToFull { minutes: u64 },
    /// Charging, but nobody supplied an estimate.
    Charging,
    /// Time until empty. `approximate` marks the flat-drain fallback.
    Remaining { minutes: u64, approximate: bool },
    #[default]
    Unavailable,
}

impl fmt::Display for TimeRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeRemaining::ToFull { minutes } => {
                write!(f, "{} to full", format_duration_minutes(*minutes))
            }
            TimeRemaining::Charging => write!(f, "Charging"),
            TimeRemaining::Remaining {
                minutes,
                approximate: true,
            } => write!(f, "~{}", format_duration_minutes(*minutes)),
            TimeRemaining::Remaining { minutes, .. } => {
                write!(f, "{}", format_duration_minutes(*minutes))
            }
            TimeRemaining::Unavailable => write!(f, "N/A"),
        }
    }
}

/// Everything derived from one `(samples, snapshot)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DerivedMetrics {
    /// Average discharge rate from history, %/h. Zero when undeterminable.
    pub drain_rate_percent_per_hour: f64,
    /// Instantaneous drain from measured current.
    pub live_drain_ma: Option<f64>,
    /// Instantaneous drain relative to design capacity, %/h.
    pub live_drain_percent_per_hour: Option<f64>,
    /// Not-charging to charging transitions seen in history.
    pub charge_cycles: u32,
    /// Cycle count reported by the battery, passed through untouched.
    pub hardware_cycle_count: Option<u32>,
    pub hardware_health: Option<HardwareHealth>,
    /// History heuristic, only computed when the hardware reports no health.
    pub health_grade: Option<HealthGrade>,
    /// Full-charge capacity versus design, %. `None` means insufficient data.
    pub capacity_health_percent: Option<f64>,
    pub time_remaining: TimeRemaining,
}

impl DerivedMetrics {
    /// Health as shown to users: hardware verdict first, then the heuristic.
    pub fn health_label(&self) -> &'static str {
        match (self.hardware_health, self.health_grade) {
            (Some(hardware), _) => hardware.label(),
            (None, Some(grade)) => grade.label(),
            (None, None) => "Insufficient data",
        }
    }
}

/// Compute every derived metric.
pub fn compute(samples: &[BatterySample], snapshot: Option<&BatterySnapshot>) -> DerivedMetrics {
    let level = current_level(samples, snapshot);
    let live_drain = snapshot.and_then(live_drain_ma);
    let live_drain_percent = live_drain
        .zip(snapshot.and_then(|s| s.design_capacity_mah))
        .and_then(|(drain_ma, design)| live_drain_percent_per_hour(drain_ma, design));
    let hardware_health = snapshot.and_then(|s| s.health);
    let health_grade = match hardware_health {
        Some(_) => None,
        None => level.map(|l| classify_health_from_history(samples, l)),
    };

    DerivedMetrics {
        drain_rate_percent_per_hour: drain_rate_from_history(samples),
        live_drain_ma: live_drain,
        live_drain_percent_per_hour: live_drain_percent,
        charge_cycles: count_charge_cycles(samples),
        hardware_cycle_count: snapshot.and_then(|s| s.cycle_count),
        hardware_health,
        health_grade,
        capacity_health_percent: snapshot
            .filter(|s| s.is_hardware_source())
            .and_then(capacity_health_percent),
        time_remaining: estimate_time_remaining(samples, snapshot),
    }
}

/// Average discharge rate in percent per hour over non-charging samples.
///
/// Only consecutive pairs where the level fell, at least
/// [`MIN_INTERVAL_HOURS`] apart, with a rate inside
/// [`PLAUSIBLE_DRAIN_PERCENT_PER_HOUR`] count. Returns 0 when nothing qualifies.
pub fn drain_rate_from_history(samples: &[BatterySample]) -> f64 {
    let discharging: Vec<&BatterySample> = samples.iter().filter(|s| !s.is_charging()).collect();
    if discharging.len() < 2 {
        return 0.0;
    }

    let rates: Vec<f64> = discharging
        .windows(2)
        .filter_map(|pair| {
            let (prev, next) = (pair[0], pair[1]);
            let hours = (next.timestamp() - prev.timestamp()) as f64 / MS_PER_HOUR;
            let dropped = i32::from(prev.level()) - i32::from(next.level());

            if dropped <= 0 || hours <= MIN_INTERVAL_HOURS {
                return None;
            }

            let rate = f64::from(dropped) / hours;
            PLAUSIBLE_DRAIN_PERCENT_PER_HOUR
                .contains(&rate)
                .then_some(rate)
        })
        .collect();

    if rates.is_empty() {
        0.0
    } else {
        rates.iter().sum::<f64>() / rates.len() as f64
    }
}

/// Live drain in mA from the measured current. The sign is ignored.
pub fn live_drain_ma(snapshot: &BatterySnapshot) -> Option<f64> {
    snapshot
        .current_now_ua
        .map(|microamps| (microamps as f64).abs() / 1000.0)
}

/// Live drain relative to design capacity, rounded to one decimal.
pub fn live_drain_percent_per_hour(drain_ma: f64, design_capacity_mah: u32) -> Option<f64> {
    if drain_ma <= 0.0 || design_capacity_mah == 0 {
        return None;
    }
    Some((drain_ma / f64::from(design_capacity_mah) * 100.0 * 10.0).round() / 10.0)
}

/// Number of not-charging to charging transitions.
pub fn count_charge_cycles(samples: &[BatterySample]) -> u32 {
    samples
        .windows(2)
        .filter(|pair| pair[1].is_charging() && !pair[0].is_charging())
        .count() as u32
}

/// History heuristic used when the hardware reports no health of its own.
pub fn classify_health_from_history(samples: &[BatterySample], level: u8) -> HealthGrade {
    if samples.len() < 2 {
        return match level {
            50.. => HealthGrade::Good,
            20.. => HealthGrade::Fair,
            _ => HealthGrade::Low,
        };
    }

    let drain = drain_rate_from_history(samples);
    if drain > 0.0 {
        return if drain < 3.0 {
            HealthGrade::Excellent
        } else if drain < 6.0 {
            HealthGrade::Good
        } else if drain < 12.0 {
            HealthGrade::Fair
        } else {
            HealthGrade::Poor
        };
    }

    if level >= 40 {
        HealthGrade::Good
    } else {
        HealthGrade::Fair
    }
}

/// Full-charge capacity as a percentage of design capacity.
///
/// Needs a level of at least [`CAPACITY_HEALTH_MIN_LEVEL`] plus a positive
/// charge counter and design capacity; returns `None` otherwise.
pub fn capacity_health_percent(snapshot: &BatterySnapshot) -> Option<f64> {
    let level = snapshot
        .level
        .filter(|l| *l >= CAPACITY_HEALTH_MIN_LEVEL)?;
    let counter_uah = snapshot.charge_counter_uah.filter(|c| *c > 0)?;
    let design_mah = snapshot.design_capacity_mah.filter(|d| *d > 0)?;

    let full_capacity_mah = (counter_uah as f64 / 1000.0) / (f64::from(level) / 100.0);
    let percent = full_capacity_mah / f64::from(design_mah) * 100.0;
    Some(percent.clamp(0.0, 100.0))
}

/// Time until full or empty.
pub fn estimate_time_remaining(
    samples: &[BatterySample],
    snapshot: Option<&BatterySnapshot>,
) -> TimeRemaining {
    let is_charging = snapshot
        .map(|s| s.is_charging)
        .or_else(|| samples.last().map(BatterySample::is_charging))
        .unwrap_or(false);

    if is_charging {
        return match snapshot.and_then(|s| s.charge_time_remaining_ms).filter(|ms| *ms > 0) {
            Some(ms) => TimeRemaining::ToFull {
                minutes: (ms as f64 / MS_PER_MINUTE).round() as u64,
            },
            None => TimeRemaining::Charging,
        };
    }

    match snapshot {
        Some(s) if s.is_hardware_source() => discharge_time_from_current(s),
        _ => discharge_time_from_history(
            current_level(samples, snapshot),
            drain_rate_from_history(samples),
        ),
    }
}

fn discharge_time_from_current(snapshot: &BatterySnapshot) -> TimeRemaining {
    let Some(drain_ma) = live_drain_ma(snapshot).filter(|d| *d > 0.0) else {
        return TimeRemaining::Unavailable;
    };

    let remaining_mah = snapshot
        .charge_counter_uah
        .filter(|c| *c > 0)
        .map(|c| c as f64 / 1000.0)
        .or_else(|| {
            let level = snapshot.level?;
            let design = snapshot.design_capacity_mah.filter(|d| *d > 0)?;
            Some(f64::from(level) / 100.0 * f64::from(design))
        });

    match remaining_mah {
        Some(mah) => TimeRemaining::Remaining {
            minutes: (mah / drain_ma * 60.0).round() as u64,
            approximate: false,
        },
        None => TimeRemaining::Unavailable,
    }
}

fn discharge_time_from_history(level: Option<u8>, drain_rate: f64) -> TimeRemaining {
    let Some(level) = level else {
        return TimeRemaining::Unavailable;
    };

    let (rate, approximate) = if drain_rate > 0.0 {
        (drain_rate, false)
    } else {
        (ASSUMED_DRAIN_PERCENT_PER_HOUR, true)
    };

    TimeRemaining::Remaining {
        minutes: (f64::from(level) / rate * 60.0).round() as u64,
        approximate,
    }
}

fn current_level(samples: &[BatterySample], snapshot: Option<&BatterySnapshot>) -> Option<u8> {
    snapshot
        .and_then(|s| s.level)
        .or_else(|| samples.last().map(BatterySample::level))
}
