//! Usage summary handed to the advisory client.

use serde::{Deserialize, Serialize};

use crate::metrics::{count_charge_cycles, drain_rate_from_history};
use crate::sample::BatterySample;
use crate::snapshot::{BatterySnapshot, ChargingStatus};

/// Every stored sample is treated as a quarter hour of coverage.
pub const HOURS_PER_SAMPLE: f64 = 0.25;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UsageSummary {
    pub level: Option<u8>,
    pub state_label: String,
    pub is_charging: bool,
    pub low_power_mode: Option<bool>,
    pub sample_count: usize,
    /// Mean level across the history, or the live level without history.
    pub average_level: Option<f64>,
    pub charging_share_percent: f64,
    pub charge_cycles: u32,
    pub drain_rate_percent_per_hour: f64,
    pub covered_hours: f64,
}

impl UsageSummary {
    pub fn is_critically_low(&self) -> bool {
        self.level.is_some_and(|l| l < 20)
    }

    pub fn is_nearly_full_while_charging(&self) -> bool {
        self.is_charging && self.level.is_some_and(|l| l > 90)
    }

    pub fn is_draining_fast(&self) -> bool {
        self.drain_rate_percent_per_hour > 10.0
    }
}

pub fn summarize_usage(samples: &[BatterySample], snapshot: Option<&BatterySnapshot>) -> UsageSummary {
    let last = samples.last();
    let level = snapshot
        .and_then(|s| s.level)
        .or_else(|| last.map(BatterySample::level));
    let is_charging = snapshot
        .map(|s| s.is_charging)
        .or_else(|| last.map(BatterySample::is_charging))
        .unwrap_or(false);

    let status = match snapshot {
        Some(s) => s.status,
        None if last.is_some() && is_charging => ChargingStatus::Charging,
        None if last.is_some() => ChargingStatus::Discharging,
        None => ChargingStatus::Unknown,
    };

    let average_level = if samples.is_empty() {
        level.map(f64::from)
    } else {
        let total: u32 = samples.iter().map(|s| u32::from(s.level())).sum();
        Some(f64::from(total) / samples.len() as f64)
    };

    let charging = samples.iter().filter(|s| s.is_charging()).count();
    let charging_share_percent = if samples.is_empty() {
        0.0
    } else {
        charging as f64 / samples.len() as f64 * 100.0
    };

    UsageSummary {
        level,
        state_label: status.label().to_string(),
        is_charging,
        low_power_mode: snapshot.and_then(|s| s.low_power_mode),
        sample_count: samples.len(),
        average_level,
        charging_share_percent,
        charge_cycles: count_charge_cycles(samples),
        drain_rate_percent_per_hour: drain_rate_from_history(samples),
        covered_hours: samples.len() as f64 * HOURS_PER_SAMPLE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample(timestamp: i64, level: i64, is_charging: bool) -> BatterySample {
        BatterySample::new(timestamp, level, is_charging, None).unwrap()
    }

    #[test]
    fn test_summary_from_history() {
        let samples = [
            sample(0, 80, false),
            sample(3_600_000, 70, false),
            sample(7_200_000, 72, true),
            sample(10_800_000, 78, true),
        ];
        let summary = summarize_usage(&samples, None);

        assert_eq!(summary.level, Some(78));
        assert_eq!(summary.state_label, "Charging");
        assert_eq!(summary.sample_count, 4);
        assert_eq!(summary.average_level, Some(75.0));
        assert_eq!(summary.charging_share_percent, 50.0);
        assert_eq!(summary.charge_cycles, 1);
        assert_eq!(summary.drain_rate_percent_per_hour, 10.0);
        assert_eq!(summary.covered_hours, 1.0);
    }

    #[test]
    fn test_summary_without_history_uses_snapshot() {
        let snapshot = BatterySnapshot {
            level: Some(15),
            status: ChargingStatus::Discharging,
            low_power_mode: Some(true),
            ..Default::default()
        };
        let summary = summarize_usage(&[], Some(&snapshot));

        assert_eq!(summary.average_level, Some(15.0));
        assert_eq!(summary.charging_share_percent, 0.0);
        assert_eq!(summary.state_label, "Discharging");
        assert_eq!(summary.low_power_mode, Some(true));
        assert!(summary.is_critically_low());
        assert!(!summary.is_draining_fast());
    }

    #[test]
    fn test_nearly_full_while_charging() {
        let snapshot = BatterySnapshot {
            level: Some(95),
            status: ChargingStatus::Charging,
            is_charging: true,
            ..Default::default()
        };
        let summary = summarize_usage(&[], Some(&snapshot));
        assert!(summary.is_nearly_full_while_charging());
        assert!(!summary.is_critically_low());
    }
}
