use battwise_core::metrics::{
    capacity_health_percent, compute, count_charge_cycles, drain_rate_from_history,
    live_drain_ma, live_drain_percent_per_hour,
};
use battwise_core::telemetry::normalize;
use battwise_core::*;
use pretty_assertions::assert_eq;

const HOUR_MS: i64 = 3_600_000;

fn sample(timestamp: i64, level: i64, is_charging: bool) -> BatterySample {
    BatterySample::new(timestamp, level, is_charging, None).unwrap()
}

/// What a phone with full telemetry hands over mid-discharge.
fn android_record() -> RawBatteryInfo {
    serde_json::from_str(
        r#"{
            "level": 96,
            "scale": 100,
            "health": "Good",
            "temperature": 29.4,
            "voltage": 4310,
            "chargingStatus": "Discharging",
            "plugType": "None",
            "technology": "Li-poly",
            "currentNow": -500000,
            "currentAverage": -480000,
            "chargeCounter": 2850000,
            "energyCounter": -1,
            "designCapacity": 3000,
            "chargeTimeRemaining": -1,
            "cycleCount": 143,
            "isBatteryPresent": true
        }"#,
    )
    .unwrap()
}

#[test]
fn test_charge_cycles_over_mixed_sequence() {
    let flags = [false, false, true, true, false, true];
    let samples: Vec<_> = flags
        .iter()
        .enumerate()
        .map(|(i, charging)| sample(i as i64 * HOUR_MS, 50, *charging))
        .collect();

    assert_eq!(count_charge_cycles(&samples), 2);
}

#[test]
fn test_drain_rate_excludes_charging_pair() {
    let plain = [sample(0, 100, false), sample(HOUR_MS, 90, false)];
    assert_eq!(drain_rate_from_history(&plain), 10.0);

    let interrupted = [
        sample(0, 100, false),
        sample(HOUR_MS / 2, 97, true),
        sample(HOUR_MS, 90, false),
    ];
    assert_eq!(drain_rate_from_history(&interrupted), 10.0);
}

#[test]
fn test_live_drain_from_raw_record() {
    let snapshot = normalize(&android_record(), Capability::Full, 0);

    let drain = live_drain_ma(&snapshot).unwrap();
    assert_eq!(drain, 500.0);
    assert_eq!(live_drain_percent_per_hour(drain, 3000), Some(16.7));
}

#[test]
fn test_capacity_health_threshold() {
    let snapshot = normalize(&android_record(), Capability::Full, 0);
    let percent = capacity_health_percent(&snapshot).unwrap();
    assert!((0.0..=100.0).contains(&percent));

    let mut record = android_record();
    record.level = 80;
    let snapshot = normalize(&record, Capability::Full, 0);
    assert_eq!(capacity_health_percent(&snapshot), None);
    assert_eq!(compute(&[], Some(&snapshot)).capacity_health_percent, None);
}

#[test]
fn test_duration_formatting() {
    assert_eq!(format_duration_minutes(45), "45m");
    assert_eq!(format_duration_minutes(125), "2h 5m");
    assert_eq!(format_duration_minutes(1500), "1d");
}

#[test]
fn test_full_and_limited_sources_diverge() {
    let history = [
        sample(0, 100, false),
        sample(HOUR_MS, 98, false),
        sample(2 * HOUR_MS, 96, false),
    ];

    let full = normalize(&android_record(), Capability::Full, 2 * HOUR_MS);
    let metrics = compute(&history, Some(&full));
    // 2850 mAh at 500 mA
    assert_eq!(
        metrics.time_remaining,
        TimeRemaining::Remaining {
            minutes: 342,
            approximate: false
        }
    );
    assert_eq!(metrics.hardware_cycle_count, Some(143));
    assert_eq!(metrics.health_label(), "Good");
    assert!(metrics.capacity_health_percent.is_some());

    let limited_raw = RawBatteryInfo {
        level: 96,
        charging_status: "Discharging".to_string(),
        ..Default::default()
    };
    let limited = normalize(&limited_raw, Capability::Limited, 2 * HOUR_MS);
    let metrics = compute(&history, Some(&limited));
    // 96% at the measured 2%/h
    assert_eq!(
        metrics.time_remaining,
        TimeRemaining::Remaining {
            minutes: 2880,
            approximate: false
        }
    );
    assert_eq!(metrics.live_drain_ma, None);
    assert_eq!(metrics.capacity_health_percent, None);
    assert_eq!(metrics.health_grade, Some(HealthGrade::Excellent));
}

#[test]
fn test_metrics_serialize_for_consumers() {
    let metrics = compute(&[], None);
    let json = serde_json::to_value(&metrics).unwrap();
    assert_eq!(json["time_remaining"]["kind"], "unavailable");
    assert_eq!(json["charge_cycles"], 0);
}
