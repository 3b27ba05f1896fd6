//! Normalization of raw platform readings into a [`BatterySnapshot`].

use crate::snapshot::{
    BatterySnapshot, Capability, ChargingStatus, HardwareHealth, PlugType, RawBatteryInfo,
};

/// Sentinel used by most sources for "not supplied".
const UNKNOWN: i64 = -1;

/// Temperatures outside this window are sensor garbage, not readings.
const PLAUSIBLE_TEMPERATURE_C: std::ops::RangeInclusive<f64> = -40.0..=120.0;

/// Android reports a missing temperature extra as -1 tenths, i.e. -0.1 °C.
const TEMPERATURE_SENTINELS: [f64; 2] = [-1.0, -0.1];

/// Convert a raw record into the canonical snapshot shape.
///
/// Levels are rescaled when the source reports a non-percent scale and clamped
/// into 0-100. Any field carrying a sentinel becomes `None`.
pub fn normalize(raw: &RawBatteryInfo, capability: Capability, timestamp: i64) -> BatterySnapshot {
    let status = ChargingStatus::parse(&raw.charging_status);

    BatterySnapshot {
        timestamp,
        capability,
        level: level(raw.level, raw.scale),
        status,
        is_charging: raw.is_charging.unwrap_or_else(|| status.implies_charging()),
        health: HardwareHealth::parse(&raw.health),
        plug: PlugType::parse(&raw.plug_type),
        technology: technology(&raw.technology),
        temperature_c: temperature(raw.temperature),
        voltage_mv: non_negative(raw.voltage),
        current_now_ua: signed_current(raw.current_now),
        current_average_ua: signed_current(raw.current_average),
        charge_counter_uah: non_negative(raw.charge_counter),
        energy_counter_nwh: non_negative(raw.energy_counter),
        design_capacity_mah: non_negative(raw.design_capacity).filter(|c| *c > 0),
        cycle_count: non_negative(raw.cycle_count),
        charge_time_remaining_ms: non_negative(raw.charge_time_remaining),
        battery_present: raw.is_battery_present,
        low_power_mode: raw.low_power_mode,
    }
}

fn level(raw: i64, scale: i64) -> Option<u8> {
    if raw < 0 {
        return None;
    }

    let percent = if scale > 0 && scale != 100 {
        (raw as f64 * 100.0 / scale as f64).round() as i64
    } else {
        raw
    };

    u8::try_from(percent.min(100)).ok()
}

fn temperature(raw: f64) -> Option<f32> {
    if !raw.is_finite()
        || TEMPERATURE_SENTINELS
            .iter()
            .any(|s| (raw - s).abs() < f64::EPSILON)
    {
        return None;
    }

    PLAUSIBLE_TEMPERATURE_C
        .contains(&raw)
        .then_some(raw as f32)
}

fn non_negative<T: TryFrom<i64>>(raw: i64) -> Option<T> {
    if raw < 0 {
        None
    } else {
        T::try_from(raw).ok()
    }
}

/// Android returns `Integer.MIN_VALUE` for unsupported current properties.
fn signed_current(raw: i64) -> Option<i64> {
    if raw == UNKNOWN || raw == i64::from(i32::MIN) || raw == i64::MIN {
        None
    } else {
        Some(raw)
    }
}

fn technology(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("unknown") {
        None
    } else {
        Some(trimmed.to_string())
    }
}
