//! Live battery state and the raw record it is built from.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What a telemetry source is able to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Current draw, charge counter and design capacity are available.
    Full,
    /// Only level and charging state can be trusted.
    #[default]
    Limited,
}

impl Capability {
    pub fn label(&self) -> &'static str {
        match self {
            Capability::Full => "Full telemetry",
            Capability::Limited => "Limited telemetry",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Battery charging status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChargingStatus {
    Charging,
    Discharging,
    Full,
    /// External power connected but not charging (e.g. charge limit reached)
    NotCharging,
    #[default]
    Unknown,
}

impl ChargingStatus {
    /// Parses the status strings reported by platform sources.
    ///
    /// Accepts "Charging", "CHARGING", "Not Charging", "NOT_CHARGING" and so on.
    pub fn parse(raw: &str) -> Self {
        match squash(raw).as_str() {
            "charging" => ChargingStatus::Charging,
            "discharging" => ChargingStatus::Discharging,
            "full" => ChargingStatus::Full,
            "notcharging" => ChargingStatus::NotCharging,
            _ => ChargingStatus::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChargingStatus::Charging => "Charging",
            ChargingStatus::Discharging => "Discharging",
            ChargingStatus::Full => "Full",
            ChargingStatus::NotCharging => "Not Charging",
            ChargingStatus::Unknown => "Unknown",
        }
    }

    /// Whether this status counts as charging when the source has no explicit flag.
    pub fn implies_charging(&self) -> bool {
        matches!(self, ChargingStatus::Charging | ChargingStatus::Full)
    }
}

impl fmt::Display for ChargingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Health as reported by the battery hardware itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HardwareHealth {
    Good,
    Overheat,
    Dead,
    OverVoltage,
    Cold,
    Failure,
}

impl HardwareHealth {
    /// Returns `None` for "Unknown" or anything unrecognised.
    pub fn parse(raw: &str) -> Option<Self> {
        match squash(raw).as_str() {
            "good" => Some(HardwareHealth::Good),
            "overheat" => Some(HardwareHealth::Overheat),
            "dead" => Some(HardwareHealth::Dead),
            "overvoltage" => Some(HardwareHealth::OverVoltage),
            "cold" => Some(HardwareHealth::Cold),
            "failure" | "unspecifiedfailure" => Some(HardwareHealth::Failure),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HardwareHealth::Good => "Good",
            HardwareHealth::Overheat => "Overheat",
            HardwareHealth::Dead => "Dead",
            HardwareHealth::OverVoltage => "Over Voltage",
            HardwareHealth::Cold => "Cold",
            HardwareHealth::Failure => "Failure",
        }
    }
}

impl fmt::Display for HardwareHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Power source the device is plugged into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlugType {
    Ac,
    Usb,
    Wireless,
    Unplugged,
}

impl PlugType {
    pub fn parse(raw: &str) -> Option<Self> {
        match squash(raw).as_str() {
            "ac" | "mains" => Some(PlugType::Ac),
            "usb" => Some(PlugType::Usb),
            "wireless" => Some(PlugType::Wireless),
            "none" => Some(PlugType::Unplugged),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlugType::Ac => "AC",
            PlugType::Usb => "USB",
            PlugType::Wireless => "Wireless",
            PlugType::Unplugged => "None",
        }
    }
}

fn squash(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Flat record handed over by a platform telemetry source.
///
/// Mirrors what mobile battery APIs expose: every integer field uses `-1` for
/// "not supplied" and string fields use `"Unknown"`. Nothing in here should be
/// consumed directly; run it through [`crate::telemetry::normalize`] first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawBatteryInfo {
    pub level: i64,
    /// Full-scale value for `level`; `-1` or `100` means percent.
    pub scale: i64,
    pub health: String,
    /// Degrees Celsius.
    pub temperature: f64,
    /// Millivolts.
    pub voltage: i64,
    pub charging_status: String,
    pub plug_type: String,
    pub technology: String,
    /// Microamps, signed. Sign convention depends on the device.
    pub current_now: i64,
    /// Microamps, signed.
    pub current_average: i64,
    /// Microamp-hours remaining.
    pub charge_counter: i64,
    /// Nanowatt-hours remaining.
    pub energy_counter: i64,
    /// Milliamp-hours as designed.
    pub design_capacity: i64,
    /// Milliseconds until full, while charging.
    pub charge_time_remaining: i64,
    pub cycle_count: i64,
    pub is_charging: Option<bool>,
    pub is_battery_present: Option<bool>,
    pub low_power_mode: Option<bool>,
}

impl Default for RawBatteryInfo {
    fn default() -> Self {
        Self {
            level: -1,
            scale: -1,
            health: "Unknown".to_string(),
            temperature: -1.0,
            voltage: -1,
            charging_status: "Unknown".to_string(),
            plug_type: "Unknown".to_string(),
            technology: "Unknown".to_string(),
            current_now: -1,
            current_average: -1,
            charge_counter: -1,
            energy_counter: -1,
            design_capacity: -1,
            charge_time_remaining: -1,
            cycle_count: -1,
            is_charging: None,
            is_battery_present: None,
            low_power_mode: None,
        }
    }
}

/// The current battery state as last acquired.
///
/// Every measurement is an `Option`: `None` means the source could not
/// supply it, never "zero".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BatterySnapshot {
    /// Acquisition time in milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub capability: Capability,
    pub level: Option<u8>,
    pub status: ChargingStatus,
    pub is_charging: bool,
    pub health: Option<HardwareHealth>,
    pub plug: Option<PlugType>,
    pub technology: Option<String>,
    pub temperature_c: Option<f32>,
    pub voltage_mv: Option<u32>,
    pub current_now_ua: Option<i64>,
    pub current_average_ua: Option<i64>,
    pub charge_counter_uah: Option<u64>,
    pub energy_counter_nwh: Option<u64>,
    pub design_capacity_mah: Option<u32>,
    pub cycle_count: Option<u32>,
    pub charge_time_remaining_ms: Option<u64>,
    pub battery_present: Option<bool>,
    pub low_power_mode: Option<bool>,
}

impl BatterySnapshot {
    /// True when the snapshot came from a full-telemetry source.
    pub fn is_hardware_source(&self) -> bool {
        self.capability == Capability::Full
    }
}
