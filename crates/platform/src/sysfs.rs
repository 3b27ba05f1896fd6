//! Full-telemetry provider reading Linux `power_supply` sysfs nodes.

use std::fs;
use std::path::{Path, PathBuf};

use battwise_core::{Capability, RawBatteryInfo};
use color_eyre::eyre::{eyre, Result, WrapErr};

use crate::BatteryProvider;

const POWER_SUPPLY_PATH: &str = "/sys/class/power_supply";

/// A battery exposing current draw plus a charge counter under sysfs.
#[derive(Debug, Clone)]
pub struct SysfsBattery {
    root: PathBuf,
    battery: PathBuf,
}

impl SysfsBattery {
    /// Look for a full-telemetry battery under the system sysfs tree.
    pub fn detect() -> Option<Self> {
        Self::with_root(POWER_SUPPLY_PATH)
    }

    /// Look for a full-telemetry battery under an arbitrary `power_supply` dir.
    ///
    /// Batteries lacking `current_now` or a charge counter are skipped so the
    /// caller can fall back to a limited provider.
    pub fn with_root(root: impl Into<PathBuf>) -> Option<Self> {
        let root = root.into();
        let battery = find_supplies(&root, "Battery")
            .into_iter()
            .find(|path| has_full_telemetry(path))?;
        Some(Self { root, battery })
    }

    pub fn path(&self) -> &Path {
        &self.battery
    }

    fn plug_type(&self) -> &'static str {
        let adapters = [("Mains", "AC"), ("USB", "USB"), ("Wireless", "Wireless")];
        let mut found_any = false;

        for (kind, label) in adapters {
            for supply in find_supplies(&self.root, kind) {
                found_any = true;
                if read_i64(&supply, "online") == Some(1) {
                    return label;
                }
            }
        }

        if found_any {
            "None"
        } else {
            "Unknown"
        }
    }
}

impl BatteryProvider for SysfsBattery {
    fn read(&mut self) -> Result<RawBatteryInfo> {
        let path = &self.battery;
        let level = read_i64(path, "capacity")
            .ok_or_else(|| eyre!("No capacity reported at {}", path.display()))?;
        let status = read_string(path, "status")
            .wrap_err_with(|| format!("Failed to read status at {}", path.display()))?;

        let charge_counter = read_i64(path, "charge_counter").or_else(|| read_i64(path, "charge_now"));

        Ok(RawBatteryInfo {
            level,
            scale: 100,
            health: read_string(path, "health").unwrap_or_else(|_| "Unknown".to_string()),
            temperature: read_i64(path, "temp")
                .map(|tenths| tenths as f64 / 10.0)
                .unwrap_or(-1.0),
            voltage: read_i64(path, "voltage_now")
                .map(|microvolts| microvolts / 1000)
                .unwrap_or(-1),
            charging_status: status,
            plug_type: self.plug_type().to_string(),
            technology: read_string(path, "technology").unwrap_or_else(|_| "Unknown".to_string()),
            current_now: read_i64(path, "current_now").unwrap_or(-1),
            current_average: read_i64(path, "current_avg").unwrap_or(-1),
            charge_counter: charge_counter.unwrap_or(-1),
            energy_counter: read_i64(path, "energy_now")
                .map(|microwatt_hours| microwatt_hours * 1000)
                .unwrap_or(-1),
            design_capacity: read_i64(path, "charge_full_design")
                .map(|microamp_hours| microamp_hours / 1000)
                .unwrap_or(-1),
            charge_time_remaining: read_i64(path, "time_to_full_now")
                .map(|secs| secs * 1000)
                .unwrap_or(-1),
            cycle_count: read_i64(path, "cycle_count").unwrap_or(-1),
            is_charging: None,
            is_battery_present: read_i64(path, "present").map(|p| p == 1),
            low_power_mode: None,
        })
    }

    fn capability(&self) -> Capability {
        Capability::Full
    }

    fn name(&self) -> &'static str {
        "sysfs"
    }
}

fn find_supplies(root: &Path, kind: &str) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(root) else {
        return Vec::new();
    };

    let mut supplies: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            read_string(path, "type")
                .map(|t| t == kind)
                .unwrap_or(false)
        })
        .collect();
    supplies.sort();
    supplies
}

fn has_full_telemetry(battery: &Path) -> bool {
    let has = |name: &str| battery.join(name).exists();
    has("current_now") && (has("charge_counter") || has("charge_now"))
}

fn read_string(dir: &Path, name: &str) -> std::io::Result<String> {
    fs::read_to_string(dir.join(name)).map(|s| s.trim().to_string())
}

fn read_i64(dir: &Path, name: &str) -> Option<i64> {
    read_string(dir, name).ok()?.parse().ok()
}
