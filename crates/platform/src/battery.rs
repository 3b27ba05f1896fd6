//! Battery provider trait and startup selection.

use battwise_core::{Capability, RawBatteryInfo};
use color_eyre::eyre::{eyre, Result};
use tracing::{info, warn};

use crate::generic::GenericBattery;
use crate::sysfs::SysfsBattery;

/// A platform source of raw battery records.
///
/// Implementations report whatever they can and leave the rest at the
/// sentinel defaults of [`RawBatteryInfo`]. Reads may block on file or OS
/// calls, so callers on an async runtime should move them to a blocking pool.
pub trait BatteryProvider: Send {
    /// Read a fresh raw record.
    fn read(&mut self) -> Result<RawBatteryInfo>;

    /// What this source is able to report.
    fn capability(&self) -> Capability;

    /// Short name used in logs and status output.
    fn name(&self) -> &'static str;
}

/// Provider used when no battery could be found at startup.
#[derive(Debug, Default)]
pub struct UnavailableBattery;

impl BatteryProvider for UnavailableBattery {
    fn read(&mut self) -> Result<RawBatteryInfo> {
        Err(eyre!("No battery found on this system"))
    }

    fn capability(&self) -> Capability {
        Capability::Limited
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}

/// Pick the richest provider available on this machine.
///
/// Full-telemetry sysfs nodes win over the cross-platform battery crate. The
/// choice is made once; callers keep the returned provider for the process
/// lifetime.
pub fn detect_provider() -> Box<dyn BatteryProvider> {
    if let Some(sysfs) = SysfsBattery::detect() {
        info!(path = ?sysfs.path(), "Using sysfs battery telemetry");
        return Box::new(sysfs);
    }

    if GenericBattery::is_available() {
        info!("Using generic battery telemetry");
        return Box::new(GenericBattery::new());
    }

    warn!("No battery detected, acquisition will report unavailable");
    Box::new(UnavailableBattery)
}
