//! Battery telemetry providers for battwise.
//!
//! Each provider hands back a [`battwise_core::RawBatteryInfo`] with sentinel
//! defaults for anything it cannot measure, plus the [`Capability`] of the
//! source. [`detect_provider`] picks one at startup:
//!
//! - [`SysfsBattery`] - full telemetry from Linux `power_supply` nodes
//! - [`GenericBattery`] - level and charging state via `starship-battery`
//! - [`UnavailableBattery`] - no battery; every read fails
//!
//! # Example
//!
//! ```ignore
//! use battwise_platform::detect_provider;
//!
//! let mut provider = detect_provider();
//! let raw = provider.read()?;
//! println!("{}: {}%", provider.name(), raw.level);
//! ```

mod battery;
mod generic;
mod sysfs;

pub use battery::{detect_provider, BatteryProvider, UnavailableBattery};
pub use battwise_core::Capability;
pub use generic::GenericBattery;
pub use sysfs::SysfsBattery;
