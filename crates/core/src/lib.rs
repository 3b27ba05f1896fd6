//! Core model and pure calculations for battwise.
//!
//! This crate holds everything that does not touch I/O: the persisted
//! [`BatterySample`], the live [`BatterySnapshot`] and the raw record it is
//! normalized from, and the derived-metrics engine that turns a reading
//! history into drain rates, charge cycles, health and time remaining.

mod format;
mod sample;
mod snapshot;

pub mod metrics;
pub mod telemetry;
pub mod usage;

pub use format::format_duration_minutes;
pub use metrics::{DerivedMetrics, HealthGrade, TimeRemaining};
pub use sample::{BatterySample, SampleError};
pub use snapshot::{
    BatterySnapshot, Capability, ChargingStatus, HardwareHealth, PlugType, RawBatteryInfo,
};
pub use usage::UsageSummary;
