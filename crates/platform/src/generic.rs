use battwise_core::{Capability, RawBatteryInfo};
use color_eyre::eyre::{eyre, Result};
use starship_battery::units::electric_potential::millivolt;
use starship_battery::units::ratio::percent;
use starship_battery::units::thermodynamic_temperature::degree_celsius;
use starship_battery::units::time::second;
use starship_battery::{Manager, State};

/// Capability-limited provider backed by the cross-platform battery crate.
///
/// Only level and charging state are trusted; current draw, charge counter
/// and design capacity in mAh are never reported.
#[derive(Debug, Default)]
pub struct GenericBattery;

impl GenericBattery {
    pub fn new() -> Self {
        Self
    }

    /// True when the battery crate can see at least one battery.
    pub fn is_available() -> bool {
        Manager::new()
            .ok()
            .and_then(|m| m.batteries().ok())
            .and_then(|mut b| b.next())
            .and_then(|b| b.ok())
            .is_some()
    }
}

impl crate::BatteryProvider for GenericBattery {
    fn read(&mut self) -> Result<RawBatteryInfo> {
        // Manager is not Send, so it lives only for the duration of a read.
        let manager = Manager::new()?;
        let battery = manager
            .batteries()?
            .next()
            .ok_or_else(|| eyre!("No battery found"))??;

        Ok(RawBatteryInfo {
            level: battery.state_of_charge().get::<percent>().round() as i64,
            scale: 100,
            charging_status: status_label(battery.state()).to_string(),
            temperature: battery
                .temperature()
                .map(|t| f64::from(t.get::<degree_celsius>()))
                .unwrap_or(-1.0),
            voltage: battery.voltage().get::<millivolt>().round() as i64,
            technology: battery.technology().to_string(),
            charge_time_remaining: battery
                .time_to_full()
                .map(|t| (t.get::<second>() * 1000.0) as i64)
                .unwrap_or(-1),
            cycle_count: battery.cycle_count().map(i64::from).unwrap_or(-1),
            is_battery_present: Some(true),
            ..Default::default()
        })
    }

    fn capability(&self) -> Capability {
        Capability::Limited
    }

    fn name(&self) -> &'static str {
        "generic"
    }
}

fn status_label(state: State) -> &'static str {
    match state {
        State::Charging => "Charging",
        State::Discharging | State::Empty => "Discharging",
        State::Full => "Full",
        State::Unknown => "Unknown",
    }
}
