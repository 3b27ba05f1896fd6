use color_eyre::eyre::Result;

use battwise_core::{BatterySnapshot, DerivedMetrics};

use crate::config::UserConfig;
use crate::data::DashboardState;

pub async fn run(config: &UserConfig, json: bool) -> Result<()> {
    let monitor = super::open_monitor(config, config.refresh_interval())?;
    let state = monitor.refresh().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    println!(
        "Battery status ({}, {})",
        monitor.acquisition().provider_name(),
        monitor.acquisition().capability()
    );
    println!("{}", "=".repeat(50));
    print_state(&state);
    Ok(())
}

pub fn print_state(state: &DashboardState) {
    match &state.snapshot {
        Some(snapshot) => print_snapshot(snapshot),
        None => println!("No battery reading available."),
    }

    println!();
    print_metrics(&state.metrics);
    println!("{:<18}{}", "Samples stored:", state.sample_count);
}

fn print_snapshot(snapshot: &BatterySnapshot) {
    let level = snapshot
        .level
        .map(|l| format!("{}%", l))
        .unwrap_or_else(|| "Unknown".to_string());
    println!("{:<18}{}", "Level:", level);
    println!("{:<18}{}", "State:", snapshot.status);

    if let Some(plug) = snapshot.plug {
        println!("{:<18}{}", "Power source:", plug.label());
    }
    if let Some(temp) = snapshot.temperature_c {
        println!("{:<18}{:.1}°C", "Temperature:", temp);
    }
    if let Some(mv) = snapshot.voltage_mv {
        println!("{:<18}{:.2} V", "Voltage:", f64::from(mv) / 1000.0);
    }
    if let Some(ua) = snapshot.current_now_ua {
        println!("{:<18}{} mA", "Current:", ua / 1000);
    }
    if let Some(mah) = snapshot.design_capacity_mah {
        println!("{:<18}{} mAh", "Design capacity:", mah);
    }
    if let Some(tech) = &snapshot.technology {
        println!("{:<18}{}", "Technology:", tech);
    }
    if snapshot.low_power_mode == Some(true) {
        println!("{:<18}On", "Low power mode:");
    }
}

fn print_metrics(metrics: &DerivedMetrics) {
    println!("{:<18}{}", "Health:", metrics.health_label());
    if let Some(capacity) = metrics.capacity_health_percent {
        println!("{:<18}{:.1}%", "Capacity health:", capacity);
    }
    println!("{:<18}{}", "Time remaining:", metrics.time_remaining);

    if metrics.drain_rate_percent_per_hour > 0.0 {
        println!(
            "{:<18}{:.1}%/h",
            "Avg drain:", metrics.drain_rate_percent_per_hour
        );
    }
    if let Some(ma) = metrics.live_drain_ma {
        match metrics.live_drain_percent_per_hour {
            Some(pct) => println!("{:<18}{:.0} mA ({:.1}%/h)", "Live drain:", ma, pct),
            None => println!("{:<18}{:.0} mA", "Live drain:", ma),
        }
    }

    println!("{:<18}{}", "Charge cycles:", metrics.charge_cycles);
    if let Some(cycles) = metrics.hardware_cycle_count {
        println!("{:<18}{}", "Hardware cycles:", cycles);
    }
}
