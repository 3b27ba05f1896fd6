use std::time::Duration;

use battwise_core::BatterySample;
use bytesize::ByteSize;
use chrono::{DateTime, Local, Utc};
use color_eyre::eyre::Result;

use crate::config::UserConfig;
use crate::data::ReadingStore;

const TREND_HOURS: f64 = 24.0;
const TREND_POINTS: usize = 12;
const TREND_BAR_WIDTH: usize = 40;

pub fn run(config: &UserConfig, since: Duration, trend: bool) -> Result<()> {
    let store = ReadingStore::open(super::open_store()?, &config.history);

    if trend {
        let points = trend_points(&store.all(), Utc::now().timestamp_millis());
        print_trend(&points);
        return Ok(());
    }

    let stats = store.stats();

    let hours = since.as_secs_f64() / 3600.0;
    let now = Utc::now().timestamp_millis();
    let samples = store.all_since_at(hours, now);

    println!(
        "Battery History (last {})",
        humantime::format_duration(since)
    );
    println!("{}", "=".repeat(50));

    if samples.is_empty() {
        println!("No readings in this period.");
        println!("\nReadings are recorded while `battwise watch` is running.");
    } else {
        println!("{:<22}{:>6}  {:<10}{:>8}", "Time", "Level", "State", "Temp");
        println!("{}", "-".repeat(50));
        for sample in &samples {
            println!("{}", format_row(sample));
        }
    }

    println!();
    println!("{:<18}{} ({:.1}h window)", "In period:", samples.len(), hours);
    println!("{:<18}{}", "Stored total:", stats.sample_count);
    if let (Some(oldest), Some(newest)) = (stats.oldest_sample, stats.newest_sample) {
        println!("{:<18}{}", "Oldest:", format_time(oldest));
        println!("{:<18}{}", "Newest:", format_time(newest));
        println!("{:<18}{}", "Last reading:", super::age_since(newest, now));
    }
    println!(
        "{:<18}{}",
        "Storage size:",
        ByteSize::b(stats.size_bytes).display().si()
    );

    Ok(())
}

/// Readings newer than 24h, thinned to about [`TREND_POINTS`] by keeping
/// every `ceil(n / TREND_POINTS)`-th one.
fn trend_points(samples: &[BatterySample], now_ms: i64) -> Vec<BatterySample> {
    let cutoff = now_ms - (TREND_HOURS * 3_600_000.0) as i64;
    let recent: Vec<_> = samples
        .iter()
        .filter(|s| s.timestamp() > cutoff)
        .copied()
        .collect();

    if recent.len() <= TREND_POINTS {
        return recent;
    }
    let step = recent.len().div_ceil(TREND_POINTS);
    recent.into_iter().step_by(step).collect()
}

fn print_trend(points: &[BatterySample]) {
    println!("Battery Trend (24h)");
    println!("{}", "=".repeat(50));

    if points.len() < 2 {
        println!("Collecting data... Check back in 30 minutes.");
        return;
    }

    for point in points {
        println!("{}", format_trend_row(point));
    }
}

fn format_trend_row(sample: &BatterySample) -> String {
    let time = DateTime::from_timestamp_millis(sample.timestamp())
        .map(|t| t.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string());
    let filled = usize::from(sample.level()) * TREND_BAR_WIDTH / 100;

    format!(
        "{}  {:<width$}  {:>3}%",
        time,
        "#".repeat(filled),
        sample.level(),
        width = TREND_BAR_WIDTH
    )
}

fn format_row(sample: &BatterySample) -> String {
    let state = if sample.is_charging() {
        "Charging"
    } else {
        "Draining"
    };
    let temp = sample
        .temperature()
        .map(|t| format!("{:.1}°C", t))
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{:<22}{:>5}%  {:<10}{:>8}",
        format_time(sample.timestamp()),
        sample.level(),
        state,
        temp
    )
}

fn format_time(timestamp_ms: i64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}
