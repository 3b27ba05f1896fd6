use std::time::Duration;

use chrono::{DateTime, Local};
use color_eyre::eyre::Result;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;
use tracing::info;

use crate::config::UserConfig;
use crate::data::DashboardState;

pub async fn run(config: &UserConfig, interval: Duration, count: u32) -> Result<()> {
    let monitor = super::open_monitor(config, interval)?;
    let mut updates = WatchStream::from_changes(monitor.subscribe());

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted");
        }
    };

    let printer = async {
        let mut printed = 0u32;
        while let Some(state) = updates.next().await {
            if state.loading {
                continue;
            }
            println!("{}", format_line(&state));

            printed += 1;
            if count > 0 && printed >= count {
                break;
            }
        }
    };

    tokio::select! {
        _ = monitor.run(shutdown) => {}
        _ = printer => {}
    }

    Ok(())
}

/// One compact line per published update.
pub fn format_line(state: &DashboardState) -> String {
    let time = state
        .updated_at
        .and_then(DateTime::from_timestamp_millis)
        .map(|t| t.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string());

    let Some(snapshot) = &state.snapshot else {
        return format!("{}  no battery reading", time);
    };

    let level = snapshot
        .level
        .map(|l| format!("{:>3}%", l))
        .unwrap_or_else(|| "  ?%".to_string());
    let mut line = format!(
        "{}  {}  {:<12}  {}",
        time,
        level,
        snapshot.status.label(),
        state.metrics.time_remaining
    );

    if state.metrics.drain_rate_percent_per_hour > 0.0 {
        line.push_str(&format!(
            "  drain {:.1}%/h",
            state.metrics.drain_rate_percent_per_hour
        ));
    }
    line.push_str(&format!("  health {}", state.metrics.health_label()));
    line
}
