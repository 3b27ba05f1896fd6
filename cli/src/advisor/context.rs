use std::fmt::Write;

use battwise_core::UsageSummary;

/// Render the user message sent to the advisor.
pub fn build_context(summary: &UsageSummary) -> String {
    let level = summary
        .level
        .map(|l| format!("{}%", l))
        .unwrap_or_else(|| "unknown".to_string());
    let low_power = if summary.low_power_mode == Some(true) {
        "ON"
    } else {
        "OFF"
    };
    let average = summary
        .average_level
        .map(|a| format!("{}%", a.round()))
        .unwrap_or_else(|| "unknown".to_string());

    let mut context = String::new();
    let _ = write!(
        context,
        "Current battery status:\n\
         - Level: {level}\n\
         - State: {state}\n\
         - Low Power Mode: {low_power}\n\
         \n\
         Usage patterns (last {hours} hours):\n\
         - Average battery level: {average}\n\
         - Charging sessions: {cycles}\n\
         - Time spent charging: {charging}%\n\
         - Average drain rate: {drain:.1}% per hour",
        state = summary.state_label,
        hours = summary.covered_hours.round(),
        cycles = summary.charge_cycles,
        charging = summary.charging_share_percent.round(),
        drain = summary.drain_rate_percent_per_hour,
    );

    if summary.is_critically_low() {
        context.push_str("\n\nNote: Battery is critically low.");
    } else if summary.is_nearly_full_while_charging() {
        context.push_str("\n\nNote: Battery is nearly full while still charging.");
    }

    if summary.is_draining_fast() {
        context.push_str("\n\nNote: Battery is draining faster than usual.");
    }

    context.push_str("\n\nProvide a personalized tip to help maintain better battery health.");
    context
}
