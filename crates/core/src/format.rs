const MINUTES_PER_HOUR: u64 = 60;
const MINUTES_PER_DAY: u64 = 24 * MINUTES_PER_HOUR;

/// Format a whole number of minutes for display.
///
/// Under an hour prints `"45m"`, under a day `"2h 5m"` (or `"2h"` on the
/// hour), and anything longer rounds to days: `"1d"`.
pub fn format_duration_minutes(minutes: u64) -> String {
    if minutes < MINUTES_PER_HOUR {
        return format!("{}m", minutes);
    }

    if minutes < MINUTES_PER_DAY {
        let hours = minutes / MINUTES_PER_HOUR;
        let mins = minutes % MINUTES_PER_HOUR;
        return if mins > 0 {
            format!("{}h {}m", hours, mins)
        } else {
            format!("{}h", hours)
        };
    }

    let days = (minutes as f64 / MINUTES_PER_DAY as f64).round() as u64;
    format!("{}d", days)
}
