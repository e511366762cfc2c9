//! Wall-clock rendering of tick spans.

use chrono::TimeDelta;

/// Renders a span with the largest unit that keeps it above one, e.g.
/// `500ns`, `1.50µs`, `16.67ms`, `2.00s`. Negative spans keep their sign.
pub fn format_time_delta(delta: TimeDelta) -> String {
    let Some(nanos) = delta.num_nanoseconds() else {
        return format!("{}s", delta.num_seconds());
    };

    let sign = if nanos < 0 { "-" } else { "" };
    let magnitude = nanos.unsigned_abs();

    if magnitude < 1_000 {
        format!("{}{}ns", sign, magnitude)
    } else if magnitude < 1_000_000 {
        format!("{}{:.2}µs", sign, magnitude as f64 / 1_000.0)
    } else if magnitude < 1_000_000_000 {
        format!("{}{:.2}ms", sign, magnitude as f64 / 1_000_000.0)
    } else {
        format!("{}{:.2}s", sign, magnitude as f64 / 1_000_000_000.0)
    }
}
