//! Human-readable elapsed times for the per-request debug line.

use std::time::Duration;

/// Formats `d` with the coarsest unit that keeps it under 1000 (or 60 for
/// seconds and minutes).
///
/// ```rust
/// use std::time::Duration;
/// use stackable::format_duration;
///
/// assert_eq!(format_duration(Duration::from_nanos(640)), "640ns");
/// assert_eq!(format_duration(Duration::from_micros(1_500)), "1ms");
/// assert_eq!(format_duration(Duration::from_millis(2_500)), "2.500s");
/// ```
pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos < 1_000 {
        return format!("{nanos}ns");
    }

    let micros = d.as_micros();
    if micros < 1_000 {
        return format!("{micros}µs");
    }

    let millis = d.as_millis();
    if millis < 1_000 {
        return format!("{millis}ms");
    }

    let secs = d.as_secs_f64();
    if secs < 60.0 {
        return format!("{secs:.3}s");
    }

    let minutes = secs / 60.0;
    if minutes < 60.0 {
        return format!("{minutes:.2}m");
    }

    format!("{:.2}h", minutes / 60.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_coarsest_unit() {
        assert_eq!(format_duration(Duration::ZERO), "0ns");
        assert_eq!(format_duration(Duration::from_nanos(999)), "999ns");
        assert_eq!(format_duration(Duration::from_nanos(1_000)), "1µs");
        assert_eq!(format_duration(Duration::from_micros(999)), "999µs");
        assert_eq!(format_duration(Duration::from_millis(12)), "12ms");
        assert_eq!(format_duration(Duration::from_secs(1)), "1.000s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1.50m");
        assert_eq!(format_duration(Duration::from_secs(5_400)), "1.50h");
    }
}
