use std::time::Duration;

use anyhow::{bail, Result};

/// Suffix to milliseconds multiplier (longer suffixes first so "ms" wins over "s")
const UNITS: &[(&str, f64)] = &[
    ("ms", 1.0),
    ("µs", 0.001),
    ("us", 0.001),
    ("s", 1_000.0),
    ("m", 60_000.0),
];

/// Parse cadence strings like "500ms", "1.5s", "2m".
///
/// A bare number is taken as milliseconds, matching the `*_ms` config keys.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    let (value, multiplier) = UNITS
        .iter()
        .find_map(|(suffix, multiplier)| s.strip_suffix(suffix).map(|v| (v, *multiplier)))
        .unwrap_or((s, 1.0));

    let value: f64 = value.trim().parse()?;
    if !value.is_finite() || value < 0.0 {
        bail!("Invalid duration: {}", s);
    }

    match Duration::try_from_secs_f64(value * multiplier / 1_000.0) {
        Ok(d) => Ok(d),
        Err(_) => bail!("Invalid duration: {}", s),
    }
}

/// Format a duration for the status bar
pub fn format_duration(d: Duration) -> String {
    let millis = d.as_millis();
    if millis < 1_000 {
        format!("{}ms", millis)
    } else if millis < 60_000 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m{:02}s", d.as_secs() / 60, d.as_secs() % 60)
    }
}
