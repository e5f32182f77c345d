//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::Context;
use chrono::NaiveDateTime;
use regex::Regex;

use cycler_core::anchor::offset_by_seconds;
use cycler_core::parse_timestamp;

/// Pre-compiled regex for offsets relative to the run's anchor.
static ANCHOR_OFFSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+\s*(\d+(?:\.\d+)?)\s*(s|m|h|d)$").unwrap());

/// Layout used for timestamps in human-readable output.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Formats a timestamp for tables.
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a window bound as either an absolute timestamp or an anchor offset.
///
/// Supports:
/// - Absolute: "2024-02-21 02:16", "2024-02-21T02:16:00.5", "02/21/2024 02:16:03"
/// - Offset from the anchor: "+90s", "+30m", "+2.5h", "+1d"
pub fn parse_bound(s: &str, anchor: NaiveDateTime) -> anyhow::Result<NaiveDateTime> {
    let s = s.trim();
    if let Some(ts) = parse_timestamp(s) {
        return Ok(ts);
    }

    let Some(caps) = ANCHOR_OFFSET_RE.captures(s) else {
        anyhow::bail!(
            "Invalid time bound: {s}. Use a timestamp (e.g., 2024-02-21 02:16) or an offset from the start (e.g., +30m)"
        );
    };

    let amount: f64 = caps[1]
        .parse()
        .context("failed to parse number in time offset")?;

    let seconds_per_unit = match &caps[2] {
        "s" => 1.0,
        "m" => 60.0,
        "h" => 3_600.0,
        "d" => 86_400.0,
        unit => anyhow::bail!("Unknown time unit: {unit}"),
    };

    offset_by_seconds(anchor, amount * seconds_per_unit)
        .with_context(|| format!("Time offset out of range: {s}"))
}
