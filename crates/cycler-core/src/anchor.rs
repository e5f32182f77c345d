//! Resolution of the absolute instant that elapsed time zero corresponds to.
//!
//! The companion acquisition log is authoritative when it carries an
//! `Acquisition started on :` line; otherwise the timestamp embedded by the
//! instrument in the data file is used.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix of the log line that records when acquisition started.
pub const ACQUISITION_MARKER: &str = "Acquisition started on :";

/// Date-time layouts accepted for anchors and user-supplied bounds.
///
/// EC-Lab writes US-style dates; ISO layouts cover decoders and humans.
const DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const MICROS_PER_SECOND: f64 = 1_000_000.0;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnchorError {
    #[error("no acquisition start in the log and no instrument timestamp available")]
    MissingTimeAnchor,

    #[error("unrecognised acquisition start time: {text:?}")]
    InvalidTimestamp { text: String },
}

/// Where the anchor instant was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorSource {
    /// The `Acquisition started on :` line of the companion log.
    AcquisitionLog,
    /// The timestamp embedded in the instrument data file.
    Instrument,
}

impl AnchorSource {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AcquisitionLog => "acquisition log",
            Self::Instrument => "instrument",
        }
    }
}

impl std::fmt::Display for AnchorSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The absolute instant at `elapsed_seconds == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeAnchor {
    pub instant: NaiveDateTime,
    pub source: AnchorSource,
}

impl TimeAnchor {
    pub const fn new(instant: NaiveDateTime, source: AnchorSource) -> Self {
        Self { instant, source }
    }
}

/// Resolves the time anchor for one run.
///
/// Log lines are scanned in order and the first marker line wins. A marker line
/// whose timestamp cannot be parsed is an error; it never falls back to the
/// embedded timestamp.
pub fn resolve_anchor(
    log_text: Option<&str>,
    embedded: Option<NaiveDateTime>,
) -> Result<TimeAnchor, AnchorError> {
    if let Some(text) = log_text {
        if let Some(rest) = text
            .lines()
            .find_map(|line| line.strip_prefix(ACQUISITION_MARKER))
        {
            let raw = rest.trim();
            let instant = parse_timestamp(raw).ok_or_else(|| AnchorError::InvalidTimestamp {
                text: raw.to_string(),
            })?;
            tracing::debug!(%instant, "anchor taken from acquisition log");
            return Ok(TimeAnchor::new(instant, AnchorSource::AcquisitionLog));
        }
        tracing::debug!("acquisition log has no start marker, using instrument timestamp");
    }

    let instant = embedded.ok_or(AnchorError::MissingTimeAnchor)?;
    tracing::debug!(%instant, "anchor taken from instrument timestamp");
    Ok(TimeAnchor::new(instant, AnchorSource::Instrument))
}

/// Parses a date-time in any of the accepted layouts.
///
/// A bare `YYYY-MM-DD` date resolves to midnight.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Adds a fractional number of seconds to an instant at microsecond resolution.
pub fn offset_by_seconds(instant: NaiveDateTime, seconds: f64) -> Option<NaiveDateTime> {
    let micros = (seconds * MICROS_PER_SECOND).round();
    // Reject anything the i64 cast would saturate.
    #[allow(clippy::cast_precision_loss)]
    let in_range = micros.is_finite() && micros.abs() < i64::MAX as f64;
    if !in_range {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    let delta = TimeDelta::microseconds(micros as i64);
    instant.checked_add_signed(delta)
}
