//! Voltage trace on an absolute time axis.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One record projected onto the absolute time axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TracePoint {
    pub elapsed_seconds: f64,
    pub timestamp: NaiveDateTime,
    pub voltage: f64,
}

/// Ordered voltage samples, one per input record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoltageTrace {
    points: Vec<TracePoint>,
}

impl VoltageTrace {
    pub const fn new(points: Vec<TracePoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[TracePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TracePoint> {
        self.points.iter()
    }

    /// Returns the points with `start <= timestamp <= end`, in trace order.
    ///
    /// Swapped bounds (`start > end`) select nothing.
    #[must_use]
    pub fn window(&self, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        if start > end {
            tracing::debug!(%start, %end, "window bounds are reversed, selecting nothing");
            return Self::default();
        }
        let points: Vec<_> = self
            .points
            .iter()
            .filter(|p| p.timestamp >= start && p.timestamp <= end)
            .copied()
            .collect();
        tracing::debug!(selected = points.len(), total = self.points.len(), "windowed trace");
        Self { points }
    }

    /// First and last timestamps, if any points exist.
    pub fn span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        Some((self.points.first()?.timestamp, self.points.last()?.timestamp))
    }
}

impl<'a> IntoIterator for &'a VoltageTrace {
    type Item = &'a TracePoint;
    type IntoIter = std::slice::Iter<'a, TracePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl FromIterator<TracePoint> for VoltageTrace {
    fn from_iter<I: IntoIterator<Item = TracePoint>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}
