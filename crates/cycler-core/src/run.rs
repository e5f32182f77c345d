//! End-to-end processing of one cycling run.

use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;

use crate::aggregate::{AggregateError, Aggregation, AggregationConfig, CycleTable, aggregate};
use crate::anchor::{AnchorError, TimeAnchor, resolve_anchor};
use crate::measurement::Measurement;
use crate::trace::VoltageTrace;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RunError {
    #[error(transparent)]
    Anchor(#[from] AnchorError),
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

/// Everything derived from one run's records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedRun {
    pub anchor: TimeAnchor,
    pub cycles: CycleTable,
    pub trace: VoltageTrace,
}

/// Resolves the anchor once, then aggregates every record against it.
///
/// `log_text` is the companion acquisition log, `embedded` the instrument's own
/// start timestamp.
pub fn process_run(
    records: &[Measurement],
    log_text: Option<&str>,
    embedded: Option<NaiveDateTime>,
    config: &AggregationConfig,
) -> Result<ProcessedRun, RunError> {
    let anchor = resolve_anchor(log_text, embedded)?;
    let Aggregation { cycles, trace } = aggregate(records, anchor.instant, config)?;
    tracing::info!(
        anchor = %anchor.instant,
        source = %anchor.source,
        cycles = cycles.len(),
        points = trace.len(),
        "processed cycling run"
    );
    Ok(ProcessedRun {
        anchor,
        cycles,
        trace,
    })
}
