//! Per-cycle aggregation of a cycling run.
//!
//! # Algorithm Summary
//!
//! 1. Place every record on the absolute time axis (`anchor + elapsed`), which
//!    also yields the voltage trace.
//! 2. Classify each record's half cycle into a full cycle and a phase.
//! 3. Group by full cycle and reduce by max: peak `|Q|` per phase, last elapsed
//!    time and last timestamp per cycle.
//! 4. Derive coulombic efficiency from the two peaks.
//!
//! Capacity is the peak of the instrument's running accumulator within a phase,
//! not a sum. Step 3 is a commutative max-reduction, so records are folded in
//! parallel chunks and merged without affecting the result.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::anchor::offset_by_seconds;
use crate::classify::{Phase, PhaseConvention};
use crate::measurement::Measurement;
use crate::trace::{TracePoint, VoltageTrace};

/// Efficiency reported for cycles that lack the data to compute one.
pub const PLACEHOLDER_EFFICIENCY: f64 = 100.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AggregateError {
    #[error("no measurement records to aggregate")]
    EmptyInput,

    #[error("record {index}: elapsed time {elapsed_seconds}s cannot be placed on the time axis")]
    TimeOutOfRange { index: usize, elapsed_seconds: f64 },
}

/// What to do when a run contains no records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyInputPolicy {
    /// Fail with [`AggregateError::EmptyInput`].
    #[default]
    Fail,
    /// Return an empty table and an empty trace.
    EmptyOutput,
}

/// Configuration for cycle aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Parity rule mapping half cycles to phases.
    #[serde(default)]
    pub phase_convention: PhaseConvention,

    /// Behaviour for runs with no records.
    #[serde(default)]
    pub empty_input: EmptyInputPolicy,
}

/// Whether a cycle's coulombic efficiency was computed or defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EfficiencySource {
    /// Discharge over a positive charge capacity; a missing discharge phase counts as 0.
    Measured,
    /// [`PLACEHOLDER_EFFICIENCY`]; the cycle has no charge capacity to divide by.
    Placeholder,
}

/// Summary of one full cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CycleSummary {
    pub cycle_number: u32,

    /// Peak charge quantity, `0.0` when no charge phase was recorded.
    pub charge_capacity: f64,

    /// Peak discharge quantity, `0.0` when no discharge phase was recorded.
    pub discharge_capacity: f64,

    /// `100 * discharge / charge`, or [`PLACEHOLDER_EFFICIENCY`].
    ///
    /// Check `efficiency` before reading a placeholder as a measurement.
    pub coulombic_efficiency: f64,

    pub efficiency: EfficiencySource,

    pub elapsed_seconds_at_cycle_end: f64,

    pub ended_at: NaiveDateTime,
}

impl CycleSummary {
    pub fn is_efficiency_measured(&self) -> bool {
        self.efficiency == EfficiencySource::Measured
    }
}

/// Cycle summaries keyed by full-cycle number, in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CycleTable {
    rows: BTreeMap<u32, CycleSummary>,
}

impl CycleTable {
    pub fn get(&self, cycle_number: u32) -> Option<&CycleSummary> {
        self.rows.get(&cycle_number)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cycle_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.rows.keys().copied()
    }

    /// Rows in ascending cycle order.
    pub fn iter(&self) -> impl Iterator<Item = &CycleSummary> {
        self.rows.values()
    }
}

/// Output of one aggregation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    pub cycles: CycleTable,
    pub trace: VoltageTrace,
}

/// Running maxima for one full cycle.
///
/// Only created from a first observed record, so the cycle end is always known.
#[derive(Debug, Clone, Copy)]
struct CycleAccumulator {
    charge_peak: Option<f64>,
    discharge_peak: Option<f64>,
    last_elapsed: f64,
    last_timestamp: NaiveDateTime,
}

fn max_peak(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

impl CycleAccumulator {
    fn start(phase: Phase, record: &Measurement, point: &TracePoint) -> Self {
        let quantity = Some(record.abs_quantity());
        let (charge_peak, discharge_peak) = match phase {
            Phase::Charge => (quantity, None),
            Phase::Discharge => (None, quantity),
        };
        Self {
            charge_peak,
            discharge_peak,
            last_elapsed: record.elapsed_seconds,
            last_timestamp: point.timestamp,
        }
    }

    fn observe(&mut self, phase: Phase, record: &Measurement, point: &TracePoint) {
        *self = self.merge(Self::start(phase, record, point));
    }

    fn merge(self, other: Self) -> Self {
        Self {
            charge_peak: max_peak(self.charge_peak, other.charge_peak),
            discharge_peak: max_peak(self.discharge_peak, other.discharge_peak),
            last_elapsed: self.last_elapsed.max(other.last_elapsed),
            last_timestamp: self.last_timestamp.max(other.last_timestamp),
        }
    }

    fn into_summary(self, cycle_number: u32) -> CycleSummary {
        let discharge_capacity = self.discharge_peak.unwrap_or(0.0);
        let (coulombic_efficiency, efficiency) = match self.charge_peak {
            Some(charge) if charge > 0.0 => {
                (100.0 * discharge_capacity / charge, EfficiencySource::Measured)
            }
            _ => (PLACEHOLDER_EFFICIENCY, EfficiencySource::Placeholder),
        };
        CycleSummary {
            cycle_number,
            charge_capacity: self.charge_peak.unwrap_or(0.0),
            discharge_capacity,
            coulombic_efficiency,
            efficiency,
            elapsed_seconds_at_cycle_end: self.last_elapsed,
            ended_at: self.last_timestamp,
        }
    }
}

type Accumulators = BTreeMap<u32, CycleAccumulator>;

fn merge_accumulators(mut into: Accumulators, from: Accumulators) -> Accumulators {
    for (cycle, acc) in from {
        into.entry(cycle)
            .and_modify(|slot| *slot = slot.merge(acc))
            .or_insert(acc);
    }
    into
}

/// Builds the per-cycle summary table and the absolute-time voltage trace.
///
/// Records must be in acquisition order; the trace keeps that order. The same
/// inputs always produce the same outputs.
pub fn aggregate(
    records: &[Measurement],
    anchor: NaiveDateTime,
    config: &AggregationConfig,
) -> Result<Aggregation, AggregateError> {
    if records.is_empty() {
        return match config.empty_input {
            EmptyInputPolicy::Fail => Err(AggregateError::EmptyInput),
            EmptyInputPolicy::EmptyOutput => {
                tracing::debug!("no records, returning empty aggregation");
                Ok(Aggregation::default())
            }
        };
    }

    let points: Vec<TracePoint> = records
        .par_iter()
        .enumerate()
        .map(|(index, record)| {
            offset_by_seconds(anchor, record.elapsed_seconds)
                .map(|timestamp| TracePoint {
                    elapsed_seconds: record.elapsed_seconds,
                    timestamp,
                    voltage: record.voltage,
                })
                .ok_or(AggregateError::TimeOutOfRange {
                    index,
                    elapsed_seconds: record.elapsed_seconds,
                })
        })
        .collect::<Result<_, _>>()?;

    let convention = config.phase_convention;
    let accumulators = records
        .par_iter()
        .zip(points.par_iter())
        .fold(Accumulators::new, |mut acc, (record, point)| {
            let slot = convention.classify(record.half_cycle_index);
            acc.entry(slot.cycle_number)
                .and_modify(|cycle| cycle.observe(slot.phase, record, point))
                .or_insert_with(|| CycleAccumulator::start(slot.phase, record, point));
            acc
        })
        .reduce(Accumulators::new, merge_accumulators);

    let rows: BTreeMap<u32, CycleSummary> = accumulators
        .into_iter()
        .map(|(cycle, acc)| (cycle, acc.into_summary(cycle)))
        .collect();

    let placeholders = rows.values().filter(|r| !r.is_efficiency_measured()).count();
    tracing::debug!(
        records = records.len(),
        cycles = rows.len(),
        placeholders,
        convention = %convention,
        "aggregated cycling run"
    );

    Ok(Aggregation {
        cycles: CycleTable { rows },
        trace: VoltageTrace::new(points),
    })
}
