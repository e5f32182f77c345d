//! Core domain logic for battery cycling logs.
//!
//! This crate turns a decoded sequence of cycler measurements into:
//! - Cycle summaries: peak charge/discharge capacity and coulombic efficiency
//!   per full cycle
//! - A voltage trace on an absolute time axis, with windowed slicing
//! - Time anchoring: locating elapsed-time zero from the acquisition log or the
//!   instrument's embedded timestamp

mod aggregate;
pub mod anchor;
pub mod classify;
mod measurement;
mod run;
pub mod trace;

pub use aggregate::{
    AggregateError, Aggregation, AggregationConfig, CycleSummary, CycleTable, EfficiencySource,
    EmptyInputPolicy, PLACEHOLDER_EFFICIENCY, aggregate,
};
pub use anchor::{AnchorError, AnchorSource, TimeAnchor, parse_timestamp, resolve_anchor};
pub use classify::{CycleSlot, Phase, PhaseConvention, classify};
pub use measurement::Measurement;
pub use run::{ProcessedRun, RunError, process_run};
pub use trace::{TracePoint, VoltageTrace};
