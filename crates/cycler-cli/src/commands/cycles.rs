//! Cycles command: per-cycle capacity and coulombic efficiency.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use serde::Serialize;

use cycler_core::{CycleSummary, ProcessedRun, TimeAnchor};

use super::inputs::load_run;
use super::util::format_timestamp;
use crate::Config;
use crate::cli::InputArgs;

/// Formats the human-readable cycle table.
pub fn format_cycles(run: &ProcessedRun) -> String {
    let mut output = String::new();

    writeln!(
        output,
        "CYCLES: {} (anchor {}, {})",
        run.cycles.len(),
        format_timestamp(run.anchor.instant),
        run.anchor.source
    )
    .unwrap();
    writeln!(output).unwrap();

    if run.cycles.is_empty() {
        writeln!(output, "No cycles recorded.").unwrap();
        return output;
    }

    writeln!(
        output,
        "{:>5}  {:>8}  {:>9}  {:>10}  {:>11}  ENDED AT",
        "CYCLE", "CHARGE", "DISCHARGE", "EFFICIENCY", "ELAPSED (s)"
    )
    .unwrap();

    let mut any_placeholder = false;
    for row in run.cycles.iter() {
        let mut efficiency = format!("{:.2}%", row.coulombic_efficiency);
        if !row.is_efficiency_measured() {
            efficiency.push('*');
            any_placeholder = true;
        }
        writeln!(
            output,
            "{:>5}  {:>8.3}  {:>9.3}  {:>10}  {:>11.1}  {}",
            row.cycle_number,
            row.charge_capacity,
            row.discharge_capacity,
            efficiency,
            row.elapsed_seconds_at_cycle_end,
            format_timestamp(row.ended_at)
        )
        .unwrap();
    }

    if any_placeholder {
        writeln!(output).unwrap();
        writeln!(
            output,
            "* placeholder, cycle has no charge capacity"
        )
        .unwrap();
    }

    output
}

/// JSON cycle report structure.
#[derive(Debug, Serialize)]
pub struct JsonCycles<'a> {
    pub anchor: &'a TimeAnchor,
    pub cycles: Vec<&'a CycleSummary>,
}

/// Formats the cycle table as JSON.
pub fn format_cycles_json(run: &ProcessedRun) -> Result<String> {
    let report = JsonCycles {
        anchor: &run.anchor,
        cycles: run.cycles.iter().collect(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Runs the cycles command.
pub fn run<W: Write>(writer: &mut W, args: &InputArgs, config: &Config, json: bool) -> Result<()> {
    let processed = load_run(args, config)?;

    if json {
        writeln!(writer, "{}", format_cycles_json(&processed)?)?;
    } else {
        write!(writer, "{}", format_cycles(&processed))?;
    }

    Ok(())
}
