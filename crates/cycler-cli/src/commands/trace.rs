//! Trace command: voltage over absolute time, optionally windowed.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::NaiveDateTime;
use serde::Serialize;

use cycler_core::{ProcessedRun, TimeAnchor, TracePoint, VoltageTrace};

use super::inputs::load_run;
use super::util::{format_timestamp, parse_bound};
use crate::Config;
use crate::cli::InputArgs;

/// Inclusive time range applied to the trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Resolves user-supplied bounds against the run.
///
/// A missing bound defaults to the corresponding end of the trace. Returns
/// `None` when neither bound is given or the trace has no points to default to.
pub fn resolve_window(
    start: Option<&str>,
    end: Option<&str>,
    anchor: NaiveDateTime,
    trace: &VoltageTrace,
) -> Result<Option<Window>> {
    if start.is_none() && end.is_none() {
        return Ok(None);
    }
    let start = start.map(|s| parse_bound(s, anchor)).transpose()?;
    let end = end.map(|s| parse_bound(s, anchor)).transpose()?;

    let span = trace.span();
    let start = start.or_else(|| span.map(|(first, _)| first));
    let end = end.or_else(|| span.map(|(_, last)| last));
    Ok(start.zip(end).map(|(start, end)| Window { start, end }))
}

/// Formats the human-readable trace.
pub fn format_trace(trace: &VoltageTrace, window: Option<&Window>) -> String {
    let mut output = String::new();

    write!(output, "TRACE: {} points", trace.len()).unwrap();
    if let Some(w) = window {
        write!(
            output,
            " in [{}, {}]",
            format_timestamp(w.start),
            format_timestamp(w.end)
        )
        .unwrap();
    }
    writeln!(output).unwrap();
    writeln!(output).unwrap();

    if trace.is_empty() {
        writeln!(output, "No points in range.").unwrap();
        return output;
    }

    writeln!(output, "{:>11}  {:<23}  {:>11}", "ELAPSED (s)", "TIMESTAMP", "VOLTAGE (V)").unwrap();
    for point in trace {
        writeln!(
            output,
            "{:>11.1}  {:<23}  {:>11.4}",
            point.elapsed_seconds,
            format_timestamp(point.timestamp),
            point.voltage
        )
        .unwrap();
    }

    output
}

/// JSON trace structure.
#[derive(Debug, Serialize)]
pub struct JsonTrace<'a> {
    pub anchor: &'a TimeAnchor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<&'a Window>,
    pub points: &'a [TracePoint],
}

/// Formats the trace as JSON.
pub fn format_trace_json(
    anchor: &TimeAnchor,
    trace: &VoltageTrace,
    window: Option<&Window>,
) -> Result<String> {
    let report = JsonTrace {
        anchor,
        window,
        points: trace.points(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Selects the points of `run` that fall inside the requested bounds.
pub fn select(
    run: &ProcessedRun,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<(VoltageTrace, Option<Window>)> {
    let window = resolve_window(start, end, run.anchor.instant, &run.trace)?;
    let trace = match &window {
        Some(w) => run.trace.window(w.start, w.end),
        None => run.trace.clone(),
    };
    Ok((trace, window))
}

/// Runs the trace command.
pub fn run<W: Write>(
    writer: &mut W,
    args: &InputArgs,
    config: &Config,
    start: Option<&str>,
    end: Option<&str>,
    json: bool,
) -> Result<()> {
    let processed = load_run(args, config)?;
    let (trace, window) = select(&processed, start, end)?;

    if json {
        let output = format_trace_json(&processed.anchor, &trace, window.as_ref())?;
        writeln!(writer, "{output}")?;
    } else {
        write!(writer, "{}", format_trace(&trace, window.as_ref()))?;
    }

    Ok(())
}
