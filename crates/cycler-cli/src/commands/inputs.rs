//! Locating and loading a run's input files.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use cycler_core::{Measurement, ProcessedRun, parse_timestamp, process_run};

use crate::Config;
use crate::cli::InputArgs;

/// Resolved input files for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInputs {
    pub records: PathBuf,
    pub log: Option<PathBuf>,
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Lists regular files in `dir` with the given extension, sorted by name.
fn files_with_extension(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, ext) {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

/// Picks the first candidate, warning when the choice is ambiguous.
fn pick_first(candidates: Vec<PathBuf>, kind: &str) -> Option<PathBuf> {
    if candidates.len() > 1 {
        tracing::warn!(
            kind,
            count = candidates.len(),
            chosen = ?candidates[0],
            "multiple candidate files, using the first"
        );
    }
    candidates.into_iter().next()
}

/// Locates the records file and acquisition log.
///
/// A directory is searched by extension. For a records file, a log with the
/// same stem next to it is picked up automatically. An explicit `log_override`
/// always wins.
pub fn locate_inputs(input: &Path, log_override: Option<&Path>, config: &Config) -> Result<RunInputs> {
    let (records, discovered_log) = if input.is_dir() {
        let records = pick_first(
            files_with_extension(input, &config.records_extension)?,
            "records",
        )
        .with_context(|| {
            format!(
                "no *.{} records file found in {}",
                config.records_extension,
                input.display()
            )
        })?;
        let log = pick_first(files_with_extension(input, &config.log_extension)?, "log");
        (records, log)
    } else {
        let sibling = input.with_extension(&config.log_extension);
        let log = sibling.is_file().then_some(sibling);
        (input.to_path_buf(), log)
    };

    let log = log_override.map(Path::to_path_buf).or(discovered_log);
    if log.is_none() {
        tracing::debug!(records = ?records, "no acquisition log found");
    }
    Ok(RunInputs { records, log })
}

/// Parses decoded records, one JSON object per line.
pub fn parse_records<R: BufRead>(reader: R) -> Result<Vec<Measurement>> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", idx + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record: Measurement = serde_json::from_str(trimmed)
            .with_context(|| format!("invalid record on line {}", idx + 1))?;
        records.push(record);
    }
    Ok(records)
}

pub fn load_records(path: &Path) -> Result<Vec<Measurement>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    parse_records(BufReader::new(file)).with_context(|| format!("failed to parse {}", path.display()))
}

/// Reads an acquisition log. EC-Lab writes these as ISO-8859-1.
pub fn read_log(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(decode_latin1(&bytes))
}

/// Every ISO-8859-1 byte maps to the Unicode code point of the same value.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}

/// Locates, loads and processes the run described by `args`.
pub fn load_run(args: &InputArgs, config: &Config) -> Result<ProcessedRun> {
    let inputs = locate_inputs(&args.input, args.log.as_deref(), config)?;
    tracing::debug!(?inputs, "located run inputs");

    let records = load_records(&inputs.records)?;
    let log_text = inputs.log.as_deref().map(read_log).transpose()?;

    let embedded = args
        .instrument_timestamp
        .as_deref()
        .map(|s| {
            parse_timestamp(s).with_context(|| format!("invalid instrument timestamp: {s}"))
        })
        .transpose()?;

    let mut aggregation = config.aggregation();
    if let Some(convention) = args.phase_convention {
        aggregation.phase_convention = convention;
    }

    process_run(&records, log_text.as_deref(), embedded, &aggregation)
        .with_context(|| format!("failed to process {}", inputs.records.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    use cycler_core::AnchorSource;

    const RECORDS: &str = r#"{"time/s": 0.0, "Ewe/V": 3.0, "Q charge/discharge/mA.h": 5.0, "half cycle": 0}
{"time/s": 10.0, "Ewe/V": 3.1, "Q charge/discharge/mA.h": 8.0, "half cycle": 0}

{"time/s": 20.0, "Ewe/V": 3.0, "Q charge/discharge/mA.h": -3.0, "half cycle": 1}
{"time/s": 30.0, "Ewe/V": 2.9, "Q charge/discharge/mA.h": -6.0, "half cycle": 1}
"#;

    fn input_args(input: &Path) -> InputArgs {
        InputArgs {
            input: input.to_path_buf(),
            log: None,
            instrument_timestamp: None,
            phase_convention: None,
        }
    }

    #[test]
    fn parse_records_skips_blank_lines() {
        let records = parse_records(Cursor::new(RECORDS)).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[3].half_cycle_index, 1);
    }

    #[test]
    fn parse_records_reports_line_number() {
        let input = "{\"time/s\": 0.0, \"Ewe/V\": 3.0, \"Q charge/discharge/mA.h\": 1.0, \"half cycle\": 0}\nnot json\n";
        let err = parse_records(Cursor::new(input)).unwrap_err();
        assert!(err.to_string().contains("invalid record on line 2"));
    }

    #[test]
    fn decodes_latin1_bytes() {
        assert_eq!(decode_latin1(b"25 \xb0C"), "25 °C");
    }

    #[test]
    fn locate_inputs_in_directory() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("b.jsonl"), RECORDS).unwrap();
        fs::write(temp.path().join("a.jsonl"), RECORDS).unwrap();
        fs::write(temp.path().join("run.MPL"), "log").unwrap();
        fs::write(temp.path().join("notes.txt"), "ignored").unwrap();

        let inputs = locate_inputs(temp.path(), None, &Config::default()).unwrap();
        assert_eq!(inputs.records, temp.path().join("a.jsonl"));
        assert_eq!(inputs.log, Some(temp.path().join("run.MPL")));
    }

    #[test]
    fn locate_inputs_without_records_fails() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("run.mpl"), "log").unwrap();

        let err = locate_inputs(temp.path(), None, &Config::default()).unwrap_err();
        assert!(err.to_string().contains("no *.jsonl records file found"));
    }

    #[test]
    fn locate_inputs_finds_sibling_log() {
        let temp = tempfile::tempdir().unwrap();
        let records = temp.path().join("cell7.jsonl");
        fs::write(&records, RECORDS).unwrap();
        fs::write(temp.path().join("cell7.mpl"), "log").unwrap();

        let inputs = locate_inputs(&records, None, &Config::default()).unwrap();
        assert_eq!(inputs.log, Some(temp.path().join("cell7.mpl")));
    }

    #[test]
    fn explicit_log_overrides_discovery() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("run.jsonl"), RECORDS).unwrap();
        fs::write(temp.path().join("run.mpl"), "log").unwrap();
        let other = temp.path().join("elsewhere.log");

        let inputs = locate_inputs(temp.path(), Some(&other), &Config::default()).unwrap();
        assert_eq!(inputs.log, Some(other));
    }

    #[test]
    fn load_run_prefers_log_anchor() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("run.jsonl"), RECORDS).unwrap();
        fs::write(
            temp.path().join("run.mpl"),
            b"EC-Lab ASCII FILE\r\nT = 25 \xb0C\r\nAcquisition started on : 01/01/2024 00:00:00\r\n",
        )
        .unwrap();

        let mut args = input_args(temp.path());
        args.instrument_timestamp = Some("2023-06-01 00:00".to_string());
        let run = load_run(&args, &Config::default()).unwrap();

        assert_eq!(run.anchor.source, AnchorSource::AcquisitionLog);
        assert_eq!(run.cycles.len(), 1);
        assert_eq!(run.trace.len(), 4);
    }

    #[test]
    fn load_run_falls_back_to_instrument_timestamp() {
        let temp = tempfile::tempdir().unwrap();
        let records = temp.path().join("run.jsonl");
        fs::write(&records, RECORDS).unwrap();

        let mut args = input_args(&records);
        args.instrument_timestamp = Some("2023-06-01 00:00".to_string());
        let run = load_run(&args, &Config::default()).unwrap();
        assert_eq!(run.anchor.source, AnchorSource::Instrument);
    }

    #[test]
    fn load_run_without_any_anchor_fails() {
        let temp = tempfile::tempdir().unwrap();
        let records = temp.path().join("run.jsonl");
        fs::write(&records, RECORDS).unwrap();

        let err = load_run(&input_args(&records), &Config::default()).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("no acquisition start"), "{message}");
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "capacities are exact literals")]
    fn phase_convention_flag_overrides_config() {
        let temp = tempfile::tempdir().unwrap();
        let records = temp.path().join("run.jsonl");
        fs::write(&records, RECORDS).unwrap();

        let mut args = input_args(&records);
        args.instrument_timestamp = Some("2024-01-01".to_string());
        args.phase_convention = Some(cycler_core::PhaseConvention::DischargeFirst);
        let run = load_run(&args, &Config::default()).unwrap();

        let row = run.cycles.get(1).unwrap();
        assert_eq!(row.charge_capacity, 6.0);
        assert_eq!(row.discharge_capacity, 8.0);
    }
}
