//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use cycler_core::PhaseConvention;

/// Battery cycling log summariser.
///
/// Derives per-cycle capacity and coulombic efficiency, and a voltage trace on
/// an absolute time axis, from decoded cycler records.
#[derive(Debug, Parser)]
#[command(name = "cycler", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Summarise capacity and coulombic efficiency per full cycle.
    Cycles {
        #[command(flatten)]
        input: InputArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the voltage trace, optionally restricted to a time window.
    Trace {
        #[command(flatten)]
        input: InputArgs,

        /// Window start: a timestamp or an offset from acquisition start (e.g., +30m).
        #[arg(long)]
        start: Option<String>,

        /// Window end: a timestamp or an offset from acquisition start (e.g., +2h).
        #[arg(long)]
        end: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Where to find a run's records and acquisition log.
#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Decoded records file (JSON Lines), or a directory containing one.
    pub input: PathBuf,

    /// Companion acquisition log; overrides discovery.
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// Start time embedded by the instrument, used when the log has none.
    #[arg(long)]
    pub instrument_timestamp: Option<String>,

    /// Override the configured phase convention (`charge_first` or `discharge_first`).
    #[arg(long)]
    pub phase_convention: Option<PhaseConvention>,
}
