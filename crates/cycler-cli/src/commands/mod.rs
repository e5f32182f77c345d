//! CLI subcommand implementations.

pub mod cycles;
pub mod inputs;
pub mod trace;
pub mod util;
