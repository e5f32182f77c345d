//! Battery cycling log summariser CLI library.
//!
//! This crate provides the CLI interface for `cycler-core`.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, InputArgs};
pub use config::Config;
