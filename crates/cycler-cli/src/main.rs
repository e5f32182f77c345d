use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cycler_cli::commands::{cycles, trace};
use cycler_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so JSON on stdout stays parseable
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let mut stdout = std::io::stdout().lock();
    match &cli.command {
        Some(Commands::Cycles { input, json }) => {
            cycles::run(&mut stdout, input, &config, *json)?;
        }
        Some(Commands::Trace {
            input,
            start,
            end,
            json,
        }) => {
            trace::run(
                &mut stdout,
                input,
                &config,
                start.as_deref(),
                end.as_deref(),
                *json,
            )?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
