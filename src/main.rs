//! Raga BGM CLI
//!
//! Command-line interface for generating background music from a recording.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use raga_bgm::cli::commands::{self, GenerateOverrides};
use raga_bgm::cli::{Cli, Commands};
use raga_bgm::config::BgmConfig;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Raga BGM v{}", env!("CARGO_PKG_VERSION"));

    let Some(cmd) = cli.command else {
        println!("Raga BGM v{}", env!("CARGO_PKG_VERSION"));
        println!("Use --help for available commands");
        return Ok(ExitCode::SUCCESS);
    };

    let config = BgmConfig::resolve(cli.config.as_deref()).context("loading configuration")?;

    match handle_command(cmd, config) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            eprint!("{}", commands::error_report(&err));
            Ok(ExitCode::FAILURE)
        }
    }
}

fn handle_command(cmd: Commands, config: BgmConfig) -> raga_bgm::Result<()> {
    match cmd {
        Commands::Analyze { input, json } => commands::analyze(config, &input, json),
        Commands::Generate {
            input,
            raga,
            mood,
            output_dir,
            composer,
            soundfont,
            pitch_mapping,
            max_notes,
        } => {
            let overrides = GenerateOverrides {
                composer,
                soundfont,
                pitch_mapping,
                max_notes,
            };
            commands::generate(config, &input, &raga, mood.into(), &output_dir, &overrides)
        }
        Commands::Moods => commands::moods(),
    }
}
