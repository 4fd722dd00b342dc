//! wavshape CLI - block-wise WAV processing from the command line
//!
//! Runs WAV files through a model with overlap-add processing, and inspects
//! their chunk layout.

use std::process::ExitCode;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use wavshape_cli::cli_args::{Cli, Commands};
use wavshape_cli::commands;
use wavshape_cli::commands::process::ProcessOptions;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Process {
            input,
            output,
            model,
            eq,
            pf,
            window,
            frame_length,
            bits,
            no_drain,
            json,
        } => {
            let options = ProcessOptions {
                input,
                output,
                model,
                eq,
                param: pf,
                window: window.map(Into::into),
                frame_length,
                bits,
                drain_tail: !no_drain,
            };
            commands::process::run(&options, json)
        }
        Commands::Inspect { input, hash, json } => commands::inspect::run(&input, hash, json),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}
