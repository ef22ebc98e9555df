use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod capture;
mod classifier;
mod config;
mod corpus;
mod dispatcher;
mod error;
mod generator;
mod models;
mod process;
mod report;

use config::{AppArgs, Config};

#[tokio::main]
async fn main() {
    let args = AppArgs::parse();
    init_tracing(args.debug);

    let exit_code = match run(args).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

/// Logs go to stderr so stdout carries only the report. `RUST_LOG` overrides `--debug`.
fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: AppArgs) -> Result<()> {
    let config = config::build_config(&args)?;

    let corpus = corpus::load_corpus(Path::new(&config.input_file))
        .with_context(|| format!("Failed to load sites from {}", config.input_file))?;

    let results = process::process_run(&config, &corpus).await?;

    if config.capture_errors {
        let written = capture::capture_errors(&config.capture_dir, &results)
            .context("Failed to write capture error files")?;
        info!("Wrote {} capture error file(s)", written.len());
    }

    let shown = classifier::filter_results(config.output_mode, &results);
    let rendered = report::render(&shown, results.len(), config.format, config.verbose)?;
    write_report(&config, &rendered)?;

    Ok(())
}

fn write_report(config: &Config, rendered: &str) -> Result<()> {
    match &config.output_file {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("Wrote report to {}", path.display());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}
