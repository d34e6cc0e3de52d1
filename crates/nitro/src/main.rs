mod commands;

use std::io::IsTerminal;

use clap::Parser;
use miette::{Context, IntoDiagnostic, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: commands::Commands,
}

/// A single leading `@file` argument stands for the whitespace-separated
/// tokens read from that file.
fn expand_response_file() -> Result<Vec<String>> {
    let mut args: Vec<String> = std::env::args().collect();

    let response_file = args
        .get(1)
        .and_then(|arg| arg.strip_prefix('@'))
        .map(str::to_owned);
    if let Some(path) = response_file {
        let text = std::fs::read_to_string(&path)
            .into_diagnostic()
            .context(format!("reading response file {path}"))?;

        let mut expanded = vec![args.swap_remove(0)];
        expanded.extend(text.split_whitespace().map(str::to_owned));
        args = expanded;
    }

    Ok(args)
}

fn main() -> Result<()> {
    better_panic::install();

    let cli = Cli::parse_from(expand_response_file()?);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(std::io::stdout().is_terminal())
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .without_time()
                .compact(),
        )
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .try_init()
        .into_diagnostic()?;

    cli.command.handle()
}
