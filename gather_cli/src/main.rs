use clap::Parser;
use owo_colors::OwoColorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands};
use commands::*;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(cli.verbose).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match &cli.command {
        Commands::Search {
            term,
            context,
            partial,
            timeout_ms,
        } => search::run(&cli, term, context.as_deref(), *partial, *timeout_ms).await,
        Commands::Validate { id, partial } => validate::run(&cli, id, *partial).await,
        Commands::Providers => providers::run(&cli).await,
        Commands::Config { action } => config::run(&cli, action.clone()).await,
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        process::exit(1);
    }
}

fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "gather_cli=info,gather_core=info",
        1 => "gather_cli=debug,gather_core=debug",
        _ => "gather_cli=trace,gather_core=trace",
    }
}
