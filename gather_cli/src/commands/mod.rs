pub mod config;
pub mod providers;
pub mod search;
pub mod validate;

use crate::cli::{Cli, OutputFormat};
use gather_core::error::{AggregationError, ConfigError};
use gather_core::{Aggregator, AggregatorConfig, ConfigStore, UnifiedRecord};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CommandError>;

/// Config store selected by `--config`, or the default location.
pub fn config_store(cli: &Cli) -> ConfigStore {
    match &cli.config {
        Some(path) => ConfigStore::new(path.clone()),
        None => ConfigStore::new_default(),
    }
}

/// Load the config and build an aggregator, letting `adjust` apply flag overrides first.
///
/// Zero enabled providers is not an error; the aggregator then finds nothing.
pub fn load_aggregator(
    cli: &Cli,
    adjust: impl FnOnce(&mut AggregatorConfig),
) -> Result<Aggregator<UnifiedRecord>> {
    let store = config_store(cli);
    let mut config = store.load()?;
    adjust(&mut config);
    let aggregator = config.build_aggregator(store.base_dir())?;

    if aggregator.providers().is_empty() {
        tracing::debug!(path = %store.path().display(), "no enabled providers");
        if cli.output == OutputFormat::Pretty {
            print_no_providers_hint(&store);
        }
    }
    Ok(aggregator)
}

fn print_no_providers_hint(store: &ConfigStore) {
    let hint = if store.exists() {
        format!(
            "No enabled providers in {}; results will be empty.",
            store.path().display()
        )
    } else {
        format!(
            "No config at {}; run 'gather config init' to create one.",
            store.path().display()
        )
    };
    eprintln!("{}", hint.dimmed());
}

pub fn spinner(message: String) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .map_err(|e| CommandError::Other(e.to_string()))?,
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    Ok(spinner)
}

/// A token cancelled on Ctrl-C, so pending provider calls are abandoned.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("interrupted; cancelling pending provider calls");
            trigger.cancel();
        }
    });
    token
}
