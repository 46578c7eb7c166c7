use crate::cli::{Cli, OutputFormat};
use crate::commands::{cancel_on_ctrl_c, load_aggregator, spinner, CommandError, Result};
use crate::output::{format_output, format_skipped, OutputData};
use gather_core::{FailurePolicy, ValidationOutcome};
use owo_colors::OwoColorize;

/// Check an identifier against every provider; valid if any provider says so.
pub async fn run(cli: &Cli, id: &str, partial: bool) -> Result<()> {
    let outcome = execute(cli, id, partial).await?;

    match cli.output {
        OutputFormat::Pretty => {
            if outcome.valid {
                let by = outcome
                    .confirmed_by
                    .as_deref()
                    .map(|p| format!(" (confirmed by {})", p))
                    .unwrap_or_default();
                println!("{} {}{}", "✓".green().bold(), outcome.id.bold(), by.dimmed());
            } else {
                println!(
                    "{} {} {}",
                    "✗".red().bold(),
                    outcome.id.bold(),
                    "is not recognized by any provider".dimmed()
                );
            }
            if !outcome.skipped.is_empty() {
                println!();
                println!("{}", "Providers that failed:".yellow().bold());
                print!("{}", format_skipped(&outcome.skipped));
            }
        }
        _ => format_output(&OutputData::Validation(outcome), &cli.output)?,
    }

    Ok(())
}

async fn execute(cli: &Cli, id: &str, partial: bool) -> Result<ValidationOutcome> {
    if id.trim().is_empty() {
        return Err(CommandError::InvalidInput(
            "identifier must not be empty".to_string(),
        ));
    }

    let aggregator = load_aggregator(cli, |config| {
        if partial {
            config.settings.failure_policy = FailurePolicy::Partial;
        }
    })?;

    let progress = spinner(format!("Checking '{}'...", id))?;
    let cancel = cancel_on_ctrl_c();
    let outcome = aggregator.validate_identifier_with_cancel(id, &cancel).await;
    progress.finish_and_clear();

    Ok(outcome?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[tokio::test]
    async fn test_validate_with_no_providers_is_false() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "providers: []\n").unwrap();
        let config = path.display().to_string();

        let cli = Cli::try_parse_from([
            "gather",
            "--config",
            config.as_str(),
            "--output",
            "json",
            "validate",
            "rs1",
        ])
        .unwrap();

        let outcome = execute(&cli, "rs1", false).await.unwrap();
        assert!(!outcome.valid);
        assert!(outcome.confirmed_by.is_none());
        assert!(outcome.skipped.is_empty());

        run(&cli, "rs1", false).await.unwrap();
    }

    #[tokio::test]
    async fn test_validate_against_sample_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        gather_core::ConfigStore::new(path.clone())
            .save(&gather_core::AggregatorConfig::sample())
            .unwrap();
        let config = path.display().to_string();

        let cli = Cli::try_parse_from(["gather", "--config", config.as_str(), "validate", "x"])
            .unwrap();

        let outcome = execute(&cli, "NM_000546.6:c.215C>G", false).await.unwrap();
        assert!(outcome.valid);
        assert_eq!(outcome.confirmed_by.as_deref(), Some("local"));
        assert!(matches!(
            execute(&cli, "  ", false).await,
            Err(CommandError::InvalidInput(_))
        ));
    }
}
