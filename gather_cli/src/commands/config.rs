use crate::cli::{Cli, ConfigAction, OutputFormat};
use crate::commands::{config_store, CommandError, Result};
use crate::output::{format_output, OutputData};
use gather_core::{AggregatorConfig, ConfigStore};
use owo_colors::OwoColorize;

pub async fn run(cli: &Cli, action: ConfigAction) -> Result<()> {
    let store = config_store(cli);
    match action {
        ConfigAction::Show => show_config(cli, &store),
        ConfigAction::Path => {
            println!("{}", store.path().display());
            Ok(())
        }
        ConfigAction::Init { force } => init_config(&store, force),
    }
}

fn show_config(cli: &Cli, store: &ConfigStore) -> Result<()> {
    let config = store.load()?;

    match cli.output {
        OutputFormat::Pretty => {
            println!();
            println!("{}", "Configuration".bold().cyan());
            println!("{}", "=============".cyan());
            println!();
            println!("Config file: {}", store.path().display().dimmed());
            if !store.exists() {
                println!(
                    "{}",
                    "(file does not exist; showing defaults)".yellow()
                );
            }
            println!();

            let settings = &config.settings;
            println!("  {:<18} {:?}", "failure policy".dimmed(), settings.failure_policy);
            println!("  {:<18} {:?}", "collation".dimmed(), settings.collation);
            println!(
                "  {:<18} {}",
                "provider timeout".dimmed(),
                format_timeout(settings.provider_timeout_ms)
            );
            println!(
                "  {:<18} {}",
                "global timeout".dimmed(),
                format_timeout(settings.global_timeout_ms)
            );
            println!();

            if config.providers.is_empty() {
                println!("{}", "No providers configured yet.".yellow());
                println!("Run {} to create one.", "gather config init".cyan());
            } else {
                for spec in &config.providers {
                    let status = if spec.enabled {
                        "enabled".green().to_string()
                    } else {
                        "disabled".dimmed().to_string()
                    };
                    println!("  {} - {}", spec.name.cyan().bold(), status);
                }
            }
            println!();
        }
        _ => {
            let data = OutputData::ConfigInfo {
                path: store.path().display().to_string(),
                exists: store.exists(),
                config,
            };
            format_output(&data, &cli.output)?;
        }
    }

    Ok(())
}

fn init_config(store: &ConfigStore, force: bool) -> Result<()> {
    if store.exists() && !force {
        return Err(CommandError::InvalidInput(format!(
            "{} already exists (use --force to overwrite)",
            store.path().display()
        )));
    }

    store.save(&AggregatorConfig::sample())?;
    println!(
        "{} Wrote starter config to {}",
        "✓".green().bold(),
        store.path().display()
    );
    println!(
        "Try: {}",
        "gather search c.68 --context BRCA1".cyan()
    );
    Ok(())
}

fn format_timeout(ms: Option<u64>) -> String {
    match ms {
        Some(ms) => format!("{}ms", ms),
        None => "none".to_string(),
    }
}
