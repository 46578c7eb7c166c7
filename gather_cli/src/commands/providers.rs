use crate::cli::{Cli, OutputFormat};
use crate::commands::{config_store, Result};
use crate::output::{format_output, OutputData};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use gather_core::{ProviderKind, ProviderSpec};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::path::Path;

/// One configured provider, enabled or not, as listed by `gather providers`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderRow {
    pub name: String,
    pub source: String,
    pub enabled: bool,
    pub description: String,

    /// Why an enabled provider could not be built
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProviderRow {
    /// Describe `spec`. Enabled providers are built to pick up their own
    /// description; a build failure is reported on the row, not raised.
    pub fn from_spec(spec: &ProviderSpec, base_dir: Option<&Path>) -> Self {
        let mut description = spec.description.clone().unwrap_or_default();
        let mut error = None;

        if spec.enabled {
            match spec.build(base_dir) {
                Ok(provider) if description.is_empty() => {
                    description = provider.description().to_string();
                }
                Ok(_) => {}
                Err(e) => error = Some(e.to_string()),
            }
        }

        Self {
            name: spec.name.clone(),
            source: kind_label(spec),
            enabled: spec.enabled,
            description,
            error,
        }
    }
}

/// Get the terminal width, defaulting to 80 if detection fails
fn get_terminal_width() -> u16 {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0)
        .unwrap_or(80)
}

fn kind_label(spec: &ProviderSpec) -> String {
    match &spec.kind {
        ProviderKind::Static {
            catalog, records, ..
        } => match catalog {
            Some(path) => format!("static ({})", path.display()),
            None => format!("static ({} inline)", records.len()),
        },
        ProviderKind::Http(http) => format!("http ({})", http.base_url),
    }
}

pub async fn run(cli: &Cli) -> Result<()> {
    let store = config_store(cli);
    let config = store.load()?;
    let rows: Vec<ProviderRow> = config
        .providers
        .iter()
        .map(|spec| ProviderRow::from_spec(spec, store.base_dir()))
        .collect();

    match cli.output {
        OutputFormat::Pretty => {
            if rows.is_empty() {
                println!("{}", "No providers configured".yellow());
                println!(
                    "Run {} to write a starter config to {}",
                    "gather config init".cyan(),
                    store.path().display()
                );
                return Ok(());
            }

            println!("{}", "Providers".bold().cyan());
            println!();

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_width(get_terminal_width())
                .set_header(vec!["#", "Name", "Source", "Enabled", "Description"]);

            for (i, row) in rows.iter().enumerate() {
                let description = match &row.error {
                    Some(error) => format!("unavailable: {}", error),
                    None => row.description.clone(),
                };
                table.add_row(vec![
                    (i + 1).to_string(),
                    row.name.clone(),
                    row.source.clone(),
                    if row.enabled { "yes" } else { "no" }.to_string(),
                    description,
                ]);
            }

            println!("{}", table);
            println!();
            println!(
                "{} Earlier providers win when merged records disagree",
                "Tip:".green().bold()
            );
        }
        _ => format_output(&OutputData::ProviderList(rows), &cli.output)?,
    }

    Ok(())
}
