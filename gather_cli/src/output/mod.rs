use crate::cli::OutputFormat;
use crate::commands::providers::ProviderRow;
use crate::commands::Result;
use gather_core::{AggregatorConfig, MergedResults, UnifiedRecord, ValidationOutcome};
use serde::Serialize;

mod pretty;
pub use pretty::{format_record_card, format_section_header, format_skipped};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum OutputData {
    ProviderList(Vec<ProviderRow>),
    SearchResults(MergedResults<UnifiedRecord>),
    Validation(ValidationOutcome),
    ConfigInfo {
        path: String,
        exists: bool,
        config: AggregatorConfig,
    },
}

/// Print `data` in a machine-oriented format.
///
/// `Pretty` is rendered by each command itself; here it falls back to text.
pub fn format_output(data: &OutputData, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(data)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(data)?);
        }
        OutputFormat::Text | OutputFormat::Pretty => {
            print!("{}", format_text(data)?);
        }
    }
    Ok(())
}

fn format_text(data: &OutputData) -> Result<String> {
    let mut out = String::new();
    match data {
        OutputData::ProviderList(providers) => {
            for row in providers {
                let status = match (&row.error, row.enabled) {
                    (Some(_), _) => "unavailable",
                    (None, true) => "enabled",
                    (None, false) => "disabled",
                };
                out.push_str(&format!(
                    "{}\t{}\t{}\t{}\n",
                    row.name, status, row.source, row.description
                ));
            }
        }
        OutputData::SearchResults(results) => {
            for record in &results.records {
                out.push_str(&format!(
                    "{}\t{}\t{}\n",
                    record.key,
                    record.sources.join(","),
                    serde_json::to_string(&record.fields)?
                ));
            }
            for skipped in &results.skipped {
                out.push_str(&format!("# skipped {}: {}\n", skipped.provider, skipped.error));
            }
        }
        OutputData::Validation(outcome) => {
            out.push_str(&format!("{}\t{}\n", outcome.id, outcome.valid));
        }
        OutputData::ConfigInfo { path, config, .. } => {
            out.push_str(&format!("# {}\n", path));
            out.push_str(&serde_yaml::to_string(config)?);
        }
    }
    Ok(out)
}
