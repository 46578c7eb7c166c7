//! Pretty formatter for terminal output.
//!
//! Records are shown as cards: key on the first line, contributing providers
//! dimmed beside it, then one line per payload field.

use gather_core::federated::SkippedProvider;
use gather_core::UnifiedRecord;
use owo_colors::OwoColorize;
use serde_json::Value;

/// Terminal width for formatting (default fallback)
const DEFAULT_WIDTH: usize = 80;

/// Indent for card content (after number)
const CARD_INDENT: usize = 6;

/// Fields shown per card before eliding the rest
const MAX_FIELDS: usize = 8;

/// Fields shown first when present, in this order
const PRIORITY_FIELDS: &[&str] = &["title", "name", "gene", "assembly", "significance", "url"];

const URL_FIELDS: &[&str] = &["url", "link", "href", "uri"];

pub fn format_record_card(record: &UnifiedRecord, index: usize) -> String {
    let width = terminal_width();
    let mut output = String::new();

    let index_str = format!(" {:>3}. ", index).cyan().bold().to_string();
    let sources = if record.sources.is_empty() {
        String::new()
    } else {
        format!("  [{}]", record.sources.join(", "))
    };
    output.push_str(&format!(
        "{}{}{}\n",
        index_str,
        record.key.bold(),
        sources.dimmed()
    ));

    let value_width = width.saturating_sub(CARD_INDENT + 2).max(20);
    let indent = " ".repeat(CARD_INDENT);

    let mut ordered: Vec<(&str, &Value)> = PRIORITY_FIELDS
        .iter()
        .filter_map(|name| record.fields.get(*name).map(|value| (*name, value)))
        .collect();
    ordered.extend(
        record
            .fields
            .iter()
            .map(|(name, value)| (name.as_str(), value))
            .filter(|(name, _)| !PRIORITY_FIELDS.contains(name)),
    );

    for (name, value) in ordered.iter().take(MAX_FIELDS) {
        let rendered = truncate_str(&format_scalar(value), value_width.saturating_sub(name.len()));
        let rendered = if URL_FIELDS.contains(name) {
            rendered.blue().to_string()
        } else {
            rendered
        };
        output.push_str(&format!("{}{}: {}\n", indent, name.dimmed(), rendered));
    }

    if ordered.len() > MAX_FIELDS {
        output.push_str(&format!(
            "{}{}\n",
            indent,
            format!("... {} more fields", ordered.len() - MAX_FIELDS).dimmed()
        ));
    }

    output
}

pub fn format_section_header(label: &str, count: Option<usize>) -> String {
    let width = terminal_width();
    let count_str = match count {
        Some(n) => format!(" ({} results)", n),
        None => String::new(),
    };

    let header_text = format!("{}{}", label, count_str);
    let line_len = (width.saturating_sub(header_text.len() + 4)).min(60);
    let line = "─".repeat(line_len);

    format!(
        "{} {} {}",
        "──".cyan(),
        header_text.green().bold(),
        line.cyan()
    )
}

pub fn format_skipped(skipped: &[SkippedProvider]) -> String {
    let mut output = String::new();
    for s in skipped {
        let reason = if s.is_timeout {
            "timed out".yellow().to_string()
        } else {
            s.code.yellow().to_string()
        };
        output.push_str(&format!(
            "  {} {} ({}): {}\n",
            "!".yellow().bold(),
            s.provider.bold(),
            reason,
            s.error.dimmed()
        ));
    }
    output
}

fn format_scalar(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_scalar).collect();
            items.join(", ")
        }
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}

fn truncate_str(s: &str, max_len: usize) -> String {
    // Take first line only
    let first_line = s.lines().next().unwrap_or(s);

    if first_line.chars().count() <= max_len {
        first_line.to_string()
    } else {
        let truncated: String = first_line.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(DEFAULT_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_record_card() {
        let record = UnifiedRecord::new("rs1")
            .with_source("curated")
            .with_source("remote")
            .with_field("note", "seen twice")
            .with_field("assembly", "hg19");

        let output = format_record_card(&record, 1);
        let lines: Vec<_> = output.lines().collect();
        assert!(lines[0].contains("rs1"));
        assert!(lines[0].contains("[curated, remote]"));
        // priority fields come first
        assert!(lines[1].contains("assembly") && lines[1].contains("hg19"));
        assert!(lines[2].contains("note") && lines[2].contains("seen twice"));
    }

    #[test]
    fn test_format_scalar_array() {
        assert_eq!(format_scalar(&json!(["a", 1, null])), "a, 1, -");
    }

    #[test]
    fn test_truncate_str() {
        let long = "This is a very long string that should be truncated";
        let truncated = truncate_str(long, 20);
        assert!(truncated.ends_with("..."));
        assert!(truncated.chars().count() <= 20);
    }

    #[test]
    fn test_format_section_header() {
        let header = format_section_header("GENE_X", Some(10));
        assert!(header.contains("GENE_X"));
        assert!(header.contains("10"));
    }
}
