use crate::cli::{Cli, OutputFormat};
use crate::commands::{cancel_on_ctrl_c, load_aggregator, spinner, CommandError, Result};
use crate::output::{format_output, format_record_card, format_section_header, format_skipped, OutputData};
use gather_core::{FailurePolicy, MergedResults, SearchSession, UnifiedRecord};
use owo_colors::OwoColorize;

/// Run a federated search across every enabled provider.
///
/// Without `--context` nothing is searched and an empty result is printed.
pub async fn run(
    cli: &Cli,
    term: &str,
    context: Option<&str>,
    partial: bool,
    timeout_ms: Option<u64>,
) -> Result<()> {
    let results = execute(cli, term, context, partial, timeout_ms).await?;

    match cli.output {
        OutputFormat::Pretty => print_pretty(&results),
        _ => format_output(&OutputData::SearchResults(results), &cli.output)?,
    }

    Ok(())
}

async fn execute(
    cli: &Cli,
    term: &str,
    context: Option<&str>,
    partial: bool,
    timeout_ms: Option<u64>,
) -> Result<MergedResults<UnifiedRecord>> {
    if timeout_ms == Some(0) {
        return Err(CommandError::InvalidInput(
            "--timeout-ms must be greater than zero".to_string(),
        ));
    }

    let aggregator = load_aggregator(cli, |config| {
        if partial {
            config.settings.failure_policy = FailurePolicy::Partial;
        }
        if let Some(ms) = timeout_ms {
            config.settings.provider_timeout_ms = Some(ms);
        }
    })?;

    let mut session = SearchSession::new();
    if let Some(id) = context {
        session.set_context(id);
    }

    let progress = spinner(format!(
        "Searching {} providers for '{}'...",
        aggregator.providers().len(),
        term
    ))?;
    let cancel = cancel_on_ctrl_c();
    let outcome = aggregator
        .search_with_cancel(term, session.context(), &cancel)
        .await;
    progress.finish_and_clear();

    Ok(outcome?)
}

fn print_pretty(results: &MergedResults<UnifiedRecord>) {
    let Some(context) = &results.context else {
        println!(
            "{} No context chosen; nothing was searched. Pass {}.",
            "Note:".yellow().bold(),
            "--context <ID>".cyan()
        );
        return;
    };

    println!(
        "{} {} {} {}",
        "Search:".dimmed(),
        results.term.cyan().bold(),
        "within".dimmed(),
        context.to_string().green()
    );
    println!();

    if results.is_empty() {
        println!("{}", "No records found.".yellow());
    } else {
        println!("{}", format_section_header(&context.id, Some(results.len())));
        for (i, record) in results.records.iter().enumerate() {
            print!("{}", format_record_card(record, i + 1));
        }
    }

    if !results.skipped.is_empty() {
        println!();
        println!("{}", "Skipped providers:".yellow().bold());
        print!("{}", format_skipped(&results.skipped));
    }

    println!();
    let mut summary = format!(
        "{} records from {} providers",
        results.len(),
        results.completed.len()
    );
    if results.duplicates_merged() > 0 {
        summary.push_str(&format!(", {} duplicates merged", results.duplicates_merged()));
    }
    if let Some(ms) = results.duration_ms {
        summary.push_str(&format!(" in {}ms", ms));
    }
    println!("{}", summary.dimmed());
}
