// src/snapshot/readme.rs
//! README index generation for snapshot

use std::path::Path;

use crate::ledger::Ledger;
use crate::Result;

use super::current_timestamp;
use super::utils::{format_amount, record_filename, write_snapshot_file, README_FILE};
use super::SnapshotStats;

fn generate_decisions_section(ledger: &Ledger) -> String {
    if ledger.decisions.is_empty() {
        return String::new();
    }

    let mut section = String::from("### Decisions\n\n");
    for decision in ledger.decisions.list_decisions() {
        let result = if decision.is_draft() {
            String::new()
        } else {
            format!(" score {}", decision.final_score)
        };
        section.push_str(&format!(
            "- [{:03} - {}](decisions/{}) `{}`{}\n",
            decision.base.id,
            decision.base.title,
            record_filename(decision.base.id, &decision.base.title),
            decision.status,
            result
        ));
    }

    section.push('\n');
    section
}

fn generate_forecasts_section(ledger: &Ledger) -> Result<String> {
    if ledger.forecasts.is_empty() {
        return Ok(String::new());
    }

    let mut section = String::from("### Forecasts\n\n");
    for forecast in ledger.forecasts.list_forecasts() {
        let summary = ledger.forecasts.summary(forecast.base.id)?;
        section.push_str(&format!(
            "- [{:03} - {}](forecasts/{}) `{}` periods {}..={}, profit {}\n",
            forecast.base.id,
            forecast.base.title,
            record_filename(forecast.base.id, &forecast.base.title),
            forecast.status,
            forecast.start_period,
            forecast.end_period,
            format_amount(summary.total_profit)
        ));
    }

    section.push('\n');
    Ok(section)
}

/// Generate the README.md index
pub fn generate(ledger: &Ledger, snapshot_dir: &Path, stats: &SnapshotStats) -> Result<()> {
    let mut content = String::from("# Tallybook Snapshot\n\n");

    content.push_str("| Records | Count |\n|---------|------:|\n");
    content.push_str(&format!(
        "| Decisions | {} ({} finalized) |\n",
        stats.decisions, stats.decisions_finalized
    ));
    content.push_str(&format!(
        "| Forecasts | {} ({} active) |\n\n",
        stats.forecasts, stats.forecasts_active
    ));

    content.push_str(&generate_decisions_section(ledger));
    content.push_str(&generate_forecasts_section(ledger)?);

    content.push_str(&format!("---\n\n_Generated {}_\n", current_timestamp()));

    write_snapshot_file(&snapshot_dir.join(README_FILE), &content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Principal;
    use crate::registry::CallContext;

    #[test]
    fn test_sections_empty_for_empty_ledger() {
        let ledger = Ledger::new();
        assert!(generate_decisions_section(&ledger).is_empty());
        assert!(generate_forecasts_section(&ledger).unwrap().is_empty());
    }

    #[test]
    fn test_sections_link_records() {
        let ctx = CallContext::new(Principal::new("ST1CREATOR").unwrap(), 100);
        let mut ledger = Ledger::new();
        let d = ledger
            .decisions
            .create_decision(&ctx, "Investment Decision", "", "investment")
            .unwrap();
        ledger.decisions.add_criteria(&ctx, d, "ROI", 30, 85, "").unwrap();
        ledger.decisions.finalize_decision(&ctx, d, "Go").unwrap();
        let f = ledger
            .forecasts
            .create_forecast(&ctx, "Q1 Forecast", "", "revenue", 1, 3)
            .unwrap();
        ledger
            .forecasts
            .add_forecast_data(&ctx, f, 1, 100_000, 75_000, 85)
            .unwrap();

        let decisions = generate_decisions_section(&ledger);
        assert!(decisions.contains(
            "- [001 - Investment Decision](decisions/001-investment-decision.md) `finalized` score 85"
        ));

        let forecasts = generate_forecasts_section(&ledger).unwrap();
        assert!(forecasts.contains("(forecasts/001-q1-forecast.md) `active` periods 1..=3, profit 25,000"));
    }
}
