// src/snapshot/forecast.rs
//! Forecast snapshot generation

use std::path::Path;

use serde::Serialize;

use crate::entity::{Forecast, ForecastPeriodData};
use crate::ledger::Ledger;
use crate::registry::ForecastSummary;
use crate::Result;

use super::utils::{format_amount, record_filename, write_snapshot_file};
use super::{yaml_frontmatter, GeneratedFile};

#[derive(Serialize)]
struct ForecastFrontmatter {
    id: u64,
    title: String,
    forecast_type: String,
    status: String,
    creator: String,
    start_period: i64,
    end_period: i64,
    created_at: u64,
    updated_at: u64,
}

impl ForecastFrontmatter {
    fn from_forecast(forecast: &Forecast) -> Self {
        Self {
            id: forecast.base.id,
            title: forecast.base.title.clone(),
            forecast_type: forecast.forecast_type.clone(),
            status: forecast.status.to_string(),
            creator: forecast.base.creator.to_string(),
            start_period: forecast.start_period,
            end_period: forecast.end_period,
            created_at: forecast.base.created_at,
            updated_at: forecast.base.updated_at,
        }
    }
}

fn generate_body(forecast: &Forecast, periods: &[&ForecastPeriodData], summary: &ForecastSummary) -> String {
    let mut body = format!("\n# {}\n", forecast.base.title);

    if !forecast.base.description.is_empty() {
        body.push('\n');
        body.push_str(&forecast.base.description);
        body.push('\n');
    }

    body.push_str(&format!(
        "\n## Periods\n\n{} of {} periods recorded.\n\n",
        summary.periods_recorded, summary.periods_total
    ));

    if !periods.is_empty() {
        body.push_str("| Period | Revenue | Expenses | Profit | Confidence |\n");
        body.push_str("|-------:|--------:|---------:|-------:|-----------:|\n");
        for p in periods {
            body.push_str(&format!(
                "| {} | {} | {} | {} | {}% |\n",
                p.period,
                format_amount(p.revenue() as i128),
                format_amount(p.expenses() as i128),
                format_amount(p.profit()),
                p.confidence
            ));
        }

        body.push_str(&format!(
            "\n**Total profit:** {}",
            format_amount(summary.total_profit)
        ));
        if let Some(confidence) = summary.mean_confidence {
            body.push_str(&format!(" (mean confidence {}%)", confidence));
        }
        body.push('\n');
    }

    body
}

/// Generate forecast snapshot files
pub fn generate(ledger: &Ledger, snapshot_dir: &Path) -> Result<Vec<GeneratedFile>> {
    let forecasts_dir = snapshot_dir.join("forecasts");
    let mut generated = Vec::new();

    for forecast in ledger.forecasts.list_forecasts() {
        let id = forecast.base.id;
        let periods: Vec<&ForecastPeriodData> = ledger.forecasts.periods_for(id).collect();
        let summary = ledger.forecasts.summary(id)?;

        let frontmatter = ForecastFrontmatter::from_forecast(forecast);
        let content = format!(
            "{}{}",
            yaml_frontmatter(&frontmatter)?,
            generate_body(forecast, &periods, &summary)
        );

        let filename = record_filename(id, &forecast.base.title);
        write_snapshot_file(&forecasts_dir.join(&filename), &content)?;

        generated.push(GeneratedFile {
            relative_path: format!("forecasts/{}", filename),
        });
    }

    Ok(generated)
}
