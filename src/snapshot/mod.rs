// src/snapshot/mod.rs
//! Snapshot generation module
//!
//! Renders the ledger as markdown with YAML frontmatter, one file per
//! decision and per forecast plus a README index. Snapshots are derived
//! views and are regenerated from scratch on every run.

mod decision;
mod forecast;
mod readme;
pub mod utils;

use std::path::Path;

use chrono::Utc;

use crate::ledger::Ledger;
use crate::Result;

pub use self::utils::{format_amount, format_timestamp, record_filename, slugify};

/// Statistics about generated snapshot
#[derive(Debug, Default)]
pub struct SnapshotStats {
    pub decisions: usize,
    pub decisions_finalized: usize,
    pub forecasts: usize,
    pub forecasts_active: usize,
    pub files_generated: Vec<String>,
}

impl SnapshotStats {
    pub fn total_records(&self) -> usize {
        self.decisions + self.forecasts
    }
}

/// Result of generating a single snapshot file
pub struct GeneratedFile {
    pub relative_path: String,
}

/// Generate markdown snapshots for the whole ledger
///
/// This will:
/// 1. Clear the existing snapshot directory
/// 2. Write one file per decision and per forecast
/// 3. Generate an index README.md
pub fn generate_snapshot(ledger: &Ledger, snapshot_dir: &Path) -> Result<SnapshotStats> {
    let mut stats = SnapshotStats::default();

    utils::clear_snapshot_dir(snapshot_dir)?;
    utils::ensure_snapshot_dirs(snapshot_dir)?;

    let decision_files = decision::generate(ledger, snapshot_dir)?;
    stats.decisions = decision_files.len();
    stats.decisions_finalized = ledger
        .decisions
        .list_decisions()
        .filter(|d| !d.is_draft())
        .count();
    stats.files_generated.extend(decision_files.into_iter().map(|f| f.relative_path));

    let forecast_files = forecast::generate(ledger, snapshot_dir)?;
    stats.forecasts = forecast_files.len();
    stats.forecasts_active = ledger
        .forecasts
        .list_forecasts()
        .filter(|f| !f.status.is_terminal())
        .count();
    stats.files_generated.extend(forecast_files.into_iter().map(|f| f.relative_path));

    // README index must be last to have all stats
    readme::generate(ledger, snapshot_dir, &stats)?;
    stats.files_generated.push(utils::README_FILE.to_string());

    Ok(stats)
}

/// Generate YAML frontmatter block
pub fn yaml_frontmatter<T: serde::Serialize>(data: &T) -> Result<String> {
    let yaml = serde_yaml::to_string(data)?;
    Ok(format!("---\n{}---\n", yaml))
}

/// Get current timestamp for "last updated" footers
pub fn current_timestamp() -> String {
    format_timestamp(&Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Principal;
    use crate::registry::CallContext;
    use tempfile::TempDir;

    #[test]
    fn test_yaml_frontmatter_format() {
        #[derive(serde::Serialize)]
        struct TestFrontmatter {
            title: String,
            status: String,
        }

        let fm = TestFrontmatter {
            title: "Test".to_string(),
            status: "draft".to_string(),
        };

        let result = yaml_frontmatter(&fm).unwrap();
        assert!(result.starts_with("---\n"));
        assert!(result.ends_with("---\n"));
        assert!(result.contains("title: Test"));
        assert!(result.contains("status: draft"));
    }

    #[test]
    fn test_generate_snapshot_empty_ledger() {
        let tmp = TempDir::new().unwrap();
        let snapshot_dir = tmp.path().join("snapshot");

        let stats = generate_snapshot(&Ledger::new(), &snapshot_dir).unwrap();

        assert_eq!(stats.total_records(), 0);
        assert!(snapshot_dir.join("decisions").exists());
        assert!(snapshot_dir.join("forecasts").exists());
        assert!(snapshot_dir.join("README.md").exists());
        assert_eq!(stats.files_generated, vec!["README.md".to_string()]);
    }

    #[test]
    fn test_generate_snapshot_counts_records() {
        let tmp = TempDir::new().unwrap();
        let snapshot_dir = tmp.path().join("snapshot");
        let ctx = CallContext::new(Principal::new("ST1CREATOR").unwrap(), 100);

        let mut ledger = Ledger::new();
        let d = ledger
            .decisions
            .create_decision(&ctx, "Investment Decision", "", "investment")
            .unwrap();
        ledger.decisions.add_criteria(&ctx, d, "ROI", 30, 85, "").unwrap();
        ledger.decisions.finalize_decision(&ctx, d, "Proceed").unwrap();
        ledger.decisions.create_decision(&ctx, "Hiring", "", "people").unwrap();
        ledger
            .forecasts
            .create_forecast(&ctx, "Q1 2024 Revenue Forecast", "", "revenue", 1, 3)
            .unwrap();

        let stats = generate_snapshot(&ledger, &snapshot_dir).unwrap();

        assert_eq!(stats.decisions, 2);
        assert_eq!(stats.decisions_finalized, 1);
        assert_eq!(stats.forecasts, 1);
        assert_eq!(stats.forecasts_active, 1);
        assert!(snapshot_dir.join("decisions/001-investment-decision.md").exists());
        assert!(snapshot_dir.join("forecasts/001-q1-2024-revenue-forecast.md").exists());
    }

    #[test]
    fn test_generate_snapshot_clears_existing() {
        let tmp = TempDir::new().unwrap();
        let snapshot_dir = tmp.path().join("snapshot");

        std::fs::create_dir_all(snapshot_dir.join("decisions")).unwrap();
        std::fs::write(snapshot_dir.join("decisions/009-stale.md"), "old content").unwrap();
        std::fs::write(snapshot_dir.join("keep.txt"), "not generated").unwrap();

        generate_snapshot(&Ledger::new(), &snapshot_dir).unwrap();

        assert!(!snapshot_dir.join("decisions/009-stale.md").exists());
        assert!(snapshot_dir.join("keep.txt").exists());
    }
}
