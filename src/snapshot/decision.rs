// src/snapshot/decision.rs
//! Decision snapshot generation

use std::path::Path;

use serde::Serialize;

use crate::entity::{Criterion, Decision};
use crate::ledger::Ledger;
use crate::Result;

use super::utils::{record_filename, write_snapshot_file};
use super::{yaml_frontmatter, GeneratedFile};

#[derive(Serialize)]
struct DecisionFrontmatter {
    id: u64,
    title: String,
    decision_type: String,
    status: String,
    creator: String,
    created_at: u64,
    updated_at: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    final_score: Option<u32>,
}

impl DecisionFrontmatter {
    fn from_decision(decision: &Decision) -> Self {
        Self {
            id: decision.base.id,
            title: decision.base.title.clone(),
            decision_type: decision.decision_type.clone(),
            status: decision.status.to_string(),
            creator: decision.base.creator.to_string(),
            created_at: decision.base.created_at,
            updated_at: decision.base.updated_at,
            final_score: (!decision.is_draft()).then_some(decision.final_score),
        }
    }
}

/// Generate markdown body for a decision and its criteria
fn generate_body(decision: &Decision, criteria: &[&Criterion], preview: Option<u32>) -> String {
    let mut body = format!("\n# {}\n", decision.base.title);

    if !decision.base.description.is_empty() {
        body.push('\n');
        body.push_str(&decision.base.description);
        body.push('\n');
    }

    body.push_str("\n## Criteria\n\n");
    if criteria.is_empty() {
        body.push_str("_No criteria recorded._\n");
    } else {
        body.push_str("| # | Criterion | Weight | Score | Weighted | Notes |\n");
        body.push_str("|---|-----------|-------:|------:|---------:|-------|\n");
        for c in criteria {
            body.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                c.criterion_id,
                c.name,
                c.weight(),
                c.score(),
                c.weighted_score(),
                c.notes
            ));
        }
    }

    body.push_str("\n## Result\n\n");
    if decision.is_draft() {
        match preview {
            Some(score) => body.push_str(&format!("Draft. Current aggregate: **{}**\n", score)),
            None => body.push_str("Draft. No weighted criteria yet.\n"),
        }
    } else {
        body.push_str(&format!("Final score: **{}**\n\n", decision.final_score));
        body.push_str(&format!("> {}\n", decision.recommendation));
    }

    body
}

/// Generate decision snapshot files
pub fn generate(ledger: &Ledger, snapshot_dir: &Path) -> Result<Vec<GeneratedFile>> {
    let decisions_dir = snapshot_dir.join("decisions");
    let mut generated = Vec::new();

    for decision in ledger.decisions.list_decisions() {
        let id = decision.base.id;
        let criteria: Vec<&Criterion> = ledger.decisions.criteria_for(id).collect();
        let preview = ledger.decisions.preview_score(id)?;

        let frontmatter = DecisionFrontmatter::from_decision(decision);
        let content = format!(
            "{}{}",
            yaml_frontmatter(&frontmatter)?,
            generate_body(decision, &criteria, preview)
        );

        let filename = record_filename(id, &decision.base.title);
        write_snapshot_file(&decisions_dir.join(&filename), &content)?;

        generated.push(GeneratedFile {
            relative_path: format!("decisions/{}", filename),
        });
    }

    Ok(generated)
}
