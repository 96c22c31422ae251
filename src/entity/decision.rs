use serde::{Deserialize, Serialize};

use super::RecordBase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DecisionStatus {
    #[default]
    Draft,
    Finalized,
}

impl std::fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecisionStatus::Draft => write!(f, "draft"),
            DecisionStatus::Finalized => write!(f, "finalized"),
        }
    }
}

impl std::str::FromStr for DecisionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(DecisionStatus::Draft),
            "finalized" => Ok(DecisionStatus::Finalized),
            _ => Err(format!("Invalid decision status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(flatten)]
    pub base: RecordBase,
    pub decision_type: String,
    pub status: DecisionStatus,
    pub final_score: u32,
    pub recommendation: String,
}

impl Decision {
    pub fn new(base: RecordBase, decision_type: String) -> Self {
        Self {
            base,
            decision_type,
            status: DecisionStatus::default(),
            final_score: 0,
            recommendation: String::new(),
        }
    }

    pub fn is_draft(&self) -> bool {
        self.status == DecisionStatus::Draft
    }

    /// One-way transition to `finalized`, recording the aggregate result.
    pub(crate) fn finalize(&mut self, final_score: u32, recommendation: String, at: u64) {
        self.status = DecisionStatus::Finalized;
        self.final_score = final_score;
        self.recommendation = recommendation;
        self.base.touch(at);
    }

    /// Result fields are populated exactly when the decision is finalized.
    pub(crate) fn result_matches_status(&self) -> bool {
        match self.status {
            DecisionStatus::Draft => self.final_score == 0 && self.recommendation.is_empty(),
            DecisionStatus::Finalized => !self.recommendation.trim().is_empty(),
        }
    }
}
