mod criterion;
mod decision;
mod forecast;
mod period;

pub use criterion::{aggregate_score, Criterion};
pub use decision::{Decision, DecisionStatus};
pub use forecast::{Forecast, ForecastStatus};
pub use period::ForecastPeriodData;

use serde::{Deserialize, Serialize};

use crate::auth::Principal;

/// Base fields shared by top-level records (decisions and forecasts)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordBase {
    pub id: u64,
    pub creator: Principal,
    pub title: String,
    pub description: String,
    pub created_at: u64,
    pub updated_at: u64,
}

impl RecordBase {
    pub fn new(id: u64, creator: Principal, title: String, description: String, at: u64) -> Self {
        Self {
            id,
            creator,
            title,
            description,
            created_at: at,
            updated_at: at,
        }
    }

    /// Stamp a mutation. The version timestamp never moves backwards.
    pub(crate) fn touch(&mut self, at: u64) {
        self.updated_at = self.updated_at.max(at);
    }
}
