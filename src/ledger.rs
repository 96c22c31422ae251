//! The pair of registries a tallybook project holds.

use crate::auth::CreatorOnly;
use crate::error::Result;
use crate::registry::{DecisionRegistry, ForecastRegistry};

#[derive(Debug, Clone, Default)]
pub struct Ledger<P = CreatorOnly> {
    pub decisions: DecisionRegistry<P>,
    pub forecasts: ForecastRegistry<P>,
}

impl Ledger<CreatorOnly> {
    pub fn new() -> Self {
        Self {
            decisions: DecisionRegistry::new(),
            forecasts: ForecastRegistry::new(),
        }
    }
}

impl<P: crate::auth::AuthorizationPolicy> Ledger<P> {
    /// Check every invariant in both registries.
    pub fn verify(&self) -> Result<()> {
        self.decisions.verify()?;
        self.forecasts.verify()
    }

    pub fn record_count(&self) -> usize {
        self.decisions.len()
            + self.decisions.all_criteria().count()
            + self.forecasts.len()
            + self.forecasts.all_periods().count()
    }
}
