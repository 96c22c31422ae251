use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use super::{audited, CallContext};
use crate::auth::{AuthorizationPolicy, CreatorOnly};
use crate::entity::{Forecast, ForecastPeriodData, ForecastStatus, RecordBase};
use crate::error::{Result, TallyError};
use crate::sequence::SequenceAllocator;
use crate::validate::{check_confidence, check_period, check_timeline};

/// Totals over the periods recorded so far for one forecast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForecastSummary {
    pub forecast_id: u64,
    pub periods_recorded: usize,
    pub periods_total: u64,
    pub total_revenue: u128,
    pub total_expenses: u128,
    pub total_profit: i128,
    pub mean_confidence: Option<u32>,
}

/// Forecasts and their per-period data.
#[derive(Debug, Clone, Default)]
pub struct ForecastRegistry<P = CreatorOnly> {
    forecasts: BTreeMap<u64, Forecast>,
    periods: BTreeMap<(u64, i64), ForecastPeriodData>,
    sequence: SequenceAllocator,
    policy: P,
}

impl ForecastRegistry<CreatorOnly> {
    pub fn new() -> Self {
        Self::with_policy(CreatorOnly)
    }
}

impl<P: AuthorizationPolicy> ForecastRegistry<P> {
    pub fn with_policy(policy: P) -> Self {
        Self {
            forecasts: BTreeMap::new(),
            periods: BTreeMap::new(),
            sequence: SequenceAllocator::new(),
            policy,
        }
    }

    /// Rebuild a registry from persisted records and check every invariant.
    pub fn restore(
        policy: P,
        forecasts: Vec<Forecast>,
        periods: Vec<ForecastPeriodData>,
        last_id: u64,
    ) -> Result<Self> {
        let registry = Self {
            forecasts: forecasts.into_iter().map(|f| (f.base.id, f)).collect(),
            periods: periods
                .into_iter()
                .map(|p| ((p.forecast_id, p.period), p))
                .collect(),
            sequence: SequenceAllocator::resume(last_id),
            policy,
        };
        registry.verify()?;
        Ok(registry)
    }

    /// Create an active forecast over `start_period..=end_period`.
    ///
    /// A rejected timeline allocates no identifier.
    pub fn create_forecast(
        &mut self,
        ctx: &CallContext,
        title: impl Into<String>,
        description: impl Into<String>,
        forecast_type: impl Into<String>,
        start_period: i64,
        end_period: i64,
    ) -> Result<u64> {
        audited("create_forecast", ctx, check_timeline(start_period, end_period))?;

        let id = self.sequence.allocate();
        let base = RecordBase::new(id, ctx.caller.clone(), title.into(), description.into(), ctx.at);
        self.forecasts
            .insert(id, Forecast::new(base, forecast_type.into(), start_period, end_period));

        info!(forecast_id = id, creator = %ctx.caller, start_period, end_period, "forecast created");
        Ok(id)
    }

    /// Record (or overwrite) the figures for one period.
    pub fn add_forecast_data(
        &mut self,
        ctx: &CallContext,
        forecast_id: u64,
        period: i64,
        revenue: u64,
        expenses: u64,
        confidence: u32,
    ) -> Result<bool> {
        audited(
            "add_forecast_data",
            ctx,
            self.check_owner(ctx, forecast_id).and_then(|forecast| {
                if forecast.status != ForecastStatus::Active {
                    return Err(TallyError::ForecastNotActive {
                        id: forecast_id,
                        status: forecast.status,
                    });
                }
                check_period(period, forecast.start_period, forecast.end_period)?;
                check_confidence(confidence)
            }),
        )?;

        let data = ForecastPeriodData::new(forecast_id, period, revenue, expenses, confidence);
        debug_assert!(data.is_consistent());
        let profit = data.profit();
        let replaced = self.periods.insert((forecast_id, period), data).is_some();
        self.touch(forecast_id, ctx.at);

        info!(forecast_id, period, profit = %profit, replaced, "forecast data recorded");
        Ok(true)
    }

    /// Parse `status` and apply it. Unknown status strings are rejected after
    /// the caller has been authorized.
    pub fn update_status(&mut self, ctx: &CallContext, forecast_id: u64, status: &str) -> Result<bool> {
        let next = audited(
            "update_status",
            ctx,
            self.check_owner(ctx, forecast_id)
                .and_then(|_| status.parse::<ForecastStatus>()),
        )?;
        self.set_status(ctx, forecast_id, next)
    }

    pub fn set_status(&mut self, ctx: &CallContext, forecast_id: u64, status: ForecastStatus) -> Result<bool> {
        let previous = audited(
            "set_status",
            ctx,
            self.check_owner(ctx, forecast_id).and_then(|forecast| {
                if forecast.status.can_transition_to(status) {
                    Ok(forecast.status)
                } else {
                    Err(TallyError::InvalidStatusTransition {
                        from: forecast.status,
                        to: status,
                    })
                }
            }),
        )?;

        if let Some(forecast) = self.forecasts.get_mut(&forecast_id) {
            forecast.status = status;
            forecast.base.touch(ctx.at);
        }

        info!(forecast_id, from = %previous, to = %status, "forecast status updated");
        Ok(true)
    }

    pub fn get_forecast(&self, forecast_id: u64) -> Result<&Forecast> {
        debug!(forecast_id, "get forecast");
        self.forecasts
            .get(&forecast_id)
            .ok_or(TallyError::ForecastNotFound(forecast_id))
    }

    pub fn get_forecast_data(&self, forecast_id: u64, period: i64) -> Result<&ForecastPeriodData> {
        debug!(forecast_id, period, "get forecast data");
        self.get_forecast(forecast_id)?;
        self.periods
            .get(&(forecast_id, period))
            .ok_or(TallyError::PeriodDataNotFound { forecast_id, period })
    }

    /// Recorded periods of one forecast in period order.
    pub fn periods_for(&self, forecast_id: u64) -> impl Iterator<Item = &ForecastPeriodData> {
        self.periods
            .range((forecast_id, i64::MIN)..=(forecast_id, i64::MAX))
            .map(|(_, p)| p)
    }

    /// All forecasts in creation order.
    pub fn list_forecasts(&self) -> impl Iterator<Item = &Forecast> {
        self.forecasts.values()
    }

    /// Every period record across all forecasts.
    pub fn all_periods(&self) -> impl Iterator<Item = &ForecastPeriodData> {
        self.periods.values()
    }

    pub fn summary(&self, forecast_id: u64) -> Result<ForecastSummary> {
        let forecast = self.get_forecast(forecast_id)?;

        let mut summary = ForecastSummary {
            forecast_id,
            periods_recorded: 0,
            periods_total: forecast.period_count(),
            total_revenue: 0,
            total_expenses: 0,
            total_profit: 0,
            mean_confidence: None,
        };
        let mut confidence_sum = 0u64;

        for data in self.periods_for(forecast_id) {
            summary.periods_recorded += 1;
            summary.total_revenue += data.revenue() as u128;
            summary.total_expenses += data.expenses() as u128;
            summary.total_profit += data.profit();
            confidence_sum += data.confidence as u64;
        }

        if summary.periods_recorded > 0 {
            summary.mean_confidence = Some((confidence_sum / summary.periods_recorded as u64) as u32);
        }
        Ok(summary)
    }

    pub fn sequence(&self) -> SequenceAllocator {
        self.sequence
    }

    pub fn len(&self) -> usize {
        self.forecasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forecasts.is_empty()
    }

    /// Re-check every stored invariant, see [`TallyError::InvariantViolation`].
    pub fn verify(&self) -> Result<()> {
        for (&id, forecast) in &self.forecasts {
            if id != forecast.base.id || id == 0 || id > self.sequence.last() {
                return Err(TallyError::InvariantViolation(format!(
                    "forecast id {} outside allocated sequence 1..={}",
                    forecast.base.id,
                    self.sequence.last()
                )));
            }
            if check_timeline(forecast.start_period, forecast.end_period).is_err() {
                return Err(TallyError::InvariantViolation(format!(
                    "forecast {} has invalid timeline {}..={}",
                    id, forecast.start_period, forecast.end_period
                )));
            }
        }

        for (&(forecast_id, period), data) in &self.periods {
            let Some(forecast) = self.forecasts.get(&forecast_id) else {
                return Err(TallyError::InvariantViolation(format!(
                    "period {} references missing forecast {}",
                    period, forecast_id
                )));
            };
            if data.forecast_id != forecast_id || data.period != period {
                return Err(TallyError::InvariantViolation(format!(
                    "period key ({}, {}) does not match its record",
                    forecast_id, period
                )));
            }
            if !forecast.contains_period(period) {
                return Err(TallyError::InvariantViolation(format!(
                    "period {} lies outside forecast {} timeline {}..={}",
                    period, forecast_id, forecast.start_period, forecast.end_period
                )));
            }
            if !data.is_consistent() {
                return Err(TallyError::InvariantViolation(format!(
                    "period {} of forecast {} has profit {} != {} - {}",
                    period,
                    forecast_id,
                    data.profit(),
                    data.revenue(),
                    data.expenses()
                )));
            }
            if check_confidence(data.confidence).is_err() {
                return Err(TallyError::InvariantViolation(format!(
                    "period {} of forecast {} has confidence {}",
                    period, forecast_id, data.confidence
                )));
            }
        }

        Ok(())
    }

    fn check_owner(&self, ctx: &CallContext, forecast_id: u64) -> Result<&Forecast> {
        let forecast = self
            .forecasts
            .get(&forecast_id)
            .ok_or(TallyError::ForecastNotFound(forecast_id))?;

        if !self.policy.authorize(&forecast.base.creator, &ctx.caller) {
            return Err(TallyError::ForecastUnauthorized {
                id: forecast_id,
                caller: ctx.caller.to_string(),
            });
        }
        Ok(forecast)
    }

    fn touch(&mut self, forecast_id: u64, at: u64) {
        if let Some(forecast) = self.forecasts.get_mut(&forecast_id) {
            forecast.base.touch(at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Principal;

    const CREATOR: &str = "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM";
    const OTHER: &str = "ST2CY5V39NHDPWSXMW9QDT3HC3GD6Q6XX4CFRK9AG";

    fn ctx(who: &str, at: u64) -> CallContext {
        CallContext::new(Principal::new(who).unwrap(), at)
    }

    fn registry_with_forecast() -> (ForecastRegistry, u64) {
        let mut registry = ForecastRegistry::new();
        let id = registry
            .create_forecast(
                &ctx(CREATOR, 100),
                "Q1 2024 Revenue Forecast",
                "Quarterly revenue projection",
                "revenue",
                1,
                3,
            )
            .unwrap();
        (registry, id)
    }

    #[test]
    fn test_create_forecast_initial_state() {
        let (registry, id) = registry_with_forecast();
        assert_eq!(id, 1);

        let forecast = registry.get_forecast(id).unwrap();
        assert_eq!(forecast.base.title, "Q1 2024 Revenue Forecast");
        assert_eq!(forecast.status, ForecastStatus::Active);
        assert_eq!((forecast.start_period, forecast.end_period), (1, 3));
        assert_eq!(forecast.base.created_at, 100);
    }

    #[test]
    fn test_ids_increment() {
        let (mut registry, first) = registry_with_forecast();
        let second = registry
            .create_forecast(&ctx(CREATOR, 101), "Q2", "", "revenue", 4, 6)
            .unwrap();
        assert_eq!((first, second), (1, 2));
    }

    #[test]
    fn test_invalid_timeline_allocates_no_id() {
        let (mut registry, _) = registry_with_forecast();

        let err = registry
            .create_forecast(&ctx(CREATOR, 101), "Bad", "", "revenue", 5, 2)
            .unwrap_err();
        assert_eq!(err.code(), 203);

        let err = registry
            .create_forecast(&ctx(CREATOR, 101), "Negative", "", "revenue", -1, 2)
            .unwrap_err();
        assert_eq!(err.code(), 203);

        assert_eq!(registry.len(), 1);
        let next = registry
            .create_forecast(&ctx(CREATOR, 102), "Good", "", "revenue", 1, 1)
            .unwrap();
        assert_eq!(next, 2);
    }

    #[test]
    fn test_add_forecast_data_computes_profit() {
        let (mut registry, id) = registry_with_forecast();
        assert!(registry
            .add_forecast_data(&ctx(CREATOR, 110), id, 2, 100_000, 75_000, 85)
            .unwrap());

        let data = registry.get_forecast_data(id, 2).unwrap();
        assert_eq!(data.revenue(), 100_000);
        assert_eq!(data.profit(), 25_000);
        assert_eq!(data.confidence, 85);
        assert_eq!(registry.get_forecast(id).unwrap().base.updated_at, 110);
    }

    #[test]
    fn test_negative_profit_and_overwrite() {
        let (mut registry, id) = registry_with_forecast();
        let creator = ctx(CREATOR, 110);
        registry.add_forecast_data(&creator, id, 1, 50_000, 75_000, 40).unwrap();
        assert_eq!(registry.get_forecast_data(id, 1).unwrap().profit(), -25_000);

        registry.add_forecast_data(&creator, id, 1, 90_000, 75_000, 70).unwrap();
        let data = registry.get_forecast_data(id, 1).unwrap();
        assert_eq!(data.profit(), 15_000);
        assert_eq!(data.confidence, 70);
        assert_eq!(registry.periods_for(id).count(), 1);
    }

    #[test]
    fn test_period_outside_timeline_is_rejected() {
        let (mut registry, id) = registry_with_forecast();
        let err = registry
            .add_forecast_data(&ctx(CREATOR, 110), id, 5, 100_000, 75_000, 85)
            .unwrap_err();
        assert_eq!(err.code(), 204);
        assert_eq!(registry.periods_for(id).count(), 0);
        assert_eq!(registry.get_forecast(id).unwrap().base.updated_at, 100);
    }

    #[test]
    fn test_unauthorized_data_addition() {
        let (mut registry, id) = registry_with_forecast();
        let err = registry
            .add_forecast_data(&ctx(OTHER, 110), id, 2, 1, 1, 50)
            .unwrap_err();
        assert_eq!(err.code(), 200);
        assert_eq!(registry.get_forecast_data(id, 2).unwrap_err().code(), 202);
    }

    #[test]
    fn test_confidence_bound() {
        let (mut registry, id) = registry_with_forecast();
        let creator = ctx(CREATOR, 110);
        assert!(registry.add_forecast_data(&creator, id, 1, 1, 1, 100).is_ok());
        assert_eq!(
            registry.add_forecast_data(&creator, id, 2, 1, 1, 101).unwrap_err().code(),
            208
        );
    }

    #[test]
    fn test_update_status() {
        let (mut registry, id) = registry_with_forecast();

        assert_eq!(
            registry.update_status(&ctx(OTHER, 120), id, "closed").unwrap_err().code(),
            200
        );
        assert_eq!(
            registry.update_status(&ctx(CREATOR, 120), id, "archived").unwrap_err().code(),
            205
        );
        assert_eq!(registry.get_forecast(id).unwrap().status, ForecastStatus::Active);

        assert!(registry.update_status(&ctx(CREATOR, 130), id, "closed").unwrap());
        let forecast = registry.get_forecast(id).unwrap();
        assert_eq!(forecast.status, ForecastStatus::Closed);
        assert_eq!(forecast.base.updated_at, 130);

        assert_eq!(
            registry.update_status(&ctx(CREATOR, 140), id, "active").unwrap_err().code(),
            206
        );
    }

    #[test]
    fn test_closed_forecast_rejects_data() {
        let (mut registry, id) = registry_with_forecast();
        let creator = ctx(CREATOR, 110);
        registry.set_status(&creator, id, ForecastStatus::Cancelled).unwrap();

        assert_eq!(
            registry.add_forecast_data(&creator, id, 1, 1, 1, 1).unwrap_err().code(),
            207
        );
    }

    #[test]
    fn test_unknown_forecast() {
        let (mut registry, _) = registry_with_forecast();
        assert_eq!(registry.get_forecast(9).unwrap_err().code(), 201);
        assert_eq!(registry.get_forecast_data(9, 1).unwrap_err().code(), 201);
        assert_eq!(
            registry
                .add_forecast_data(&ctx(CREATOR, 110), 9, 1, 1, 1, 1)
                .unwrap_err()
                .code(),
            201
        );
    }

    #[test]
    fn test_summary() {
        let (mut registry, id) = registry_with_forecast();
        let creator = ctx(CREATOR, 110);
        registry.add_forecast_data(&creator, id, 1, 100_000, 75_000, 85).unwrap();
        registry.add_forecast_data(&creator, id, 3, 20_000, 50_000, 60).unwrap();

        let summary = registry.summary(id).unwrap();
        assert_eq!(summary.periods_recorded, 2);
        assert_eq!(summary.periods_total, 3);
        assert_eq!(summary.total_revenue, 120_000);
        assert_eq!(summary.total_expenses, 125_000);
        assert_eq!(summary.total_profit, -5_000);
        assert_eq!(summary.mean_confidence, Some(72));

        let periods: Vec<i64> = registry.periods_for(id).map(|p| p.period).collect();
        assert_eq!(periods, vec![1, 3]);
    }

    #[test]
    fn test_summary_without_data() {
        let (registry, id) = registry_with_forecast();
        let summary = registry.summary(id).unwrap();
        assert_eq!(summary.periods_recorded, 0);
        assert_eq!(summary.mean_confidence, None);
    }

    #[test]
    fn test_restore_rejects_period_outside_timeline() {
        let (registry, _) = registry_with_forecast();
        let forecasts: Vec<Forecast> = registry.list_forecasts().cloned().collect();
        let periods = vec![ForecastPeriodData::new(1, 7, 10, 5, 50)];

        let err = ForecastRegistry::restore(CreatorOnly, forecasts.clone(), periods, 1).unwrap_err();
        assert!(err.is_fatal());

        let periods = vec![ForecastPeriodData::new(1, 2, 10, 5, 50)];
        let restored = ForecastRegistry::restore(CreatorOnly, forecasts, periods, 1).unwrap();
        assert_eq!(restored.get_forecast_data(1, 2).unwrap().profit(), 5);
    }
}
