use serde::{Deserialize, Serialize};

use super::RecordBase;
use crate::error::TallyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ForecastStatus {
    #[default]
    Active,
    Closed,
    Cancelled,
}

impl ForecastStatus {
    /// `active` may move to any status; `closed` and `cancelled` are terminal.
    pub fn can_transition_to(self, next: ForecastStatus) -> bool {
        match self {
            ForecastStatus::Active => true,
            ForecastStatus::Closed | ForecastStatus::Cancelled => self == next,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, ForecastStatus::Active)
    }
}

impl std::fmt::Display for ForecastStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForecastStatus::Active => write!(f, "active"),
            ForecastStatus::Closed => write!(f, "closed"),
            ForecastStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for ForecastStatus {
    type Err = TallyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(ForecastStatus::Active),
            "closed" => Ok(ForecastStatus::Closed),
            "cancelled" | "canceled" => Ok(ForecastStatus::Cancelled),
            _ => Err(TallyError::InvalidStatus(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forecast {
    #[serde(flatten)]
    pub base: RecordBase,
    pub forecast_type: String,
    pub start_period: i64,
    pub end_period: i64,
    pub status: ForecastStatus,
}

impl Forecast {
    pub fn new(base: RecordBase, forecast_type: String, start_period: i64, end_period: i64) -> Self {
        Self {
            base,
            forecast_type,
            start_period,
            end_period,
            status: ForecastStatus::default(),
        }
    }

    pub fn contains_period(&self, period: i64) -> bool {
        (self.start_period..=self.end_period).contains(&period)
    }

    /// Number of periods in the inclusive timeline.
    pub fn period_count(&self) -> u64 {
        self.end_period.abs_diff(self.start_period) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Principal;

    fn forecast(start: i64, end: i64) -> Forecast {
        let base = RecordBase::new(
            1,
            Principal::new("ST1CREATOR").unwrap(),
            "Q1 2024 Revenue Forecast".to_string(),
            "Quarterly revenue projection".to_string(),
            100,
        );
        Forecast::new(base, "revenue".to_string(), start, end)
    }

    #[test]
    fn test_new_forecast_is_active() {
        assert_eq!(forecast(1, 3).status, ForecastStatus::Active);
    }

    #[test]
    fn test_contains_period_is_inclusive() {
        let f = forecast(1, 3);
        assert!(f.contains_period(1));
        assert!(f.contains_period(2));
        assert!(f.contains_period(3));
        assert!(!f.contains_period(0));
        assert!(!f.contains_period(4));
        assert_eq!(f.period_count(), 3);
    }

    #[test]
    fn test_single_period_timeline() {
        let f = forecast(4, 4);
        assert!(f.contains_period(4));
        assert_eq!(f.period_count(), 1);
    }

    #[test]
    fn test_status_parse_rejects_unknown() {
        assert_eq!("active".parse::<ForecastStatus>().unwrap(), ForecastStatus::Active);
        assert_eq!(" Closed ".parse::<ForecastStatus>().unwrap(), ForecastStatus::Closed);
        assert_eq!(
            "canceled".parse::<ForecastStatus>().unwrap(),
            ForecastStatus::Cancelled
        );

        let err = "archived".parse::<ForecastStatus>().unwrap_err();
        assert!(matches!(err, TallyError::InvalidStatus(ref s) if s == "archived"));
    }

    #[test]
    fn test_transitions() {
        use ForecastStatus::*;
        assert!(Active.can_transition_to(Closed));
        assert!(Active.can_transition_to(Cancelled));
        assert!(Active.can_transition_to(Active));
        assert!(!Closed.can_transition_to(Active));
        assert!(!Cancelled.can_transition_to(Closed));
        assert!(Closed.can_transition_to(Closed));
        assert!(Closed.is_terminal());
        assert!(!Active.is_terminal());
    }
}
