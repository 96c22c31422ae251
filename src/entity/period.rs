use serde::Serialize;

/// Financial figures for one period of a forecast, keyed by
/// `(forecast_id, period)`. `profit` is derived and may be negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForecastPeriodData {
    pub forecast_id: u64,
    pub period: i64,
    revenue: u64,
    expenses: u64,
    profit: i128,
    pub confidence: u32,
}

impl ForecastPeriodData {
    pub fn new(forecast_id: u64, period: i64, revenue: u64, expenses: u64, confidence: u32) -> Self {
        Self {
            forecast_id,
            period,
            revenue,
            expenses,
            profit: revenue as i128 - expenses as i128,
            confidence,
        }
    }

    pub(crate) fn restore(
        forecast_id: u64,
        period: i64,
        revenue: u64,
        expenses: u64,
        profit: i128,
        confidence: u32,
    ) -> Option<Self> {
        let data = Self::new(forecast_id, period, revenue, expenses, confidence);
        (data.profit == profit).then_some(data)
    }

    pub fn revenue(&self) -> u64 {
        self.revenue
    }

    pub fn expenses(&self) -> u64 {
        self.expenses
    }

    pub fn profit(&self) -> i128 {
        self.profit
    }

    pub(crate) fn is_consistent(&self) -> bool {
        self.profit == self.revenue as i128 - self.expenses as i128
    }
}
