use thiserror::Error;

use crate::entity::ForecastStatus;

/// Stable numeric codes surfaced in receipts and on the CLI.
///
/// Decision registry codes live in the 500 range, forecast registry codes in
/// the 200 range and host-side failures in the 900 range. A code is never
/// shared by two conditions of the same registry.
pub mod error_codes {
    pub const DECISION_UNAUTHORIZED: u32 = 500;
    pub const DECISION_NOT_FOUND: u32 = 501;
    pub const ALREADY_FINALIZED: u32 = 502;
    pub const WEIGHT_OUT_OF_RANGE: u32 = 503;
    pub const SCORE_OUT_OF_RANGE: u32 = 504;
    pub const CRITERION_NOT_FOUND: u32 = 505;
    pub const NO_WEIGHTED_CRITERIA: u32 = 506;
    pub const EMPTY_RECOMMENDATION: u32 = 507;

    pub const FORECAST_UNAUTHORIZED: u32 = 200;
    pub const FORECAST_NOT_FOUND: u32 = 201;
    pub const PERIOD_DATA_NOT_FOUND: u32 = 202;
    pub const INVALID_TIMELINE: u32 = 203;
    pub const INVALID_PERIOD: u32 = 204;
    pub const INVALID_STATUS: u32 = 205;
    pub const INVALID_STATUS_TRANSITION: u32 = 206;
    pub const FORECAST_NOT_ACTIVE: u32 = 207;
    pub const CONFIDENCE_OUT_OF_RANGE: u32 = 208;

    pub const STORAGE: u32 = 900;
    pub const PROJECT_STATE: u32 = 901;
    pub const INVALID_PRINCIPAL: u32 = 902;
    pub const INVARIANT_VIOLATION: u32 = 999;
}

#[derive(Error, Debug)]
pub enum TallyError {
    // Decision registry
    #[error("Caller '{caller}' is not the creator of decision {id}")]
    DecisionUnauthorized { id: u64, caller: String },

    #[error("Decision not found: {0}")]
    DecisionNotFound(u64),

    #[error("Decision {0} is already finalized")]
    AlreadyFinalized(u64),

    #[error("Weight {0} is outside 0..=100")]
    WeightOutOfRange(u32),

    #[error("Score {0} is outside 0..=100")]
    ScoreOutOfRange(u32),

    #[error("Criterion {criterion_id} not found on decision {decision_id}")]
    CriterionNotFound { decision_id: u64, criterion_id: u64 },

    #[error("Decision {0} has no weighted criteria to aggregate")]
    NoWeightedCriteria(u64),

    #[error("Recommendation must not be empty")]
    EmptyRecommendation,

    // Forecast registry
    #[error("Caller '{caller}' is not the creator of forecast {id}")]
    ForecastUnauthorized { id: u64, caller: String },

    #[error("Forecast not found: {0}")]
    ForecastNotFound(u64),

    #[error("No data recorded for period {period} of forecast {forecast_id}")]
    PeriodDataNotFound { forecast_id: u64, period: i64 },

    #[error("Invalid timeline: start period {start} must be non-negative and not after end period {end}")]
    InvalidTimeline { start: i64, end: i64 },

    #[error("Period {period} is outside the forecast timeline {start}..={end}")]
    InvalidPeriod { period: i64, start: i64, end: i64 },

    #[error("Invalid forecast status: {0}. Valid values: active, closed, cancelled")]
    InvalidStatus(String),

    #[error("Forecast status cannot change from {from} to {to}")]
    InvalidStatusTransition {
        from: ForecastStatus,
        to: ForecastStatus,
    },

    #[error("Forecast {id} is {status}; only active forecasts accept data")]
    ForecastNotActive { id: u64, status: ForecastStatus },

    #[error("Confidence {0} is outside 0..=100")]
    ConfidenceOutOfRange(u32),

    // Host
    #[error("Not in a tallybook project. Run 'tallybook init' first.")]
    NotInitialized,

    #[error("Already initialized. Remove .tallybook/ to reinitialize.")]
    AlreadyInitialized,

    #[error("Invalid principal: {0:?}")]
    InvalidPrincipal(String),

    #[error("No caller identity. Pass --as, set TALLYBOOK_CALLER or add 'identity' to .tallybook/config.yaml")]
    MissingCaller,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Loro error: {0}")]
    Loro(#[from] loro::LoroError),

    #[error("Loro encode error: {0}")]
    LoroEncode(#[from] loro::LoroEncodeError),

    #[error("Ledger invariant violated: {0}")]
    InvariantViolation(String),
}

impl TallyError {
    /// Numeric code for this error, see [`error_codes`].
    pub fn code(&self) -> u32 {
        use error_codes::*;
        match self {
            TallyError::DecisionUnauthorized { .. } => DECISION_UNAUTHORIZED,
            TallyError::DecisionNotFound(_) => DECISION_NOT_FOUND,
            TallyError::AlreadyFinalized(_) => ALREADY_FINALIZED,
            TallyError::WeightOutOfRange(_) => WEIGHT_OUT_OF_RANGE,
            TallyError::ScoreOutOfRange(_) => SCORE_OUT_OF_RANGE,
            TallyError::CriterionNotFound { .. } => CRITERION_NOT_FOUND,
            TallyError::NoWeightedCriteria(_) => NO_WEIGHTED_CRITERIA,
            TallyError::EmptyRecommendation => EMPTY_RECOMMENDATION,
            TallyError::ForecastUnauthorized { .. } => FORECAST_UNAUTHORIZED,
            TallyError::ForecastNotFound(_) => FORECAST_NOT_FOUND,
            TallyError::PeriodDataNotFound { .. } => PERIOD_DATA_NOT_FOUND,
            TallyError::InvalidTimeline { .. } => INVALID_TIMELINE,
            TallyError::InvalidPeriod { .. } => INVALID_PERIOD,
            TallyError::InvalidStatus(_) => INVALID_STATUS,
            TallyError::InvalidStatusTransition { .. } => INVALID_STATUS_TRANSITION,
            TallyError::ForecastNotActive { .. } => FORECAST_NOT_ACTIVE,
            TallyError::ConfidenceOutOfRange(_) => CONFIDENCE_OUT_OF_RANGE,
            TallyError::NotInitialized | TallyError::AlreadyInitialized => PROJECT_STATE,
            TallyError::InvalidPrincipal(_) | TallyError::MissingCaller => INVALID_PRINCIPAL,
            TallyError::Storage(_)
            | TallyError::Io(_)
            | TallyError::Json(_)
            | TallyError::Yaml(_)
            | TallyError::Loro(_)
            | TallyError::LoroEncode(_) => STORAGE,
            TallyError::InvariantViolation(_) => INVARIANT_VIOLATION,
        }
    }

    /// True for errors that indicate a bug or corrupted state rather than
    /// bad caller input.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TallyError::InvariantViolation(_))
    }
}

pub type Result<T> = std::result::Result<T, TallyError>;
