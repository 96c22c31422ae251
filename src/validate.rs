//! Numeric range and timeline checks run before any state is touched.

use crate::error::{Result, TallyError};

/// Upper bound shared by weights, scores and confidence values.
pub const PERCENT_MAX: u32 = 100;

fn is_percent(value: u32) -> bool {
    value <= PERCENT_MAX
}

pub fn check_weight(weight: u32) -> Result<()> {
    if is_percent(weight) {
        Ok(())
    } else {
        Err(TallyError::WeightOutOfRange(weight))
    }
}

pub fn check_score(score: u32) -> Result<()> {
    if is_percent(score) {
        Ok(())
    } else {
        Err(TallyError::ScoreOutOfRange(score))
    }
}

pub fn check_confidence(confidence: u32) -> Result<()> {
    if is_percent(confidence) {
        Ok(())
    } else {
        Err(TallyError::ConfidenceOutOfRange(confidence))
    }
}

/// A timeline is valid when both ends are non-negative and `start <= end`.
pub fn check_timeline(start: i64, end: i64) -> Result<()> {
    if start < 0 || end < 0 || start > end {
        return Err(TallyError::InvalidTimeline { start, end });
    }
    Ok(())
}

pub fn check_period(period: i64, start: i64, end: i64) -> Result<()> {
    if (start..=end).contains(&period) {
        Ok(())
    } else {
        Err(TallyError::InvalidPeriod { period, start, end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_bounds() {
        assert!(check_weight(0).is_ok());
        assert!(check_weight(100).is_ok());
        assert!(matches!(check_weight(101), Err(TallyError::WeightOutOfRange(101))));

        assert!(check_score(0).is_ok());
        assert!(check_score(100).is_ok());
        assert!(matches!(check_score(150), Err(TallyError::ScoreOutOfRange(150))));

        assert!(check_confidence(85).is_ok());
        assert!(matches!(
            check_confidence(u32::MAX),
            Err(TallyError::ConfidenceOutOfRange(_))
        ));
    }

    #[test]
    fn test_timeline() {
        assert!(check_timeline(1, 3).is_ok());
        assert!(check_timeline(0, 0).is_ok());
        assert!(matches!(
            check_timeline(3, 1),
            Err(TallyError::InvalidTimeline { start: 3, end: 1 })
        ));
        assert!(check_timeline(-1, 3).is_err());
        assert!(check_timeline(-5, -1).is_err());
    }

    #[test]
    fn test_period_inclusive() {
        assert!(check_period(1, 1, 3).is_ok());
        assert!(check_period(3, 1, 3).is_ok());
        assert!(matches!(
            check_period(5, 1, 3),
            Err(TallyError::InvalidPeriod { period: 5, .. })
        ));
        assert!(check_period(0, 1, 3).is_err());
    }
}
