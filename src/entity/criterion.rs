use serde::Serialize;

/// A weighted line item owned by a decision.
///
/// `weighted_score` is derived from `weight * score` and is recomputed on
/// every write to either input; it has no setter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Criterion {
    pub decision_id: u64,
    pub criterion_id: u64,
    pub name: String,
    weight: u32,
    score: u32,
    weighted_score: u32,
    pub notes: String,
}

impl Criterion {
    /// Inputs must already be range-checked.
    pub(crate) fn new(
        decision_id: u64,
        criterion_id: u64,
        name: String,
        weight: u32,
        score: u32,
        notes: String,
    ) -> Self {
        Self {
            decision_id,
            criterion_id,
            name,
            weight,
            score,
            weighted_score: weight * score,
            notes,
        }
    }

    /// Rebuild a criterion from persisted fields, rejecting a stored
    /// weighted score that disagrees with its inputs.
    pub(crate) fn restore(
        decision_id: u64,
        criterion_id: u64,
        name: String,
        weight: u32,
        score: u32,
        weighted_score: u32,
        notes: String,
    ) -> Option<Self> {
        if weight.checked_mul(score)? != weighted_score {
            return None;
        }
        Some(Self::new(decision_id, criterion_id, name, weight, score, notes))
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn weighted_score(&self) -> u32 {
        self.weighted_score
    }

    pub(crate) fn set_score(&mut self, score: u32) {
        self.score = score;
        self.weighted_score = self.weight * score;
    }

    pub(crate) fn set_weight(&mut self, weight: u32) {
        self.weight = weight;
        self.weighted_score = weight * self.score;
    }

    pub(crate) fn is_consistent(&self) -> bool {
        self.weight.checked_mul(self.score) == Some(self.weighted_score)
    }
}

/// Weight-normalized average of the criteria scores:
/// `floor(sum(weighted_score) / sum(weight))`, on the same 0..=100 scale as
/// the scores. Returns `None` when the total weight is zero.
pub fn aggregate_score<'a, I>(criteria: I) -> Option<u32>
where
    I: IntoIterator<Item = &'a Criterion>,
{
    let (weighted, total_weight) = criteria
        .into_iter()
        .fold((0u64, 0u64), |(weighted, total), c| {
            (weighted + c.weighted_score as u64, total + c.weight as u64)
        });

    if total_weight == 0 {
        return None;
    }
    Some((weighted / total_weight) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criterion(id: u64, weight: u32, score: u32) -> Criterion {
        Criterion::new(1, id, format!("c{}", id), weight, score, String::new())
    }

    #[test]
    fn test_weighted_score_on_creation() {
        let c = criterion(1, 30, 85);
        assert_eq!(c.weighted_score(), 2550);
    }

    #[test]
    fn test_set_score_recomputes() {
        let mut c = criterion(1, 30, 85);
        c.set_score(90);
        assert_eq!(c.score(), 90);
        assert_eq!(c.weighted_score(), 2700);
    }

    #[test]
    fn test_set_weight_recomputes() {
        let mut c = criterion(1, 30, 85);
        c.set_weight(25);
        assert_eq!(c.weight(), 25);
        assert_eq!(c.weighted_score(), 2125);
    }

    #[test]
    fn test_restore_rejects_mismatched_weighted_score() {
        let ok = Criterion::restore(1, 1, "ROI".into(), 25, 80, 2000, String::new());
        assert!(ok.is_some());

        let tampered = Criterion::restore(1, 1, "ROI".into(), 25, 80, 1999, String::new());
        assert!(tampered.is_none());
    }

    #[test]
    fn test_restore_rejects_overflowing_inputs() {
        let restored = Criterion::restore(1, 1, "ROI".into(), 70_000, 70_000, 0, String::new());
        assert!(restored.is_none());
    }

    #[test]
    fn test_aggregate_is_weight_normalized() {
        let criteria = vec![criterion(1, 30, 85), criterion(2, 25, 80), criterion(3, 45, 70)];
        // (2550 + 2000 + 3150) / 100 = 77
        assert_eq!(aggregate_score(&criteria), Some(77));
    }

    #[test]
    fn test_aggregate_floors() {
        let criteria = vec![criterion(1, 1, 100), criterion(2, 2, 0)];
        // 100 / 3 = 33.33
        assert_eq!(aggregate_score(&criteria), Some(33));
    }

    #[test]
    fn test_aggregate_zero_weight_is_none() {
        assert_eq!(aggregate_score(&Vec::new()), None);
        let criteria = vec![criterion(1, 0, 90), criterion(2, 0, 10)];
        assert_eq!(aggregate_score(&criteria), None);
    }

    #[test]
    fn test_aggregate_stays_on_percent_scale() {
        let criteria = vec![criterion(1, 100, 100), criterion(2, 100, 100)];
        assert_eq!(aggregate_score(&criteria), Some(100));
    }
}
