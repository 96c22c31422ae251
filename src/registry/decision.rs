use std::collections::BTreeMap;

use tracing::{debug, info};

use super::{audited, CallContext};
use crate::auth::{AuthorizationPolicy, CreatorOnly};
use crate::entity::{aggregate_score, Criterion, Decision, RecordBase};
use crate::error::{Result, TallyError};
use crate::sequence::SequenceAllocator;
use crate::validate::{check_score, check_weight};

/// Decisions and the criteria they own.
#[derive(Debug, Clone, Default)]
pub struct DecisionRegistry<P = CreatorOnly> {
    decisions: BTreeMap<u64, Decision>,
    criteria: BTreeMap<(u64, u64), Criterion>,
    sequence: SequenceAllocator,
    policy: P,
}

impl DecisionRegistry<CreatorOnly> {
    pub fn new() -> Self {
        Self::with_policy(CreatorOnly)
    }
}

impl<P: AuthorizationPolicy> DecisionRegistry<P> {
    pub fn with_policy(policy: P) -> Self {
        Self {
            decisions: BTreeMap::new(),
            criteria: BTreeMap::new(),
            sequence: SequenceAllocator::new(),
            policy,
        }
    }

    /// Rebuild a registry from persisted records and check every invariant.
    pub fn restore(
        policy: P,
        decisions: Vec<Decision>,
        criteria: Vec<Criterion>,
        last_id: u64,
    ) -> Result<Self> {
        let registry = Self {
            decisions: decisions.into_iter().map(|d| (d.base.id, d)).collect(),
            criteria: criteria
                .into_iter()
                .map(|c| ((c.decision_id, c.criterion_id), c))
                .collect(),
            sequence: SequenceAllocator::resume(last_id),
            policy,
        };
        registry.verify()?;
        Ok(registry)
    }

    /// Create a draft decision owned by the caller. Returns its identifier.
    pub fn create_decision(
        &mut self,
        ctx: &CallContext,
        title: impl Into<String>,
        description: impl Into<String>,
        decision_type: impl Into<String>,
    ) -> Result<u64> {
        let id = self.sequence.allocate();
        let base = RecordBase::new(id, ctx.caller.clone(), title.into(), description.into(), ctx.at);
        self.decisions.insert(id, Decision::new(base, decision_type.into()));

        info!(decision_id = id, creator = %ctx.caller, "decision created");
        Ok(id)
    }

    /// Attach a criterion to a draft decision. Returns the criterion's
    /// identifier, numbered from 1 within its decision.
    pub fn add_criteria(
        &mut self,
        ctx: &CallContext,
        decision_id: u64,
        name: impl Into<String>,
        weight: u32,
        score: u32,
        notes: impl Into<String>,
    ) -> Result<u64> {
        audited(
            "add_criteria",
            ctx,
            self.check_editable(ctx, decision_id)
                .and_then(|_| check_weight(weight))
                .and_then(|_| check_score(score)),
        )?;

        let criterion_id = self.next_criterion_id(decision_id);
        let criterion = Criterion::new(decision_id, criterion_id, name.into(), weight, score, notes.into());
        debug_assert!(criterion.is_consistent());
        self.criteria.insert((decision_id, criterion_id), criterion);
        self.touch(decision_id, ctx.at);

        info!(decision_id, criterion_id, weight, score, "criterion added");
        Ok(criterion_id)
    }

    pub fn update_criteria_score(
        &mut self,
        ctx: &CallContext,
        decision_id: u64,
        criterion_id: u64,
        score: u32,
    ) -> Result<bool> {
        audited(
            "update_criteria_score",
            ctx,
            self.check_editable(ctx, decision_id)
                .and_then(|_| self.check_criterion(decision_id, criterion_id))
                .and_then(|_| check_score(score)),
        )?;

        if let Some(criterion) = self.criteria.get_mut(&(decision_id, criterion_id)) {
            criterion.set_score(score);
            debug_assert!(criterion.is_consistent());
        }
        self.touch(decision_id, ctx.at);

        info!(decision_id, criterion_id, score, "criterion score updated");
        Ok(true)
    }

    pub fn update_criteria_weight(
        &mut self,
        ctx: &CallContext,
        decision_id: u64,
        criterion_id: u64,
        weight: u32,
    ) -> Result<bool> {
        audited(
            "update_criteria_weight",
            ctx,
            self.check_editable(ctx, decision_id)
                .and_then(|_| self.check_criterion(decision_id, criterion_id))
                .and_then(|_| check_weight(weight)),
        )?;

        if let Some(criterion) = self.criteria.get_mut(&(decision_id, criterion_id)) {
            criterion.set_weight(weight);
            debug_assert!(criterion.is_consistent());
        }
        self.touch(decision_id, ctx.at);

        info!(decision_id, criterion_id, weight, "criterion weight updated");
        Ok(true)
    }

    /// Aggregate the criteria into a final score and lock the decision.
    ///
    /// Succeeds at most once per decision; later calls fail with
    /// [`TallyError::AlreadyFinalized`] and change nothing.
    pub fn finalize_decision(
        &mut self,
        ctx: &CallContext,
        decision_id: u64,
        recommendation: impl Into<String>,
    ) -> Result<bool> {
        let recommendation = recommendation.into();
        let final_score = audited(
            "finalize_decision",
            ctx,
            self.check_editable(ctx, decision_id).and_then(|_| {
                if recommendation.trim().is_empty() {
                    return Err(TallyError::EmptyRecommendation);
                }
                aggregate_score(self.criteria_for(decision_id))
                    .ok_or(TallyError::NoWeightedCriteria(decision_id))
            }),
        )?;

        if let Some(decision) = self.decisions.get_mut(&decision_id) {
            decision.finalize(final_score, recommendation, ctx.at);
            debug_assert!(decision.result_matches_status());
        }

        info!(decision_id, final_score, "decision finalized");
        Ok(true)
    }

    pub fn get_decision(&self, decision_id: u64) -> Result<&Decision> {
        debug!(decision_id, "get decision");
        self.decisions
            .get(&decision_id)
            .ok_or(TallyError::DecisionNotFound(decision_id))
    }

    pub fn get_criteria(&self, decision_id: u64, criterion_id: u64) -> Result<&Criterion> {
        debug!(decision_id, criterion_id, "get criterion");
        self.criteria
            .get(&(decision_id, criterion_id))
            .ok_or(TallyError::CriterionNotFound {
                decision_id,
                criterion_id,
            })
    }

    /// Criteria of one decision, ordered by criterion identifier.
    pub fn criteria_for(&self, decision_id: u64) -> impl Iterator<Item = &Criterion> {
        self.criteria
            .range((decision_id, 0)..=(decision_id, u64::MAX))
            .map(|(_, c)| c)
    }

    /// All decisions in creation order.
    pub fn list_decisions(&self) -> impl Iterator<Item = &Decision> {
        self.decisions.values()
    }

    /// Every criterion across all decisions.
    pub fn all_criteria(&self) -> impl Iterator<Item = &Criterion> {
        self.criteria.values()
    }

    /// Score the decision would finalize with right now, `None` when its
    /// criteria carry no weight.
    pub fn preview_score(&self, decision_id: u64) -> Result<Option<u32>> {
        self.get_decision(decision_id)?;
        Ok(aggregate_score(self.criteria_for(decision_id)))
    }

    pub fn sequence(&self) -> SequenceAllocator {
        self.sequence
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    /// Re-check every stored invariant. A failure means the registry state is
    /// corrupt and is reported as [`TallyError::InvariantViolation`].
    pub fn verify(&self) -> Result<()> {
        for (&id, decision) in &self.decisions {
            if id != decision.base.id || id == 0 || id > self.sequence.last() {
                return Err(TallyError::InvariantViolation(format!(
                    "decision id {} outside allocated sequence 1..={}",
                    decision.base.id,
                    self.sequence.last()
                )));
            }
            if !decision.result_matches_status() {
                return Err(TallyError::InvariantViolation(format!(
                    "decision {} result fields disagree with status {}",
                    id, decision.status
                )));
            }
        }

        for (&(decision_id, criterion_id), criterion) in &self.criteria {
            if !self.decisions.contains_key(&decision_id) {
                return Err(TallyError::InvariantViolation(format!(
                    "criterion {} references missing decision {}",
                    criterion_id, decision_id
                )));
            }
            if criterion.decision_id != decision_id || criterion.criterion_id != criterion_id {
                return Err(TallyError::InvariantViolation(format!(
                    "criterion key ({}, {}) does not match its record",
                    decision_id, criterion_id
                )));
            }
            if check_weight(criterion.weight()).is_err() || check_score(criterion.score()).is_err() {
                return Err(TallyError::InvariantViolation(format!(
                    "criterion {} of decision {} holds out-of-range inputs",
                    criterion_id, decision_id
                )));
            }
            if !criterion.is_consistent() {
                return Err(TallyError::InvariantViolation(format!(
                    "criterion {} of decision {} has weighted score {} != {} * {}",
                    criterion_id,
                    decision_id,
                    criterion.weighted_score(),
                    criterion.weight(),
                    criterion.score()
                )));
            }
        }

        Ok(())
    }

    fn check_editable(&self, ctx: &CallContext, decision_id: u64) -> Result<()> {
        let decision = self
            .decisions
            .get(&decision_id)
            .ok_or(TallyError::DecisionNotFound(decision_id))?;

        if !self.policy.authorize(&decision.base.creator, &ctx.caller) {
            return Err(TallyError::DecisionUnauthorized {
                id: decision_id,
                caller: ctx.caller.to_string(),
            });
        }
        if !decision.is_draft() {
            return Err(TallyError::AlreadyFinalized(decision_id));
        }
        Ok(())
    }

    fn check_criterion(&self, decision_id: u64, criterion_id: u64) -> Result<()> {
        self.get_criteria(decision_id, criterion_id).map(|_| ())
    }

    fn next_criterion_id(&self, decision_id: u64) -> u64 {
        self.criteria_for(decision_id)
            .last()
            .map(|c| c.criterion_id + 1)
            .unwrap_or(1)
    }

    fn touch(&mut self, decision_id: u64, at: u64) {
        if let Some(decision) = self.decisions.get_mut(&decision_id) {
            decision.base.touch(at);
        }
    }
}
