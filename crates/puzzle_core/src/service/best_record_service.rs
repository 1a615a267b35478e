//! Per-category personal-best evaluation.
//!
//! # Responsibility
//! - Decide whether a candidate value creates, improves, or leaves a best
//!   record untouched.
//! - Emit a rank update after every create or improvement.
//!
//! # Invariants
//! - Strictly lower wins; ties are `Unchanged` and emit nothing.
//! - Compare-and-write goes through `update_best_if_better`, so a concurrent
//!   writer that already installed an equal or better value turns this
//!   evaluation into `Unchanged` instead of overwriting it.
//! - A first-insert that loses to a concurrent first-insert falls back to
//!   the conditional update.

use crate::db::now_epoch_ms;
use crate::ids::IdGenerator;
use crate::model::attempt::{AttemptId, UserId};
use crate::model::best_record::{BestCategory, BestRecord, BestRecordId};
use crate::notify::rank_update::RankUpdateEmitter;
use crate::repo::best_record_repo::BestRecordRepository;
use crate::repo::{RepoError, RepoResult};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Value proposed for one (user, dimension, category).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestCandidate {
    pub user_id: UserId,
    pub dimension: u32,
    pub category: BestCategory,
    pub value: i64,
    pub attempt_ids: Vec<AttemptId>,
}

/// Result of evaluating one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationOutcome {
    /// First record for the tuple; `break_count` is 1.
    Created { record_id: BestRecordId },
    /// Existing record replaced in place.
    Improved {
        record_id: BestRecordId,
        previous_value: i64,
        break_count: u32,
    },
    /// Candidate was not strictly better.
    Unchanged,
}

impl EvaluationOutcome {
    pub fn is_mutation(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Best-record evaluation failure.
#[derive(Debug)]
pub enum EvaluationError {
    Persistence(RepoError),
}

impl Display for EvaluationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Persistence(err) => write!(f, "best record persistence failed: {err}"),
        }
    }
}

impl Error for EvaluationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Persistence(err) => Some(err),
        }
    }
}

impl From<RepoError> for EvaluationError {
    fn from(value: RepoError) -> Self {
        Self::Persistence(value)
    }
}

/// Evaluator shared by all four record categories.
pub struct BestRecordEvaluator<B: BestRecordRepository> {
    repo: B,
    emitter: RankUpdateEmitter,
    ids: Arc<dyn IdGenerator>,
}

impl<B: BestRecordRepository> BestRecordEvaluator<B> {
    pub fn new(repo: B, emitter: RankUpdateEmitter, ids: Arc<dyn IdGenerator>) -> Self {
        Self { repo, emitter, ids }
    }

    /// Applies one candidate and notifies rank consumers on mutation.
    pub fn evaluate(&self, candidate: &BestCandidate) -> Result<EvaluationOutcome, EvaluationError> {
        let current =
            self.repo
                .find_best(candidate.user_id, candidate.dimension, candidate.category)?;

        let outcome = match current {
            None => self.create(candidate)?,
            Some(existing) => self.improve(&existing, candidate)?,
        };

        match outcome {
            EvaluationOutcome::Created { record_id } => info!(
                "event=best_record_create module=service status=ok record_id={} user_id={} dimension={} category={} value={}",
                record_id, candidate.user_id, candidate.dimension, candidate.category, candidate.value
            ),
            EvaluationOutcome::Improved {
                record_id,
                previous_value,
                break_count,
            } => info!(
                "event=best_record_improve module=service status=ok record_id={} user_id={} dimension={} category={} previous={} value={} break_count={}",
                record_id,
                candidate.user_id,
                candidate.dimension,
                candidate.category,
                previous_value,
                candidate.value,
                break_count
            ),
            EvaluationOutcome::Unchanged => debug!(
                "event=best_record_evaluate module=service status=unchanged user_id={} dimension={} category={} value={}",
                candidate.user_id, candidate.dimension, candidate.category, candidate.value
            ),
        }

        if outcome.is_mutation() {
            self.emitter.emit(candidate.dimension, candidate.category);
        }
        Ok(outcome)
    }

    /// Loads the current best for one tuple.
    pub fn current_best(
        &self,
        user_id: UserId,
        dimension: u32,
        category: BestCategory,
    ) -> RepoResult<Option<BestRecord>> {
        self.repo.find_best(user_id, dimension, category)
    }

    /// Lists all category bests for one user and dimension.
    pub fn user_bests(&self, user_id: UserId, dimension: u32) -> RepoResult<Vec<BestRecord>> {
        self.repo.list_user_bests(user_id, dimension)
    }

    fn create(&self, candidate: &BestCandidate) -> Result<EvaluationOutcome, EvaluationError> {
        let now = now_epoch_ms();
        let record = BestRecord {
            id: self.ids.next_id(),
            user_id: candidate.user_id,
            dimension: candidate.dimension,
            category: candidate.category,
            attempt_ids: candidate.attempt_ids.clone(),
            value: candidate.value,
            break_count: 1,
            created_at: now,
            updated_at: now,
        };

        match self.repo.insert_best(&record) {
            Ok(()) => Ok(EvaluationOutcome::Created {
                record_id: record.id,
            }),
            Err(RepoError::Conflict(_)) => {
                debug!(
                    "event=best_record_create module=service status=conflict user_id={} dimension={} category={}",
                    candidate.user_id, candidate.dimension, candidate.category
                );
                let existing = self
                    .repo
                    .find_best(candidate.user_id, candidate.dimension, candidate.category)?
                    .ok_or_else(|| {
                        RepoError::NotFound(format!(
                            "best record user={} dimension={} category={} after conflict",
                            candidate.user_id, candidate.dimension, candidate.category
                        ))
                    })?;
                self.improve(&existing, candidate)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn improve(
        &self,
        existing: &BestRecord,
        candidate: &BestCandidate,
    ) -> Result<EvaluationOutcome, EvaluationError> {
        if candidate.value >= existing.value {
            return Ok(EvaluationOutcome::Unchanged);
        }

        let updated = self.repo.update_best_if_better(
            existing.id,
            candidate.value,
            &candidate.attempt_ids,
            now_epoch_ms(),
        )?;

        match updated {
            Some(break_count) => Ok(EvaluationOutcome::Improved {
                record_id: existing.id,
                previous_value: existing.value,
                break_count,
            }),
            None => {
                debug!(
                    "event=best_record_improve module=service status=race_lost record_id={} value={}",
                    existing.id, candidate.value
                );
                Ok(EvaluationOutcome::Unchanged)
            }
        }
    }
}
