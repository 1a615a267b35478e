//! Attempt ingestion use-case.
//!
//! # Responsibility
//! - Validate and persist one attempt.
//! - For competitive attempts, complete the pending scramble assignment and
//!   run the four best-record evaluations.
//!
//! # Invariants
//! - The attempt is never rolled back because a downstream step failed.
//! - Category evaluations are independent: one failing category is logged
//!   and reported, the remaining categories still run.
//! - Averages only use confirmed competitive attempts with the same
//!   category tag, and only once a full window exists.

use crate::db::now_epoch_ms;
use crate::ids::IdGenerator;
use crate::model::attempt::{
    validate_fields, Attempt, AttemptCategory, AttemptFields, AttemptId, AttemptStatus,
    AttemptValidationError, UserId,
};
use crate::model::best_record::{BestCategory, BestRecord};
use crate::notify::rank_update::RankUpdateEmitter;
use crate::repo::attempt_repo::{AttemptRepository, AttemptWindowQuery};
use crate::repo::best_record_repo::BestRecordRepository;
use crate::repo::scramble_status_repo::ScrambleStatusRepository;
use crate::repo::{RepoError, RepoResult};
use crate::service::best_record_service::{
    BestCandidate, BestRecordEvaluator, EvaluationError, EvaluationOutcome,
};
use crate::stats::trimmed_mean::average_of;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Caller input for one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestRequest {
    pub user_id: UserId,
    pub dimension: u32,
    pub category: AttemptCategory,
    pub duration_ms: i64,
    pub step_count: i64,
    pub scramble: String,
    pub solution: String,
    pub seed_index: i64,
}

/// Ingestion failure. Only attempt validation and attempt persistence fail
/// the call.
#[derive(Debug)]
pub enum IngestError {
    Validation(AttemptValidationError),
    Persistence(RepoError),
}

impl Display for IngestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid attempt: {err}"),
            Self::Persistence(err) => write!(f, "failed to store attempt: {err}"),
        }
    }
}

impl Error for IngestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persistence(err) => Some(err),
        }
    }
}

impl From<AttemptValidationError> for IngestError {
    fn from(value: AttemptValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for IngestError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Persistence(other),
        }
    }
}

/// What happened to one best-record category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryOutcome {
    /// Not enough confirmed attempts for the window yet.
    Skipped { available: usize, required: usize },
    Evaluated(EvaluationOutcome),
}

#[derive(Debug)]
pub struct CategoryReport {
    pub category: BestCategory,
    pub result: Result<CategoryOutcome, EvaluationError>,
}

/// Successful ingestion summary.
#[derive(Debug)]
pub struct IngestReceipt {
    pub attempt_id: AttemptId,
    /// Empty for practice attempts.
    pub categories: Vec<CategoryReport>,
}

impl IngestReceipt {
    /// Outcome reported for `category`, if it was evaluated without error.
    pub fn outcome(&self, category: BestCategory) -> Option<CategoryOutcome> {
        self.categories
            .iter()
            .find(|report| report.category == category)
            .and_then(|report| report.result.as_ref().ok().copied())
    }
}

/// Attempt ingestion orchestrator.
pub struct IngestService<A, B, S>
where
    A: AttemptRepository,
    B: BestRecordRepository,
    S: ScrambleStatusRepository,
{
    attempts: A,
    scrambles: S,
    evaluator: BestRecordEvaluator<B>,
    ids: Arc<dyn IdGenerator>,
}

impl<A, B, S> IngestService<A, B, S>
where
    A: AttemptRepository,
    B: BestRecordRepository,
    S: ScrambleStatusRepository,
{
    pub fn new(
        attempts: A,
        best_records: B,
        scrambles: S,
        emitter: RankUpdateEmitter,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            attempts,
            scrambles,
            evaluator: BestRecordEvaluator::new(best_records, emitter, Arc::clone(&ids)),
            ids,
        }
    }

    /// Validates, persists and post-processes one attempt.
    ///
    /// # Errors
    /// - `IngestError::Validation` names the first missing field.
    /// - `IngestError::Persistence` when the attempt itself cannot be stored.
    pub fn ingest(&self, request: &IngestRequest) -> Result<IngestReceipt, IngestError> {
        validate_fields(&AttemptFields {
            user_id: request.user_id,
            dimension: request.dimension,
            category: request.category,
            duration_ms: request.duration_ms,
            step_count: request.step_count,
            scramble: &request.scramble,
            solution: &request.solution,
            seed_index: request.seed_index,
        })
        .map_err(|err| {
            warn!(
                "event=attempt_ingest module=service status=rejected user_id={} field={}",
                request.user_id,
                err.field()
            );
            err
        })?;

        let status = if request.category.is_competitive() {
            AttemptStatus::Confirmed
        } else {
            AttemptStatus::Created
        };
        let attempt = Attempt {
            id: self.ids.next_id(),
            user_id: request.user_id,
            dimension: request.dimension,
            category: request.category,
            duration_ms: request.duration_ms,
            step_count: request.step_count,
            scramble: request.scramble.clone(),
            solution: request.solution.clone(),
            seed_index: request.seed_index,
            status,
            created_at: now_epoch_ms(),
        };

        let attempt_id = self.attempts.insert_attempt(&attempt).map_err(|err| {
            error!(
                "event=attempt_ingest module=service status=error user_id={} dimension={} error={}",
                attempt.user_id, attempt.dimension, err
            );
            IngestError::from(err)
        })?;
        info!(
            "event=attempt_ingest module=service status=ok attempt_id={} user_id={} dimension={} competitive={}",
            attempt_id,
            attempt.user_id,
            attempt.dimension,
            attempt.category.is_competitive()
        );

        let mut categories = Vec::new();
        if attempt.category.is_competitive() {
            self.complete_pending_scramble(&attempt);
            for category in BestCategory::ALL {
                let result = self.evaluate_category(&attempt, category);
                if let Err(err) = &result {
                    error!(
                        "event=best_record_evaluate module=service status=error attempt_id={} category={} error={}",
                        attempt_id, category, err
                    );
                }
                categories.push(CategoryReport { category, result });
            }
        }

        Ok(IngestReceipt {
            attempt_id,
            categories,
        })
    }

    /// Attempts referenced by a best record, in stored order.
    pub fn contributing_attempts(&self, record: &BestRecord) -> RepoResult<Vec<Attempt>> {
        self.attempts.get_attempts_by_ids(&record.attempt_ids)
    }

    /// All category bests for one user and dimension.
    pub fn user_bests(&self, user_id: UserId, dimension: u32) -> RepoResult<Vec<BestRecord>> {
        self.evaluator.user_bests(user_id, dimension)
    }

    fn complete_pending_scramble(&self, attempt: &Attempt) {
        let pending = match self.scrambles.find_pending(attempt.user_id, attempt.dimension) {
            Ok(Some(pending)) => pending,
            Ok(None) => return,
            Err(err) => {
                warn!(
                    "event=scramble_complete module=service status=error user_id={} dimension={} error={}",
                    attempt.user_id, attempt.dimension, err
                );
                return;
            }
        };

        match self.scrambles.mark_completed(pending.id) {
            Ok(()) => info!(
                "event=scramble_complete module=service status=ok status_id={} scramble_id={}",
                pending.id, pending.scramble_id
            ),
            Err(err) => warn!(
                "event=scramble_complete module=service status=error status_id={} error={}",
                pending.id, err
            ),
        }
    }

    fn evaluate_category(
        &self,
        attempt: &Attempt,
        category: BestCategory,
    ) -> Result<CategoryOutcome, EvaluationError> {
        let (value, attempt_ids) = match category {
            BestCategory::Single => (attempt.duration_ms, vec![attempt.id]),
            BestCategory::Step => (attempt.step_count, vec![attempt.id]),
            BestCategory::Average5 | BestCategory::Average12 => {
                let required = category.window_size().unwrap_or_default();
                let window = self.attempts.query_window(&AttemptWindowQuery {
                    user_id: attempt.user_id,
                    dimension: attempt.dimension,
                    category: attempt.category,
                    status: AttemptStatus::Confirmed,
                    limit: u32::try_from(required).unwrap_or(u32::MAX),
                })?;
                match average_of(required, &window.attempts) {
                    Some(average) => (average.value, average.attempt_ids),
                    None => {
                        return Ok(CategoryOutcome::Skipped {
                            available: window.attempts.len(),
                            required,
                        })
                    }
                }
            }
        };

        let outcome = self.evaluator.evaluate(&BestCandidate {
            user_id: attempt.user_id,
            dimension: attempt.dimension,
            category,
            value,
            attempt_ids,
        })?;
        Ok(CategoryOutcome::Evaluated(outcome))
    }
}
