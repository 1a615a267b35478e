//! Attempt domain model.
//!
//! # Responsibility
//! - Define the record of one timed solve.
//! - Validate required fields before an attempt reaches storage.
//!
//! # Invariants
//! - `duration_ms`, `step_count`, `scramble`, `solution` and `seed_index`
//!   are always present and non-zero/non-empty.
//! - Practice attempts never carry `AttemptStatus::Confirmed`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one attempt. Generated at insertion time.
pub type AttemptId = Uuid;

/// Identity of the user owning attempts and records.
///
/// Users live in an external service; zero is never a valid user.
pub type UserId = i64;

/// Practice vs. competitive classification of an attempt.
///
/// Competitive attempts carry the tag of the scramble session they belong
/// to. Storage encodes practice as `0` and competitive as the tag itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptCategory {
    Practice,
    Competitive(u32),
}

impl AttemptCategory {
    pub fn is_competitive(self) -> bool {
        matches!(self, Self::Competitive(_))
    }

    pub(crate) fn to_db(self) -> u32 {
        match self {
            Self::Practice => 0,
            Self::Competitive(tag) => tag,
        }
    }

    pub(crate) fn from_db(value: u32) -> Self {
        match value {
            0 => Self::Practice,
            tag => Self::Competitive(tag),
        }
    }
}

/// Lifecycle status of a persisted attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    /// Recorded but not verified; the default for practice.
    Created,
    /// Counted toward personal-best windows.
    Confirmed,
}

impl AttemptStatus {
    pub(crate) fn as_db(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Confirmed => "confirmed",
        }
    }

    pub(crate) fn parse_db(value: &str) -> Option<Self> {
        match value {
            "created" => Some(Self::Created),
            "confirmed" => Some(Self::Confirmed),
            _ => None,
        }
    }
}

/// Field-level validation failure for attempt input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptValidationError {
    MissingUserId,
    MissingDimension,
    MissingDuration,
    MissingStepCount,
    MissingScramble,
    MissingSolution,
    MissingSeedIndex,
    /// Competitive attempts must name a non-zero session tag.
    InvalidCategoryTag,
    NilId,
}

impl AttemptValidationError {
    /// Name of the offending input field.
    pub fn field(self) -> &'static str {
        match self {
            Self::MissingUserId => "user_id",
            Self::MissingDimension => "dimension",
            Self::MissingDuration => "duration_ms",
            Self::MissingStepCount => "step_count",
            Self::MissingScramble => "scramble",
            Self::MissingSolution => "solution",
            Self::MissingSeedIndex => "seed_index",
            Self::InvalidCategoryTag => "category",
            Self::NilId => "id",
        }
    }
}

impl Display for AttemptValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCategoryTag => {
                write!(f, "competitive attempts require a non-zero category tag")
            }
            Self::NilId => write!(f, "attempt id must not be nil"),
            other => write!(f, "`{}` is required and must be non-zero", other.field()),
        }
    }
}

impl Error for AttemptValidationError {}

/// One timed solve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: AttemptId,
    pub user_id: UserId,
    /// Puzzle order, e.g. `3` for a 3x3x3 cube.
    pub dimension: u32,
    pub category: AttemptCategory,
    pub duration_ms: i64,
    pub step_count: i64,
    pub scramble: String,
    pub solution: String,
    /// Seed used to regenerate the scramble deterministically.
    pub seed_index: i64,
    pub status: AttemptStatus,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl Attempt {
    /// Validates every required field, reporting the first missing one.
    pub fn validate(&self) -> Result<(), AttemptValidationError> {
        if self.id.is_nil() {
            return Err(AttemptValidationError::NilId);
        }
        validate_fields(&AttemptFields {
            user_id: self.user_id,
            dimension: self.dimension,
            category: self.category,
            duration_ms: self.duration_ms,
            step_count: self.step_count,
            scramble: &self.scramble,
            solution: &self.solution,
            seed_index: self.seed_index,
        })
    }

    /// Whether this attempt feeds personal-best windows.
    pub fn counts_toward_records(&self) -> bool {
        self.category.is_competitive() && self.status == AttemptStatus::Confirmed
    }
}

/// Borrowed view over the attempt fields that input validation inspects.
pub(crate) struct AttemptFields<'a> {
    pub user_id: UserId,
    pub dimension: u32,
    pub category: AttemptCategory,
    pub duration_ms: i64,
    pub step_count: i64,
    pub scramble: &'a str,
    pub solution: &'a str,
    pub seed_index: i64,
}

pub(crate) fn validate_fields(fields: &AttemptFields<'_>) -> Result<(), AttemptValidationError> {
    if fields.user_id == 0 {
        return Err(AttemptValidationError::MissingUserId);
    }
    if fields.dimension == 0 {
        return Err(AttemptValidationError::MissingDimension);
    }
    if fields.duration_ms <= 0 {
        return Err(AttemptValidationError::MissingDuration);
    }
    if fields.step_count <= 0 {
        return Err(AttemptValidationError::MissingStepCount);
    }
    if fields.scramble.trim().is_empty() {
        return Err(AttemptValidationError::MissingScramble);
    }
    if fields.solution.trim().is_empty() {
        return Err(AttemptValidationError::MissingSolution);
    }
    if fields.seed_index == 0 {
        return Err(AttemptValidationError::MissingSeedIndex);
    }
    if fields.category == AttemptCategory::Competitive(0) {
        return Err(AttemptValidationError::InvalidCategoryTag);
    }
    Ok(())
}
