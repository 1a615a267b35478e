//! Personal-best record model.
//!
//! # Responsibility
//! - Define the four tracked record categories.
//! - Encode/decode the ordered contributing-attempt list.
//!
//! # Invariants
//! - Lower `value` is always better; ties never replace a record.
//! - `break_count` starts at 1 and only grows.
//! - `attempt_ids` holds one id for single/step and the full window, in
//!   retrieval order, for averaged categories.

use crate::model::attempt::{AttemptId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of one best-record row.
pub type BestRecordId = Uuid;

/// Record category tracked per (user, dimension).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BestCategory {
    /// Fastest single attempt.
    Single,
    /// Best trimmed mean of the 5 most recent attempts.
    #[serde(rename = "avg5")]
    Average5,
    /// Best trimmed mean of the 12 most recent attempts.
    #[serde(rename = "avg12")]
    Average12,
    /// Fewest moves in a single attempt.
    Step,
}

impl BestCategory {
    /// Evaluation order used by the ingestion pipeline.
    pub const ALL: [BestCategory; 4] = [
        BestCategory::Single,
        BestCategory::Average5,
        BestCategory::Average12,
        BestCategory::Step,
    ];

    /// Number of recent attempts averaged, for windowed categories.
    pub fn window_size(self) -> Option<usize> {
        match self {
            Self::Average5 => Some(5),
            Self::Average12 => Some(12),
            Self::Single | Self::Step => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Average5 => "avg5",
            Self::Average12 => "avg12",
            Self::Step => "step",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "single" => Some(Self::Single),
            "avg5" => Some(Self::Average5),
            "avg12" => Some(Self::Average12),
            "step" => Some(Self::Step),
            _ => None,
        }
    }
}

impl std::fmt::Display for BestCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current personal best for one (user, dimension, category).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestRecord {
    pub id: BestRecordId,
    pub user_id: UserId,
    pub dimension: u32,
    pub category: BestCategory,
    pub attempt_ids: Vec<AttemptId>,
    /// Duration in ms, or step count for `BestCategory::Step`.
    pub value: i64,
    pub break_count: u32,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds of the last improvement.
    pub updated_at: i64,
}

/// Joins attempt ids into the persisted comma-separated form.
pub fn join_attempt_ids(ids: &[AttemptId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Splits the persisted comma-separated form back into ordered ids.
///
/// Returns the offending fragment when one entry is not a UUID.
pub fn split_attempt_ids(value: &str) -> Result<Vec<AttemptId>, String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| Uuid::parse_str(part).map_err(|_| part.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{join_attempt_ids, split_attempt_ids, BestCategory};
    use uuid::Uuid;

    #[test]
    fn attempt_id_list_preserves_order() {
        let ids = vec![Uuid::now_v7(), Uuid::new_v4(), Uuid::now_v7()];
        let joined = join_attempt_ids(&ids);
        assert_eq!(joined.matches(',').count(), 2);
        assert_eq!(split_attempt_ids(&joined).unwrap(), ids);
    }

    #[test]
    fn split_rejects_garbage_fragment() {
        let err = split_attempt_ids("not-a-uuid").unwrap_err();
        assert_eq!(err, "not-a-uuid");
    }

    #[test]
    fn only_average_categories_have_windows() {
        assert_eq!(BestCategory::Average5.window_size(), Some(5));
        assert_eq!(BestCategory::Average12.window_size(), Some(12));
        assert_eq!(BestCategory::Single.window_size(), None);
        assert_eq!(BestCategory::Step.window_size(), None);
    }

    #[test]
    fn category_serializes_with_storage_names() {
        for category in BestCategory::ALL {
            let json = serde_json::to_value(category).unwrap();
            assert_eq!(json, category.as_str());
            assert_eq!(BestCategory::parse(category.as_str()), Some(category));
        }
    }
}
