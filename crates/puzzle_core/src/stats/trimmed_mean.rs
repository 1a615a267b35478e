//! Trimmed mean over a fixed window of attempt durations.
//!
//! # Invariants
//! - Exactly one minimum and one maximum are discarded.
//! - Integer division truncates toward zero; no rounding.
//! - Contributing ids are the full window in retrieval order, not only the
//!   surviving middle values.

use crate::model::attempt::{Attempt, AttemptId};

/// Trimmed-mean candidate for an averaged best-record category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowAverage {
    pub value: i64,
    /// Every attempt in the window, newest first.
    pub attempt_ids: Vec<AttemptId>,
}

/// Mean of `values` after dropping one minimum and one maximum.
///
/// Returns `None` for fewer than three values.
pub fn trimmed_mean(values: &[i64]) -> Option<i64> {
    if values.len() < 3 {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let middle = &sorted[1..sorted.len() - 1];
    let sum: i128 = middle.iter().map(|value| i128::from(*value)).sum();
    let count = i128::try_from(middle.len()).ok()?;
    i64::try_from(sum / count).ok()
}

/// Averages a window of attempts when exactly `window` of them are given.
///
/// Fewer attempts means the average is not yet computable, never a partial
/// estimate.
pub fn average_of(window: usize, attempts: &[Attempt]) -> Option<WindowAverage> {
    if window < 3 || attempts.len() != window {
        return None;
    }

    let durations: Vec<i64> = attempts.iter().map(|attempt| attempt.duration_ms).collect();
    let value = trimmed_mean(&durations)?;
    Some(WindowAverage {
        value,
        attempt_ids: attempts.iter().map(|attempt| attempt.id).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::{average_of, trimmed_mean};
    use crate::model::attempt::{Attempt, AttemptCategory, AttemptStatus};
    use uuid::Uuid;

    fn attempt(duration_ms: i64) -> Attempt {
        Attempt {
            id: Uuid::now_v7(),
            user_id: 1,
            dimension: 3,
            category: AttemptCategory::Competitive(1),
            duration_ms,
            step_count: 40,
            scramble: "F2 L' D".to_string(),
            solution: "D' L F2".to_string(),
            seed_index: 5,
            status: AttemptStatus::Confirmed,
            created_at: 0,
        }
    }

    #[test]
    fn mean_of_five_drops_extremes() {
        assert_eq!(trimmed_mean(&[10, 20, 30, 40, 50]), Some(30));
        assert_eq!(trimmed_mean(&[50, 10, 40, 20, 30]), Some(30));
    }

    #[test]
    fn mean_of_twelve_drops_single_min_and_max() {
        // min 5, max 95, remaining ten sum to 500
        let values = [5, 95, 50, 50, 50, 50, 50, 40, 60, 45, 55, 50];
        assert_eq!(trimmed_mean(&values), Some(50));
    }

    #[test]
    fn mean_truncates_toward_zero() {
        // middle = 10 + 10 + 11 = 31, 31 / 3 = 10
        assert_eq!(trimmed_mean(&[1, 10, 10, 11, 99]), Some(10));
    }

    #[test]
    fn duplicate_extremes_only_drop_one_each() {
        assert_eq!(trimmed_mean(&[10, 10, 10, 40, 40]), Some(20));
    }

    #[test]
    fn too_few_values_is_not_computable() {
        assert_eq!(trimmed_mean(&[]), None);
        assert_eq!(trimmed_mean(&[7, 9]), None);
    }

    #[test]
    fn average_keeps_every_window_id_in_retrieval_order() {
        let window: Vec<_> = [500, 100, 300, 200, 400].into_iter().map(attempt).collect();
        let average = average_of(5, &window).unwrap();
        assert_eq!(average.value, 300);
        // All five ids, including the discarded 100 and 500.
        let expected: Vec<_> = window.iter().map(|attempt| attempt.id).collect();
        assert_eq!(average.attempt_ids, expected);
    }

    #[test]
    fn average_requires_a_full_window() {
        let window: Vec<_> = [1, 2, 3, 4].into_iter().map(attempt).collect();
        assert_eq!(average_of(5, &window), None);
    }
}
