//! Identity generation for persisted rows.

use uuid::Uuid;

/// Source of globally unique, roughly time-ordered identifiers.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> Uuid;
}

/// UUIDv7 generator: millisecond timestamp prefix plus random tail.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeOrderedIdGenerator;

impl IdGenerator for TimeOrderedIdGenerator {
    fn next_id(&self) -> Uuid {
        Uuid::now_v7()
    }
}

#[cfg(test)]
mod tests {
    use super::{IdGenerator, TimeOrderedIdGenerator};
    use std::collections::HashSet;

    #[test]
    fn generated_ids_are_unique_and_v7() {
        let generator = TimeOrderedIdGenerator;
        let ids: HashSet<_> = (0..256).map(|_| generator.next_id()).collect();
        assert_eq!(ids.len(), 256);
        assert!(ids.iter().all(|id| id.get_version_num() == 7));
    }

    #[test]
    fn later_ids_do_not_sort_before_earlier_timestamps() {
        let generator = TimeOrderedIdGenerator;
        let first = generator.next_id();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = generator.next_id();
        assert!(first < second);
    }
}
