//! Domain model for solve attempts and personal-best records.
//!
//! # Responsibility
//! - Define canonical data structures used by record-tracking logic.
//! - Own field validation so every write path enforces the same rules.
//!
//! # Invariants
//! - Attempts are immutable once persisted, apart from status.
//! - At most one `BestRecord` exists per (user, dimension, category).

pub mod attempt;
pub mod best_record;
pub mod scramble_status;
