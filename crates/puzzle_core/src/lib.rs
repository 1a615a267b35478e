//! Personal-best record tracking for timed puzzle solves.
//!
//! Ingests attempts, maintains single / average-of-5 / average-of-12 / step
//! bests per user and puzzle dimension, and signals rank recomputation.

pub mod config;
pub mod db;
pub mod ids;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod service;
pub mod stats;

pub use config::{ConfigError, CoreConfig};
pub use ids::{IdGenerator, TimeOrderedIdGenerator};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::attempt::{
    Attempt, AttemptCategory, AttemptId, AttemptStatus, AttemptValidationError, UserId,
};
pub use model::best_record::{BestCategory, BestRecord, BestRecordId};
pub use model::scramble_status::{ScrambleStatus, ScrambleStatusCode};
pub use notify::rank_update::{
    PublishError, QueuePublisher, QueuedMessage, RankUpdate, RankUpdateEmitter,
    RankUpdateMessage, RankUpdatePublisher, RANK_UPDATE_TOPIC,
};
pub use repo::attempt_repo::{
    AttemptRepository, AttemptWindow, AttemptWindowQuery, SqliteAttemptRepository,
};
pub use repo::best_record_repo::{BestRecordRepository, SqliteBestRecordRepository};
pub use repo::scramble_status_repo::{ScrambleStatusRepository, SqliteScrambleStatusRepository};
pub use repo::{RepoError, RepoResult};
pub use service::best_record_service::{
    BestCandidate, BestRecordEvaluator, EvaluationError, EvaluationOutcome,
};
pub use service::ingest_service::{
    CategoryOutcome, CategoryReport, IngestError, IngestReceipt, IngestRequest, IngestService,
};
pub use stats::trimmed_mean::{average_of, trimmed_mean, WindowAverage};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
