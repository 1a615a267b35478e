//! Attempt repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist attempts and serve windowed "most recent N" queries.
//! - Resolve attempt ids referenced by best records.
//!
//! # Invariants
//! - `insert_attempt` validates before writing.
//! - Window ordering is newest-first: `created_at DESC, seq DESC`, where
//!   `seq` is the insertion sequence, so equal timestamps stay deterministic.

use crate::model::attempt::{Attempt, AttemptCategory, AttemptId, AttemptStatus, UserId};
use crate::repo::{ensure_tables, parse_uuid, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const ATTEMPT_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    dimension,
    category,
    duration_ms,
    step_count,
    scramble,
    solution,
    seed_index,
    status,
    created_at
FROM attempts";

/// Filter for a newest-first attempt window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptWindowQuery {
    pub user_id: UserId,
    pub dimension: u32,
    pub category: AttemptCategory,
    pub status: AttemptStatus,
    pub limit: u32,
}

/// Result of a window query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptWindow {
    /// Number of attempts matching the filter, ignoring `limit`.
    pub total: u64,
    /// At most `limit` attempts, newest first.
    pub attempts: Vec<Attempt>,
}

/// Repository interface for attempt storage.
pub trait AttemptRepository {
    /// Inserts one validated attempt and returns its id.
    fn insert_attempt(&self, attempt: &Attempt) -> RepoResult<AttemptId>;
    /// Loads one attempt by id.
    fn get_attempt(&self, id: AttemptId) -> RepoResult<Option<Attempt>>;
    /// Returns the newest attempts matching the window filter.
    fn query_window(&self, query: &AttemptWindowQuery) -> RepoResult<AttemptWindow>;
    /// Loads attempts by id, in the order given, skipping unknown ids.
    fn get_attempts_by_ids(&self, ids: &[AttemptId]) -> RepoResult<Vec<Attempt>>;
}

/// SQLite-backed attempt repository.
pub struct SqliteAttemptRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAttemptRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["attempts"])?;
        Ok(Self { conn })
    }
}

impl AttemptRepository for SqliteAttemptRepository<'_> {
    fn insert_attempt(&self, attempt: &Attempt) -> RepoResult<AttemptId> {
        attempt.validate()?;

        self.conn.execute(
            "INSERT INTO attempts (
                id,
                user_id,
                dimension,
                category,
                duration_ms,
                step_count,
                scramble,
                solution,
                seed_index,
                status,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
            params![
                attempt.id.to_string(),
                attempt.user_id,
                attempt.dimension,
                attempt.category.to_db(),
                attempt.duration_ms,
                attempt.step_count,
                attempt.scramble.as_str(),
                attempt.solution.as_str(),
                attempt.seed_index,
                attempt.status.as_db(),
                attempt.created_at,
            ],
        )?;

        Ok(attempt.id)
    }

    fn get_attempt(&self, id: AttemptId) -> RepoResult<Option<Attempt>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ATTEMPT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_attempt_row(row)?));
        }
        Ok(None)
    }

    fn query_window(&self, query: &AttemptWindowQuery) -> RepoResult<AttemptWindow> {
        let filter = "WHERE user_id = ?1
               AND dimension = ?2
               AND category = ?3
               AND status = ?4";
        let category = query.category.to_db();
        let status = query.status.as_db();

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM attempts {filter};"),
            params![query.user_id, query.dimension, category, status],
            |row| row.get(0),
        )?;

        let mut stmt = self.conn.prepare(&format!(
            "{ATTEMPT_SELECT_SQL} {filter}
             ORDER BY created_at DESC, seq DESC
             LIMIT ?5;"
        ))?;
        let mut rows = stmt.query(params![
            query.user_id,
            query.dimension,
            category,
            status,
            i64::from(query.limit),
        ])?;
        let mut attempts = Vec::new();
        while let Some(row) = rows.next()? {
            attempts.push(parse_attempt_row(row)?);
        }

        Ok(AttemptWindow {
            total: u64::try_from(total).unwrap_or(0),
            attempts,
        })
    }

    fn get_attempts_by_ids(&self, ids: &[AttemptId]) -> RepoResult<Vec<Attempt>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let mut stmt = self.conn.prepare(&format!(
            "{ATTEMPT_SELECT_SQL} WHERE id IN ({placeholders});"
        ))?;
        let bind_values = ids.iter().map(|id| Value::Text(id.to_string()));
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut loaded = Vec::with_capacity(ids.len());
        while let Some(row) = rows.next()? {
            loaded.push(parse_attempt_row(row)?);
        }

        // Restore caller order; the window order is meaningful.
        let mut ordered = Vec::with_capacity(loaded.len());
        for id in ids {
            if let Some(position) = loaded.iter().position(|attempt| attempt.id == *id) {
                ordered.push(loaded.swap_remove(position));
            }
        }
        Ok(ordered)
    }
}

fn parse_attempt_row(row: &Row<'_>) -> RepoResult<Attempt> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "attempts.id")?;

    let status_text: String = row.get("status")?;
    let status = AttemptStatus::parse_db(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid attempt status `{status_text}` in attempts.status"
        ))
    })?;

    let attempt = Attempt {
        id,
        user_id: row.get("user_id")?,
        dimension: row.get("dimension")?,
        category: AttemptCategory::from_db(row.get("category")?),
        duration_ms: row.get("duration_ms")?,
        step_count: row.get("step_count")?,
        scramble: row.get("scramble")?,
        solution: row.get("solution")?,
        seed_index: row.get("seed_index")?,
        status,
        created_at: row.get("created_at")?,
    };
    attempt.validate()?;
    Ok(attempt)
}
