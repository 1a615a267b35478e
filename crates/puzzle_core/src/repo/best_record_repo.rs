//! Best-record repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Store one current best per (user, dimension, category).
//! - Provide the conditional write that makes improvements race-free.
//!
//! # Invariants
//! - `UNIQUE(user_id, dimension, category)` backs the one-row rule;
//!   a duplicate insert surfaces as `RepoError::Conflict`.
//! - `update_best_if_better` only writes when the stored value is strictly
//!   greater than the candidate, and bumps `break_count` in the same
//!   statement.

use crate::model::attempt::{AttemptId, UserId};
use crate::model::best_record::{
    join_attempt_ids, split_attempt_ids, BestCategory, BestRecord, BestRecordId,
};
use crate::repo::{ensure_tables, is_unique_violation, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const BEST_RECORD_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    dimension,
    category,
    attempt_ids,
    value,
    break_count,
    created_at,
    updated_at
FROM best_records";

/// Repository interface for personal-best storage.
pub trait BestRecordRepository {
    /// Loads the current best for one tuple, if any.
    fn find_best(
        &self,
        user_id: UserId,
        dimension: u32,
        category: BestCategory,
    ) -> RepoResult<Option<BestRecord>>;
    /// Inserts a first best record for its tuple.
    fn insert_best(&self, record: &BestRecord) -> RepoResult<()>;
    /// Replaces value and contributors in place when `value` is strictly
    /// lower than the stored one.
    ///
    /// Returns the new break count, or `None` when no row qualified.
    fn update_best_if_better(
        &self,
        id: BestRecordId,
        value: i64,
        attempt_ids: &[AttemptId],
        updated_at: i64,
    ) -> RepoResult<Option<u32>>;
    /// Lists every category's best for one user and dimension.
    fn list_user_bests(&self, user_id: UserId, dimension: u32) -> RepoResult<Vec<BestRecord>>;
}

/// SQLite-backed best-record repository.
pub struct SqliteBestRecordRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBestRecordRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["best_records"])?;
        Ok(Self { conn })
    }
}

impl BestRecordRepository for SqliteBestRecordRepository<'_> {
    fn find_best(
        &self,
        user_id: UserId,
        dimension: u32,
        category: BestCategory,
    ) -> RepoResult<Option<BestRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{BEST_RECORD_SELECT_SQL}
             WHERE user_id = ?1
               AND dimension = ?2
               AND category = ?3
             LIMIT 1;"
        ))?;
        let mut rows = stmt.query(params![user_id, dimension, category.as_str()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_best_record_row(row)?));
        }
        Ok(None)
    }

    fn insert_best(&self, record: &BestRecord) -> RepoResult<()> {
        validate_best_record(record)?;

        let result = self.conn.execute(
            "INSERT INTO best_records (
                id,
                user_id,
                dimension,
                category,
                attempt_ids,
                value,
                break_count,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                record.id.to_string(),
                record.user_id,
                record.dimension,
                record.category.as_str(),
                join_attempt_ids(&record.attempt_ids),
                record.value,
                record.break_count,
                record.created_at,
                record.updated_at,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Err(RepoError::Conflict(format!(
                "best record user={} dimension={} category={}",
                record.user_id, record.dimension, record.category
            ))),
            Err(err) => Err(err.into()),
        }
    }

    fn update_best_if_better(
        &self,
        id: BestRecordId,
        value: i64,
        attempt_ids: &[AttemptId],
        updated_at: i64,
    ) -> RepoResult<Option<u32>> {
        if value <= 0 || attempt_ids.is_empty() {
            return Err(RepoError::InvalidData(
                "best record update requires a positive value and contributors".to_string(),
            ));
        }

        let break_count = self
            .conn
            .query_row(
                "UPDATE best_records
                 SET
                    value = ?2,
                    attempt_ids = ?3,
                    break_count = break_count + 1,
                    updated_at = ?4
                 WHERE id = ?1
                   AND value > ?2
                 RETURNING break_count;",
                params![
                    id.to_string(),
                    value,
                    join_attempt_ids(attempt_ids),
                    updated_at
                ],
                |row| row.get::<_, u32>(0),
            )
            .optional()?;

        Ok(break_count)
    }

    fn list_user_bests(&self, user_id: UserId, dimension: u32) -> RepoResult<Vec<BestRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{BEST_RECORD_SELECT_SQL}
             WHERE user_id = ?1
               AND dimension = ?2;"
        ))?;
        let mut rows = stmt.query(params![user_id, dimension])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_best_record_row(row)?);
        }
        records.sort_by_key(|record| record.category);
        Ok(records)
    }
}

fn validate_best_record(record: &BestRecord) -> RepoResult<()> {
    let problem = if record.id.is_nil() {
        Some("id must not be nil")
    } else if record.user_id == 0 {
        Some("user_id is required")
    } else if record.dimension == 0 {
        Some("dimension is required")
    } else if record.value <= 0 {
        Some("value must be positive")
    } else if record.break_count == 0 {
        Some("break_count starts at 1")
    } else if record.attempt_ids.is_empty() {
        Some("attempt_ids must not be empty")
    } else {
        None
    };

    match problem {
        Some(message) => Err(RepoError::InvalidData(format!(
            "best record rejected: {message}"
        ))),
        None => Ok(()),
    }
}

fn parse_best_record_row(row: &Row<'_>) -> RepoResult<BestRecord> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "best_records.id")?;

    let category_text: String = row.get("category")?;
    let category = BestCategory::parse(&category_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid category `{category_text}` in best_records.category"
        ))
    })?;

    let ids_text: String = row.get("attempt_ids")?;
    let attempt_ids = split_attempt_ids(&ids_text).map_err(|fragment| {
        RepoError::InvalidData(format!(
            "invalid attempt id `{fragment}` in best_records.attempt_ids"
        ))
    })?;

    Ok(BestRecord {
        id,
        user_id: row.get("user_id")?,
        dimension: row.get("dimension")?,
        category,
        attempt_ids,
        value: row.get("value")?,
        break_count: row.get("break_count")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
