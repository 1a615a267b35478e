//! Scramble assignment status repository.
//!
//! # Responsibility
//! - Record which scramble a user was assigned for a dimension.
//! - Flip pending assignments to completed once a competitive attempt lands.
//!
//! # Invariants
//! - `mark_completed` only transitions rows that are still pending.

use crate::db::now_epoch_ms;
use crate::model::attempt::UserId;
use crate::model::scramble_status::{ScrambleStatus, ScrambleStatusCode, ScrambleStatusId};
use crate::repo::{ensure_tables, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

pub trait ScrambleStatusRepository {
    /// Inserts a pending assignment and returns it.
    fn assign_scramble(
        &self,
        user_id: UserId,
        dimension: u32,
        scramble_id: i64,
    ) -> RepoResult<ScrambleStatus>;
    /// Newest pending assignment for the user and dimension.
    fn find_pending(&self, user_id: UserId, dimension: u32) -> RepoResult<Option<ScrambleStatus>>;
    /// Marks one pending assignment completed.
    fn mark_completed(&self, id: ScrambleStatusId) -> RepoResult<()>;
}

pub struct SqliteScrambleStatusRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteScrambleStatusRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["scrambled_user_status"])?;
        Ok(Self { conn })
    }
}

impl ScrambleStatusRepository for SqliteScrambleStatusRepository<'_> {
    fn assign_scramble(
        &self,
        user_id: UserId,
        dimension: u32,
        scramble_id: i64,
    ) -> RepoResult<ScrambleStatus> {
        if user_id == 0 || dimension == 0 || scramble_id == 0 {
            return Err(RepoError::InvalidData(
                "scramble assignment requires user_id, dimension and scramble_id".to_string(),
            ));
        }

        let now = now_epoch_ms();
        let status = ScrambleStatus {
            id: Uuid::now_v7(),
            user_id,
            dimension,
            scramble_id,
            status: ScrambleStatusCode::Pending,
            created_at: now,
            updated_at: now,
        };

        self.conn.execute(
            "INSERT INTO scrambled_user_status (
                id,
                user_id,
                dimension,
                scramble_id,
                status,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                status.id.to_string(),
                status.user_id,
                status.dimension,
                status.scramble_id,
                status.status.to_db(),
                status.created_at,
                status.updated_at,
            ],
        )?;

        Ok(status)
    }

    fn find_pending(&self, user_id: UserId, dimension: u32) -> RepoResult<Option<ScrambleStatus>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, dimension, scramble_id, status, created_at, updated_at
             FROM scrambled_user_status
             WHERE user_id = ?1
               AND dimension = ?2
               AND status = ?3
             ORDER BY created_at DESC, rowid DESC
             LIMIT 1;",
        )?;
        let mut rows = stmt.query(params![
            user_id,
            dimension,
            ScrambleStatusCode::Pending.to_db()
        ])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_status_row(row)?));
        }
        Ok(None)
    }

    fn mark_completed(&self, id: ScrambleStatusId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE scrambled_user_status
             SET status = ?2, updated_at = ?3
             WHERE id = ?1
               AND status = ?4;",
            params![
                id.to_string(),
                ScrambleStatusCode::Completed.to_db(),
                now_epoch_ms(),
                ScrambleStatusCode::Pending.to_db(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(format!("pending scramble status {id}")));
        }
        Ok(())
    }
}

fn parse_status_row(row: &Row<'_>) -> RepoResult<ScrambleStatus> {
    let id_text: String = row.get("id")?;
    let code: i64 = row.get("status")?;
    let status = ScrambleStatusCode::from_db(code).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid status `{code}` in scrambled_user_status.status"
        ))
    })?;

    Ok(ScrambleStatus {
        id: parse_uuid(&id_text, "scrambled_user_status.id")?,
        user_id: row.get("user_id")?,
        dimension: row.get("dimension")?,
        scramble_id: row.get("scramble_id")?,
        status,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
