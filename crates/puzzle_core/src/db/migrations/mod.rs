//! Ordered schema scripts for the record store.
//!
//! The applied version lives in `PRAGMA user_version`. Versions are dense
//! and increasing; a script is never edited once released, only followed by
//! a new one.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::{Connection, Transaction, TransactionBehavior};

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "attempts",
        sql: include_str!("0001_attempts.sql"),
    },
    Migration {
        version: 2,
        name: "best_records",
        sql: include_str!("0002_best_records.sql"),
    },
    Migration {
        version: 3,
        name: "scrambled_user_status",
        sql: include_str!("0003_scrambled_user_status.sql"),
    },
];

/// Schema version this build writes.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Brings `conn` up to [`latest_version`] in a single transaction.
///
/// # Errors
/// - `DbError::UnsupportedSchemaVersion` if the database is ahead of this
///   build.
/// - `DbError::MigrationFailed` naming the first script that failed.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let latest = latest_version();
    if check_version(conn, latest)? == latest {
        debug!("event=db_migrate module=db status=up_to_date version={latest}");
        return Ok(());
    }

    // IMMEDIATE takes the write lock up front, so two connections racing on
    // a fresh file serialize here and the loser sees the winner's version.
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let from = check_version(&tx, latest)?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > from) {
        run_one(&tx, migration)?;
    }
    tx.commit()?;
    Ok(())
}

fn run_one(tx: &Transaction<'_>, migration: &Migration) -> DbResult<()> {
    tx.execute_batch(migration.sql)
        .and_then(|()| tx.pragma_update(None, "user_version", migration.version))
        .map_err(|source| DbError::MigrationFailed {
            version: migration.version,
            name: migration.name,
            source,
        })?;
    info!(
        "event=db_migrate module=db status=ok version={} name={}",
        migration.version, migration.name
    );
    Ok(())
}

fn check_version(conn: &Connection, latest: u32) -> DbResult<u32> {
    let version: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: version,
            latest_supported: latest,
        });
    }
    Ok(version)
}
