use puzzle_core::db::migrations::{apply_migrations, latest_version};
use puzzle_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

const RECORD_TABLES: [&str; 3] = ["attempts", "best_records", "scrambled_user_status"];

fn user_version(conn: &Connection) -> u32 {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .unwrap()
}

fn tables(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name;")
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

#[test]
fn fresh_memory_store_is_fully_migrated() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(user_version(&conn), latest_version());
    let present = tables(&conn);
    for table in RECORD_TABLES {
        assert!(present.iter().any(|name| name == table), "missing {table}");
    }
}

#[test]
fn reopening_file_store_keeps_rows_and_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.db");

    let conn = open_db(&path).unwrap();
    conn.execute(
        "INSERT INTO scrambled_user_status (id, user_id, dimension, scramble_id, status, created_at, updated_at)
         VALUES ('s-1', 9, 3, 77, 1, 0, 0);",
        [],
    )
    .unwrap();
    drop(conn);

    let reopened = open_db(&path).unwrap();
    assert_eq!(user_version(&reopened), latest_version());
    let rows: i64 = reopened
        .query_row("SELECT COUNT(*) FROM scrambled_user_status;", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn applying_migrations_twice_is_a_no_op() {
    let mut conn = open_db_in_memory().unwrap();
    let before = tables(&conn);

    apply_migrations(&mut conn).unwrap();

    assert_eq!(tables(&conn), before);
    assert_eq!(user_version(&conn), latest_version());
}

#[test]
fn file_store_runs_in_wal_mode() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_db(dir.path().join("wal.db")).unwrap();

    let mode: String = conn
        .pragma_query_value(None, "journal_mode", |row| row.get(0))
        .unwrap();
    assert!(mode.eq_ignore_ascii_case("wal"));
}

#[test]
fn store_written_by_newer_build_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ahead.db");
    Connection::open(&path)
        .unwrap()
        .pragma_update(None, "user_version", latest_version() + 5)
        .unwrap();

    let err = open_db(&path).unwrap_err();
    assert!(
        matches!(
            err,
            DbError::UnsupportedSchemaVersion { db_version, latest_supported }
                if db_version == latest_version() + 5 && latest_supported == latest_version()
        ),
        "unexpected error: {err}"
    );
}

#[test]
fn best_record_tuple_is_unique() {
    let conn = open_db_in_memory().unwrap();
    let insert = "INSERT INTO best_records
            (id, user_id, dimension, category, attempt_ids, value, break_count, created_at, updated_at)
         VALUES (?1, 7, 3, 'single', 'a', 100, 1, 0, 0);";

    conn.execute(insert, ["first"]).unwrap();
    let err = conn.execute(insert, ["second"]).unwrap_err();
    assert!(err.to_string().contains("UNIQUE"));
}

#[test]
fn best_record_rejects_zero_break_count() {
    let conn = open_db_in_memory().unwrap();
    let result = conn.execute(
        "INSERT INTO best_records
            (id, user_id, dimension, category, attempt_ids, value, break_count, created_at, updated_at)
         VALUES ('b-1', 7, 3, 'step', 'a', 40, 0, 0, 0);",
        [],
    );
    assert!(result.is_err());
}
