use puzzle_core::db::open_db;
use puzzle_core::{
    AttemptCategory, BestCategory, BestRecordRepository, IngestRequest, IngestService,
    QueuePublisher, RankUpdateEmitter, SqliteAttemptRepository, SqliteBestRecordRepository,
    SqliteScrambleStatusRepository, TimeOrderedIdGenerator,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Barrier};
use std::thread;

fn ingest_from_threads(path: &Path, durations: &[i64]) {
    let barrier = Arc::new(Barrier::new(durations.len()));
    let handles: Vec<_> = durations
        .iter()
        .copied()
        .map(|duration_ms| {
            let barrier = Arc::clone(&barrier);
            let path: PathBuf = path.to_path_buf();
            thread::spawn(move || {
                let conn = open_db(&path).unwrap();
                let (publisher, _receiver) = QueuePublisher::channel();
                let service = IngestService::new(
                    SqliteAttemptRepository::try_new(&conn).unwrap(),
                    SqliteBestRecordRepository::try_new(&conn).unwrap(),
                    SqliteScrambleStatusRepository::try_new(&conn).unwrap(),
                    RankUpdateEmitter::new(Arc::new(publisher)),
                    Arc::new(TimeOrderedIdGenerator),
                );
                barrier.wait();
                service
                    .ingest(&IngestRequest {
                        user_id: 5,
                        dimension: 4,
                        category: AttemptCategory::Competitive(1),
                        duration_ms,
                        step_count: duration_ms,
                        scramble: "F R U".to_string(),
                        solution: "U' R' F'".to_string(),
                        seed_index: 3,
                    })
                    .unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

fn assert_single_best(path: &Path, expected: i64, writers: usize) {
    let conn = open_db(path).unwrap();
    let rows: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM best_records WHERE user_id = 5 AND dimension = 4 AND category = 'single';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(rows, 1);

    let repo = SqliteBestRecordRepository::try_new(&conn).unwrap();
    let single = repo.find_best(5, 4, BestCategory::Single).unwrap().unwrap();
    assert_eq!(single.value, expected);
    assert!(single.break_count >= 1);
    assert!(single.break_count as usize <= writers);

    let attempts: i64 = conn
        .query_row("SELECT COUNT(*) FROM attempts;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(attempts as usize, writers);
}

#[test]
fn two_concurrent_writers_keep_the_faster_single() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.db");
    drop(open_db(&path).unwrap());

    ingest_from_threads(&path, &[100, 90]);

    assert_single_best(&path, 90, 2);
}

#[test]
fn many_concurrent_writers_converge_on_minimum() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.db");
    drop(open_db(&path).unwrap());

    let durations = [640, 310, 870, 120, 455, 230, 999, 121];
    ingest_from_threads(&path, &durations);

    assert_single_best(&path, 120, durations.len());

    let conn = open_db(&path).unwrap();
    let step = SqliteBestRecordRepository::try_new(&conn)
        .unwrap()
        .find_best(5, 4, BestCategory::Step)
        .unwrap()
        .unwrap();
    assert_eq!(step.value, 120);
}
