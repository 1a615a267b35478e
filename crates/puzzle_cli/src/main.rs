//! CLI probe for the record engine.
//!
//! # Responsibility
//! - Verify `puzzle_core` linkage (`ping`, version).
//! - Ingest one attempt into the configured database and print the receipt:
//!   `puzzle_cli ingest <user> <dimension> <duration_ms> <steps> <seed> <tag> <scramble> <solution>`
//!   where `tag` 0 means practice.

use puzzle_core::db::open_db;
use puzzle_core::{
    init_logging, AttemptCategory, CategoryOutcome, CoreConfig, IngestRequest, IngestService,
    QueuePublisher, RankUpdateEmitter, SqliteAttemptRepository, SqliteBestRecordRepository,
    SqliteScrambleStatusRepository, TimeOrderedIdGenerator,
};
use std::error::Error;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;

const USAGE: &str =
    "usage: puzzle_cli ingest <user> <dimension> <duration_ms> <steps> <seed> <tag> <scramble> <solution>";

fn main() -> ExitCode {
    println!("puzzle_core ping={}", puzzle_core::ping());
    println!("puzzle_core version={}", puzzle_core::core_version());

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<(), Box<dyn Error>> {
    let request = parse_ingest(args)?;
    let config = CoreConfig::from_env()?;
    if let Some(log_dir) = config.log_dir.as_ref() {
        init_logging(config.log_level, log_dir)?;
    }

    let conn = open_db(&config.db_path)?;
    let attempts = SqliteAttemptRepository::try_new(&conn)?;
    let bests = SqliteBestRecordRepository::try_new(&conn)?;
    let scrambles = SqliteScrambleStatusRepository::try_new(&conn)?;

    // Nothing consumes rank updates in the probe; they are printed instead.
    let (publisher, rank_updates) = QueuePublisher::channel();
    let service = IngestService::new(
        attempts,
        bests,
        scrambles,
        RankUpdateEmitter::new(Arc::new(publisher)),
        Arc::new(TimeOrderedIdGenerator),
    );

    let receipt = service.ingest(&request)?;
    log::info!(
        "event=cli_ingest module=cli status=ok attempt_id={} categories={}",
        receipt.attempt_id,
        receipt.categories.len()
    );
    println!("attempt_id={}", receipt.attempt_id);
    for report in &receipt.categories {
        match &report.result {
            Ok(CategoryOutcome::Skipped {
                available,
                required,
            }) => println!("{} skipped ({available}/{required})", report.category),
            Ok(CategoryOutcome::Evaluated(outcome)) => {
                println!("{} {:?}", report.category, outcome)
            }
            Err(err) => println!("{} failed: {err}", report.category),
        }
    }
    for message in rank_updates.try_iter() {
        println!(
            "rank_update topic={} payload={}",
            message.topic,
            String::from_utf8_lossy(&message.payload)
        );
    }
    for best in service.user_bests(request.user_id, request.dimension)? {
        println!(
            "best {} value={} break_count={}",
            best.category, best.value, best.break_count
        );
    }
    Ok(())
}

fn parse_ingest(args: &[String]) -> Result<IngestRequest, String> {
    match args {
        [command, user, dimension, duration, steps, seed, tag, scramble, solution]
            if command == "ingest" =>
        {
            let tag: u32 = parse_arg(tag, "tag")?;
            Ok(IngestRequest {
                user_id: parse_arg(user, "user")?,
                dimension: parse_arg(dimension, "dimension")?,
                category: if tag == 0 {
                    AttemptCategory::Practice
                } else {
                    AttemptCategory::Competitive(tag)
                },
                duration_ms: parse_arg(duration, "duration_ms")?,
                step_count: parse_arg(steps, "steps")?,
                scramble: scramble.clone(),
                solution: solution.clone(),
                seed_index: parse_arg(seed, "seed")?,
            })
        }
        _ => Err(USAGE.to_string()),
    }
}

fn parse_arg<T: FromStr>(value: &str, name: &str) -> Result<T, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("invalid {name} `{value}`\n{USAGE}"))
}
