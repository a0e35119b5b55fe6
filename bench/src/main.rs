//! Benchmark driver: loads the table, times the reference probes and prints
//! the report.
//!
//! Settings come from `LOADBENCH_*` environment variables (see `config.rs`),
//! optionally via a `.env` file. Ctrl-C stops the run after the statement in
//! flight; whatever completed is still reported.
//!
//! Usage:
//!   cargo run --release -p loadbench
//!   LOADBENCH_DB_PATH=big.db LOADBENCH_TOTAL_ROWS=500000 cargo run --release -p loadbench

use std::fs;
use std::process;
use std::sync::mpsc;
use std::thread;

use anyhow::{bail, Context, Result};
use loadbench::config::BenchConfig;
use loadbench::report::print_report;
use loadbench::sqlite::{SqliteAccess, MAX_BATCH_SIZE};
use loadbench_core::{
    reference_probes, BenchmarkRunner, BulkLoader, CancelToken, Harness, LoadProgress, Session,
};

const EXIT_FAILED: i32 = 1;
const EXIT_CONFIG: i32 = 2;
const EXIT_CANCELLED: i32 = 130;

fn run(config: &BenchConfig) -> Result<i32> {
    let spec = config.load_spec()?;
    let table = config.target_table()?;
    if spec.batch_size() > MAX_BATCH_SIZE {
        bail!(
            "batch size {} exceeds SQLite's limit of {MAX_BATCH_SIZE} parameters per statement",
            spec.batch_size()
        );
    }

    let cancel = match config.timeout {
        Some(timeout) => CancelToken::with_timeout(timeout),
        None => CancelToken::new(),
    };
    let signal_token = cancel.clone();
    ctrlc::set_handler(move || {
        log::info!("Got signal to terminate. Stopping after the current statement...");
        signal_token.cancel();
    })
    .context("Failed to install Ctrl-C handler")?;

    let mut backend = SqliteAccess::open(&config.db_path)?;
    backend.prepare_table(&table)?;
    let mut session = Session::open(backend);

    let total_batches = spec.batch_count();
    let (progress_tx, progress_rx) = mpsc::channel::<LoadProgress>();
    let progress_thread = thread::Builder::new()
        .name("load-progress".into())
        .spawn(move || {
            for p in progress_rx {
                log::info!(
                    "Inserted batch {}/{}: rows {} to {}",
                    p.batch_number,
                    total_batches,
                    p.start_index + 1,
                    p.start_index + p.rows_in_batch
                );
            }
        })
        .context("Failed to spawn progress thread")?;

    let harness = Harness::new(
        BulkLoader::new(table.clone(), config.row_generator())
            .with_progress(progress_tx)
            .with_cancel(cancel.clone()),
        BenchmarkRunner::new().with_cancel(cancel),
    );
    let probes = reference_probes(&table);
    let outcome = harness.run(&mut session, &spec, &probes);

    // Dropping the loader closes the progress channel.
    drop(harness);
    if progress_thread.join().is_err() {
        log::warn!("Progress thread panicked");
    }

    match session.backend().row_count(&table) {
        Ok(rows) => log::info!("Table {} holds {rows} rows", table.name()),
        Err(e) => log::warn!("Could not count rows in {}: {e}", table.name()),
    }
    session.close().context("Failed to close database session")?;

    let (report, code) = match outcome {
        Ok(report) if report.load.cancelled || report.probes_cancelled => {
            (report, EXIT_CANCELLED)
        }
        Ok(report) => (report, 0),
        Err(failed) => {
            log::error!("Benchmark failed: {}", failed.error);
            (failed.partial, EXIT_FAILED)
        }
    };

    print_report(&report);

    if let Some(path) = &config.report_json {
        let json = report.to_json().context("Failed to serialize report")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        log::info!("Report written to {}", path.display());
    }

    Ok(code)
}

fn main() {
    // A missing .env file is fine; variables may come from the environment.
    dotenvy::dotenv().ok();

    let config = BenchConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Invalid configuration: {e:#}");
        process::exit(EXIT_CONFIG);
    });

    loadbench_core::initialize_logger(config.log_level, config.log_file.as_deref())
        .unwrap_or_else(|e| {
            eprintln!("Failed to initialize logger: {e}. Exiting.");
            process::exit(EXIT_FAILED);
        });

    log::info!(
        "Starting load benchmark: {} rows, batches of {}, database {}",
        config.total_rows,
        config.batch_size,
        config.db_path
    );

    match run(&config) {
        Ok(code) => process::exit(code),
        Err(e) => {
            log::error!("{e:#}");
            process::exit(EXIT_FAILED);
        }
    }
}
