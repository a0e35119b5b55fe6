//! Integration tests: load an in-memory SQLite table and run the probes.

use loadbench::sqlite::SqliteAccess;
use loadbench_core::{
    reference_probes, BenchmarkRunner, BulkLoader, CancelToken, DatabaseAccess, Harness,
    HarnessError, LoadSpec, Probe, Sequential, Session, TargetTable,
};

fn big() -> TargetTable {
    TargetTable::reference("big").unwrap()
}

fn prepared_session() -> Session<SqliteAccess> {
    let mut db = SqliteAccess::open_in_memory().expect("open");
    db.prepare_table(&big()).expect("prepare_table");
    Session::open(db)
}

fn sequential_loader() -> BulkLoader {
    BulkLoader::new(big(), Box::new(Sequential))
}

#[test]
fn load_populates_table_with_monotonic_keys() {
    let mut session = prepared_session();
    let spec = LoadSpec::new(10_000, 1_000).unwrap();

    let report = sequential_loader().load(&mut session, &spec).unwrap();
    assert_eq!(report.batches_completed, 10);
    assert_eq!(report.rows_loaded, 10_000);

    let db = session.backend();
    assert_eq!(db.row_count(&big()).unwrap(), 10_000);

    // Keys are assigned in batch order, so key and value agree row for row.
    let mismatched: i64 = db
        .connection()
        .unwrap()
        .query_row("SELECT COUNT(*) FROM big WHERE id_pk != number", [], |r| {
            r.get(0)
        })
        .unwrap();
    assert_eq!(mismatched, 0);
}

#[test]
fn partial_final_batch_is_loaded() {
    let mut session = prepared_session();
    let spec = LoadSpec::new(2_500, 1_000).unwrap();
    let report = sequential_loader().load(&mut session, &spec).unwrap();
    assert_eq!(report.batches_completed, 3);
    assert_eq!(session.backend().row_count(&big()).unwrap(), 2_500);
}

#[test]
fn reference_probes_against_loaded_table() {
    let mut session = prepared_session();
    let spec = LoadSpec::new(100_000, 20_000).unwrap();
    let harness = Harness::new(sequential_loader(), BenchmarkRunner::new());

    let report = harness
        .run(&mut session, &spec, &reference_probes(&big()))
        .unwrap();

    let names: Vec<&str> = report
        .probes
        .iter()
        .map(|p| p.probe_name.as_str())
        .collect();
    assert_eq!(
        names,
        [
            "lookup_by_primary_key",
            "lookup_unindexed_value",
            "create_idx_big_number",
            "lookup_indexed_value",
        ]
    );
    assert_eq!(report.probes[0].rows_returned, 1);
    assert_eq!(report.probes[1].rows_returned, 1);
    assert_eq!(report.probes[2].rows_returned, 0);
    assert_eq!(report.probes[3].rows_returned, 1);
    assert!(session.backend().has_index("big", "number").unwrap());
}

#[test]
fn failing_batch_leaves_earlier_batches_committed() {
    let mut db = SqliteAccess::open_in_memory().unwrap();
    db.connection()
        .unwrap()
        .execute_batch(
            "CREATE TABLE big (
                 id_pk INTEGER PRIMARY KEY AUTOINCREMENT,
                 number INTEGER CHECK (number < 450)
             );",
        )
        .unwrap();
    let mut session = Session::open(db);
    let spec = LoadSpec::new(1_000, 100).unwrap();

    let failed = sequential_loader().load(&mut session, &spec).unwrap_err();
    match &failed.error {
        HarnessError::BatchLoadFailed { start_index, .. } => assert_eq!(*start_index, 400),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(failed.partial.batches_completed, 4);
    assert_eq!(session.backend().row_count(&big()).unwrap(), 400);
}

#[test]
fn cancel_after_batch_37_of_100() {
    let cancel = CancelToken::new();
    let trip = cancel.clone();
    let batch_size = 10u64;
    // Trips while the last row of batch 37 is generated; batch 37 is still
    // submitted and the check before batch 38 stops the load.
    let generator = move |i: u64| {
        if i == 37 * batch_size - 1 {
            trip.cancel();
        }
        i as i64 + 1
    };
    let loader = BulkLoader::new(big(), Box::new(generator)).with_cancel(cancel);
    let mut session = prepared_session();
    let spec = LoadSpec::new(100 * batch_size, batch_size).unwrap();

    let report = loader.load(&mut session, &spec).unwrap();
    assert!(report.cancelled);
    assert_eq!(report.batches_completed, 37);
    assert_eq!(
        session.backend().row_count(&big()).unwrap(),
        37 * batch_size
    );
}

#[test]
fn expired_timeout_runs_nothing() {
    let cancel = CancelToken::with_timeout(std::time::Duration::ZERO);
    let harness = Harness::new(
        sequential_loader().with_cancel(cancel.clone()),
        BenchmarkRunner::new().with_cancel(cancel),
    );
    let mut session = prepared_session();
    let spec = LoadSpec::new(1_000, 100).unwrap();

    let report = harness
        .run(&mut session, &spec, &reference_probes(&big()))
        .unwrap();
    assert!(report.load.cancelled);
    assert_eq!(report.load.batches_completed, 0);
    assert!(report.probes.is_empty());
    assert_eq!(session.backend().row_count(&big()).unwrap(), 0);
}

#[test]
fn malformed_probe_reports_partial_results() {
    let mut session = prepared_session();
    sequential_loader()
        .load(&mut session, &LoadSpec::new(100, 10).unwrap())
        .unwrap();

    let probes = vec![
        Probe::point_lookup("pk", "big", "id_pk", 5),
        Probe::query("typo", "SELEC * FROM big", vec![]),
        Probe::point_lookup("after", "big", "id_pk", 6),
    ];
    let failed = BenchmarkRunner::new()
        .run(&mut session, &probes)
        .unwrap_err();
    assert_eq!(failed.partial.results.len(), 1);
    assert!(matches!(
        failed.error,
        HarnessError::ProbeFailed { ref name, .. } if name == "typo"
    ));
}

#[test]
fn create_index_twice_through_the_trait() {
    let mut session = prepared_session();
    let db = session.backend();
    db.create_index("big", "number").unwrap();
    db.create_index("big", "number").unwrap();
    let indexes: i64 = db
        .connection()
        .unwrap()
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND tbl_name = 'big'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(indexes, 1);
}

#[test]
fn report_serializes_to_json() {
    let mut session = prepared_session();
    let harness = Harness::new(sequential_loader(), BenchmarkRunner::new());
    let report = harness
        .run(
            &mut session,
            &LoadSpec::new(500, 100).unwrap(),
            &reference_probes(&big()),
        )
        .unwrap();

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["load"]["batches_completed"], 5);
    assert_eq!(json["probes"].as_array().unwrap().len(), 4);
    assert_eq!(json["probes"][2]["rows_returned"], 0);
}

#[test]
fn session_close_releases_connection() {
    let session = prepared_session();
    session.close().unwrap();
}
