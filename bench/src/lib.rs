//! SQLite backend and driver for the bulk-load benchmark.
//!
//! Loads a `big(id_pk, number)` table in batched multi-row inserts, then
//! compares point lookup latency by primary key, by an unindexed column, and
//! by the same column after indexing it.
//!
//! Run the benchmark: `cargo run --release -p loadbench`
//! Run benches: `cargo bench -p loadbench`
//! Run tests: `cargo test`

pub mod config;
pub mod report;
pub mod sqlite;
