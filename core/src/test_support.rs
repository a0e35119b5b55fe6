//! In-memory stand-in for the database-access backend, used by unit tests.
//!
//! Understands just enough SQL to emulate the big-table workload: multi-row
//! inserts into the value column and point lookups by key or value.

use std::cell::Cell;
use std::collections::BTreeSet;
use std::rc::Rc;

use anyhow::{Result, anyhow, bail};

use crate::access::{DatabaseAccess, ExecOutcome, SqlValue};
use crate::cancel::CancelToken;

#[derive(Default)]
pub struct MockDatabase {
    values: Vec<i64>,
    indexes: BTreeSet<(String, String)>,
    statements: Vec<(String, Vec<SqlValue>)>,
    inserts: usize,
    round_trips: usize,
    invalidations: usize,
    fail_on_insert: Option<usize>,
    fail_invalidation: bool,
    cancel_after_inserts: Option<(usize, CancelToken)>,
    cancel_after_statements: Option<(usize, CancelToken)>,
    closes: Rc<Cell<usize>>,
}

impl MockDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the value column; keys are `1..=len`.
    pub fn with_rows(mut self, values: Vec<i64>) -> Self {
        self.values = values;
        self
    }

    /// Fail the insert with this 0-based sequence number.
    pub fn fail_on_insert(mut self, insert: usize) -> Self {
        self.fail_on_insert = Some(insert);
        self
    }

    pub fn fail_invalidation(mut self) -> Self {
        self.fail_invalidation = true;
        self
    }

    /// Trip `token` once `n` inserts have committed.
    pub fn cancel_after_inserts(mut self, n: usize, token: CancelToken) -> Self {
        self.cancel_after_inserts = Some((n, token));
        self
    }

    /// Trip `token` once `n` round trips of any kind have completed.
    pub fn cancel_after_statements(mut self, n: usize, token: CancelToken) -> Self {
        self.cancel_after_statements = Some((n, token));
        self
    }

    pub fn close_counter(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.closes)
    }

    pub fn values(&self) -> Vec<i64> {
        self.values.clone()
    }

    pub fn inserts(&self) -> usize {
        self.inserts
    }

    pub fn statements(&self) -> &[(String, Vec<SqlValue>)] {
        &self.statements
    }

    pub fn invalidations(&self) -> usize {
        self.invalidations
    }

    pub fn has_index(&self, table: &str, column: &str) -> bool {
        self.indexes
            .contains(&(table.to_string(), column.to_string()))
    }

    pub fn index_count(&self) -> usize {
        self.indexes.len()
    }

    fn finish_round_trip(&mut self) {
        self.round_trips += 1;
        if let Some((n, token)) = &self.cancel_after_statements {
            if self.round_trips >= *n {
                token.cancel();
            }
        }
    }

    fn insert(&mut self, params: &[SqlValue]) -> Result<ExecOutcome> {
        let seq = self.inserts;
        self.inserts += 1;
        if self.fail_on_insert == Some(seq) {
            bail!("injected failure on insert {seq}");
        }
        for p in params {
            match p {
                SqlValue::Integer(v) => self.values.push(*v),
                other => bail!("unsupported value {other:?}"),
            }
        }
        if let Some((n, token)) = &self.cancel_after_inserts {
            if self.inserts >= *n {
                token.cancel();
            }
        }
        Ok(ExecOutcome::Affected(params.len() as u64))
    }

    fn select(&self, statement: &str, params: &[SqlValue]) -> Result<ExecOutcome> {
        let Some(SqlValue::Integer(wanted)) = params.first() else {
            bail!("lookup without an integer parameter");
        };
        let rows = if statement.contains("WHERE id_pk") {
            u64::from(*wanted >= 1 && *wanted as usize <= self.values.len())
        } else if statement.contains("WHERE number") {
            self.values.iter().filter(|v| **v == *wanted).count() as u64
        } else {
            bail!("unsupported lookup: {statement}");
        };
        Ok(ExecOutcome::Rows(rows))
    }
}

impl DatabaseAccess for MockDatabase {
    fn execute(&mut self, statement: &str, params: &[SqlValue]) -> Result<ExecOutcome> {
        self.statements
            .push((statement.to_string(), params.to_vec()));
        let outcome = if statement.starts_with("INSERT INTO") {
            self.insert(params)
        } else if statement.starts_with("SELECT") {
            self.select(statement, params)
        } else {
            Err(anyhow!("syntax error at or near \"{statement}\""))
        };
        self.finish_round_trip();
        outcome
    }

    fn invalidate_session_cache(&mut self) -> Result<()> {
        self.invalidations += 1;
        if self.fail_invalidation {
            bail!("DISCARD not supported");
        }
        Ok(())
    }

    fn create_index(&mut self, table: &str, column: &str) -> Result<()> {
        self.indexes.insert((table.to_string(), column.to_string()));
        self.finish_round_trip();
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closes.set(self.closes.get() + 1);
        Ok(())
    }
}
