//! SQLite implementation of [`DatabaseAccess`].
//!
//! Statements go through rusqlite's prepared-statement cache, which is the
//! session-level state that [`DatabaseAccess::invalidate_session_cache`]
//! discards. SQLite has no equivalent of PostgreSQL's `DISCARD ALL`, so
//! invalidation also asks the connection to release its page cache
//! (`PRAGMA shrink_memory`). Neither guarantees a truly cold read.

use anyhow::{bail, Context, Result};
use loadbench_core::access::{index_name, is_identifier};
use loadbench_core::{DatabaseAccess, ExecOutcome, PlaceholderStyle, SqlValue, TargetTable};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

/// Largest number of bound parameters a single statement may carry
/// (`SQLITE_MAX_VARIABLE_NUMBER` in the bundled build).
pub const MAX_BATCH_SIZE: u64 = 32_766;

/// Path that selects a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

pub struct SqliteAccess {
    conn: Option<Connection>,
}

/// Configure a connection for bulk loading.
pub fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = OFF;
         PRAGMA cache_size = -131072;
         PRAGMA temp_store = MEMORY;",
    )?;
    Ok(())
}

fn to_sqlite(value: &SqlValue) -> Value {
    match value {
        SqlValue::Integer(v) => Value::Integer(*v),
        SqlValue::Text(s) => Value::Text(s.clone()),
        SqlValue::Null => Value::Null,
    }
}

impl SqliteAccess {
    /// Open (or create) the database at `path`; [`IN_MEMORY`] opens a
    /// private in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = if path == IN_MEMORY {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .with_context(|| format!("Failed to open SQLite database {path}"))?;
        configure_connection(&conn).context("Failed to configure SQLite connection")?;
        Ok(Self { conn: Some(conn) })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(IN_MEMORY)
    }

    /// The live connection, for inspection outside the harness.
    pub fn connection(&self) -> Result<&Connection> {
        match &self.conn {
            Some(conn) => Ok(conn),
            None => bail!("SQLite connection already closed"),
        }
    }

    /// Create `table` if needed and empty it: rows, key sequence and any
    /// index left on the value column by an earlier run.
    pub fn prepare_table(&mut self, table: &TargetTable) -> Result<()> {
        let name = table.name();
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {name} (
                 {key} INTEGER PRIMARY KEY AUTOINCREMENT,
                 {value} INTEGER
             );
             DROP INDEX IF EXISTS {index};
             DELETE FROM {name};
             DELETE FROM sqlite_sequence WHERE name = '{name}';",
            key = table.key_column(),
            value = table.value_column(),
            index = index_name(name, table.value_column()),
        );
        self.connection()?
            .execute_batch(&sql)
            .with_context(|| format!("Failed to prepare table {name}"))?;
        log::info!("Table {name} created and cleared");
        Ok(())
    }

    pub fn row_count(&self, table: &TargetTable) -> Result<u64> {
        let count: i64 = self.connection()?.query_row(
            &format!("SELECT COUNT(*) FROM {}", table.name()),
            [],
            |r| r.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn has_index(&self, table: &str, column: &str) -> Result<bool> {
        let found: i64 = self.connection()?.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = ?1",
            [index_name(table, column)],
            |r| r.get(0),
        )?;
        Ok(found > 0)
    }
}

impl DatabaseAccess for SqliteAccess {
    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::QuestionNumbered
    }

    fn execute(&mut self, statement: &str, params: &[SqlValue]) -> Result<ExecOutcome> {
        let conn = self.connection()?;
        let mut stmt = conn
            .prepare_cached(statement)
            .context("Failed to prepare statement")?;
        let bound = params_from_iter(params.iter().map(to_sqlite));

        if stmt.column_count() > 0 {
            let mut rows = stmt.query(bound)?;
            let mut returned = 0;
            while rows.next()?.is_some() {
                returned += 1;
            }
            Ok(ExecOutcome::Rows(returned))
        } else {
            let changed = stmt.execute(bound)?;
            Ok(ExecOutcome::Affected(changed as u64))
        }
    }

    fn invalidate_session_cache(&mut self) -> Result<()> {
        let conn = self.connection()?;
        conn.flush_prepared_statement_cache();
        conn.execute_batch("PRAGMA shrink_memory;")?;
        Ok(())
    }

    fn create_index(&mut self, table: &str, column: &str) -> Result<()> {
        if !is_identifier(table) || !is_identifier(column) {
            bail!("Refusing to index {table}({column}): not a plain identifier");
        }
        let sql = format!(
            "CREATE INDEX IF NOT EXISTS {} ON {table}({column})",
            index_name(table, column)
        );
        self.connection()?.execute(&sql, [])?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| e)?;
        }
        Ok(())
    }
}
