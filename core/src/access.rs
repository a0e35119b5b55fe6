//! The database-access capability consumed by the loader and the runner.
//!
//! The harness never speaks a SQL dialect or wire protocol itself. Statements
//! are written with a neutral `?` marker per parameter and rendered into the
//! backend's dialect through [`PlaceholderStyle`] before they are handed to
//! [`DatabaseAccess::execute`].

use anyhow::Result;
use serde::Serialize;

use crate::error::HarnessError;

/// A value bound to a statement parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Integer(i64),
    Text(String),
    Null,
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

/// What a single statement round trip produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecOutcome {
    /// DML or DDL: number of rows changed.
    Affected(u64),
    /// A query: number of rows returned.
    Rows(u64),
}

impl ExecOutcome {
    /// Rows handed back to the caller. Statements that only change data
    /// return none.
    pub fn rows_returned(self) -> u64 {
        match self {
            ExecOutcome::Rows(n) => n,
            ExecOutcome::Affected(_) => 0,
        }
    }
}

/// How a backend numbers its positional parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `$1, $2, ...` (PostgreSQL).
    Dollar,
    /// `?1, ?2, ...` (SQLite).
    QuestionNumbered,
}

impl PlaceholderStyle {
    /// Marker for the 1-based parameter `position`.
    pub fn marker(self, position: usize) -> String {
        match self {
            PlaceholderStyle::Dollar => format!("${position}"),
            PlaceholderStyle::QuestionNumbered => format!("?{position}"),
        }
    }

    /// Number every neutral `?` marker in `template`, left to right.
    ///
    /// Templates must not contain a literal `?` inside string constants.
    pub fn render(self, template: &str) -> String {
        let mut out = String::with_capacity(template.len() + 8);
        let mut position = 0;
        for ch in template.chars() {
            if ch == '?' {
                position += 1;
                out.push_str(&self.marker(position));
            } else {
                out.push(ch);
            }
        }
        out
    }
}

/// The one external collaborator of the harness.
///
/// Every call is a blocking round trip. Implementations are used by exactly
/// one component at a time through [`crate::session::Session`].
pub trait DatabaseAccess {
    /// Dialect for positional parameters. Defaults to `$n`.
    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Dollar
    }

    /// Run one statement (already rendered in this backend's dialect) with
    /// its parameters bound in order.
    fn execute(&mut self, statement: &str, params: &[SqlValue]) -> Result<ExecOutcome>;

    /// Ask the engine to drop cached plans and session state so the next
    /// statement runs cold. Best effort: engines without such a concept may
    /// implement this as a no-op, and callers must not treat it as a
    /// guarantee.
    fn invalidate_session_cache(&mut self) -> Result<()>;

    /// Create a secondary index on `table(column)`. Creating an index that
    /// already exists is not an error.
    fn create_index(&mut self, table: &str, column: &str) -> Result<()>;

    /// Release the underlying connection. Called exactly once by the owning
    /// session.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<D: DatabaseAccess + ?Sized> DatabaseAccess for Box<D> {
    fn placeholder_style(&self) -> PlaceholderStyle {
        (**self).placeholder_style()
    }

    fn execute(&mut self, statement: &str, params: &[SqlValue]) -> Result<ExecOutcome> {
        (**self).execute(statement, params)
    }

    fn invalidate_session_cache(&mut self) -> Result<()> {
        (**self).invalidate_session_cache()
    }

    fn create_index(&mut self, table: &str, column: &str) -> Result<()> {
        (**self).create_index(table, column)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Conventional index name for `table(column)`.
pub fn index_name(table: &str, column: &str) -> String {
    format!("idx_{table}_{column}")
}

/// True for plain SQL identifiers: an ASCII letter or underscore followed by
/// ASCII letters, digits or underscores.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// The table a load targets: an auto-assigned primary key plus one value
/// column that the benchmark later indexes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetTable {
    name: String,
    key_column: String,
    value_column: String,
}

impl TargetTable {
    pub fn new(
        name: impl Into<String>,
        key_column: impl Into<String>,
        value_column: impl Into<String>,
    ) -> Result<Self, HarnessError> {
        let table = Self {
            name: name.into(),
            key_column: key_column.into(),
            value_column: value_column.into(),
        };
        for ident in [&table.name, &table.key_column, &table.value_column] {
            if !is_identifier(ident) {
                return Err(HarnessError::invalid_spec(format!(
                    "'{ident}' is not a plain SQL identifier"
                )));
            }
        }
        if table.key_column == table.value_column {
            return Err(HarnessError::invalid_spec(
                "key and value columns must differ",
            ));
        }
        Ok(table)
    }

    /// `name(id_pk, number)`, the layout of the big-table workload.
    pub fn reference(name: impl Into<String>) -> Result<Self, HarnessError> {
        Self::new(name, "id_pk", "number")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    pub fn value_column(&self) -> &str {
        &self.value_column
    }
}
