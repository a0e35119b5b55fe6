//! Declarative probe definitions.
//!
//! A probe is a named operation whose isolated duration the runner
//! measures. Probes are plain data so a sequence can be inspected and
//! asserted on without touching a database.

use serde::Serialize;

use crate::access::{SqlValue, TargetTable, index_name};

/// Primary key looked up by the first reference probe.
pub const REFERENCE_KEY_LOOKUP: i64 = 230;
/// Value looked up before the value column is indexed.
pub const REFERENCE_UNINDEXED_LOOKUP: i64 = 89_199;
/// Value looked up after the index exists.
pub const REFERENCE_INDEXED_LOOKUP: i64 = 4_230;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeOp {
    /// A statement template using neutral `?` markers, with its parameters.
    Query {
        statement: String,
        params: Vec<SqlValue>,
    },
    /// Secondary index creation through the backend's idempotent
    /// `create_index`. Returns no rows.
    CreateIndex { table: String, column: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Probe {
    pub name: String,
    pub op: ProbeOp,
}

impl Probe {
    pub fn query(
        name: impl Into<String>,
        statement: impl Into<String>,
        params: Vec<SqlValue>,
    ) -> Self {
        Self {
            name: name.into(),
            op: ProbeOp::Query {
                statement: statement.into(),
                params,
            },
        }
    }

    pub fn create_index(
        name: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            op: ProbeOp::CreateIndex {
                table: table.into(),
                column: column.into(),
            },
        }
    }

    /// Point lookup `SELECT * FROM table WHERE column = ?`.
    pub fn point_lookup(name: impl Into<String>, table: &str, column: &str, value: i64) -> Self {
        Self::query(
            name,
            format!("SELECT * FROM {table} WHERE {column} = ?"),
            vec![SqlValue::Integer(value)],
        )
    }

    pub fn is_index_creation(&self) -> bool {
        matches!(self.op, ProbeOp::CreateIndex { .. })
    }
}

/// The big-table comparison: key lookup, unindexed value lookup, index
/// creation on the value column, indexed value lookup.
pub fn reference_probes(table: &TargetTable) -> Vec<Probe> {
    let name = table.name();
    let value = table.value_column();
    vec![
        Probe::point_lookup(
            "lookup_by_primary_key",
            name,
            table.key_column(),
            REFERENCE_KEY_LOOKUP,
        ),
        Probe::point_lookup(
            "lookup_unindexed_value",
            name,
            value,
            REFERENCE_UNINDEXED_LOOKUP,
        ),
        Probe::create_index(format!("create_{}", index_name(name, value)), name, value),
        Probe::point_lookup(
            "lookup_indexed_value",
            name,
            value,
            REFERENCE_INDEXED_LOOKUP,
        ),
    ]
}

/// Measured outcome of one probe, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub probe_name: String,
    pub duration_nanos: u64,
    pub rows_returned: u64,
}
