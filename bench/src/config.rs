//! Environment-driven configuration for the benchmark binary.
//!
//! Every setting has a default; `LOADBENCH_*` variables override them. A
//! `.env` file in the working directory is honoured by the binary.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use log::LevelFilter;
use loadbench_core::{HarnessError, LoadSpec, RowGenerator, Scrambled, Sequential, TargetTable};

use crate::sqlite::IN_MEMORY;

const DEFAULT_TABLE: &str = "big";
const DEFAULT_LOG_FILE: &str = "loadbench.log";

/// How row values are derived from their position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRule {
    /// `index + 1`.
    Sequential,
    /// Seeded pseudo-random values.
    Scrambled,
}

impl FromStr for RowRule {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sequential" => Ok(RowRule::Sequential),
            "scrambled" => Ok(RowRule::Scrambled),
            other => bail!("unknown row rule '{other}' (expected sequential or scrambled)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BenchConfig {
    pub db_path: String,
    pub table: String,
    pub total_rows: u64,
    pub batch_size: u64,
    pub row_rule: RowRule,
    pub timeout: Option<Duration>,
    pub log_level: LevelFilter,
    pub log_file: Option<String>,
    pub report_json: Option<PathBuf>,
}

fn parse_log_level(value: &str) -> Option<LevelFilter> {
    match value.to_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

fn parse_number(name: &str, value: Option<String>, default: u64) -> Result<u64> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|e| anyhow!("{name}={raw} is not a non-negative integer: {e}")),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl BenchConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolve every setting through `lookup` (variable name to value).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let reference = LoadSpec::reference();

        let log_level = match non_empty(lookup("LOADBENCH_LOG_LEVEL")) {
            None => LevelFilter::Info,
            Some(raw) => parse_log_level(&raw)
                .ok_or_else(|| anyhow!("LOADBENCH_LOG_LEVEL={raw} is not a log level"))?,
        };

        let log_file = match lookup("LOADBENCH_LOG_FILE") {
            None => Some(DEFAULT_LOG_FILE.to_string()),
            Some(raw) => non_empty(Some(raw)).filter(|v| !v.eq_ignore_ascii_case("none")),
        };

        let timeout = match non_empty(lookup("LOADBENCH_TIMEOUT_SECS")) {
            None => None,
            Some(raw) => Some(Duration::from_secs(parse_number(
                "LOADBENCH_TIMEOUT_SECS",
                Some(raw),
                0,
            )?)),
        };

        let row_rule = match non_empty(lookup("LOADBENCH_ROW_RULE")) {
            None => RowRule::Sequential,
            Some(raw) => raw.parse()?,
        };

        Ok(Self {
            db_path: non_empty(lookup("LOADBENCH_DB_PATH")).unwrap_or_else(|| IN_MEMORY.into()),
            table: non_empty(lookup("LOADBENCH_TABLE")).unwrap_or_else(|| DEFAULT_TABLE.into()),
            total_rows: parse_number(
                "LOADBENCH_TOTAL_ROWS",
                non_empty(lookup("LOADBENCH_TOTAL_ROWS")),
                reference.total_rows(),
            )?,
            batch_size: parse_number(
                "LOADBENCH_BATCH_SIZE",
                non_empty(lookup("LOADBENCH_BATCH_SIZE")),
                reference.batch_size(),
            )?,
            row_rule,
            timeout,
            log_level,
            log_file,
            report_json: non_empty(lookup("LOADBENCH_REPORT_JSON")).map(PathBuf::from),
        })
    }

    pub fn load_spec(&self) -> Result<LoadSpec, HarnessError> {
        LoadSpec::new(self.total_rows, self.batch_size)
    }

    pub fn target_table(&self) -> Result<TargetTable, HarnessError> {
        TargetTable::reference(self.table.clone())
    }

    pub fn row_generator(&self) -> Box<dyn RowGenerator> {
        match self.row_rule {
            RowRule::Sequential => Box::new(Sequential),
            RowRule::Scrambled => Box::new(Scrambled::new(
                0xDEAD_BEEF_CAFE_1337,
                self.total_rows as i64,
            )),
        }
    }
}
