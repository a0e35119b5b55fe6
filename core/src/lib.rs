//! Batched bulk loader and query latency benchmark harness.
//!
//! Populates a table through fixed-size multi-row inserts, then times a
//! declared sequence of probes (point lookups, index creation) one at a
//! time against it. The database itself is reached only through the
//! [`access::DatabaseAccess`] trait.

use log::LevelFilter;
use log4rs::{
    append::{
        console::{ConsoleAppender, Target},
        file::FileAppender,
    },
    config::{Appender, Config, Root},
    encode::{Encode, pattern::PatternEncoder},
    filter::threshold::ThresholdFilter,
};
use std::{backtrace, env};

pub mod access;
pub mod cancel;
pub mod error;
pub mod harness;
pub mod loader;
pub mod plan;
pub mod probe;
pub mod report;
pub mod rowgen;
pub mod runner;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use access::{DatabaseAccess, ExecOutcome, PlaceholderStyle, SqlValue, TargetTable};
pub use cancel::CancelToken;
pub use error::{Failed, HarnessError};
pub use harness::Harness;
pub use loader::{BulkLoader, LoadProgress, LoadReport};
pub use plan::{Batch, BatchPlan, LoadSpec, plan};
pub use probe::{Probe, ProbeOp, ProbeResult, reference_probes};
pub use report::{BenchmarkReport, LoadSummary, emit};
pub use rowgen::{RowGenerator, Scrambled, Sequential};
pub use runner::{BenchmarkRunner, ProbeRun};
pub use session::Session;

#[derive(Debug)]
struct BacktracePatternEncoder {
    pattern_encoder: PatternEncoder,
    is_backtrace_enabled: bool,
}

impl BacktracePatternEncoder {
    fn new(pattern: &str) -> Self {
        BacktracePatternEncoder {
            pattern_encoder: PatternEncoder::new(pattern),
            is_backtrace_enabled: env::var("RUST_BACKTRACE").is_ok()
                || env::var("RUST_LIB_BACKTRACE").is_ok(),
        }
    }
}

impl Encode for BacktracePatternEncoder {
    fn encode(
        &self,
        w: &mut dyn log4rs::encode::Write,
        record: &log::Record<'_>,
    ) -> anyhow::Result<()> {
        if record.level() == log::Level::Error && self.is_backtrace_enabled {
            let args = format_args!(
                "{}\nBacktrace:\n{}",
                record.args(),
                backtrace::Backtrace::capture()
            );
            let new_record = log::Record::builder()
                .args(args)
                .level(record.level())
                .target(record.target())
                .module_path(record.module_path())
                .file(record.file())
                .line(record.line())
                .build();
            self.pattern_encoder.encode(w, &new_record)?;
        } else {
            self.pattern_encoder.encode(w, record)?;
        }
        Ok(())
    }
}

/// Install the process-wide logger: stderr at `log_level`, plus everything
/// down to trace in `file_path` when one is given.
pub fn initialize_logger(log_level: LevelFilter, file_path: Option<&str>) -> anyhow::Result<()> {
    const LOGGING_PATTERN: &str = "{d} {l} {f}:{L} - {m}\n";

    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(BacktracePatternEncoder::new(LOGGING_PATTERN)))
        .build();

    let mut config_builder = Config::builder().appender(
        Appender::builder()
            .filter(Box::new(ThresholdFilter::new(log_level)))
            .build("stderr", Box::new(stderr)),
    );
    let mut root = Root::builder().appender("stderr");
    let mut root_level = log_level;

    if let Some(path) = file_path {
        let logfile = FileAppender::builder()
            .encoder(Box::new(BacktracePatternEncoder::new(LOGGING_PATTERN)))
            .build(path)?;
        config_builder =
            config_builder.appender(Appender::builder().build("logfile", Box::new(logfile)));
        root = root.appender("logfile");
        root_level = LevelFilter::Trace;
    }

    let config = config_builder.build(root.build(root_level))?;
    log4rs::init_config(config)?;

    Ok(())
}
