//! End-to-end run: load the table, then time the probes, then emit.

use crate::access::DatabaseAccess;
use crate::error::Failed;
use crate::loader::BulkLoader;
use crate::plan::LoadSpec;
use crate::probe::Probe;
use crate::report::{BenchmarkReport, emit};
use crate::runner::BenchmarkRunner;
use crate::session::Session;

pub struct Harness {
    loader: BulkLoader,
    runner: BenchmarkRunner,
}

impl Harness {
    pub fn new(loader: BulkLoader, runner: BenchmarkRunner) -> Self {
        Self { loader, runner }
    }

    /// Load `spec`, then run `probes` against the populated table.
    ///
    /// A cancelled load skips the probes, since timings against a partly
    /// filled table are not comparable. Failures return the report built
    /// from whatever completed.
    pub fn run<D: DatabaseAccess>(
        &self,
        session: &mut Session<D>,
        spec: &LoadSpec,
        probes: &[Probe],
    ) -> Result<BenchmarkReport, Failed<BenchmarkReport>> {
        let load = self
            .loader
            .load(session, spec)
            .map_err(|failed| failed.map_partial(|load| emit(&load, &[])))?;

        if load.cancelled {
            let mut report = emit(&load, &[]);
            report.probes_cancelled = !probes.is_empty();
            return Ok(report);
        }

        match self.runner.run(session, probes) {
            Ok(run) => {
                let mut report = emit(&load, &run.results);
                report.probes_cancelled = run.cancelled;
                Ok(report)
            }
            Err(failed) => Err(failed.map_partial(|run| emit(&load, &run.results))),
        }
    }
}
