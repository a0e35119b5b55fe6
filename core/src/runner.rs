//! Probe execution with per-probe isolation and timing.

use std::time::Instant;

use serde::Serialize;

use crate::access::{DatabaseAccess, ExecOutcome};
use crate::cancel::CancelToken;
use crate::error::{Failed, HarnessError};
use crate::probe::{Probe, ProbeOp, ProbeResult};
use crate::session::Session;

/// Results of a probe sequence, in execution order. Append-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProbeRun {
    pub results: Vec<ProbeResult>,
    /// The run stopped on a cancel signal before every probe executed.
    pub cancelled: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BenchmarkRunner {
    cancel: CancelToken,
}

impl BenchmarkRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Execute `probes` one at a time, in the order given.
    ///
    /// Before each probe the session cache is invalidated (best effort; a
    /// failed invalidation is logged and the probe still runs). Only the
    /// statement round trip is timed. The first failing probe ends the run;
    /// results recorded before it come back with the error.
    pub fn run<D: DatabaseAccess>(
        &self,
        session: &mut Session<D>,
        probes: &[Probe],
    ) -> Result<ProbeRun, Failed<ProbeRun>> {
        let db = session.backend();
        let style = db.placeholder_style();
        let mut run = ProbeRun::default();

        for probe in probes {
            if self.cancel.is_cancelled() {
                log::warn!(
                    "Probe run cancelled after {} of {} probes",
                    run.results.len(),
                    probes.len()
                );
                run.cancelled = true;
                break;
            }

            if let Err(e) = db.invalidate_session_cache() {
                log::warn!("Cache invalidation before '{}' failed: {e}", probe.name);
            }

            let (outcome, elapsed) = match &probe.op {
                ProbeOp::Query { statement, params } => {
                    let sql = style.render(statement);
                    let start = Instant::now();
                    let outcome = db.execute(&sql, params);
                    (outcome, start.elapsed())
                }
                ProbeOp::CreateIndex { table, column } => {
                    let start = Instant::now();
                    let outcome = db.create_index(table, column).map(|()| ExecOutcome::Affected(0));
                    (outcome, start.elapsed())
                }
            };

            match outcome {
                Ok(outcome) => {
                    let result = ProbeResult {
                        probe_name: probe.name.clone(),
                        duration_nanos: u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX),
                        rows_returned: outcome.rows_returned(),
                    };
                    log::debug!(
                        "Probe {}: {:.3}ms, {} rows",
                        result.probe_name,
                        elapsed.as_secs_f64() * 1000.0,
                        result.rows_returned
                    );
                    run.results.push(result);
                }
                Err(cause) => {
                    log::error!("Probe '{}' failed: {cause}", probe.name);
                    return Err(Failed::new(
                        run,
                        HarnessError::ProbeFailed {
                            name: probe.name.clone(),
                            cause,
                        },
                    ));
                }
            }
        }

        Ok(run)
    }
}
