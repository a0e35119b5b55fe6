//! Report emission: a one-to-one, order-preserving view of a run.
//!
//! Timings are never averaged or aggregated here. Comparing individual
//! probes is the point of the benchmark.

use serde::Serialize;

use crate::loader::LoadReport;
use crate::probe::ProbeResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub total_rows: u64,
    pub rows_loaded: u64,
    pub batches_completed: u64,
    pub total_duration_nanos: u64,
    pub cancelled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BenchmarkReport {
    pub load: LoadSummary,
    pub probes: Vec<ProbeResult>,
    /// Set when the probe run was stopped before every probe executed.
    pub probes_cancelled: bool,
}

impl BenchmarkReport {
    pub fn probe(&self, name: &str) -> Option<&ProbeResult> {
        self.probes.iter().find(|p| p.probe_name == name)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Combine a load report and probe results into one structured report.
pub fn emit(load: &LoadReport, probes: &[ProbeResult]) -> BenchmarkReport {
    BenchmarkReport {
        load: LoadSummary {
            total_rows: load.total_rows,
            rows_loaded: load.rows_loaded,
            batches_completed: load.batches_completed,
            total_duration_nanos: u64::try_from(load.total_duration.as_nanos())
                .unwrap_or(u64::MAX),
            cancelled: load.cancelled,
        },
        probes: probes.to_vec(),
        probes_cancelled: false,
    }
}
