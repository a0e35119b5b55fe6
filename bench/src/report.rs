//! Report module: prints the structured benchmark report for humans.

use std::io::{self, Write};

use loadbench_core::BenchmarkReport;

fn nanos_to_ms(nanos: u64) -> f64 {
    nanos as f64 / 1_000_000.0
}

/// Write a formatted report of the load and each probe, in run order.
pub fn write_report(w: &mut impl Write, report: &BenchmarkReport) -> io::Result<()> {
    let load = &report.load;

    writeln!(w, "\n{}", "=".repeat(72))?;
    writeln!(w, "  Bulk Load + Point Lookup Benchmark Report")?;
    writeln!(w, "{}", "=".repeat(72))?;

    writeln!(w, "\n  Load")?;
    writeln!(w, "  {}", "-".repeat(60))?;
    writeln!(w, "  Rows requested:  {:>12}", load.total_rows)?;
    writeln!(w, "  Rows loaded:     {:>12}", load.rows_loaded)?;
    writeln!(w, "  Batches:         {:>12}", load.batches_completed)?;
    writeln!(
        w,
        "  Duration:        {:>12.2}ms",
        nanos_to_ms(load.total_duration_nanos)
    )?;
    if load.total_duration_nanos > 0 && load.rows_loaded > 0 {
        let rows_per_sec = load.rows_loaded as f64 / (load.total_duration_nanos as f64 / 1e9);
        writeln!(w, "  Throughput:      {:>12.0} rows/s", rows_per_sec)?;
    }
    if load.cancelled {
        writeln!(w, "  Status:          cancelled")?;
    }

    writeln!(w, "\n  Probes")?;
    writeln!(
        w,
        "  {:28} {:>12} {:>10} {:>8}",
        "Probe", "Time (µs)", "Time (ms)", "Rows"
    )?;
    writeln!(w, "  {}", "-".repeat(62))?;
    if report.probes.is_empty() {
        writeln!(w, "  (no probes executed)")?;
    }
    for probe in &report.probes {
        writeln!(
            w,
            "  {:28} {:>12.1} {:>10.3} {:>8}",
            probe.probe_name,
            probe.duration_nanos as f64 / 1000.0,
            nanos_to_ms(probe.duration_nanos),
            probe.rows_returned
        )?;
    }
    if report.probes_cancelled {
        writeln!(w, "  (probe run cancelled)")?;
    }

    writeln!(w, "\n{}", "=".repeat(72))?;
    Ok(())
}

/// Print the report to stdout.
pub fn print_report(report: &BenchmarkReport) {
    let stdout = io::stdout();
    if let Err(e) = write_report(&mut stdout.lock(), report) {
        log::error!("Failed to print report: {e}");
    }
}
