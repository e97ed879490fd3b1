//! Response-time bookkeeping and CSV output for the benchmark programs.
//!
//! Response times are microsecond integers measured from an operation's
//! arrival stamp to its completion. Series files carry one value per line;
//! the summary file carries a single header + row, matching the format the
//! plotting scripts downstream of the benchmark expect.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Average of a sample set, 0.0 when empty.
#[must_use]
pub fn average(samples: &[u64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<u64>() as f64 / samples.len() as f64
}

/// The `p`-quantile (0.0 ..= 1.0) of a sample set, 0 when empty.
///
/// Sorts a copy; fine for benchmark-sized vectors.
#[must_use]
pub fn percentile(samples: &[u64], p: f64) -> u64 {
    if samples.is_empty() {
        return 0;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_unstable();
    let index = ((p * sorted.len() as f64) as usize).min(sorted.len() - 1);
    sorted[index]
}

/// Write one response-time series, one microsecond value per line.
///
/// # Errors
///
/// Propagates I/O failures from creating or writing the file.
pub fn write_series_csv(path: impl AsRef<Path>, samples: &[u64]) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for value in samples {
        writeln!(out, "{value}")?;
    }
    out.flush()
}

/// One row of the benchmark summary.
#[derive(Clone, Copy, Debug)]
pub struct SummaryRow {
    pub depth: usize,
    pub threads: usize,
    pub batch: usize,
    pub ops: usize,
    pub avg_live: f64,
    pub avg_angela: f64,
    pub avg_serial: f64,
}

/// Write the summary CSV with its fixed header.
///
/// # Errors
///
/// Propagates I/O failures from creating or writing the file.
pub fn write_summary_csv(path: impl AsRef<Path>, row: &SummaryRow) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "depth,threads,batch,ops,avg_live,avg_angela,avg_serial")?;
    writeln!(
        out,
        "{},{},{},{},{:.2},{:.2},{:.2}",
        row.depth, row.threads, row.batch, row.ops, row.avg_live, row.avg_angela, row.avg_serial
    )?;
    out.flush()
}
