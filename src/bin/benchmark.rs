//! Three-way benchmark: live vs batch vs serial over one recorded workload.
//!
//! Reads four whitespace-separated values from standard input:
//!
//! ```text
//! depth batch_size thread_count total_ops
//! ```
//!
//! One arrival-stamped workload is generated up front and played through
//! each strategy:
//!
//! 1. **Live** — real-time playback through the worker pool (events are
//!    submitted at their recorded arrival offsets).
//! 2. **Batch** — updates are grouped into `batch_size` chunks and applied
//!    with the conflict-partitioned updater.
//! 3. **Serial** — the single-threaded oracle.
//!
//! Per-operation response times (µs) land in `live_response_times.csv`,
//! `angela_response_times.csv`, and `serial_response_times.csv`; the
//! averages land in `summary_metrics.csv`. Root hashes of all three trees
//! are compared at the end.

use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rand::thread_rng;

use smtree::stats::{average, percentile, write_series_csv, write_summary_csv, SummaryRow};
use smtree::workload::{generate_workload, Operation, DEFAULT_MEAN_GAP};
use smtree::{SparseMerkleTree, UpdatePool, MAX_THREADS};

struct Config {
    depth: usize,
    batch_size: usize,
    threads: usize,
    total_ops: usize,
}

fn read_config() -> Result<Config, String> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| format!("failed to read stdin: {e}"))?;
    let mut fields = input.split_whitespace();
    let mut next = |name: &str| -> Result<i64, String> {
        fields
            .next()
            .ok_or_else(|| format!("missing value for {name}"))?
            .parse()
            .map_err(|_| format!("could not parse {name}"))
    };

    let depth = next("depth")?;
    let batch_size = next("batch_size")?;
    let threads = next("thread_count")?;
    let total_ops = next("total_ops")?;

    if depth < 0 || batch_size <= 0 || threads <= 0 || threads > MAX_THREADS as i64 || total_ops <= 0
    {
        return Err("invalid input values".to_owned());
    }

    Ok(Config {
        depth: depth as usize,
        batch_size: batch_size as usize,
        threads: threads as usize,
        total_ops: total_ops as usize,
    })
}

fn print_series(label: &str, samples: &[u64]) {
    println!(
        "{label:<7}: avg {:.2} us | p50 {} us | p90 {} us | p99 {} us",
        average(samples),
        percentile(samples, 0.5),
        percentile(samples, 0.9),
        percentile(samples, 0.99),
    );
}

fn main() -> ExitCode {
    #[cfg(feature = "tracing")]
    tracing_subscriber::fmt::init();

    println!("Benchmark Merkle tree updaters (live vs batch vs serial)");
    println!("Enter depth, batch_size, thread_count, total_ops:");
    let config = match read_config() {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::FAILURE;
        }
    };
    println!(
        "Depth={} Batch={} Threads={} Ops={}",
        config.depth, config.batch_size, config.threads, config.total_ops
    );

    println!("\nGenerating workload...");
    let mut rng = thread_rng();
    let stream = generate_workload(
        &mut rng,
        config.depth,
        config.total_ops,
        0.0,
        DEFAULT_MEAN_GAP,
    );
    println!("Workload generated ({} events).", stream.len());

    // ------------------------------------------------------------------
    // 1. Live: real-time playback through the pool.
    // ------------------------------------------------------------------
    println!("\nRunning live updater...");
    let live_tree = Arc::new(SparseMerkleTree::new(config.depth));
    let anchor = Instant::now();
    let pool = match UpdatePool::new(Arc::clone(&live_tree), config.threads, anchor) {
        Ok(pool) => pool,
        Err(error) => {
            eprintln!("{error}");
            return ExitCode::FAILURE;
        }
    };
    for event in &stream {
        let until_arrival = event.arrival.saturating_sub(anchor.elapsed());
        if !until_arrival.is_zero() {
            thread::sleep(until_arrival);
        }
        pool.submit(event.clone());
    }
    let report = pool.join();
    let live_elapsed = anchor.elapsed();
    let live_rt = report.merged_response_times();
    println!("Live finished in {} ms", live_elapsed.as_millis());

    // ------------------------------------------------------------------
    // 2. Batch: updates in batch_size chunks.
    // ------------------------------------------------------------------
    println!("\nRunning batch updater...");
    let batch_tree = SparseMerkleTree::new(config.depth);
    let batch_anchor = Instant::now();
    let mut batch_rt: Vec<u64> = Vec::with_capacity(config.total_ops);
    let mut pending: Vec<(String, Vec<u8>)> = Vec::with_capacity(config.batch_size);
    let mut pending_arrivals: Vec<Duration> = Vec::with_capacity(config.batch_size);

    let mut flush = |pending: &mut Vec<(String, Vec<u8>)>,
                     arrivals: &mut Vec<Duration>|
     -> Result<(), smtree::TreeError> {
        if pending.is_empty() {
            return Ok(());
        }
        batch_tree.update_batch(pending, config.threads)?;
        let finish = batch_anchor.elapsed();
        batch_rt.extend(
            arrivals
                .iter()
                .map(|arrival| finish.saturating_sub(*arrival).as_micros() as u64),
        );
        pending.clear();
        arrivals.clear();
        Ok(())
    };

    for event in &stream {
        let Operation::Update { key, value } = &event.op else {
            continue;
        };
        pending.push((key.clone(), value.clone()));
        pending_arrivals.push(event.arrival);
        if pending.len() == config.batch_size {
            if let Err(error) = flush(&mut pending, &mut pending_arrivals) {
                eprintln!("batch run failed: {error}");
                return ExitCode::FAILURE;
            }
        }
    }
    if let Err(error) = flush(&mut pending, &mut pending_arrivals) {
        eprintln!("batch run failed: {error}");
        return ExitCode::FAILURE;
    }
    println!("Batch processed {} updates.", batch_rt.len());

    // ------------------------------------------------------------------
    // 3. Serial oracle.
    // ------------------------------------------------------------------
    println!("\nRunning serial updater...");
    let mut serial_tree = SparseMerkleTree::new(config.depth);
    let serial_anchor = Instant::now();
    let mut serial_rt: Vec<u64> = Vec::with_capacity(config.total_ops);
    for event in &stream {
        let outcome = match &event.op {
            Operation::Update { key, value } => serial_tree.update_serial(key, value),
            Operation::ReadRoot => {
                let _ = serial_tree.root_hash();
                Ok(())
            }
            Operation::ReadLeaf { key } => serial_tree.leaf_hash(key).map(|_| ()),
        };
        if let Err(error) = outcome {
            eprintln!("serial run failed: {error}");
            return ExitCode::FAILURE;
        }
        let finish = serial_anchor.elapsed();
        serial_rt.push(finish.saturating_sub(event.arrival).as_micros() as u64);
    }
    println!("Serial done.");

    // ------------------------------------------------------------------
    // 4. Summary and CSV output.
    // ------------------------------------------------------------------
    println!("\n==== RESULTS ====");
    print_series("Live", &live_rt);
    print_series("Batch", &batch_rt);
    print_series("Serial", &serial_rt);

    let summary = SummaryRow {
        depth: config.depth,
        threads: config.threads,
        batch: config.batch_size,
        ops: config.total_ops,
        avg_live: average(&live_rt),
        avg_angela: average(&batch_rt),
        avg_serial: average(&serial_rt),
    };

    let csv_result = write_series_csv("live_response_times.csv", &live_rt)
        .and_then(|()| write_series_csv("angela_response_times.csv", &batch_rt))
        .and_then(|()| write_series_csv("serial_response_times.csv", &serial_rt))
        .and_then(|()| write_summary_csv("summary_metrics.csv", &summary));
    if let Err(error) = csv_result {
        eprintln!("failed to write CSV output: {error}");
        return ExitCode::FAILURE;
    }
    println!("\nWrote live_response_times.csv, angela_response_times.csv,");
    println!("serial_response_times.csv, and summary_metrics.csv");

    // ------------------------------------------------------------------
    // 5. Root hash verification.
    // ------------------------------------------------------------------
    println!("\n==== ROOT HASH VERIFICATION ====");
    let live_root = live_tree.root_hash();
    let batch_root = batch_tree.root_hash();
    let serial_root = serial_tree.root_hash();
    println!("Live root   : {live_root}");
    println!("Batch root  : {batch_root}");
    println!("Serial root : {serial_root}");
    println!(
        "Live   vs serial : {}",
        if live_root == serial_root { "MATCH" } else { "MISMATCH" }
    );
    println!(
        "Batch  vs serial : {}",
        if batch_root == serial_root { "MATCH" } else { "MISMATCH" }
    );

    ExitCode::SUCCESS
}
