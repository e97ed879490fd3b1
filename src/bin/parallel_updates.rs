//! Interactive parallel-updates run with serial verification.
//!
//! Reads four whitespace-separated values from standard input:
//!
//! ```text
//! depth read_percentage thread_count total_ops
//! ```
//!
//! Streams a random mix of updates and reads through the worker pool, then
//! replays the same operations serially and compares root hashes.
//! Exits non-zero on invalid input.

use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use rand::thread_rng;

use smtree::workload::{random_operation, Operation, WorkloadEvent};
use smtree::{SparseMerkleTree, UpdatePool, MAX_THREADS};

struct Config {
    depth: usize,
    read_percent: f64,
    threads: usize,
    total_ops: usize,
}

fn read_config() -> Result<Config, String> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| format!("failed to read stdin: {e}"))?;
    let mut fields = input.split_whitespace();
    let mut next = |name: &str| {
        fields
            .next()
            .ok_or_else(|| format!("missing value for {name}"))
    };

    let depth: i64 = parse(next("depth")?)?;
    let read_percent: f64 = parse(next("read_percentage")?)?;
    let threads: i64 = parse(next("thread_count")?)?;
    let total_ops: i64 = parse(next("total_ops")?)?;

    if threads > MAX_THREADS as i64 {
        return Err(format!("thread count exceeds maximum limit of {MAX_THREADS}"));
    }
    if depth < 0 || !(0.0..=100.0).contains(&read_percent) || threads <= 0 || total_ops <= 0 {
        return Err("invalid input values".to_owned());
    }

    Ok(Config {
        depth: depth as usize,
        read_percent,
        threads: threads as usize,
        total_ops: total_ops as usize,
    })
}

fn parse<T: std::str::FromStr>(field: &str) -> Result<T, String> {
    field
        .parse()
        .map_err(|_| format!("could not parse value: {field}"))
}

fn main() -> ExitCode {
    #[cfg(feature = "tracing")]
    tracing_subscriber::fmt::init();

    println!("Enter tree depth, read percentage, thread count, and total operations:");
    let config = match read_config() {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::FAILURE;
        }
    };

    let tree = Arc::new(SparseMerkleTree::new(config.depth));
    println!("Initial tree state (root hash): {}", tree.root_hash());
    println!("Total leaf nodes: {}", tree.leaf_count());
    println!("------------------------");

    let anchor = Instant::now();
    let pool = match UpdatePool::new(Arc::clone(&tree), config.threads, anchor) {
        Ok(pool) => pool,
        Err(error) => {
            eprintln!("{error}");
            return ExitCode::FAILURE;
        }
    };

    println!(
        "Generating and enqueueing {} operations (mix of reads and updates)...",
        config.total_ops
    );
    let mut rng = thread_rng();
    let mut operations = Vec::with_capacity(config.total_ops);
    for i in 0..config.total_ops {
        let op = random_operation(&mut rng, config.depth, config.read_percent);
        pool.submit(WorkloadEvent {
            arrival: anchor.elapsed(),
            op: op.clone(),
        });
        operations.push(op);
        if (i + 1) % 10_000 == 0 {
            println!("Generated {} operations of {}", i + 1, config.total_ops);
        }
    }

    println!("All operations enqueued; waiting for workers to drain...");
    let report = pool.join();
    let parallel_elapsed = anchor.elapsed();
    let processed = report
        .response_times_us
        .iter()
        .map(Vec::len)
        .sum::<usize>();

    println!("------------------------");
    println!("Final tree state (root hash): {}", tree.root_hash());
    println!("Parallel execution time: {} ms", parallel_elapsed.as_millis());
    println!("Total processed operations: {processed}");
    println!(
        "Throughput: {:.2} ops/ms",
        processed as f64 / parallel_elapsed.as_millis().max(1) as f64
    );
    if report.failed_ops > 0 {
        println!("Failed operations: {}", report.failed_ops);
    }
    println!("------------------------");

    println!("Verifying with serial execution...");
    let serial_start = Instant::now();
    let mut serial_tree = SparseMerkleTree::new(config.depth);
    println!("Initial root hash (serial): {}", serial_tree.root_hash());
    for op in &operations {
        match op {
            Operation::Update { key, value } => {
                if let Err(error) = serial_tree.update_serial(key, value) {
                    eprintln!("serial replay failed: {error}");
                    return ExitCode::FAILURE;
                }
            }
            Operation::ReadRoot => {
                let _ = serial_tree.root_hash();
            }
            Operation::ReadLeaf { key } => {
                let _ = serial_tree.leaf_hash(key);
            }
        }
    }
    let serial_elapsed = serial_start.elapsed();
    println!("Final root hash (serial): {}", serial_tree.root_hash());
    println!("Serial execution time: {} ms", serial_elapsed.as_millis());

    if serial_tree.root_hash() == tree.root_hash() {
        println!("Hash verification: PASSED - parallel and serial hashes match");
    } else {
        println!("Hash verification: FAILED - parallel and serial hashes do not match");
    }

    println!("------------------------");
    println!(
        "Speedup: {:.2}",
        serial_elapsed.as_secs_f64() / parallel_elapsed.as_secs_f64().max(f64::EPSILON)
    );
    println!("------------------------");

    ExitCode::SUCCESS
}
