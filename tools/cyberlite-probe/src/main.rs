// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! cyberlite-probe - In-process probe for cyberlite
//!
//! Drives the library inside one process:
//! - `pubsub`: publish a burst through a bounded reader and account for drops
//! - `rpc`: measure request/response round-trip latency
//! - `topology`: create demo nodes and dump what discovery sees

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use cyberlite::{
    Domain, Node, NodeConfig, OverflowPolicy, QosProfile, RoleAttributes, TopologySnapshot,
    RAW_DATA_TYPE,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// In-process load, latency and topology probe
#[derive(Parser, Debug)]
#[command(name = "cyberlite-probe")]
#[command(version)]
#[command(about = "Exercise cyberlite pub/sub, RPC and discovery in-process")]
struct Args {
    #[command(subcommand)]
    mode: Mode,

    /// Quiet mode - one summary line
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Publish a burst and report received/dropped counts
    Pubsub {
        /// Number of messages to publish
        #[arg(short = 'n', long, default_value = "100000")]
        count: u64,

        /// Payload size in bytes
        #[arg(short, long, default_value = "64")]
        size: usize,

        /// Reader queue depth
        #[arg(short, long, default_value = "16")]
        depth: u32,

        /// Overflow policy when the reader is full
        #[arg(short, long, value_enum, default_value = "drop-oldest")]
        policy: Policy,
    },

    /// Measure request/response round-trip latency
    Rpc {
        /// Number of timed requests
        #[arg(short = 'n', long, default_value = "10000")]
        iterations: u64,

        /// Warmup requests (not timed)
        #[arg(short, long, default_value = "100")]
        warmup: u64,

        /// Request payload size in bytes
        #[arg(short, long, default_value = "64")]
        size: usize,
    },

    /// Create demo nodes and dump the topology
    Topology {
        /// Number of demo nodes
        #[arg(short = 'n', long, default_value = "3")]
        nodes: usize,

        /// Channels per node
        #[arg(short, long, default_value = "2")]
        channels: usize,

        /// Output format
        #[arg(short, long, value_enum, default_value = "pretty")]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Policy {
    DropOldest,
    Reject,
}

impl From<Policy> for OverflowPolicy {
    fn from(p: Policy) -> Self {
        match p {
            Policy::DropOldest => OverflowPolicy::DropOldest,
            Policy::Reject => OverflowPolicy::Reject,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Pretty,
    Json,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    match &args.mode {
        Mode::Pubsub {
            count,
            size,
            depth,
            policy,
        } => run_pubsub(&running, *count, *size, *depth, *policy, args.quiet),
        Mode::Rpc {
            iterations,
            warmup,
            size,
        } => run_rpc(&running, *iterations, *warmup, *size, args.quiet),
        Mode::Topology {
            nodes,
            channels,
            format,
        } => run_topology(*nodes, *channels, *format),
    }
}

fn probe_node(domain: &Domain, name: &str) -> cyberlite::Result<Arc<Node>> {
    let config = NodeConfig {
        discovery_settle_ms: 0,
        ..NodeConfig::from_env()?
    };
    Node::builder(name).domain(domain.clone()).config(config).build()
}

// ---------------------------------------------------------------------------
// pubsub
// ---------------------------------------------------------------------------

fn run_pubsub(
    running: &AtomicBool,
    count: u64,
    size: usize,
    depth: u32,
    policy: Policy,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !quiet {
        eprintln!("{} Pub/sub burst", ">>>".green().bold());
        eprintln!(
            "    count={}, size={} bytes, depth={}, policy={:?}",
            count, size, depth, policy
        );
    }

    let domain = Domain::intra_process();
    let talker = probe_node(&domain, "probe-talker")?;
    let listener = probe_node(&domain, "probe-listener")?;

    let qos = QosProfile::keep_last(depth).with_overflow(policy.into());
    let reader = Arc::new(listener.create_reader_with_qos("probe/burst", RAW_DATA_TYPE, qos, None)?);
    let writer = talker.create_writer_with_qos("probe/burst", RAW_DATA_TYPE, qos)?;

    let done = Arc::new(AtomicBool::new(false));
    let consumer = {
        let reader = Arc::clone(&reader);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut consumed = 0u64;
            loop {
                match reader.read_timeout(Duration::from_millis(10)) {
                    Ok(Some(_)) => consumed += 1,
                    Ok(None) if done.load(Ordering::Acquire) => break,
                    Ok(None) => {}
                    Err(_) => break,
                }
            }
            consumed
        })
    };

    let payload = vec![0x5Au8; size];
    let start = Instant::now();
    let mut sent = 0u64;
    while sent < count && running.load(Ordering::SeqCst) {
        writer.write(payload.clone())?;
        sent += 1;
    }
    let elapsed = start.elapsed();
    done.store(true, Ordering::Release);

    let consumed = consumer
        .join()
        .map_err(|_| "consumer thread panicked".to_string())?;
    let stats = reader.stats();
    let rate = sent as f64 / elapsed.as_secs_f64().max(f64::EPSILON);

    if quiet {
        println!(
            "sent={} received={} consumed={} dropped={} rate={:.0} msg/s",
            sent, stats.received, consumed, stats.dropped, rate
        );
        return Ok(());
    }

    println!();
    println!("{}", "Results".bold());
    println!("  {} {:>12}", "sent:".white(), sent);
    println!("  {} {:>8}", "received:".white(), stats.received);
    println!("  {} {:>8}", "consumed:".white(), consumed);
    let dropped = format!("{:>9}", stats.dropped);
    println!(
        "  {} {}",
        "dropped:".white(),
        if stats.dropped > 0 {
            dropped.yellow()
        } else {
            dropped.green()
        }
    );
    println!("  {} {:>12.0} msg/s", "rate:".white(), rate);
    println!(
        "  {} {:>11.1} MB/s",
        "bytes:".white(),
        rate * size as f64 / 1_000_000.0
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// rpc
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Stats {
    min: f64,
    max: f64,
    mean: f64,
    p50: f64,
    p99: f64,
}

fn calculate_stats(latencies: &[f64]) -> Stats {
    if latencies.is_empty() {
        return Stats::default();
    }
    let mut sorted = latencies.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let percentile = |p: f64| -> f64 {
        let idx = ((p / 100.0) * n as f64) as usize;
        sorted[idx.min(n - 1)]
    };
    Stats {
        min: sorted[0],
        max: sorted[n - 1],
        mean: sorted.iter().sum::<f64>() / n as f64,
        p50: percentile(50.0),
        p99: percentile(99.0),
    }
}

fn run_rpc(
    running: &AtomicBool,
    iterations: u64,
    warmup: u64,
    size: usize,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !quiet {
        eprintln!("{} RPC round trip", ">>>".green().bold());
        eprintln!(
            "    iterations={}, warmup={}, size={} bytes",
            iterations, warmup, size
        );
    }

    let domain = Domain::intra_process();
    let server = probe_node(&domain, "probe-server")?;
    let caller = probe_node(&domain, "probe-client")?;
    let _service = server.create_service("probe/echo", RAW_DATA_TYPE, |req| {
        Ok(req.payload().to_vec())
    })?;
    let client = caller.create_client("probe/echo", RAW_DATA_TYPE)?;
    if !client.wait_for_service(Duration::from_secs(1)) {
        return Err("echo service never became visible".into());
    }

    let payload = vec![0u8; size];
    let mut latencies = Vec::with_capacity(iterations as usize);
    let mut failed = 0u64;

    for i in 0..(warmup + iterations) {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        let start = Instant::now();
        match client.send_request(payload.clone()) {
            Ok(_) if i >= warmup => latencies.push(start.elapsed().as_secs_f64() * 1e6),
            Ok(_) => {}
            Err(e) => {
                log::warn!("[Probe] request {} failed: {}", i, e);
                failed += 1;
            }
        }
    }

    let stats = calculate_stats(&latencies);
    if quiet {
        println!(
            "samples={} failed={} min={:.1} avg={:.1} p99={:.1} us",
            latencies.len(),
            failed,
            stats.min,
            stats.mean,
            stats.p99
        );
        return Ok(());
    }

    println!();
    println!("{}", "Latency (us)".bold());
    println!("  {} {:>10}", "samples:".white(), latencies.len());
    println!("  {} {:>11}", "failed:".white(), failed);
    println!("  {} {:>10.2} us", "min:".white(), stats.min);
    println!("  {} {:>10.2} us", "avg:".white(), stats.mean);
    println!("  {} {:>10.2} us", "p50:".white(), stats.p50);
    println!("  {} {:>10.2} us", "p99:".white(), stats.p99);
    println!("  {} {:>10.2} us", "max:".white(), stats.max);
    Ok(())
}

// ---------------------------------------------------------------------------
// topology
// ---------------------------------------------------------------------------

fn run_topology(
    nodes: usize,
    channels: usize,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let domain = Domain::intra_process();
    let mut keep = Vec::new();
    let mut writers = Vec::new();
    let mut readers = Vec::new();

    for n in 0..nodes {
        let node = probe_node(&domain, &format!("demo-node-{}", n))?;
        for c in 0..channels {
            let channel = format!("demo/{}/{}", n, c);
            writers.push(node.create_writer(&channel, RAW_DATA_TYPE, 4)?);
            // Every node also listens to its neighbour's first channel.
            let neighbour = format!("demo/{}/0", (n + 1) % nodes.max(1));
            if c == 0 {
                readers.push(node.create_reader(&neighbour, RAW_DATA_TYPE, None)?);
            }
        }
        keep.push(node);
    }

    let snapshot = domain.topology().snapshot();
    match format {
        OutputFormat::Pretty => print_pretty(&snapshot),
        OutputFormat::Json => print_json(&snapshot)?,
    }
    Ok(())
}

fn role_line(role: &RoleAttributes) -> String {
    format!(
        "{} {} (node={}, type={}, depth={})",
        format!("{:?}", role.kind).cyan(),
        role.id,
        role.node_name,
        role.message_type,
        role.queue_depth()
    )
}

fn print_pretty(snapshot: &TopologySnapshot) {
    println!(
        "{} generation {} ({} roles)",
        ">>>".green().bold(),
        snapshot.generation(),
        snapshot.role_count()
    );
    for (name, roles) in snapshot.channels() {
        println!(
            "  {} {} writers={} readers={}",
            "channel".yellow(),
            name.bold(),
            roles.writers.len(),
            roles.readers.len()
        );
        for role in roles.iter() {
            println!("    {}", role_line(role));
        }
    }
    for name in snapshot.service_names() {
        println!("  {} {}", "service".yellow(), name.bold());
    }
}

fn print_json(snapshot: &TopologySnapshot) -> Result<(), Box<dyn std::error::Error>> {
    let channels: serde_json::Map<String, serde_json::Value> = snapshot
        .channels()
        .map(|(name, roles)| -> Result<_, serde_json::Error> {
            let entries = roles
                .iter()
                .map(|role| serde_json::to_value(&**role))
                .collect::<Result<Vec<_>, _>>()?;
            Ok((name.to_string(), serde_json::Value::Array(entries)))
        })
        .collect::<Result<_, serde_json::Error>>()?;

    let doc = serde_json::json!({
        "generation": snapshot.generation(),
        "roles": snapshot.role_count(),
        "channels": channels,
        "services": snapshot.service_names().collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}
