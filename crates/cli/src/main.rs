//! DRAM cycle-accurate simulator CLI.
//!
//! This binary provides the standalone entry point for batch simulations. It
//! performs:
//! 1. **Config load:** JSON configuration file, or built-in defaults.
//! 2. **Workload:** Replay an access trace (`-t`) or drive a seeded random
//!    stream (`-s`).
//! 3. **Run:** Tick every channel for the requested number of cycles, then
//!    print aggregated statistics.

use std::cell::Cell;
use std::process;
use std::rc::Rc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use dramulator_core::{Config, MemorySystem};

mod workload;
use workload::{RandomWorkload, TraceWorkload};

#[derive(Parser, Debug)]
#[command(
    name = "dramulator",
    author,
    version,
    about = "Cycle-accurate DRAM memory-subsystem simulator",
    long_about = "Replay a memory access trace or drive a random transaction stream against\n\
                  a configured DRAM device and report latency, bandwidth, and energy.\n\n\
                  Examples:\n  \
                  dramulator configs/ddr4.json -c 100000 -t sample.trace\n  \
                  dramulator configs/hbm2.json -c 100000 -s --seed 7"
)]
struct Cli {
    /// Configuration file (JSON). Omit for built-in defaults.
    config: Option<String>,

    /// Number of cycles to simulate.
    #[arg(short, long, default_value_t = 100_000)]
    cycles: u64,

    /// Access trace to replay (`<hex-addr> <READ|WRITE> <cycle>` per line).
    #[arg(short, long, conflicts_with = "stream")]
    trace: Option<String>,

    /// Drive a random transaction stream instead of a trace.
    #[arg(short, long)]
    stream: bool,

    /// Seed for the random stream.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Host model wired to the CLI flags.
enum Workload {
    Trace(TraceWorkload),
    Random(RandomWorkload),
    /// No generator; tick the device alone (refresh/self-refresh soak).
    Idle,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path).unwrap_or_else(|err| {
            eprintln!("configuration error: {err}");
            process::exit(1);
        }),
        None => Config::default(),
    };

    let mut workload = match (&cli.trace, cli.stream) {
        (Some(path), _) => Workload::Trace(TraceWorkload::new(path)),
        (None, true) => Workload::Random(RandomWorkload::new(&config, cli.seed)),
        (None, false) => Workload::Idle,
    };

    let reads_done = Rc::new(Cell::new(0u64));
    let writes_done = Rc::new(Cell::new(0u64));
    let read_counter = Rc::clone(&reads_done);
    let write_counter = Rc::clone(&writes_done);

    let mut memory = MemorySystem::new(
        config,
        Box::new(move |_addr| read_counter.set(read_counter.get() + 1)),
        Box::new(move |_addr| write_counter.set(write_counter.get() + 1)),
    )
    .unwrap_or_else(|err| {
        eprintln!("configuration error: {err}");
        process::exit(1);
    });

    println!(
        "dramulator: {} channel(s), queue depth {}, tCK {} ns, BL {}",
        memory.channel_count(),
        memory.queue_size(),
        memory.tck_ns(),
        memory.burst_length()
    );

    for clk in 0..cli.cycles {
        match &mut workload {
            Workload::Trace(trace) => trace.tick(&mut memory, clk),
            Workload::Random(random) => random.tick(&mut memory),
            Workload::Idle => {}
        }
        memory.clock_tick();
    }

    if let Workload::Trace(trace) = &workload {
        if !trace.done() {
            eprintln!("note: trace not exhausted after {} cycles", cli.cycles);
        }
    }

    memory.print_stats();
    println!(
        "host view: {} reads, {} writes returned",
        reads_done.get(),
        writes_done.get()
    );
}
