//! Transaction generators for standalone runs.
//!
//! Two host models drive the memory system when no integrated front-end is
//! present: a trace reader replaying `<hex-addr> <READ|WRITE> <cycle>` lines,
//! and a seeded random generator with a row-hit bias. Both offer at most one
//! transaction per cycle and retry while the target queue is full.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::process;

use dramulator_core::MemorySystem;
use dramulator_core::common::{Address, AddressMapper};
use dramulator_core::config::Config;

/// One parsed trace line.
struct TraceAccess {
    hex_addr: u64,
    is_write: bool,
    cycle: u64,
}

/// Replays a line-oriented access trace.
pub struct TraceWorkload {
    lines: Lines<BufReader<File>>,
    path: String,
    line_no: u64,
    pending: Option<TraceAccess>,
    finished: bool,
}

impl TraceWorkload {
    /// Opens the trace file, failing fast if it does not exist.
    pub fn new(path: &str) -> Self {
        let file = File::open(path).unwrap_or_else(|err| {
            eprintln!("cannot open trace file {path}: {err}");
            process::exit(1);
        });
        Self {
            lines: BufReader::new(file).lines(),
            path: path.to_string(),
            line_no: 0,
            pending: None,
            finished: false,
        }
    }

    /// Parses the next trace line, aborting on malformed input.
    fn next_access(&mut self) -> Option<TraceAccess> {
        loop {
            self.line_no += 1;
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(err) => {
                    eprintln!("{}:{}: read error: {err}", self.path, self.line_no);
                    process::exit(1);
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            return Some(self.parse(&line));
        }
    }

    fn parse(&self, line: &str) -> TraceAccess {
        let mut fields = line.split_whitespace();
        let (Some(addr), Some(kind), Some(cycle)) =
            (fields.next(), fields.next(), fields.next())
        else {
            eprintln!(
                "{}:{}: expected `<hex-addr> <READ|WRITE> <cycle>`, got `{line}`",
                self.path, self.line_no
            );
            process::exit(1);
        };
        let hex_addr = u64::from_str_radix(addr.trim_start_matches("0x"), 16)
            .unwrap_or_else(|err| {
                eprintln!("{}:{}: bad address `{addr}`: {err}", self.path, self.line_no);
                process::exit(1);
            });
        let is_write = match kind {
            "READ" => false,
            "WRITE" => true,
            other => {
                eprintln!(
                    "{}:{}: access type must be READ or WRITE, got `{other}`",
                    self.path, self.line_no
                );
                process::exit(1);
            }
        };
        let cycle = cycle.parse().unwrap_or_else(|err| {
            eprintln!("{}:{}: bad cycle `{cycle}`: {err}", self.path, self.line_no);
            process::exit(1);
        });
        TraceAccess {
            hex_addr,
            is_write,
            cycle,
        }
    }

    /// Offers the due transaction, if any, to the memory system.
    pub fn tick(&mut self, memory: &mut MemorySystem, clk: u64) {
        if self.finished {
            return;
        }
        if self.pending.is_none() {
            self.pending = self.next_access();
            if self.pending.is_none() {
                self.finished = true;
                return;
            }
        }
        if let Some(access) = &self.pending {
            if access.cycle <= clk
                && memory.will_accept_transaction(access.hex_addr, access.is_write)
                && memory.add_transaction(access.hex_addr, access.is_write)
            {
                self.pending = None;
            }
        }
    }

    /// True once the trace is exhausted and no transaction is pending.
    pub const fn done(&self) -> bool {
        self.finished
    }
}

/// Seeded random transaction generator with a row-hit bias.
pub struct RandomWorkload {
    mapper: AddressMapper,
    channels: usize,
    ranks: usize,
    bankgroups: usize,
    banks_per_group: usize,
    rows: u64,
    state: u64,
    last_addr: Address,
    pending: Option<(u64, bool)>,
}

impl RandomWorkload {
    /// Creates a generator for the configured geometry.
    pub fn new(config: &Config, seed: u64) -> Self {
        let mapper = AddressMapper::new(config).unwrap_or_else(|err| {
            eprintln!("configuration error: {err}");
            process::exit(1);
        });
        Self {
            mapper,
            channels: config.system.channels,
            ranks: config.ranks,
            bankgroups: config.bankgroups,
            banks_per_group: config.banks_per_group,
            rows: config.dram_structure.rows,
            state: seed.max(1),
            last_addr: Address::default(),
            pending: None,
        }
    }

    /// xorshift64; deterministic for a given seed.
    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn next_below(&mut self, bound: u64) -> u64 {
        self.next_u64() % bound.max(1)
    }

    /// Offers a fresh or retried transaction with probability 1/4 per cycle:
    /// 1-in-3 writes, 1-in-3 repeats of the previous address for row hits.
    pub fn tick(&mut self, memory: &mut MemorySystem) {
        if self.pending.is_none() {
            if self.next_below(4) != 0 {
                return;
            }
            let addr = if self.next_below(3) == 0 {
                self.last_addr
            } else {
                Address::new(
                    self.next_below(self.channels as u64) as usize,
                    self.next_below(self.ranks as u64) as usize,
                    self.next_below(self.bankgroups as u64) as usize,
                    self.next_below(self.banks_per_group as u64) as usize,
                    self.next_below(self.rows),
                    0,
                )
            };
            self.last_addr = addr;
            let is_write = self.next_below(3) == 0;
            self.pending = Some((self.mapper.encode(&addr), is_write));
        }
        if let Some((hex_addr, is_write)) = self.pending {
            if memory.will_accept_transaction(hex_addr, is_write)
                && memory.add_transaction(hex_addr, is_write)
            {
                self.pending = None;
            }
        }
    }
}
