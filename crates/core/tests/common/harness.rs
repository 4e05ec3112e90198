//! Test harness: reference configurations, a callback-capturing memory
//! wrapper, and a validation-trace parser.

use std::cell::RefCell;
use std::rc::Rc;

use dramulator_core::MemorySystem;
use dramulator_core::common::{Address, AddressMapper};
use dramulator_core::config::{Config, Protocol};

/// Small DDR4-style device: 2 ranks, 2 bank groups x 2 banks, CL 12,
/// tRCD 10, tRP 10, tRAS 24, BL 8.
pub fn ddr4_config() -> Config {
    let mut config = Config::default();
    config.dram_structure.protocol = Protocol::Ddr4;
    config.dram_structure.bankgroups = 2;
    config.dram_structure.banks_per_group = 2;
    config.dram_structure.rows = 1 << 14;
    config.dram_structure.columns = 1 << 8;
    config.dram_structure.device_width = 8;
    config.dram_structure.bl = 8;
    config.system.channels = 1;
    config.system.channel_size = 256;
    config.system.bus_width = 64;
    config.timing.al = 0;
    config.timing.cl = 12;
    config.timing.cwl = 12;
    config.timing.t_rcd = 10;
    config.timing.t_rp = 10;
    config.timing.t_ras = 24;
    config.finalize().unwrap();
    config
}

/// Single-rank HBM device: 4 bank groups x 4 banks, BL 4, split tRCD.
pub fn hbm_config() -> Config {
    let mut config = Config::default();
    config.dram_structure.protocol = Protocol::Hbm;
    config.dram_structure.bankgroups = 4;
    config.dram_structure.banks_per_group = 4;
    config.dram_structure.rows = 1 << 14;
    config.dram_structure.columns = 64;
    config.dram_structure.device_width = 128;
    config.dram_structure.bl = 4;
    config.system.channels = 1;
    config.system.channel_size = 512;
    config.system.bus_width = 128;
    config.finalize().unwrap();
    config
}

/// Memory system plus captured host callbacks.
pub struct TestMemory {
    /// Mapper matching the system's configuration, for building addresses.
    pub mapper: AddressMapper,
    /// The system under test.
    pub memory: MemorySystem,
    /// Addresses returned through the read callback, in retirement order.
    pub reads: Rc<RefCell<Vec<u64>>>,
    /// Addresses returned through the write callback, in retirement order.
    pub writes: Rc<RefCell<Vec<u64>>>,
}

impl TestMemory {
    /// Builds a memory system whose callbacks record into `reads`/`writes`.
    pub fn new(config: Config) -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let mapper = AddressMapper::new(&config).unwrap();
        let reads = Rc::new(RefCell::new(Vec::new()));
        let writes = Rc::new(RefCell::new(Vec::new()));
        let read_sink = Rc::clone(&reads);
        let write_sink = Rc::clone(&writes);
        let memory = MemorySystem::new(
            config,
            Box::new(move |addr| read_sink.borrow_mut().push(addr)),
            Box::new(move |addr| write_sink.borrow_mut().push(addr)),
        )
        .unwrap();
        Self {
            mapper,
            memory,
            reads,
            writes,
        }
    }

    /// Encodes and submits a transaction; returns the acceptance flag.
    pub fn add(&mut self, addr: &Address, is_write: bool) -> bool {
        let hex_addr = self.mapper.encode(addr);
        self.memory.add_transaction(hex_addr, is_write)
    }

    /// Ticks the whole system `cycles` times.
    pub fn run(&mut self, cycles: u64) {
        for _ in 0..cycles {
            self.memory.clock_tick();
        }
    }
}

/// One parsed validation-trace line.
#[derive(Clone, Debug)]
pub struct TraceLine {
    /// Issue cycle.
    pub clk: u64,
    /// Command name (`activate`, `read`, ...).
    pub cmd: String,
    /// Channel field.
    pub channel: u64,
    /// Rank field.
    pub rank: u64,
    /// Bank-group field.
    pub bankgroup: u64,
    /// Bank field.
    pub bank: u64,
    /// Row field.
    pub row: u64,
    /// Column field.
    pub column: u64,
}

/// Parses a validation trace file.
pub fn read_trace(path: &str) -> Vec<TraceLine> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            assert_eq!(fields.len(), 8, "malformed trace line: {line}");
            TraceLine {
                clk: fields[0].parse().unwrap(),
                cmd: fields[1].to_string(),
                channel: fields[2].parse().unwrap(),
                rank: fields[3].parse().unwrap(),
                bankgroup: fields[4].parse().unwrap(),
                bank: fields[5].parse().unwrap(),
                row: fields[6].parse().unwrap(),
                column: fields[7].parse().unwrap(),
            }
        })
        .collect()
}

/// First trace line with the given command name.
pub fn first<'a>(lines: &'a [TraceLine], cmd: &str) -> &'a TraceLine {
    lines
        .iter()
        .find(|line| line.cmd == cmd)
        .unwrap_or_else(|| panic!("no `{cmd}` in trace"))
}
