//! Memory-system front-end: transaction routing and the global clock.
//!
//! A `MemorySystem` owns one independent controller per channel, routes each
//! host transaction to the channel that owns its address, and fans the global
//! `clock_tick` out to every channel. Retired requests invoke the host's read
//! and write callbacks synchronously with the original 64-bit address; the
//! callbacks are plain function values owned by this instance, so multiple
//! memory systems can coexist.

use std::fmt;
use std::sync::Arc;

use crate::channel::controller::Controller;
use crate::common::addr::AddressMapper;
use crate::common::command::{Command, CommandKind};
use crate::common::error::ConfigError;
use crate::common::request::Request;
use crate::config::Config;
use crate::stats::ChannelStats;
use crate::timing::TimingTable;

/// Host callback receiving the original physical address of a retired
/// transaction.
pub type TransactionCallback = Box<dyn FnMut(u64)>;

/// Top-level JEDEC DRAM memory system.
pub struct MemorySystem {
    config: Arc<Config>,
    mapper: AddressMapper,
    controllers: Vec<Controller>,
    read_callback: TransactionCallback,
    write_callback: TransactionCallback,
    clk: u64,
}

impl fmt::Debug for MemorySystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySystem")
            .field("channels", &self.controllers.len())
            .field("clk", &self.clk)
            .finish_non_exhaustive()
    }
}

impl MemorySystem {
    /// Builds the memory system: address mapper, shared timing table, one
    /// controller per channel.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for HMC configs (that protocol is driven by
    /// its own link/crossbar front-end), unfinalized configs, malformed
    /// address mappings, or an unopenable validation-trace file.
    pub fn new(
        config: Config,
        read_callback: TransactionCallback,
        write_callback: TransactionCallback,
    ) -> Result<Self, ConfigError> {
        if config.dram_structure.protocol.is_hmc() {
            return Err(ConfigError::UnsupportedProtocol("HMC".to_string()));
        }
        if config.banks == 0 {
            return Err(ConfigError::Invalid(
                "configuration was not finalized (banks == 0)".to_string(),
            ));
        }
        let mapper = AddressMapper::new(&config)?;
        let config = Arc::new(config);
        let timing = Arc::new(TimingTable::new(&config));

        let mut controllers = Vec::with_capacity(config.system.channels);
        for channel in 0..config.system.channels {
            controllers.push(Controller::new(
                channel,
                Arc::clone(&config),
                Arc::clone(&timing),
            )?);
        }

        tracing::info!(
            protocol = ?config.dram_structure.protocol,
            channels = config.system.channels,
            ranks = config.ranks,
            bankgroups = config.bankgroups,
            banks_per_group = config.banks_per_group,
            "memory system constructed"
        );

        Ok(Self {
            config,
            mapper,
            controllers,
            read_callback,
            write_callback,
            clk: 0,
        })
    }

    /// Replaces the host callbacks.
    pub fn register_callbacks(
        &mut self,
        read_callback: TransactionCallback,
        write_callback: TransactionCallback,
    ) {
        self.read_callback = read_callback;
        self.write_callback = write_callback;
    }

    /// True iff the target channel's target queue has space. Pure.
    pub fn will_accept_transaction(&self, hex_addr: u64, is_write: bool) -> bool {
        let _ = is_write;
        let addr = self.mapper.decode(hex_addr);
        self.controllers[addr.channel].will_accept(&addr)
    }

    /// Enqueues a transaction; precede with [`Self::will_accept_transaction`].
    /// Returns false if the target queue is full.
    pub fn add_transaction(&mut self, hex_addr: u64, is_write: bool) -> bool {
        let addr = self.mapper.decode(hex_addr);
        let kind = if is_write {
            CommandKind::Write
        } else {
            CommandKind::Read
        };
        let req = Request::new(Command::new(kind, addr), hex_addr, self.clk);
        self.controllers[addr.channel].add_request(req)
    }

    /// Advances every channel by one DRAM clock and dispatches the callbacks
    /// of the requests they retired.
    pub fn clock_tick(&mut self) {
        for ctrl in &mut self.controllers {
            for retired in ctrl.clock_tick() {
                if retired.is_write {
                    (self.write_callback)(retired.hex_addr);
                } else {
                    (self.read_callback)(retired.hex_addr);
                }
            }
        }
        self.clk += 1;
    }

    /// Burst length (beats per column access).
    pub fn burst_length(&self) -> u64 {
        self.config.dram_structure.bl
    }

    /// Data-bus width in bits.
    pub fn bus_bits(&self) -> u64 {
        self.config.system.bus_width
    }

    /// Clock period in nanoseconds.
    pub fn tck_ns(&self) -> f64 {
        self.config.timing.tck
    }

    /// Capacity of each command queue.
    pub fn queue_size(&self) -> usize {
        self.config.system.queue_size
    }

    /// Number of independent channels.
    pub fn channel_count(&self) -> usize {
        self.controllers.len()
    }

    /// Current global clock.
    pub const fn clk(&self) -> u64 {
        self.clk
    }

    /// Statistics of one channel.
    pub fn channel_stats(&self, channel: usize) -> &ChannelStats {
        self.controllers[channel].stats()
    }

    /// Statistics summed over every channel.
    pub fn aggregate_stats(&self) -> ChannelStats {
        let mut total = ChannelStats::default();
        for ctrl in &self.controllers {
            total.merge(ctrl.stats());
        }
        total
    }

    /// Prints the aggregated statistics to stdout.
    pub fn print_stats(&self) {
        self.aggregate_stats().print("all channels", self.clk);
    }
}
