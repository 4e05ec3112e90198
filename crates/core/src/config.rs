//! Configuration system for the DRAM simulator.
//!
//! This module defines all configuration structures and enums used to
//! parameterize the simulator. It provides:
//! 1. **Sections:** Hierarchical config mirroring the canonical INI sections
//!    (`dram_structure`, `system`, `timing`, `power`, `other`).
//! 2. **Enums:** DRAM protocol, queue structure, and refresh policy.
//! 3. **Derived parameters:** Rank count, burst cycle, read/write delay,
//!    address-field widths, and per-command energy increments, computed by
//!    [`Config::finalize`] after deserialization.
//!
//! Configuration is supplied as JSON (`Config::from_json` / `from_file`) or
//! use `Config::default()` for the stock DDR3-style device.

use serde::Deserialize;

use crate::common::error::ConfigError;

/// Default configuration constants for the simulator.
///
/// These values define the baseline device when not explicitly overridden in
/// a configuration file. Timing values are in DRAM clock cycles.
mod defaults {
    /// Bank groups per rank.
    pub const BANKGROUPS: usize = 2;

    /// Banks per bank group.
    pub const BANKS_PER_GROUP: usize = 2;

    /// Rows per bank.
    pub const ROWS: u64 = 1 << 16;

    /// Columns per row.
    pub const COLUMNS: u64 = 1 << 10;

    /// DQ pins per device.
    pub const DEVICE_WIDTH: u64 = 8;

    /// Burst length (beats per column access).
    pub const BL: u64 = 8;

    /// Independent channels.
    pub const CHANNELS: usize = 1;

    /// Channel capacity in megabytes; rank count is derived from this.
    pub const CHANNEL_SIZE_MB: u64 = 1024;

    /// Data-bus width in bits.
    pub const BUS_WIDTH: u64 = 64;

    /// Address mapping string: six two-letter fields, rightmost at the
    /// least-significant bits above the burst offset.
    pub const ADDRESS_MAPPING: &str = "chrobabgraco";

    /// Pending transactions per command queue.
    pub const QUEUE_SIZE: usize = 16;

    /// Requests retired to the host per channel per cycle.
    pub const RETIRE_PER_CYCLE: usize = 1;

    /// Clock period in nanoseconds.
    pub const TCK_NS: f64 = 1.25;

    /// Row-hit ceiling before the aggressive-precharge policy may close a
    /// row that still has queued hits.
    pub const ROW_HIT_CAP: u32 = 4;

    /// Idle cycles before a rank is steered into self-refresh.
    pub const IDLE_CYCLES_FOR_SELF_REFRESH: u64 = 1000;

    /// Cycles between statistics epochs.
    pub const EPOCH_PERIOD: u64 = 100_000;
}

/// DRAM standard driven by the timing engine.
///
/// The protocol selects burst-cycle arithmetic, activation-window rules
/// (GDDR adds a 32-activation window), activate-to-column timings
/// (GDDR/HBM split tRCD by direction), and HBM dual command issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Deserialize)]
pub enum Protocol {
    /// DDR3 SDRAM.
    #[default]
    #[serde(rename = "DDR3")]
    Ddr3,
    /// DDR4 SDRAM.
    #[serde(rename = "DDR4")]
    Ddr4,
    /// Low-power DDR.
    #[serde(rename = "LPDDR")]
    Lpddr,
    /// LPDDR3.
    #[serde(rename = "LPDDR3")]
    Lpddr3,
    /// LPDDR4.
    #[serde(rename = "LPDDR4")]
    Lpddr4,
    /// GDDR5 graphics DRAM.
    #[serde(rename = "GDDR5")]
    Gddr5,
    /// GDDR5X graphics DRAM.
    #[serde(rename = "GDDR5X")]
    Gddr5x,
    /// High Bandwidth Memory.
    #[serde(rename = "HBM")]
    Hbm,
    /// High Bandwidth Memory 2.
    #[serde(rename = "HBM2")]
    Hbm2,
    /// Hybrid Memory Cube. Recognized but driven by an external front-end,
    /// not by the JEDEC memory system in this crate.
    #[serde(rename = "HMC")]
    Hmc,
}

impl Protocol {
    /// True for GDDR5 and GDDR5X.
    pub const fn is_gddr(self) -> bool {
        matches!(self, Self::Gddr5 | Self::Gddr5x)
    }

    /// True for HBM and HBM2.
    pub const fn is_hbm(self) -> bool {
        matches!(self, Self::Hbm | Self::Hbm2)
    }

    /// True for HMC.
    pub const fn is_hmc(self) -> bool {
        matches!(self, Self::Hmc)
    }
}

/// Command-queue layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Deserialize)]
pub enum QueueStructure {
    /// One queue per (rank, bankgroup, bank).
    #[default]
    #[serde(rename = "PER_BANK")]
    PerBank,
    /// One queue per rank.
    #[serde(rename = "PER_RANK")]
    PerRank,
}

/// Periodic refresh insertion policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Deserialize)]
pub enum RefreshPolicy {
    /// One rank-wide REFRESH every tREFI, rotating through ranks.
    #[default]
    #[serde(rename = "RANK_STAGGERED")]
    RankStaggered,
    /// One REFRESH_BANK every tREFIb, rotating through banks.
    #[serde(rename = "BANK_STAGGERED")]
    BankStaggered,
}

/// Root configuration: the five sections plus derived parameters.
///
/// Derived fields are populated by [`Config::finalize`], which
/// `Config::default()`, [`Config::from_json`], and [`Config::from_file`] all
/// run; construct-then-mutate callers must re-run it themselves.
///
/// # Examples
///
/// ```
/// use dramulator_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.burst_cycle, 4);                 // BL 8, non-GDDR
/// assert_eq!(config.read_delay, 12 + 4);             // CL + burst
/// assert_eq!(config.banks, 4);
/// ```
///
/// Deserializing a partial JSON config:
///
/// ```
/// use dramulator_core::config::{Config, Protocol};
///
/// let json = r#"{
///     "dram_structure": { "protocol": "DDR4", "bankgroups": 4, "banks_per_group": 4 },
///     "system": { "channels": 2, "queue_size": 8 },
///     "timing": { "CL": 16, "CWL": 12, "tRCD": 16, "tRP": 16 }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.dram_structure.protocol, Protocol::Ddr4);
/// assert_eq!(config.banks, 16);
/// assert_eq!(config.read_delay, 16 + 4);
/// ```
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// Device geometry and protocol.
    #[serde(default)]
    pub dram_structure: DramConfig,
    /// Channel count, bus, queueing, and address mapping.
    #[serde(default)]
    pub system: SystemConfig,
    /// JEDEC timing parameters, in DRAM cycles.
    #[serde(default)]
    pub timing: TimingConfig,
    /// IDD currents and VDD for the energy model.
    #[serde(default)]
    pub power: PowerConfig,
    /// Tracing, refresh policy, self-refresh, and precharge policy knobs.
    #[serde(default)]
    pub other: OtherConfig,

    /// Effective bank groups per rank (1 when grouping is disabled).
    #[serde(skip)]
    pub bankgroups: usize,
    /// Effective banks per bank group (absorbs disabled grouping).
    #[serde(skip)]
    pub banks_per_group: usize,
    /// Total banks per rank.
    #[serde(skip)]
    pub banks: usize,
    /// Ranks per channel, derived from `channel_size`.
    #[serde(skip)]
    pub ranks: usize,
    /// Bus cycles consumed by one burst (BL/2; BL/4 GDDR5; BL/8 GDDR5X).
    #[serde(skip)]
    pub burst_cycle: u64,
    /// Read latency RL = AL + CL.
    #[serde(skip)]
    pub rl: u64,
    /// Write latency WL = AL + CWL.
    #[serde(skip)]
    pub wl: u64,
    /// Cycles from column-read issue to the last data beat (RL + burst).
    #[serde(skip)]
    pub read_delay: u64,
    /// Cycles from column-write issue to the last data beat (WL + burst).
    #[serde(skip)]
    pub write_delay: u64,
    /// Row cycle time tRC = tRAS + tRP.
    #[serde(skip)]
    pub t_rc: u64,
    /// Channel field width in address bits.
    #[serde(skip)]
    pub channel_width: u32,
    /// Rank field width in address bits.
    #[serde(skip)]
    pub rank_width: u32,
    /// Bank-group field width in address bits.
    #[serde(skip)]
    pub bankgroup_width: u32,
    /// Bank field width in address bits.
    #[serde(skip)]
    pub bank_width: u32,
    /// Row field width in address bits.
    #[serde(skip)]
    pub row_width: u32,
    /// Column field width in address bits, shortened by the burst bits.
    #[serde(skip)]
    pub column_width: u32,
    /// Low address bits discarded as burst offset.
    #[serde(skip)]
    pub shift_bits: u32,
    /// Energy per ACTIVATE/PRECHARGE pair, pJ.
    #[serde(skip)]
    pub act_energy_inc: f64,
    /// Energy per READ burst, pJ.
    #[serde(skip)]
    pub read_energy_inc: f64,
    /// Energy per WRITE burst, pJ.
    #[serde(skip)]
    pub write_energy_inc: f64,
    /// Energy per rank-wide REFRESH, pJ.
    #[serde(skip)]
    pub ref_energy_inc: f64,
    /// Energy per REFRESH_BANK, pJ.
    #[serde(skip)]
    pub refb_energy_inc: f64,
    /// Active-standby energy per rank-cycle, pJ.
    #[serde(skip)]
    pub act_stb_energy_inc: f64,
    /// Precharge-standby energy per rank-cycle, pJ.
    #[serde(skip)]
    pub pre_stb_energy_inc: f64,
    /// Self-refresh energy per rank-cycle, pJ.
    #[serde(skip)]
    pub sref_energy_inc: f64,
}

impl Default for Config {
    fn default() -> Self {
        let mut config = Self {
            dram_structure: DramConfig::default(),
            system: SystemConfig::default(),
            timing: TimingConfig::default(),
            power: PowerConfig::default(),
            other: OtherConfig::default(),
            bankgroups: 0,
            banks_per_group: 0,
            banks: 0,
            ranks: 0,
            burst_cycle: 0,
            rl: 0,
            wl: 0,
            read_delay: 0,
            write_delay: 0,
            t_rc: 0,
            channel_width: 0,
            rank_width: 0,
            bankgroup_width: 0,
            bank_width: 0,
            row_width: 0,
            column_width: 0,
            shift_bits: 0,
            act_energy_inc: 0.0,
            read_energy_inc: 0.0,
            write_energy_inc: 0.0,
            ref_energy_inc: 0.0,
            refb_energy_inc: 0.0,
            act_stb_energy_inc: 0.0,
            pre_stb_energy_inc: 0.0,
            sref_energy_inc: 0.0,
        };
        if let Err(err) = config.finalize() {
            // The built-in defaults are internally consistent.
            panic!("default configuration failed to finalize: {err}");
        }
        config
    }
}

/// Floor of log2; 0 for inputs below 2. Matches the bit-width arithmetic of
/// the address mapper.
fn log2_floor(value: u64) -> u32 {
    if value < 2 { 0 } else { 63 - value.leading_zeros() }
}

impl Config {
    /// Parses a JSON configuration and computes derived parameters.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] on malformed JSON or inconsistent values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_str(json)?;
        config.finalize()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Computes every derived parameter from the section values.
    ///
    /// Safe to call repeatedly; the sections themselves are never mutated.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a structural parameter is zero, the
    /// device width does not divide the bus width, or the burst length is
    /// too short for the protocol's burst-cycle arithmetic.
    pub fn finalize(&mut self) -> Result<(), ConfigError> {
        let d = &self.dram_structure;
        let s = &self.system;
        for (name, value) in [
            ("channels", s.channels as u64),
            ("bankgroups", d.bankgroups as u64),
            ("banks_per_group", d.banks_per_group as u64),
            ("rows", d.rows),
            ("columns", d.columns),
            ("device_width", d.device_width),
            ("bus_width", s.bus_width),
            ("BL", d.bl),
            ("queue_size", s.queue_size as u64),
            ("channel_size", s.channel_size),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be non-zero")));
            }
        }
        if s.bus_width % d.device_width != 0 {
            return Err(ConfigError::Invalid(format!(
                "device_width {} does not divide bus_width {}",
                d.device_width, s.bus_width
            )));
        }

        // Disabled bank grouping aggregates all banks into one group; the
        // timing table then substitutes short timings for long.
        if d.bankgroup_enable {
            self.bankgroups = d.bankgroups;
            self.banks_per_group = d.banks_per_group;
        } else {
            self.bankgroups = 1;
            self.banks_per_group = d.banks_per_group * d.bankgroups;
        }
        self.banks = self.bankgroups * self.banks_per_group;

        self.burst_cycle = match d.protocol {
            Protocol::Gddr5 => d.bl / 4,
            Protocol::Gddr5x => d.bl / 8,
            _ => d.bl / 2,
        };
        if self.burst_cycle == 0 {
            return Err(ConfigError::Invalid(format!(
                "burst length {} is too short for {:?}",
                d.bl, d.protocol
            )));
        }
        self.rl = self.timing.al + self.timing.cl;
        self.wl = self.timing.al + self.timing.cwl;
        self.read_delay = self.rl + self.burst_cycle;
        self.write_delay = self.wl + self.burst_cycle;
        self.t_rc = self.timing.t_ras + self.timing.t_rp;

        self.compute_ranks();
        self.compute_address_widths();
        self.compute_energy_increments();
        Ok(())
    }

    /// Derives the rank count from the requested channel capacity and the
    /// per-rank capacity implied by the device geometry.
    fn compute_ranks(&mut self) {
        let d = &self.dram_structure;
        let devices_per_rank = self.system.bus_width / d.device_width;

        // Column prefetch differs per family: each GDDR column access moves
        // device_width * BL bits, HBM prefetches 2n.
        let cells = if d.protocol.is_gddr() {
            d.rows * d.columns * d.bl
        } else if d.protocol.is_hbm() {
            d.rows * d.columns * 2
        } else {
            d.rows * d.columns
        };
        let megs_per_bank = (cells >> 20) * d.device_width / 8;
        let megs_per_rank = megs_per_bank * self.banks as u64 * devices_per_rank;

        if megs_per_rank > self.system.channel_size {
            tracing::warn!(
                requested_mb = self.system.channel_size,
                rank_mb = megs_per_rank,
                "channel_size is smaller than one rank; using a single rank"
            );
            self.ranks = 1;
        } else {
            self.ranks = (self.system.channel_size / megs_per_rank) as usize;
        }
    }

    /// Derives the bit position arithmetic feeding the address mapper.
    fn compute_address_widths(&mut self) {
        let d = &self.dram_structure;
        self.channel_width = log2_floor(self.system.channels as u64);
        self.rank_width = log2_floor(self.ranks as u64);
        self.bankgroup_width = log2_floor(self.bankgroups as u64);
        self.bank_width = log2_floor(self.banks_per_group as u64);
        self.row_width = log2_floor(d.rows);

        // One transaction moves bus_bytes * BL bytes; those low bits carry
        // no field, and the column field loses the burst-length bits.
        let bytes_offset = log2_floor(self.system.bus_width / 8);
        let transaction_bytes = self.system.bus_width / 8 * d.bl;
        self.shift_bits = log2_floor(transaction_bytes);
        self.column_width = log2_floor(d.columns) - (self.shift_bits - bytes_offset);
    }

    /// Derives per-command and per-cycle energy increments (pJ) from the IDD
    /// currents: mA x V x ns.
    fn compute_energy_increments(&mut self) {
        let p = &self.power;
        let t = &self.timing;
        let devices = (self.system.bus_width / self.dram_structure.device_width) as f64;
        let scale = p.vdd * self.timing.tck * devices;

        self.act_energy_inc = scale
            * (p.idd0 * self.t_rc as f64
                - (p.idd3n * t.t_ras as f64 + p.idd2n * t.t_rp as f64));
        self.read_energy_inc = scale * (p.idd4r - p.idd3n) * self.burst_cycle as f64;
        self.write_energy_inc = scale * (p.idd4w - p.idd3n) * self.burst_cycle as f64;
        self.ref_energy_inc = scale * (p.idd5ab - p.idd3n) * t.t_rfc as f64;
        self.refb_energy_inc = scale * (p.idd5pb - p.idd3n) * t.t_rfcb as f64;
        self.act_stb_energy_inc = scale * p.idd3n;
        self.pre_stb_energy_inc = scale * p.idd2n;
        self.sref_energy_inc = scale * p.idd6x;
    }
}

/// Device geometry and protocol (`dram_structure` section).
#[derive(Clone, Debug, Deserialize)]
pub struct DramConfig {
    /// DRAM standard.
    #[serde(default)]
    pub protocol: Protocol,

    /// Bank groups per rank.
    #[serde(default = "DramConfig::default_bankgroups")]
    pub bankgroups: usize,

    /// Banks per bank group.
    #[serde(default = "DramConfig::default_banks_per_group")]
    pub banks_per_group: usize,

    /// Rows per bank.
    #[serde(default = "DramConfig::default_rows")]
    pub rows: u64,

    /// Columns per row.
    #[serde(default = "DramConfig::default_columns")]
    pub columns: u64,

    /// DQ pins per device.
    #[serde(default = "DramConfig::default_device_width")]
    pub device_width: u64,

    /// Burst length (beats per column access).
    #[serde(default = "DramConfig::default_bl", rename = "BL")]
    pub bl: u64,

    /// When false, all banks collapse into a single group and short timings
    /// replace long ones.
    #[serde(default = "DramConfig::default_bankgroup_enable")]
    pub bankgroup_enable: bool,
}

impl DramConfig {
    /// Returns the default bank-group count.
    fn default_bankgroups() -> usize {
        defaults::BANKGROUPS
    }

    /// Returns the default banks per group.
    fn default_banks_per_group() -> usize {
        defaults::BANKS_PER_GROUP
    }

    /// Returns the default rows per bank.
    fn default_rows() -> u64 {
        defaults::ROWS
    }

    /// Returns the default columns per row.
    fn default_columns() -> u64 {
        defaults::COLUMNS
    }

    /// Returns the default device width.
    fn default_device_width() -> u64 {
        defaults::DEVICE_WIDTH
    }

    /// Returns the default burst length.
    fn default_bl() -> u64 {
        defaults::BL
    }

    /// Bank grouping is enabled by default.
    fn default_bankgroup_enable() -> bool {
        true
    }
}

impl Default for DramConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::default(),
            bankgroups: defaults::BANKGROUPS,
            banks_per_group: defaults::BANKS_PER_GROUP,
            rows: defaults::ROWS,
            columns: defaults::COLUMNS,
            device_width: defaults::DEVICE_WIDTH,
            bl: defaults::BL,
            bankgroup_enable: true,
        }
    }
}

/// Channel count, bus, queueing, and address mapping (`system` section).
#[derive(Clone, Debug, Deserialize)]
pub struct SystemConfig {
    /// Independent channels.
    #[serde(default = "SystemConfig::default_channels")]
    pub channels: usize,

    /// Channel capacity in megabytes; rank count is derived from this.
    #[serde(default = "SystemConfig::default_channel_size")]
    pub channel_size: u64,

    /// Data-bus width in bits.
    #[serde(default = "SystemConfig::default_bus_width")]
    pub bus_width: u64,

    /// Six two-letter fields from {ch, ra, bg, ba, ro, co}; rightmost field
    /// occupies the least-significant bits above the burst offset.
    #[serde(default = "SystemConfig::default_address_mapping")]
    pub address_mapping: String,

    /// Command-queue layout.
    #[serde(default)]
    pub queue_structure: QueueStructure,

    /// Pending transactions per command queue.
    #[serde(default = "SystemConfig::default_queue_size")]
    pub queue_size: usize,

    /// When true, transactions that find their queue full park in an
    /// unbounded buffer instead of being rejected.
    #[serde(default)]
    pub req_buffering_enabled: bool,

    /// Requests retired to the host per channel per cycle.
    #[serde(default = "SystemConfig::default_retire_per_cycle")]
    pub retire_per_cycle: usize,
}

impl SystemConfig {
    /// Returns the default channel count.
    fn default_channels() -> usize {
        defaults::CHANNELS
    }

    /// Returns the default channel capacity in megabytes.
    fn default_channel_size() -> u64 {
        defaults::CHANNEL_SIZE_MB
    }

    /// Returns the default bus width in bits.
    fn default_bus_width() -> u64 {
        defaults::BUS_WIDTH
    }

    /// Returns the default address-mapping string.
    fn default_address_mapping() -> String {
        defaults::ADDRESS_MAPPING.to_string()
    }

    /// Returns the default queue capacity.
    fn default_queue_size() -> usize {
        defaults::QUEUE_SIZE
    }

    /// Returns the default retirement rate.
    fn default_retire_per_cycle() -> usize {
        defaults::RETIRE_PER_CYCLE
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            channels: defaults::CHANNELS,
            channel_size: defaults::CHANNEL_SIZE_MB,
            bus_width: defaults::BUS_WIDTH,
            address_mapping: defaults::ADDRESS_MAPPING.to_string(),
            queue_structure: QueueStructure::default(),
            queue_size: defaults::QUEUE_SIZE,
            req_buffering_enabled: false,
            retire_per_cycle: defaults::RETIRE_PER_CYCLE,
        }
    }
}

/// JEDEC timing parameters in DRAM cycles (`timing` section).
///
/// Field names keep the canonical JEDEC spelling in serialized form. The
/// defaults describe a plausible DDR3-1600-class device and exist so partial
/// configs stay usable; real runs should specify the full section.
#[derive(Clone, Debug, Deserialize)]
pub struct TimingConfig {
    /// Clock period in nanoseconds.
    #[serde(default = "TimingConfig::default_tck", rename = "tCK")]
    pub tck: f64,

    /// Additive latency.
    #[serde(default, rename = "AL")]
    pub al: u64,

    /// CAS (column read) latency.
    #[serde(default = "TimingConfig::default_cl", rename = "CL")]
    pub cl: u64,

    /// CAS write latency.
    #[serde(default = "TimingConfig::default_cwl", rename = "CWL")]
    pub cwl: u64,

    /// Column-to-column delay, same bank group.
    #[serde(default = "TimingConfig::default_t_ccd_l", rename = "tCCD_L")]
    pub t_ccd_l: u64,

    /// Column-to-column delay, different bank group.
    #[serde(default = "TimingConfig::default_t_ccd_s", rename = "tCCD_S")]
    pub t_ccd_s: u64,

    /// Rank-to-rank switching time.
    #[serde(default = "TimingConfig::default_t_rtrs", rename = "tRTRS")]
    pub t_rtrs: u64,

    /// Read-to-precharge delay.
    #[serde(default = "TimingConfig::default_t_rtp", rename = "tRTP")]
    pub t_rtp: u64,

    /// Write-to-read turnaround, same bank group.
    #[serde(default = "TimingConfig::default_t_wtr_l", rename = "tWTR_L")]
    pub t_wtr_l: u64,

    /// Write-to-read turnaround, different bank group.
    #[serde(default = "TimingConfig::default_t_wtr_s", rename = "tWTR_S")]
    pub t_wtr_s: u64,

    /// Write recovery time.
    #[serde(default = "TimingConfig::default_t_wr", rename = "tWR")]
    pub t_wr: u64,

    /// Row precharge time.
    #[serde(default = "TimingConfig::default_t_rp", rename = "tRP")]
    pub t_rp: u64,

    /// Activate-to-activate delay, same bank group.
    #[serde(default = "TimingConfig::default_t_rrd_l", rename = "tRRD_L")]
    pub t_rrd_l: u64,

    /// Activate-to-activate delay, different bank group.
    #[serde(default = "TimingConfig::default_t_rrd_s", rename = "tRRD_S")]
    pub t_rrd_s: u64,

    /// Row active time.
    #[serde(default = "TimingConfig::default_t_ras", rename = "tRAS")]
    pub t_ras: u64,

    /// Row-to-column delay.
    #[serde(default = "TimingConfig::default_t_rcd", rename = "tRCD")]
    pub t_rcd: u64,

    /// Rank refresh cycle time.
    #[serde(default = "TimingConfig::default_t_rfc", rename = "tRFC")]
    pub t_rfc: u64,

    /// Bank refresh cycle time.
    #[serde(default = "TimingConfig::default_t_rfcb", rename = "tRFCb")]
    pub t_rfcb: u64,

    /// Refresh-to-refresh delay between banks.
    #[serde(default = "TimingConfig::default_t_rrefd", rename = "tRREFD")]
    pub t_rrefd: u64,

    /// Rank refresh interval.
    #[serde(default = "TimingConfig::default_t_refi", rename = "tREFI")]
    pub t_refi: u64,

    /// Bank refresh interval.
    #[serde(default = "TimingConfig::default_t_refib", rename = "tREFIb")]
    pub t_refib: u64,

    /// Minimum self-refresh residency.
    #[serde(default = "TimingConfig::default_t_ckesr", rename = "tCKESR")]
    pub t_ckesr: u64,

    /// Self-refresh exit to first valid command.
    #[serde(default = "TimingConfig::default_t_xs", rename = "tXS")]
    pub t_xs: u64,

    /// Four-activation window.
    #[serde(default = "TimingConfig::default_t_faw", rename = "tFAW")]
    pub t_faw: u64,

    /// Read preamble.
    #[serde(default = "TimingConfig::default_t_rpre", rename = "tRPRE")]
    pub t_rpre: u64,

    /// Write preamble.
    #[serde(default = "TimingConfig::default_t_wpre", rename = "tWPRE")]
    pub t_wpre: u64,

    /// Precharge-to-precharge delay (LPDDR4/GDDR).
    #[serde(default, rename = "tPPD")]
    pub t_ppd: u64,

    /// Thirty-two-activation window (GDDR).
    #[serde(default = "TimingConfig::default_t_32aw", rename = "t32AW")]
    pub t_32aw: u64,

    /// Activate-to-read delay (GDDR/HBM split tRCD by direction).
    #[serde(default = "TimingConfig::default_t_rcdrd", rename = "tRCDRD")]
    pub t_rcdrd: u64,

    /// Activate-to-write delay (GDDR/HBM split tRCD by direction).
    #[serde(default = "TimingConfig::default_t_rcdwr", rename = "tRCDWR")]
    pub t_rcdwr: u64,
}

impl TimingConfig {
    /// Returns the default clock period in nanoseconds.
    fn default_tck() -> f64 {
        defaults::TCK_NS
    }

    /// Returns the default CAS latency.
    fn default_cl() -> u64 {
        12
    }

    /// Returns the default CAS write latency.
    fn default_cwl() -> u64 {
        12
    }

    /// Returns the default long column-to-column delay.
    fn default_t_ccd_l() -> u64 {
        6
    }

    /// Returns the default short column-to-column delay.
    fn default_t_ccd_s() -> u64 {
        4
    }

    /// Returns the default rank-to-rank switching time.
    fn default_t_rtrs() -> u64 {
        2
    }

    /// Returns the default read-to-precharge delay.
    fn default_t_rtp() -> u64 {
        5
    }

    /// Returns the default long write-to-read turnaround.
    fn default_t_wtr_l() -> u64 {
        5
    }

    /// Returns the default short write-to-read turnaround.
    fn default_t_wtr_s() -> u64 {
        5
    }

    /// Returns the default write recovery time.
    fn default_t_wr() -> u64 {
        10
    }

    /// Returns the default row precharge time.
    fn default_t_rp() -> u64 {
        10
    }

    /// Returns the default long activate-to-activate delay.
    fn default_t_rrd_l() -> u64 {
        4
    }

    /// Returns the default short activate-to-activate delay.
    fn default_t_rrd_s() -> u64 {
        4
    }

    /// Returns the default row active time.
    fn default_t_ras() -> u64 {
        24
    }

    /// Returns the default row-to-column delay.
    fn default_t_rcd() -> u64 {
        10
    }

    /// Returns the default rank refresh cycle time.
    fn default_t_rfc() -> u64 {
        74
    }

    /// Returns the default bank refresh cycle time.
    fn default_t_rfcb() -> u64 {
        20
    }

    /// Returns the default bank-to-bank refresh delay.
    fn default_t_rrefd() -> u64 {
        5
    }

    /// Returns the default rank refresh interval.
    fn default_t_refi() -> u64 {
        7800
    }

    /// Returns the default bank refresh interval.
    fn default_t_refib() -> u64 {
        1950
    }

    /// Returns the default minimum self-refresh residency.
    fn default_t_ckesr() -> u64 {
        50
    }

    /// Returns the default self-refresh exit delay.
    fn default_t_xs() -> u64 {
        10
    }

    /// Returns the default four-activation window.
    fn default_t_faw() -> u64 {
        50
    }

    /// Returns the default read preamble.
    fn default_t_rpre() -> u64 {
        1
    }

    /// Returns the default write preamble.
    fn default_t_wpre() -> u64 {
        1
    }

    /// Returns the default 32-activation window.
    fn default_t_32aw() -> u64 {
        330
    }

    /// Returns the default activate-to-read delay.
    fn default_t_rcdrd() -> u64 {
        24
    }

    /// Returns the default activate-to-write delay.
    fn default_t_rcdwr() -> u64 {
        20
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tck: defaults::TCK_NS,
            al: 0,
            cl: Self::default_cl(),
            cwl: Self::default_cwl(),
            t_ccd_l: Self::default_t_ccd_l(),
            t_ccd_s: Self::default_t_ccd_s(),
            t_rtrs: Self::default_t_rtrs(),
            t_rtp: Self::default_t_rtp(),
            t_wtr_l: Self::default_t_wtr_l(),
            t_wtr_s: Self::default_t_wtr_s(),
            t_wr: Self::default_t_wr(),
            t_rp: Self::default_t_rp(),
            t_rrd_l: Self::default_t_rrd_l(),
            t_rrd_s: Self::default_t_rrd_s(),
            t_ras: Self::default_t_ras(),
            t_rcd: Self::default_t_rcd(),
            t_rfc: Self::default_t_rfc(),
            t_rfcb: Self::default_t_rfcb(),
            t_rrefd: Self::default_t_rrefd(),
            t_refi: Self::default_t_refi(),
            t_refib: Self::default_t_refib(),
            t_ckesr: Self::default_t_ckesr(),
            t_xs: Self::default_t_xs(),
            t_faw: Self::default_t_faw(),
            t_rpre: Self::default_t_rpre(),
            t_wpre: Self::default_t_wpre(),
            t_ppd: 0,
            t_32aw: Self::default_t_32aw(),
            t_rcdrd: Self::default_t_rcdrd(),
            t_rcdwr: Self::default_t_rcdwr(),
        }
    }
}

/// IDD currents (mA) and VDD (V) for the energy model (`power` section).
///
/// Defaults approximate a DDR3-1600 x8 datasheet.
#[derive(Clone, Debug, Deserialize)]
pub struct PowerConfig {
    /// Supply voltage.
    #[serde(default = "PowerConfig::default_vdd", rename = "VDD")]
    pub vdd: f64,

    /// Activate-precharge current.
    #[serde(default = "PowerConfig::default_idd0", rename = "IDD0")]
    pub idd0: f64,

    /// Precharge-standby current.
    #[serde(default = "PowerConfig::default_idd2n", rename = "IDD2N")]
    pub idd2n: f64,

    /// Precharge-powerdown current.
    #[serde(default = "PowerConfig::default_idd2p", rename = "IDD2P")]
    pub idd2p: f64,

    /// Active-standby current.
    #[serde(default = "PowerConfig::default_idd3n", rename = "IDD3N")]
    pub idd3n: f64,

    /// Burst-read current.
    #[serde(default = "PowerConfig::default_idd4r", rename = "IDD4R")]
    pub idd4r: f64,

    /// Burst-write current.
    #[serde(default = "PowerConfig::default_idd4w", rename = "IDD4W")]
    pub idd4w: f64,

    /// All-bank refresh current.
    #[serde(default = "PowerConfig::default_idd5ab", rename = "IDD5AB")]
    pub idd5ab: f64,

    /// Per-bank refresh current.
    #[serde(default = "PowerConfig::default_idd5pb", rename = "IDD5PB")]
    pub idd5pb: f64,

    /// Self-refresh current.
    #[serde(default = "PowerConfig::default_idd6x", rename = "IDD6x")]
    pub idd6x: f64,
}

impl PowerConfig {
    /// Returns the default supply voltage.
    fn default_vdd() -> f64 {
        1.35
    }

    /// Returns the default activate-precharge current.
    fn default_idd0() -> f64 {
        48.0
    }

    /// Returns the default precharge-standby current.
    fn default_idd2n() -> f64 {
        25.0
    }

    /// Returns the default precharge-powerdown current.
    fn default_idd2p() -> f64 {
        17.0
    }

    /// Returns the default active-standby current.
    fn default_idd3n() -> f64 {
        38.0
    }

    /// Returns the default burst-read current.
    fn default_idd4r() -> f64 {
        147.0
    }

    /// Returns the default burst-write current.
    fn default_idd4w() -> f64 {
        118.0
    }

    /// Returns the default all-bank refresh current.
    fn default_idd5ab() -> f64 {
        250.0
    }

    /// Returns the default per-bank refresh current.
    fn default_idd5pb() -> f64 {
        64.0
    }

    /// Returns the default self-refresh current.
    fn default_idd6x() -> f64 {
        20.0
    }
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            vdd: Self::default_vdd(),
            idd0: Self::default_idd0(),
            idd2n: Self::default_idd2n(),
            idd2p: Self::default_idd2p(),
            idd3n: Self::default_idd3n(),
            idd4r: Self::default_idd4r(),
            idd4w: Self::default_idd4w(),
            idd5ab: Self::default_idd5ab(),
            idd5pb: Self::default_idd5pb(),
            idd6x: Self::default_idd6x(),
        }
    }
}

/// Tracing, refresh policy, self-refresh, and precharge policy (`other`
/// section).
#[derive(Clone, Debug, Deserialize)]
pub struct OtherConfig {
    /// Path for the validation command trace; empty disables it.
    #[serde(default)]
    pub validation_output: String,

    /// Cycles between statistics epochs.
    #[serde(default = "OtherConfig::default_epoch_period")]
    pub epoch_period: u64,

    /// Periodic refresh insertion policy.
    #[serde(default)]
    pub refresh_policy: RefreshPolicy,

    /// Steer long-idle ranks into self-refresh.
    #[serde(default)]
    pub enable_self_refresh: bool,

    /// Idle cycles before a rank is steered into self-refresh.
    #[serde(default = "OtherConfig::default_idle_cycles")]
    pub idle_cycles_for_self_refresh: u64,

    /// Close open rows nobody is queued for.
    #[serde(default)]
    pub aggressive_precharging_enabled: bool,

    /// Row-hit ceiling before aggressive precharge may close a row that
    /// still has queued hits.
    #[serde(default = "OtherConfig::default_row_hit_cap")]
    pub row_hit_cap: u32,
}

impl OtherConfig {
    /// Returns the default epoch period.
    fn default_epoch_period() -> u64 {
        defaults::EPOCH_PERIOD
    }

    /// Returns the default self-refresh idle threshold.
    fn default_idle_cycles() -> u64 {
        defaults::IDLE_CYCLES_FOR_SELF_REFRESH
    }

    /// Returns the default row-hit cap.
    fn default_row_hit_cap() -> u32 {
        defaults::ROW_HIT_CAP
    }
}

impl Default for OtherConfig {
    fn default() -> Self {
        Self {
            validation_output: String::new(),
            epoch_period: defaults::EPOCH_PERIOD,
            refresh_policy: RefreshPolicy::default(),
            enable_self_refresh: false,
            idle_cycles_for_self_refresh: defaults::IDLE_CYCLES_FOR_SELF_REFRESH,
            aggressive_precharging_enabled: false,
            row_hit_cap: defaults::ROW_HIT_CAP,
        }
    }
}
