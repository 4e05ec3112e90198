//! Per-channel statistics collection and reporting.
//!
//! This module tracks behavioral and energy metrics for one channel. It
//! provides:
//! 1. **Command counts:** Issued commands by kind.
//! 2. **Energy:** Per-command energy plus background standby/self-refresh
//!    energy, accumulated from the configured IDD increments (pJ).
//! 3. **Scheduler behavior:** HBM dual-issue cycles and row hits served
//!    while a refresh was waiting.
//! 4. **Latency:** Completed read/write counts and an access-latency
//!    aggregate (count/sum/min/max).

use crate::common::command::CommandKind;
use crate::config::Config;

/// Aggregate over observed access latencies, in cycles.
#[derive(Clone, Copy, Debug, Default)]
pub struct LatencyStats {
    /// Number of recorded accesses.
    pub count: u64,
    /// Sum of latencies.
    pub sum: u64,
    /// Smallest observed latency (0 until anything is recorded).
    pub min: u64,
    /// Largest observed latency.
    pub max: u64,
}

impl LatencyStats {
    /// Records one access latency.
    pub fn record(&mut self, latency: u64) {
        if self.count == 0 || latency < self.min {
            self.min = latency;
        }
        self.max = self.max.max(latency);
        self.count += 1;
        self.sum += latency;
    }

    /// Mean latency in cycles, or 0.0 before any access completes.
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum as f64 / self.count as f64
        }
    }
}

/// Statistics for one channel (summed across channels for reporting).
#[derive(Clone, Debug, Default)]
pub struct ChannelStats {
    /// READ / READ_PRECHARGE commands issued.
    pub num_read_cmds: u64,
    /// WRITE / WRITE_PRECHARGE commands issued.
    pub num_write_cmds: u64,
    /// ACTIVATE commands issued.
    pub num_act_cmds: u64,
    /// PRECHARGE commands issued.
    pub num_pre_cmds: u64,
    /// Rank-wide REFRESH commands issued.
    pub num_refresh_cmds: u64,
    /// REFRESH_BANK commands issued.
    pub num_refresh_bank_cmds: u64,
    /// SELF_REFRESH_ENTER commands issued.
    pub num_sref_enter_cmds: u64,
    /// SELF_REFRESH_EXIT commands issued.
    pub num_sref_exit_cmds: u64,

    /// Cycles in which an HBM channel issued two commands.
    pub hbm_dual_command_issue_cycles: u64,
    /// Row-hit column commands issued to banks with a refresh waiting;
    /// bounds refresh starvation in tests.
    pub rw_rowhits_pending_refresh: u64,

    /// Rank-cycles with every bank closed.
    pub all_bank_idle_cycles: u64,
    /// Rank-cycles with at least one open row.
    pub active_cycles: u64,
    /// Rank-cycles spent in self-refresh.
    pub sref_cycles: u64,

    /// ACTIVATE/PRECHARGE pair energy, pJ.
    pub act_energy: f64,
    /// READ burst energy, pJ.
    pub read_energy: f64,
    /// WRITE burst energy, pJ.
    pub write_energy: f64,
    /// Rank refresh energy, pJ.
    pub ref_energy: f64,
    /// Bank refresh energy, pJ.
    pub refb_energy: f64,
    /// Active standby energy, pJ.
    pub act_stb_energy: f64,
    /// Precharge standby energy, pJ.
    pub pre_stb_energy: f64,
    /// Self-refresh energy, pJ.
    pub sref_energy: f64,

    /// Read transactions returned to the host.
    pub reads_done: u64,
    /// Write transactions returned to the host.
    pub writes_done: u64,
    /// Latency aggregate over completed transactions.
    pub access_latency: LatencyStats,
}

impl ChannelStats {
    /// Counts an issued command and accrues its energy increment.
    pub fn record_command(&mut self, kind: CommandKind, config: &Config) {
        match kind {
            CommandKind::Read | CommandKind::ReadPrecharge => {
                self.num_read_cmds += 1;
                self.read_energy += config.read_energy_inc;
            }
            CommandKind::Write | CommandKind::WritePrecharge => {
                self.num_write_cmds += 1;
                self.write_energy += config.write_energy_inc;
            }
            CommandKind::Activate => {
                self.num_act_cmds += 1;
                self.act_energy += config.act_energy_inc;
            }
            CommandKind::Precharge => self.num_pre_cmds += 1,
            CommandKind::Refresh => {
                self.num_refresh_cmds += 1;
                self.ref_energy += config.ref_energy_inc;
            }
            CommandKind::RefreshBank => {
                self.num_refresh_bank_cmds += 1;
                self.refb_energy += config.refb_energy_inc;
            }
            CommandKind::SelfRefreshEnter => self.num_sref_enter_cmds += 1,
            CommandKind::SelfRefreshExit => self.num_sref_exit_cmds += 1,
        }
    }

    /// Records a completed transaction.
    pub fn record_retirement(&mut self, latency: u64, is_write: bool) {
        if is_write {
            self.writes_done += 1;
        } else {
            self.reads_done += 1;
        }
        self.access_latency.record(latency);
    }

    /// Total accumulated energy across all buckets, pJ.
    pub fn total_energy(&self) -> f64 {
        self.act_energy
            + self.read_energy
            + self.write_energy
            + self.ref_energy
            + self.refb_energy
            + self.act_stb_energy
            + self.pre_stb_energy
            + self.sref_energy
    }

    /// Accumulates another channel's statistics into this one.
    pub fn merge(&mut self, other: &Self) {
        self.num_read_cmds += other.num_read_cmds;
        self.num_write_cmds += other.num_write_cmds;
        self.num_act_cmds += other.num_act_cmds;
        self.num_pre_cmds += other.num_pre_cmds;
        self.num_refresh_cmds += other.num_refresh_cmds;
        self.num_refresh_bank_cmds += other.num_refresh_bank_cmds;
        self.num_sref_enter_cmds += other.num_sref_enter_cmds;
        self.num_sref_exit_cmds += other.num_sref_exit_cmds;
        self.hbm_dual_command_issue_cycles += other.hbm_dual_command_issue_cycles;
        self.rw_rowhits_pending_refresh += other.rw_rowhits_pending_refresh;
        self.all_bank_idle_cycles += other.all_bank_idle_cycles;
        self.active_cycles += other.active_cycles;
        self.sref_cycles += other.sref_cycles;
        self.act_energy += other.act_energy;
        self.read_energy += other.read_energy;
        self.write_energy += other.write_energy;
        self.ref_energy += other.ref_energy;
        self.refb_energy += other.refb_energy;
        self.act_stb_energy += other.act_stb_energy;
        self.pre_stb_energy += other.pre_stb_energy;
        self.sref_energy += other.sref_energy;
        self.reads_done += other.reads_done;
        self.writes_done += other.writes_done;
        if other.access_latency.count > 0 {
            if self.access_latency.count == 0 || other.access_latency.min < self.access_latency.min
            {
                self.access_latency.min = other.access_latency.min;
            }
            self.access_latency.max = self.access_latency.max.max(other.access_latency.max);
            self.access_latency.count += other.access_latency.count;
            self.access_latency.sum += other.access_latency.sum;
        }
    }

    /// Prints all statistics sections to stdout.
    ///
    /// `cycles` is the channel clock, used to derive bandwidth-free rates;
    /// `label` heads the banner (a channel id or "all channels").
    pub fn print(&self, label: &str, cycles: u64) {
        let cyc = if cycles == 0 { 1 } else { cycles };
        println!("\n==========================================================");
        println!("DRAM SIMULATION STATISTICS ({label})");
        println!("==========================================================");
        println!("sim_cycles               {cycles}");
        println!("reads_done               {}", self.reads_done);
        println!("writes_done              {}", self.writes_done);
        println!(
            "avg_access_latency       {:.2} cycles (min {}, max {})",
            self.access_latency.average(),
            self.access_latency.min,
            self.access_latency.max
        );
        println!("----------------------------------------------------------");
        println!("COMMANDS");
        println!("  cmd.read               {}", self.num_read_cmds);
        println!("  cmd.write              {}", self.num_write_cmds);
        println!("  cmd.activate           {}", self.num_act_cmds);
        println!("  cmd.precharge          {}", self.num_pre_cmds);
        println!("  cmd.refresh            {}", self.num_refresh_cmds);
        println!("  cmd.refresh_bank       {}", self.num_refresh_bank_cmds);
        println!("  cmd.sref_enter         {}", self.num_sref_enter_cmds);
        println!("  cmd.sref_exit          {}", self.num_sref_exit_cmds);
        println!(
            "  hbm.dual_issue_cycles  {}",
            self.hbm_dual_command_issue_cycles
        );
        println!(
            "  rowhits_pending_ref    {}",
            self.rw_rowhits_pending_refresh
        );
        println!("----------------------------------------------------------");
        println!("BACKGROUND");
        println!(
            "  rank_cycles.idle       {} ({:.2}%)",
            self.all_bank_idle_cycles,
            (self.all_bank_idle_cycles as f64 / cyc as f64) * 100.0
        );
        println!(
            "  rank_cycles.active     {} ({:.2}%)",
            self.active_cycles,
            (self.active_cycles as f64 / cyc as f64) * 100.0
        );
        println!(
            "  rank_cycles.sref       {} ({:.2}%)",
            self.sref_cycles,
            (self.sref_cycles as f64 / cyc as f64) * 100.0
        );
        println!("----------------------------------------------------------");
        println!("ENERGY (pJ)");
        println!("  energy.activate        {:.1}", self.act_energy);
        println!("  energy.read            {:.1}", self.read_energy);
        println!("  energy.write           {:.1}", self.write_energy);
        println!("  energy.refresh         {:.1}", self.ref_energy);
        println!("  energy.refresh_bank    {:.1}", self.refb_energy);
        println!("  energy.active_standby  {:.1}", self.act_stb_energy);
        println!("  energy.pre_standby     {:.1}", self.pre_stb_energy);
        println!("  energy.self_refresh    {:.1}", self.sref_energy);
        println!("  energy.total           {:.1}", self.total_energy());
        println!("==========================================================");
    }
}
