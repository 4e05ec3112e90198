//! Per-cycle orchestration of one channel.
//!
//! The controller owns the channel state, command queue, and refresh
//! manager, and drives one DRAM cycle of all three per tick, in a fixed
//! order: retire completed requests, accrue background energy, steer
//! long-idle ranks toward self-refresh, service the refresh queue, run the
//! FR-FCFS scheduler (with HBM dual issue), and finally attempt an
//! aggressive precharge when nothing else used the bus.

use std::sync::Arc;

use crate::channel::queue::CommandQueue;
use crate::channel::refresh::RefreshManager;
use crate::channel::state::ChannelState;
use crate::common::addr::Address;
use crate::common::command::{Command, CommandKind};
use crate::common::error::ConfigError;
use crate::common::request::Request;
use crate::config::Config;
use crate::stats::ChannelStats;
use crate::timing::TimingTable;
use crate::trace::CommandTrace;

/// A request returned to the host this cycle.
#[derive(Clone, Copy, Debug)]
pub struct Retired {
    /// The original 64-bit physical address.
    pub hex_addr: u64,
    /// True for write transactions.
    pub is_write: bool,
    /// Reported latency: exit cycle minus arrival cycle.
    pub latency: u64,
}

/// One channel's controller: state, queues, refresh, statistics, trace.
#[derive(Debug)]
pub struct Controller {
    channel_id: usize,
    clk: u64,
    config: Arc<Config>,
    channel_state: ChannelState,
    cmd_queue: CommandQueue,
    refresh: RefreshManager,
    stats: ChannelStats,
    trace: Option<CommandTrace>,
}

impl Controller {
    /// Creates the controller for `channel_id`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the validation trace file cannot be
    /// created. With more than one channel each controller writes its own
    /// `<path>.ch<N>` file.
    pub fn new(
        channel_id: usize,
        config: Arc<Config>,
        timing: Arc<TimingTable>,
    ) -> Result<Self, ConfigError> {
        let trace = if config.other.validation_output.is_empty() {
            None
        } else if config.system.channels > 1 {
            let path = format!("{}.ch{channel_id}", config.other.validation_output);
            Some(CommandTrace::create(&path)?)
        } else {
            Some(CommandTrace::create(&config.other.validation_output)?)
        };
        Ok(Self {
            channel_id,
            clk: 0,
            channel_state: ChannelState::new(Arc::clone(&config), timing),
            cmd_queue: CommandQueue::new(channel_id, Arc::clone(&config)),
            refresh: RefreshManager::new(channel_id, Arc::clone(&config)),
            stats: ChannelStats::default(),
            trace,
            config,
        })
    }

    /// True if a transaction for this address would be accepted right now.
    pub fn will_accept(&self, addr: &Address) -> bool {
        self.cmd_queue
            .will_accept(addr.rank, addr.bankgroup, addr.bank)
    }

    /// Enqueues a request; returns false if its queue is full.
    pub fn add_request(&mut self, req: Request) -> bool {
        self.cmd_queue.insert(req)
    }

    /// Advances one DRAM cycle; returns the requests retired this cycle.
    pub fn clock_tick(&mut self) -> Vec<Retired> {
        self.clk += 1;
        let now = self.clk;

        if self.config.system.req_buffering_enabled {
            self.cmd_queue.drain_buffered();
        }

        let retired = self.retire(now);
        self.accrue_background_energy();

        // The refresh interval counter advances every cycle, even when the
        // bus goes to self-refresh steering below.
        self.refresh.clock_tick();

        if self.config.other.enable_self_refresh && self.steer_self_refresh(now) {
            return retired;
        }

        if self.service_refresh(now) {
            return retired;
        }

        if let Some(cmd) =
            self.cmd_queue
                .get_command_to_issue(&self.channel_state, now, None, &mut self.stats)
        {
            self.issue(&cmd, now);
            if self.config.dram_structure.protocol.is_hbm() {
                self.try_dual_issue(&cmd, now);
            }
            return retired;
        }

        if self.config.other.aggressive_precharging_enabled {
            if let Some(cmd) = self.cmd_queue.aggressive_precharge(&self.channel_state, now) {
                self.issue(&cmd, now);
            }
        }
        retired
    }

    /// Returns up to `retire_per_cycle` requests whose data transfer has
    /// completed, recording their access latencies.
    fn retire(&mut self, now: u64) -> Vec<Retired> {
        let mut retired = Vec::new();
        for _ in 0..self.config.system.retire_per_cycle {
            let Some(req) = self.cmd_queue.take_retired(now) else {
                break;
            };
            let latency = req.exit_cycle - req.arrival_cycle;
            self.stats.record_retirement(latency, req.is_write());
            retired.push(Retired {
                hex_addr: req.hex_addr,
                is_write: req.is_write(),
                latency,
            });
        }
        retired
    }

    /// Per-rank background energy: self-refresh, precharge standby (all
    /// banks closed), or active standby.
    fn accrue_background_energy(&mut self) {
        for rank in 0..self.config.ranks {
            if self.channel_state.is_rank_self_refreshing(rank) {
                self.stats.sref_cycles += 1;
                self.stats.sref_energy += self.config.sref_energy_inc;
            } else if self.channel_state.all_banks_idle(rank) {
                self.stats.all_bank_idle_cycles += 1;
                self.stats.pre_stb_energy += self.config.pre_stb_energy_inc;
            } else {
                self.stats.active_cycles += 1;
                self.stats.act_stb_energy += self.config.act_stb_energy_inc;
            }
        }
    }

    /// Moves the first sufficiently idle rank one step toward self-refresh.
    /// Issues at most one command; returns true when it used the bus.
    fn steer_self_refresh(&mut self, now: u64) -> bool {
        for rank in 0..self.config.ranks {
            if self.channel_state.is_rank_self_refreshing(rank)
                || !self.cmd_queue.rank_idle(rank)
                || now - self.cmd_queue.rank_idle_since(rank)
                    < self.config.other.idle_cycles_for_self_refresh
            {
                continue;
            }
            let enter = Command::new(
                CommandKind::SelfRefreshEnter,
                Address::new(self.channel_id, rank, 0, 0, 0, 0),
            );
            let cmd = self.channel_state.required_command(&enter);
            if !self.channel_state.is_ready(&cmd, now) {
                continue;
            }
            if cmd.kind == CommandKind::SelfRefreshEnter {
                // Queued refreshes for this rank are pointless once the
                // device refreshes itself; unflag the head first if it was
                // the one that marked the banks.
                if let Some(head) = self.refresh.head().copied() {
                    if head.addr.rank == rank && !self.channel_state.refresh_waiting_needs_update {
                        self.channel_state.set_refresh_waiting(&head, false);
                        self.channel_state.refresh_waiting_needs_update = true;
                    }
                }
                self.refresh.discard_rank(rank);
            }
            self.issue(&cmd, now);
            return true;
        }
        false
    }

    /// Services the head of the refresh queue; returns true when a command
    /// (the refresh or a preparatory one) used the bus.
    fn service_refresh(&mut self, now: u64) -> bool {
        if self.refresh.is_empty() {
            return false;
        }
        if self.channel_state.refresh_waiting_needs_update {
            self.channel_state.refresh_waiting_needs_update = false;
            if let Some(head) = self.refresh.head().copied() {
                self.channel_state.set_refresh_waiting(&head, true);
            }
        }
        let Some(cmd) = self.refresh.refresh_or_preparatory(&self.channel_state, now) else {
            return false;
        };
        self.issue(&cmd, now);
        if cmd.is_refresh() {
            self.channel_state.refresh_waiting_needs_update = true;
            self.channel_state.set_refresh_waiting(&cmd, false);
        }
        true
    }

    /// HBM second issue slot: the pair must contain exactly one column
    /// command, so the second scan requires the complement of the first.
    fn try_dual_issue(&mut self, first: &Command, now: u64) {
        let want_column = Some(!first.is_column());
        if let Some(second) = self.cmd_queue.get_command_to_issue(
            &self.channel_state,
            now,
            want_column,
            &mut self.stats,
        ) {
            self.issue(&second, now);
            self.stats.hbm_dual_command_issue_cycles += 1;
        }
    }

    fn issue(&mut self, cmd: &Command, now: u64) {
        if let Some(trace) = self.trace.as_mut() {
            trace.write(now, cmd);
        }
        self.channel_state.issue_command(cmd, now, &mut self.stats);
    }

    /// This channel's statistics.
    pub fn stats(&self) -> &ChannelStats {
        &self.stats
    }

    /// Current channel clock.
    pub const fn clk(&self) -> u64 {
        self.clk
    }

    /// Pending requests across this channel's queues.
    pub fn queue_usage(&self) -> usize {
        self.cmd_queue.queue_usage()
    }
}
