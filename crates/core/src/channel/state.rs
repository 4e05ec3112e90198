//! Channel-wide state: bank array, activation windows, timing propagation.
//!
//! One `ChannelState` owns every [`BankState`] of its channel in a flat,
//! contiguously allocated array indexed by (rank, bankgroup, bank); the
//! command queue and refresh manager consult it read-only and all mutation
//! funnels through [`ChannelState::issue_command`]. Issuing a command
//! applies the bank state transition, maintains the per-rank activation
//! windows (tFAW, and t32AW on GDDR), and propagates the timing table's
//! constraints to the same bank, its bank-group siblings, the other bank
//! groups of the rank, and the other ranks — or rank-wide for refresh and
//! self-refresh commands.

use std::sync::Arc;

use crate::channel::bank::{BankState, BankStatus};
use crate::common::command::{Command, CommandKind};
use crate::config::Config;
use crate::stats::ChannelStats;
use crate::timing::TimingTable;

/// All mutable DRAM state of one channel.
#[derive(Debug)]
pub struct ChannelState {
    config: Arc<Config>,
    timing: Arc<TimingTable>,
    /// Flat bank array; index = (rank * bankgroups + bankgroup) *
    /// banks_per_group + bank.
    banks: Vec<BankState>,
    /// Per-rank expiry cycles of outstanding activation-window slots; time
    /// ordered, at most 4 entries.
    four_aw: Vec<Vec<u64>>,
    /// GDDR 32-activation window; at most 32 entries per rank.
    thirty_two_aw: Vec<Vec<u64>>,
    /// Per-rank self-refresh flags.
    rank_in_self_refresh: Vec<bool>,
    /// Set when the head of the refresh queue changed and bank
    /// refresh-waiting flags must be re-derived.
    pub refresh_waiting_needs_update: bool,
}

impl ChannelState {
    /// Creates the bank array and empty activation windows.
    pub fn new(config: Arc<Config>, timing: Arc<TimingTable>) -> Self {
        let ranks = config.ranks;
        let banks = vec![BankState::new(); ranks * config.banks];
        Self {
            config,
            timing,
            banks,
            four_aw: vec![Vec::new(); ranks],
            thirty_two_aw: vec![Vec::new(); ranks],
            rank_in_self_refresh: vec![false; ranks],
            refresh_waiting_needs_update: true,
        }
    }

    fn index(&self, rank: usize, bankgroup: usize, bank: usize) -> usize {
        (rank * self.config.bankgroups + bankgroup) * self.config.banks_per_group + bank
    }

    /// The bank at (rank, bankgroup, bank).
    pub fn bank(&self, rank: usize, bankgroup: usize, bank: usize) -> &BankState {
        &self.banks[self.index(rank, bankgroup, bank)]
    }

    fn bank_mut(&mut self, rank: usize, bankgroup: usize, bank: usize) -> &mut BankState {
        let idx = self.index(rank, bankgroup, bank);
        &mut self.banks[idx]
    }

    /// The command that must issue next for `cmd` to make progress.
    ///
    /// Bank-local kinds delegate to the addressed bank. Rank-wide kinds scan
    /// the rank's banks in fixed order and return the first preparatory
    /// command any bank demands (typically a PRECHARGE), re-addressed to
    /// that bank; if none, the original command passes through unchanged.
    pub fn required_command(&self, cmd: &Command) -> Command {
        if cmd.targets_rank() {
            for bg in 0..self.config.bankgroups {
                for b in 0..self.config.banks_per_group {
                    let required = self.bank(cmd.addr.rank, bg, b).required_command(cmd);
                    if required != cmd.kind {
                        let mut addr = cmd.addr;
                        addr.bankgroup = bg;
                        addr.bank = b;
                        return Command::new(required, addr);
                    }
                }
            }
            *cmd
        } else {
            let required = self
                .bank(cmd.addr.rank, cmd.addr.bankgroup, cmd.addr.bank)
                .required_command(cmd);
            cmd.with_kind(required)
        }
    }

    /// True once every timing constraint for `cmd` has elapsed at `now`.
    ///
    /// ACTIVATE additionally requires a free activation-window slot;
    /// rank-wide kinds require every bank of the rank to be ready.
    pub fn is_ready(&self, cmd: &Command, now: u64) -> bool {
        match cmd.kind {
            CommandKind::Activate => {
                self.activation_window_ok(cmd.addr.rank, now)
                    && self
                        .bank(cmd.addr.rank, cmd.addr.bankgroup, cmd.addr.bank)
                        .is_ready(cmd.kind, now)
            }
            CommandKind::Refresh | CommandKind::SelfRefreshEnter | CommandKind::SelfRefreshExit => {
                (0..self.config.bankgroups).all(|bg| {
                    (0..self.config.banks_per_group)
                        .all(|b| self.bank(cmd.addr.rank, bg, b).is_ready(cmd.kind, now))
                })
            }
            _ => self
                .bank(cmd.addr.rank, cmd.addr.bankgroup, cmd.addr.bank)
                .is_ready(cmd.kind, now),
        }
    }

    /// Issues `cmd`: state transition, activation-window upkeep, timing
    /// propagation, and statistics.
    ///
    /// # Panics
    ///
    /// Panics if `cmd` is not ready at `now`; emitting an early command is a
    /// scheduler bug, not a modeled hardware fault.
    #[track_caller]
    pub fn issue_command(&mut self, cmd: &Command, now: u64, stats: &mut ChannelStats) {
        assert!(
            self.is_ready(cmd, now),
            "command issued before its earliest cycle: {cmd} at {now}"
        );
        tracing::trace!(clk = now, %cmd, "issue");
        self.update_state(cmd);
        self.update_timing(cmd, now);
        stats.record_command(cmd.kind, &self.config);
    }

    /// Applies the state transition(s) for an issued command.
    fn update_state(&mut self, cmd: &Command) {
        if cmd.targets_rank() {
            self.rank_in_self_refresh[cmd.addr.rank] =
                cmd.kind == CommandKind::SelfRefreshEnter;
            for bg in 0..self.config.bankgroups {
                for b in 0..self.config.banks_per_group {
                    self.bank_mut(cmd.addr.rank, bg, b).update_state(cmd);
                }
            }
        } else {
            self.bank_mut(cmd.addr.rank, cmd.addr.bankgroup, cmd.addr.bank)
                .update_state(cmd);
        }
    }

    /// Propagates the timing table's constraints for an issued command.
    fn update_timing(&mut self, cmd: &Command, now: u64) {
        let timing = Arc::clone(&self.timing);
        if cmd.targets_rank() {
            self.update_same_rank(cmd, timing.same_rank(cmd.kind), now);
            return;
        }
        if cmd.kind == CommandKind::Activate {
            self.update_activation_times(cmd.addr.rank, now);
        }
        self.update_same_bank(cmd, timing.same_bank(cmd.kind), now);
        self.update_other_banks_same_bankgroup(
            cmd,
            timing.other_banks_same_bankgroup(cmd.kind),
            now,
        );
        self.update_other_bankgroups_same_rank(
            cmd,
            timing.other_bankgroups_same_rank(cmd.kind),
            now,
        );
        self.update_other_ranks(cmd, timing.other_ranks(cmd.kind), now);
    }

    fn update_same_bank(&mut self, cmd: &Command, constraints: &[(CommandKind, u64)], now: u64) {
        let bank = self.bank_mut(cmd.addr.rank, cmd.addr.bankgroup, cmd.addr.bank);
        for &(kind, delay) in constraints {
            bank.update_timing(kind, now + delay);
        }
    }

    fn update_other_banks_same_bankgroup(
        &mut self,
        cmd: &Command,
        constraints: &[(CommandKind, u64)],
        now: u64,
    ) {
        for b in 0..self.config.banks_per_group {
            if b == cmd.addr.bank {
                continue;
            }
            let bank = self.bank_mut(cmd.addr.rank, cmd.addr.bankgroup, b);
            for &(kind, delay) in constraints {
                bank.update_timing(kind, now + delay);
            }
        }
    }

    fn update_other_bankgroups_same_rank(
        &mut self,
        cmd: &Command,
        constraints: &[(CommandKind, u64)],
        now: u64,
    ) {
        for bg in 0..self.config.bankgroups {
            if bg == cmd.addr.bankgroup {
                continue;
            }
            for b in 0..self.config.banks_per_group {
                let bank = self.bank_mut(cmd.addr.rank, bg, b);
                for &(kind, delay) in constraints {
                    bank.update_timing(kind, now + delay);
                }
            }
        }
    }

    fn update_other_ranks(&mut self, cmd: &Command, constraints: &[(CommandKind, u64)], now: u64) {
        for r in 0..self.config.ranks {
            if r == cmd.addr.rank {
                continue;
            }
            for bg in 0..self.config.bankgroups {
                for b in 0..self.config.banks_per_group {
                    let bank = self.bank_mut(r, bg, b);
                    for &(kind, delay) in constraints {
                        bank.update_timing(kind, now + delay);
                    }
                }
            }
        }
    }

    fn update_same_rank(&mut self, cmd: &Command, constraints: &[(CommandKind, u64)], now: u64) {
        for bg in 0..self.config.bankgroups {
            for b in 0..self.config.banks_per_group {
                let bank = self.bank_mut(cmd.addr.rank, bg, b);
                for &(kind, delay) in constraints {
                    bank.update_timing(kind, now + delay);
                }
            }
        }
    }

    /// True when the rank can accept another ACTIVATE under tFAW (and t32AW
    /// on GDDR).
    pub fn activation_window_ok(&self, rank: usize, now: u64) -> bool {
        let faw_ok = Self::window_ok(&self.four_aw[rank], 4, now);
        if self.config.dram_structure.protocol.is_gddr() {
            faw_ok && Self::window_ok(&self.thirty_two_aw[rank], 32, now)
        } else {
            faw_ok
        }
    }

    fn window_ok(window: &[u64], slots: usize, now: u64) -> bool {
        window.len() < slots || window.first().is_none_or(|&head| now >= head)
    }

    /// Records an ACTIVATE in the rank's activation windows: evict the head
    /// slot if it has expired, then claim a slot until `now + tFAW`.
    fn update_activation_times(&mut self, rank: usize, now: u64) {
        let window = &mut self.four_aw[rank];
        if window.first().is_some_and(|&head| now >= head) {
            let _ = window.remove(0);
        }
        window.push(now + self.config.timing.t_faw);
        assert!(window.len() <= 4, "four-activation window overflow");

        if self.config.dram_structure.protocol.is_gddr() {
            let window = &mut self.thirty_two_aw[rank];
            if window.first().is_some_and(|&head| now >= head) {
                let _ = window.remove(0);
            }
            window.push(now + self.config.timing.t_32aw);
            assert!(window.len() <= 32, "32-activation window overflow");
        }
    }

    /// True while the rank is in self-refresh.
    pub fn is_rank_self_refreshing(&self, rank: usize) -> bool {
        self.rank_in_self_refresh[rank]
    }

    /// True when every bank of the rank is closed and not mid-transition.
    pub fn all_banks_idle(&self, rank: usize) -> bool {
        (0..self.config.bankgroups).all(|bg| {
            (0..self.config.banks_per_group)
                .all(|b| self.bank(rank, bg, b).status() == BankStatus::Closed)
        })
    }

    /// Flags (or clears) the refresh-waiting bit on every bank a queued
    /// refresh targets: the whole rank for REFRESH, the bank group for
    /// REFRESH_BANK.
    ///
    /// # Panics
    ///
    /// Panics for non-refresh commands.
    #[track_caller]
    pub fn set_refresh_waiting(&mut self, cmd: &Command, waiting: bool) {
        match cmd.kind {
            CommandKind::Refresh => {
                for bg in 0..self.config.bankgroups {
                    for b in 0..self.config.banks_per_group {
                        self.bank_mut(cmd.addr.rank, bg, b).set_refresh_waiting(waiting);
                    }
                }
            }
            CommandKind::RefreshBank => {
                for b in 0..self.config.banks_per_group {
                    self.bank_mut(cmd.addr.rank, cmd.addr.bankgroup, b)
                        .set_refresh_waiting(waiting);
                }
            }
            _ => panic!("refresh-waiting update for non-refresh command {:?}", cmd.kind),
        }
    }
}
