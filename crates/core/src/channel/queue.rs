//! Command queues and the FR-FCFS scheduler.
//!
//! Pending transactions sit in bounded queues, one per bank or one per rank.
//! Each cycle the scheduler walks the queues in a rotating round-robin
//! (rank, bank, bank-group) order — the cursor advances even when nothing is
//! selected, so no queue is persistently favoured — and within a queue scans
//! head to tail for the first request whose *required* command is issuable
//! now. Row-buffer hits win implicitly: a hit's required command is the
//! column op itself, ready as soon as tRCD has elapsed, while a conflict
//! must first wait out a PRECHARGE.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::channel::state::ChannelState;
use crate::common::addr::Address;
use crate::common::command::{Command, CommandKind};
use crate::common::request::Request;
use crate::config::{Config, QueueStructure};
use crate::stats::ChannelStats;

/// Per-channel request queues plus the issued-request list.
#[derive(Debug)]
pub struct CommandQueue {
    config: Arc<Config>,
    channel_id: usize,
    queues: Vec<VecDeque<Request>>,
    /// Requests whose column command has issued, awaiting retirement at
    /// `exit_cycle`.
    issued: Vec<Request>,
    /// Overflow parking lot used only when request buffering is enabled.
    buffered: VecDeque<Request>,
    next_rank: usize,
    next_bankgroup: usize,
    next_bank: usize,
    rank_queues_empty: Vec<bool>,
    rank_queues_empty_from: Vec<u64>,
}

impl CommandQueue {
    /// Creates empty queues for one channel.
    pub fn new(channel_id: usize, config: Arc<Config>) -> Self {
        let queue_count = match config.system.queue_structure {
            QueueStructure::PerBank => config.ranks * config.banks,
            QueueStructure::PerRank => config.ranks,
        };
        let ranks = config.ranks;
        Self {
            config,
            channel_id,
            queues: vec![VecDeque::new(); queue_count],
            issued: Vec::new(),
            buffered: VecDeque::new(),
            next_rank: 0,
            next_bankgroup: 0,
            next_bank: 0,
            rank_queues_empty: vec![true; ranks],
            rank_queues_empty_from: vec![0; ranks],
        }
    }

    fn queue_index(&self, rank: usize, bankgroup: usize, bank: usize) -> usize {
        match self.config.system.queue_structure {
            QueueStructure::PerBank => {
                (rank * self.config.bankgroups + bankgroup) * self.config.banks_per_group + bank
            }
            QueueStructure::PerRank => rank,
        }
    }

    /// True if a transaction for this bank would be accepted right now.
    pub fn will_accept(&self, rank: usize, bankgroup: usize, bank: usize) -> bool {
        self.config.system.req_buffering_enabled
            || self.queues[self.queue_index(rank, bankgroup, bank)].len()
                < self.config.system.queue_size
    }

    /// Enqueues a request; returns false if its queue is full and buffering
    /// is disabled.
    pub fn insert(&mut self, req: Request) -> bool {
        let rank = req.cmd.addr.rank;
        let qi = self.queue_index(rank, req.cmd.addr.bankgroup, req.cmd.addr.bank);
        if self.queues[qi].len() < self.config.system.queue_size {
            self.queues[qi].push_back(req);
        } else if self.config.system.req_buffering_enabled {
            self.buffered.push_back(req);
        } else {
            return false;
        }
        self.rank_queues_empty[rank] = false;
        true
    }

    /// Moves buffered requests into their queues while space lasts.
    /// Head-of-line: arrival order is preserved across the whole channel.
    pub fn drain_buffered(&mut self) {
        while let Some(req) = self.buffered.front() {
            let qi = self.queue_index(
                req.cmd.addr.rank,
                req.cmd.addr.bankgroup,
                req.cmd.addr.bank,
            );
            if self.queues[qi].len() >= self.config.system.queue_size {
                break;
            }
            if let Some(req) = self.buffered.pop_front() {
                self.queues[qi].push_back(req);
            }
        }
    }

    fn advance_cursor(&mut self) {
        match self.config.system.queue_structure {
            QueueStructure::PerRank => {
                self.next_rank = (self.next_rank + 1) % self.config.ranks;
            }
            QueueStructure::PerBank => {
                self.next_bankgroup = (self.next_bankgroup + 1) % self.config.bankgroups;
                if self.next_bankgroup == 0 {
                    self.next_bank = (self.next_bank + 1) % self.config.banks_per_group;
                    if self.next_bank == 0 {
                        self.next_rank = (self.next_rank + 1) % self.config.ranks;
                    }
                }
            }
        }
    }

    fn cursor_index(&self) -> usize {
        match self.config.system.queue_structure {
            QueueStructure::PerBank => {
                self.queue_index(self.next_rank, self.next_bankgroup, self.next_bank)
            }
            QueueStructure::PerRank => self.next_rank,
        }
    }

    /// First-Ready-First-Come-First-Serve arbitration.
    ///
    /// Returns the next command to put on the bus, if any. When the selected
    /// request's required command *is* its column command, the request is
    /// dequeued, stamped with its exit cycle, and moved to the issued list;
    /// preparatory commands leave it queued.
    ///
    /// `want_column` filters candidates for the HBM second issue slot:
    /// `Some(true)` only accepts column commands, `Some(false)` only
    /// non-column ones. Filtering happens before any dequeue, so a request
    /// is never lost to a failed dual-issue pairing.
    pub fn get_command_to_issue(
        &mut self,
        channel_state: &ChannelState,
        now: u64,
        want_column: Option<bool>,
        stats: &mut ChannelStats,
    ) -> Option<Command> {
        for _ in 0..self.queues.len() {
            let qi = self.cursor_index();
            self.advance_cursor();

            let mut selected: Option<(usize, Command, bool)> = None;
            for (pos, req) in self.queues[qi].iter().enumerate() {
                let required = channel_state.required_command(&req.cmd);
                if !channel_state.is_ready(&required, now) {
                    continue;
                }
                match want_column {
                    Some(true) if !required.is_column() => continue,
                    Some(false) if required.is_column() => continue,
                    _ => {}
                }
                let is_final = required.kind == req.cmd.kind;
                selected = Some((pos, required, is_final));
                break;
            }

            if let Some((pos, cmd, is_final)) = selected {
                if is_final {
                    if let Some(mut req) = self.queues[qi].remove(pos) {
                        let delay = if req.is_write() {
                            self.config.write_delay
                        } else {
                            self.config.read_delay
                        };
                        req.exit_cycle = now + delay;
                        let addr = req.cmd.addr;
                        if channel_state
                            .bank(addr.rank, addr.bankgroup, addr.bank)
                            .refresh_waiting()
                        {
                            stats.rw_rowhits_pending_refresh += 1;
                        }
                        self.issued.push(req);
                        self.update_rank_idle(addr.rank, now);
                    }
                }
                return Some(cmd);
            }
        }
        None
    }

    /// Standalone PRECHARGE selection for the aggressive-precharge policy.
    ///
    /// Closes an open row nobody is queued for, or one that has served at
    /// least `row_hit_cap` hits (the cap bounds starvation, so it wins over
    /// remaining queued hits).
    pub fn aggressive_precharge(
        &self,
        channel_state: &ChannelState,
        now: u64,
    ) -> Option<Command> {
        for r in 0..self.config.ranks {
            for bg in 0..self.config.bankgroups {
                for b in 0..self.config.banks_per_group {
                    let bank = channel_state.bank(r, bg, b);
                    let Some(row) = bank.open_row() else { continue };
                    let keep_open = self.has_request_for_row(r, bg, b, row)
                        && bank.row_hit_count() < self.config.other.row_hit_cap;
                    if keep_open {
                        continue;
                    }
                    let cmd = Command::new(
                        CommandKind::Precharge,
                        Address::new(self.channel_id, r, bg, b, row, 0),
                    );
                    if channel_state.is_ready(&cmd, now) {
                        return Some(cmd);
                    }
                }
            }
        }
        None
    }

    fn has_request_for_row(&self, rank: usize, bankgroup: usize, bank: usize, row: u64) -> bool {
        let qi = self.queue_index(rank, bankgroup, bank);
        self.queues[qi].iter().any(|req| {
            req.cmd.addr.row == row
                && req.cmd.addr.bankgroup == bankgroup
                && req.cmd.addr.bank == bank
        })
    }

    /// Removes and returns the oldest issued request whose data transfer
    /// finished before `now`.
    pub fn take_retired(&mut self, now: u64) -> Option<Request> {
        let pos = self.issued.iter().position(|req| req.exit_cycle < now)?;
        Some(self.issued.remove(pos))
    }

    /// True while the rank has no pending requests (issued requests still in
    /// flight do not count).
    pub fn rank_idle(&self, rank: usize) -> bool {
        self.rank_queues_empty[rank]
    }

    /// Cycle at which the rank last became entirely queue-empty.
    pub fn rank_idle_since(&self, rank: usize) -> u64 {
        self.rank_queues_empty_from[rank]
    }

    /// Total pending requests across all queues, for occupancy reporting.
    pub fn queue_usage(&self) -> usize {
        self.queues.iter().map(VecDeque::len).sum::<usize>() + self.buffered.len()
    }

    fn update_rank_idle(&mut self, rank: usize, now: u64) {
        if self.rank_queues_empty[rank] {
            return;
        }
        let buffered_for_rank = self
            .buffered
            .iter()
            .any(|req| req.cmd.addr.rank == rank);
        let queued_for_rank = match self.config.system.queue_structure {
            QueueStructure::PerRank => !self.queues[rank].is_empty(),
            QueueStructure::PerBank => (0..self.config.bankgroups).any(|bg| {
                (0..self.config.banks_per_group)
                    .any(|b| !self.queues[self.queue_index(rank, bg, b)].is_empty())
            }),
        };
        if !buffered_for_rank && !queued_for_rank {
            self.rank_queues_empty[rank] = true;
            self.rank_queues_empty_from[rank] = now;
        }
    }
}
