//! tREFI-driven refresh bookkeeping.
//!
//! The refresh manager creates one refresh request per interval — a
//! rank-wide REFRESH every tREFI under the rank-staggered policy, a single
//! REFRESH_BANK every tREFIb under the bank-staggered policy — rotating the
//! target so refreshes stay spread across the device. Each cycle the
//! controller offers the head of the refresh queue to the channel state;
//! whatever preparatory command falls out (usually a PRECHARGE of an open
//! row) issues in place of a normal request, and the refresh itself is
//! dequeued only when it actually goes on the bus.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::channel::state::ChannelState;
use crate::common::addr::Address;
use crate::common::command::{Command, CommandKind};
use crate::config::{Config, RefreshPolicy};

/// Per-channel refresh request generator and queue.
#[derive(Debug)]
pub struct RefreshManager {
    config: Arc<Config>,
    channel_id: usize,
    clk: u64,
    refresh_q: VecDeque<Command>,
    next_rank: usize,
    next_bankgroup: usize,
    next_bank: usize,
}

impl RefreshManager {
    /// Creates an empty refresh queue for one channel.
    pub fn new(channel_id: usize, config: Arc<Config>) -> Self {
        Self {
            config,
            channel_id,
            clk: 0,
            refresh_q: VecDeque::new(),
            next_rank: 0,
            next_bankgroup: 0,
            next_bank: 0,
        }
    }

    /// Advances the refresh clock and inserts the periodic refresh request
    /// when its interval elapses.
    pub fn clock_tick(&mut self) {
        self.clk += 1;
        match self.config.other.refresh_policy {
            RefreshPolicy::RankStaggered => {
                if self.clk % self.config.timing.t_refi == 0 {
                    let addr = Address::new(self.channel_id, self.next_rank, 0, 0, 0, 0);
                    self.refresh_q
                        .push_back(Command::new(CommandKind::Refresh, addr));
                    self.next_rank = (self.next_rank + 1) % self.config.ranks;
                }
            }
            RefreshPolicy::BankStaggered => {
                if self.clk % self.config.timing.t_refib == 0 {
                    let addr = Address::new(
                        self.channel_id,
                        self.next_rank,
                        self.next_bankgroup,
                        self.next_bank,
                        0,
                        0,
                    );
                    self.refresh_q
                        .push_back(Command::new(CommandKind::RefreshBank, addr));
                    self.rotate_bank();
                }
            }
        }
    }

    /// Bank-staggered rotation: bank group fastest, then bank, then rank.
    fn rotate_bank(&mut self) {
        self.next_bankgroup = (self.next_bankgroup + 1) % self.config.bankgroups;
        if self.next_bankgroup == 0 {
            self.next_bank = (self.next_bank + 1) % self.config.banks_per_group;
            if self.next_bank == 0 {
                self.next_rank = (self.next_rank + 1) % self.config.ranks;
            }
        }
    }

    /// The oldest queued refresh, if any.
    pub fn head(&self) -> Option<&Command> {
        self.refresh_q.front()
    }

    /// True when no refresh is queued.
    pub fn is_empty(&self) -> bool {
        self.refresh_q.is_empty()
    }

    /// The head refresh itself if it is ready, or the preparatory command it
    /// needs first; the refresh is dequeued only when returned directly.
    pub fn refresh_or_preparatory(
        &mut self,
        channel_state: &ChannelState,
        now: u64,
    ) -> Option<Command> {
        let head = *self.refresh_q.front()?;
        let required = channel_state.required_command(&head);
        if !channel_state.is_ready(&required, now) {
            return None;
        }
        if required.kind == head.kind {
            let _ = self.refresh_q.pop_front();
        }
        Some(required)
    }

    /// Discards queued refreshes for a rank that is entering self-refresh;
    /// the device refreshes itself from here on.
    pub fn discard_rank(&mut self, rank: usize) {
        self.refresh_q.retain(|cmd| cmd.addr.rank != rank);
    }
}
