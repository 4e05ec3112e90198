//! Per-bank state machine and earliest-issue timing ledger.
//!
//! Each bank is a three-state machine (closed / row open / self-refresh)
//! plus one earliest-issue cycle per command kind. The ledger is only ever
//! pushed forward (max), so every recorded cycle is monotone over the life
//! of the simulation. Feeding a command that is illegal in the current state
//! is a simulator bug and panics.

use crate::common::command::{Command, CommandKind, NUM_COMMAND_KINDS};

/// Lifecycle state of a single bank.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BankStatus {
    /// No open row; ACTIVATE or refresh may target the bank.
    Closed,
    /// A row is latched in the sense amplifiers.
    Open,
    /// The rank is self-refreshing; only SELF_REFRESH_EXIT applies.
    SelfRefresh,
}

/// State and timing ledger for one bank.
#[derive(Clone, Debug)]
pub struct BankState {
    status: BankStatus,
    /// Open row number; `Some` iff `status == Open`.
    open_row: Option<u64>,
    /// Earliest cycle at which each command kind may issue to this bank.
    earliest: [u64; NUM_COMMAND_KINDS],
    /// Column accesses served by the current open row.
    row_hit_count: u32,
    /// A refresh targeting this bank is queued; advisory for the scheduler,
    /// blocks nothing.
    refresh_waiting: bool,
}

impl Default for BankState {
    fn default() -> Self {
        Self::new()
    }
}

impl BankState {
    /// Creates a closed bank with every command immediately issuable.
    pub const fn new() -> Self {
        Self {
            status: BankStatus::Closed,
            open_row: None,
            earliest: [0; NUM_COMMAND_KINDS],
            row_hit_count: 0,
            refresh_waiting: false,
        }
    }

    /// The command that must run first for `cmd` to make progress on this
    /// bank.
    ///
    /// Column requests on a closed bank need an ACTIVATE; on an open bank
    /// with the wrong row, a PRECHARGE (the row-match test is strict
    /// equality against the open row); in self-refresh, an exit. Refreshes
    /// pass through when closed and demand a PRECHARGE when open.
    ///
    /// # Panics
    ///
    /// Panics if `cmd` is not a request-level kind, or if a self-refresh
    /// transition is requested from a state that cannot take it; both are
    /// simulator bugs.
    #[track_caller]
    pub fn required_command(&self, cmd: &Command) -> CommandKind {
        match cmd.kind {
            CommandKind::Read
            | CommandKind::ReadPrecharge
            | CommandKind::Write
            | CommandKind::WritePrecharge => match self.status {
                BankStatus::Closed => CommandKind::Activate,
                BankStatus::Open => {
                    if self.open_row == Some(cmd.addr.row) {
                        cmd.kind
                    } else {
                        CommandKind::Precharge
                    }
                }
                BankStatus::SelfRefresh => CommandKind::SelfRefreshExit,
            },
            CommandKind::Refresh | CommandKind::RefreshBank => match self.status {
                BankStatus::Closed => cmd.kind,
                BankStatus::Open => CommandKind::Precharge,
                BankStatus::SelfRefresh => CommandKind::SelfRefreshExit,
            },
            CommandKind::SelfRefreshEnter => match self.status {
                BankStatus::Closed => CommandKind::SelfRefreshEnter,
                BankStatus::Open => CommandKind::Precharge,
                BankStatus::SelfRefresh => {
                    panic!("self-refresh entry requested for a bank already in self-refresh")
                }
            },
            CommandKind::SelfRefreshExit => match self.status {
                BankStatus::SelfRefresh => CommandKind::SelfRefreshExit,
                _ => panic!("self-refresh exit requested for a bank not in self-refresh"),
            },
            CommandKind::Activate | CommandKind::Precharge => {
                panic!("{:?} is not a request-level command", cmd.kind)
            }
        }
    }

    /// Applies the state transition for an issued command.
    ///
    /// # Panics
    ///
    /// Panics on a transition that is illegal in the current state; issuing
    /// such a command means the scheduler or refresh manager is broken.
    #[track_caller]
    pub fn update_state(&mut self, cmd: &Command) {
        match self.status {
            BankStatus::Open => match cmd.kind {
                CommandKind::Read | CommandKind::Write => {
                    self.row_hit_count += 1;
                }
                CommandKind::ReadPrecharge
                | CommandKind::WritePrecharge
                | CommandKind::Precharge => {
                    self.status = BankStatus::Closed;
                    self.open_row = None;
                    self.row_hit_count = 0;
                }
                _ => self.illegal(cmd),
            },
            BankStatus::Closed => match cmd.kind {
                CommandKind::Refresh | CommandKind::RefreshBank => {}
                CommandKind::Activate => {
                    self.status = BankStatus::Open;
                    self.open_row = Some(cmd.addr.row);
                    self.row_hit_count = 0;
                }
                CommandKind::SelfRefreshEnter => {
                    self.status = BankStatus::SelfRefresh;
                }
                _ => self.illegal(cmd),
            },
            BankStatus::SelfRefresh => match cmd.kind {
                CommandKind::SelfRefreshExit => {
                    self.status = BankStatus::Closed;
                }
                _ => self.illegal(cmd),
            },
        }
    }

    #[track_caller]
    fn illegal(&self, cmd: &Command) -> ! {
        panic!(
            "illegal bank transition: {:?} while {:?}",
            cmd.kind, self.status
        )
    }

    /// Pushes the earliest-issue cycle for `kind` forward to `cycle`.
    /// Monotone: an earlier constraint never relaxes a later one.
    pub fn update_timing(&mut self, kind: CommandKind, cycle: u64) {
        let slot = &mut self.earliest[kind.index()];
        *slot = (*slot).max(cycle);
    }

    /// True once the bank-local constraints for `kind` have elapsed.
    pub fn is_ready(&self, kind: CommandKind, now: u64) -> bool {
        now >= self.earliest[kind.index()]
    }

    /// Earliest cycle at which `kind` may issue; exposed for invariant tests.
    pub fn earliest(&self, kind: CommandKind) -> u64 {
        self.earliest[kind.index()]
    }

    /// Current lifecycle state.
    pub const fn status(&self) -> BankStatus {
        self.status
    }

    /// True when a row is open.
    pub fn is_row_open(&self) -> bool {
        self.status == BankStatus::Open
    }

    /// The open row, if any.
    pub const fn open_row(&self) -> Option<u64> {
        self.open_row
    }

    /// Column accesses served by the current open row.
    pub const fn row_hit_count(&self) -> u32 {
        self.row_hit_count
    }

    /// Flags or clears a queued refresh targeting this bank.
    pub fn set_refresh_waiting(&mut self, waiting: bool) {
        self.refresh_waiting = waiting;
    }

    /// True while a refresh targeting this bank is queued.
    pub const fn refresh_waiting(&self) -> bool {
        self.refresh_waiting
    }
}
