//! DRAM protocol commands.
//!
//! This module defines the ten JEDEC-style command kinds the controller can
//! put on the command bus and the addressed [`Command`] record that flows
//! between the scheduler, the channel state, and the validation trace.

use std::fmt;

use crate::common::addr::Address;

/// Number of distinct command kinds; sizes the per-bank timing ledger.
pub const NUM_COMMAND_KINDS: usize = 10;

/// A DRAM protocol command kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Column read from the open row.
    Read,
    /// Column read with auto-precharge.
    ReadPrecharge,
    /// Column write to the open row.
    Write,
    /// Column write with auto-precharge.
    WritePrecharge,
    /// Open (sense) a row in a bank.
    Activate,
    /// Close the open row of a bank.
    Precharge,
    /// Refresh a single bank.
    RefreshBank,
    /// Refresh every bank of a rank.
    Refresh,
    /// Put a rank into self-refresh.
    SelfRefreshEnter,
    /// Bring a rank out of self-refresh.
    SelfRefreshExit,
}

impl CommandKind {
    /// All kinds, in timing-ledger index order.
    pub const ALL: [Self; NUM_COMMAND_KINDS] = [
        Self::Read,
        Self::ReadPrecharge,
        Self::Write,
        Self::WritePrecharge,
        Self::Activate,
        Self::Precharge,
        Self::RefreshBank,
        Self::Refresh,
        Self::SelfRefreshEnter,
        Self::SelfRefreshExit,
    ];

    /// Index into per-bank timing ledgers and the timing table.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// True for column commands (reads and writes, with or without
    /// auto-precharge).
    pub const fn is_column(self) -> bool {
        matches!(
            self,
            Self::Read | Self::ReadPrecharge | Self::Write | Self::WritePrecharge
        )
    }

    /// True for reads (with or without auto-precharge).
    pub const fn is_read(self) -> bool {
        matches!(self, Self::Read | Self::ReadPrecharge)
    }

    /// True for both refresh kinds.
    pub const fn is_refresh(self) -> bool {
        matches!(self, Self::Refresh | Self::RefreshBank)
    }

    /// True for commands addressed to an entire rank rather than one bank.
    pub const fn targets_rank(self) -> bool {
        matches!(
            self,
            Self::Refresh | Self::SelfRefreshEnter | Self::SelfRefreshExit
        )
    }

    /// Stable name used in the validation trace.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::ReadPrecharge => "read_p",
            Self::Write => "write",
            Self::WritePrecharge => "write_p",
            Self::Activate => "activate",
            Self::Precharge => "precharge",
            Self::RefreshBank => "refresh_bank",
            Self::Refresh => "refresh",
            Self::SelfRefreshEnter => "self_refresh_enter",
            Self::SelfRefreshExit => "self_refresh_exit",
        }
    }
}

/// An addressed DRAM command.
///
/// Rank-wide kinds (REFRESH, SELF_REFRESH_*) carry the rank in the address
/// and ignore the bank coordinates; bank loops live inside the channel
/// state, not at issue sites.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Command {
    /// The command kind.
    pub kind: CommandKind,
    /// The target address.
    pub addr: Address,
}

impl Command {
    /// Creates a command.
    pub const fn new(kind: CommandKind, addr: Address) -> Self {
        Self { kind, addr }
    }

    /// The same address with a different kind; used when a preparatory
    /// command (ACTIVATE, PRECHARGE, SELF_REFRESH_EXIT) must run first.
    pub const fn with_kind(&self, kind: CommandKind) -> Self {
        Self {
            kind,
            addr: self.addr,
        }
    }

    /// True for column commands.
    pub const fn is_column(&self) -> bool {
        self.kind.is_column()
    }

    /// True for both refresh kinds.
    pub const fn is_refresh(&self) -> bool {
        self.kind.is_refresh()
    }

    /// True for rank-wide commands.
    pub const fn targets_rank(&self) -> bool {
        self.kind.targets_rank()
    }
}

impl fmt::Display for Command {
    /// Renders the stable validation-trace record: command name then the six
    /// address fields, decimal.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<20} {:>3} {:>3} {:>3} {:>3} {:>8} {:>8}",
            self.kind.name(),
            self.addr.channel,
            self.addr.rank,
            self.addr.bankgroup,
            self.addr.bank,
            self.addr.row,
            self.addr.column
        )
    }
}
