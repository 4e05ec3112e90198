//! In-flight transaction records.

use crate::common::command::{Command, CommandKind};

/// A pending or issued read/write transaction.
///
/// Created when the host submits a transaction; `exit_cycle` is stamped when
/// the resolving column command issues; the record is destroyed the cycle
/// after `exit_cycle`, when the host callback fires.
#[derive(Clone, Copy, Debug)]
pub struct Request {
    /// The column command this request ultimately needs (READ or WRITE plus
    /// the decoded address).
    pub cmd: Command,
    /// The original 64-bit physical address, returned to the host callback.
    pub hex_addr: u64,
    /// Cycle at which the host submitted the transaction.
    pub arrival_cycle: u64,
    /// Cycle at which data transfer completes; valid once issued.
    pub exit_cycle: u64,
}

impl Request {
    /// Creates a pending request; `exit_cycle` is stamped at issue.
    pub const fn new(cmd: Command, hex_addr: u64, arrival_cycle: u64) -> Self {
        Self {
            cmd,
            hex_addr,
            arrival_cycle,
            exit_cycle: 0,
        }
    }

    /// True if this is a write transaction.
    pub fn is_write(&self) -> bool {
        matches!(self.cmd.kind, CommandKind::Write | CommandKind::WritePrecharge)
    }
}
