//! Precomputed command-to-command timing-constraint table.
//!
//! Rather than coding each JEDEC constraint as an imperative check, every
//! constraint is flattened once at construction into a table keyed by
//! (issued command kind, relationship): a list of (future command kind,
//! delay) pairs. Issuing a command walks the lists for the four bank
//! relationships (same bank, other banks in the bank group, other bank
//! groups, other ranks) — or the rank-wide list for rank-level commands —
//! and pushes each affected bank's earliest-issue cycle forward. This keeps
//! the scheduler protocol-agnostic.

use crate::common::command::{CommandKind, NUM_COMMAND_KINDS};
use crate::config::{Config, Protocol};

/// A `(future command, minimum delay in cycles)` constraint.
pub type Constraint = (CommandKind, u64);

/// One constraint list per issued command kind.
type KindTable = [Vec<Constraint>; NUM_COMMAND_KINDS];

/// Immutable command-to-command constraint table, shared by every channel.
#[derive(Debug)]
pub struct TimingTable {
    same_bank: KindTable,
    other_banks_same_bankgroup: KindTable,
    other_bankgroups_same_rank: KindTable,
    other_ranks: KindTable,
    same_rank: KindTable,
}

/// Signed sum clamped at zero; cross-rank turnarounds can go negative when
/// read and write latencies are close.
fn clamped(parts: &[i64]) -> u64 {
    parts.iter().sum::<i64>().max(0) as u64
}

impl TimingTable {
    /// Builds the table from a finalized configuration.
    pub fn new(config: &Config) -> Self {
        let t = &config.timing;
        let burst = config.burst_cycle;
        let protocol = config.dram_structure.protocol;

        // With a single bank group the device runs every column pair under
        // the short timings.
        let (t_ccd_l, t_wtr_l, t_rrd_l) = if config.bankgroups == 1 {
            (t.t_ccd_s, t.t_wtr_s, t.t_rrd_s)
        } else {
            (t.t_ccd_l, t.t_wtr_l, t.t_rrd_l)
        };

        let read_to_read_l = burst.max(t_ccd_l);
        let read_to_read_s = burst.max(t.t_ccd_s);
        let read_to_read_o = burst + t.t_rtrs;
        let read_to_write = clamped(&[
            config.rl as i64,
            burst as i64,
            -(config.wl as i64),
            t.t_rpre as i64,
            t.t_rtrs as i64,
        ]);
        let read_to_write_o = clamped(&[
            config.read_delay as i64,
            burst as i64,
            t.t_rtrs as i64,
            -(config.write_delay as i64),
        ]);
        let read_to_precharge = t.al + t.t_rtp;
        let readp_to_activate = t.al + burst + t.t_rtp + t.t_rp;

        let write_to_read_l = config.write_delay + t_wtr_l;
        let write_to_read_s = config.write_delay + t.t_wtr_s;
        let write_to_read_o = clamped(&[
            config.write_delay as i64,
            burst as i64,
            t.t_rtrs as i64,
            -(config.read_delay as i64),
        ]);
        let write_to_write_l = burst.max(t_ccd_l);
        let write_to_write_s = burst.max(t.t_ccd_s);
        let write_to_write_o = burst + t.t_wpre;
        let write_to_precharge = config.wl + burst + t.t_wr;

        let precharge_to_activate = t.t_rp;
        let read_to_activate = read_to_precharge + precharge_to_activate;
        let write_to_activate = write_to_precharge + precharge_to_activate;

        let activate_to_activate = config.t_rc;
        let activate_to_activate_l = t_rrd_l;
        let activate_to_activate_s = t.t_rrd_s;
        let activate_to_precharge = t.t_ras;
        // GDDR and HBM split the row-to-column delay by direction.
        let (activate_to_read, activate_to_write) = if protocol.is_gddr() || protocol.is_hbm() {
            (t.t_rcdrd, t.t_rcdwr)
        } else {
            (t.t_rcd - t.al.min(t.t_rcd), t.t_rcd - t.al.min(t.t_rcd))
        };
        // A refresh needs the bank precharged first, so tRC covers it.
        let activate_to_refresh = config.t_rc;

        let refresh_to_refresh = t.t_rrefd;
        let refresh_to_activate = t.t_rrefd;
        let refresh_cycle = t.t_rfc;
        let refresh_cycle_bank = t.t_rfcb;
        let self_refresh_entry_to_exit = t.t_ckesr;
        let self_refresh_exit = t.t_xs;

        let mut same_bank: KindTable = std::array::from_fn(|_| Vec::new());
        let mut other_banks_same_bankgroup: KindTable = std::array::from_fn(|_| Vec::new());
        let mut other_bankgroups_same_rank: KindTable = std::array::from_fn(|_| Vec::new());
        let mut other_ranks: KindTable = std::array::from_fn(|_| Vec::new());
        let mut same_rank: KindTable = std::array::from_fn(|_| Vec::new());

        use CommandKind::{
            Activate, Precharge, Read, ReadPrecharge, Refresh, RefreshBank, SelfRefreshEnter,
            SelfRefreshExit, Write, WritePrecharge,
        };

        // READ
        same_bank[Read.index()] = vec![
            (Read, read_to_read_l),
            (Write, read_to_write),
            (ReadPrecharge, read_to_read_l),
            (WritePrecharge, read_to_write),
            (Precharge, read_to_precharge),
        ];
        other_banks_same_bankgroup[Read.index()] = vec![
            (Read, read_to_read_l),
            (Write, read_to_write),
            (ReadPrecharge, read_to_read_l),
            (WritePrecharge, read_to_write),
        ];
        other_bankgroups_same_rank[Read.index()] = vec![
            (Read, read_to_read_s),
            (Write, read_to_write),
            (ReadPrecharge, read_to_read_s),
            (WritePrecharge, read_to_write),
        ];
        other_ranks[Read.index()] = vec![
            (Read, read_to_read_o),
            (Write, read_to_write_o),
            (ReadPrecharge, read_to_read_o),
            (WritePrecharge, read_to_write_o),
        ];

        // WRITE
        same_bank[Write.index()] = vec![
            (Read, write_to_read_l),
            (Write, write_to_write_l),
            (ReadPrecharge, write_to_read_l),
            (WritePrecharge, write_to_write_l),
            (Precharge, write_to_precharge),
        ];
        other_banks_same_bankgroup[Write.index()] = vec![
            (Read, write_to_read_l),
            (Write, write_to_write_l),
            (ReadPrecharge, write_to_read_l),
            (WritePrecharge, write_to_write_l),
        ];
        other_bankgroups_same_rank[Write.index()] = vec![
            (Read, write_to_read_s),
            (Write, write_to_write_s),
            (ReadPrecharge, write_to_read_s),
            (WritePrecharge, write_to_write_s),
        ];
        other_ranks[Write.index()] = vec![
            (Read, write_to_read_o),
            (Write, write_to_write_o),
            (ReadPrecharge, write_to_read_o),
            (WritePrecharge, write_to_write_o),
        ];

        // READ_PRECHARGE: the same bank sees an auto-precharge; siblings see
        // an ordinary read.
        same_bank[ReadPrecharge.index()] = vec![
            (Activate, readp_to_activate),
            (Refresh, read_to_activate),
            (RefreshBank, read_to_activate),
            (SelfRefreshEnter, read_to_activate),
        ];
        other_banks_same_bankgroup[ReadPrecharge.index()] =
            other_banks_same_bankgroup[Read.index()].clone();
        other_bankgroups_same_rank[ReadPrecharge.index()] =
            other_bankgroups_same_rank[Read.index()].clone();
        other_ranks[ReadPrecharge.index()] = other_ranks[Read.index()].clone();

        // WRITE_PRECHARGE
        same_bank[WritePrecharge.index()] = vec![
            (Activate, write_to_activate),
            (Refresh, write_to_activate),
            (RefreshBank, write_to_activate),
            (SelfRefreshEnter, write_to_activate),
        ];
        other_banks_same_bankgroup[WritePrecharge.index()] =
            other_banks_same_bankgroup[Write.index()].clone();
        other_bankgroups_same_rank[WritePrecharge.index()] =
            other_bankgroups_same_rank[Write.index()].clone();
        other_ranks[WritePrecharge.index()] = other_ranks[Write.index()].clone();

        // ACTIVATE
        same_bank[Activate.index()] = vec![
            (Activate, activate_to_activate),
            (Read, activate_to_read),
            (Write, activate_to_write),
            (ReadPrecharge, activate_to_read),
            (WritePrecharge, activate_to_write),
            (Precharge, activate_to_precharge),
        ];
        other_banks_same_bankgroup[Activate.index()] = vec![
            (Activate, activate_to_activate_l),
            (RefreshBank, activate_to_refresh),
        ];
        other_bankgroups_same_rank[Activate.index()] = vec![
            (Activate, activate_to_activate_s),
            (RefreshBank, activate_to_refresh),
        ];

        // PRECHARGE
        same_bank[Precharge.index()] = vec![
            (Activate, precharge_to_activate),
            (Refresh, precharge_to_activate),
            (RefreshBank, precharge_to_activate),
            (SelfRefreshEnter, precharge_to_activate),
        ];
        if protocol.is_gddr() || protocol == Protocol::Lpddr4 {
            other_banks_same_bankgroup[Precharge.index()] = vec![(Precharge, t.t_ppd)];
            other_bankgroups_same_rank[Precharge.index()] = vec![(Precharge, t.t_ppd)];
        }

        // REFRESH_BANK: tRFCb holds the refreshed bank; siblings only wait
        // the bank-to-bank refresh delay.
        same_bank[RefreshBank.index()] = vec![
            (Activate, refresh_cycle_bank),
            (Refresh, refresh_cycle_bank),
            (RefreshBank, refresh_cycle_bank),
            (SelfRefreshEnter, refresh_cycle_bank),
        ];
        other_banks_same_bankgroup[RefreshBank.index()] = vec![
            (Activate, refresh_to_activate),
            (RefreshBank, refresh_to_refresh),
        ];
        other_bankgroups_same_rank[RefreshBank.index()] = vec![
            (Activate, refresh_to_activate),
            (RefreshBank, refresh_to_refresh),
        ];

        // REFRESH, SELF_REFRESH_ENTER, SELF_REFRESH_EXIT are rank-wide.
        same_rank[Refresh.index()] = vec![
            (Activate, refresh_cycle),
            (Refresh, refresh_cycle),
            (RefreshBank, refresh_cycle),
            (SelfRefreshEnter, refresh_cycle),
        ];
        same_rank[SelfRefreshEnter.index()] =
            vec![(SelfRefreshExit, self_refresh_entry_to_exit)];
        same_rank[SelfRefreshExit.index()] = vec![
            (Activate, self_refresh_exit),
            (Refresh, self_refresh_exit),
            (RefreshBank, self_refresh_exit),
            (SelfRefreshEnter, self_refresh_exit),
        ];

        Self {
            same_bank,
            other_banks_same_bankgroup,
            other_bankgroups_same_rank,
            other_ranks,
            same_rank,
        }
    }

    /// Constraints the issued command places on its own bank.
    pub fn same_bank(&self, kind: CommandKind) -> &[Constraint] {
        &self.same_bank[kind.index()]
    }

    /// Constraints on sibling banks within the same bank group.
    pub fn other_banks_same_bankgroup(&self, kind: CommandKind) -> &[Constraint] {
        &self.other_banks_same_bankgroup[kind.index()]
    }

    /// Constraints on banks in other bank groups of the same rank.
    pub fn other_bankgroups_same_rank(&self, kind: CommandKind) -> &[Constraint] {
        &self.other_bankgroups_same_rank[kind.index()]
    }

    /// Constraints on banks in other ranks.
    pub fn other_ranks(&self, kind: CommandKind) -> &[Constraint] {
        &self.other_ranks[kind.index()]
    }

    /// Constraints a rank-wide command places on every bank of its rank.
    pub fn same_rank(&self, kind: CommandKind) -> &[Constraint] {
        &self.same_rank[kind.index()]
    }
}
