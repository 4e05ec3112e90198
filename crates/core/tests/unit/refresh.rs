//! Refresh-manager unit tests.
//!
//! Verifies periodic insertion and rotation under both policies, the
//! preparatory-command path, dequeue-on-issue, and rank discard for
//! self-refresh entry.

use std::sync::Arc;

use dramulator_core::channel::{ChannelState, RefreshManager};
use dramulator_core::common::{Address, Command, CommandKind};
use dramulator_core::config::{Config, RefreshPolicy};
use dramulator_core::stats::ChannelStats;
use dramulator_core::timing::TimingTable;

use crate::common::harness::ddr4_config;

fn fast_refresh_config() -> Config {
    let mut config = ddr4_config();
    config.timing.t_refi = 100;
    config.timing.t_refib = 40;
    config.finalize().unwrap();
    config
}

fn setup(config: Config) -> (ChannelState, RefreshManager, ChannelStats) {
    let config = Arc::new(config);
    let timing = Arc::new(TimingTable::new(&config));
    (
        ChannelState::new(Arc::clone(&config), timing),
        RefreshManager::new(0, config),
        ChannelStats::default(),
    )
}

fn tick_n(refresh: &mut RefreshManager, n: u64) {
    for _ in 0..n {
        refresh.clock_tick();
    }
}

// ══════════════════════════════════════════════════════════
// 1. Periodic insertion and rotation
// ══════════════════════════════════════════════════════════

#[test]
fn rank_refresh_appears_every_trefi_and_rotates() {
    let (_, mut refresh, _) = setup(fast_refresh_config()); // 2 ranks
    assert!(refresh.is_empty());

    tick_n(&mut refresh, 99);
    assert!(refresh.is_empty());
    tick_n(&mut refresh, 1); // clk = 100
    let head = refresh.head().unwrap();
    assert_eq!(head.kind, CommandKind::Refresh);
    assert_eq!(head.addr.rank, 0);

    tick_n(&mut refresh, 100); // clk = 200, second refresh
    let (mut state, _, mut stats) = setup(fast_refresh_config());
    let first = refresh.refresh_or_preparatory(&state, 200).unwrap();
    state.issue_command(&first, 200, &mut stats);
    assert_eq!(first.addr.rank, 0);
    let second = refresh.refresh_or_preparatory(&state, 400).unwrap();
    assert_eq!(second.kind, CommandKind::Refresh);
    assert_eq!(second.addr.rank, 1);
    assert!(refresh.is_empty());
}

#[test]
fn bank_staggered_policy_emits_bank_refreshes() {
    let mut config = fast_refresh_config();
    config.other.refresh_policy = RefreshPolicy::BankStaggered;
    config.finalize().unwrap();
    let (_, mut refresh, _) = setup(config);

    tick_n(&mut refresh, 40);
    let head = *refresh.head().unwrap();
    assert_eq!(head.kind, CommandKind::RefreshBank);
    assert_eq!((head.addr.bankgroup, head.addr.bank), (0, 0));

    tick_n(&mut refresh, 40);
    // Rotation is bank-group fastest.
    let (mut state, _, mut stats) = setup({
        let mut config = fast_refresh_config();
        config.other.refresh_policy = RefreshPolicy::BankStaggered;
        config.finalize().unwrap();
        config
    });
    let first = refresh.refresh_or_preparatory(&state, 100).unwrap();
    state.issue_command(&first, 100, &mut stats);
    let second = refresh.refresh_or_preparatory(&state, 200).unwrap();
    assert_eq!(second.kind, CommandKind::RefreshBank);
    assert_eq!((second.addr.bankgroup, second.addr.bank), (1, 0));
}

// ══════════════════════════════════════════════════════════
// 2. Preparatory commands and dequeue-on-issue
// ══════════════════════════════════════════════════════════

#[test]
fn open_bank_yields_precharge_and_keeps_the_refresh_queued() {
    let (mut state, mut refresh, mut stats) = setup(fast_refresh_config());
    state.issue_command(
        &Command::new(CommandKind::Activate, Address::new(0, 0, 1, 0, 9, 0)),
        0,
        &mut stats,
    );
    tick_n(&mut refresh, 100);

    // tRAS (24) has elapsed by 100, so the precharge is ready.
    let prep = refresh.refresh_or_preparatory(&state, 100).unwrap();
    assert_eq!(prep.kind, CommandKind::Precharge);
    assert_eq!(prep.addr.bankgroup, 1);
    assert!(!refresh.is_empty()); // still pending

    state.issue_command(&prep, 100, &mut stats);
    // The refresh itself waits tRP after the precharge.
    assert!(refresh.refresh_or_preparatory(&state, 105).is_none());
    let cmd = refresh.refresh_or_preparatory(&state, 110).unwrap();
    assert_eq!(cmd.kind, CommandKind::Refresh);
    assert!(refresh.is_empty());
}

// ══════════════════════════════════════════════════════════
// 3. Self-refresh interaction
// ══════════════════════════════════════════════════════════

#[test]
fn discard_rank_drops_only_that_ranks_refreshes() {
    let (_, mut refresh, _) = setup(fast_refresh_config());
    tick_n(&mut refresh, 200); // refreshes queued for rank 0 and rank 1

    refresh.discard_rank(0);
    let head = refresh.head().unwrap();
    assert_eq!(head.addr.rank, 1);
    refresh.discard_rank(1);
    assert!(refresh.is_empty());
}
