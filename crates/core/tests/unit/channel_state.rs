//! Channel-state unit tests.
//!
//! Verifies activation-window enforcement (tFAW), rank-wide command
//! resolution and readiness, cross-bank timing propagation, and the
//! issue-before-ready contract.

use std::sync::Arc;

use dramulator_core::channel::{BankStatus, ChannelState};
use dramulator_core::common::{Address, Command, CommandKind};
use dramulator_core::config::Config;
use dramulator_core::stats::ChannelStats;
use dramulator_core::timing::TimingTable;

use crate::common::harness::ddr4_config;

/// DDR4-style single-rank device with eight banks (4 groups x 2).
fn eight_bank_config() -> Config {
    let mut config = ddr4_config();
    config.dram_structure.bankgroups = 4;
    config.finalize().unwrap();
    assert_eq!(config.ranks, 1);
    config
}

fn state_for(config: Config) -> (ChannelState, ChannelStats) {
    let config = Arc::new(config);
    let timing = Arc::new(TimingTable::new(&config));
    (ChannelState::new(config, timing), ChannelStats::default())
}

fn activate(bankgroup: usize, bank: usize, row: u64) -> Command {
    Command::new(
        CommandKind::Activate,
        Address::new(0, 0, bankgroup, bank, row, 0),
    )
}

// ══════════════════════════════════════════════════════════
// 1. Four-activation window (tFAW)
// ══════════════════════════════════════════════════════════

#[test]
fn fifth_activate_waits_for_the_window() {
    let (mut state, mut stats) = state_for(eight_bank_config());
    // tRRD_S = 4, tFAW = 50. Four activates to distinct bank groups at the
    // earliest legal spacing.
    let mut clk = 10;
    for bg in 0..4 {
        let cmd = activate(bg, 0, 1);
        assert!(state.is_ready(&cmd, clk), "activate {bg} at {clk}");
        state.issue_command(&cmd, clk, &mut stats);
        clk += 4;
    }
    // The fifth activate targets a fifth bank; its bank-level timing is
    // fine, but the window holds it until first-activate + tFAW = 60.
    let fifth = activate(0, 1, 1);
    assert!(!state.activation_window_ok(0, 59));
    assert!(!state.is_ready(&fifth, 59));
    assert!(state.activation_window_ok(0, 60));
    assert!(state.is_ready(&fifth, 60));
    state.issue_command(&fifth, 60, &mut stats);
    // Window slots now expire at 64..110; a sixth activate at 61 is held.
    assert!(!state.activation_window_ok(0, 61));
    assert!(state.activation_window_ok(0, 64));
}

// ══════════════════════════════════════════════════════════
// 2. Rank-wide command resolution
// ══════════════════════════════════════════════════════════

#[test]
fn refresh_over_open_bank_resolves_to_precharge() {
    let (mut state, mut stats) = state_for(eight_bank_config());
    state.issue_command(&activate(2, 1, 5), 0, &mut stats);

    let refresh = Command::new(CommandKind::Refresh, Address::new(0, 0, 0, 0, 0, 0));
    let required = state.required_command(&refresh);
    assert_eq!(required.kind, CommandKind::Precharge);
    assert_eq!(required.addr.bankgroup, 2);
    assert_eq!(required.addr.bank, 1);
}

#[test]
fn refresh_over_closed_rank_passes_through() {
    let (state, _) = state_for(eight_bank_config());
    let refresh = Command::new(CommandKind::Refresh, Address::new(0, 0, 0, 0, 0, 0));
    assert_eq!(state.required_command(&refresh), refresh);
}

#[test]
fn rank_wide_readiness_is_the_and_over_banks() {
    let (mut state, mut stats) = state_for(eight_bank_config());
    // Activate then precharge one bank; the precharge-to-refresh constraint
    // (tRP = 10) holds the whole rank's refresh.
    state.issue_command(&activate(0, 0, 5), 0, &mut stats);
    let pre = Command::new(CommandKind::Precharge, Address::new(0, 0, 0, 0, 5, 0));
    state.issue_command(&pre, 24, &mut stats);

    let refresh = Command::new(CommandKind::Refresh, Address::new(0, 0, 0, 0, 0, 0));
    assert!(!state.is_ready(&refresh, 33));
    assert!(state.is_ready(&refresh, 34));
}

#[test]
fn self_refresh_enter_puts_every_bank_of_the_rank_in_self_refresh() {
    let config = ddr4_config(); // two ranks
    let (mut state, mut stats) = state_for(config);
    let enter = Command::new(CommandKind::SelfRefreshEnter, Address::new(0, 1, 0, 0, 0, 0));
    state.issue_command(&enter, 0, &mut stats);

    assert!(state.is_rank_self_refreshing(1));
    for bg in 0..2 {
        for b in 0..2 {
            assert_eq!(state.bank(1, bg, b).status(), BankStatus::SelfRefresh);
        }
    }
    // The untouched rank is unaffected.
    assert!(!state.is_rank_self_refreshing(0));
    assert!(state.all_banks_idle(0));
}

// ══════════════════════════════════════════════════════════
// 3. Timing propagation
// ══════════════════════════════════════════════════════════

#[test]
fn activate_propagates_to_all_four_relationships() {
    let config = ddr4_config(); // 2 ranks, tRCD 10, tRRD 4, tRC 34
    let (mut state, mut stats) = state_for(config);
    state.issue_command(&activate(0, 0, 5), 100, &mut stats);

    // Same bank: column ops wait tRCD, precharge waits tRAS, re-activate tRC.
    assert_eq!(state.bank(0, 0, 0).earliest(CommandKind::Read), 110);
    assert_eq!(state.bank(0, 0, 0).earliest(CommandKind::Precharge), 124);
    assert_eq!(state.bank(0, 0, 0).earliest(CommandKind::Activate), 134);
    // Sibling bank in the same group: tRRD_L.
    assert_eq!(state.bank(0, 0, 1).earliest(CommandKind::Activate), 104);
    // Other bank group: tRRD_S.
    assert_eq!(state.bank(0, 1, 0).earliest(CommandKind::Activate), 104);
    // Other rank: activates are unconstrained.
    assert_eq!(state.bank(1, 0, 0).earliest(CommandKind::Activate), 0);
}

#[test]
fn read_propagates_turnarounds_to_other_ranks() {
    let config = ddr4_config(); // burst 4, tRTRS 2
    let (mut state, mut stats) = state_for(config);
    state.issue_command(&activate(0, 0, 5), 0, &mut stats);
    let read = Command::new(CommandKind::Read, Address::new(0, 0, 0, 0, 5, 0));
    state.issue_command(&read, 10, &mut stats);

    // Cross-rank read-to-read: burst + tRTRS = 6 after the read.
    assert_eq!(state.bank(1, 0, 0).earliest(CommandKind::Read), 16);
    // Same-bank precharge: read + AL + tRTP = 15, but tRAS (24 from the
    // activate at 0) still dominates.
    assert_eq!(state.bank(0, 0, 0).earliest(CommandKind::Precharge), 24);
}

#[test]
fn propagation_never_decreases_earliest_cycles() {
    let (mut state, mut stats) = state_for(ddr4_config());
    state.issue_command(&activate(0, 0, 5), 0, &mut stats);
    let before = state.bank(0, 0, 0).earliest(CommandKind::Activate);
    // A later activate elsewhere must not relax the same-bank constraint.
    state.issue_command(&activate(0, 1, 5), 4, &mut stats);
    assert!(state.bank(0, 0, 0).earliest(CommandKind::Activate) >= before);
}

// ══════════════════════════════════════════════════════════
// 4. Contract enforcement
// ══════════════════════════════════════════════════════════

#[test]
#[should_panic(expected = "before its earliest cycle")]
fn issuing_an_early_command_panics() {
    let (mut state, mut stats) = state_for(ddr4_config());
    state.issue_command(&activate(0, 0, 5), 0, &mut stats);
    // tRCD = 10 has not elapsed.
    let read = Command::new(CommandKind::Read, Address::new(0, 0, 0, 0, 5, 0));
    state.issue_command(&read, 5, &mut stats);
}

// ══════════════════════════════════════════════════════════
// 5. Refresh-waiting flags
// ══════════════════════════════════════════════════════════

#[test]
fn rank_refresh_flags_every_bank_and_bank_refresh_flags_its_group() {
    let (mut state, _) = state_for(eight_bank_config());

    let refresh = Command::new(CommandKind::Refresh, Address::new(0, 0, 0, 0, 0, 0));
    state.set_refresh_waiting(&refresh, true);
    for bg in 0..4 {
        for b in 0..2 {
            assert!(state.bank(0, bg, b).refresh_waiting());
        }
    }
    state.set_refresh_waiting(&refresh, false);

    let bank_refresh =
        Command::new(CommandKind::RefreshBank, Address::new(0, 0, 2, 0, 0, 0));
    state.set_refresh_waiting(&bank_refresh, true);
    for b in 0..2 {
        assert!(state.bank(0, 2, b).refresh_waiting());
    }
    assert!(!state.bank(0, 0, 0).refresh_waiting());
}
