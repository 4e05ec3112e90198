//! Command-queue and scheduler unit tests.
//!
//! Verifies capacity and buffering, FR-FCFS selection (row hits first,
//! FIFO among equals), cursor rotation, the dual-issue column filter, rank
//! idleness tracking, and aggressive precharge.

use std::sync::Arc;

use dramulator_core::channel::{ChannelState, CommandQueue};
use dramulator_core::common::{Address, Command, CommandKind, Request};
use dramulator_core::config::Config;
use dramulator_core::stats::ChannelStats;
use dramulator_core::timing::TimingTable;

use crate::common::harness::ddr4_config;

fn setup(config: Config) -> (ChannelState, CommandQueue, ChannelStats) {
    let config = Arc::new(config);
    let timing = Arc::new(TimingTable::new(&config));
    (
        ChannelState::new(Arc::clone(&config), timing),
        CommandQueue::new(0, config),
        ChannelStats::default(),
    )
}

fn read_req(bankgroup: usize, bank: usize, row: u64, tag: u64) -> Request {
    Request::new(
        Command::new(CommandKind::Read, Address::new(0, 0, bankgroup, bank, row, 0)),
        0x1000 + tag,
        0,
    )
}

// ══════════════════════════════════════════════════════════
// 1. Capacity and buffering
// ══════════════════════════════════════════════════════════

#[test]
fn full_queue_rejects_without_buffering() {
    let mut config = ddr4_config();
    config.system.queue_size = 1;
    config.finalize().unwrap();
    let (_, mut queue, _) = setup(config);

    assert!(queue.will_accept(0, 0, 0));
    assert!(queue.insert(read_req(0, 0, 5, 0)));
    assert!(!queue.will_accept(0, 0, 0));
    assert!(!queue.insert(read_req(0, 0, 6, 1)));
    // A different bank has its own queue.
    assert!(queue.will_accept(0, 0, 1));
}

#[test]
fn buffering_parks_overflow_and_drains_when_space_frees() {
    let mut config = ddr4_config();
    config.system.queue_size = 1;
    config.system.req_buffering_enabled = true;
    config.finalize().unwrap();
    let (mut state, mut queue, mut stats) = setup(config);

    assert!(queue.insert(read_req(0, 0, 5, 0)));
    assert!(queue.will_accept(0, 0, 0)); // buffering never refuses
    assert!(queue.insert(read_req(0, 0, 5, 1)));
    assert_eq!(queue.queue_usage(), 2);

    // Nothing to drain while the queue is full.
    queue.drain_buffered();
    assert_eq!(queue.queue_usage(), 2);

    // Serve the first request: ACTIVATE, then the READ dequeues it.
    let act = queue
        .get_command_to_issue(&state, 0, None, &mut stats)
        .unwrap();
    assert_eq!(act.kind, CommandKind::Activate);
    state.issue_command(&act, 0, &mut stats);
    let read = queue
        .get_command_to_issue(&state, 10, None, &mut stats)
        .unwrap();
    assert_eq!(read.kind, CommandKind::Read);

    queue.drain_buffered();
    assert_eq!(queue.queue_usage(), 1); // the buffered request moved in
}

// ══════════════════════════════════════════════════════════
// 2. FR-FCFS selection
// ══════════════════════════════════════════════════════════

#[test]
fn preparatory_commands_leave_the_request_queued() {
    let (state, mut queue, mut stats) = setup(ddr4_config());
    assert!(queue.insert(read_req(0, 0, 5, 0)));

    let cmd = queue
        .get_command_to_issue(&state, 0, None, &mut stats)
        .unwrap();
    assert_eq!(cmd.kind, CommandKind::Activate);
    assert_eq!(queue.queue_usage(), 1);
}

#[test]
fn row_hit_wins_over_older_conflicting_request() {
    let (mut state, mut queue, mut stats) = setup(ddr4_config());
    state.issue_command(
        &Command::new(CommandKind::Activate, Address::new(0, 0, 0, 0, 5, 0)),
        0,
        &mut stats,
    );
    // Older request conflicts (row 7, precharge not ready until tRAS = 24);
    // younger request hits row 5.
    assert!(queue.insert(read_req(0, 0, 7, 0)));
    assert!(queue.insert(read_req(0, 0, 5, 1)));

    let cmd = queue
        .get_command_to_issue(&state, 10, None, &mut stats)
        .unwrap();
    assert_eq!(cmd.kind, CommandKind::Read);
    assert_eq!(cmd.addr.row, 5);
    assert_eq!(queue.queue_usage(), 1); // the hit was dequeued
}

#[test]
fn fifo_among_equally_ready_requests() {
    let (mut state, mut queue, mut stats) = setup(ddr4_config());
    state.issue_command(
        &Command::new(CommandKind::Activate, Address::new(0, 0, 0, 0, 5, 0)),
        0,
        &mut stats,
    );
    assert!(queue.insert(read_req(0, 0, 5, 0)));
    assert!(queue.insert(read_req(0, 0, 5, 1)));

    let first = queue
        .get_command_to_issue(&state, 10, None, &mut stats)
        .unwrap();
    state.issue_command(&first, 10, &mut stats);
    let second = queue
        .get_command_to_issue(&state, 16, None, &mut stats)
        .unwrap();
    assert_eq!(first.kind, CommandKind::Read);
    assert_eq!(second.kind, CommandKind::Read);
    assert_eq!(queue.queue_usage(), 0);
}

#[test]
fn cursor_rotates_across_queues() {
    let (state, mut queue, mut stats) = setup(ddr4_config());
    assert!(queue.insert(read_req(0, 0, 5, 0)));
    assert!(queue.insert(read_req(1, 0, 5, 1)));

    // Both banks are closed and ready for ACTIVATE; consecutive calls must
    // serve different queues because the cursor advanced.
    let first = queue
        .get_command_to_issue(&state, 0, None, &mut stats)
        .unwrap();
    let second = queue
        .get_command_to_issue(&state, 0, None, &mut stats)
        .unwrap();
    assert_eq!(first.kind, CommandKind::Activate);
    assert_eq!(second.kind, CommandKind::Activate);
    assert_ne!(first.addr.bankgroup, second.addr.bankgroup);
}

// ══════════════════════════════════════════════════════════
// 3. Dual-issue column filter
// ══════════════════════════════════════════════════════════

#[test]
fn column_filter_skips_without_dequeuing() {
    let (mut state, mut queue, mut stats) = setup(ddr4_config());
    state.issue_command(
        &Command::new(CommandKind::Activate, Address::new(0, 0, 0, 0, 5, 0)),
        0,
        &mut stats,
    );
    assert!(queue.insert(read_req(0, 0, 5, 0)));

    // The ready command is a column op; a non-column-only scan must not
    // select it, and crucially must not dequeue it.
    assert!(
        queue
            .get_command_to_issue(&state, 10, Some(false), &mut stats)
            .is_none()
    );
    assert_eq!(queue.queue_usage(), 1);

    // An unfiltered scan still finds it.
    let cmd = queue
        .get_command_to_issue(&state, 10, None, &mut stats)
        .unwrap();
    assert_eq!(cmd.kind, CommandKind::Read);
}

#[test]
fn column_only_filter_rejects_preparatory_commands() {
    let (state, mut queue, mut stats) = setup(ddr4_config());
    assert!(queue.insert(read_req(0, 0, 5, 0))); // closed bank, needs ACTIVATE

    assert!(
        queue
            .get_command_to_issue(&state, 0, Some(true), &mut stats)
            .is_none()
    );
    assert_eq!(queue.queue_usage(), 1);
}

// ══════════════════════════════════════════════════════════
// 4. Issued list and rank idleness
// ══════════════════════════════════════════════════════════

#[test]
fn retirement_waits_for_the_exit_cycle() {
    let (mut state, mut queue, mut stats) = setup(ddr4_config());
    state.issue_command(
        &Command::new(CommandKind::Activate, Address::new(0, 0, 0, 0, 5, 0)),
        0,
        &mut stats,
    );
    assert!(queue.insert(read_req(0, 0, 5, 0)));
    let _ = queue
        .get_command_to_issue(&state, 10, None, &mut stats)
        .unwrap();

    // exit_cycle = 10 + read_delay (16) = 26; retired strictly after.
    assert!(queue.take_retired(26).is_none());
    let req = queue.take_retired(27).unwrap();
    assert_eq!(req.exit_cycle, 26);
}

#[test]
fn rank_idleness_tracks_queue_emptiness() {
    let (mut state, mut queue, mut stats) = setup(ddr4_config());
    assert!(queue.rank_idle(0));
    assert!(queue.insert(read_req(0, 0, 5, 0)));
    assert!(!queue.rank_idle(0));

    state.issue_command(
        &Command::new(CommandKind::Activate, Address::new(0, 0, 0, 0, 5, 0)),
        0,
        &mut stats,
    );
    let _ = queue
        .get_command_to_issue(&state, 10, None, &mut stats)
        .unwrap();
    assert!(queue.rank_idle(0));
    assert_eq!(queue.rank_idle_since(0), 10);
}

#[test]
fn row_hits_under_a_waiting_refresh_are_counted() {
    let (mut state, mut queue, mut stats) = setup(ddr4_config());
    state.issue_command(
        &Command::new(CommandKind::Activate, Address::new(0, 0, 0, 0, 5, 0)),
        0,
        &mut stats,
    );
    let refresh = Command::new(CommandKind::Refresh, Address::new(0, 0, 0, 0, 0, 0));
    state.set_refresh_waiting(&refresh, true);

    assert!(queue.insert(read_req(0, 0, 5, 0)));
    let _ = queue
        .get_command_to_issue(&state, 10, None, &mut stats)
        .unwrap();
    assert_eq!(stats.rw_rowhits_pending_refresh, 1);
}

// ══════════════════════════════════════════════════════════
// 5. Aggressive precharge
// ══════════════════════════════════════════════════════════

#[test]
fn idle_open_row_is_precharged_once_tras_elapses() {
    let (mut state, queue, mut stats) = setup(ddr4_config());
    state.issue_command(
        &Command::new(CommandKind::Activate, Address::new(0, 0, 0, 0, 5, 0)),
        0,
        &mut stats,
    );
    assert!(queue.aggressive_precharge(&state, 23).is_none()); // tRAS = 24
    let cmd = queue.aggressive_precharge(&state, 24).unwrap();
    assert_eq!(cmd.kind, CommandKind::Precharge);
    assert_eq!(cmd.addr.row, 5);
}

#[test]
fn open_row_with_queued_hit_stays_open_below_the_cap() {
    let (mut state, mut queue, mut stats) = setup(ddr4_config());
    state.issue_command(
        &Command::new(CommandKind::Activate, Address::new(0, 0, 0, 0, 5, 0)),
        0,
        &mut stats,
    );
    assert!(queue.insert(read_req(0, 0, 5, 0)));
    assert!(queue.aggressive_precharge(&state, 100).is_none());
}

#[test]
fn row_hit_cap_overrides_queued_hits() {
    let (mut state, mut queue, mut stats) = setup(ddr4_config()); // cap 4
    state.issue_command(
        &Command::new(CommandKind::Activate, Address::new(0, 0, 0, 0, 5, 0)),
        0,
        &mut stats,
    );
    let read = Command::new(CommandKind::Read, Address::new(0, 0, 0, 0, 5, 0));
    for clk in [10, 16, 22, 28] {
        state.issue_command(&read, clk, &mut stats);
    }
    assert_eq!(state.bank(0, 0, 0).row_hit_count(), 4);

    // A row hit is still queued, but the bank has served its cap.
    assert!(queue.insert(read_req(0, 0, 5, 0)));
    let cmd = queue.aggressive_precharge(&state, 33).unwrap();
    assert_eq!(cmd.kind, CommandKind::Precharge);
}
