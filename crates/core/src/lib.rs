//! Cycle-accurate DRAM memory-subsystem simulator library.
//!
//! This crate models an off-chip DRAM memory system clock-by-clock under the
//! full JEDEC-style timing constraints of a chosen standard. It provides:
//! 1. **Data model:** Decoded addresses, protocol commands, and in-flight requests.
//! 2. **Timing engine:** Per-bank state machines and the precomputed command-to-command
//!    constraint table (tRCD, tRP, tRAS, tCCD, tFAW, tRFC, ...).
//! 3. **Scheduling:** Per-bank/per-rank command queues with FR-FCFS arbitration,
//!    HBM dual issue, and aggressive precharging.
//! 4. **Refresh:** tREFI-driven all-bank and per-bank refresh plus self-refresh
//!    entry/exit on prolonged idleness.
//! 5. **Front-end:** `MemorySystem` (address-to-channel routing, host callbacks),
//!    per-channel statistics with energy accounting, and a validation command trace.

/// Channel internals: bank state, channel state, command queue, refresh, controller.
pub mod channel;
/// Common types (addresses, commands, requests, configuration errors).
pub mod common;
/// Simulator configuration (sections, protocol enums, derived parameters).
pub mod config;
/// Per-channel statistics collection and reporting.
pub mod stats;
/// Memory-system front-end: transaction routing and the global clock.
pub mod system;
/// Precomputed command-to-command timing-constraint table.
pub mod timing;
/// Validation command-trace writer.
pub mod trace;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Top-level memory system; owns one controller per channel.
pub use crate::system::MemorySystem;
