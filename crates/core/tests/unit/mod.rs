//! # Unit Components
//!
//! This module is the hub for component-level tests of the simulator:
//! the data model, the timing engine, scheduling, refresh, and the
//! end-to-end command-sequence scenarios.

/// Address decode/encode and mapping-string validation.
pub mod addr;


/// Channel state: activation windows, rank-wide commands, propagation.
pub mod channel_state;


/// FR-FCFS queues: capacity, ordering, and row-hit preference.
pub mod queue;

/// Refresh insertion, preparation, and self-refresh interaction.
pub mod refresh;
