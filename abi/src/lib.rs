//! Timeline Scheduler ABI types.
//!
//! This crate holds the **configuration surface** consumed by the timeline
//! dispatcher: the static description of a major frame, its sub-frames, and
//! the hard/soft real-time tasks assigned to each. Nothing in here owns
//! runtime state — `TimelinePlan` and `TaskSpec` are immutable once built and
//! are meant to be constructed once at startup and handed to
//! `timeline_core::Dispatcher::init`.
//!
//! Kept `#![no_std]` on purpose: a configuration table has no business
//! depending on an allocator or an OS, and it keeps this crate trivially
//! reusable from a bare-metal host adapter as well as the std one in this
//! workspace.

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]

mod plan;
mod task;

pub use plan::{TimelinePlan, ValidationError};
pub use task::{TaskKind, TaskSpec};

/// Elementary time unit of the underlying kernel's monotonic clock.
pub type Tick = u64;

/// Compile-time cap on the number of tasks a single `TimelinePlan` can hold.
pub const MAX_TASKS: usize = 32;

/// Compile-time cap on HRT (or SRT) tasks assigned to a single sub-frame.
pub const MAX_PER_SUBFRAME: usize = 8;

/// Longest diagnostic name a `TaskSpec` may carry, per the trace line format.
pub const TASK_NAME_MAX_LEN: usize = 16;
