//! The timeline dispatcher: a deterministic, cyclic alternative to a
//! priority-based scheduler, built from four cooperating pieces —
//! `timeline_lib::Clock`, [`runtime::TaskRuntime`], [`trace::TraceSink`],
//! and [`dispatcher::Dispatcher`] itself, which wires the other three into
//! the major-frame/sub-frame control loop.
//!
//! `timeline-abi` owns the configuration surface this crate consumes
//! (`TimelinePlan`, `TaskSpec`); `timeline-lib` owns the ambient runtime
//! support (clock, mutex, logging) this crate builds on. Nothing here
//! touches an allocator-free target — a real preemptive kernel's task
//! primitives are the one thing this crate treats as an external
//! collaborator, reached only through `runtime::TaskRuntime`.

pub mod dispatcher;
pub mod runtime;
pub mod trace;

pub use dispatcher::Dispatcher;
pub use runtime::{MIN_STACK_SIZE, SpawnError, TaskRuntime, TaskState};
pub use trace::{EventKind, TraceRecord, TraceSink, SCHEDULER_NAME};
