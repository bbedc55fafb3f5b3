//! Task Runtime Adapter (§4.2): the dispatcher's sole window onto the
//! underlying kernel's task primitives.
//!
//! The dispatcher never creates threads, touches stacks, or compares
//! priorities directly — it calls through this trait, the same separation
//! the teacher draws between `timeline_core::Dispatcher` (policy) and
//! whatever concrete executor a host links in (mechanism). `timeline-host`
//! provides the one real implementation in this workspace, backed by
//! `std::thread`.
//!
//! Per the design note on implicit self-deletion: a `TaskSpec::entry` is a
//! plain `fn()` that simply returns when its work is done. The adapter, not
//! the worker body, is responsible for tearing down whatever execution
//! context backs it (thread, stack, kernel task control block) once it
//! observes the return — the "must call `vTaskDelete(NULL)`" footgun from
//! the source design is gone by construction.

use core::fmt;

/// Observed lifecycle state of a spawned activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// The worker is still executing (or, ambiguously, its wrapper hasn't
    /// yet recorded a return — see `state()`'s docs).
    Running,
    /// The worker's `entry` returned (or it was force-killed) and the
    /// adapter has torn down its execution context.
    Deleted,
}

/// The one runtime error this adapter surfaces: the underlying kernel could
/// not allocate whatever a worker activation needs (thread, stack, task
/// control block).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnError {
    OutOfResources,
}

impl fmt::Display for SpawnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfResources => write!(f, "task runtime out of resources"),
        }
    }
}

/// Stack size handed to `spawn` for every HRT activation. The dispatcher
/// itself has no opinion on worker stack contents; this is just a size
/// large enough for the kind of short, bounded bodies §1 describes as this
/// scheduler's target workload.
pub const MIN_STACK_SIZE: usize = 64 * 1024;

/// Creates, observes, and forcibly terminates worker activations (§4.2).
///
/// Implementations MUST give a spawned worker a priority strictly above the
/// dispatcher's own — §4.4.6 and the design notes call this out explicitly:
/// violating it turns the monitor loop (§4.4.3 step 7) into a spin that
/// never sees the worker progress, since the dispatcher would never yield
/// the CPU to it.
pub trait TaskRuntime: Send + Sync {
    /// Opaque handle to a spawned activation. Cheap to copy; meaningless
    /// once `state()` reports `Deleted`.
    type Handle: Copy + Send + Sync + fmt::Debug;

    /// Create a new worker running `entry` to completion. `priority` MUST
    /// be strictly greater than the dispatcher's own priority.
    fn spawn(
        &self,
        entry: fn(),
        name: &str,
        stack_size: usize,
        priority: u8,
    ) -> Result<Self::Handle, SpawnError>;

    /// Observe a worker's lifecycle state.
    fn state(&self, handle: Self::Handle) -> TaskState;

    /// Forcibly tear down a worker. Idempotent: killing an already-deleted
    /// handle is a no-op.
    fn kill(&self, handle: Self::Handle);
}
