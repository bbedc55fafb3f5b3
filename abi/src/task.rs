//! Task configuration types.

use crate::Tick;

/// Dispatch discipline of a `TaskSpec`.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskKind {
    /// Hard Real-Time: has a start offset and a deadline; the dispatcher
    /// terminates the activation if it is still running at the deadline.
    HardRt = 0,
    /// Soft Real-Time: best-effort, run in-line in residual sub-frame time.
    /// No deadline is enforced.
    SoftRt = 1,
}

impl TaskKind {
    #[inline]
    pub const fn is_hard(self) -> bool {
        matches!(self, Self::HardRt)
    }

    #[inline]
    pub const fn is_soft(self) -> bool {
        matches!(self, Self::SoftRt)
    }
}

/// Immutable, statically configured description of one task activation slot
/// within a sub-frame.
///
/// `TaskSpec`s are produced once at startup (typically as `const` items or a
/// `'static` table) and never mutated; the dispatcher only ever reads them.
#[derive(Clone, Copy, Debug)]
pub struct TaskSpec {
    /// Diagnostic identity, used verbatim in trace lines. Must fit within
    /// [`crate::TASK_NAME_MAX_LEN`] characters.
    pub name: &'static str,
    /// Worker body. MUST run to completion and return; the task runtime
    /// adapter tears the execution context down on return (see
    /// `timeline_core::runtime::TaskRuntime`).
    pub entry: fn(),
    /// Dispatch discipline.
    pub kind: TaskKind,
    /// Earliest activation instant, in ticks relative to the owning
    /// sub-frame's start.
    pub start_offset: Tick,
    /// Absolute deadline, in ticks relative to the owning sub-frame's start.
    /// Ignored when `kind` is `SoftRt`.
    pub deadline_offset: Tick,
    /// Index of the sub-frame this spec is assigned to, in `[0, n_subframes)`.
    pub subframe_id: u32,
}

impl TaskSpec {
    /// A hard real-time task with a start offset and a deadline.
    pub const fn hard(
        name: &'static str,
        entry: fn(),
        start_offset: Tick,
        deadline_offset: Tick,
        subframe_id: u32,
    ) -> Self {
        Self {
            name,
            entry,
            kind: TaskKind::HardRt,
            start_offset,
            deadline_offset,
            subframe_id,
        }
    }

    /// A soft real-time task. Runs best-effort with no deadline; `start_offset`
    /// only affects iteration order relative to other SRT specs in the same
    /// sub-frame.
    pub const fn soft(name: &'static str, entry: fn(), subframe_id: u32) -> Self {
        Self {
            name,
            entry,
            kind: TaskKind::SoftRt,
            start_offset: 0,
            deadline_offset: 0,
            subframe_id,
        }
    }
}
