//! `TimelinePlan` and its validation.

use core::fmt;

use crate::task::{TaskKind, TaskSpec};
use crate::{MAX_PER_SUBFRAME, MAX_TASKS, TASK_NAME_MAX_LEN, Tick};

/// Configuration errors raised by `TimelinePlan::validate`.
///
/// All of these are "compile-time-ish": they describe a malformed static
/// configuration table, not a runtime failure. A plan that fails validation
/// must never be handed to the dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// The plan has no tasks at all.
    EmptyPlan,
    /// More tasks were configured than `MAX_TASKS` allows.
    TooManyTasks { count: usize, max: usize },
    /// `n_subframes * subframe_ticks != major_frame_ticks`.
    FrameTicksMismatch {
        major_frame_ticks: Tick,
        n_subframes: u32,
        subframe_ticks: Tick,
    },
    /// `n_subframes` was zero; a plan must have at least one sub-frame.
    ZeroSubframes,
    /// A `TaskSpec::subframe_id` falls outside `[0, n_subframes)`.
    SubframeOutOfRange { task_index: usize, subframe_id: u32, n_subframes: u32 },
    /// An HRT spec had `deadline_offset <= start_offset`.
    DeadlineNotAfterStart { task_index: usize, start_offset: Tick, deadline_offset: Tick },
    /// An HRT spec's deadline fell beyond the end of its own sub-frame.
    DeadlineExceedsSubframe { task_index: usize, deadline_offset: Tick, subframe_ticks: Tick },
    /// Two HRT specs in the same sub-frame overlap once ordered by start
    /// offset: `spec[i].deadline_offset > spec[i + 1].start_offset`.
    HrtOverlap {
        subframe_id: u32,
        first_task_index: usize,
        second_task_index: usize,
    },
    /// A single sub-frame was assigned more tasks of one kind than
    /// `MAX_PER_SUBFRAME` allows.
    TooManyInSubframe { subframe_id: u32, kind: TaskKind, count: usize, max: usize },
    /// A task name exceeded `TASK_NAME_MAX_LEN` characters.
    NameTooLong { task_index: usize, len: usize, max: usize },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPlan => write!(f, "timeline plan has no tasks"),
            Self::TooManyTasks { count, max } => {
                write!(f, "plan has {count} tasks, exceeding MAX_TASKS ({max})")
            }
            Self::FrameTicksMismatch {
                major_frame_ticks,
                n_subframes,
                subframe_ticks,
            } => write!(
                f,
                "n_subframes ({n_subframes}) * subframe_ticks ({subframe_ticks}) != major_frame_ticks ({major_frame_ticks})"
            ),
            Self::ZeroSubframes => write!(f, "n_subframes must be >= 1"),
            Self::SubframeOutOfRange {
                task_index,
                subframe_id,
                n_subframes,
            } => write!(
                f,
                "task[{task_index}] subframe_id {subframe_id} is out of range [0, {n_subframes})"
            ),
            Self::DeadlineNotAfterStart {
                task_index,
                start_offset,
                deadline_offset,
            } => write!(
                f,
                "task[{task_index}] deadline_offset {deadline_offset} must be > start_offset {start_offset}"
            ),
            Self::DeadlineExceedsSubframe {
                task_index,
                deadline_offset,
                subframe_ticks,
            } => write!(
                f,
                "task[{task_index}] deadline_offset {deadline_offset} exceeds subframe_ticks {subframe_ticks}"
            ),
            Self::HrtOverlap {
                subframe_id,
                first_task_index,
                second_task_index,
            } => write!(
                f,
                "HRT tasks task[{first_task_index}] and task[{second_task_index}] overlap in subframe {subframe_id}"
            ),
            Self::TooManyInSubframe {
                subframe_id,
                kind,
                count,
                max,
            } => write!(
                f,
                "subframe {subframe_id} has {count} {kind:?} tasks, exceeding MAX_PER_SUBFRAME ({max})"
            ),
            Self::NameTooLong { task_index, len, max } => write!(
                f,
                "task[{task_index}] name is {len} characters, exceeding TASK_NAME_MAX_LEN ({max})"
            ),
        }
    }
}

/// Immutable description of the whole cyclic schedule: the major frame
/// length, how it is sliced into equal sub-frames, and the tasks assigned to
/// each sub-frame.
#[derive(Clone, Copy, Debug)]
pub struct TimelinePlan {
    pub major_frame_ticks: Tick,
    pub n_subframes: u32,
    pub subframe_ticks: Tick,
    pub tasks: &'static [TaskSpec],
}

impl TimelinePlan {
    /// Validate every invariant from the data model against this plan.
    ///
    /// Does not allocate and does not touch any dispatcher state; it is safe
    /// to call repeatedly (idempotent — two calls on the same plan always
    /// agree).
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.tasks.is_empty() {
            return Err(ValidationError::EmptyPlan);
        }
        if self.tasks.len() > MAX_TASKS {
            return Err(ValidationError::TooManyTasks {
                count: self.tasks.len(),
                max: MAX_TASKS,
            });
        }
        if self.n_subframes == 0 {
            return Err(ValidationError::ZeroSubframes);
        }
        let expected = (self.n_subframes as u64).saturating_mul(self.subframe_ticks);
        if expected != self.major_frame_ticks {
            return Err(ValidationError::FrameTicksMismatch {
                major_frame_ticks: self.major_frame_ticks,
                n_subframes: self.n_subframes,
                subframe_ticks: self.subframe_ticks,
            });
        }

        for (index, spec) in self.tasks.iter().enumerate() {
            if spec.subframe_id >= self.n_subframes {
                return Err(ValidationError::SubframeOutOfRange {
                    task_index: index,
                    subframe_id: spec.subframe_id,
                    n_subframes: self.n_subframes,
                });
            }
            if spec.name.len() > TASK_NAME_MAX_LEN {
                return Err(ValidationError::NameTooLong {
                    task_index: index,
                    len: spec.name.len(),
                    max: TASK_NAME_MAX_LEN,
                });
            }
            if spec.kind.is_hard() {
                if spec.deadline_offset <= spec.start_offset {
                    return Err(ValidationError::DeadlineNotAfterStart {
                        task_index: index,
                        start_offset: spec.start_offset,
                        deadline_offset: spec.deadline_offset,
                    });
                }
                if spec.deadline_offset > self.subframe_ticks {
                    return Err(ValidationError::DeadlineExceedsSubframe {
                        task_index: index,
                        deadline_offset: spec.deadline_offset,
                        subframe_ticks: self.subframe_ticks,
                    });
                }
            }
        }

        for subframe_id in 0..self.n_subframes {
            self.validate_subframe_capacity(subframe_id, TaskKind::HardRt)?;
            self.validate_subframe_capacity(subframe_id, TaskKind::SoftRt)?;
            self.validate_hrt_ordering(subframe_id)?;
        }

        Ok(())
    }

    fn validate_subframe_capacity(
        &self,
        subframe_id: u32,
        kind: TaskKind,
    ) -> Result<(), ValidationError> {
        let count = self
            .tasks
            .iter()
            .filter(|t| t.subframe_id == subframe_id && t.kind == kind)
            .count();
        if count > MAX_PER_SUBFRAME {
            return Err(ValidationError::TooManyInSubframe {
                subframe_id,
                kind,
                count,
                max: MAX_PER_SUBFRAME,
            });
        }
        Ok(())
    }

    /// HRT specs within one sub-frame, ordered by `start_offset`, must form a
    /// non-overlapping, strictly-increasing schedule.
    fn validate_hrt_ordering(&self, subframe_id: u32) -> Result<(), ValidationError> {
        let mut indices: [usize; MAX_PER_SUBFRAME] = [0; MAX_PER_SUBFRAME];
        let mut count = 0usize;
        for (index, spec) in self.tasks.iter().enumerate() {
            if spec.subframe_id == subframe_id && spec.kind.is_hard() {
                if count < MAX_PER_SUBFRAME {
                    indices[count] = index;
                }
                count += 1;
            }
        }
        let indices = &mut indices[..count.min(MAX_PER_SUBFRAME)];
        indices.sort_by_key(|&i| self.tasks[i].start_offset);

        for pair in indices.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if self.tasks[a].deadline_offset > self.tasks[b].start_offset {
                return Err(ValidationError::HrtOverlap {
                    subframe_id,
                    first_task_index: a,
                    second_task_index: b,
                });
            }
        }
        Ok(())
    }
}
