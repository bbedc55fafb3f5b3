//! Timeline Dispatcher (§4.4): the cyclic controller that owns the static
//! task plan, drives sub-frame boundaries, activates the HRT set honoring
//! per-task offsets and deadlines, fills residual sub-frame time with
//! best-effort SRT activations, and logs every transition.
//!
//! This is the module the spec's line budget weights heaviest, and it's
//! where every other component (`Clock`, `TaskRuntime`, `TraceSink`) gets
//! wired together into the control loop §4.4.2 through §4.4.5 describe.

use timeline_abi::{TaskKind, TaskSpec, TimelinePlan, ValidationError};
use timeline_lib::clock::tick_reached;
use timeline_lib::{Clock, SchedMutex};

use crate::runtime::{MIN_STACK_SIZE, SpawnError, TaskRuntime, TaskState};
use crate::trace::{EventKind, SCHEDULER_NAME, TraceSink};

/// Per-sub-frame derived view of a `TimelinePlan`: which `tasks` indices are
/// HRT (ordered by `start_offset`, per the non-overlapping invariant) and
/// which are SRT (kept in configured order — §4.4.4 iterates them "in
/// configured order").
#[derive(Debug, Clone, Default)]
struct SubframePlan {
    hrt: Vec<usize>,
    srt: Vec<usize>,
}

fn derive_subframes(plan: &TimelinePlan) -> Vec<SubframePlan> {
    let mut subframes: Vec<SubframePlan> = (0..plan.n_subframes)
        .map(|_| SubframePlan::default())
        .collect();

    for (index, spec) in plan.tasks.iter().enumerate() {
        let slot = &mut subframes[spec.subframe_id as usize];
        match spec.kind {
            TaskKind::HardRt => slot.hrt.push(index),
            TaskKind::SoftRt => slot.srt.push(index),
        }
    }
    for subframe in &mut subframes {
        subframe
            .hrt
            .sort_by_key(|&index| plan.tasks[index].start_offset);
    }
    subframes
}

/// State machine per managed slot (§4.4.5): `Idle -> Spawned -> (Completed |
/// Killed) -> Idle` at the start of the slot's next activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Idle,
    Spawned,
    Completed,
    Killed,
}

/// Dispatcher-owned, mutable per-activation state for one `TaskSpec` (§3's
/// `ManagedTask`). Indexed 1:1 with `TimelinePlan::tasks`.
struct ManagedTask<H> {
    handle: Option<H>,
    state: SlotState,
}

impl<H> Default for ManagedTask<H> {
    fn default() -> Self {
        Self {
            handle: None,
            state: SlotState::Idle,
        }
    }
}

/// The cyclic controller (§4.4). Owns the plan, the derived sub-frame
/// views, the managed-task table, the trace sink, and its collaborators —
/// the clock and the task runtime adapter.
pub struct Dispatcher<R: TaskRuntime, C: Clock> {
    plan: &'static TimelinePlan,
    subframes: Vec<SubframePlan>,
    managed: SchedMutex<Vec<ManagedTask<R::Handle>>>,
    trace: TraceSink,
    runtime: R,
    clock: C,
    priority: u8,
}

impl<R: TaskRuntime, C: Clock> Dispatcher<R, C> {
    /// Validate `plan` against every §3/§7 invariant, derive the sub-frame
    /// views, and zero the managed-task table (§4.4.1). Returns
    /// `VALIDATION_ERROR` without touching `runtime` or `clock` if `plan`
    /// doesn't validate — idempotent: two `init` calls on the same
    /// plan-and-collaborators always agree.
    ///
    /// `priority` is the dispatcher's own priority; every spawned HRT
    /// activation runs at `priority + 1`, which callers must ensure the
    /// `runtime` actually honors (§4.4.6, §9).
    pub fn init(
        plan: &'static TimelinePlan,
        runtime: R,
        clock: C,
        priority: u8,
    ) -> Result<Self, ValidationError> {
        plan.validate()?;
        let subframes = derive_subframes(plan);
        let managed = (0..plan.tasks.len()).map(|_| ManagedTask::default()).collect();
        Ok(Self {
            plan,
            subframes,
            managed: SchedMutex::new(managed),
            trace: TraceSink::new(),
            runtime,
            clock,
            priority,
        })
    }

    /// Priority every HRT activation is spawned at: strictly above the
    /// dispatcher's own (§4.4.6).
    fn hrt_priority(&self) -> u8 {
        self.priority + 1
    }

    /// Read-only access to the trace sink, e.g. for a host to register a
    /// custom backend, or a test to inspect `events()`.
    pub fn trace(&self) -> &TraceSink {
        &self.trace
    }

    /// Number of managed slots currently holding a live activation handle.
    /// Exposed for introspection and tests — the dispatcher's own control
    /// flow never needs to ask, since HRT phases run strictly sequentially
    /// and a slot is always brought back to idle before its next
    /// activation (§4.4.5).
    pub fn active_count(&self) -> usize {
        self.managed.lock().iter().filter(|m| m.handle.is_some()).count()
    }

    /// Whether the managed slot for `plan.tasks[task_index]` is idle. Used
    /// by tests to confirm the state machine always settles back to `Idle`
    /// between activations.
    fn slot_is_idle(&self, task_index: usize) -> bool {
        self.managed.lock()[task_index].state == SlotState::Idle
    }

    /// Run the major-frame loop forever (§4.4.2). `start()` in the spec's
    /// vocabulary is folded into this call: there is no separate "armed but
    /// not yet looping" state to model on a host where the dispatcher is
    /// just a function running on its own thread.
    pub fn run(&self) -> ! {
        let e0 = self.clock.now();
        let mut cycle: u64 = 0;
        loop {
            self.run_cycle(e0, cycle);
            cycle = cycle.wrapping_add(1);
        }
    }

    /// Run exactly `cycles` major frames starting from `now()` and return.
    /// Not part of the spec's public contract — `run()` never returns — but
    /// this is how the scenarios in §8 get driven deterministically without
    /// spawning a thread to race a test's assertions against.
    pub fn run_cycles(&self, cycles: u64) {
        let e0 = self.clock.now();
        for cycle in 0..cycles {
            self.run_cycle(e0, cycle);
        }
    }

    fn run_cycle(&self, e0: u64, cycle: u64) {
        let frame_epoch = e0 + cycle * self.plan.major_frame_ticks;
        self.clock.sleep_until(frame_epoch);
        self.trace
            .log(EventKind::MajorFrameStart, SCHEDULER_NAME, self.clock.now());

        for (s, subframe) in self.subframes.iter().enumerate() {
            let sub_epoch = frame_epoch + (s as u64) * self.plan.subframe_ticks;
            self.clock.sleep_until(sub_epoch);
            self.trace
                .log(EventKind::SubframeStart, SCHEDULER_NAME, self.clock.now());

            self.run_hrt_phase(subframe, sub_epoch);
            self.run_srt_phase(subframe, sub_epoch);
        }

        self.trace
            .log(EventKind::IdleStart, SCHEDULER_NAME, self.clock.now());
        self.clock.sleep_until(frame_epoch + self.plan.major_frame_ticks);
        self.trace
            .log(EventKind::IdleEnd, SCHEDULER_NAME, self.clock.now());
    }

    /// §4.4.3: serially activate the HRT set of one sub-frame in
    /// start-offset order, honoring each spec's start and deadline.
    fn run_hrt_phase(&self, subframe: &SubframePlan, sub_epoch: u64) {
        for &task_index in &subframe.hrt {
            let spec = &self.plan.tasks[task_index];
            let abs_start = sub_epoch + spec.start_offset;
            let abs_deadline = sub_epoch + spec.deadline_offset;

            // Edge case: if a prior HRT ran long and was just killed at its
            // own deadline, `now()` may already be past `abs_start` —
            // `sleep_until` returns immediately and we start right away.
            self.clock.sleep_until(abs_start);

            // Edge case: the deadline may already be behind us before we
            // even spawn (e.g. abs_start == abs_deadline for a
            // misconfigured-but-valid plan, or clock jitter). Log the miss
            // without ever spawning.
            if tick_reached(self.clock.now(), abs_deadline) {
                self.trace
                    .log(EventKind::DeadlineMiss, spec.name, self.clock.now());
                continue;
            }

            self.set_slot(task_index, None, SlotState::Idle);
            match self.spawn_hrt(spec) {
                Err(_) => {
                    self.trace
                        .log(EventKind::TaskCreateFailed, spec.name, self.clock.now());
                }
                Ok(handle) => {
                    self.set_slot(task_index, Some(handle), SlotState::Spawned);
                    self.trace
                        .log(EventKind::TaskSpawn, spec.name, self.clock.now());
                    self.monitor_until_terminal(task_index, spec, handle, abs_deadline);
                }
            }
        }
    }

    fn spawn_hrt(&self, spec: &TaskSpec) -> Result<R::Handle, SpawnError> {
        self.runtime
            .spawn(spec.entry, spec.name, MIN_STACK_SIZE, self.hrt_priority())
    }

    /// §4.4.3 step 7: poll until the slot reaches a terminal state, either
    /// self-completion or deadline-triggered kill.
    fn monitor_until_terminal(
        &self,
        task_index: usize,
        spec: &TaskSpec,
        handle: R::Handle,
        abs_deadline: u64,
    ) {
        loop {
            if self.runtime.state(handle) == TaskState::Deleted {
                self.set_slot(task_index, None, SlotState::Completed);
                self.trace
                    .log(EventKind::TaskComplete, spec.name, self.clock.now());
                return;
            }
            if tick_reached(self.clock.now(), abs_deadline) {
                self.runtime.kill(handle);
                self.set_slot(task_index, None, SlotState::Killed);
                self.trace
                    .log(EventKind::DeadlineMiss, spec.name, self.clock.now());
                return;
            }
            self.clock.yield_once();
        }
    }

    /// §4.4.4: run the SRT set in-line, in configured order, until the
    /// sub-frame's time is exhausted. Remaining SRTs are silently dropped —
    /// no trace entry, by design (§9's open question resolves to "stay
    /// silent," matching the behavior this scheduler was distilled from).
    fn run_srt_phase(&self, subframe: &SubframePlan, sub_epoch: u64) {
        let sub_end = sub_epoch + self.plan.subframe_ticks;
        for &task_index in &subframe.srt {
            if tick_reached(self.clock.now(), sub_end) {
                break;
            }
            let spec = &self.plan.tasks[task_index];
            (spec.entry)();
        }
    }

    fn set_slot(&self, task_index: usize, handle: Option<R::Handle>, state: SlotState) {
        let mut managed = self.managed.lock();
        managed[task_index].handle = handle;
        managed[task_index].state = state;
    }
}
