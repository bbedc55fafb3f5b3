//! `ThreadRuntime` — the one real [`timeline_core::TaskRuntime`]
//! implementation in this workspace, backed by `std::thread`.
//!
//! Grounded on the same spawn/observe/kill shape the teacher's task
//! lifecycle helpers expose, reworked against `std::thread::Builder`
//! instead of a kernel task-control-block allocator. Handles are `Copy`
//! `u64` ids rather than `JoinHandle<()>` itself (which isn't `Copy`), with
//! the real join handle and bookkeeping kept in a side table behind
//! `timeline_lib::SchedMutex`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;

use timeline_core::{SpawnError, TaskRuntime, TaskState};
use timeline_lib::{klog_warn, SchedMutex};

struct Slot {
    join: Option<JoinHandle<()>>,
    /// Set by `kill()`. A safe-Rust host cannot forcibly terminate another
    /// OS thread the way a kernel's `vTaskDelete` can — this flag makes the
    /// slot report `Deleted` to the dispatcher immediately, while the
    /// underlying thread is left to run to completion on its own. This is a
    /// deliberate limitation of this adapter, not of the dispatcher's
    /// contract: a kernel-backed adapter (the one the scheduler was
    /// designed against) can and must kill for real.
    killed: bool,
}

/// A [`TaskRuntime`] that spawns each activation as its own `std::thread`.
///
/// `priority` is accepted and validated (it must be nonzero, matching the
/// contract that HRT activations run strictly above the dispatcher) but is
/// not mapped onto an OS scheduling priority — stable Rust's standard
/// library has no portable thread-priority API, and the teacher's
/// dependency stack doesn't carry one either. A real-time deployment of
/// this dispatcher would plug in a platform-specific adapter instead of
/// this one.
pub struct ThreadRuntime {
    next_id: AtomicU64,
    slots: SchedMutex<HashMap<u64, Slot>>,
}

impl ThreadRuntime {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            slots: SchedMutex::new(HashMap::new()),
        }
    }

    /// Reap any slots whose thread has already finished and whose handle
    /// the dispatcher will never query again (e.g. after a `kill`). Not
    /// required for correctness — `state()` reaps lazily — but keeps the
    /// side table from growing unbounded in a long-running host.
    pub fn reap_finished(&self) {
        self.slots.lock().retain(|_, slot| {
            !slot
                .join
                .as_ref()
                .map(JoinHandle::is_finished)
                .unwrap_or(true)
        });
    }
}

impl Default for ThreadRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRuntime for ThreadRuntime {
    type Handle = u64;

    fn spawn(
        &self,
        entry: fn(),
        name: &str,
        stack_size: usize,
        priority: u8,
    ) -> Result<u64, SpawnError> {
        if priority == 0 {
            klog_warn!("ThreadRuntime: spawning \"{name}\" at priority 0, which the dispatcher contract forbids for HRT activations");
        }
        let join = std::thread::Builder::new()
            .name(name.to_string())
            .stack_size(stack_size)
            .spawn(entry)
            .map_err(|_| SpawnError::OutOfResources)?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.slots.lock().insert(
            id,
            Slot {
                join: Some(join),
                killed: false,
            },
        );
        Ok(id)
    }

    fn state(&self, handle: u64) -> TaskState {
        let mut slots = self.slots.lock();
        let Some(slot) = slots.get_mut(&handle) else {
            return TaskState::Deleted;
        };
        if slot.killed {
            return TaskState::Deleted;
        }
        let finished = slot
            .join
            .as_ref()
            .map(JoinHandle::is_finished)
            .unwrap_or(true);
        if finished {
            if let Some(join) = slot.join.take() {
                let _ = join.join();
            }
            TaskState::Deleted
        } else {
            TaskState::Running
        }
    }

    fn kill(&self, handle: u64) {
        if let Some(slot) = self.slots.lock().get_mut(&handle) {
            slot.killed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    #[test]
    fn spawn_observes_completion() {
        fn body() {}
        let runtime = ThreadRuntime::new();
        let handle = runtime.spawn(body, "quick", 16 * 1024, 5).unwrap();
        for _ in 0..1000 {
            if runtime.state(handle) == TaskState::Deleted {
                return;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        panic!("task never reported Deleted");
    }

    #[test]
    fn kill_marks_handle_deleted_even_if_thread_still_running() {
        fn body() {
            std::thread::sleep(Duration::from_secs(60));
        }
        let runtime = ThreadRuntime::new();
        let handle = runtime.spawn(body, "slow", 16 * 1024, 5).unwrap();
        assert_eq!(runtime.state(handle), TaskState::Running);
        runtime.kill(handle);
        assert_eq!(runtime.state(handle), TaskState::Deleted);
    }

    #[test]
    fn unknown_handle_reports_deleted() {
        let runtime = ThreadRuntime::new();
        assert_eq!(runtime.state(999), TaskState::Deleted);
    }

    #[test]
    fn spawn_failure_surfaces_out_of_resources() {
        // stack_size of usize::MAX reliably fails allocation on every
        // platform this workspace targets.
        fn body() {}
        let runtime = ThreadRuntime::new();
        let result = runtime.spawn(body, "too-big", usize::MAX, 5);
        assert_eq!(result, Err(SpawnError::OutOfResources));
    }

    #[test]
    fn reap_finished_drains_completed_slots() {
        fn body() {}
        let runtime = ThreadRuntime::new();
        let handle = runtime.spawn(body, "quick", 16 * 1024, 5).unwrap();
        let done = AtomicBool::new(false);
        for _ in 0..1000 {
            if runtime
                .slots
                .lock()
                .get(&handle)
                .map(|s| s.join.as_ref().map(JoinHandle::is_finished).unwrap_or(true))
                .unwrap_or(true)
            {
                done.store(true, Ordering::SeqCst);
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(done.load(Ordering::SeqCst));
        runtime.reap_finished();
        assert!(runtime.slots.lock().is_empty());
    }
}
