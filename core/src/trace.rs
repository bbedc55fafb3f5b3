//! Trace Sink (§4.3): a mutex-protected, append-only, line-oriented event
//! log keyed by tick, task name, and event kind.
//!
//! The line format and event vocabulary are part of the external contract —
//! §6 says tests match on it — so `EventKind::as_str` and `TraceSink::log`'s
//! formatting must not drift from what's written here once anything depends
//! on it. Grounded on the trace module this scheduler's external-collaborator
//! kernel originally shipped: one mutex, one format string, one append.

use std::fmt;

use timeline_abi::Tick;
use timeline_lib::SchedMutex;

/// Diagnostic identity the dispatcher logs under for frame/sub-frame/idle
/// transitions — it isn't a `TaskSpec`, so it needs its own name.
pub const SCHEDULER_NAME: &str = "Scheduler";

/// Exhaustive event-kind vocabulary (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    MajorFrameStart,
    SubframeStart,
    TaskSpawn,
    TaskComplete,
    DeadlineMiss,
    TaskCreateFailed,
    IdleStart,
    IdleEnd,
}

impl EventKind {
    /// The exact token this event contributes to a trace line's event-text
    /// field — this is the external contract, not a `Debug` convenience.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MajorFrameStart => "MAJOR_FRAME_START",
            Self::SubframeStart => "SUBFRAME_START",
            Self::TaskSpawn => "TASK_SPAWN",
            Self::TaskComplete => "TASK_COMPLETE",
            Self::DeadlineMiss => "DEADLINE_MISS",
            Self::TaskCreateFailed => "TASK_CREATE_FAILED",
            Self::IdleStart => "IDLE_START",
            Self::IdleEnd => "IDLE_END",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logged event, retained in the sink's in-memory buffer alongside
/// whatever the backend does with the formatted line. Tests read this back
/// to check the dispatcher's state-machine grammar (§8) directly, instead
/// of re-parsing formatted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRecord {
    pub tick: Tick,
    pub name: String,
    pub kind: EventKind,
}

/// Backend a [`TraceSink`] forwards formatted lines to. The default prints
/// to stdout; a host can register its own to route these lines to a file,
/// a UART emulation, or a test-capture buffer.
pub type TraceBackend = fn(&str);

fn stdout_backend(line: &str) {
    print!("{line}");
}

struct Inner {
    backend: TraceBackend,
    records: Vec<TraceRecord>,
}

/// Append-only event log, mutex-serialized so concurrent loggers (the
/// dispatcher and any in-line SRT body) observe a total order equal to the
/// order in which they acquired the lock (§4.3, §5).
pub struct TraceSink {
    inner: SchedMutex<Inner>,
}

impl TraceSink {
    pub const fn new() -> Self {
        Self {
            inner: SchedMutex::new(Inner {
                backend: stdout_backend,
                records: Vec::new(),
            }),
        }
    }

    /// Replace the line backend. Useful for redirecting output in a host
    /// binary, or silencing stdout in a test run while still inspecting
    /// `events()`.
    pub fn register_backend(&self, backend: TraceBackend) {
        self.inner.lock().backend = backend;
    }

    /// Format and emit one trace line: `"[<tick>] <name>: <event>\r\n"`,
    /// ticks right-aligned to width 5 and names left-aligned to width 10 —
    /// the fixed layout §6 calls out as part of the external contract.
    pub fn log(&self, kind: EventKind, name: &str, tick: Tick) {
        let line = format!("[{tick:>5}] {name:<10}: {kind}\r\n");
        let mut guard = self.inner.lock();
        (guard.backend)(&line);
        guard.records.push(TraceRecord {
            tick,
            name: name.to_string(),
            kind,
        });
    }

    /// Snapshot of every record logged so far, in emission order.
    pub fn events(&self) -> Vec<TraceRecord> {
        self.inner.lock().records.clone()
    }
}

impl Default for TraceSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn log_line_matches_fixed_format() {
        let sink = TraceSink::new();
        sink.register_backend(|_| {});
        sink.log(EventKind::TaskSpawn, "A", 7);
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].tick, 7);
        assert_eq!(events[0].name, "A");
        assert_eq!(events[0].kind, EventKind::TaskSpawn);
    }

    #[test]
    fn event_kind_as_str_matches_vocabulary() {
        assert_eq!(EventKind::MajorFrameStart.as_str(), "MAJOR_FRAME_START");
        assert_eq!(EventKind::SubframeStart.as_str(), "SUBFRAME_START");
        assert_eq!(EventKind::TaskSpawn.as_str(), "TASK_SPAWN");
        assert_eq!(EventKind::TaskComplete.as_str(), "TASK_COMPLETE");
        assert_eq!(EventKind::DeadlineMiss.as_str(), "DEADLINE_MISS");
        assert_eq!(EventKind::TaskCreateFailed.as_str(), "TASK_CREATE_FAILED");
        assert_eq!(EventKind::IdleStart.as_str(), "IDLE_START");
        assert_eq!(EventKind::IdleEnd.as_str(), "IDLE_END");
    }

    #[test]
    fn concurrent_loggers_produce_total_order_with_no_interleaving() {
        let sink = Arc::new(TraceSink::new());
        sink.register_backend(|_| {});
        let counter = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let sink = Arc::clone(&sink);
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..100 {
                        let tick = counter.fetch_add(1, Ordering::SeqCst) as Tick;
                        sink.log(EventKind::TaskSpawn, "A", tick);
                        let _ = i;
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(sink.events().len(), 800);
    }
}
