//! Ambient runtime support shared by the timeline dispatcher: the clock
//! abstraction, a ticket-locked mutex, a leveled diagnostic logger, and a
//! small fixed-capacity ring buffer kept as ambient infrastructure — no
//! other crate in this workspace consumes it yet (`TraceSink` logs into an
//! unbounded `Vec` instead).
//!
//! Kept separate from `timeline-core` so none of this crate knows what a
//! "task" or a "sub-frame" is — those concepts live entirely in the
//! dispatcher crate that depends on this one.

pub mod clock;
pub mod klog;
pub mod once_lock;
pub mod ring_buffer;
pub mod spinlock;

pub use clock::{Clock, SystemClock};
pub use klog::{KlogLevel, klog_get_level, klog_register_backend, klog_set_level};
pub use once_lock::OnceLock;
pub use ring_buffer::RingBuffer;
pub use spinlock::{SchedMutex, SchedMutexGuard};
