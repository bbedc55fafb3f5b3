//! Leveled diagnostic logging.
//!
//! All internal diagnostic output funnels through a single **backend**
//! function pointer. The default backend writes to stderr; a host can
//! register its own (to fold these lines into an existing log sink) with
//! [`klog_register_backend`].
//!
//! This is deliberately separate from `timeline_core::trace`, the Trace Sink
//! that implements the scheduler's external event-trace contract (§4.3) — a
//! fixed line format that tests match on. `klog` is for free-form internal
//! diagnostics (validation failures, adapter warnings) that carry no such
//! contract.

use core::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::spinlock::SchedMutex;

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KlogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl KlogLevel {
    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => KlogLevel::Error,
            1 => KlogLevel::Warn,
            2 => KlogLevel::Info,
            3 => KlogLevel::Debug,
            _ => KlogLevel::Trace,
        }
    }
}

static CURRENT_LEVEL: AtomicU8 = AtomicU8::new(KlogLevel::Info as u8);

#[inline]
fn is_enabled(level: KlogLevel) -> bool {
    (level as u8) <= CURRENT_LEVEL.load(Ordering::Relaxed)
}

pub type KlogBackend = fn(fmt::Arguments<'_>);

fn stderr_backend(args: fmt::Arguments<'_>) {
    eprintln!("{args}");
}

static BACKEND: SchedMutex<KlogBackend> = SchedMutex::new(stderr_backend);

/// Register a backend that replaces the default stderr writer.
pub fn klog_register_backend(backend: KlogBackend) {
    *BACKEND.lock() = backend;
}

pub fn klog_set_level(level: KlogLevel) {
    CURRENT_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn klog_get_level() -> KlogLevel {
    KlogLevel::from_raw(CURRENT_LEVEL.load(Ordering::Relaxed))
}

pub fn is_enabled_level(level: KlogLevel) -> bool {
    is_enabled(level)
}

/// Emit a formatted log line at the given level.
pub fn log_args(level: KlogLevel, args: fmt::Arguments<'_>) {
    if !is_enabled(level) {
        return;
    }
    let backend = *BACKEND.lock();
    backend(args);
}

#[macro_export]
macro_rules! klog {
    ($level:expr, $($arg:tt)*) => {{
        $crate::klog::log_args($level, ::core::format_args!($($arg)*));
    }};
}

#[macro_export]
macro_rules! klog_error {
    ($($arg:tt)*) => {
        $crate::klog::log_args($crate::klog::KlogLevel::Error, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_warn {
    ($($arg:tt)*) => {
        $crate::klog::log_args($crate::klog::KlogLevel::Warn, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_info {
    ($($arg:tt)*) => {
        $crate::klog::log_args($crate::klog::KlogLevel::Info, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_debug {
    ($($arg:tt)*) => {
        $crate::klog::log_args($crate::klog::KlogLevel::Debug, ::core::format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    static CALLED: AtomicBool = AtomicBool::new(false);
    // klog's level and backend are process-wide globals; serialize the tests
    // that mutate them so they don't race under `cargo test`'s default
    // parallel harness.
    static TEST_LOCK: SchedMutex<()> = SchedMutex::new(());

    fn test_backend(_args: fmt::Arguments<'_>) {
        CALLED.store(true, Ordering::SeqCst);
    }

    #[test]
    fn level_filtering_skips_disabled_levels() {
        let _guard = TEST_LOCK.lock();
        klog_set_level(KlogLevel::Warn);
        assert!(is_enabled_level(KlogLevel::Error));
        assert!(!is_enabled_level(KlogLevel::Info));
        klog_set_level(KlogLevel::Info);
    }

    #[test]
    fn registered_backend_receives_dispatch() {
        let _guard = TEST_LOCK.lock();
        klog_register_backend(test_backend);
        CALLED.store(false, Ordering::SeqCst);
        klog_info!("hello {}", 1);
        assert!(CALLED.load(Ordering::SeqCst));
        klog_register_backend(stderr_backend);
    }
}
