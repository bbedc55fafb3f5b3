//! `SchedMutex` — a ticket-locked mutex for the dispatcher's shared state
//! (the trace sink, the managed-task table).
//!
//! A ticket-lock design: each acquirer takes a monotonically-increasing
//! ticket and spins until
//! `now_serving` matches, which gives FIFO fairness under contention. The
//! host build has no interrupts to disable and no preemption to defer, so
//! the IRQ save/restore and `PreemptGuard` machinery that wraps the teacher's
//! version is dropped — what's left is the ticket-lock fairness itself, plus
//! the poisoning semantics used to mark the trace sink unusable after a
//! panic mid-critical-section.

use std::cell::UnsafeCell;
use std::hint::spin_loop;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};

/// Mutex using a ticket lock internally for FIFO fairness: each acquirer
/// takes a monotonically-increasing ticket and spins until `now_serving`
/// matches. This guarantees waiters are served in the order they arrived,
/// which the dispatcher's single-threaded critical sections don't strictly
/// need but the trace sink (written from the dispatcher and, in tests, from
/// asserting helper threads) benefits from.
pub struct SchedMutex<T> {
    next_ticket: AtomicU16,
    now_serving: AtomicU16,
    poisoned: AtomicBool,
    data: UnsafeCell<T>,
}

// SAFETY: SchedMutex provides exclusive access through ticket-lock
// acquisition, making it safe to share across threads.
unsafe impl<T: Send> Send for SchedMutex<T> {}
unsafe impl<T: Send> Sync for SchedMutex<T> {}

pub struct SchedMutexGuard<'a, T> {
    mutex: &'a SchedMutex<T>,
}

impl<T> SchedMutex<T> {
    #[inline]
    pub const fn new(data: T) -> Self {
        Self {
            next_ticket: AtomicU16::new(0),
            now_serving: AtomicU16::new(0),
            poisoned: AtomicBool::new(false),
            data: UnsafeCell::new(data),
        }
    }

    /// Returns true if a prior holder's critical section panicked and was
    /// unwound without the guard running its normal drop path.
    #[inline]
    pub fn is_poisoned(&self) -> bool {
        self.poisoned.load(Ordering::Acquire)
    }

    /// Clear the poisoned state after the protected data's invariants have
    /// been verified or restored.
    #[inline]
    pub fn clear_poison(&self) {
        self.poisoned.store(false, Ordering::Release);
    }

    /// Check if the lock is currently held (or has waiters).
    #[inline]
    pub fn is_locked(&self) -> bool {
        let next = self.next_ticket.load(Ordering::Relaxed);
        let serving = self.now_serving.load(Ordering::Relaxed);
        next != serving
    }

    #[inline]
    pub fn lock(&self) -> SchedMutexGuard<'_, T> {
        // Take a ticket. fetch_add wraps at u16::MAX → 0; equality checks
        // are wrap-safe so this is correct for any number of acquisitions.
        let my_ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);

        loop {
            let serving = self.now_serving.load(Ordering::Acquire);
            if serving == my_ticket {
                break;
            }
            let distance = my_ticket.wrapping_sub(serving) as u32;
            for _ in 0..distance.min(64) {
                spin_loop();
            }
        }

        SchedMutexGuard { mutex: self }
    }

    #[inline]
    pub fn try_lock(&self) -> Option<SchedMutexGuard<'_, T>> {
        let current = self.now_serving.load(Ordering::Relaxed);
        if self
            .next_ticket
            .compare_exchange(
                current,
                current.wrapping_add(1),
                Ordering::Acquire,
                Ordering::Relaxed,
            )
            .is_ok()
        {
            Some(SchedMutexGuard { mutex: self })
        } else {
            None
        }
    }
}

impl<T> Deref for SchedMutexGuard<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        unsafe { &*self.mutex.data.get() }
    }
}

impl<T> DerefMut for SchedMutexGuard<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.mutex.data.get() }
    }
}

impl<T> Drop for SchedMutexGuard<'_, T> {
    #[inline]
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.mutex.poisoned.store(true, Ordering::Release);
        }
        // Advance now_serving to hand the lock to the next waiter in FIFO
        // order. Release ordering makes our writes visible to the next
        // acquirer.
        self.mutex.now_serving.fetch_add(1, Ordering::Release);
    }
}
