//! Per-thread tracking window.
//!
//! Every thread owns one [`TrackingState`]. It is only ever read or written by
//! that thread, so plain `Cell`s are enough and the allocator hot path stays
//! free of atomics and locks.

use std::cell::Cell;

use crate::stats::AllocationStats;

struct TrackingState {
    enabled: Cell<bool>,
    allocations: Cell<u64>,
    deallocations: Cell<u64>,
    bytes_allocated: Cell<u64>,
}

impl TrackingState {
    #[inline]
    fn snapshot(&self) -> AllocationStats {
        AllocationStats {
            allocations: self.allocations.get(),
            deallocations: self.deallocations.get(),
            bytes_allocated: self.bytes_allocated.get(),
        }
    }

    #[inline]
    fn reset(&self) {
        self.allocations.set(0);
        self.deallocations.set(0);
        self.bytes_allocated.set(0);
    }
}

// Const-initialized and without a destructor: accessing it never allocates,
// which is required since the allocator itself reads it.
thread_local! {
    static TRACKING: TrackingState = const { TrackingState {
        enabled: Cell::new(false),
        allocations: Cell::new(0),
        deallocations: Cell::new(0),
        bytes_allocated: Cell::new(0),
    } };
}

/// Opens a new tracking window on the calling thread.
///
/// Counters are reset to zero. A window that is already open is discarded,
/// windows do not nest.
pub fn start() {
    TRACKING.with(|state| {
        state.reset();
        state.enabled.set(true);
    });
}

/// Closes the tracking window on the calling thread and returns what it saw.
///
/// The returned value stays available through [`current`] until the next
/// [`start`].
pub fn stop() -> AllocationStats {
    TRACKING.with(|state| {
        state.enabled.set(false);
        state.snapshot()
    })
}

/// Returns the calling thread's counters without changing the tracking state.
pub fn current() -> AllocationStats {
    TRACKING.with(TrackingState::snapshot)
}

/// Whether a tracking window is open on the calling thread.
pub fn is_tracking() -> bool {
    TRACKING.with(|state| state.enabled.get())
}

/// Called by the interposed allocation entry points after a successful
/// allocation of `size` bytes.
#[inline]
pub(crate) fn record_alloc(size: usize) {
    // The allocator can still run while thread locals are torn down.
    let _ = TRACKING.try_with(|state| {
        if !state.enabled.get() {
            return;
        }
        state.allocations.set(state.allocations.get().wrapping_add(1));
        state
            .bytes_allocated
            .set(state.bytes_allocated.get().wrapping_add(size as u64));
    });
}

/// Called by the interposed release entry points before a non-null pointer is
/// handed back to the real allocator.
#[inline]
pub(crate) fn record_dealloc() {
    let _ = TRACKING.try_with(|state| {
        if !state.enabled.get() {
            return;
        }
        state
            .deallocations
            .set(state.deallocations.get().wrapping_add(1));
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_disabled_and_zero() {
        let (tracking, before, after) = std::thread::spawn(|| {
            let tracking = is_tracking();
            let before = current();
            record_alloc(64);
            record_dealloc();
            (tracking, before, current())
        })
        .join()
        .expect("thread panicked");

        assert!(!tracking);
        assert_eq!(before, AllocationStats::ZERO);
        assert_eq!(after, AllocationStats::ZERO);
    }

    #[test]
    fn test_counts_inside_window() {
        start();
        assert!(is_tracking());

        record_alloc(10);
        record_alloc(20);
        record_dealloc();

        let stats = stop();
        assert!(!is_tracking());
        assert_eq!(
            stats,
            AllocationStats {
                allocations: 2,
                deallocations: 1,
                bytes_allocated: 30,
            }
        );
    }

    #[test]
    fn test_current_reports_running_totals() {
        start();
        record_alloc(7);
        assert_eq!(current().allocations, 1);
        assert_eq!(current().bytes_allocated, 7);
        assert!(is_tracking());

        record_alloc(3);
        assert_eq!(current().bytes_allocated, 10);
        stop();
    }

    #[test]
    fn test_start_resets_open_window() {
        start();
        record_alloc(100);
        record_dealloc();

        start();
        assert_eq!(current(), AllocationStats::ZERO);

        record_alloc(1);
        assert_eq!(
            stop(),
            AllocationStats {
                allocations: 1,
                deallocations: 0,
                bytes_allocated: 1,
            }
        );
    }

    #[test]
    fn test_stop_freezes_counters() {
        start();
        record_alloc(16);
        let stopped = stop();

        record_alloc(32);
        record_dealloc();

        assert_eq!(current(), stopped);
        // Stopping again keeps the frozen value.
        assert_eq!(stop(), stopped);
    }

    #[test]
    fn test_bytes_wrap_on_overflow() {
        start();
        record_alloc(usize::MAX);
        record_alloc(usize::MAX);
        let stats = stop();

        assert_eq!(stats.allocations, 2);
        assert_eq!(
            stats.bytes_allocated,
            (usize::MAX as u64).wrapping_add(usize::MAX as u64)
        );
    }

    #[test]
    fn test_state_is_per_thread() {
        use std::sync::{Arc, Barrier};

        let barrier = Arc::new(Barrier::new(2));
        let other = {
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                record_alloc(1024);
                let seen = (is_tracking(), current());
                barrier.wait();
                seen
            })
        };

        // Spawning and joining allocate, keep both outside the window.
        start();
        record_alloc(8);
        barrier.wait();
        barrier.wait();
        let stats = stop();

        let other = other.join().expect("thread panicked");
        assert_eq!(other, (false, AllocationStats::ZERO));
        assert_eq!(stats.bytes_allocated, 8);
    }
}
