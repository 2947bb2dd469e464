// Original source: https://github.com/fornwall/allocation-counter
//
// Licensed under either of:
// - Apache License, Version 2.0.
// - MIT/X Consortium License
//
// Modifications:
// - Generic over the wrapped allocator instead of hardcoding `System`
// - Counts only while the calling thread has an open tracking window
// - Forwards `alloc_zeroed` and `realloc` to the wrapped allocator

use std::alloc::{GlobalAlloc, Layout, System};

use crate::tracker;

/// Global allocator that forwards to `A` and records traffic for threads that
/// called [`start`](crate::start).
///
/// ```rust,no_run
/// use alloc_track::TrackingAllocator;
///
/// #[global_allocator]
/// static GLOBAL: TrackingAllocator = TrackingAllocator::system();
///
/// fn main() {}
/// ```
///
/// Pointers, layouts and failures are passed through untouched, so swapping
/// it in does not change program behavior.
#[derive(Clone, Copy, Debug, Default)]
pub struct TrackingAllocator<A = System> {
    inner: A,
}

impl TrackingAllocator<System> {
    /// Wraps the platform allocator.
    pub const fn system() -> Self {
        Self { inner: System }
    }
}

impl<A> TrackingAllocator<A> {
    /// Wraps `inner`, which serves every request made through the tracker.
    pub const fn new(inner: A) -> Self {
        Self { inner }
    }
}

unsafe impl<A: GlobalAlloc> GlobalAlloc for TrackingAllocator<A> {
    #[inline]
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { self.inner.alloc(layout) };
        if !ptr.is_null() {
            tracker::record_alloc(layout.size());
        }
        ptr
    }

    #[inline]
    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { self.inner.alloc_zeroed(layout) };
        if !ptr.is_null() {
            tracker::record_alloc(layout.size());
        }
        ptr
    }

    #[inline]
    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        if !ptr.is_null() {
            tracker::record_dealloc();
        }

        unsafe {
            self.inner.dealloc(ptr, layout);
        }
    }

    // Recorded as a release of the old block plus a fresh allocation, the same
    // as the default `realloc` going through `alloc` and `dealloc`.
    #[inline]
    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { self.inner.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            tracker::record_dealloc();
            tracker::record_alloc(new_size);
        }
        new_ptr
    }
}
