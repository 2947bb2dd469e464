//! C-ABI replacements for `malloc` and `free`.
//!
//! Linked into an executable (or loaded ahead of the C library as a shared
//! object) these definitions take the place of the C library's, forward to
//! the next definition found through `dlsym(RTLD_NEXT)`, and record the
//! traffic of threads that opened a tracking window.

use std::ffi::c_void;

use crate::resolver::{self, Binding};
use crate::tracker;

/// # Safety
///
/// Same contract as the C library's `malloc`.
#[no_mangle]
pub unsafe extern "C" fn malloc(size: libc::size_t) -> *mut c_void {
    unsafe { allocate(resolver::ensure_initialized(), size) }
}

/// # Safety
///
/// Same contract as the C library's `free`: `ptr` is null or was returned by
/// this `malloc` and has not been freed yet.
#[no_mangle]
pub unsafe extern "C" fn free(ptr: *mut c_void) {
    unsafe { release(resolver::ensure_initialized(), ptr) }
}

#[inline]
unsafe fn allocate(binding: Binding, size: libc::size_t) -> *mut c_void {
    let real = match binding {
        Binding::Real(real) => real,
        Binding::Bootstrap => return resolver::bootstrap_alloc(size),
    };

    let ptr = unsafe { (real.malloc)(size) };
    if !ptr.is_null() {
        tracker::record_alloc(size);
    }
    ptr
}

#[inline]
unsafe fn release(binding: Binding, ptr: *mut c_void) {
    let real = match binding {
        Binding::Real(real) => real,
        // Only arena blocks exist before the real allocator is bound.
        Binding::Bootstrap => return,
    };

    if resolver::is_bootstrap(ptr) {
        return;
    }

    // Counted first, the pointer is dead once released.
    if !ptr.is_null() {
        tracker::record_dealloc();
    }

    unsafe { (real.free)(ptr) }
}
