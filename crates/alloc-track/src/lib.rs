//! Count the allocations a thread makes during a window of its execution.
//!
//! Install [`TrackingAllocator`] as the global allocator, then bracket the code
//! to measure with [`start`] and [`stop`]:
//!
//! ```rust,no_run
//! use alloc_track::TrackingAllocator;
//!
//! #[global_allocator]
//! static GLOBAL: TrackingAllocator = TrackingAllocator::system();
//!
//! fn main() {
//!     alloc_track::start();
//!     let v: Vec<u8> = Vec::with_capacity(64);
//!     drop(v);
//!     let stats = alloc_track::stop();
//!     assert_eq!(stats.allocations, 1);
//!     assert_eq!(stats.bytes_allocated, 64);
//! }
//! ```
//!
//! Statistics are strictly per thread: a window only sees the allocations of
//! the thread that opened it.
//!
//! ## Features
//!
//! - `ffi`: exports `tracking_start`, `tracking_stop` and `tracking_current`
//!   with C linkage.
//! - `interpose` (Linux): additionally exports `malloc` and `free`, which
//!   forward to the C library's definitions found with `dlsym(RTLD_NEXT)`.
//!   Use it for code that calls the C allocator directly, and do not combine
//!   it with [`TrackingAllocator`] wrapping [`System`](std::alloc::System) or
//!   Rust allocations are counted twice.

mod allocator;
mod stats;
mod tracker;

pub use allocator::TrackingAllocator;
pub use stats::AllocationStats;
pub use tracker::{current, is_tracking, start, stop};

cfg_if::cfg_if! {
    if #[cfg(feature = "ffi")] {
        pub mod ffi;
    }
}

cfg_if::cfg_if! {
    if #[cfg(all(feature = "interpose", target_os = "linux"))] {
        mod resolver;
        pub mod interpose;
    } else if #[cfg(feature = "interpose")] {
        compile_error!("the `interpose` feature requires Linux");
    }
}
