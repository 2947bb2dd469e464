//! C entry points for the tracking window.
//!
//! ```c
//! typedef struct {
//!     uint64_t allocations;
//!     uint64_t deallocations;
//!     uint64_t bytes_allocated;
//! } AllocationStats;
//!
//! void tracking_start(void);
//! AllocationStats tracking_stop(void);
//! AllocationStats tracking_current(void);
//! ```

use crate::stats::AllocationStats;
use crate::tracker;

#[no_mangle]
pub extern "C" fn tracking_start() {
    tracker::start();
}

#[no_mangle]
pub extern "C" fn tracking_stop() -> AllocationStats {
    tracker::stop()
}

#[no_mangle]
pub extern "C" fn tracking_current() -> AllocationStats {
    tracker::current()
}
