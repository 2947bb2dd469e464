use alloc_track::ffi::{tracking_current, tracking_start, tracking_stop};
use alloc_track::interpose::{free, malloc};

fn main() {
    tracking_start();
    let stats = unsafe {
        let first = malloc(10);
        let second = malloc(20);
        free(first);
        free(std::ptr::null_mut());
        let stats = tracking_stop();
        free(second);
        stats
    };
    test_alloc::report("window", &stats);
    test_alloc::report("after_stop", &tracking_current());
}
