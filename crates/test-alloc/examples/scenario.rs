use alloc_track::TrackingAllocator;
use std::alloc::{alloc, dealloc, Layout};

#[global_allocator]
static GLOBAL: TrackingAllocator = TrackingAllocator::system();

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let small = Layout::from_size_align(10, 1)?;
    let large = Layout::from_size_align(20, 1)?;

    alloc_track::start();
    let stats = unsafe {
        let first = alloc(small);
        let second = alloc(large);
        dealloc(first, small);
        let stats = alloc_track::stop();
        dealloc(second, large);
        stats
    };
    test_alloc::report("window", &stats);

    // Traffic after stop leaves the frozen value alone.
    let noise: Vec<String> = (0..10).map(|i| i.to_string()).collect();
    std::hint::black_box(&noise);
    drop(noise);
    test_alloc::report("after_stop", &alloc_track::current());

    Ok(())
}
