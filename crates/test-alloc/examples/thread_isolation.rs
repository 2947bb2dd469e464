use alloc_track::{AllocationStats, TrackingAllocator};
use std::thread;

#[global_allocator]
static GLOBAL: TrackingAllocator = TrackingAllocator::system();

fn allocate_and_work(thread_id: usize, iterations: usize) {
    for i in 0..iterations {
        let vec1 = vec![thread_id; 100];
        std::hint::black_box(&vec1);

        let s = format!("Thread {} iteration {}", thread_id, i);
        std::hint::black_box(&s);
    }
}

fn main() {
    const NUM_THREADS: usize = 8;

    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|i| {
            thread::spawn(move || {
                if i % 2 == 0 {
                    alloc_track::start();
                    allocate_and_work(i, 50);
                    alloc_track::stop()
                } else {
                    allocate_and_work(i, 50);
                    alloc_track::current()
                }
            })
        })
        .collect();

    let results: Vec<AllocationStats> = handles
        .into_iter()
        .map(|handle| handle.join().expect("Thread panicked"))
        .collect();

    for (i, stats) in results.iter().enumerate() {
        let label = if i % 2 == 0 { "tracked" } else { "untracked" };
        test_alloc::report(label, stats);
    }
}
