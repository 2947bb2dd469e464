use alloc_track::AllocationStats;

/// Prints one JSON line `{"label": ..., "stats": {...}}` for the integration
/// tests to pick up from stdout.
pub fn report(label: &str, stats: &AllocationStats) {
    let line = serde_json::json!({ "label": label, "stats": stats });
    println!("{}", line);
}
