use serde::{Deserialize, Serialize};

/// Allocation counters gathered on one thread between [`start`](crate::start)
/// and [`stop`](crate::stop).
///
/// The layout is fixed so the same value can be handed across the C ABI.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AllocationStats {
    /// Number of successful allocations.
    pub allocations: u64,
    /// Number of non-null pointers released.
    pub deallocations: u64,
    /// Sum of the requested sizes of successful allocations. Freed bytes are
    /// not subtracted.
    pub bytes_allocated: u64,
}

impl AllocationStats {
    pub const ZERO: Self = Self {
        allocations: 0,
        deallocations: 0,
        bytes_allocated: 0,
    };

    #[inline]
    pub fn is_empty(&self) -> bool {
        *self == Self::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::AllocationStats;

    #[test]
    fn test_default_is_zero() {
        assert_eq!(AllocationStats::default(), AllocationStats::ZERO);
        assert!(AllocationStats::default().is_empty());
    }

    #[test]
    fn test_json_field_names() {
        let stats = AllocationStats {
            allocations: 2,
            deallocations: 1,
            bytes_allocated: 30,
        };

        let json = serde_json::to_value(stats).expect("serialize stats");
        assert_eq!(
            json,
            serde_json::json!({
                "allocations": 2,
                "deallocations": 1,
                "bytes_allocated": 30,
            })
        );
        assert!(!stats.is_empty());
    }

    #[test]
    fn test_c_layout() {
        assert_eq!(std::mem::size_of::<AllocationStats>(), 24);
        assert_eq!(std::mem::align_of::<AllocationStats>(), 8);
    }
}
