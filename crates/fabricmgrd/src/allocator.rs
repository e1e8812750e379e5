//! Port-channel id allocation.
//!
//! Two strategies exist. Gap-finding scans the channel ids already present
//! on the switch and picks the first missing one; it needs a fresh snapshot
//! and assumes single-threaded driving. Slot-based allocation computes
//! `begin + slot` from the physical port's break-out index inside a fixed
//! window; it needs no read of switch state, so two reconciliations on
//! different hosts can never race on the same id.

use std::collections::BTreeSet;

use os10fe_common::{FabricError, FabricResult, PortChannelRange};
use os10fe_restconf::records::breakout_slot;

/// Returns the first unused id adjacent to the existing run of `ids`.
///
/// Walking the sorted set, the first pair with a gap yields `prev + 1`; a
/// gapless set yields `max + 1`, and an empty set yields 1. A hole below
/// the smallest id is never reported: `{2, 3, 4}` yields 5, not 1.
pub fn find_hole(ids: &BTreeSet<u32>) -> u32 {
    let mut prev: Option<u32> = None;
    for &id in ids {
        match prev {
            Some(p) if p + 1 != id => return p + 1,
            _ => prev = Some(id),
        }
    }
    match prev {
        None => 1,
        Some(p) => p + 1,
    }
}

/// Deterministic slot-based allocator over a fixed id window.
#[derive(Debug, Clone, Copy)]
pub struct RangeAllocator {
    begin: u32,
    end: u32,
}

impl RangeAllocator {
    /// Creates an allocator over the configured window.
    pub fn new(range: &PortChannelRange) -> Self {
        Self {
            begin: range.begin,
            end: range.end,
        }
    }

    /// Returns `begin + slot`, or an allocation-exhausted error when that
    /// falls past the end of the window.
    pub fn allocate(&self, slot: u32) -> FabricResult<u32> {
        let id = self.begin + slot;
        if id > self.end {
            return Err(FabricError::AllocationExhausted {
                begin: self.begin,
                end: self.end,
                slot,
            });
        }
        Ok(id)
    }
}

/// Derives the allocation slot from a physical port's break-out index
/// (the `:<subindex>` suffix of `ethernet<chassis>/<slot>/<port>:<n>`).
pub fn slot_for_port(port: &str) -> FabricResult<u32> {
    breakout_slot(port).ok_or_else(|| FabricError::invalid_interface_name(port))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[u32]) -> BTreeSet<u32> {
        values.iter().copied().collect()
    }

    #[test]
    fn test_find_hole_empty() {
        assert_eq!(find_hole(&ids(&[])), 1);
    }

    #[test]
    fn test_find_hole_contiguous_appends() {
        assert_eq!(find_hole(&ids(&[1, 2, 3, 4])), 5);
    }

    #[test]
    fn test_find_hole_first_gap() {
        assert_eq!(find_hole(&ids(&[1, 2, 5, 7])), 3);
    }

    #[test]
    fn test_find_hole_single() {
        assert_eq!(find_hole(&ids(&[1])), 2);
    }

    #[test]
    fn test_find_hole_never_below_smallest() {
        // Intentional behavior boundary: no hole is detected before the
        // first element, so the run is extended instead.
        assert_eq!(find_hole(&ids(&[2, 3, 4])), 5);
        assert_eq!(find_hole(&ids(&[10, 11])), 12);
    }

    #[test]
    fn test_allocate_within_range() {
        let allocator = RangeAllocator::new(&PortChannelRange {
            begin: 125,
            end: 128,
        });
        assert_eq!(allocator.allocate(0).unwrap(), 125);
        assert_eq!(allocator.allocate(3).unwrap(), 128);
    }

    #[test]
    fn test_allocate_exhausted() {
        let allocator = RangeAllocator::new(&PortChannelRange {
            begin: 125,
            end: 128,
        });
        let err = allocator.allocate(4).unwrap_err();
        assert!(matches!(
            err,
            FabricError::AllocationExhausted {
                begin: 125,
                end: 128,
                slot: 4
            }
        ));
    }

    #[test]
    fn test_slot_for_port() {
        assert_eq!(slot_for_port("ethernet1/1/5:3").unwrap(), 3);
        assert!(slot_for_port("ethernet1/1/5").is_err());
    }
}
