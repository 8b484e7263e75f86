//! Identifier allocation.
//!
//! Note types and decks get random ids from a high range so that they are
//! unlikely to clash with ids already present in the importing collection.
//! Notes and cards get ids from an [`IdAllocator`]: a millisecond base
//! timestamp advanced by a counter, so bursts of allocations inside one
//! millisecond still yield distinct, strictly increasing ids.

use std::ops::Range;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

use crate::error::{Error, Result};

/// Range random note type and deck ids are drawn from.
pub const RANDOM_ID_RANGE: Range<i64> = (1 << 30)..((1 << 31) + (1 << 30));

/// Largest note or card id handed out (2^53 - 1).
pub const MAX_ID: i64 = (1 << 53) - 1;

/// Generate a random note type or deck id.
pub fn random_id() -> i64 {
    rand::rng().random_range(RANDOM_ID_RANGE)
}

/// Current Unix timestamp in milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Counter-augmented timestamp allocator for note and card ids.
///
/// Each package owns one allocator. Ids never repeat and always increase.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: i64,
}

impl IdAllocator {
    /// Create an allocator whose first id is `base_ms`.
    pub fn new(base_ms: i64) -> Self {
        Self { next: base_ms }
    }

    #[cfg(test)]
    fn peek(&self) -> i64 {
        self.next
    }

    #[cfg(test)]
    fn allocate(&mut self) -> Result<i64> {
        let id = self.next;
        self.reserve(1)?;
        Ok(id)
    }

    /// Reserve `count` consecutive ids.
    ///
    /// Blocks from successive calls are disjoint.
    pub fn reserve(&mut self, count: usize) -> Result<IdBlock> {
        let overflow = || Error::IdentifierOverflow {
            next: self.next,
            requested: count,
        };
        let len = i64::try_from(count).map_err(|_| overflow())?;
        let end = self.next.checked_add(len).ok_or_else(overflow)?;
        if end - 1 > MAX_ID {
            return Err(overflow());
        }
        let block = IdBlock {
            range: self.next..end,
        };
        self.next = end;
        Ok(block)
    }
}

/// A reserved run of ids, yielded in increasing order.
#[derive(Debug, Clone)]
pub struct IdBlock {
    range: Range<i64>,
}

impl IdBlock {
    #[cfg(test)]
    fn remaining(&self) -> usize {
        (self.range.end - self.range.start) as usize
    }
}

impl Iterator for IdBlock {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        self.range.next()
    }
}
