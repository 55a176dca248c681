//! Per-document uid allocation
//!
//! Uids are handed out in increasing order and never reused, including for
//! nodes that have since been deleted. Exhausting the 32-bit space is an error
//! rather than a silent wrap back to zero.

use crate::core::error::{GuideError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UidAllocator {
    /// Last uid handed out (0 before the first allocation)
    counter: u32,
}

impl UidAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a persisted counter value
    pub fn with_counter(counter: u32) -> Self {
        UidAllocator { counter }
    }

    /// Allocate the next uid
    pub fn next(&mut self) -> Result<u32> {
        let uid = self.counter.checked_add(1).ok_or(GuideError::UidExhausted)?;
        self.counter = uid;
        Ok(uid)
    }

    /// Make sure the next allocation returns `uid + 1`
    pub fn fast_forward(&mut self, uid: u32) {
        self.counter = uid;
    }

    /// Value persisted in the file header
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Uid the next call to [`next`](Self::next) would return
    pub fn peek(&self) -> Option<u32> {
        self.counter.checked_add(1)
    }
}
