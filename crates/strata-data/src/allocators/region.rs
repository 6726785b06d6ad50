// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Region records and the handles that name them.

use std::fmt;
use std::num::NonZeroU64;
use std::ops::Range;

/// An opaque identifier for a live allocation inside an arena.
///
/// Handles are issued from a per-arena counter starting at 1 and are never reused
/// by that arena. The raw value 0 is the "no allocation" sentinel and cannot be
/// turned into a handle, so a `RegionHandle` always refers to something that was
/// allocated at some point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegionHandle(NonZeroU64);

impl RegionHandle {
    pub(crate) fn new(raw: NonZeroU64) -> Self {
        Self(raw)
    }

    /// Wraps a raw handle value. Returns `None` for the 0 sentinel.
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// The raw, non-zero value of this handle.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for RegionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A contiguous span of an arena, either free or owned by one allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// The owning allocation, or `None` if the span is free.
    pub handle: Option<RegionHandle>,
    /// Logical time of the allocation (or of the last `touch`). Meaningless for free regions.
    pub created_at: u64,
    /// Byte offset from the start of the arena.
    pub offset: u64,
    /// Length in bytes. Always a positive multiple of the arena alignment.
    pub size: u64,
}

impl Region {
    pub(crate) fn free(offset: u64, size: u64) -> Self {
        Self {
            handle: None,
            created_at: 0,
            offset,
            size,
        }
    }

    /// `true` if no allocation owns this region.
    pub fn is_free(&self) -> bool {
        self.handle.is_none()
    }

    /// One past the last byte of the region.
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }

    /// The region expressed in elements of `stride` bytes, e.g. vertices or indices.
    ///
    /// Callers building draw commands use this to get `first..first + count`. Any
    /// trailing partial element (alignment padding) is dropped.
    pub fn element_range(&self, stride: u64) -> Range<u64> {
        debug_assert!(stride > 0, "element stride must be non-zero");
        let first = self.offset / stride;
        first..first + self.size / stride
    }
}

/// A cheap fingerprint of an arena's allocation state.
///
/// Any allocation or free changes it, so callers caching derived data (indirect
/// draw buffers, batched bind groups) can compare two versions instead of
/// diffing region lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StateVersion {
    /// The value the next successful allocation will receive as its handle.
    pub next_handle: u64,
    /// Number of live allocations.
    pub active_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_not_a_handle() {
        assert!(RegionHandle::from_raw(0).is_none());
        assert_eq!(RegionHandle::from_raw(7).map(RegionHandle::get), Some(7));
    }

    #[test]
    fn element_range_uses_stride_units() {
        let region = Region {
            handle: RegionHandle::from_raw(1),
            created_at: 0,
            offset: 64,
            size: 96,
        };
        assert_eq!(region.element_range(32), 2..5);
        assert_eq!(region.element_range(4), 16..40);
        assert_eq!(region.end(), 160);
        assert!(!region.is_free());
    }
}
