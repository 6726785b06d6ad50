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

//! Error types reported by the sub-allocators.

use std::fmt;
use strata_core::renderer::ResourceError;

/// Why an allocation request could not be served.
///
/// A failed request never mutates the arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
    /// A zero-byte allocation was requested.
    ZeroSize,
    /// The arena alignment is zero, or not a multiple of what the device requires for writes.
    InvalidAlignment {
        /// The rejected alignment.
        alignment: u64,
        /// The granularity the device needs.
        required: u64,
    },
    /// No free region is large enough for the (alignment-rounded) request.
    OutOfSpace {
        /// The rounded size that was requested.
        requested: u64,
        /// The largest free region at the time of the request.
        largest_free: u64,
    },
    /// The request is too large to be rounded up to the alignment without overflowing.
    SizeOverflow(u64),
    /// Every handle value has been issued; handles are never reused.
    HandlesExhausted,
    /// The graphics device failed to create or write the backing buffer.
    Device(ResourceError),
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocError::ZeroSize => write!(f, "Cannot allocate a zero-sized region."),
            AllocError::InvalidAlignment {
                alignment,
                required,
            } => write!(
                f,
                "Invalid arena alignment {alignment}: must be a non-zero multiple of {required}."
            ),
            AllocError::OutOfSpace {
                requested,
                largest_free,
            } => write!(
                f,
                "Out of arena space: requested {requested} bytes, largest free region is {largest_free} bytes."
            ),
            AllocError::SizeOverflow(size) => {
                write!(f, "Allocation size {size} overflows when aligned.")
            }
            AllocError::HandlesExhausted => write!(f, "Region handle space exhausted."),
            AllocError::Device(err) => write!(f, "Graphics device error: {err}"),
        }
    }
}

impl std::error::Error for AllocError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AllocError::Device(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResourceError> for AllocError {
    fn from(err: ResourceError) -> Self {
        AllocError::Device(err)
    }
}

/// A broken arena invariant, found by the debug consistency check.
///
/// This always indicates a bug in the allocator itself, never a caller error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// A region does not start where the previous one ended.
    Gap {
        /// Index of the offending region.
        index: usize,
        /// Where the region should have started.
        expected_offset: u64,
        /// Where it actually starts.
        offset: u64,
    },
    /// The regions do not add up to the arena capacity.
    CapacityMismatch {
        /// Sum of all region sizes.
        covered: u64,
        /// The arena capacity.
        capacity: u64,
    },
    /// Two free regions sit next to each other.
    AdjacentFree {
        /// Index of the second free region.
        index: usize,
    },
    /// A region has size zero.
    EmptyRegion {
        /// Index of the offending region.
        index: usize,
    },
    /// A region offset or size is not a multiple of the arena alignment.
    Misaligned {
        /// Index of the offending region.
        index: usize,
    },
    /// The number of allocated regions differs from the active counter.
    ActiveCountMismatch {
        /// Allocated regions actually found.
        found: usize,
        /// The maintained counter.
        recorded: usize,
    },
    /// Two live regions share a handle, or a handle is not below the handle counter.
    BadHandle {
        /// Index of the offending region.
        index: usize,
    },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::Gap {
                index,
                expected_offset,
                offset,
            } => write!(
                f,
                "region {index} starts at {offset}, expected {expected_offset}"
            ),
            InvariantViolation::CapacityMismatch { covered, capacity } => {
                write!(f, "regions cover {covered} bytes of a {capacity}-byte arena")
            }
            InvariantViolation::AdjacentFree { index } => {
                write!(f, "regions {} and {index} are both free", index - 1)
            }
            InvariantViolation::EmptyRegion { index } => write!(f, "region {index} is empty"),
            InvariantViolation::Misaligned { index } => write!(f, "region {index} is misaligned"),
            InvariantViolation::ActiveCountMismatch { found, recorded } => write!(
                f,
                "found {found} allocated regions but {recorded} are recorded active"
            ),
            InvariantViolation::BadHandle { index } => {
                write!(f, "region {index} carries a duplicate or unissued handle")
            }
        }
    }
}

impl std::error::Error for InvariantViolation {}
