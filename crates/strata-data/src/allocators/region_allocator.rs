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

//! Best-fit region bookkeeping for a fixed-size arena.

use super::error::AllocError;
#[cfg(any(test, debug_assertions, feature = "verify"))]
use super::error::InvariantViolation;
use super::region::{Region, RegionHandle, StateVersion};
use std::num::NonZeroU64;
use strata_core::memory::ArenaStats;

/// Rounds `value` up to the next multiple of `alignment`.
pub(crate) fn align_up(value: u64, alignment: u64) -> Option<u64> {
    let rem = value % alignment;
    if rem == 0 {
        Some(value)
    } else {
        value.checked_add(alignment - rem)
    }
}

/// Where a request will land, computed before anything is mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Placement {
    /// Index of the free region that will be split.
    pub index: usize,
    /// Offset of the new region.
    pub offset: u64,
    /// Aligned size of the new region.
    pub size: u64,
    /// Handle the new region will receive.
    pub handle: RegionHandle,
}

/// Partitions an arena of `capacity` bytes into an ordered list of adjacent regions.
///
/// The list always covers `[0, capacity)` exactly, with no gaps, no two free
/// regions side by side, and every offset and size a multiple of the alignment.
/// Allocation picks the smallest free region that fits (the first one in offset
/// order on ties) and carves the new region from its start. Freeing merges the
/// region with free neighbours on both sides.
///
/// Lookups by handle are linear scans. Arenas hold hundreds of regions, not
/// millions, and the list doubles as the draw-order source for indirect commands.
///
/// The allocator is single-threaded; share it behind a lock if several producers
/// need it.
#[derive(Debug, Clone)]
pub struct RegionAllocator {
    regions: Vec<Region>,
    capacity: u64,
    alignment: u64,
    /// `None` once every handle value has been issued.
    next_handle: Option<NonZeroU64>,
    active_count: usize,
    /// Logical clock stamped into `created_at`.
    clock: u64,
}

impl RegionAllocator {
    /// Creates an arena of `capacity` bytes (rounded up to `alignment`) holding one free region.
    ///
    /// A zero capacity yields an arena with no regions, where every allocation fails.
    ///
    /// # Errors
    ///
    /// * [`AllocError::InvalidAlignment`] if `alignment` is zero.
    /// * [`AllocError::SizeOverflow`] if the rounded capacity does not fit in a `u64`.
    pub fn new(capacity: u64, alignment: u64) -> Result<Self, AllocError> {
        if alignment == 0 {
            return Err(AllocError::InvalidAlignment {
                alignment,
                required: 1,
            });
        }
        let capacity = align_up(capacity, alignment).ok_or(AllocError::SizeOverflow(capacity))?;

        let mut allocator = Self {
            regions: Vec::new(),
            capacity,
            alignment,
            next_handle: Some(NonZeroU64::MIN),
            active_count: 0,
            clock: 0,
        };
        allocator.reset_regions();
        Ok(allocator)
    }

    fn reset_regions(&mut self) {
        self.regions.clear();
        if self.capacity > 0 {
            self.regions.push(Region::free(0, self.capacity));
        }
    }

    /// Arena size in bytes, after alignment rounding.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// The granularity of every region offset and size.
    pub fn alignment(&self) -> u64 {
        self.alignment
    }

    /// Rounds a request up to the arena alignment.
    ///
    /// # Errors
    ///
    /// [`AllocError::ZeroSize`] for empty requests, [`AllocError::SizeOverflow`] if
    /// rounding overflows.
    pub fn aligned_size(&self, size: u64) -> Result<u64, AllocError> {
        if size == 0 {
            return Err(AllocError::ZeroSize);
        }
        align_up(size, self.alignment).ok_or(AllocError::SizeOverflow(size))
    }

    /// Allocates a region of at least `size` bytes and returns its handle.
    ///
    /// # Errors
    ///
    /// [`AllocError::OutOfSpace`] when no free region is large enough; the arena is
    /// left untouched.
    pub fn allocate(&mut self, size: u64) -> Result<RegionHandle, AllocError> {
        let placement = self.place(size)?;
        Ok(self.commit(placement))
    }

    /// Finds the best-fit free region for `size` without modifying anything.
    pub(crate) fn place(&self, size: u64) -> Result<Placement, AllocError> {
        let size = self.aligned_size(size)?;
        let handle = self
            .next_handle
            .map(RegionHandle::new)
            .ok_or(AllocError::HandlesExhausted)?;

        let mut best: Option<usize> = None;
        for (index, region) in self.regions.iter().enumerate() {
            if !region.is_free() || region.size < size {
                continue;
            }
            match best {
                Some(current) if self.regions[current].size <= region.size => {}
                _ => best = Some(index),
            }
        }

        match best {
            Some(index) => Ok(Placement {
                index,
                offset: self.regions[index].offset,
                size,
                handle,
            }),
            None => {
                let largest_free = self.largest_free_region();
                log::warn!(
                    "RegionAllocator: no free region for {size} bytes (largest free: {largest_free}, active: {})",
                    self.active_count
                );
                Err(AllocError::OutOfSpace {
                    requested: size,
                    largest_free,
                })
            }
        }
    }

    /// Splits the free region chosen by [`place`](Self::place) and records the allocation.
    ///
    /// `placement` must come from `place` on this allocator with no mutation in between.
    pub(crate) fn commit(&mut self, placement: Placement) -> RegionHandle {
        let Placement {
            index,
            offset,
            size,
            handle,
        } = placement;
        debug_assert!(self.regions[index].is_free() && self.regions[index].offset == offset);

        self.next_handle = handle.get().checked_add(1).and_then(NonZeroU64::new);
        self.clock += 1;

        let allocated = Region {
            handle: Some(handle),
            created_at: self.clock,
            offset,
            size,
        };

        let free = &mut self.regions[index];
        free.offset += size;
        free.size -= size;
        if free.size == 0 {
            *free = allocated;
        } else {
            self.regions.insert(index, allocated);
        }

        self.active_count += 1;
        log::debug!("RegionAllocator: allocated {handle} at offset {offset}, size {size}");
        self.state_changed();
        handle
    }

    /// Frees the region owned by `handle`, merging it with free neighbours.
    ///
    /// Returns `false`, without changing anything, if the handle is not live in
    /// this arena (already freed, never issued, or issued by another arena).
    pub fn free(&mut self, handle: RegionHandle) -> bool {
        match self.index_of(handle) {
            Some(index) => {
                self.release(index);
                log::debug!("RegionAllocator: freed {handle}");
                true
            }
            None => {
                log::debug!("RegionAllocator: ignoring free of unknown handle {handle}");
                false
            }
        }
    }

    /// Frees the allocation with the smallest `created_at` and returns its handle.
    ///
    /// Returns `None` if the arena has no live allocation.
    pub fn free_oldest(&mut self) -> Option<RegionHandle> {
        let (index, handle) = self
            .regions
            .iter()
            .enumerate()
            .filter_map(|(index, region)| region.handle.map(|h| (index, h, region.created_at)))
            .min_by_key(|&(_, _, created_at)| created_at)
            .map(|(index, handle, _)| (index, handle))?;

        self.release(index);
        log::debug!("RegionAllocator: evicted oldest allocation {handle}");
        Some(handle)
    }

    /// Marks an allocation as just used, making it the youngest for eviction purposes.
    ///
    /// Returns `false` if the handle is not live.
    pub fn touch(&mut self, handle: RegionHandle) -> bool {
        match self.index_of(handle) {
            Some(index) => {
                self.clock += 1;
                self.regions[index].created_at = self.clock;
                true
            }
            None => false,
        }
    }

    /// Drops every allocation, leaving one free region spanning the arena.
    ///
    /// The handle counter keeps running so handles from before the reset can never
    /// alias new allocations.
    pub fn clear(&mut self) {
        self.reset_regions();
        self.active_count = 0;
        self.state_changed();
    }

    fn index_of(&self, handle: RegionHandle) -> Option<usize> {
        self.regions
            .iter()
            .position(|region| region.handle == Some(handle))
    }

    /// Turns the region at `index` free and absorbs free neighbours into a single region.
    fn release(&mut self, index: usize) {
        self.regions[index].handle = None;
        self.regions[index].created_at = 0;

        let merge_next = self
            .regions
            .get(index + 1)
            .is_some_and(Region::is_free);
        let merge_prev = index > 0 && self.regions[index - 1].is_free();

        if merge_next {
            let next_size = self.regions[index + 1].size;
            self.regions[index].size += next_size;
        }
        if merge_prev {
            let size = self.regions[index].size;
            self.regions[index - 1].size += size;
        }

        match (merge_prev, merge_next) {
            (true, true) => {
                self.regions.drain(index..index + 2);
            }
            (true, false) => {
                self.regions.remove(index);
            }
            (false, true) => {
                self.regions.remove(index + 1);
            }
            (false, false) => {}
        }

        self.active_count -= 1;
        self.state_changed();
    }

    /// Looks up the region owned by a live handle.
    pub fn region(&self, handle: RegionHandle) -> Option<&Region> {
        self.index_of(handle).map(|index| &self.regions[index])
    }

    /// All regions, free and allocated, in offset order.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Iterates over live allocations in offset order.
    pub fn allocations(&self) -> impl Iterator<Item = &Region> + '_ {
        self.regions.iter().filter(|region| !region.is_free())
    }

    /// Number of live allocations.
    pub fn active_count(&self) -> usize {
        self.active_count
    }

    /// `true` if nothing is allocated.
    pub fn is_empty(&self) -> bool {
        self.active_count == 0
    }

    /// Fingerprint that changes on every allocation and free.
    pub fn state_version(&self) -> StateVersion {
        StateVersion {
            next_handle: self.next_handle.map_or(0, NonZeroU64::get),
            active_count: self.active_count,
        }
    }

    /// Size of the largest free region, i.e. the largest request that can succeed.
    pub fn largest_free_region(&self) -> u64 {
        self.regions
            .iter()
            .filter(|region| region.is_free())
            .map(|region| region.size)
            .max()
            .unwrap_or(0)
    }

    /// Occupancy snapshot of the arena.
    pub fn stats(&self) -> ArenaStats {
        let mut stats = ArenaStats {
            capacity: self.capacity,
            active_allocations: self.active_count,
            ..Default::default()
        };

        for region in &self.regions {
            if region.is_free() {
                stats.free_bytes += region.size;
                stats.free_regions += 1;
                stats.largest_free_region = stats.largest_free_region.max(region.size);
            } else {
                stats.used_bytes += region.size;
            }
        }

        stats.calculate_derived_metrics();
        stats
    }

    /// Walks the region list and checks every arena invariant.
    ///
    /// Only compiled into debug builds (or with the `verify` feature); a failure
    /// means the allocator itself is broken.
    #[cfg(any(test, debug_assertions, feature = "verify"))]
    pub fn verify(&self) -> Result<(), InvariantViolation> {
        let mut expected_offset = 0;
        let mut previous_free = false;
        let mut found_active = 0;
        let mut seen = std::collections::HashSet::new();

        for (index, region) in self.regions.iter().enumerate() {
            if region.offset != expected_offset {
                return Err(InvariantViolation::Gap {
                    index,
                    expected_offset,
                    offset: region.offset,
                });
            }
            if region.size == 0 {
                return Err(InvariantViolation::EmptyRegion { index });
            }
            if region.offset % self.alignment != 0 || region.size % self.alignment != 0 {
                return Err(InvariantViolation::Misaligned { index });
            }

            match region.handle {
                None => {
                    if previous_free {
                        return Err(InvariantViolation::AdjacentFree { index });
                    }
                    previous_free = true;
                }
                Some(handle) => {
                    let issued = self.next_handle.is_none_or(|next| handle.get() < next.get());
                    if !issued || !seen.insert(handle) {
                        return Err(InvariantViolation::BadHandle { index });
                    }
                    found_active += 1;
                    previous_free = false;
                }
            }

            expected_offset = region.end();
        }

        if expected_offset != self.capacity {
            return Err(InvariantViolation::CapacityMismatch {
                covered: expected_offset,
                capacity: self.capacity,
            });
        }
        if found_active != self.active_count {
            return Err(InvariantViolation::ActiveCountMismatch {
                found: found_active,
                recorded: self.active_count,
            });
        }
        Ok(())
    }

    #[inline]
    fn state_changed(&self) {
        #[cfg(feature = "verify")]
        if let Err(violation) = self.verify() {
            log::error!("RegionAllocator: invariant violated: {violation}");
            panic!("arena invariant violated: {violation}");
        }
    }
}
