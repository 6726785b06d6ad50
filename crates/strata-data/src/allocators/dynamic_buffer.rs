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

//! A GPU buffer sub-allocated into variable-sized regions.

use super::error::AllocError;
#[cfg(any(test, debug_assertions, feature = "verify"))]
use super::error::InvariantViolation;
use super::region::{Region, RegionHandle, StateVersion};
use super::region_allocator::RegionAllocator;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use strata_core::memory::ArenaStats;
use strata_core::renderer::{BufferDescriptor, BufferId, BufferUsage, GraphicsDevice};

/// Default arena size: 64 MiB.
pub const DEFAULT_CAPACITY: u64 = 64 * 1024 * 1024;

/// Default region alignment, matching the copy granularity of most backends.
pub const DEFAULT_ALIGNMENT: u64 = 4;

/// Creation parameters for a [`DynamicBuffer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicBufferConfig {
    /// Debug label of the backing GPU buffer.
    pub label: String,
    /// Arena size in bytes. Rounded up to `alignment`.
    pub capacity: u64,
    /// Granularity of every region offset and size.
    pub alignment: u64,
    /// How the backing buffer will be bound. `COPY_DST` is always added.
    pub usage: BufferUsage,
}

impl Default for DynamicBufferConfig {
    fn default() -> Self {
        Self {
            label: "Dynamic Buffer".to_string(),
            capacity: DEFAULT_CAPACITY,
            alignment: DEFAULT_ALIGNMENT,
            usage: BufferUsage::VERTEX | BufferUsage::INDEX | BufferUsage::STORAGE,
        }
    }
}

/// A fixed-capacity GPU buffer whose space is handed out as regions.
///
/// Each successful [`allocate`](Self::allocate) uploads the payload into a best-fit
/// region and returns an opaque [`RegionHandle`]; the region's current offset and
/// size are looked up through [`region`](Self::region). Freed space is coalesced,
/// and [`free_oldest`](Self::free_oldest) provides the eviction primitive for
/// caches that must make room for new data.
///
/// The buffer does not keep a device reference. The [`GraphicsDevice`] is passed to
/// every call that touches GPU memory, and [`destroy`](Self::destroy) must be called
/// to release it.
#[derive(Debug)]
pub struct DynamicBuffer {
    allocator: RegionAllocator,
    buffer: BufferId,
    label: String,
}

impl DynamicBuffer {
    /// Creates the backing GPU buffer and an empty arena covering it.
    ///
    /// # Errors
    ///
    /// * [`AllocError::InvalidAlignment`] if the alignment is zero or not a multiple of
    ///   the device's [`copy_alignment`](GraphicsDevice::copy_alignment).
    /// * [`AllocError::Device`] if the device cannot create the buffer.
    pub fn new(
        device: &dyn GraphicsDevice,
        config: &DynamicBufferConfig,
    ) -> Result<Self, AllocError> {
        let required = device.copy_alignment().max(1);
        if config.alignment == 0 || config.alignment % required != 0 {
            return Err(AllocError::InvalidAlignment {
                alignment: config.alignment,
                required,
            });
        }

        let allocator = RegionAllocator::new(config.capacity, config.alignment)?;

        // Backends reject zero-sized buffers; an empty arena still gets one unit.
        let buffer = device.create_buffer(&BufferDescriptor {
            label: Some(Cow::Borrowed(config.label.as_str())),
            size: allocator.capacity().max(config.alignment),
            usage: config.usage | BufferUsage::COPY_DST,
            mapped_at_creation: false,
        })?;

        log::info!(
            "DynamicBuffer({}): created {} byte arena, alignment {}",
            config.label,
            allocator.capacity(),
            config.alignment
        );

        Ok(Self {
            allocator,
            buffer,
            label: config.label.clone(),
        })
    }

    /// Allocates a region for `data` and uploads it.
    ///
    /// The region is `data.len()` rounded up to the alignment; only `data.len()`
    /// bytes are written, the padding keeps whatever the buffer held before.
    ///
    /// # Errors
    ///
    /// * [`AllocError::ZeroSize`] if `data` is empty.
    /// * [`AllocError::OutOfSpace`] if no free region is large enough.
    /// * [`AllocError::Device`] if the upload fails.
    ///
    /// On error the arena is unchanged.
    pub fn allocate(
        &mut self,
        device: &dyn GraphicsDevice,
        data: &[u8],
    ) -> Result<RegionHandle, AllocError> {
        let placement = self.allocator.place(data.len() as u64)?;
        device.write_buffer(self.buffer, placement.offset, data)?;
        Ok(self.allocator.commit(placement))
    }

    /// Frees a region. Returns `false` if the handle is not live in this buffer.
    pub fn free(&mut self, handle: RegionHandle) -> bool {
        self.allocator.free(handle)
    }

    /// Frees the oldest live region and returns its handle, or `None` if the buffer is empty.
    pub fn free_oldest(&mut self) -> Option<RegionHandle> {
        self.allocator.free_oldest()
    }

    /// Marks a region as just used so it is evicted last.
    pub fn touch(&mut self, handle: RegionHandle) -> bool {
        self.allocator.touch(handle)
    }

    /// Drops all regions without reallocating the GPU buffer.
    pub fn clear(&mut self) {
        self.allocator.clear();
        log::info!("DynamicBuffer({}): cleared", self.label);
    }

    /// The region currently owned by `handle`.
    pub fn region(&self, handle: RegionHandle) -> Option<&Region> {
        self.allocator.region(handle)
    }

    /// Every region, in offset order.
    pub fn regions(&self) -> &[Region] {
        self.allocator.regions()
    }

    /// Live regions, in offset order.
    pub fn allocations(&self) -> impl Iterator<Item = &Region> + '_ {
        self.allocator.allocations()
    }

    /// Number of live regions.
    pub fn active_count(&self) -> usize {
        self.allocator.active_count()
    }

    /// Fingerprint of the allocation state, for cheap dirty checks.
    pub fn state_version(&self) -> StateVersion {
        self.allocator.state_version()
    }

    /// Occupancy snapshot.
    pub fn stats(&self) -> ArenaStats {
        self.allocator.stats()
    }

    /// Arena size in bytes.
    pub fn capacity(&self) -> u64 {
        self.allocator.capacity()
    }

    /// Region granularity in bytes.
    pub fn alignment(&self) -> u64 {
        self.allocator.alignment()
    }

    /// The backing GPU buffer, for binding as a vertex, index or storage buffer.
    pub fn buffer_id(&self) -> BufferId {
        self.buffer
    }

    /// Debug label of the backing buffer.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Checks the arena invariants. See [`RegionAllocator::verify`].
    #[cfg(any(test, debug_assertions, feature = "verify"))]
    pub fn verify(&self) -> Result<(), InvariantViolation> {
        self.allocator.verify()
    }

    /// Releases the backing GPU buffer.
    pub fn destroy(self, device: &dyn GraphicsDevice) {
        if let Err(e) = device.destroy_buffer(self.buffer) {
            log::warn!(
                "DynamicBuffer({}): Failed to destroy buffer: {:?}",
                self.label,
                e
            );
        }
    }
}
