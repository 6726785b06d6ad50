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

use super::config::{MeshPoolConfig, INDEX_ALIGNMENT};
use super::error::MeshPoolError;
use crate::allocators::{
    AllocError, DynamicBuffer, DynamicBufferConfig, Region, RegionHandle, StateVersion,
};
use std::collections::HashMap;
use std::hash::Hash;
use strata_core::memory::ArenaStats;
use strata_core::renderer::{BufferId, BufferUsage, GraphicsDevice};

/// Where a mesh lives inside the pool's shared buffers, in element units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshSlot {
    /// Index of the mesh's first vertex in the vertex buffer.
    pub base_vertex: i32,
    /// Number of vertices.
    pub vertex_count: u32,
    /// Index of the mesh's first index in the index buffer.
    pub first_index: u32,
    /// Number of indices.
    pub index_count: u32,
}

/// The combined allocation state of both arenas of a [`MeshPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MeshPoolVersion {
    /// State of the vertex arena.
    pub vertices: StateVersion,
    /// State of the index arena.
    pub indices: StateVersion,
}

impl MeshSlot {
    /// Converts the byte regions of a mesh into draw-command units.
    ///
    /// Fails with [`MeshPoolError::MeshTooLarge`] if the first vertex does not fit
    /// the signed `base_vertex` of an indexed draw, or the first index does not fit
    /// a `u32`.
    fn from_regions(
        vertex: &Region,
        index: &Region,
        vertex_stride: u64,
        vertex_count: u32,
        index_count: u32,
    ) -> Result<Self, MeshPoolError> {
        let base_vertex = vertex.element_range(vertex_stride).start;
        let first_index = index.element_range(INDEX_ALIGNMENT).start;
        Ok(Self {
            base_vertex: i32::try_from(base_vertex).map_err(|_| MeshPoolError::MeshTooLarge)?,
            vertex_count,
            first_index: u32::try_from(first_index).map_err(|_| MeshPoolError::MeshTooLarge)?,
            index_count,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct MeshEntry {
    vertex: RegionHandle,
    index: RegionHandle,
    slot: MeshSlot,
}

/// Packs many meshes into one vertex buffer and one `u32` index buffer.
///
/// Keeping all geometry in two shared buffers lets a renderer bind them once and
/// issue every mesh as a single multi-draw (see
/// [`IndirectDrawCache`](super::IndirectDrawCache)). When an upload does not fit,
/// the least recently used mesh is evicted and the upload retried, so the pool
/// behaves as a geometry cache bounded by its configured capacities.
///
/// Eviction age is taken from the vertex arena; [`touch`](Self::touch) refreshes
/// both regions of a mesh.
#[derive(Debug)]
pub struct MeshPool<K> {
    vertices: DynamicBuffer,
    indices: DynamicBuffer,
    vertex_stride: u64,
    entries: HashMap<K, MeshEntry>,
    owners: HashMap<RegionHandle, K>,
}

impl<K: Eq + Hash + Clone> MeshPool<K> {
    /// Creates the vertex and index buffers.
    pub fn new(device: &dyn GraphicsDevice, config: &MeshPoolConfig) -> Result<Self, MeshPoolError> {
        config.validate()?;

        let vertices = DynamicBuffer::new(
            device,
            &DynamicBufferConfig {
                label: "Mesh Pool Vertices".to_string(),
                capacity: config.vertex_capacity,
                alignment: config.vertex_alignment,
                usage: BufferUsage::VERTEX,
            },
        )?;
        let indices = match DynamicBuffer::new(
            device,
            &DynamicBufferConfig {
                label: "Mesh Pool Indices".to_string(),
                capacity: config.index_capacity,
                alignment: INDEX_ALIGNMENT.max(device.copy_alignment()),
                usage: BufferUsage::INDEX,
            },
        ) {
            Ok(indices) => indices,
            Err(e) => {
                vertices.destroy(device);
                return Err(e.into());
            }
        };

        Ok(Self {
            vertices,
            indices,
            vertex_stride: config.vertex_stride,
            entries: HashMap::new(),
            owners: HashMap::new(),
        })
    }

    /// Uploads a mesh, evicting the least recently used meshes until it fits.
    ///
    /// An existing mesh under the same key is replaced. If the mesh cannot fit even
    /// in an empty pool, [`AllocError::OutOfSpace`] is returned and the key is absent
    /// afterwards.
    pub fn insert(
        &mut self,
        device: &dyn GraphicsDevice,
        key: K,
        vertex_bytes: &[u8],
        indices: &[u32],
    ) -> Result<MeshSlot, MeshPoolError> {
        if vertex_bytes.is_empty() || indices.is_empty() {
            return Err(AllocError::ZeroSize.into());
        }
        if vertex_bytes.len() as u64 % self.vertex_stride != 0 {
            return Err(MeshPoolError::PartialVertex {
                len: vertex_bytes.len(),
                stride: self.vertex_stride,
            });
        }
        let vertex_count = u32::try_from(vertex_bytes.len() as u64 / self.vertex_stride)
            .map_err(|_| MeshPoolError::MeshTooLarge)?;
        let index_count = u32::try_from(indices.len()).map_err(|_| MeshPoolError::MeshTooLarge)?;

        self.remove(&key);
        // Draw commands number their meshes with a u32 `first_instance`.
        if u32::try_from(self.entries.len() + 1).is_err() {
            return Err(MeshPoolError::TooManyMeshes);
        }

        let vertex = loop {
            match self.vertices.allocate(device, vertex_bytes) {
                Ok(handle) => break handle,
                Err(AllocError::OutOfSpace { .. }) if self.evict_oldest() => {}
                Err(e) => return Err(e.into()),
            }
        };
        let index = loop {
            match self.indices.allocate(device, bytemuck::cast_slice(indices)) {
                Ok(handle) => break handle,
                Err(AllocError::OutOfSpace { .. }) if self.evict_oldest() => {}
                Err(e) => {
                    self.vertices.free(vertex);
                    return Err(e.into());
                }
            }
        };

        let slot = match (self.vertices.region(vertex), self.indices.region(index)) {
            (Some(v), Some(i)) => {
                MeshSlot::from_regions(v, i, self.vertex_stride, vertex_count, index_count)
            }
            _ => Err(MeshPoolError::MeshTooLarge),
        };
        let slot = match slot {
            Ok(slot) => slot,
            Err(e) => {
                self.vertices.free(vertex);
                self.indices.free(index);
                return Err(e);
            }
        };

        self.owners.insert(vertex, key.clone());
        self.entries.insert(key, MeshEntry { vertex, index, slot });
        log::debug!(
            "MeshPool: stored mesh with {} vertices and {} indices",
            vertex_count,
            index_count
        );
        Ok(slot)
    }

    /// Evicts the mesh with the oldest vertex region. Returns `false` if the pool holds no mesh.
    fn evict_oldest(&mut self) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        let Some(vertex) = self.vertices.free_oldest() else {
            return false;
        };
        // A pending upload is always newer than every stored mesh.
        let Some(key) = self.owners.remove(&vertex) else {
            return false;
        };
        if let Some(entry) = self.entries.remove(&key) {
            self.indices.free(entry.index);
            log::debug!("MeshPool: evicted mesh at vertex region {}", vertex);
        }
        true
    }

    /// Removes a mesh. Returns `false` if the key was not present.
    pub fn remove(&mut self, key: &K) -> bool {
        let Some(entry) = self.entries.remove(key) else {
            return false;
        };
        self.owners.remove(&entry.vertex);
        self.vertices.free(entry.vertex);
        self.indices.free(entry.index);
        true
    }

    /// Where a mesh currently lives.
    pub fn get(&self, key: &K) -> Option<MeshSlot> {
        self.entries.get(key).map(|entry| entry.slot)
    }

    /// `true` if a mesh is stored under `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Marks a mesh as used, pushing it to the back of the eviction order.
    pub fn touch(&mut self, key: &K) -> bool {
        match self.entries.get(key) {
            Some(entry) => {
                self.vertices.touch(entry.vertex);
                self.indices.touch(entry.index);
                true
            }
            None => false,
        }
    }

    /// Drops every mesh. The GPU buffers are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.owners.clear();
        self.vertices.clear();
        self.indices.clear();
    }

    /// Stored meshes, in vertex-buffer order.
    pub fn meshes(&self) -> impl Iterator<Item = (&K, MeshSlot)> + '_ {
        self.vertices.allocations().filter_map(move |region| {
            let key = self.owners.get(&region.handle?)?;
            let entry = self.entries.get(key)?;
            Some((key, entry.slot))
        })
    }

    /// Number of stored meshes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if no mesh is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Changes whenever a mesh is stored, removed or evicted.
    pub fn state_version(&self) -> MeshPoolVersion {
        MeshPoolVersion {
            vertices: self.vertices.state_version(),
            indices: self.indices.state_version(),
        }
    }

    /// The shared vertex buffer.
    pub fn vertex_buffer(&self) -> BufferId {
        self.vertices.buffer_id()
    }

    /// The shared `u32` index buffer.
    pub fn index_buffer(&self) -> BufferId {
        self.indices.buffer_id()
    }

    /// Size of one vertex in bytes.
    pub fn vertex_stride(&self) -> u64 {
        self.vertex_stride
    }

    /// Occupancy of the vertex arena.
    pub fn vertex_stats(&self) -> ArenaStats {
        self.vertices.stats()
    }

    /// Occupancy of the index arena.
    pub fn index_stats(&self) -> ArenaStats {
        self.indices.stats()
    }

    /// Checks both arenas and that every mesh owns exactly one region in each.
    #[cfg(any(test, debug_assertions, feature = "verify"))]
    pub fn verify(&self) -> Result<(), crate::allocators::InvariantViolation> {
        use crate::allocators::InvariantViolation;

        self.vertices.verify()?;
        self.indices.verify()?;
        for arena in [&self.vertices, &self.indices] {
            if arena.active_count() != self.entries.len() {
                return Err(InvariantViolation::ActiveCountMismatch {
                    found: arena.active_count(),
                    recorded: self.entries.len(),
                });
            }
        }
        Ok(())
    }

    /// Releases both GPU buffers.
    pub fn destroy(self, device: &dyn GraphicsDevice) {
        self.vertices.destroy(device);
        self.indices.destroy(device);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocators::mock_device::MockGraphicsDevice;

    const STRIDE: u64 = 8;

    fn pool(device: &MockGraphicsDevice, vertex_capacity: u64, index_capacity: u64) -> MeshPool<&'static str> {
        MeshPool::new(
            device,
            &MeshPoolConfig {
                vertex_capacity,
                vertex_stride: STRIDE,
                vertex_alignment: STRIDE,
                index_capacity,
            },
        )
        .unwrap()
    }

    fn vertices(count: usize, fill: u8) -> Vec<u8> {
        vec![fill; count * STRIDE as usize]
    }

    #[test]
    fn slots_are_in_element_units() {
        let device = MockGraphicsDevice::new();
        let mut pool = pool(&device, 1024, 1024);

        let a = pool.insert(&device, "a", &vertices(3, 1), &[0, 1, 2]).unwrap();
        let b = pool.insert(&device, "b", &vertices(4, 2), &[0, 1, 2, 2, 3, 0]).unwrap();

        assert_eq!(
            a,
            MeshSlot {
                base_vertex: 0,
                vertex_count: 3,
                first_index: 0,
                index_count: 3
            }
        );
        assert_eq!(b.base_vertex, 3);
        assert_eq!(b.first_index, 3);
        assert_eq!(pool.get(&"b"), Some(b));

        let indices = device.read(pool.index_buffer(), 12, 24);
        assert_eq!(indices, bytemuck::cast_slice::<u32, u8>(&[0, 1, 2, 2, 3, 0]));
        pool.verify().unwrap();
    }

    #[test]
    fn full_pool_evicts_least_recently_used() {
        let device = MockGraphicsDevice::new();
        let mut pool = pool(&device, 8 * STRIDE, 1024);

        pool.insert(&device, "a", &vertices(4, 1), &[0]).unwrap();
        pool.insert(&device, "b", &vertices(4, 2), &[0]).unwrap();
        pool.touch(&"a");

        let c = pool.insert(&device, "c", &vertices(2, 3), &[0]).unwrap();
        assert!(pool.contains(&"a"));
        assert!(!pool.contains(&"b"));
        assert_eq!(c.base_vertex, 4);
        assert_eq!(pool.len(), 2);
        pool.verify().unwrap();
    }

    #[test]
    fn index_pressure_also_evicts() {
        let device = MockGraphicsDevice::new();
        let mut pool = pool(&device, 1024, 16);

        pool.insert(&device, "a", &vertices(1, 1), &[0, 0, 0]).unwrap();
        pool.insert(&device, "b", &vertices(1, 2), &[0, 0, 0]).unwrap();
        assert!(!pool.contains(&"a"));
        assert!(pool.contains(&"b"));
        pool.verify().unwrap();
    }

    #[test]
    fn oversized_mesh_empties_pool_then_fails() {
        let device = MockGraphicsDevice::new();
        let mut pool = pool(&device, 4 * STRIDE, 1024);
        pool.insert(&device, "a", &vertices(2, 1), &[0]).unwrap();

        let err = pool.insert(&device, "big", &vertices(5, 9), &[0]).unwrap_err();
        assert!(matches!(err, MeshPoolError::Alloc(AllocError::OutOfSpace { .. })));
        assert!(pool.is_empty());
        pool.verify().unwrap();
    }

    #[test]
    fn index_failure_releases_the_new_vertex_region() {
        let device = MockGraphicsDevice::new();
        let mut pool = pool(&device, 1024, 8);

        let err = pool.insert(&device, "a", &vertices(1, 1), &[0, 1, 2]).unwrap_err();
        assert!(matches!(err, MeshPoolError::Alloc(AllocError::OutOfSpace { .. })));
        assert_eq!(pool.vertex_stats().active_allocations, 0);
        pool.verify().unwrap();
    }

    #[test]
    fn reinsert_replaces_existing_mesh() {
        let device = MockGraphicsDevice::new();
        let mut pool = pool(&device, 1024, 1024);
        pool.insert(&device, "a", &vertices(2, 1), &[0, 1]).unwrap();
        let slot = pool.insert(&device, "a", &vertices(3, 2), &[0, 1, 2]).unwrap();

        assert_eq!(pool.len(), 1);
        assert_eq!(slot.vertex_count, 3);
        assert_eq!(device.read(pool.vertex_buffer(), 0, 24), vertices(3, 2));
        pool.verify().unwrap();
    }

    #[test]
    fn partial_vertex_is_rejected() {
        let device = MockGraphicsDevice::new();
        let mut pool = pool(&device, 1024, 1024);
        assert_eq!(
            pool.insert(&device, "a", &[0; 12], &[0]),
            Err(MeshPoolError::PartialVertex { len: 12, stride: 8 })
        );
        assert_eq!(
            pool.insert(&device, "a", &[], &[0]),
            Err(MeshPoolError::Alloc(AllocError::ZeroSize))
        );
    }

    #[test]
    fn meshes_iterate_in_vertex_order() {
        let device = MockGraphicsDevice::new();
        let mut pool = pool(&device, 1024, 1024);
        pool.insert(&device, "a", &vertices(2, 1), &[0]).unwrap();
        pool.insert(&device, "b", &vertices(2, 2), &[0]).unwrap();
        pool.insert(&device, "c", &vertices(2, 3), &[0]).unwrap();
        pool.remove(&"a");
        pool.insert(&device, "d", &vertices(1, 4), &[0]).unwrap();

        let order: Vec<_> = pool.meshes().map(|(key, _)| *key).collect();
        assert_eq!(order, vec!["d", "b", "c"]);
    }

    #[test]
    fn clear_and_destroy() {
        let device = MockGraphicsDevice::new();
        let mut pool = pool(&device, 1024, 1024);
        pool.insert(&device, "a", &vertices(2, 1), &[0]).unwrap();
        let before = pool.state_version();

        pool.clear();
        assert!(pool.is_empty());
        assert_ne!(pool.state_version(), before);
        assert_eq!(device.buffer_count(), 2);

        pool.destroy(&device);
        assert_eq!(device.buffer_count(), 0);
    }

    fn region(offset: u64, size: u64) -> Region {
        Region {
            handle: RegionHandle::from_raw(1),
            created_at: 1,
            offset,
            size,
        }
    }

    #[test]
    fn slot_conversion_rejects_out_of_range_offsets() {
        let signed_limit = i32::MAX as u64 + 1;

        let slot = MeshSlot::from_regions(
            &region((signed_limit - 1) * STRIDE, STRIDE),
            &region(u32::MAX as u64 * INDEX_ALIGNMENT, 4),
            STRIDE,
            1,
            1,
        )
        .unwrap();
        assert_eq!(slot.base_vertex, i32::MAX);
        assert_eq!(slot.first_index, u32::MAX);

        assert_eq!(
            MeshSlot::from_regions(&region(signed_limit * STRIDE, STRIDE), &region(0, 4), STRIDE, 1, 1),
            Err(MeshPoolError::MeshTooLarge)
        );
        assert_eq!(
            MeshSlot::from_regions(
                &region(0, STRIDE),
                &region((u32::MAX as u64 + 1) * INDEX_ALIGNMENT, 4),
                STRIDE,
                1,
                1
            ),
            Err(MeshPoolError::MeshTooLarge)
        );
    }

    #[test]
    fn misconfigured_pool_is_rejected() {
        let device = MockGraphicsDevice::new();
        let config = MeshPoolConfig {
            vertex_stride: 12,
            vertex_alignment: 8,
            ..Default::default()
        };
        assert!(matches!(
            MeshPool::<u32>::new(&device, &config),
            Err(MeshPoolError::InvalidConfig(_))
        ));
        assert_eq!(device.buffer_count(), 0);
    }
}
