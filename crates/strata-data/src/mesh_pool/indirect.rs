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

use super::pool::{MeshPool, MeshPoolVersion};
use std::borrow::Cow;
use std::hash::Hash;
use strata_core::renderer::{
    BufferDescriptor, BufferId, BufferUsage, DrawIndexedIndirectArgs, GraphicsDevice,
    ResourceError,
};

/// An `INDIRECT` buffer holding one draw command per mesh of a [`MeshPool`].
///
/// [`update`](Self::update) compares the pool's [`MeshPoolVersion`] with the one the
/// buffer was built from and only regenerates the commands after meshes were
/// stored, removed or evicted. `first_instance` of each command carries the
/// command's position in the buffer, so shaders can fetch per-draw data with it.
#[derive(Debug, Default)]
pub struct IndirectDrawCache {
    buffer: Option<BufferId>,
    capacity: usize,
    built_from: Option<MeshPoolVersion>,
    commands: Vec<DrawIndexedIndirectArgs>,
}

impl IndirectDrawCache {
    /// Creates an empty cache. No GPU buffer exists until the first non-empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the commands if the pool changed. Returns `true` if a rebuild happened.
    pub fn update<K: Eq + Hash + Clone>(
        &mut self,
        device: &dyn GraphicsDevice,
        pool: &MeshPool<K>,
    ) -> Result<bool, ResourceError> {
        let version = pool.state_version();
        if self.built_from == Some(version) {
            return Ok(false);
        }

        self.commands.clear();
        // The pool never holds more than u32::MAX meshes.
        self.commands.extend(pool.meshes().zip(0_u32..).map(
            |((_, slot), first_instance)| DrawIndexedIndirectArgs {
                index_count: slot.index_count,
                instance_count: 1,
                first_index: slot.first_index,
                base_vertex: slot.base_vertex,
                first_instance,
            },
        ));

        if !self.commands.is_empty() {
            self.upload(device)?;
        }
        self.built_from = Some(version);
        log::debug!(
            "IndirectDrawCache: rebuilt {} draw commands",
            self.commands.len()
        );
        Ok(true)
    }

    fn upload(&mut self, device: &dyn GraphicsDevice) -> Result<(), ResourceError> {
        let bytes = DrawIndexedIndirectArgs::as_bytes(&self.commands);
        if let Some(buffer) = self.buffer.filter(|_| self.commands.len() <= self.capacity) {
            return device.write_buffer(buffer, 0, bytes);
        }

        if let Some(old) = self.buffer.take() {
            if let Err(e) = device.destroy_buffer(old) {
                log::warn!("IndirectDrawCache: Failed to destroy buffer: {:?}", e);
            }
        }
        self.capacity = 0;
        let buffer = device.create_buffer_with_data(
            &BufferDescriptor {
                label: Some(Cow::Borrowed("Indirect Draw Commands")),
                size: bytes.len() as u64,
                usage: BufferUsage::INDIRECT | BufferUsage::COPY_DST,
                mapped_at_creation: false,
            },
            bytes,
        )?;
        self.buffer = Some(buffer);
        self.capacity = self.commands.len();
        Ok(())
    }

    /// The commands as of the last update, in vertex-buffer order.
    pub fn commands(&self) -> &[DrawIndexedIndirectArgs] {
        &self.commands
    }

    /// Number of valid commands in the indirect buffer.
    pub fn draw_count(&self) -> u32 {
        self.commands
            .last()
            .map_or(0, |command| command.first_instance + 1)
    }

    /// The indirect buffer, once one has been created.
    pub fn buffer_id(&self) -> Option<BufferId> {
        self.buffer
    }

    /// Forces the next update to rebuild.
    pub fn invalidate(&mut self) {
        self.built_from = None;
    }

    /// Releases the indirect buffer.
    pub fn destroy(self, device: &dyn GraphicsDevice) {
        if let Some(buffer) = self.buffer {
            if let Err(e) = device.destroy_buffer(buffer) {
                log::warn!("IndirectDrawCache: Failed to destroy buffer: {:?}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocators::mock_device::MockGraphicsDevice;
    use crate::mesh_pool::MeshPoolConfig;

    fn pool(device: &MockGraphicsDevice) -> MeshPool<u32> {
        MeshPool::new(
            device,
            &MeshPoolConfig {
                vertex_capacity: 1024,
                vertex_stride: 4,
                vertex_alignment: 4,
                index_capacity: 1024,
            },
        )
        .unwrap()
    }

    #[test]
    fn empty_pool_creates_no_buffer() {
        let device = MockGraphicsDevice::new();
        let pool = pool(&device);
        let mut cache = IndirectDrawCache::new();

        assert!(cache.update(&device, &pool).unwrap());
        assert_eq!(cache.draw_count(), 0);
        assert!(cache.buffer_id().is_none());
        assert!(!cache.update(&device, &pool).unwrap());
    }

    #[test]
    fn commands_follow_pool_layout() {
        let device = MockGraphicsDevice::new();
        let mut pool = pool(&device);
        pool.insert(&device, 1, &[0; 12], &[0, 1, 2]).unwrap();
        pool.insert(&device, 2, &[0; 16], &[0, 1, 2, 2, 3, 0]).unwrap();

        let mut cache = IndirectDrawCache::new();
        assert!(cache.update(&device, &pool).unwrap());
        assert_eq!(
            cache.commands(),
            &[
                DrawIndexedIndirectArgs {
                    index_count: 3,
                    instance_count: 1,
                    first_index: 0,
                    base_vertex: 0,
                    first_instance: 0,
                },
                DrawIndexedIndirectArgs {
                    index_count: 6,
                    instance_count: 1,
                    first_index: 3,
                    base_vertex: 3,
                    first_instance: 1,
                },
            ]
        );
        assert_eq!(cache.draw_count(), 2);

        let id = cache.buffer_id().unwrap();
        assert_eq!(
            device.contents(id).unwrap(),
            DrawIndexedIndirectArgs::as_bytes(cache.commands())
        );
    }

    #[test]
    fn rebuilds_only_when_pool_changes() {
        let device = MockGraphicsDevice::new();
        let mut pool = pool(&device);
        pool.insert(&device, 1, &[0; 4], &[0]).unwrap();

        let mut cache = IndirectDrawCache::new();
        cache.update(&device, &pool).unwrap();
        pool.touch(&1);
        assert!(!cache.update(&device, &pool).unwrap());

        pool.insert(&device, 2, &[0; 4], &[0]).unwrap();
        assert!(cache.update(&device, &pool).unwrap());
        assert_eq!(cache.draw_count(), 2);

        cache.invalidate();
        assert!(cache.update(&device, &pool).unwrap());
    }

    #[test]
    fn buffer_grows_and_is_reused_when_shrinking() {
        let device = MockGraphicsDevice::new();
        let mut pool = pool(&device);
        let mut cache = IndirectDrawCache::new();

        pool.insert(&device, 1, &[0; 4], &[0]).unwrap();
        cache.update(&device, &pool).unwrap();
        let small = cache.buffer_id().unwrap();

        pool.insert(&device, 2, &[0; 4], &[0]).unwrap();
        cache.update(&device, &pool).unwrap();
        let grown = cache.buffer_id().unwrap();
        assert_ne!(small, grown);
        assert!(device.contents(small).is_none());

        pool.remove(&2);
        cache.update(&device, &pool).unwrap();
        assert_eq!(cache.buffer_id(), Some(grown));
        assert_eq!(cache.draw_count(), 1);

        // Pool buffers plus the indirect buffer.
        assert_eq!(device.buffer_count(), 3);
        cache.destroy(&device);
        assert_eq!(device.buffer_count(), 2);
    }
}
