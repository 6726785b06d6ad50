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

//! Runs the allocators against a real wgpu device. Skips when no adapter is available.

use strata_core::renderer::{BufferUsage, GraphicsDevice, ResourceError};
use strata_data::allocators::{DynamicBuffer, DynamicBufferConfig};
use strata_data::mesh_pool::{IndirectDrawCache, MeshPool, MeshPoolConfig};
use strata_infra::graphics::wgpu::WgpuDevice;

fn device() -> Option<WgpuDevice> {
    let _ = env_logger::builder().is_test(true).try_init();
    match WgpuDevice::headless() {
        Ok(device) => Some(device),
        Err(e) => {
            println!("Skipping wgpu smoke test: {e}");
            None
        }
    }
}

#[test]
fn dynamic_buffer_on_wgpu() {
    let Some(device) = device() else {
        return;
    };
    assert_eq!(device.copy_alignment(), 4);

    let mut buffer = DynamicBuffer::new(
        &device,
        &DynamicBufferConfig {
            label: "Smoke Test Arena".to_string(),
            capacity: 1024,
            alignment: 16,
            usage: BufferUsage::STORAGE,
        },
    )
    .expect("arena creation");
    assert!(device.get_wgpu_buffer(buffer.buffer_id()).is_some());
    assert_eq!(device.vram_usage_bytes(), 1024);

    // Odd-sized payloads are padded by the backend.
    let first = buffer.allocate(&device, &[1, 2, 3]).expect("first upload");
    let second = buffer.allocate(&device, &[4; 17]).expect("second upload");
    assert_eq!(buffer.region(first).map(|r| r.offset), Some(0));
    assert_eq!(buffer.region(second).map(|r| r.offset), Some(16));

    assert!(buffer.free(first));
    assert_eq!(buffer.free_oldest(), Some(second));
    assert_eq!(buffer.active_count(), 0);

    buffer.destroy(&device);
    assert_eq!(device.buffer_count(), 0);
    assert_eq!(device.vram_usage_bytes(), 0);
    assert_eq!(device.vram_peak_bytes(), 1024);
}

#[test]
fn out_of_bounds_write_is_rejected() {
    let Some(device) = device() else {
        return;
    };
    let mut buffer = DynamicBuffer::new(
        &device,
        &DynamicBufferConfig {
            capacity: 64,
            ..Default::default()
        },
    )
    .expect("arena creation");
    let id = buffer.buffer_id();

    assert_eq!(
        device.write_buffer(id, 60, &[0; 5]),
        Err(ResourceError::OutOfBounds { end: 68, size: 64 })
    );
    assert!(device.write_buffer(id, 2, &[0; 4]).is_err());
    assert!(buffer.allocate(&device, &[0; 64]).is_ok());
    buffer.destroy(&device);
}

#[test]
fn mesh_pool_and_indirect_buffer_on_wgpu() {
    let Some(device) = device() else {
        return;
    };
    let mut pool: MeshPool<&str> = MeshPool::new(
        &device,
        &MeshPoolConfig {
            vertex_capacity: 4096,
            vertex_stride: 16,
            vertex_alignment: 16,
            index_capacity: 4096,
        },
    )
    .expect("pool creation");

    pool.insert(&device, "triangle", &[0; 48], &[0, 1, 2])
        .expect("triangle upload");
    pool.insert(&device, "quad", &[0; 64], &[0, 1, 2, 2, 3, 0])
        .expect("quad upload");

    let mut cache = IndirectDrawCache::new();
    assert!(cache.update(&device, &pool).expect("indirect upload"));
    assert_eq!(cache.draw_count(), 2);
    let indirect = cache.buffer_id().expect("indirect buffer");
    assert!(device.get_wgpu_buffer(indirect).is_some());

    cache.destroy(&device);
    pool.destroy(&device);
    assert_eq!(device.buffer_count(), 0);
}
