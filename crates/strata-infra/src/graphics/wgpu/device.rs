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

use super::conversions::IntoWgpu;
use anyhow::{anyhow, Result};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use strata_core::renderer::{BufferDescriptor, BufferId, GraphicsDevice, ResourceError};
use wgpu::util::DeviceExt;

#[derive(Debug)]
struct WgpuBufferEntry {
    wgpu_buffer: Arc<wgpu::Buffer>,
    size: u64, // To track VRAM accurately on destruction
}

/// A [`GraphicsDevice`] backed by a `wgpu` device and queue.
///
/// Buffers live in an internal map keyed by [`BufferId`]; the raw `wgpu::Buffer`
/// for binding is available through [`get_wgpu_buffer`](Self::get_wgpu_buffer).
/// Writes go through `Queue::write_buffer`, so they are staged immediately and
/// land on the GPU with the next submission.
#[derive(Debug)]
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter_name: String,
    buffers: Mutex<HashMap<BufferId, WgpuBufferEntry>>,
    next_buffer_id: AtomicUsize,

    // VRAM Tracking
    vram_allocated_bytes: AtomicU64,
    vram_peak_bytes: AtomicU64,
}

impl WgpuDevice {
    /// Wraps an existing device and queue, e.g. the ones a renderer already created
    /// for its window surface.
    pub fn from_raw(device: wgpu::Device, queue: wgpu::Queue, adapter_name: impl Into<String>) -> Self {
        Self {
            device,
            queue,
            adapter_name: adapter_name.into(),
            buffers: Mutex::new(HashMap::new()),
            next_buffer_id: AtomicUsize::new(0),
            vram_allocated_bytes: AtomicU64::new(0),
            vram_peak_bytes: AtomicU64::new(0),
        }
    }

    /// Creates a device without any surface, for tools, tests and compute-only work.
    ///
    /// Blocks on adapter and device creation.
    pub fn headless() -> Result<Self> {
        pollster::block_on(Self::request_headless())
    }

    async fn request_headless() -> Result<Self> {
        log::info!("Initializing headless WGPU device...");
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::new_without_display_handle());

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| anyhow!("Failed to find a suitable graphics adapter: {}", e))?;

        let adapter_info = adapter.get_info();
        log::info!(
            "Using graphics adapter: \"{}\" (Backend: {:?})",
            adapter_info.name,
            adapter_info.backend
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Strata Headless Device"),
                ..Default::default()
            })
            .await
            .map_err(|e| anyhow!("Failed to create logical device: {}", e))?;

        device.on_uncaptured_error(std::sync::Arc::new(|e| {
            log::error!("WGPU Uncaptured Error: {e:?}");
        }));

        Ok(Self::from_raw(device, queue, adapter_info.name))
    }

    fn buffers(&self) -> Result<MutexGuard<'_, HashMap<BufferId, WgpuBufferEntry>>, ResourceError> {
        self.buffers
            .lock()
            .map_err(|_| ResourceError::BackendError("buffer map mutex poisoned".to_string()))
    }

    fn generate_buffer_id(&self) -> BufferId {
        BufferId(self.next_buffer_id.fetch_add(1, Ordering::Relaxed))
    }

    fn register(&self, wgpu_buffer: wgpu::Buffer, size: u64) -> Result<BufferId, ResourceError> {
        let id = self.generate_buffer_id();
        self.buffers()?.insert(
            id,
            WgpuBufferEntry {
                wgpu_buffer: Arc::new(wgpu_buffer),
                size,
            },
        );

        let current = self.vram_allocated_bytes.fetch_add(size, Ordering::Relaxed) + size;
        self.vram_peak_bytes.fetch_max(current, Ordering::Relaxed);
        Ok(id)
    }

    /// The raw buffer behind an ID, for building bind groups and draw calls.
    pub fn get_wgpu_buffer(&self, id: BufferId) -> Option<Arc<wgpu::Buffer>> {
        let buffers = self.buffers.lock().ok()?;
        buffers.get(&id).map(|entry| Arc::clone(&entry.wgpu_buffer))
    }

    /// The underlying `wgpu` device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// The underlying `wgpu` queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Name of the adapter this device was created from.
    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    /// Bytes currently held by live buffers.
    pub fn vram_usage_bytes(&self) -> u64 {
        self.vram_allocated_bytes.load(Ordering::Relaxed)
    }

    /// Highest value [`vram_usage_bytes`](Self::vram_usage_bytes) has reached.
    pub fn vram_peak_bytes(&self) -> u64 {
        self.vram_peak_bytes.load(Ordering::Relaxed)
    }

    /// Number of live buffers.
    pub fn buffer_count(&self) -> usize {
        self.buffers.lock().map(|b| b.len()).unwrap_or(0)
    }
}

impl GraphicsDevice for WgpuDevice {
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        let wgpu_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: descriptor.label.as_deref(),
            size: descriptor.size,
            usage: descriptor.usage.into_wgpu(),
            mapped_at_creation: descriptor.mapped_at_creation,
        });
        let id = self.register(wgpu_buffer, descriptor.size)?;

        log::info!(
            "WgpuDevice: Created buffer '{}' with ID: {:?}, size: {} bytes",
            descriptor.label.as_deref().unwrap_or_default(),
            id,
            descriptor.size
        );
        Ok(id)
    }

    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        let wgpu_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: descriptor.label.as_deref(),
                contents: data,
                usage: descriptor.usage.into_wgpu(),
            });
        let size = wgpu_buffer.size();
        let id = self.register(wgpu_buffer, size)?;

        log::info!(
            "WgpuDevice: Created buffer '{}' with initial data. ID: {:?}, size: {} bytes",
            descriptor.label.as_deref().unwrap_or_default(),
            id,
            size
        );
        Ok(id)
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        let entry = self.buffers()?.remove(&id).ok_or(ResourceError::NotFound)?;
        entry.wgpu_buffer.destroy();
        self.vram_allocated_bytes
            .fetch_sub(entry.size, Ordering::Relaxed);
        log::debug!("WgpuDevice: Destroyed buffer with ID: {id:?}");
        Ok(())
    }

    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        if data.is_empty() {
            return Ok(());
        }
        if offset % wgpu::COPY_BUFFER_ALIGNMENT != 0 {
            return Err(ResourceError::BackendError(format!(
                "write offset {offset} is not a multiple of {}",
                wgpu::COPY_BUFFER_ALIGNMENT
            )));
        }

        let buffers = self.buffers()?;
        let entry = buffers.get(&id).ok_or(ResourceError::NotFound)?;

        // wgpu only copies whole words; the tail is zero-padded.
        let padded_len = (data.len() as u64).next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);
        let end = offset + padded_len;
        let buffer_size = entry.wgpu_buffer.size();
        if end > buffer_size {
            return Err(ResourceError::OutOfBounds {
                end,
                size: buffer_size,
            });
        }

        let bytes: Cow<[u8]> = if padded_len == data.len() as u64 {
            Cow::Borrowed(data)
        } else {
            let mut padded = Vec::with_capacity(padded_len as usize);
            padded.extend_from_slice(data);
            padded.resize(padded_len as usize, 0);
            Cow::Owned(padded)
        };
        self.queue.write_buffer(&entry.wgpu_buffer, offset, &bytes);

        log::debug!(
            "WgpuDevice: Wrote {} bytes to buffer ID: {:?} at offset {}",
            data.len(),
            id,
            offset
        );
        Ok(())
    }

    fn copy_alignment(&self) -> u64 {
        wgpu::COPY_BUFFER_ALIGNMENT
    }
}
