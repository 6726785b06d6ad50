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

//! Shared fixtures for the integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use strata_core::renderer::{BufferDescriptor, BufferId, GraphicsDevice, ResourceError};

/// A host-memory device that enforces a copy granularity like real backends do.
#[derive(Debug)]
pub struct HostDevice {
    next_id: AtomicUsize,
    buffers: Mutex<HashMap<BufferId, Vec<u8>>>,
    copy_alignment: u64,
}

#[allow(dead_code)]
impl HostDevice {
    pub fn new(copy_alignment: u64) -> Self {
        Self {
            next_id: AtomicUsize::new(0),
            buffers: Mutex::new(HashMap::new()),
            copy_alignment,
        }
    }

    pub fn read(&self, id: BufferId, offset: u64, len: usize) -> Vec<u8> {
        let buffers = self.buffers.lock().unwrap();
        buffers[&id][offset as usize..offset as usize + len].to_vec()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.lock().unwrap().len()
    }
}

impl GraphicsDevice for HostDevice {
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        let id = BufferId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.buffers
            .lock()
            .unwrap()
            .insert(id, vec![0; descriptor.size as usize]);
        Ok(id)
    }

    fn create_buffer_with_data(
        &self,
        _descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        let id = BufferId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.buffers.lock().unwrap().insert(id, data.to_vec());
        Ok(id)
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        match self.buffers.lock().unwrap().remove(&id) {
            Some(_) => Ok(()),
            None => Err(ResourceError::NotFound),
        }
    }

    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        if offset % self.copy_alignment != 0 {
            return Err(ResourceError::BackendError(format!(
                "write offset {offset} is not {}-byte aligned",
                self.copy_alignment
            )));
        }
        let mut buffers = self.buffers.lock().unwrap();
        let buffer = buffers.get_mut(&id).ok_or(ResourceError::NotFound)?;
        let end = offset + data.len() as u64;
        if end > buffer.len() as u64 {
            return Err(ResourceError::OutOfBounds {
                end,
                size: buffer.len() as u64,
            });
        }
        buffer[offset as usize..end as usize].copy_from_slice(data);
        Ok(())
    }

    fn copy_alignment(&self) -> u64 {
        self.copy_alignment
    }
}
