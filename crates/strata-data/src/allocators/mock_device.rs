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

//! An in-memory [`GraphicsDevice`] for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use strata_core::renderer::{BufferDescriptor, BufferId, GraphicsDevice, ResourceError};

/// Keeps every buffer as a byte vector so tests can read uploads back.
#[derive(Debug)]
pub(crate) struct MockGraphicsDevice {
    next_id: AtomicUsize,
    buffers: Mutex<HashMap<BufferId, Vec<u8>>>,
    fail_writes: AtomicBool,
    copy_alignment: u64,
}

impl MockGraphicsDevice {
    pub(crate) fn new() -> Self {
        Self::with_copy_alignment(1)
    }

    pub(crate) fn with_copy_alignment(copy_alignment: u64) -> Self {
        Self {
            next_id: AtomicUsize::new(1),
            buffers: Mutex::new(HashMap::new()),
            fail_writes: AtomicBool::new(false),
            copy_alignment,
        }
    }

    /// Makes every subsequent `write_buffer` fail with a backend error.
    pub(crate) fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    pub(crate) fn read(&self, id: BufferId, offset: u64, len: usize) -> Vec<u8> {
        let buffers = self.buffers.lock().unwrap();
        let start = offset as usize;
        buffers[&id][start..start + len].to_vec()
    }

    pub(crate) fn contents(&self, id: BufferId) -> Option<Vec<u8>> {
        self.buffers.lock().unwrap().get(&id).cloned()
    }

    pub(crate) fn buffer_count(&self) -> usize {
        self.buffers.lock().unwrap().len()
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        let id = BufferId(self.next_id.fetch_add(1, Ordering::Relaxed));
        // Poison pattern, so tests can tell written bytes from untouched ones.
        self.buffers
            .lock()
            .unwrap()
            .insert(id, vec![0xAA; descriptor.size as usize]);
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
        self.buffers
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(ResourceError::NotFound)
    }

    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(ResourceError::BackendError("injected failure".to_string()));
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
