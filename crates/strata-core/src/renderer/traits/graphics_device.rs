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

use crate::renderer::api::buffer::{BufferDescriptor, BufferId};
use crate::renderer::error::ResourceError;
use std::fmt::Debug;

/// The buffer-facing half of a graphics device.
///
/// Implementations own the real GPU objects and hand out [`BufferId`]s. Every method
/// takes `&self`; backends synchronize internally so a device can be shared behind an
/// `Arc` between the render loop and streaming code.
pub trait GraphicsDevice: Send + Sync + Debug + 'static {
    /// Creates a new GPU buffer.
    /// ## Arguments
    /// * `descriptor` - Size, usage and label of the buffer.
    /// ## Returns
    /// The ID of the created buffer, or an error if the backend refused it.
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError>;

    /// Creates a new GPU buffer initialized with `data`.
    /// ## Arguments
    /// * `descriptor` - Usage and label of the buffer. The size is taken from `data`.
    /// * `data` - The initial contents.
    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError>;

    /// Destroys a GPU buffer.
    /// ## Errors
    /// * [`ResourceError::NotFound`] - If the ID does not name a live buffer.
    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError>;

    /// Writes `data` into a buffer starting at `offset` bytes.
    ///
    /// The copy is issued synchronously from the caller's point of view: once this
    /// returns `Ok`, `data` may be reused.
    /// ## Errors
    /// * [`ResourceError::NotFound`] - If the buffer does not exist.
    /// * [`ResourceError::OutOfBounds`] - If the write would end past the buffer.
    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError>;

    /// The granularity, in bytes, that buffer write offsets and sizes must respect.
    ///
    /// Sub-allocators use it to reject arena alignments the backend cannot honour.
    fn copy_alignment(&self) -> u64 {
        1
    }
}
