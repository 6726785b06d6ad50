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

//! GPU-side layout of indirect draw commands.

use bytemuck::{Pod, Zeroable};

/// Arguments of one indexed indirect draw, laid out exactly as the GPU reads them.
///
/// An indirect buffer is a tightly packed array of these records; each one is
/// equivalent to `draw_indexed(first_index..first_index + index_count,
/// base_vertex, first_instance..first_instance + instance_count)`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct DrawIndexedIndirectArgs {
    /// Number of indices to draw.
    pub index_count: u32,
    /// Number of instances to draw.
    pub instance_count: u32,
    /// First index within the bound index buffer, in elements.
    pub first_index: u32,
    /// Value added to each index before fetching the vertex.
    pub base_vertex: i32,
    /// First instance to draw.
    pub first_instance: u32,
}

impl DrawIndexedIndirectArgs {
    /// Size in bytes of one record inside an indirect buffer.
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    /// Reinterprets a slice of commands as the bytes to upload.
    pub fn as_bytes(commands: &[Self]) -> &[u8] {
        bytemuck::cast_slice(commands)
    }
}
