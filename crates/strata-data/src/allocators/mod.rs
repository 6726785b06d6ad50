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

//! Sub-allocators that carve one large GPU buffer into variable-sized regions.
//!
//! [`RegionAllocator`] is the pure bookkeeping: an ordered list of adjacent
//! regions, best-fit placement, coalescing on free and age-based eviction.
//! [`DynamicBuffer`] pairs it with a real GPU buffer and uploads payloads into
//! the regions it hands out.

mod dynamic_buffer;
mod error;
mod region;
mod region_allocator;

#[cfg(test)]
pub(crate) mod mock_device;

pub use self::dynamic_buffer::{
    DynamicBuffer, DynamicBufferConfig, DEFAULT_ALIGNMENT, DEFAULT_CAPACITY,
};
pub use self::error::{AllocError, InvariantViolation};
pub use self::region::{Region, RegionHandle, StateVersion};
pub use self::region_allocator::RegionAllocator;
