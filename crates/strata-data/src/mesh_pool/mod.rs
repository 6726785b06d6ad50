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

//! Shared vertex/index storage for batched mesh rendering.
//!
//! A [`MeshPool`] stores many meshes in two [`DynamicBuffer`](crate::allocators::DynamicBuffer)s
//! and evicts the least recently used ones under memory pressure. An
//! [`IndirectDrawCache`] turns the pool's current contents into an indirect
//! draw buffer, rebuilding it only when the pool's allocation state changes.

mod config;
mod error;
mod indirect;
mod pool;

pub use self::config::{MeshPoolConfig, INDEX_ALIGNMENT};
pub use self::error::MeshPoolError;
pub use self::indirect::IndirectDrawCache;
pub use self::pool::{MeshPool, MeshPoolVersion, MeshSlot};
