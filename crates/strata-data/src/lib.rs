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

//! # Strata Data
//!
//! GPU memory layouts and the systems that fill them: the region sub-allocator
//! behind [`DynamicBuffer`](allocators::DynamicBuffer), the [`MeshPool`](mesh_pool::MeshPool)
//! that packs mesh geometry into shared vertex/index arenas, and the
//! [`IndirectDrawCache`](mesh_pool::IndirectDrawCache) that turns the pool into
//! multi-draw commands.

#![warn(missing_docs)]

pub mod allocators;
pub mod mesh_pool;
