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

//! Backend-agnostic rendering contracts consumed by the allocators.
//!
//! Only the slice of the rendering API that GPU sub-allocation needs lives here:
//! buffer identifiers and descriptors, the [`GraphicsDevice`] buffer interface,
//! and the layout of indirect draw arguments. A concrete backend (see the
//! `strata-infra` crate) implements [`GraphicsDevice`]; the allocators in
//! `strata-data` only ever talk to the trait.

pub mod api;
pub mod error;
pub mod traits;

pub use self::api::*;
pub use self::error::ResourceError;
pub use self::traits::GraphicsDevice;
