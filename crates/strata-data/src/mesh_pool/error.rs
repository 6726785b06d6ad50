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

use crate::allocators::AllocError;
use std::fmt;

/// Errors reported by [`MeshPool`](super::MeshPool).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshPoolError {
    /// The pool configuration is unusable, or could not be parsed.
    InvalidConfig(String),
    /// The vertex payload is not a whole number of vertices.
    PartialVertex {
        /// Length of the payload in bytes.
        len: usize,
        /// The configured vertex stride.
        stride: u64,
    },
    /// The mesh has more vertices or indices than a draw command can address.
    MeshTooLarge,
    /// The pool already holds as many meshes as a `u32` draw count can address.
    TooManyMeshes,
    /// One of the underlying arenas refused the request.
    Alloc(AllocError),
}

impl fmt::Display for MeshPoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshPoolError::InvalidConfig(msg) => write!(f, "Invalid mesh pool configuration: {msg}"),
            MeshPoolError::PartialVertex { len, stride } => write!(
                f,
                "Vertex data of {len} bytes is not a multiple of the {stride}-byte stride."
            ),
            MeshPoolError::MeshTooLarge => {
                write!(f, "Mesh exceeds the u32 range of indirect draw arguments.")
            }
            MeshPoolError::TooManyMeshes => {
                write!(f, "Mesh pool exceeds the u32 range of indirect draw counts.")
            }
            MeshPoolError::Alloc(err) => write!(f, "Mesh pool allocation failed: {err}"),
        }
    }
}

impl std::error::Error for MeshPoolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MeshPoolError::Alloc(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AllocError> for MeshPoolError {
    fn from(err: AllocError) -> Self {
        MeshPoolError::Alloc(err)
    }
}
