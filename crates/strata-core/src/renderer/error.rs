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

//! Defines the error type for GPU resource operations.

use std::fmt;

/// An error related to the creation or use of a GPU resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// The resource referenced by an ID does not exist (never created or already destroyed).
    NotFound,
    /// An access reached past the end of the resource.
    OutOfBounds {
        /// First byte past the attempted access.
        end: u64,
        /// Size of the resource in bytes.
        size: u64,
    },
    /// An error originating from the specific graphics backend implementation.
    BackendError(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::NotFound => write!(f, "Resource not found with ID."),
            ResourceError::OutOfBounds { end, size } => {
                write!(
                    f,
                    "Resource access out of bounds (end {end} > size {size})."
                )
            }
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
        }
    }
}

impl std::error::Error for ResourceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_error_display() {
        assert_eq!(
            ResourceError::NotFound.to_string(),
            "Resource not found with ID."
        );
        assert_eq!(
            ResourceError::OutOfBounds { end: 12, size: 8 }.to_string(),
            "Resource access out of bounds (end 12 > size 8)."
        );
        assert_eq!(
            ResourceError::BackendError("lost".to_string()).to_string(),
            "Backend-specific resource error: lost"
        );
    }
}
