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

use super::error::MeshPoolError;
use serde::{Deserialize, Serialize};

/// Alignment of the index arena. Indices are always `u32`.
pub const INDEX_ALIGNMENT: u64 = 4;

/// Sizing of a [`MeshPool`](super::MeshPool).
///
/// Loadable from RON, e.g. `(vertex_capacity: 1048576, vertex_stride: 32)`;
/// omitted fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshPoolConfig {
    /// Size of the vertex arena in bytes.
    pub vertex_capacity: u64,
    /// Size of one vertex in bytes.
    pub vertex_stride: u64,
    /// Granularity of vertex regions. Must be a multiple of `vertex_stride`.
    pub vertex_alignment: u64,
    /// Size of the index arena in bytes.
    pub index_capacity: u64,
}

impl Default for MeshPoolConfig {
    fn default() -> Self {
        Self {
            vertex_capacity: 32 * 1024 * 1024,
            vertex_stride: 32,
            vertex_alignment: 32,
            index_capacity: 16 * 1024 * 1024,
        }
    }
}

impl MeshPoolConfig {
    /// Parses a configuration from RON text and validates it.
    pub fn from_ron(text: &str) -> Result<Self, MeshPoolError> {
        let config: Self =
            ron::from_str(text).map_err(|e| MeshPoolError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration as pretty RON.
    pub fn to_ron(&self) -> Result<String, MeshPoolError> {
        let pretty_config = ron::ser::PrettyConfig::default().indentor("  ".to_string());
        ron::ser::to_string_pretty(self, pretty_config)
            .map_err(|e| MeshPoolError::InvalidConfig(e.to_string()))
    }

    /// Checks that vertex regions always start on a whole vertex.
    pub fn validate(&self) -> Result<(), MeshPoolError> {
        if self.vertex_stride == 0 {
            return Err(MeshPoolError::InvalidConfig(
                "vertex_stride must be non-zero".to_string(),
            ));
        }
        if self.vertex_alignment == 0 || self.vertex_alignment % self.vertex_stride != 0 {
            return Err(MeshPoolError::InvalidConfig(format!(
                "vertex_alignment {} is not a non-zero multiple of vertex_stride {}",
                self.vertex_alignment, self.vertex_stride
            )));
        }
        Ok(())
    }
}
