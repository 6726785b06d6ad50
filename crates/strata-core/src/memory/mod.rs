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

//! Reporting types for GPU arena usage.
//!
//! Sub-allocators in `strata-data` fill an [`ArenaStats`] snapshot from their region
//! lists; telemetry and debug overlays read it without needing to know how the
//! arena is laid out.

/// A snapshot of one arena's occupancy, including derived metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ArenaStats {
    // --- Current State ---
    /// Size of the arena in bytes, after alignment rounding.
    pub capacity: u64,
    /// Bytes covered by allocated regions (including alignment padding).
    pub used_bytes: u64,
    /// Bytes covered by free regions.
    pub free_bytes: u64,

    // --- Region Counters ---
    /// Number of live allocations.
    pub active_allocations: usize,
    /// Number of free regions.
    pub free_regions: usize,
    /// Size of the biggest free region, i.e. the largest request that can still succeed.
    pub largest_free_region: u64,

    // --- Calculated Metrics ---
    /// `used_bytes / capacity`, in `[0, 1]`.
    pub utilization: f64,
    /// `1 - largest_free_region / free_bytes`: 0 when all free space is one region,
    /// approaching 1 as free space gets scattered.
    pub fragmentation_ratio: f64,
}

impl ArenaStats {
    /// Populates the derived metrics from the raw counters.
    pub fn calculate_derived_metrics(&mut self) {
        self.utilization = if self.capacity > 0 {
            self.used_bytes as f64 / self.capacity as f64
        } else {
            0.0
        };

        self.fragmentation_ratio = if self.free_bytes > 0 {
            1.0 - (self.largest_free_region as f64 / self.free_bytes as f64)
        } else {
            0.0
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_free_block_is_not_fragmented() {
        let mut stats = ArenaStats {
            capacity: 100,
            used_bytes: 40,
            free_bytes: 60,
            largest_free_region: 60,
            ..Default::default()
        };
        stats.calculate_derived_metrics();
        assert_eq!(stats.utilization, 0.4);
        assert_eq!(stats.fragmentation_ratio, 0.0);
    }

    #[test]
    fn scattered_free_space_raises_fragmentation() {
        let mut stats = ArenaStats {
            capacity: 100,
            used_bytes: 20,
            free_bytes: 80,
            largest_free_region: 20,
            ..Default::default()
        };
        stats.calculate_derived_metrics();
        assert!((stats.fragmentation_ratio - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_arena_has_zero_metrics() {
        let mut stats = ArenaStats::default();
        stats.calculate_derived_metrics();
        assert_eq!(stats.utilization, 0.0);
        assert_eq!(stats.fragmentation_ratio, 0.0);
    }
}
