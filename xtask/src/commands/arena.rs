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

use crate::helpers::*;
use anyhow::Result;

pub fn verify() -> Result<()> {
    print_task_start("Verifying Arena Invariants", MAGNIFIER, CYAN);
    println!(
        "{}💡 Info:{} Every allocator mutation re-checks the region list",
        BOLD, RESET
    );
    execute_command(
        "cargo",
        &["test", "-p", "strata-data", "--features", "verify"],
        "Verify",
    )
}

pub fn bench() -> Result<()> {
    print_task_start("Benchmarking Allocator", GAUGE, MAGENTA);
    execute_command(
        "cargo",
        &["bench", "-p", "strata-data", "--bench", "allocator_bench"],
        "Bench",
    )
}

pub fn smoke() -> Result<()> {
    print_task_start("WGPU Smoke Tests", TEST_TUBE, GREEN);
    println!(
        "{}💡 Info:{} Tests print a skip notice when no adapter is found",
        BOLD, RESET
    );
    execute_command(
        "cargo",
        &[
            "test",
            "-p",
            "strata-infra",
            "--test",
            "headless_smoke",
            "--",
            "--nocapture",
        ],
        "Smoke",
    )
}
