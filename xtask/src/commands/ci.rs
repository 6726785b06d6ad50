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
use std::time::Instant;

pub fn build() -> Result<()> {
    print_task_start("Building All Crates", HAMMER, BLUE);
    execute_command(
        "cargo",
        &["build", "--workspace", "--all-targets", "--exclude", "xtask"],
        "Build",
    )
}

pub fn test() -> Result<()> {
    print_task_start("Running All Tests", TEST_TUBE, GREEN);
    println!(
        "{}💡 Info:{} Unit, property, integration and doc tests",
        BOLD, RESET
    );
    execute_command("cargo", &["test", "--workspace"], "Tests")
}

pub fn check() -> Result<()> {
    print_task_start("Checking All Crates", MAGNIFIER, CYAN);
    execute_command("cargo", &["check", "--workspace", "--all-targets"], "Check")
}

pub fn format() -> Result<()> {
    print_task_start("Formatting Code", BRUSH, MAGENTA);
    // `fmt` takes `--all`, not `--workspace`.
    execute_command("cargo", &["fmt", "--all"], "Format")
}

pub fn clippy() -> Result<()> {
    print_task_start("Running Clippy", CLIPPY, YELLOW);
    execute_command(
        "cargo",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
        "Clippy",
    )
}

pub fn all() -> Result<()> {
    println!("{}", BANNER);
    let tasks: [(&str, fn() -> Result<()>); 6] = [
        ("Build Phase", build),
        ("Test Phase", test),
        ("Verify Phase", super::arena::verify),
        ("Check Phase", check),
        ("Format Phase", format),
        ("Clippy Phase", clippy),
    ];

    let start_time = Instant::now();
    let total_tasks = tasks.len();
    let mut failed = Vec::new();

    for (i, (name, task_fn)) in tasks.iter().enumerate() {
        println!(
            "\n{}{}[{}/{}] {}{}",
            BOLD,
            BLUE,
            i + 1,
            total_tasks,
            name,
            RESET
        );
        if let Err(e) = task_fn() {
            print_error(&e.to_string());
            failed.push(*name);
        }
    }

    println!(
        "\n{}{}Pipeline finished in {:.2}s{}",
        BOLD,
        CYAN,
        start_time.elapsed().as_secs_f64(),
        RESET
    );

    if failed.is_empty() {
        print_success(&format!("All {total_tasks} tasks passed"));
        Ok(())
    } else {
        anyhow::bail!("{} of {} tasks failed: {}", failed.len(), total_tasks, failed.join(", "))
    }
}
