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

// Build automation for the Strata workspace.
// Run with: cargo xtask <command>

mod commands;
mod helpers;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xtask", about = "Strata build automation", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Task>,
}

#[derive(Subcommand)]
enum Task {
    /// Build all crates in the workspace.
    Build,
    /// Run all tests in the workspace.
    Test,
    /// Run `cargo check` on all crates.
    Check,
    /// Format all code in the workspace.
    Format,
    /// Run clippy on all crates with warnings as errors.
    Clippy,
    /// Run the allocator tests with the consistency check after every mutation.
    Verify,
    /// Run the criterion benchmarks of the region allocator.
    Bench,
    /// Run the wgpu smoke tests with output (skipped without an adapter).
    Smoke,
    /// Run all CI tasks (build, test, verify, check, format, clippy).
    All,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let Some(task) = cli.command else {
        helpers::print_custom_help();
        return Ok(());
    };

    match task {
        Task::Build => commands::ci::build(),
        Task::Test => commands::ci::test(),
        Task::Check => commands::ci::check(),
        Task::Format => commands::ci::format(),
        Task::Clippy => commands::ci::clippy(),
        Task::Verify => commands::arena::verify(),
        Task::Bench => commands::arena::bench(),
        Task::Smoke => commands::arena::smoke(),
        Task::All => commands::ci::all(),
    }
}
