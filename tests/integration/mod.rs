//! Integration test suite for apimtool
//!
//! Drives the compiled binary against temporary project directories. No test
//! reaches the network: commands that need the control plane are only
//! exercised up to the point where local validation or configuration fails.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! - **cli_surface**: help output and argument validation
//! - **template_commands**: `template backend create|delete`
//! - **parse_command**: `parse` up to the control-plane boundary

#[path = "../common/mod.rs"]
mod common;

mod cli_surface;
mod parse_command;
mod template_commands;
