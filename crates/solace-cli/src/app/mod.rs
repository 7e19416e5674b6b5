//! Application-level utilities for the Solace CLI.
//!
//! This module provides:
//! - Config path resolution
//! - Store and orchestrator setup
//! - Password input

mod context;
mod password;
mod resolver;

pub use context::AppContext;
pub use password::prompt_new_password;
