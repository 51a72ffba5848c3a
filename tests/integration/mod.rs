//! Integration test suite for rulesmith
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **pipeline**: end-to-end resolution properties through the library API
//! - **loader**: the local directory loader and project fact inspection
//! - **build**: `rulesmith build`, including dry runs and strict mode
//! - **check**: `rulesmith check` drift reporting
//! - **validate**: `rulesmith validate` diagnostics and exit codes
//! - **list**: `rulesmith list` output

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod build;
mod check;
mod list;
mod loader;
mod pipeline;
mod validate;
