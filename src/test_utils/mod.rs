//! Test utilities for rulesmith
//!
//! Helpers shared by unit and integration tests:
//! - [`init_test_logging`] installs a test-friendly tracing subscriber once
//! - [`TestProjectBuilder`] lays out a project directory with sources and a config
//! - [`DocumentFixture`] provides sample documents
//!
//! # Example
//!
//! ```rust,no_run
//! use rulesmith::test_utils::{DocumentFixture, TestProjectBuilder};
//!
//! let project = TestProjectBuilder::new()
//!     .unwrap()
//!     .with_config("[project]\nname = \"demo\"\n")
//!     .with_document(DocumentFixture::rule_always())
//!     .build()
//!     .unwrap();
//! assert!(project.file_exists(".rulesmith/rules/style.md"));
//! ```

pub mod builder;
pub mod fixtures;

pub use builder::{TestProject, TestProjectBuilder};
pub use fixtures::DocumentFixture;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::constants::LOG_ENV_VAR;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, otherwise `RULESMITH_LOG`. With neither, tests
/// run silently.
///
/// ```bash
/// RULESMITH_LOG=rulesmith=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if let Ok(directive) = std::env::var(LOG_ENV_VAR) {
            EnvFilter::new(directive)
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
