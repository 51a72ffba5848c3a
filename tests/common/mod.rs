//! Common helpers for rulesmith integration tests
//!
//! CLI tests run the real binary with a clean environment: no color, no
//! inherited `RULESMITH_*` variables, working directory set to the project.

// Not every helper is used by every test file
#![allow(dead_code)]

use assert_cmd::Command;
use std::path::Path;

use rulesmith::condition::StaticFacts;
use rulesmith::core::Platform;
use rulesmith::resolver::{ResolveOptions, Resolution, resolve};
use rulesmith::source::{MultiSourceLoadResult, SourceLoadResult};
use rulesmith::targets::{GenerationOutput, generate};

/// The `rulesmith` binary, ready to run inside `project_dir`.
pub fn rulesmith(project_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("rulesmith").expect("binary is built for integration tests");
    cmd.current_dir(project_dir)
        .env("NO_COLOR", "1")
        .env_remove("RULESMITH_STRICT")
        .env_remove("RULESMITH_LOG")
        .env_remove("RULESMITH_CONFIG");
    cmd
}

/// Resolve in-memory sources for one target with no facts.
pub fn resolve_sources(sources: Vec<SourceLoadResult>, target: Platform) -> Resolution {
    resolve_with(sources, target, &StaticFacts::new())
}

pub fn resolve_with(sources: Vec<SourceLoadResult>, target: Platform, facts: &StaticFacts) -> Resolution {
    rulesmith::test_utils::init_test_logging(None);
    let sources = MultiSourceLoadResult::from(sources);
    let options = ResolveOptions {
        project_name: "demo".to_string(),
        ..ResolveOptions::default()
    };
    resolve(&sources, target, facts, &options)
}

/// Resolve and generate.
pub fn build(sources: Vec<SourceLoadResult>, target: Platform) -> GenerationOutput {
    generate(&resolve_sources(sources, target).content)
}
