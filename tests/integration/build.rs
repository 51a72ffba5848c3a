use predicates::prelude::*;
use rulesmith::test_utils::{DocumentFixture, TestProject, TestProjectBuilder};

use crate::common::rulesmith;

const PACKAGE_JSON: &str = r#"{"name": "web", "devDependencies": {"typescript": "^5"}}"#;

fn full_project() -> TestProject {
    DocumentFixture::full_set()
        .into_iter()
        .fold(
            TestProjectBuilder::new().unwrap().with_config("[project]\nname = \"demo\"\n"),
            TestProjectBuilder::with_document,
        )
        .with_file("package.json", PACKAGE_JSON)
        .build()
        .unwrap()
}

#[test]
fn test_build_writes_every_target() {
    let project = full_project();

    rulesmith(project.path())
        .arg("build")
        .assert()
        .success()
        .stdout(predicate::str::contains("Built claude, cursor, opencode"))
        .stdout(predicate::str::contains("wrote .claude/rules/style.md"));

    for path in [
        ".claude/rules/style.md",
        ".claude/agents/child.md",
        ".claude/settings.json",
        "CLAUDE.md",
        ".cursor/rules/style.mdc",
        ".cursor/rules/typescript.mdc",
        "AGENTS.md",
        ".opencode/agent/child.md",
    ] {
        assert!(project.file_exists(path), "{path} was not written");
    }
    assert!(project.read(".cursor/rules/style.mdc").unwrap().contains("alwaysApply: true"));
    assert!(project.read("AGENTS.md").unwrap().contains("Keep functions short."));
}

#[test]
fn test_second_build_changes_nothing() {
    let project = full_project();
    rulesmith(project.path()).arg("build").assert().success();
    let before = project.read("CLAUDE.md").unwrap();

    rulesmith(project.path())
        .arg("build")
        .assert()
        .success()
        .stdout(predicate::str::contains("(wrote 0,"))
        .stdout(predicate::str::contains("wrote .").not());
    assert_eq!(project.read("CLAUDE.md").unwrap(), before);
}

#[test]
fn test_dry_run_writes_nothing() {
    let project = full_project();

    rulesmith(project.path())
        .args(["build", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("would write CLAUDE.md"));

    assert!(!project.file_exists("CLAUDE.md"));
    assert!(!project.path().join(".cursor").exists());
}

#[test]
fn test_target_flag_limits_output() {
    let project = full_project();

    rulesmith(project.path())
        .args(["build", "--target", "cursor"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Built cursor ("));

    assert!(project.file_exists(".cursor/rules/style.mdc"));
    assert!(!project.file_exists("CLAUDE.md"));
    assert!(!project.file_exists("AGENTS.md"));
}

#[test]
fn test_unknown_target_suggests_a_name() {
    let project = full_project();

    rulesmith(project.path())
        .args(["build", "--target", "cursr"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown platform 'cursr'"))
        .stderr(predicate::str::contains("did you mean 'cursor'?"));
}

#[test]
fn test_strict_mode_fails_on_warnings() {
    let project = TestProjectBuilder::new()
        .unwrap()
        .with_config("[project]\nname = \"demo\"\n")
        .with_file(".rulesmith/personas/odd.md", "---\nname: odd\ntools: [frobnicate]\n---\nOdd one.\n")
        .build()
        .unwrap();

    rulesmith(project.path())
        .args(["build", "--target", "claude"])
        .assert()
        .success()
        .stderr(predicate::str::contains("warning["))
        .stdout(predicate::str::contains("1 warning(s)"));

    let strict = TestProjectBuilder::new()
        .unwrap()
        .with_config("[project]\nname = \"demo\"\n")
        .with_file(".rulesmith/personas/odd.md", "---\nname: odd\ntools: [frobnicate]\n---\nOdd one.\n")
        .build()
        .unwrap();

    rulesmith(strict.path())
        .args(["build", "--target", "claude", "--strict"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Resolution failed with 0 error(s) and 1 warning(s)"));
    assert!(!strict.file_exists(".claude/agents/odd.md"));
}

#[test]
fn test_errors_block_every_write() {
    let project = TestProjectBuilder::new()
        .unwrap()
        .with_config("[project]\nname = \"demo\"\n")
        .with_document(DocumentFixture::rule_always())
        .with_file(".rulesmith/rules/broken.md", "---\nname: [unclosed\n---\nBody\n")
        .build()
        .unwrap();

    rulesmith(project.path())
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[parse] local:rules/broken.md"))
        .stderr(predicate::str::contains("Resolution failed with 1 error(s)"));

    assert!(!project.file_exists(".claude/rules/style.md"));
    assert!(!project.file_exists("CLAUDE.md"));
}

#[test]
fn test_source_directory_alone_is_enough() {
    let project = TestProjectBuilder::new()
        .unwrap()
        .with_document(DocumentFixture::rule_always())
        .build()
        .unwrap();

    rulesmith(project.path()).args(["build", "--target", "claude"]).assert().success();
    assert!(project.file_exists(".claude/rules/style.md"));
}

#[test]
fn test_missing_config_is_reported() {
    let project = TestProjectBuilder::new().unwrap().build().unwrap();

    rulesmith(project.path())
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No rulesmith.toml found"))
        .stderr(predicate::str::contains("suggestion:"));
}

#[test]
fn test_output_directory_from_config() {
    let project = TestProjectBuilder::new()
        .unwrap()
        .with_config("[project]\nname = \"demo\"\ntargets = [\"claude\"]\noutput = \"out\"\n")
        .with_document(DocumentFixture::rule_always())
        .build()
        .unwrap();

    rulesmith(project.path()).arg("build").assert().success();
    assert!(project.file_exists("out/.claude/rules/style.md"));
    assert!(!project.file_exists(".claude/rules/style.md"));
}
