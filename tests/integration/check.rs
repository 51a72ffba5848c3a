use predicates::prelude::*;
use rulesmith::test_utils::{DocumentFixture, TestProject, TestProjectBuilder};

use crate::common::rulesmith;

fn project() -> TestProject {
    TestProjectBuilder::new()
        .unwrap()
        .with_config("[project]\nname = \"demo\"\ntargets = [\"claude\", \"cursor\"]\n")
        .with_document(DocumentFixture::rule_always())
        .with_document(DocumentFixture::command_test())
        .build()
        .unwrap()
}

#[test]
fn test_check_before_build_reports_new_files() {
    let project = project();

    rulesmith(project.path())
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("new        CLAUDE.md"))
        .stderr(predicate::str::contains("out of date"))
        .stderr(predicate::str::contains("rulesmith build"));
}

#[test]
fn test_check_after_build_is_clean() {
    let project = project();
    rulesmith(project.path()).arg("build").assert().success();

    rulesmith(project.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("file(s) up to date"))
        .stdout(predicate::str::contains("identical").not());

    rulesmith(project.path())
        .args(["check", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("identical  .cursor/rules/style.mdc"));
}

#[test]
fn test_hand_edited_file_is_modified() {
    let project = project();
    rulesmith(project.path()).arg("build").assert().success();
    project.write(".claude/commands/test.md", "edited by hand\n").unwrap();

    rulesmith(project.path())
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("modified   .claude/commands/test.md"))
        .stderr(predicate::str::contains("1 generated file(s) are missing or out of date"));
}

#[test]
fn test_source_change_makes_output_stale() {
    let project = project();
    rulesmith(project.path()).arg("build").assert().success();
    project
        .write(".rulesmith/rules/style.md", "---\nname: style\nalwaysApply: true\n---\nKeep modules small.\n")
        .unwrap();

    rulesmith(project.path())
        .args(["check", "--target", "cursor"])
        .assert()
        .failure()
        .stdout(predicate::str::contains(".cursor/rules/style.mdc"));
}
