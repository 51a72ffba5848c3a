use predicates::prelude::*;
use rulesmith::test_utils::{DocumentFixture, TestProjectBuilder};

use crate::common::rulesmith;

#[test]
fn test_valid_sources() {
    let project = TestProjectBuilder::new()
        .unwrap()
        .with_config("[project]\nname = \"demo\"\n")
        .with_document(DocumentFixture::rule_always())
        .with_document(DocumentFixture::persona_base())
        .build()
        .unwrap();

    rulesmith(project.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("claude    2 document(s)"))
        .stdout(predicate::str::contains("Sources are valid (no problems)"));

    // Nothing is written.
    assert!(!project.file_exists("CLAUDE.md"));
}

#[test]
fn test_invalid_document_fails() {
    let project = TestProjectBuilder::new()
        .unwrap()
        .with_config("[project]\nname = \"demo\"\n")
        .with_file(".rulesmith/hooks/bad.md", "---\nname: bad\nevent: OnSave\nexecute: echo\n---\n")
        .build()
        .unwrap();

    rulesmith(project.path())
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[validation] local:hooks/bad.md"))
        .stderr(predicate::str::contains("Fix the errors reported above"));
}

#[test]
fn test_condition_errors_name_the_document() {
    let project = TestProjectBuilder::new()
        .unwrap()
        .with_config("[project]\nname = \"demo\"\n")
        .with_file(".rulesmith/rules/odd.md", "---\nname: odd\nwhen: \"npm:react &&\"\n---\nBody\n")
        .build()
        .unwrap();

    rulesmith(project.path())
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[condition] local:rules/odd.md"));
}

#[test]
fn test_json_output_and_strict_env() {
    let project = TestProjectBuilder::new()
        .unwrap()
        .with_config("[project]\nname = \"demo\"\n")
        .with_file(".rulesmith/rules/unnamed.md", "Just a body.\n")
        .build()
        .unwrap();

    let output = rulesmith(project.path()).args(["validate", "--json"]).output().unwrap();
    assert!(output.status.success());
    let diagnostics: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let diagnostics = diagnostics.as_array().unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0]["severity"], "warning");
    assert_eq!(diagnostics[0]["category"], "validation");

    rulesmith(project.path())
        .arg("validate")
        .env("RULESMITH_STRICT", "1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("inferred 'unnamed'"))
        .stderr(predicate::str::contains("strict"));
}
