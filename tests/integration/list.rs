use predicates::prelude::*;
use rulesmith::test_utils::{DocumentFixture, TestProject, TestProjectBuilder};

use crate::common::rulesmith;

fn project() -> TestProject {
    DocumentFixture::full_set()
        .into_iter()
        .fold(
            TestProjectBuilder::new().unwrap().with_config("[project]\nname = \"demo\"\n"),
            TestProjectBuilder::with_document,
        )
        .build()
        .unwrap()
}

#[test]
fn test_list_table() {
    let project = project();

    rulesmith(project.path())
        .args(["list", "--target", "claude"])
        .assert()
        .success()
        .stdout(predicate::str::contains("claude (5 document(s))"))
        .stdout(predicate::str::contains("local:personas/child.md"))
        // No package.json, so the typescript rule's condition is false.
        .stdout(predicate::str::contains("typescript").not());
}

#[test]
fn test_list_json_by_kind() {
    let project = project();

    let output = rulesmith(project.path())
        .args(["list", "--json", "--kind", "personas"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let listing: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    for target in ["claude", "cursor", "opencode"] {
        let names: Vec<&str> = listing[target]
            .as_array()
            .unwrap()
            .iter()
            .map(|entry| entry["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["base", "child"], "{target}");
    }
    assert_eq!(listing["claude"][1]["kind"], "persona");
    assert_eq!(listing["claude"][0]["description"], "Base reviewer");
}

#[test]
fn test_list_rejects_unknown_kind() {
    let project = project();

    rulesmith(project.path())
        .args(["list", "--kind", "rulez"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("did you mean 'rule'?"));
}
