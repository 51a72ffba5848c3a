//! Dependency name extraction from package manifests.
//!
//! Each function takes manifest text and returns the dependency names it
//! declares. Parsers are lenient: a malformed manifest is an `Err` for
//! structured formats and simply yields fewer names for line-based ones.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static REQUIREMENT_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\s*([A-Za-z0-9][A-Za-z0-9._-]*)").ok());
static GO_REQUIRE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\s*(?:require\s+)?([^\s()]+)\s+v[0-9]").ok());
static GEM: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"^\s*gem\s+['"]([^'"]+)['"]"#).ok());
static MAVEN_DEPENDENCY: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?s)<dependency>.*?<groupId>\s*([^<\s]+)\s*</groupId>.*?<artifactId>\s*([^<\s]+)\s*</artifactId>.*?</dependency>")
        .ok()
});
static GRADLE_DEPENDENCY: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^\s*(?:implementation|api|compileOnly|runtimeOnly|testImplementation|testRuntimeOnly|kapt|ksp|annotationProcessor)\s*\(?\s*['"]([^:'"\s]+):([^:'"\s]+)"#,
    )
    .ok()
});
static PACKAGE_REFERENCE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?i)<PackageReference\s+Include\s*=\s*"([^"]+)""#).ok()
});

/// PEP 503 normalization: lowercase, runs of `-_.` become `-`.
pub fn normalize_python_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut last_dash = false;
    for c in name.trim().chars() {
        if matches!(c, '-' | '_' | '.') {
            if !last_dash {
                normalized.push('-');
            }
            last_dash = true;
        } else {
            normalized.push(c.to_ascii_lowercase());
            last_dash = false;
        }
    }
    normalized
}

fn json_keys(value: &serde_json::Value, sections: &[&str]) -> BTreeSet<String> {
    sections
        .iter()
        .filter_map(|section| value.get(section).and_then(|s| s.as_object()))
        .flat_map(|deps| deps.keys().cloned())
        .collect()
}

/// `package.json`: every dependency section.
pub fn npm(manifest: &serde_json::Value) -> BTreeSet<String> {
    json_keys(
        manifest,
        &["dependencies", "devDependencies", "peerDependencies", "optionalDependencies"],
    )
}

/// `composer.json`: `require` and `require-dev`.
pub fn composer(manifest: &serde_json::Value) -> BTreeSet<String> {
    json_keys(manifest, &["require", "require-dev"])
}

/// `Cargo.toml`: regular, dev, build, workspace and target-specific dependencies.
pub fn cargo(manifest: &toml::Table) -> BTreeSet<String> {
    const SECTIONS: [&str; 3] = ["dependencies", "dev-dependencies", "build-dependencies"];

    fn collect(table: &toml::Table, names: &mut BTreeSet<String>) {
        for section in SECTIONS {
            if let Some(deps) = table.get(section).and_then(|d| d.as_table()) {
                for (name, spec) in deps {
                    // A renamed dependency is also known by its package name.
                    if let Some(package) = spec.get("package").and_then(|p| p.as_str()) {
                        names.insert(package.to_string());
                    }
                    names.insert(name.clone());
                }
            }
        }
    }

    let mut names = BTreeSet::new();
    collect(manifest, &mut names);
    if let Some(workspace) = manifest.get("workspace").and_then(|w| w.as_table()) {
        collect(workspace, &mut names);
    }
    if let Some(targets) = manifest.get("target").and_then(|t| t.as_table()) {
        for target in targets.values().filter_map(|t| t.as_table()) {
            collect(target, &mut names);
        }
    }
    names
}

/// `requirements.txt`: one requirement per line; options and comments skipped.
pub fn requirements(text: &str) -> BTreeSet<String> {
    let Some(pattern) = REQUIREMENT_NAME.as_ref() else {
        return BTreeSet::new();
    };
    text.lines()
        .map(|line| line.split('#').next().unwrap_or_default())
        .filter(|line| !line.trim_start().starts_with('-'))
        .filter_map(|line| pattern.captures(line))
        .map(|caps| normalize_python_name(&caps[1]))
        .collect()
}

/// `pyproject.toml`: PEP 621 dependencies, optional groups and Poetry tables.
pub fn pyproject(manifest: &toml::Table) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    let requirement = |spec: &str| {
        REQUIREMENT_NAME.as_ref()?.captures(spec).map(|caps| normalize_python_name(&caps[1]))
    };

    if let Some(project) = manifest.get("project").and_then(|p| p.as_table()) {
        let lists = project
            .get("dependencies")
            .and_then(|d| d.as_array())
            .into_iter()
            .chain(
                project
                    .get("optional-dependencies")
                    .and_then(|o| o.as_table())
                    .into_iter()
                    .flat_map(|groups| groups.values().filter_map(|g| g.as_array())),
            );
        for list in lists {
            names.extend(list.iter().filter_map(|v| v.as_str()).filter_map(requirement));
        }
    }

    let poetry = manifest.get("tool").and_then(|t| t.get("poetry")).and_then(|p| p.as_table());
    if let Some(poetry) = poetry {
        for section in ["dependencies", "dev-dependencies"] {
            if let Some(deps) = poetry.get(section).and_then(|d| d.as_table()) {
                names.extend(deps.keys().filter(|k| *k != "python").map(|k| normalize_python_name(k)));
            }
        }
    }
    names
}

/// `go.mod`: single-line and block `require` directives.
pub fn go_mod(text: &str) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    let Some(pattern) = GO_REQUIRE.as_ref() else {
        return names;
    };
    let mut in_block = false;
    for line in text.lines() {
        let line = line.split("//").next().unwrap_or_default().trim();
        if in_block {
            if line.starts_with(')') {
                in_block = false;
                continue;
            }
        } else if line.starts_with("require") && line.ends_with('(') {
            in_block = true;
            continue;
        } else if !line.starts_with("require") {
            continue;
        }
        if let Some(caps) = pattern.captures(line) {
            names.insert(caps[1].to_string());
        }
    }
    names
}

/// `Gemfile`: `gem "name"` lines.
pub fn gemfile(text: &str) -> BTreeSet<String> {
    let Some(pattern) = GEM.as_ref() else {
        return BTreeSet::new();
    };
    text.lines().filter_map(|line| pattern.captures(line)).map(|caps| caps[1].to_string()).collect()
}

/// `pubspec.yaml`: `dependencies` and `dev_dependencies`.
pub fn pubspec(manifest: &serde_yaml::Value) -> BTreeSet<String> {
    ["dependencies", "dev_dependencies"]
        .iter()
        .filter_map(|section| manifest.get(section).and_then(|s| s.as_mapping()))
        .flat_map(|deps| deps.keys().filter_map(|k| k.as_str().map(str::to_string)))
        .collect()
}

/// `pom.xml`: each dependency as `artifactId` and `groupId:artifactId`.
pub fn maven(text: &str) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    let Some(pattern) = MAVEN_DEPENDENCY.as_ref() else {
        return names;
    };
    for caps in pattern.captures_iter(text) {
        names.insert(caps[2].to_string());
        names.insert(format!("{}:{}", &caps[1], &caps[2]));
    }
    names
}

/// `build.gradle(.kts)`: each dependency as `artifact` and `group:artifact`.
pub fn gradle(text: &str) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    let Some(pattern) = GRADLE_DEPENDENCY.as_ref() else {
        return names;
    };
    for caps in pattern.captures_iter(text) {
        names.insert(caps[2].to_string());
        names.insert(format!("{}:{}", &caps[1], &caps[2]));
    }
    names
}

/// `*.csproj`: `PackageReference` ids, lowercased.
pub fn csproj(text: &str) -> BTreeSet<String> {
    let Some(pattern) = PACKAGE_REFERENCE.as_ref() else {
        return BTreeSet::new();
    };
    pattern.captures_iter(text).map(|caps| caps[1].to_ascii_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_npm_sections() {
        let manifest = serde_json::json!({
            "dependencies": {"react": "^18"},
            "devDependencies": {"@types/react": "^18"},
            "scripts": {"build": "vite"}
        });
        assert_eq!(npm(&manifest), set(&["@types/react", "react"]));
    }

    #[test]
    fn test_cargo_sections() {
        let manifest: toml::Table = toml::from_str(
            r#"
[package]
name = "demo"

[dependencies]
serde = "1"
yaml = { package = "serde_yaml", version = "0.9" }

[dev-dependencies]
tempfile = "3"

[target.'cfg(unix)'.dependencies]
nix = "0.29"
"#,
        )
        .unwrap();
        assert_eq!(cargo(&manifest), set(&["nix", "serde", "serde_yaml", "tempfile", "yaml"]));
    }

    #[test]
    fn test_requirements_and_pyproject() {
        let text = "# web\nDjango>=4.2\nrequests[socks]==2.31  # http\n-r base.txt\n\nzope.interface\n";
        assert_eq!(requirements(text), set(&["django", "requests", "zope-interface"]));

        let manifest: toml::Table = toml::from_str(
            r#"
[project]
dependencies = ["FastAPI>=0.110", "pydantic"]

[project.optional-dependencies]
test = ["pytest"]

[tool.poetry.dependencies]
python = "^3.11"
Black = "*"
"#,
        )
        .unwrap();
        assert_eq!(pyproject(&manifest), set(&["black", "fastapi", "pydantic", "pytest"]));
    }

    #[test]
    fn test_go_mod() {
        let text = "module example.com/app\n\ngo 1.22\n\nrequire github.com/spf13/cobra v1.8.0\n\nrequire (\n\tgithub.com/stretchr/testify v1.9.0 // indirect\n\tgolang.org/x/sync v0.7.0\n)\n";
        assert_eq!(
            go_mod(text),
            set(&["github.com/spf13/cobra", "github.com/stretchr/testify", "golang.org/x/sync"])
        );
    }

    #[test]
    fn test_line_based_manifests() {
        assert_eq!(gemfile("source 'https://rubygems.org'\ngem 'rails', '~> 7.1'\n  gem \"pg\"\n"), set(&["pg", "rails"]));

        let pom = "<dependencies><dependency>\n<groupId>org.junit</groupId>\n<artifactId>junit</artifactId>\n</dependency></dependencies>";
        assert_eq!(maven(pom), set(&["junit", "org.junit:junit"]));

        let gradle_text = "dependencies {\n    implementation(\"com.squareup.okhttp3:okhttp:4.12.0\")\n    testImplementation 'junit:junit:4.13.2'\n}\n";
        assert_eq!(gradle(gradle_text), set(&["com.squareup.okhttp3:okhttp", "junit", "junit:junit", "okhttp"]));

        let project = r#"<ItemGroup><PackageReference Include="Newtonsoft.Json" Version="13.0.3" /></ItemGroup>"#;
        assert_eq!(csproj(project), set(&["newtonsoft.json"]));
    }

    #[test]
    fn test_pubspec() {
        let manifest: serde_yaml::Value =
            serde_yaml::from_str("name: app\ndependencies:\n  flutter:\n    sdk: flutter\n  http: ^1.2.0\n").unwrap();
        assert_eq!(pubspec(&manifest), set(&["flutter", "http"]));
    }
}
