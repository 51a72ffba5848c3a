//! Test project builder for simplified test setup
//!
//! Lays out a temporary project directory: an optional `rulesmith.toml`,
//! documents under the default `.rulesmith` source, and arbitrary extra files
//! such as package manifests.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use super::fixtures::DocumentFixture;
use crate::constants::{CONFIG_FILE_NAME, DEFAULT_SOURCE_DIR};

pub struct TestProjectBuilder {
    temp_dir: TempDir,
    project_dir: PathBuf,
    config: Option<String>,
    files: Vec<(String, String)>,
}

impl TestProjectBuilder {
    pub fn new() -> Result<Self> {
        super::init_test_logging(None);
        let temp_dir = TempDir::new()?;
        let project_dir = temp_dir.path().join("project");

        Ok(Self {
            temp_dir,
            project_dir,
            config: None,
            files: Vec::new(),
        })
    }

    /// Contents of `rulesmith.toml`.
    pub fn with_config(mut self, config: impl Into<String>) -> Self {
        self.config = Some(config.into());
        self
    }

    /// A document under the default source directory.
    pub fn with_document(self, fixture: DocumentFixture) -> Self {
        let path = format!("{DEFAULT_SOURCE_DIR}/{}", fixture.path);
        self.with_file(path, fixture.content)
    }

    /// Any file, relative to the project directory.
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.push((path.into(), content.into()));
        self
    }

    pub fn with_files(mut self, files: Vec<(&str, &str)>) -> Self {
        for (path, content) in files {
            self.files.push((path.to_string(), content.to_string()));
        }
        self
    }

    pub fn build(self) -> Result<TestProject> {
        std::fs::create_dir_all(&self.project_dir)?;

        if let Some(config) = &self.config {
            std::fs::write(self.project_dir.join(CONFIG_FILE_NAME), config)?;
        }

        for (path, content) in &self.files {
            let full_path = self.project_dir.join(path);
            if let Some(parent) = full_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(full_path, content)?;
        }

        Ok(TestProject {
            _temp_dir: self.temp_dir,
            project_dir: self.project_dir,
        })
    }
}

pub struct TestProject {
    _temp_dir: TempDir, // Keep temp dir alive
    pub project_dir: PathBuf,
}

impl TestProject {
    pub fn path(&self) -> &Path {
        &self.project_dir
    }

    pub fn file_exists(&self, relative: &str) -> bool {
        self.project_dir.join(relative).is_file()
    }

    pub fn read(&self, relative: &str) -> Result<String> {
        Ok(std::fs::read_to_string(self.project_dir.join(relative))?)
    }

    pub fn write(&self, relative: &str, content: &str) -> Result<()> {
        let path = self.project_dir.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_lays_out_project() {
        let project = TestProjectBuilder::new()
            .unwrap()
            .with_config("[project]\nname = \"demo\"\n")
            .with_document(DocumentFixture::persona_base())
            .with_file("package.json", "{}")
            .build()
            .unwrap();

        assert!(project.file_exists(CONFIG_FILE_NAME));
        assert!(project.file_exists(".rulesmith/personas/base.md"));
        assert_eq!(project.read("package.json").unwrap(), "{}");
    }
}
