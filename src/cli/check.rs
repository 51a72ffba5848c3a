//! `rulesmith check`: compare what `build` would write against the disk.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::Path;

use super::common::{CommandContext, TargetArgs, destination, ensure_success, print_diagnostics};
use crate::core::RulesmithError;
use crate::targets::ArtifactSet;
use crate::utils::{file_checksum, to_slash};

#[derive(Args, Debug)]
pub struct CheckCommand {
    #[command(flatten)]
    pub targets: TargetArgs,

    /// Also list files that are up to date
    #[arg(long)]
    pub all: bool,
}

/// State of one generated file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    New,
    Modified,
    Identical,
}

impl FileStatus {
    fn label(self) -> String {
        match self {
            FileStatus::New => "new".green().to_string(),
            FileStatus::Modified => "modified".yellow().to_string(),
            FileStatus::Identical => "identical".dimmed().to_string(),
        }
    }
}

/// Status of every artifact against `output_dir`, in path order.
pub fn compare(artifacts: &ArtifactSet, output_dir: &Path) -> Result<Vec<(String, FileStatus)>> {
    let mut statuses = Vec::with_capacity(artifacts.len());
    for (path, expected) in artifacts.checksums() {
        let status = match file_checksum(&destination(output_dir, &path)?)? {
            None => FileStatus::New,
            Some(actual) if actual == expected => FileStatus::Identical,
            Some(_) => FileStatus::Modified,
        };
        statuses.push((to_slash(&path), status));
    }
    Ok(statuses)
}

impl CheckCommand {
    pub async fn execute(self, config_path: Option<&Path>) -> Result<()> {
        let context = CommandContext::load(config_path).await?;
        let targets = context.targets(&self.targets)?;
        let run = context.build(&targets);

        let (artifacts, conflicts) = run.artifacts();
        let mut diagnostics = run.diagnostics();
        diagnostics.append(conflicts);
        print_diagnostics(&diagnostics);
        ensure_success(&diagnostics, context.strict())?;

        let statuses = compare(&artifacts, &context.config.output_dir()?)?;
        let stale = statuses.iter().filter(|(_, s)| *s != FileStatus::Identical).count();
        for (path, status) in &statuses {
            if self.all || *status != FileStatus::Identical {
                println!("  {:<10} {path}", status.label());
            }
        }

        if stale > 0 {
            return Err(RulesmithError::OutOfDate {
                count: stale,
            }
            .into());
        }
        println!("{} {} file(s) up to date", "✓".green(), statuses.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targets::Artifact;
    use tempfile::tempdir;

    #[test]
    fn test_compare_statuses() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("same.md"), "same\n").unwrap();
        std::fs::write(temp.path().join("changed.md"), "old\n").unwrap();

        let mut artifacts = ArtifactSet::new();
        artifacts.insert(Artifact::text("same.md", "same\n")).unwrap();
        artifacts.insert(Artifact::text("changed.md", "new\n")).unwrap();
        artifacts.insert(Artifact::text("nested/fresh.md", "fresh\n")).unwrap();

        let statuses = compare(&artifacts, temp.path()).unwrap();
        assert_eq!(
            statuses,
            vec![
                ("changed.md".to_string(), FileStatus::Modified),
                ("nested/fresh.md".to_string(), FileStatus::New),
                ("same.md".to_string(), FileStatus::Identical),
            ]
        );
    }
}
