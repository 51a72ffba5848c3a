//! `rulesmith build`: resolve, generate and write artifacts.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::Path;
use tracing::{debug, info};

use super::common::{
    CommandContext, TargetArgs, destination, ensure_success, print_diagnostics, summary_line,
};
use crate::utils::{file_checksum, safe_write, to_slash};

#[derive(Args, Debug)]
pub struct BuildCommand {
    #[command(flatten)]
    pub targets: TargetArgs,

    /// Show what would be written without touching the file system
    #[arg(long)]
    pub dry_run: bool,

    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Default)]
struct WriteStats {
    written: usize,
    unchanged: usize,
}

impl BuildCommand {
    pub async fn execute(self, config_path: Option<&Path>) -> Result<()> {
        let context = CommandContext::load(config_path).await?;
        let targets = context.targets(&self.targets)?;
        let run = context.build(&targets);

        let (artifacts, conflicts) = run.artifacts();
        let mut diagnostics = run.diagnostics();
        diagnostics.append(conflicts);
        print_diagnostics(&diagnostics);
        ensure_success(&diagnostics, self.strict || context.strict())?;

        let output_dir = context.config.output_dir()?;
        let mut stats = WriteStats::default();
        for artifact in artifacts.iter() {
            let path = destination(&output_dir, &artifact.path)?;
            let shown = to_slash(&artifact.path);
            if file_checksum(&path)?.as_deref() == Some(artifact.checksum().as_str()) {
                debug!("Unchanged: {shown}");
                stats.unchanged += 1;
                continue;
            }
            if self.dry_run {
                println!("  {} {shown}", "would write".cyan());
            } else {
                safe_write(&path, &artifact.content)?;
                info!("Wrote {}", path.display());
                println!("  {} {shown}", "wrote".green());
            }
            stats.written += 1;
        }

        let names: Vec<&str> = targets.iter().map(|t| t.id()).collect();
        let verb = if self.dry_run { "would write" } else { "wrote" };
        println!(
            "{} {} ({verb} {}, {} unchanged; {})",
            "Built".green().bold(),
            names.join(", "),
            stats.written,
            stats.unchanged,
            summary_line(&diagnostics)
        );
        Ok(())
    }
}
