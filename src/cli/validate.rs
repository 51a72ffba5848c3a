//! `rulesmith validate`: run resolution and generation, report diagnostics,
//! write nothing.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::Path;

use super::common::{CommandContext, TargetArgs, ensure_success, print_diagnostics, summary_line};

#[derive(Args, Debug)]
pub struct ValidateCommand {
    #[command(flatten)]
    pub targets: TargetArgs,

    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,

    /// Print diagnostics as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

impl ValidateCommand {
    pub async fn execute(self, config_path: Option<&Path>) -> Result<()> {
        let context = CommandContext::load(config_path).await?;
        let targets = context.targets(&self.targets)?;
        let run = context.build(&targets);

        let (_, conflicts) = run.artifacts();
        let mut diagnostics = run.diagnostics();
        diagnostics.append(conflicts);
        let strict = self.strict || context.strict();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&diagnostics)?);
        } else {
            print_diagnostics(&diagnostics);
            for (resolution, output) in run.resolved.resolutions.iter().zip(&run.outputs) {
                println!(
                    "  {:<9} {} document(s), {} artifact(s)",
                    resolution.content.target.to_string().bold(),
                    resolution.content.len(),
                    output.artifacts.len()
                );
            }
        }
        ensure_success(&diagnostics, strict)?;

        if !self.json {
            println!("{} Sources are valid ({})", "✓".green(), summary_line(&diagnostics));
        }
        Ok(())
    }
}
