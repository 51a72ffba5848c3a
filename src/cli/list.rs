//! `rulesmith list`: show the resolved documents for each target.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::common::{CommandContext, TargetArgs, print_diagnostics};
use crate::core::{Document, DocumentKind};
use crate::resolver::ResolvedContent;
use crate::utils::to_slash;

#[derive(Args, Debug)]
pub struct ListCommand {
    #[command(flatten)]
    pub targets: TargetArgs,

    /// Only list documents of this kind (rule, persona, command, hook)
    #[arg(short, long)]
    pub kind: Option<String>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// One row of `list` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListEntry {
    pub kind: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub source: String,
    pub path: String,
}

impl From<&Document> for ListEntry {
    fn from(document: &Document) -> Self {
        Self {
            kind: document.kind().to_string(),
            name: document.name.clone(),
            description: document.description.clone(),
            source: document.provenance.source.clone(),
            path: to_slash(&document.provenance.path),
        }
    }
}

/// Entries for `content`, optionally restricted to one kind.
pub fn entries(content: &ResolvedContent, kind: Option<DocumentKind>) -> Vec<ListEntry> {
    content.iter().filter(|d| kind.is_none_or(|k| d.kind() == k)).map(ListEntry::from).collect()
}

impl ListCommand {
    pub async fn execute(self, config_path: Option<&Path>) -> Result<()> {
        let kind = self.kind.as_deref().map(str::parse::<DocumentKind>).transpose().map_err(anyhow::Error::msg)?;
        let context = CommandContext::load(config_path).await?;
        let targets = context.targets(&self.targets)?;
        let run = context.resolve(&targets);

        let listing: BTreeMap<String, Vec<ListEntry>> = run
            .resolutions
            .iter()
            .map(|r| (r.content.target.to_string(), entries(&r.content, kind)))
            .collect();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&listing)?);
            return Ok(());
        }

        print_diagnostics(&run.diagnostics());
        for target in &targets {
            let rows = listing.get(target.id()).map(Vec::as_slice).unwrap_or_default();
            println!("{} ({} document(s))", target.id().bold(), rows.len());
            for row in rows {
                println!(
                    "  {:<8} {:<28} {}",
                    row.kind,
                    row.name,
                    format!("{}:{}", row.source, row.path).dimmed()
                );
            }
        }
        Ok(())
    }
}
