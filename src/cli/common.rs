//! Shared plumbing for CLI commands: locating the project, loading sources,
//! running the pipeline and reporting diagnostics.

use anyhow::Result;
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::Config;
use crate::constants::{CONFIG_FILE_NAME, DEFAULT_SOURCE_DIR};
use crate::core::{Diagnostic, Diagnostics, ErrorCategory, Platform, RulesmithError};
use crate::facts::ProjectFacts;
use crate::resolver::{Resolution, Resolver};
use crate::source::MultiSourceLoadResult;
use crate::source::local::load_local_sources;
use crate::targets::{ArtifactSet, GenerationOutput, generate};
use crate::utils::to_slash;

/// Target selection flags shared by every command.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Only process these targets (repeatable; default: the configured targets)
    #[arg(short, long = "target", value_name = "TARGET")]
    pub targets: Vec<String>,
}

/// Everything a command needs about the project.
#[derive(Debug)]
pub struct CommandContext {
    pub config: Config,
    pub facts: ProjectFacts,
    pub sources: MultiSourceLoadResult,
}

impl CommandContext {
    /// Load configuration, inspect the project and read every source.
    ///
    /// With no `--config` and no `rulesmith.toml` above the working directory,
    /// a `.rulesmith` directory in the working directory is enough to run
    /// with defaults.
    pub async fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => Config::load(path)?,
            None => discover_config(&std::env::current_dir()?)?,
        };

        let facts = ProjectFacts::collect(&config.root).with_vars(config.fact_vars());
        let sources = load_local_sources(config.source_descriptors()?).await?;
        debug!(
            "Loaded {} document(s) from {} source(s)",
            sources.document_count(),
            sources.iter().count()
        );

        Ok(Self {
            config,
            facts,
            sources,
        })
    }

    /// `--target` values, or the configured targets when none are given.
    pub fn targets(&self, args: &TargetArgs) -> Result<Vec<Platform>> {
        if args.targets.is_empty() {
            return Ok(self.config.targets()?.iter().collect());
        }
        let mut targets = Vec::new();
        for id in &args.targets {
            let platform: Platform = id.parse()?;
            if !targets.contains(&platform) {
                targets.push(platform);
            }
        }
        Ok(targets)
    }

    /// Resolve for every target, without generating.
    pub fn resolve(&self, targets: &[Platform]) -> ResolveRun {
        let resolver = Resolver::new(&self.sources, self.config.resolve_options());
        let prepared = resolver.prepare(&self.facts);
        let resolutions = targets.iter().map(|&target| resolver.resolve_for(&prepared, target)).collect();
        ResolveRun {
            shared: prepared.diagnostics,
            resolutions,
        }
    }

    /// Resolve and generate every target.
    pub fn build(&self, targets: &[Platform]) -> BuildRun {
        let resolved = self.resolve(targets);
        let outputs = resolved.resolutions.iter().map(|r| generate(&r.content)).collect();
        BuildRun {
            resolved,
            outputs,
        }
    }

    pub fn strict(&self) -> bool {
        self.config.strict()
    }
}

fn discover_config(cwd: &Path) -> Result<Config> {
    match Config::discover(cwd) {
        Ok(config) => Ok(config),
        Err(e) => {
            let not_found = matches!(e.downcast_ref::<RulesmithError>(), Some(RulesmithError::ConfigNotFound { .. }));
            if not_found && cwd.join(DEFAULT_SOURCE_DIR).is_dir() {
                debug!("No {CONFIG_FILE_NAME} found; using defaults for {}", cwd.display());
                Ok(Config::default_for(cwd))
            } else {
                Err(e)
            }
        }
    }
}

/// Resolutions for several targets sharing one preparation pass.
#[derive(Debug)]
pub struct ResolveRun {
    /// Diagnostics raised before the per-target stages. Every resolution
    /// repeats them; they are reported once.
    pub shared: Diagnostics,
    pub resolutions: Vec<Resolution>,
}

impl ResolveRun {
    /// Diagnostics raised only while resolving `resolution`'s target.
    pub fn target_diagnostics<'a>(&self, resolution: &'a Resolution) -> impl Iterator<Item = &'a Diagnostic> {
        resolution.diagnostics.iter().skip(self.shared.len())
    }

    /// Every diagnostic, each reported once.
    pub fn diagnostics(&self) -> Diagnostics {
        let mut all = self.shared.clone();
        for resolution in &self.resolutions {
            all.extend(self.target_diagnostics(resolution).cloned());
        }
        all
    }
}

/// A [`ResolveRun`] plus each target's generated output.
#[derive(Debug)]
pub struct BuildRun {
    pub resolved: ResolveRun,
    pub outputs: Vec<GenerationOutput>,
}

impl BuildRun {
    pub fn diagnostics(&self) -> Diagnostics {
        let mut all = self.resolved.diagnostics();
        for output in &self.outputs {
            all.extend(output.diagnostics.iter().cloned());
        }
        all
    }

    /// Artifacts of every target. Two targets claiming the same path is an
    /// error on the later one.
    pub fn artifacts(&self) -> (ArtifactSet, Diagnostics) {
        let mut merged = ArtifactSet::new();
        let mut diagnostics = Diagnostics::new();
        for (resolution, output) in self.resolved.resolutions.iter().zip(&self.outputs) {
            for artifact in output.artifacts.iter() {
                if let Err(rejected) = merged.insert(artifact.clone()) {
                    diagnostics.push(Diagnostic::error(
                        ErrorCategory::Generation,
                        format!(
                            "'{}' is generated by more than one target; {} output skipped",
                            to_slash(&rejected.path),
                            resolution.content.target
                        ),
                    ));
                }
            }
        }
        (merged, diagnostics)
    }
}

/// Print diagnostics to stderr, errors and warnings alike.
pub fn print_diagnostics(diagnostics: &Diagnostics) {
    for diagnostic in diagnostics.iter() {
        eprintln!("{}", diagnostic.colored());
    }
}

/// Apply the failure policy: errors always fail, warnings only when strict.
pub fn ensure_success(diagnostics: &Diagnostics, strict: bool) -> Result<()> {
    if diagnostics.is_failure(strict) {
        return Err(RulesmithError::ResolutionFailed {
            errors: diagnostics.error_count(),
            warnings: diagnostics.warning_count(),
            strict,
        }
        .into());
    }
    Ok(())
}

/// One-line summary of diagnostic counts.
pub fn summary_line(diagnostics: &Diagnostics) -> String {
    let errors = diagnostics.error_count();
    let warnings = diagnostics.warning_count();
    match (errors, warnings) {
        (0, 0) => "no problems".green().to_string(),
        (0, w) => format!("{w} warning(s)").yellow().to_string(),
        (e, w) => format!("{e} error(s), {w} warning(s)").red().to_string(),
    }
}

/// Destination of an artifact under `output_dir`.
pub fn destination(output_dir: &Path, relative: &Path) -> Result<PathBuf> {
    if !crate::utils::is_safe_path(output_dir, relative) || relative.is_absolute() {
        return Err(RulesmithError::UnsafeOutputPath {
            path: relative.display().to_string(),
        }
        .into());
    }
    Ok(output_dir.join(relative))
}
