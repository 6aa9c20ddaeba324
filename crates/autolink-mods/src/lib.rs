//! Config-plugin engine.
//!
//! Mods are registered statically in a [`ModRegistry`] and run in order by a
//! [`ModPipeline`]. Each mod edits one native project file (a [`ModKey`])
//! based on the app config; changed files are written back together at the
//! end.

pub mod errors;
pub mod expo_config;
pub mod mod_config;
pub mod mods;
pub mod pipeline;
pub mod registry;
pub mod resources;
pub mod styles;

pub use errors::{ModApplicationError, ModError};
pub use expo_config::ExpoConfig;
pub use mod_config::ModConfig;
pub use pipeline::{FailurePolicy, ModPipeline, ModRun, ModState, PipelineReport};
pub use registry::{ModDefinition, ModKey, ModRegistry, ModResult};
pub use resources::ResourceXml;

use autolink_config::{Diagnostics, MemoScope};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug)]
pub struct ApplyOutcome {
    pub report: PipelineReport,
    pub written: Vec<PathBuf>,
}

/// Load the project's app config, run its mods and write what changed.
///
/// Under [`FailurePolicy::Abort`] a failing mod leaves every file untouched.
pub fn apply_mods(
    project_root: &Path,
    policy: FailurePolicy,
    scope: &MemoScope<'_>,
    diagnostics: &mut Diagnostics,
) -> Result<ApplyOutcome, ModError> {
    let registry = ModRegistry::builtin()?;
    let mut config = ModConfig::load(project_root, scope)?;
    let pipeline = ModPipeline::for_config(&registry, &config.expo, policy)?;
    config.load_results(pipeline.keys(), scope)?;

    info!("Applying {} mods", pipeline.len());
    let (config, report) = pipeline.run(config, diagnostics)?;
    let written = config.write_changed()?;
    Ok(ApplyOutcome { report, written })
}
