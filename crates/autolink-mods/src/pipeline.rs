//! Ordered execution of mods over a [`ModConfig`].

use crate::errors::{ModApplicationError, ModError};
use crate::expo_config::ExpoConfig;
use crate::mod_config::ModConfig;
use crate::mods::DEFAULT_MODS;
use crate::registry::{ModDefinition, ModKey, ModRegistry};
use autolink_config::Diagnostics;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// What happens when a mod fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failure and discard the document
    #[default]
    Abort,
    /// Keep the key's pre-mod value, record the error and go on
    SkipAndContinue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModState {
    Pending,
    Running,
    Applied,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModRun {
    pub name: &'static str,
    pub key: ModKey,
    pub state: ModState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Default)]
pub struct PipelineReport {
    pub runs: Vec<ModRun>,
    /// Failures skipped under [`FailurePolicy::SkipAndContinue`]
    pub errors: Vec<ModApplicationError>,
}

impl PipelineReport {
    pub fn applied(&self) -> impl Iterator<Item = &ModRun> {
        self.runs.iter().filter(|run| run.state == ModState::Applied)
    }

    pub fn failed(&self) -> impl Iterator<Item = &ModRun> {
        self.runs.iter().filter(|run| run.state == ModState::Failed)
    }
}

#[derive(Debug, Clone)]
pub struct ModPipeline {
    mods: Vec<ModDefinition>,
    policy: FailurePolicy,
}

impl ModPipeline {
    /// Build a pipeline from mod names; unknown names fail before anything runs
    pub fn new<'n>(
        registry: &ModRegistry,
        names: impl IntoIterator<Item = &'n str>,
        policy: FailurePolicy,
    ) -> Result<Self, ModError> {
        Ok(ModPipeline {
            mods: registry.validate(names)?,
            policy,
        })
    }

    /// Pipeline for the app config's `plugins`, or the default mods when unset
    pub fn for_config(
        registry: &ModRegistry,
        config: &ExpoConfig,
        policy: FailurePolicy,
    ) -> Result<Self, ModError> {
        match &config.plugins {
            Some(plugins) => Self::new(registry, plugins.iter().map(|p| p.name()), policy),
            None => Self::new(registry, DEFAULT_MODS, policy),
        }
    }

    /// Keys the pipeline needs loaded
    pub fn keys(&self) -> BTreeSet<ModKey> {
        self.mods.iter().map(|definition| definition.key).collect()
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.mods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }

    /// Run every mod in order.
    ///
    /// Each mod works on a copy of its key's result, which replaces the
    /// document's value only when the mod succeeded and the shape still
    /// matches the key.
    pub fn run(
        &self,
        mut config: ModConfig,
        diagnostics: &mut Diagnostics,
    ) -> Result<(ModConfig, PipelineReport), ModApplicationError> {
        let mut report = PipelineReport {
            runs: self
                .mods
                .iter()
                .map(|definition| ModRun {
                    name: definition.name,
                    key: definition.key,
                    state: ModState::Pending,
                    error: None,
                })
                .collect(),
            errors: Vec::new(),
        };

        for (index, definition) in self.mods.iter().enumerate() {
            report.runs[index].state = ModState::Running;
            debug!("Running mod '{}' on {}", definition.name, definition.key);

            match apply_one(definition, &config, diagnostics) {
                Ok(result) => {
                    config.replace_result(definition.key, result);
                    report.runs[index].state = ModState::Applied;
                }
                Err(source) => {
                    let error = ModApplicationError {
                        mod_name: definition.name.to_string(),
                        key: definition.key,
                        source: Box::new(source),
                    };
                    if self.policy == FailurePolicy::Abort {
                        return Err(error);
                    }
                    warn!("{}", error);
                    diagnostics.error(definition.name, error.to_string());
                    report.runs[index].state = ModState::Failed;
                    report.runs[index].error = Some(error.source.to_string());
                    report.errors.push(error);
                }
            }
        }
        Ok((config, report))
    }
}

fn apply_one(
    definition: &ModDefinition,
    config: &ModConfig,
    diagnostics: &mut Diagnostics,
) -> Result<crate::registry::ModResult, ModError> {
    let Some(current) = config.result(definition.key) else {
        return Err(ModError::MissingResults(definition.key));
    };
    let mut working = current.clone();
    (definition.apply)(&config.expo, &mut working, diagnostics)?;
    if working.kind() != definition.key.kind() {
        return Err(ModError::ShapeMismatch(definition.key));
    }
    Ok(working)
}
