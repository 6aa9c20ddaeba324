//! Mod keys, results and the registry of known mods.

use crate::errors::ModError;
use crate::expo_config::ExpoConfig;
use crate::mods;
use crate::resources::ResourceXml;
use autolink_config::Diagnostics;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Native project file a mod operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ModKey {
    AndroidStyles,
    AppConfigJson,
}

/// Shape of the result held under a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Resources,
    Json,
}

impl ModKey {
    pub const ALL: [ModKey; 2] = [ModKey::AndroidStyles, ModKey::AppConfigJson];

    pub fn as_str(self) -> &'static str {
        match self {
            ModKey::AndroidStyles => "androidStyles",
            ModKey::AppConfigJson => "appConfigJson",
        }
    }

    pub fn kind(self) -> ResultKind {
        match self {
            ModKey::AndroidStyles => ResultKind::Resources,
            ModKey::AppConfigJson => ResultKind::Json,
        }
    }

    pub fn relative_path(self) -> &'static str {
        match self {
            ModKey::AndroidStyles => "android/app/src/main/res/values/styles.xml",
            ModKey::AppConfigJson => "android/app/src/main/assets/app.config",
        }
    }

    pub fn path(self, project_root: &Path) -> PathBuf {
        project_root.join(self.relative_path())
    }
}

impl fmt::Display for ModKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loaded content of one key
#[derive(Debug, Clone, PartialEq)]
pub enum ModResult {
    Resources(ResourceXml),
    Json(Value),
}

impl ModResult {
    pub fn kind(&self) -> ResultKind {
        match self {
            ModResult::Resources(_) => ResultKind::Resources,
            ModResult::Json(_) => ResultKind::Json,
        }
    }

    /// Empty document of the shape `key` declares
    pub fn empty(key: ModKey) -> Self {
        match key.kind() {
            ResultKind::Resources => ModResult::Resources(ResourceXml::default()),
            ResultKind::Json => ModResult::Json(Value::Object(serde_json::Map::new())),
        }
    }

    pub fn as_resources_mut(&mut self) -> Result<&mut ResourceXml, ModError> {
        match self {
            ModResult::Resources(doc) => Ok(doc),
            ModResult::Json(_) => Err(ModError::Invalid(
                "expected a resource XML document".to_string(),
            )),
        }
    }

    pub fn as_json_mut(&mut self) -> Result<&mut Value, ModError> {
        match self {
            ModResult::Json(value) => Ok(value),
            ModResult::Resources(_) => Err(ModError::Invalid("expected a JSON document".to_string())),
        }
    }
}

pub type ModFn = fn(&ExpoConfig, &mut ModResult, &mut Diagnostics) -> Result<(), ModError>;

/// A statically registered mod
#[derive(Clone, Copy)]
pub struct ModDefinition {
    pub name: &'static str,
    pub key: ModKey,
    pub apply: ModFn,
}

impl fmt::Debug for ModDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModDefinition")
            .field("name", &self.name)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

/// Mods available to pipelines, by name
#[derive(Debug, Default, Clone)]
pub struct ModRegistry {
    mods: BTreeMap<&'static str, ModDefinition>,
}

impl ModRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in mod
    pub fn builtin() -> Result<Self, ModError> {
        let mut registry = Self::new();
        for definition in mods::builtin() {
            registry.register(definition)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, definition: ModDefinition) -> Result<(), ModError> {
        if self.mods.contains_key(definition.name) {
            return Err(ModError::DuplicateMod(definition.name.to_string()));
        }
        self.mods.insert(definition.name, definition);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ModDefinition> {
        self.mods.get(name)
    }

    /// Definitions for `names` in order; the first unknown name is an error
    pub fn validate<'n>(
        &self,
        names: impl IntoIterator<Item = &'n str>,
    ) -> Result<Vec<ModDefinition>, ModError> {
        names
            .into_iter()
            .map(|name| {
                self.get(name)
                    .copied()
                    .ok_or_else(|| ModError::UnknownMod(name.to_string()))
            })
            .collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.mods.keys().copied()
    }
}
