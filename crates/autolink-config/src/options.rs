//! Project-level autolinking options.
//!
//! Options are layered: defaults, then the `expo.autolinking` object of the
//! root `package.json`, then a dedicated `autolinking.toml`, then CLI flags.
//! Lists are unioned, maps are merged with later layers winning.

use crate::memo::MemoScope;
use crate::platform::Platform;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const PACKAGE_JSON: &str = "package.json";
pub const AUTOLINKING_TOML: &str = "autolinking.toml";
pub const DEFAULT_NATIVE_MODULES_DIR: &str = "modules";
pub const DEFAULT_CONCURRENCY: usize = 8;

#[derive(Error, Debug)]
pub enum OptionsError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid option: {0}")]
    Invalid(String),
}

/// Per-platform section of the options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformOptions {
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Per-module forced settings merged into the extracted descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleOverride {
    #[serde(default, alias = "debug_only")]
    pub debug_only: Option<bool>,
    #[serde(default, alias = "swift_module_name")]
    pub swift_module_name: Option<String>,
}

impl ModuleOverride {
    fn merge(&mut self, other: ModuleOverride) {
        if other.debug_only.is_some() {
            self.debug_only = other.debug_only;
        }
        if other.swift_module_name.is_some() {
            self.swift_module_name = other.swift_module_name;
        }
    }
}

/// One layer of options as written in a config source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsLayer {
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default, alias = "native_modules_dir")]
    pub native_modules_dir: Option<PathBuf>,
    /// Module name -> package directory (relative to the project root) that must win
    #[serde(default)]
    pub overrides: BTreeMap<String, PathBuf>,
    #[serde(default)]
    pub modules: BTreeMap<String, ModuleOverride>,
    #[serde(default)]
    pub concurrency: Option<usize>,
    #[serde(default)]
    pub ios: PlatformOptions,
    #[serde(default)]
    pub android: PlatformOptions,
    #[serde(default)]
    pub web: PlatformOptions,
}

#[derive(Debug, Deserialize)]
struct RootManifestOptions {
    #[serde(default)]
    expo: Option<ExpoSection>,
}

#[derive(Debug, Deserialize)]
struct ExpoSection {
    #[serde(default)]
    autolinking: Option<serde_json::Value>,
}

/// Effective options for one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutolinkingOptions {
    pub exclude: BTreeSet<String>,
    pub platform_exclude: BTreeMap<Platform, BTreeSet<String>>,
    pub native_modules_dir: PathBuf,
    pub overrides: BTreeMap<String, PathBuf>,
    pub modules: BTreeMap<String, ModuleOverride>,
    pub concurrency: usize,
}

impl Default for AutolinkingOptions {
    fn default() -> Self {
        AutolinkingOptions {
            exclude: BTreeSet::new(),
            platform_exclude: BTreeMap::new(),
            native_modules_dir: PathBuf::from(DEFAULT_NATIVE_MODULES_DIR),
            overrides: BTreeMap::new(),
            modules: BTreeMap::new(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl AutolinkingOptions {
    /// Load options for a project: `package.json` (`expo.autolinking`) then `autolinking.toml`.
    ///
    /// Missing sources are skipped; malformed sources are errors.
    pub fn load(project_root: &Path, scope: &MemoScope<'_>) -> Result<Self, OptionsError> {
        let mut options = AutolinkingOptions::default();

        let package_json = project_root.join(PACKAGE_JSON);
        if scope.is_file(&package_json) {
            if let Some(layer) = Self::layer_from_package_json(&package_json, scope)? {
                debug!("Applying autolinking options from {:?}", package_json);
                options.apply(layer);
            }
        }

        let toml_path = project_root.join(AUTOLINKING_TOML);
        if scope.is_file(&toml_path) {
            let content = scope
                .read_to_string(&toml_path)
                .map_err(|source| OptionsError::Io {
                    path: toml_path.clone(),
                    source,
                })?;
            let layer: OptionsLayer =
                toml::from_str(&content).map_err(|source| OptionsError::Toml {
                    path: toml_path.clone(),
                    source,
                })?;
            debug!("Applying autolinking options from {:?}", toml_path);
            options.apply(layer);
        }

        options.validate()?;
        Ok(options)
    }

    fn layer_from_package_json(
        path: &Path,
        scope: &MemoScope<'_>,
    ) -> Result<Option<OptionsLayer>, OptionsError> {
        let content = scope
            .read_to_string(path)
            .map_err(|source| OptionsError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let root: RootManifestOptions =
            serde_json::from_str(&content).map_err(|source| OptionsError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        let Some(value) = root.expo.and_then(|expo| expo.autolinking) else {
            return Ok(None);
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|source| OptionsError::Json {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Merge a layer over the current options
    pub fn apply(&mut self, layer: OptionsLayer) {
        self.exclude.extend(layer.exclude);
        if let Some(dir) = layer.native_modules_dir {
            self.native_modules_dir = dir;
        }
        self.overrides.extend(layer.overrides);
        for (name, module_override) in layer.modules {
            self.modules
                .entry(name)
                .or_default()
                .merge(module_override);
        }
        if let Some(concurrency) = layer.concurrency {
            self.concurrency = concurrency;
        }
        for (platform, section) in [
            (Platform::Ios, layer.ios),
            (Platform::Android, layer.android),
            (Platform::Web, layer.web),
        ] {
            if !section.exclude.is_empty() {
                self.platform_exclude
                    .entry(platform)
                    .or_default()
                    .extend(section.exclude);
            }
        }
    }

    /// Apply command-line flags, the highest-precedence layer
    pub fn with_cli(
        mut self,
        exclude: Vec<String>,
        concurrency: Option<usize>,
    ) -> Result<Self, OptionsError> {
        self.apply(OptionsLayer {
            exclude,
            concurrency,
            ..OptionsLayer::default()
        });
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), OptionsError> {
        if self.concurrency == 0 {
            return Err(OptionsError::Invalid(
                "concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// True if `module` is on the global or the platform deny-list
    pub fn is_excluded(&self, module: &str, platform: Platform) -> bool {
        self.exclude.contains(module)
            || self
                .platform_exclude
                .get(&platform)
                .is_some_and(|names| names.contains(module))
    }

    pub fn module_override(&self, module: &str) -> Option<&ModuleOverride> {
        self.modules.get(module)
    }

    /// Absolute path of the package forced to win for `module`, if any
    pub fn override_path(&self, module: &str, project_root: &Path) -> Option<PathBuf> {
        self.overrides.get(module).map(|p| project_root.join(p))
    }
}
