//! Typed view of the app config (`app.json`).

use crate::errors::ModError;
use autolink_config::MemoScope;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

pub const APP_JSON: &str = "app.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidStatusBar {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bar_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translucent: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidNavigationBar {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bar_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

/// `"name"` or `["name", { props }]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PluginEntry {
    Name(String),
    WithProps(String, Value),
}

impl PluginEntry {
    pub fn name(&self) -> &str {
        match self {
            PluginEntry::Name(name) | PluginEntry::WithProps(name, _) => name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpoConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub android_status_bar: Option<AndroidStatusBar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub android_navigation_bar: Option<AndroidNavigationBar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugins: Option<Vec<PluginEntry>>,
    /// Every other field, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExpoConfig {
    /// Read `app.json` from the project root. Accepts `{ "expo": { ... } }`
    /// or a bare config object.
    pub fn load(project_root: &Path, scope: &MemoScope<'_>) -> Result<Self, ModError> {
        let path = project_root.join(APP_JSON);
        if !scope.is_file(&path) {
            return Err(ModError::AppConfigNotFound(path));
        }
        let content = scope.read_to_string(&path).map_err(|source| ModError::Io {
            path: path.clone(),
            source,
        })?;
        Self::from_json_str(&content).map_err(|source| ModError::Json { path, source })
    }

    pub fn from_json_str(content: &str) -> Result<Self, serde_json::Error> {
        let mut value: Value = serde_json::from_str(content)?;
        if let Some(expo) = value.get_mut("expo") {
            return serde_json::from_value(expo.take());
        }
        serde_json::from_value(value)
    }
}
