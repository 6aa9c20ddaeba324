//! Reading `package.json` and `expo-module.config.json` through the memo scope.
//!
//! Parsed manifests are memoized per path, so a package reached from several
//! dependents is parsed once per invocation.

use crate::errors::ModuleError;
use crate::types::{ModuleMarker, PackageManifest, MODULE_MARKER, PACKAGE_JSON};
use autolink_config::MemoScope;
use std::path::Path;
use tracing::trace;

/// Parse the `package.json` in `package_dir`
pub fn load_package_manifest(
    package_dir: &Path,
    scope: &MemoScope<'_>,
) -> Result<PackageManifest, ModuleError> {
    let path = package_dir.join(PACKAGE_JSON);
    let key = path.to_string_lossy().into_owned();
    scope.memoize("package-manifest", &key, || {
        trace!("Parsing {:?}", path);
        let content = scope
            .read_to_string(&path)
            .map_err(|e| ModuleError::InvalidManifest {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        parse_package_manifest(&content).map_err(|reason| ModuleError::InvalidManifest {
            path: path.clone(),
            reason,
        })
    })
}

/// Parse the module marker in `package_dir`; `Ok(None)` when there is none
pub fn load_module_marker(
    package_dir: &Path,
    scope: &MemoScope<'_>,
) -> Result<Option<ModuleMarker>, ModuleError> {
    let path = package_dir.join(MODULE_MARKER);
    if !scope.is_file(&path) {
        return Ok(None);
    }
    let key = path.to_string_lossy().into_owned();
    scope.memoize("module-marker", &key, || {
        trace!("Parsing {:?}", path);
        let content = scope
            .read_to_string(&path)
            .map_err(|e| ModuleError::InvalidManifest {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        serde_json::from_str::<ModuleMarker>(&content)
            .map(Some)
            .map_err(|e| ModuleError::InvalidManifest {
                path: path.clone(),
                reason: e.to_string(),
            })
    })
}

fn parse_package_manifest(content: &str) -> Result<PackageManifest, String> {
    let manifest: PackageManifest = serde_json::from_str(content).map_err(|e| e.to_string())?;
    if manifest.name.as_deref().is_some_and(str::is_empty) {
        return Err("\"name\" must not be empty".to_string());
    }
    Ok(manifest)
}
