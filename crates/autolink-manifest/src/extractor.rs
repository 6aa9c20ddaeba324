//! Per-platform descriptor extraction from a package's module marker.

use crate::errors::ModuleError;
use crate::types::{
    AndroidDetails, IosDetails, ModuleDescriptor, ModuleMarker, PackageNode, PlatformDetails,
};
use autolink_config::{AutolinkingOptions, MemoScope, Platform};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

const DEFAULT_GRADLE_PATH: &str = "android";
const PODSPEC_SEARCH_DEPTH: usize = 2;

/// Build the descriptor of `node` for `platform`.
///
/// `Ok(None)` when the marker does not target the platform.
pub fn extract(
    node: &PackageNode,
    marker: &ModuleMarker,
    platform: Platform,
    options: &AutolinkingOptions,
    scope: &MemoScope<'_>,
) -> Result<Option<ModuleDescriptor>, ModuleError> {
    let name = marker.name.clone().unwrap_or_else(|| node.name.to_string());

    let details = match platform {
        Platform::Ios => {
            let Some(apple) = &marker.apple else {
                return Ok(None);
            };
            let podspec = match &apple.podspec_path {
                Some(relative) => {
                    let path = node.path.join(relative);
                    if !scope.is_file(&path) {
                        return Err(missing(&name, platform, path));
                    }
                    path
                }
                None => find_podspec(&node.path, scope)
                    .ok_or_else(|| missing(&name, platform, node.path.join("*.podspec")))?,
            };
            let pod_name = podspec
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| name.clone());
            let mut details = IosDetails {
                swift_module_name: apple
                    .swift_module_name
                    .clone()
                    .unwrap_or_else(|| pod_name.clone()),
                pod_name,
                podspec_dir: podspec
                    .parent()
                    .map_or_else(|| node.path.clone(), Path::to_path_buf),
                modules: apple.modules.clone(),
                app_delegate_subscribers: apple.app_delegate_subscribers.clone(),
                react_delegate_handlers: apple.react_delegate_handlers.clone(),
                debug_only: apple.debug_only,
            };
            if let Some(module_override) = options.module_override(&name) {
                if let Some(debug_only) = module_override.debug_only {
                    details.debug_only = debug_only;
                }
                if let Some(swift_module_name) = &module_override.swift_module_name {
                    details.swift_module_name.clone_from(swift_module_name);
                }
            }
            PlatformDetails::Ios(details)
        }
        Platform::Android => {
            let Some(android) = &marker.android else {
                return Ok(None);
            };
            let source_dir = node
                .path
                .join(android.gradle_path.as_deref().unwrap_or(DEFAULT_GRADLE_PATH));
            if !scope.is_dir(&source_dir) {
                return Err(missing(&name, platform, source_dir));
            }
            let cmake_lists = match &android.cmake_lists_path {
                Some(relative) => {
                    let path = node.path.join(relative);
                    if !scope.is_file(&path) {
                        return Err(missing(&name, platform, path));
                    }
                    Some(path)
                }
                None => None,
            };
            PlatformDetails::Android(AndroidDetails {
                project_name: android_project_name(&node.name),
                source_dir,
                modules: android.modules.clone(),
                packages: android.packages.clone(),
                cmake_lists,
            })
        }
        Platform::Web => {
            if !marker.platforms.iter().any(|p| p == "web") {
                return Ok(None);
            }
            PlatformDetails::Web
        }
    };

    debug!("Extracted {} descriptor for '{}'", platform, name);
    Ok(Some(ModuleDescriptor {
        name,
        platform,
        package: node.id,
        package_name: node.name.to_string(),
        package_version: node.version.to_string(),
        package_path: node.path.clone(),
        depth: node.depth,
        discovery: node.discovery,
        details,
    }))
}

fn missing(module: &str, platform: Platform, path: PathBuf) -> ModuleError {
    ModuleError::MissingNativeSource {
        module: module.to_string(),
        platform,
        path,
    }
}

/// First `*.podspec` in sorted path order within two levels of the package,
/// never descending into `node_modules`
pub fn find_podspec(package_dir: &Path, scope: &MemoScope<'_>) -> Option<PathBuf> {
    let key = package_dir.to_string_lossy().into_owned();
    scope.memoize("podspec", &key, || {
        let mut found: Vec<PathBuf> = WalkDir::new(package_dir)
            .min_depth(1)
            .max_depth(PODSPEC_SEARCH_DEPTH)
            .into_iter()
            .filter_entry(|entry| entry.file_name() != "node_modules")
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .filter(|path| path.extension().is_some_and(|ext| ext == "podspec"))
            .collect();
        found.sort();
        found.into_iter().next()
    })
}

/// Gradle project name for a package: leading `@` dropped, every run of
/// non-word characters collapsed to a single `-`
pub fn android_project_name(package_name: &str) -> String {
    let mut project = String::with_capacity(package_name.len());
    let mut in_run = false;
    for ch in package_name.trim_start_matches('@').chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            project.push(ch);
            in_run = false;
        } else if !in_run {
            project.push('-');
            in_run = true;
        }
    }
    project
}
