//! Native module provider generation.
//!
//! Renders the source file each native build compiles to learn which module
//! classes exist: a Swift `ModulesProvider` subclass for iOS and a Java
//! package list for Android. Rendering is pure; writing skips files whose
//! content did not change.

pub mod errors;
pub mod identifiers;
mod java;
mod swift;
pub mod target;
pub mod writer;

pub use errors::GenerateError;
pub use target::Target;
pub use writer::{write_if_changed, WriteOutcome};

use autolink_manifest::ResolutionResult;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Rendered provider source plus the modules that had to be left out
#[derive(Debug)]
pub struct Rendered {
    pub target: Target,
    pub contents: String,
    pub errors: Vec<GenerateError>,
    pub module_count: usize,
}

/// Render the provider for `target` from a resolution.
///
/// Modules appear in resolution order. The output depends only on the
/// resolution, so rendering twice yields identical bytes.
pub fn render(result: &ResolutionResult, target: Target) -> Rendered {
    let modules = result.modules(target.platform());
    let (contents, errors, module_count) = match target {
        Target::IosSwift => swift::render(modules),
        Target::AndroidJava => java::render(modules),
    };
    for error in &errors {
        warn!("{}", error);
    }
    Rendered {
        target,
        contents,
        errors,
        module_count,
    }
}

/// Outcome of [`generate`]
#[derive(Debug)]
pub struct Generated {
    pub rendered: Rendered,
    pub path: PathBuf,
    pub outcome: WriteOutcome,
}

/// Render and write the provider for `platform`.
///
/// `output` defaults to the path the native build reads from.
pub fn generate(
    result: &ResolutionResult,
    platform: autolink_config::Platform,
    output: Option<&Path>,
) -> Result<Generated, GenerateError> {
    let target = Target::for_platform(platform)?;
    let path = output.map_or_else(
        || target.default_output(result.project_root()),
        Path::to_path_buf,
    );
    let rendered = render(result, target);
    let outcome = write_if_changed(&path, &rendered.contents)?;
    info!(
        "{} provider with {} modules: {:?} ({:?})",
        target, rendered.module_count, path, outcome
    );
    Ok(Generated {
        rendered,
        path,
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use autolink_config::Platform;
    use autolink_manifest::{
        AndroidDetails, IosDetails, ModuleDescriptor, PackageGraph, PackageId, PlatformDetails,
        PlatformResolution,
    };
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn ios_module(name: &str, class: &str, debug_only: bool) -> ModuleDescriptor {
        ModuleDescriptor {
            name: name.to_string(),
            platform: Platform::Ios,
            package: PackageId(1),
            package_name: format!("expo-{}", name),
            package_version: "1.0.0".to_string(),
            package_path: PathBuf::from(format!("/app/node_modules/expo-{}", name)),
            depth: 1,
            discovery: 1,
            details: PlatformDetails::Ios(IosDetails {
                pod_name: class.replace("Module", ""),
                podspec_dir: PathBuf::from("/app"),
                swift_module_name: format!("Expo{}", class.replace("Module", "")),
                modules: vec![class.to_string()],
                app_delegate_subscribers: Vec::new(),
                react_delegate_handlers: Vec::new(),
                debug_only,
            }),
        }
    }

    fn android_module(name: &str, class: &str) -> ModuleDescriptor {
        ModuleDescriptor {
            name: name.to_string(),
            platform: Platform::Android,
            package: PackageId(1),
            package_name: format!("expo-{}", name),
            package_version: "1.0.0".to_string(),
            package_path: PathBuf::from(format!("/app/node_modules/expo-{}", name)),
            depth: 1,
            discovery: 1,
            details: PlatformDetails::Android(AndroidDetails {
                project_name: format!("expo-{}", name),
                source_dir: PathBuf::from("/app/android"),
                modules: vec![class.to_string()],
                packages: Vec::new(),
                cmake_lists: None,
            }),
        }
    }

    fn resolution(root: &Path, platform: Platform, modules: Vec<ModuleDescriptor>) -> ResolutionResult {
        let mut platforms = BTreeMap::new();
        platforms.insert(
            platform,
            PlatformResolution {
                modules,
                excluded: Vec::new(),
            },
        );
        ResolutionResult::new(root.to_path_buf(), platforms, Vec::new(), PackageGraph::default())
    }

    #[test]
    fn test_swift_provider_wraps_debug_modules() {
        let result = resolution(
            Path::new("/app"),
            Platform::Ios,
            vec![
                ios_module("camera", "CameraModule", false),
                ios_module("dev-menu", "DevMenuModule", true),
            ],
        );
        let rendered = render(&result, Target::IosSwift);

        assert!(rendered.errors.is_empty());
        assert_eq!(rendered.module_count, 2);
        assert!(rendered.contents.contains("import ExpoCamera\n#if DEBUG\nimport ExpoDevMenu\n#endif"));
        assert!(rendered.contents.contains(
            "    #if DEBUG\n    return [\n      CameraModule.self,\n      DevMenuModule.self\n    ]\n    #else\n    return [\n      CameraModule.self\n    ]\n    #endif"
        ));
        assert!(rendered.contents.contains("getAppDelegateSubscribers() -> [ExpoAppDelegateSubscriber.Type] {\n    return []"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let modules = vec![
            ios_module("av", "AVModule", false),
            ios_module("camera", "CameraModule", false),
        ];
        let first = render(&resolution(Path::new("/app"), Platform::Ios, modules.clone()), Target::IosSwift);
        let second = render(&resolution(Path::new("/app"), Platform::Ios, modules), Target::IosSwift);
        assert_eq!(first.contents, second.contents);
    }

    #[test]
    fn test_invalid_identifier_skips_only_that_module() {
        let result = resolution(
            Path::new("/app"),
            Platform::Android,
            vec![
                android_module("camera", "expo.modules.camera.CameraModule"),
                android_module("broken", "expo.modules.broken-module.Module"),
            ],
        );
        let rendered = render(&result, Target::AndroidJava);

        assert_eq!(rendered.module_count, 1);
        assert_eq!(rendered.errors.len(), 1);
        assert!(matches!(
            &rendered.errors[0],
            GenerateError::InvalidIdentifier { module, target: Target::AndroidJava, .. } if module == "broken"
        ));
        assert!(rendered.contents.contains("      expo.modules.camera.CameraModule.class\n    );"));
        assert!(!rendered.contents.contains("broken"));
        assert!(rendered.contents.contains("Arrays.<Package>asList();"));
    }

    #[test]
    fn test_web_has_no_provider() {
        let result = resolution(Path::new("/app"), Platform::Web, Vec::new());
        let outcome = generate(&result, Platform::Web, None);
        assert!(matches!(outcome, Err(GenerateError::UnsupportedPlatform(Platform::Web))));
    }

    #[test]
    fn test_generate_writes_default_path_once() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let result = resolution(
            temp_dir.path(),
            Platform::Android,
            vec![android_module("camera", "expo.modules.camera.CameraModule")],
        );

        let first = generate(&result, Platform::Android, None)?;
        assert_eq!(first.outcome, WriteOutcome::Written);
        assert_eq!(
            first.path,
            temp_dir.path().join(
                "android/app/build/generated/autolinking/src/main/java/expo/modules/ExpoModulesPackageList.java"
            )
        );

        let second = generate(&result, Platform::Android, None)?;
        assert_eq!(second.outcome, WriteOutcome::Unchanged);
        Ok(())
    }
}
