//! Resolution of the package graph into per-platform module lists.
//!
//! `resolve` = discovery, extraction, config exclusion, then one winner per
//! (module name, platform).

use crate::errors::{ModuleError, ResolveError};
use crate::extractor::extract;
use crate::manifest::load_package_manifest;
use crate::package_discovery::{Discovery, PackageDiscoverer, PackageLocator};
use crate::types::{
    ExcludedModule, ExclusionReason, ModuleDescriptor, PlatformResolution, ResolutionResult,
    SearchEntry, PACKAGE_JSON,
};
use autolink_config::{AutolinkingOptions, CancelToken, Diagnostics, MemoScope, Platform};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Canonical project root, or `ConfigNotFound` when it has no `package.json`
pub fn validate_project_root(
    project_root: &Path,
    scope: &MemoScope<'_>,
) -> Result<PathBuf, ResolveError> {
    if !scope.is_file(&project_root.join(PACKAGE_JSON)) {
        return Err(ResolveError::ConfigNotFound(project_root.to_path_buf()));
    }
    Ok(scope.canonicalize(project_root)?)
}

fn discover(
    project_root: &Path,
    options: &AutolinkingOptions,
    scope: &MemoScope<'_>,
    cancel: &CancelToken,
) -> Result<(PathBuf, Discovery), ResolveError> {
    let root = validate_project_root(project_root, scope)?;
    let root_manifest = load_package_manifest(&root, scope).map_err(|e| match e {
        ModuleError::InvalidManifest { path, reason } => {
            ResolveError::InvalidManifest { path, reason }
        }
        other => ResolveError::InvalidManifest {
            path: root.join(PACKAGE_JSON),
            reason: other.to_string(),
        },
    })?;

    let locator = PackageLocator::new(root.clone(), scope);
    let discovery = PackageDiscoverer::new(&locator, options, cancel).discover(&root_manifest)?;
    Ok((root, discovery))
}

/// Resolve the native modules to link for each requested platform
pub fn resolve(
    project_root: &Path,
    platforms: &[Platform],
    options: &AutolinkingOptions,
    scope: &MemoScope<'_>,
    cancel: &CancelToken,
) -> Result<(ResolutionResult, Diagnostics), ResolveError> {
    let (root, discovery) = discover(project_root, options, scope, cancel)?;
    let mut diagnostics = Diagnostics::new();

    let requested: BTreeSet<Platform> = platforms.iter().copied().collect();
    let mut resolved = BTreeMap::new();
    for platform in requested {
        if cancel.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }
        let resolution =
            resolve_platform(&root, platform, &discovery, options, scope, &mut diagnostics);
        info!(
            "Resolved {} {} modules ({} excluded)",
            resolution.modules.len(),
            platform,
            resolution.excluded.len()
        );
        resolved.insert(platform, resolution);
    }

    for dependency in &discovery.unresolved {
        diagnostics.warn(
            "unresolved-dependency",
            format!(
                "'{}' requires '{}', which is not installed",
                dependency.requested_by, dependency.name
            ),
        );
    }

    let Discovery {
        graph, unresolved, ..
    } = discovery;
    Ok((
        ResolutionResult::new(root, resolved, unresolved, graph),
        diagnostics,
    ))
}

fn resolve_platform(
    root: &Path,
    platform: Platform,
    discovery: &Discovery,
    options: &AutolinkingOptions,
    scope: &MemoScope<'_>,
    diagnostics: &mut Diagnostics,
) -> PlatformResolution {
    let mut excluded = Vec::new();

    for invalid in &discovery.invalid {
        diagnostics.warn_platform(
            platform,
            ExclusionReason::InvalidManifest.as_str(),
            invalid.error.to_string(),
        );
        excluded.push(ExcludedModule {
            name: invalid.name.clone(),
            package_path: invalid.path.clone(),
            reason: ExclusionReason::InvalidManifest,
            detail: invalid.error.to_string(),
        });
    }

    let mut by_name: BTreeMap<String, Vec<ModuleDescriptor>> = BTreeMap::new();
    for node in discovery.graph.candidates() {
        let (Some(marker), Some(name)) = (&node.marker, node.module_name()) else {
            continue;
        };
        if !marker.supports(platform) {
            continue;
        }
        if options.is_excluded(name, platform) {
            debug!("'{}' excluded for {} by configuration", name, platform);
            excluded.push(ExcludedModule {
                name: name.to_string(),
                package_path: node.path.clone(),
                reason: ExclusionReason::ExcludedByConfig,
                detail: "listed in exclude".to_string(),
            });
            continue;
        }

        match extract(node, marker, platform, options, scope) {
            Ok(Some(descriptor)) => by_name
                .entry(descriptor.name.clone())
                .or_default()
                .push(descriptor),
            Ok(None) => {}
            Err(error) => {
                diagnostics.warn_platform(
                    platform,
                    ExclusionReason::MissingNativeSource.as_str(),
                    error.to_string(),
                );
                excluded.push(ExcludedModule {
                    name: name.to_string(),
                    package_path: node.path.clone(),
                    reason: ExclusionReason::MissingNativeSource,
                    detail: error.to_string(),
                });
            }
        }
    }

    let mut modules = Vec::with_capacity(by_name.len());
    for (name, mut candidates) in by_name {
        let forced = options
            .override_path(&name, root)
            .and_then(|path| scope.canonicalize(&path).ok());
        candidates.sort_by(|a, b| {
            let a_forced = forced.as_deref() == Some(a.package_path.as_path());
            let b_forced = forced.as_deref() == Some(b.package_path.as_path());
            b_forced
                .cmp(&a_forced)
                .then(a.depth.cmp(&b.depth))
                .then_with(|| a.package_name.cmp(&b.package_name))
                .then(a.discovery.cmp(&b.discovery))
        });

        let mut candidates = candidates.into_iter();
        let Some(winner) = candidates.next() else {
            continue;
        };
        for loser in candidates {
            diagnostics.warn_platform(
                platform,
                ExclusionReason::DuplicateModule.as_str(),
                format!(
                    "'{}' is provided by multiple packages; using {} and ignoring {}",
                    name,
                    winner.package_path.display(),
                    loser.package_path.display()
                ),
            );
            excluded.push(ExcludedModule {
                name: loser.name,
                package_path: loser.package_path,
                reason: ExclusionReason::DuplicateModule,
                detail: winner.package_path.display().to_string(),
            });
        }
        modules.push(winner);
    }

    excluded.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then_with(|| a.package_path.cmp(&b.package_path))
    });
    PlatformResolution { modules, excluded }
}

/// Every native-module candidate in the graph, without conflict resolution
pub fn search(
    project_root: &Path,
    options: &AutolinkingOptions,
    scope: &MemoScope<'_>,
    cancel: &CancelToken,
) -> Result<Vec<SearchEntry>, ResolveError> {
    let (_, discovery) = discover(project_root, options, scope, cancel)?;
    let mut entries: Vec<SearchEntry> = discovery
        .graph
        .candidates()
        .filter_map(|node| {
            let marker = node.marker.as_ref()?;
            Some(SearchEntry {
                module_name: node.module_name()?.to_string(),
                package_name: node.name.to_string(),
                version: node.version.to_string(),
                path: node.path.clone(),
                depth: node.depth,
                platforms: marker.platforms().to_vec(),
            })
        })
        .collect();
    entries.sort_by(|a, b| {
        a.module_name
            .cmp(&b.module_name)
            .then(a.depth.cmp(&b.depth))
            .then_with(|| a.path.cmp(&b.path))
    });
    Ok(entries)
}
