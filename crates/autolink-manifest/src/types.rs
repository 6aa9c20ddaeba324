//! Manifest and resolution types.
//!
//! - `PackageManifest` / `ModuleMarker`: what is read from disk
//! - `PackageGraph`: every installed package reached from the project root
//! - `ModuleDescriptor` / `ResolutionResult`: what the generator consumes

use ahash::AHashMap;
use autolink_config::Platform;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const PACKAGE_JSON: &str = "package.json";
pub const MODULE_MARKER: &str = "expo-module.config.json";

// =============================================================================
// ON-DISK MANIFESTS
// =============================================================================

/// The subset of `package.json` autolinking cares about
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub optional_dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub peer_dependencies: BTreeMap<String, String>,
}

/// How a dependency edge was declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DependencyKind {
    Regular,
    Dev,
    Optional,
    Peer,
}

impl PackageManifest {
    /// Dependency names to follow, in lexicographic order.
    ///
    /// Dev dependencies only count for the project root; when a name is
    /// declared more than once the strongest kind is kept.
    pub fn dependency_edges(&self, is_root: bool) -> Vec<(String, DependencyKind)> {
        let mut sources = vec![(&self.dependencies, DependencyKind::Regular)];
        if is_root {
            sources.push((&self.dev_dependencies, DependencyKind::Dev));
        } else {
            sources.push((&self.peer_dependencies, DependencyKind::Peer));
        }
        sources.push((&self.optional_dependencies, DependencyKind::Optional));

        let mut edges: BTreeMap<&str, DependencyKind> = BTreeMap::new();
        for (deps, kind) in sources {
            for name in deps.keys() {
                edges
                    .entry(name.as_str())
                    .and_modify(|existing| *existing = (*existing).min(kind))
                    .or_insert(kind);
            }
        }

        edges
            .into_iter()
            .map(|(name, kind)| (name.to_string(), kind))
            .collect()
    }
}

/// Apple section of `expo-module.config.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppleMarker {
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub podspec_path: Option<String>,
    #[serde(default)]
    pub swift_module_name: Option<String>,
    #[serde(default)]
    pub app_delegate_subscribers: Vec<String>,
    #[serde(default)]
    pub react_delegate_handlers: Vec<String>,
    #[serde(default)]
    pub debug_only: bool,
}

/// Android section of `expo-module.config.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidMarker {
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub packages: Vec<String>,
    #[serde(default)]
    pub gradle_path: Option<String>,
    #[serde(default)]
    pub cmake_lists_path: Option<String>,
}

/// Native-module marker (`expo-module.config.json`) next to a package's `package.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleMarker {
    /// Module name; defaults to the package name
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default, alias = "ios")]
    pub apple: Option<AppleMarker>,
    #[serde(default)]
    pub android: Option<AndroidMarker>,
}

impl ModuleMarker {
    /// Platforms this marker claims, either listed or implied by a section
    pub fn platforms(&self) -> SmallVec<[Platform; 3]> {
        let mut platforms: SmallVec<[Platform; 3]> = self
            .platforms
            .iter()
            .filter_map(|name| Platform::from_marker_name(name))
            .collect();
        if self.apple.is_some() {
            platforms.push(Platform::Ios);
        }
        if self.android.is_some() {
            platforms.push(Platform::Android);
        }
        platforms.sort();
        platforms.dedup();
        platforms
    }

    pub fn supports(&self, platform: Platform) -> bool {
        self.platforms().contains(&platform)
    }
}

// =============================================================================
// PACKAGE GRAPH
// =============================================================================

/// Index of a node in the [`PackageGraph`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PackageId(pub usize);

/// One installed package reached from the project root
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageNode {
    pub id: PackageId,
    pub name: Arc<str>,
    pub version: Arc<str>,
    /// Canonical install path
    pub path: PathBuf,
    /// Edges from the project root (root = 0)
    pub depth: usize,
    /// Position in traversal order
    pub discovery: usize,
    /// Lives in the project's local modules directory
    pub is_local: bool,
    #[serde(skip)]
    pub marker: Option<ModuleMarker>,
    pub dependencies: SmallVec<[PackageId; 4]>,
}

impl PackageNode {
    /// Name the module is linked under
    pub fn module_name(&self) -> Option<&str> {
        let marker = self.marker.as_ref()?;
        Some(marker.name.as_deref().unwrap_or(&self.name))
    }

    pub fn is_candidate(&self) -> bool {
        self.marker
            .as_ref()
            .is_some_and(|marker| !marker.platforms().is_empty())
    }
}

/// Arena of packages keyed by canonical path
#[derive(Debug, Clone, Default, Serialize)]
pub struct PackageGraph {
    nodes: Vec<PackageNode>,
    #[serde(skip)]
    path_index: AHashMap<PathBuf, PackageId>,
}

/// Fields of a node before it is placed in the arena
#[derive(Debug, Clone)]
pub struct NewPackage {
    pub name: String,
    pub version: String,
    pub path: PathBuf,
    pub depth: usize,
    pub is_local: bool,
    pub marker: Option<ModuleMarker>,
}

impl PackageGraph {
    /// Insert a package unless its canonical path is already present.
    ///
    /// Returns the node id and whether the node is new.
    pub fn insert(&mut self, package: NewPackage) -> (PackageId, bool) {
        if let Some(&id) = self.path_index.get(&package.path) {
            return (id, false);
        }
        let id = PackageId(self.nodes.len());
        self.path_index.insert(package.path.clone(), id);
        self.nodes.push(PackageNode {
            id,
            name: Arc::from(package.name),
            version: Arc::from(package.version),
            path: package.path,
            depth: package.depth,
            discovery: id.0,
            is_local: package.is_local,
            marker: package.marker,
            dependencies: SmallVec::new(),
        });
        (id, true)
    }

    pub fn add_edge(&mut self, from: PackageId, to: PackageId) {
        if let Some(node) = self.nodes.get_mut(from.0) {
            if !node.dependencies.contains(&to) {
                node.dependencies.push(to);
            }
        }
    }

    pub fn get(&self, id: PackageId) -> Option<&PackageNode> {
        self.nodes.get(id.0)
    }

    pub fn find_by_path(&self, path: &Path) -> Option<&PackageNode> {
        self.path_index.get(path).and_then(|&id| self.get(id))
    }

    pub fn nodes(&self) -> &[PackageNode] {
        &self.nodes
    }

    /// Nodes carrying a native-module marker, in discovery order
    pub fn candidates(&self) -> impl Iterator<Item = &PackageNode> {
        self.nodes.iter().filter(|node| node.is_candidate())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

// =============================================================================
// MODULE DESCRIPTORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IosDetails {
    pub pod_name: String,
    pub podspec_dir: PathBuf,
    pub swift_module_name: String,
    pub modules: Vec<String>,
    pub app_delegate_subscribers: Vec<String>,
    pub react_delegate_handlers: Vec<String>,
    pub debug_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidDetails {
    pub project_name: String,
    pub source_dir: PathBuf,
    pub modules: Vec<String>,
    pub packages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmake_lists: Option<PathBuf>,
}

/// Build-system specific part of a descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlatformDetails {
    Ios(IosDetails),
    Android(AndroidDetails),
    Web,
}

/// Normalized linking unit for one (package, platform) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDescriptor {
    pub name: String,
    pub platform: Platform,
    /// Back-reference into the resolution's package graph
    #[serde(skip)]
    pub package: PackageId,
    pub package_name: String,
    pub package_version: String,
    pub package_path: PathBuf,
    pub depth: usize,
    #[serde(skip)]
    pub discovery: usize,
    pub details: PlatformDetails,
}

impl ModuleDescriptor {
    pub fn ios(&self) -> Option<&IosDetails> {
        match &self.details {
            PlatformDetails::Ios(details) => Some(details),
            _ => None,
        }
    }

    pub fn android(&self) -> Option<&AndroidDetails> {
        match &self.details {
            PlatformDetails::Android(details) => Some(details),
            _ => None,
        }
    }
}

// =============================================================================
// RESOLUTION RESULT
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExclusionReason {
    DuplicateModule,
    ExcludedByConfig,
    InvalidManifest,
    MissingNativeSource,
}

impl ExclusionReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExclusionReason::DuplicateModule => "duplicate-module",
            ExclusionReason::ExcludedByConfig => "excluded-by-config",
            ExclusionReason::InvalidManifest => "invalid-manifest",
            ExclusionReason::MissingNativeSource => "missing-native-source",
        }
    }

    /// Reasons that indicate a broken install rather than a policy decision
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            ExclusionReason::InvalidManifest | ExclusionReason::MissingNativeSource
        )
    }
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExcludedModule {
    pub name: String,
    pub package_path: PathBuf,
    pub reason: ExclusionReason,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnresolvedDependency {
    pub name: String,
    pub requested_by: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlatformResolution {
    pub modules: Vec<ModuleDescriptor>,
    pub excluded: Vec<ExcludedModule>,
}

/// Final resolution, keyed by platform. Read-only once built.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
    project_root: PathBuf,
    platforms: BTreeMap<Platform, PlatformResolution>,
    unresolved: Vec<UnresolvedDependency>,
    #[serde(skip)]
    graph: PackageGraph,
}

impl ResolutionResult {
    pub fn new(
        project_root: PathBuf,
        platforms: BTreeMap<Platform, PlatformResolution>,
        unresolved: Vec<UnresolvedDependency>,
        graph: PackageGraph,
    ) -> Self {
        ResolutionResult {
            project_root,
            platforms,
            unresolved,
            graph,
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn platform(&self, platform: Platform) -> Option<&PlatformResolution> {
        self.platforms.get(&platform)
    }

    pub fn platforms(&self) -> impl Iterator<Item = (Platform, &PlatformResolution)> {
        self.platforms.iter().map(|(platform, res)| (*platform, res))
    }

    pub fn modules(&self, platform: Platform) -> &[ModuleDescriptor] {
        self.platforms
            .get(&platform)
            .map_or(&[], |res| res.modules.as_slice())
    }

    pub fn excluded(&self, platform: Platform) -> &[ExcludedModule] {
        self.platforms
            .get(&platform)
            .map_or(&[], |res| res.excluded.as_slice())
    }

    pub fn unresolved(&self) -> &[UnresolvedDependency] {
        &self.unresolved
    }

    pub fn graph(&self) -> &PackageGraph {
        &self.graph
    }

    /// Originating package of a descriptor
    pub fn package_of(&self, module: &ModuleDescriptor) -> Option<&PackageNode> {
        self.graph.get(module.package)
    }

    /// True if any package or module was excluded because it is broken
    pub fn has_failures(&self) -> bool {
        self.platforms
            .values()
            .flat_map(|res| res.excluded.iter())
            .any(|entry| entry.reason.is_failure())
    }
}

/// A native-module candidate as reported by `search`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEntry {
    pub module_name: String,
    pub package_name: String,
    pub version: String,
    pub path: PathBuf,
    pub depth: usize,
    pub platforms: Vec<Platform>,
}
