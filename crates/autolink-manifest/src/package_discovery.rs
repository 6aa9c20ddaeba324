use crate::errors::{ModuleError, ResolveError};
use crate::manifest::{load_module_marker, load_package_manifest};
use crate::types::{
    DependencyKind, ModuleMarker, NewPackage, PackageGraph, PackageId, PackageManifest,
    UnresolvedDependency, PACKAGE_JSON,
};
use ahash::AHashMap;
use autolink_config::{AutolinkingOptions, CancelToken, MemoScope};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn};
use walkdir::WalkDir;

const NODE_MODULES: &str = "node_modules";

/// Resolve installed package directories the way Node does.
#[derive(Debug)]
pub struct PackageLocator<'a> {
    project_root: PathBuf,
    scope: &'a MemoScope<'a>,
}

impl<'a> PackageLocator<'a> {
    /// Create a locator for a canonical project root
    pub fn new(project_root: PathBuf, scope: &'a MemoScope<'a>) -> Self {
        debug!("Initializing package locator for: {:?}", project_root);
        PackageLocator {
            project_root,
            scope,
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Find `name` starting from `from_dir`: `<dir>/node_modules/<name>`, then
    /// each ancestor's `node_modules`. Returns the canonical package path.
    pub fn locate(&self, from_dir: &Path, name: &str) -> Option<PathBuf> {
        for dir in from_dir.ancestors() {
            if dir.file_name().is_some_and(|n| n == NODE_MODULES) {
                continue;
            }
            let candidate = dir.join(NODE_MODULES).join(name);
            if self.scope.is_file(&candidate.join(PACKAGE_JSON)) {
                trace!("Located '{}' at {:?}", name, candidate);
                return self.scope.canonicalize(&candidate).ok();
            }
        }
        None
    }

    /// Package directories under the project's local native modules directory,
    /// sorted by directory name
    pub fn local_modules(&self, native_modules_dir: &Path) -> Vec<PathBuf> {
        let root = self.project_root.join(native_modules_dir);
        if !self.scope.is_dir(&root) {
            return Vec::new();
        }

        WalkDir::new(&root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_dir())
            .map(walkdir::DirEntry::into_path)
            .filter(|path| self.scope.is_file(&path.join(PACKAGE_JSON)))
            .filter_map(|path| self.scope.canonicalize(&path).ok())
            .collect()
    }
}

/// A package whose manifest or marker could not be parsed
#[derive(Debug, Clone)]
pub struct InvalidPackage {
    pub id: PackageId,
    pub name: String,
    pub path: PathBuf,
    pub error: ModuleError,
}

/// Everything a traversal produced
#[derive(Debug, Default)]
pub struct Discovery {
    pub graph: PackageGraph,
    pub invalid: Vec<InvalidPackage>,
    pub unresolved: Vec<UnresolvedDependency>,
}

/// Edge waiting to be expanded in the next level
#[derive(Debug, Clone)]
struct PendingEdge {
    parent: PackageId,
    /// Name the dependent asked for; used when the manifest has none
    requested: Option<String>,
    path: PathBuf,
    is_local: bool,
}

#[derive(Debug)]
struct LoadedPackage {
    manifest: Result<PackageManifest, ModuleError>,
    marker: Result<Option<ModuleMarker>, ModuleError>,
}

/// Breadth-first walk of the installed dependency graph
pub struct PackageDiscoverer<'a> {
    locator: &'a PackageLocator<'a>,
    options: &'a AutolinkingOptions,
    cancel: &'a CancelToken,
}

impl<'a> PackageDiscoverer<'a> {
    pub fn new(
        locator: &'a PackageLocator<'a>,
        options: &'a AutolinkingOptions,
        cancel: &'a CancelToken,
    ) -> Self {
        PackageDiscoverer {
            locator,
            options,
            cancel,
        }
    }

    /// Walk the graph from the project root.
    ///
    /// Each depth level is loaded in parallel; nodes are numbered in frontier
    /// order afterwards, so the graph does not depend on thread scheduling.
    pub fn discover(&self, root_manifest: &PackageManifest) -> Result<Discovery, ResolveError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.concurrency)
            .build()
            .map_err(|e| ResolveError::ThreadPool(e.to_string()))?;

        let root_path = self.locator.project_root().to_path_buf();
        let mut discovery = Discovery::default();
        let (root_id, _) = discovery.graph.insert(NewPackage {
            name: root_manifest
                .name
                .clone()
                .unwrap_or_else(|| dir_name(&root_path)),
            version: root_manifest.version.clone().unwrap_or_default(),
            path: root_path.clone(),
            depth: 0,
            is_local: false,
            marker: None,
        });

        let mut frontier: Vec<PendingEdge> = self
            .locator
            .local_modules(&self.options.native_modules_dir)
            .into_iter()
            .map(|path| PendingEdge {
                parent: root_id,
                requested: None,
                path,
                is_local: true,
            })
            .collect();
        frontier.extend(self.expand(root_id, &root_path, root_manifest, true, &mut discovery));

        let mut depth = 1;
        while !frontier.is_empty() {
            self.check_cancelled()?;
            debug!("Loading {} packages at depth {}", frontier.len(), depth);
            frontier = pool.install(|| self.load_level(frontier, depth, &mut discovery))?;
            depth += 1;
        }

        discovery.unresolved.sort();
        discovery.unresolved.dedup();
        info!(
            "Discovered {} packages ({} native module candidates)",
            discovery.graph.len(),
            discovery.graph.candidates().count()
        );
        Ok(discovery)
    }

    fn load_level(
        &self,
        frontier: Vec<PendingEdge>,
        depth: usize,
        discovery: &mut Discovery,
    ) -> Result<Vec<PendingEdge>, ResolveError> {
        let mut to_load: Vec<&Path> = Vec::new();
        let mut queued: ahash::AHashSet<&Path> = ahash::AHashSet::new();
        for edge in &frontier {
            if discovery.graph.find_by_path(&edge.path).is_none() && queued.insert(&edge.path) {
                to_load.push(&edge.path);
            }
        }

        let loaded: Vec<LoadedPackage> = to_load
            .par_iter()
            .map(|path| self.load_package(path))
            .collect::<Result<_, _>>()?;
        let mut loaded: AHashMap<&Path, LoadedPackage> = to_load.into_iter().zip(loaded).collect();

        let mut new_nodes = Vec::new();
        for edge in &frontier {
            if let Some(existing) = discovery.graph.find_by_path(&edge.path) {
                let id = existing.id;
                discovery.graph.add_edge(edge.parent, id);
                continue;
            }
            let Some(package) = loaded.remove(edge.path.as_path()) else {
                continue;
            };

            let name = match &package.manifest {
                Ok(manifest) => manifest.name.clone(),
                Err(_) => None,
            }
            .or_else(|| edge.requested.clone())
            .unwrap_or_else(|| dir_name(&edge.path));
            let version = package
                .manifest
                .as_ref()
                .ok()
                .and_then(|manifest| manifest.version.clone())
                .unwrap_or_default();
            // A package with an unreadable package.json is never linked
            let marker = match &package.manifest {
                Ok(_) => package.marker.as_ref().ok().cloned().flatten(),
                Err(_) => None,
            };

            let (id, _) = discovery.graph.insert(NewPackage {
                name: name.clone(),
                version,
                path: edge.path.clone(),
                depth,
                is_local: edge.is_local,
                marker,
            });
            discovery.graph.add_edge(edge.parent, id);

            for error in [package.manifest.as_ref().err(), package.marker.as_ref().err()]
                .into_iter()
                .flatten()
            {
                warn!("Skipping '{}': {}", name, error);
                discovery.invalid.push(InvalidPackage {
                    id,
                    name: name.clone(),
                    path: edge.path.clone(),
                    error: error.clone(),
                });
            }
            new_nodes.push((id, edge.path.clone(), package.manifest));
        }

        let mut next = Vec::new();
        for (id, path, manifest) in new_nodes {
            // An unreadable package.json has no edges to follow
            if let Ok(manifest) = manifest {
                next.extend(self.expand(id, &path, &manifest, false, discovery));
            }
        }
        Ok(next)
    }

    fn load_package(&self, path: &Path) -> Result<LoadedPackage, ResolveError> {
        self.check_cancelled()?;
        let scope = self.locator.scope;
        Ok(LoadedPackage {
            manifest: load_package_manifest(path, scope),
            marker: load_module_marker(path, scope),
        })
    }

    /// Locate the dependencies of a node, in lexicographic order
    fn expand(
        &self,
        id: PackageId,
        path: &Path,
        manifest: &PackageManifest,
        is_root: bool,
        discovery: &mut Discovery,
    ) -> Vec<PendingEdge> {
        let requested_by = manifest.name.clone().unwrap_or_else(|| dir_name(path));
        let mut edges = Vec::new();
        for (name, kind) in manifest.dependency_edges(is_root) {
            match self.locator.locate(path, &name) {
                Some(dep_path) => edges.push(PendingEdge {
                    parent: id,
                    requested: Some(name),
                    path: dep_path,
                    is_local: false,
                }),
                None if matches!(kind, DependencyKind::Peer | DependencyKind::Optional) => {
                    trace!("Optional dependency '{}' of '{}' not installed", name, requested_by);
                }
                None => {
                    debug!("Dependency '{}' of '{}' is not installed", name, requested_by);
                    discovery.unresolved.push(UnresolvedDependency {
                        name,
                        requested_by: requested_by.clone(),
                    });
                }
            }
        }
        edges
    }

    fn check_cancelled(&self) -> Result<(), ResolveError> {
        if self.cancel.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }
        Ok(())
    }
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use autolink_config::Memoizer;
    use std::fs;
    use tempfile::TempDir;

    fn write_package(dir: &Path, json: &str) -> anyhow::Result<()> {
        fs::create_dir_all(dir)?;
        fs::write(dir.join(PACKAGE_JSON), json)?;
        Ok(())
    }

    #[test]
    fn test_locate_walks_up_ancestors() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().canonicalize()?;
        write_package(&root.join("node_modules/expo"), r#"{"name":"expo"}"#)?;
        write_package(
            &root.join("node_modules/expo-camera"),
            r#"{"name":"expo-camera"}"#,
        )?;

        let memoizer = Memoizer::new();
        let scope = memoizer.acquire()?;
        let locator = PackageLocator::new(root.clone(), &scope);

        let from = root.join("node_modules/expo-camera");
        assert_eq!(
            locator.locate(&from, "expo"),
            Some(root.join("node_modules/expo"))
        );
        assert_eq!(locator.locate(&from, "expo-av"), None);
        Ok(())
    }

    #[test]
    fn test_cycle_is_visited_once() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().canonicalize()?;
        write_package(&root, r#"{"name":"app","dependencies":{"a":"1"}}"#)?;
        write_package(
            &root.join("node_modules/a"),
            r#"{"name":"a","version":"1.0.0","dependencies":{"b":"1"}}"#,
        )?;
        write_package(
            &root.join("node_modules/b"),
            r#"{"name":"b","version":"1.0.0","dependencies":{"a":"1"}}"#,
        )?;

        let memoizer = Memoizer::new();
        let scope = memoizer.acquire()?;
        let locator = PackageLocator::new(root.clone(), &scope);
        let options = AutolinkingOptions::default();
        let cancel = CancelToken::new();
        let root_manifest = load_package_manifest(&root, &scope)?;

        let discovery =
            PackageDiscoverer::new(&locator, &options, &cancel).discover(&root_manifest)?;
        let names: Vec<&str> = discovery
            .graph
            .nodes()
            .iter()
            .map(|node| node.name.as_ref())
            .collect();
        assert_eq!(names, vec!["app", "a", "b"]);

        let Some(b) = discovery.graph.find_by_path(&root.join("node_modules/b")) else {
            anyhow::bail!("b should be in the graph");
        };
        assert_eq!(b.depth, 2);
        assert_eq!(b.dependencies.as_slice(), &[PackageId(1)]);
        Ok(())
    }

    #[test]
    fn test_unresolved_and_peer_dependencies() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().canonicalize()?;
        write_package(
            &root,
            r#"{"name":"app","dependencies":{"expo-av":"1","a":"1"}}"#,
        )?;
        write_package(
            &root.join("node_modules/a"),
            r#"{"name":"a","peerDependencies":{"react":"*"}}"#,
        )?;

        let memoizer = Memoizer::new();
        let scope = memoizer.acquire()?;
        let locator = PackageLocator::new(root.clone(), &scope);
        let options = AutolinkingOptions::default();
        let cancel = CancelToken::new();
        let root_manifest = load_package_manifest(&root, &scope)?;

        let discovery =
            PackageDiscoverer::new(&locator, &options, &cancel).discover(&root_manifest)?;
        assert_eq!(
            discovery.unresolved,
            vec![UnresolvedDependency {
                name: "expo-av".to_string(),
                requested_by: "app".to_string(),
            }]
        );
        Ok(())
    }

    #[test]
    fn test_local_modules_come_first() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().canonicalize()?;
        write_package(&root, r#"{"name":"app","dependencies":{"a":"1"}}"#)?;
        write_package(&root.join("node_modules/a"), r#"{"name":"a"}"#)?;
        write_package(&root.join("modules/my-module"), r#"{"name":"my-module"}"#)?;
        fs::create_dir_all(root.join("modules/not-a-package"))?;

        let memoizer = Memoizer::new();
        let scope = memoizer.acquire()?;
        let locator = PackageLocator::new(root.clone(), &scope);
        let options = AutolinkingOptions::default();
        let cancel = CancelToken::new();
        let root_manifest = load_package_manifest(&root, &scope)?;

        let discovery =
            PackageDiscoverer::new(&locator, &options, &cancel).discover(&root_manifest)?;
        let nodes = discovery.graph.nodes();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[1].name.as_ref(), "my-module");
        assert!(nodes[1].is_local);
        assert_eq!(nodes[1].depth, 1);
        Ok(())
    }

    #[test]
    fn test_invalid_manifest_stops_subtree() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().canonicalize()?;
        write_package(&root, r#"{"name":"app","dependencies":{"broken":"1"}}"#)?;
        write_package(&root.join("node_modules/broken"), "{ nope")?;

        let memoizer = Memoizer::new();
        let scope = memoizer.acquire()?;
        let locator = PackageLocator::new(root.clone(), &scope);
        let options = AutolinkingOptions::default();
        let cancel = CancelToken::new();
        let root_manifest = load_package_manifest(&root, &scope)?;

        let discovery =
            PackageDiscoverer::new(&locator, &options, &cancel).discover(&root_manifest)?;
        assert_eq!(discovery.invalid.len(), 1);
        assert_eq!(discovery.invalid[0].name, "broken");
        assert!(discovery.unresolved.is_empty());
        Ok(())
    }

    #[test]
    fn test_cancelled_discovery() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().canonicalize()?;
        write_package(&root, r#"{"name":"app","dependencies":{"a":"1"}}"#)?;
        write_package(&root.join("node_modules/a"), r#"{"name":"a"}"#)?;

        let memoizer = Memoizer::new();
        let scope = memoizer.acquire()?;
        let locator = PackageLocator::new(root.clone(), &scope);
        let options = AutolinkingOptions::default();
        let cancel = CancelToken::new();
        cancel.cancel();
        let root_manifest = load_package_manifest(&root, &scope)?;

        let result = PackageDiscoverer::new(&locator, &options, &cancel).discover(&root_manifest);
        assert!(matches!(result, Err(ResolveError::Cancelled)));
        Ok(())
    }
}
