//! Package graph resolution for native module autolinking.
//!
//! Walks the installed dependency graph of a JavaScript project, reads the
//! native-module marker of every package, extracts per-platform build
//! metadata and picks one package per module name and platform.

pub mod errors;
pub mod extractor;
pub mod manifest;
pub mod package_discovery;
pub mod resolver;
pub mod types;

pub use errors::{ModuleError, ResolveError};
pub use resolver::{resolve, search, validate_project_root};
pub use types::{
    AndroidDetails, ExcludedModule, ExclusionReason, IosDetails, ModuleDescriptor, ModuleMarker,
    PackageGraph, PackageId, PackageNode, PlatformDetails, PlatformResolution, ResolutionResult,
    SearchEntry, UnresolvedDependency,
};
