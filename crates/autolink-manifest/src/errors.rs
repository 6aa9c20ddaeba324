use autolink_config::{MemoError, OptionsError, Platform};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors that abort a resolution
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Project root has no package.json: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Invalid manifest {path}: {reason}")]
    InvalidManifest { path: PathBuf, reason: String },

    #[error("Resolution cancelled")]
    Cancelled,

    #[error("Failed to load autolinking options: {0}")]
    Options(#[from] OptionsError),

    #[error("Memoization error: {0}")]
    Memo(#[from] MemoError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to build discovery thread pool: {0}")]
    ThreadPool(String),
}

/// Errors confined to a single package or module; they exclude it from the
/// result instead of failing the resolution
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModuleError {
    #[error("invalid manifest {path}: {reason}")]
    InvalidManifest { path: PathBuf, reason: String },

    #[error("'{module}' declares {platform} native sources that do not exist: {path}")]
    MissingNativeSource {
        module: String,
        platform: Platform,
        path: PathBuf,
    },
}
