use crate::registry::ModKey;
use crate::resources::XmlError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModError {
    #[error("No app config found: {0} does not exist")]
    AppConfigNotFound(PathBuf),

    #[error("IO error on {path}: {source}")]
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
    Xml {
        path: PathBuf,
        #[source]
        source: XmlError,
    },

    #[error("Unknown mod '{0}'")]
    UnknownMod(String),

    #[error("Mod '{0}' is registered twice")]
    DuplicateMod(String),

    #[error("No results loaded for {0}")]
    MissingResults(ModKey),

    #[error("Result for {0} no longer has its declared shape")]
    ShapeMismatch(ModKey),

    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Application(#[from] ModApplicationError),
}

/// A mod failed while the pipeline was running
#[derive(Error, Debug)]
#[error("Mod '{mod_name}' failed on {key}: {source}")]
pub struct ModApplicationError {
    pub mod_name: String,
    pub key: ModKey,
    #[source]
    pub source: Box<ModError>,
}
