use crate::target::Target;
use autolink_config::Platform;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Module '{module}' has an invalid {target} identifier '{identifier}'")]
    InvalidIdentifier {
        module: String,
        identifier: String,
        target: Target,
    },

    #[error("No provider source is generated for {0}")]
    UnsupportedPlatform(Platform),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
