use crate::errors::GenerateError;
use std::fs;
use std::hash::{Hash, Hasher};
use std::io::Write;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Unchanged,
}

pub fn content_hash(bytes: &[u8]) -> u64 {
    let mut hasher = ahash::AHasher::default();
    bytes.hash(&mut hasher);
    hasher.finish()
}

/// Write `contents` to `path` unless the file already holds exactly that.
///
/// An unchanged file is not touched, so its modification time survives and
/// native builds are not invalidated.
pub fn write_if_changed(path: &Path, contents: &str) -> Result<WriteOutcome, GenerateError> {
    let io_error = |source| GenerateError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Ok(existing) = fs::read(path) {
        if content_hash(&existing) == content_hash(contents.as_bytes()) {
            debug!("{:?} is up to date", path);
            return Ok(WriteOutcome::Unchanged);
        }
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error)?;
    }

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);
    let file = fs::File::create(&temp_path).map_err(io_error)?;
    let mut writer = std::io::BufWriter::new(file);
    let written = writer
        .write_all(contents.as_bytes())
        .and_then(|()| writer.flush());
    drop(writer);
    // No temp file is left behind on any failure past this point
    if let Err(source) = written.and_then(|()| fs::rename(&temp_path, path)) {
        let _ = fs::remove_file(&temp_path);
        return Err(io_error(source));
    }

    debug!("Wrote {:?}", path);
    Ok(WriteOutcome::Written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_unchanged_file_keeps_mtime() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("generated/ExpoModulesProvider.swift");

        assert_eq!(write_if_changed(&path, "import ExpoModulesCore\n")?, WriteOutcome::Written);
        let before = fs::metadata(&path)?.modified()?;

        assert_eq!(
            write_if_changed(&path, "import ExpoModulesCore\n")?,
            WriteOutcome::Unchanged
        );
        assert_eq!(fs::metadata(&path)?.modified()?, before);
        assert!(!temp_dir.path().join("generated/ExpoModulesProvider.swift.tmp").exists());
        Ok(())
    }

    #[test]
    fn test_changed_content_is_replaced() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("ExpoModulesPackageList.java");
        fs::write(&path, "old")?;

        assert_eq!(write_if_changed(&path, "new")?, WriteOutcome::Written);
        assert_eq!(fs::read_to_string(&path)?, "new");
        Ok(())
    }

    #[test]
    fn test_failed_write_leaves_no_temp_file() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        // A non-empty directory at the target path makes the final step fail
        let path = temp_dir.path().join("ExpoModulesProvider.swift");
        fs::create_dir_all(path.join("nested"))?;

        let result = write_if_changed(&path, "import ExpoModulesCore\n");
        assert!(matches!(result, Err(GenerateError::Io { .. })));
        assert!(!temp_dir.path().join("ExpoModulesProvider.swift.tmp").exists());
        assert!(path.is_dir());
        Ok(())
    }
}
