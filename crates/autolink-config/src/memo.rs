//! Invocation-scoped memoization of filesystem reads and resolution work.
//!
//! A [`Memoizer`] hands out at most one [`MemoScope`] at a time. Everything
//! cached through the scope is freed when the scope is released or dropped,
//! including when an invocation bails out early (cancellation, fatal error).

use ahash::AHashMap;
use parking_lot::Mutex;
use std::any::Any;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemoError {
    #[error("A memoization scope is already active; release it before acquiring another")]
    ScopeAlreadyActive,
}

/// What a path points to, as seen by the first lookup in the scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    File,
    Dir,
    Missing,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Clone)]
struct CachedIoError {
    kind: io::ErrorKind,
    message: String,
}

impl CachedIoError {
    fn from_io(err: &io::Error) -> Self {
        CachedIoError {
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    fn to_io(&self) -> io::Error {
        io::Error::new(self.kind, self.message.clone())
    }
}

type CachedValue = Arc<dyn Any + Send + Sync>;

#[derive(Default)]
struct MemoTable {
    files: AHashMap<PathBuf, Result<Arc<str>, CachedIoError>>,
    canonical: AHashMap<PathBuf, Result<PathBuf, CachedIoError>>,
    kinds: AHashMap<PathBuf, PathKind>,
    values: AHashMap<(&'static str, String), CachedValue>,
    hits: u64,
    misses: u64,
}

impl MemoTable {
    fn len(&self) -> usize {
        self.files.len() + self.canonical.len() + self.kinds.len() + self.values.len()
    }
}

/// Owner of the cache table for one invocation
#[derive(Default)]
pub struct Memoizer {
    active: AtomicBool,
    table: Mutex<MemoTable>,
}

impl std::fmt::Debug for Memoizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memoizer")
            .field("active", &self.is_active())
            .field("entries", &self.entry_count())
            .finish()
    }
}

impl Memoizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the scope. Fails if a scope from this memoizer is still alive.
    pub fn acquire(&self) -> Result<MemoScope<'_>, MemoError> {
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(MemoError::ScopeAlreadyActive);
        }
        debug!("Memoization scope acquired");
        Ok(MemoScope { memoizer: self })
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Number of cached entries currently held
    pub fn entry_count(&self) -> usize {
        self.table.lock().len()
    }

    /// True when no scope is active and nothing is cached
    pub fn is_freed(&self) -> bool {
        !self.is_active() && self.entry_count() == 0
    }

    fn release_scope(&self) {
        let freed = {
            let mut table = self.table.lock();
            let freed = table.len();
            *table = MemoTable::default();
            freed
        };
        self.active.store(false, Ordering::SeqCst);
        debug!("Memoization scope released ({} entries freed)", freed);
    }
}

/// Handle to the active cache. Releases every entry when dropped.
pub struct MemoScope<'a> {
    memoizer: &'a Memoizer,
}

impl std::fmt::Debug for MemoScope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoScope")
            .field("stats", &self.stats())
            .finish()
    }
}

impl MemoScope<'_> {
    /// Read a file as UTF-8, reusing the first read of `path` in this scope.
    ///
    /// Failed reads are cached as well, so a missing file is only checked once.
    pub fn read_to_string(&self, path: &Path) -> io::Result<Arc<str>> {
        {
            let mut table = self.memoizer.table.lock();
            if let Some(cached) = table.files.get(path).cloned() {
                table.hits += 1;
                return cached.map_err(|e| e.to_io());
            }
            table.misses += 1;
        }

        let read = std::fs::read_to_string(path)
            .map(Arc::<str>::from)
            .map_err(|e| CachedIoError::from_io(&e));

        let mut table = self.memoizer.table.lock();
        let stored = table
            .files
            .entry(path.to_path_buf())
            .or_insert(read)
            .clone();
        stored.map_err(|e| e.to_io())
    }

    /// Canonicalize a path, cached per input path
    pub fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        {
            let mut table = self.memoizer.table.lock();
            if let Some(cached) = table.canonical.get(path).cloned() {
                table.hits += 1;
                return cached.map_err(|e| e.to_io());
            }
            table.misses += 1;
        }

        let resolved = std::fs::canonicalize(path).map_err(|e| CachedIoError::from_io(&e));

        let mut table = self.memoizer.table.lock();
        let stored = table
            .canonical
            .entry(path.to_path_buf())
            .or_insert(resolved)
            .clone();
        stored.map_err(|e| e.to_io())
    }

    /// Classify a path as file, directory or missing
    pub fn kind(&self, path: &Path) -> PathKind {
        {
            let mut table = self.memoizer.table.lock();
            if let Some(kind) = table.kinds.get(path).copied() {
                table.hits += 1;
                return kind;
            }
            table.misses += 1;
        }

        let kind = match std::fs::metadata(path) {
            Ok(meta) if meta.is_dir() => PathKind::Dir,
            Ok(_) => PathKind::File,
            Err(_) => PathKind::Missing,
        };

        self.memoizer
            .table
            .lock()
            .kinds
            .insert(path.to_path_buf(), kind);
        kind
    }

    pub fn is_file(&self, path: &Path) -> bool {
        self.kind(path) == PathKind::File
    }

    pub fn is_dir(&self, path: &Path) -> bool {
        self.kind(path) == PathKind::Dir
    }

    /// Cache an arbitrary computation under `(namespace, key)`.
    ///
    /// `compute` runs without the table lock held, so it may itself use the scope.
    pub fn memoize<T, F>(&self, namespace: &'static str, key: &str, compute: F) -> T
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        let lookup = (namespace, key.to_string());
        {
            let mut table = self.memoizer.table.lock();
            let cached = table
                .values
                .get(&lookup)
                .and_then(|value| value.downcast_ref::<T>().cloned());
            if let Some(value) = cached {
                table.hits += 1;
                return value;
            }
            table.misses += 1;
        }

        let value = compute();
        self.memoizer
            .table
            .lock()
            .values
            .insert(lookup, Arc::new(value.clone()));
        value
    }

    pub fn stats(&self) -> MemoStats {
        let table = self.memoizer.table.lock();
        MemoStats {
            entries: table.len(),
            hits: table.hits,
            misses: table.misses,
        }
    }

    /// Free every cached entry and close the scope
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for MemoScope<'_> {
    fn drop(&mut self) {
        self.memoizer.release_scope();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_double_acquire_is_rejected() -> anyhow::Result<()> {
        let memoizer = Memoizer::new();
        let scope = memoizer.acquire()?;
        assert_eq!(memoizer.acquire().err(), Some(MemoError::ScopeAlreadyActive));
        scope.release();
        assert!(memoizer.acquire().is_ok());
        Ok(())
    }

    #[test]
    fn test_repeat_reads_hit_the_cache() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("package.json");
        fs::write(&path, r#"{"name":"expo-camera"}"#)?;

        let memoizer = Memoizer::new();
        let scope = memoizer.acquire()?;
        let first = scope.read_to_string(&path)?;

        // Changing the file inside the scope is not observed
        fs::write(&path, r#"{"name":"changed"}"#)?;
        let second = scope.read_to_string(&path)?;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(scope.stats().hits, 1);
        assert_eq!(scope.stats().misses, 1);
        Ok(())
    }

    #[test]
    fn test_missing_files_are_cached_as_errors() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("expo-module.config.json");

        let memoizer = Memoizer::new();
        let scope = memoizer.acquire()?;
        assert!(scope.read_to_string(&path).is_err());
        let again = scope.read_to_string(&path);
        assert!(again.is_err_and(|e| e.kind() == io::ErrorKind::NotFound));
        assert_eq!(scope.kind(&path), PathKind::Missing);
        Ok(())
    }

    #[test]
    fn test_memoize_runs_computation_once() -> anyhow::Result<()> {
        let memoizer = Memoizer::new();
        let scope = memoizer.acquire()?;
        let mut calls = 0;
        let first = scope.memoize("depth", "expo-camera", || {
            calls += 1;
            3_usize
        });
        let second = scope.memoize("depth", "expo-camera", || 99_usize);
        assert_eq!((first, second, calls), (3, 3, 1));
        Ok(())
    }

    #[test]
    fn test_release_frees_every_entry() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("package.json");
        fs::write(&path, "{}")?;

        let memoizer = Memoizer::new();
        {
            let scope = memoizer.acquire()?;
            scope.read_to_string(&path)?;
            scope.canonicalize(temp_dir.path())?;
            scope.kind(&path);
            scope.memoize("ns", "key", || 1_u8);
            assert_eq!(memoizer.entry_count(), 4);
            scope.release();
        }
        assert_eq!(memoizer.entry_count(), 0);
        assert!(memoizer.is_freed());
        Ok(())
    }

    #[test]
    fn test_drop_releases_on_early_return() -> anyhow::Result<()> {
        fn bail_out(memoizer: &Memoizer) -> Result<(), String> {
            let scope = memoizer.acquire().map_err(|e| e.to_string())?;
            scope.memoize("ns", "partial", || String::from("half done"));
            Err("cancelled".to_string())
        }

        let memoizer = Memoizer::new();
        assert!(bail_out(&memoizer).is_err());
        assert!(memoizer.is_freed());
        Ok(())
    }
}
