//! The document mods run against: the app config plus the loaded native
//! project files, and the write-back of whatever changed.

use crate::errors::ModError;
use crate::expo_config::ExpoConfig;
use crate::registry::{ModKey, ModResult, ResultKind};
use crate::resources::ResourceXml;
use autolink_config::MemoScope;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ModConfig {
    pub expo: ExpoConfig,
    project_root: PathBuf,
    results: BTreeMap<ModKey, ModResult>,
    snapshot: BTreeMap<ModKey, ModResult>,
}

impl ModConfig {
    pub fn new(expo: ExpoConfig, project_root: PathBuf) -> Self {
        ModConfig {
            expo,
            project_root,
            results: BTreeMap::new(),
            snapshot: BTreeMap::new(),
        }
    }

    /// Read `app.json` from the project root
    pub fn load(project_root: &Path, scope: &MemoScope<'_>) -> Result<Self, ModError> {
        let expo = ExpoConfig::load(project_root, scope)?;
        Ok(ModConfig::new(expo, project_root.to_path_buf()))
    }

    /// Load the files behind `keys`.
    ///
    /// A missing file loads as an empty document of its key's shape.
    pub fn load_results(
        &mut self,
        keys: impl IntoIterator<Item = ModKey>,
        scope: &MemoScope<'_>,
    ) -> Result<(), ModError> {
        let keys: BTreeSet<ModKey> = keys.into_iter().collect();
        for key in keys {
            let result = load_result(key, &key.path(&self.project_root), scope)?;
            self.insert_loaded(key, result);
        }
        Ok(())
    }

    /// Register a result as loaded from disk
    pub fn insert_loaded(&mut self, key: ModKey, result: ModResult) {
        self.snapshot.insert(key, result.clone());
        self.results.insert(key, result);
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn result(&self, key: ModKey) -> Option<&ModResult> {
        self.results.get(&key)
    }

    pub(crate) fn replace_result(&mut self, key: ModKey, result: ModResult) {
        self.results.insert(key, result);
    }

    /// Keys whose result differs from what was loaded
    pub fn changed_keys(&self) -> Vec<ModKey> {
        self.results
            .iter()
            .filter(|(key, result)| self.snapshot.get(*key) != Some(*result))
            .map(|(key, _)| *key)
            .collect()
    }

    /// Write every changed result back to its file.
    ///
    /// All contents are staged next to their targets first and only renamed
    /// into place once every stage succeeded. Each rename is atomic but the set
    /// is not: when a rename fails, files renamed before it keep their new
    /// contents and the remaining staged files are removed.
    pub fn write_changed(&self) -> Result<Vec<PathBuf>, ModError> {
        let mut staged: Vec<(PathBuf, PathBuf)> = Vec::new();
        for key in self.changed_keys() {
            let Some(result) = self.results.get(&key) else {
                continue;
            };
            let target = key.path(&self.project_root);
            match stage(&target, &serialize(result)) {
                Ok(temp) => staged.push((temp, target)),
                Err(e) => {
                    for (temp, _) in &staged {
                        let _ = fs::remove_file(temp);
                    }
                    return Err(e);
                }
            }
        }

        let mut written = Vec::with_capacity(staged.len());
        let mut pending = staged.into_iter();
        while let Some((temp, target)) = pending.next() {
            if let Err(source) = fs::rename(&temp, &target) {
                let _ = fs::remove_file(&temp);
                for (temp, _) in pending {
                    let _ = fs::remove_file(temp);
                }
                return Err(ModError::Io {
                    path: target,
                    source,
                });
            }
            debug!("Wrote {:?}", target);
            written.push(target);
        }
        info!("Wrote {} modified files", written.len());
        Ok(written)
    }
}

fn load_result(key: ModKey, path: &Path, scope: &MemoScope<'_>) -> Result<ModResult, ModError> {
    if !scope.is_file(path) {
        debug!("{:?} does not exist, starting from an empty document", path);
        return Ok(ModResult::empty(key));
    }
    let content = scope.read_to_string(path).map_err(|source| ModError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    match key.kind() {
        ResultKind::Resources => ResourceXml::parse(&content)
            .map(ModResult::Resources)
            .map_err(|source| ModError::Xml {
                path: path.to_path_buf(),
                source,
            }),
        ResultKind::Json => serde_json::from_str(&content)
            .map(ModResult::Json)
            .map_err(|source| ModError::Json {
                path: path.to_path_buf(),
                source,
            }),
    }
}

fn serialize(result: &ModResult) -> String {
    match result {
        ModResult::Resources(doc) => doc.to_xml_string(),
        ModResult::Json(value) => {
            let mut out = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
            out.push('\n');
            out
        }
    }
}

fn stage(target: &Path, contents: &str) -> Result<PathBuf, ModError> {
    let io_error = |source| ModError::Io {
        path: target.to_path_buf(),
        source,
    };
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    let mut temp_name = target.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp = target.with_file_name(temp_name);

    let file = fs::File::create(&temp).map_err(io_error)?;
    let mut writer = std::io::BufWriter::new(file);
    let written = writer
        .write_all(contents.as_bytes())
        .and_then(|()| writer.flush());
    if let Err(source) = written {
        let _ = fs::remove_file(&temp);
        return Err(io_error(source));
    }
    Ok(temp)
}
