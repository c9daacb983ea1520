use super::DataLakeFileSystem;
use crate::error::{DatalakeError, Result};
use crate::paths::normalize_remote;
use crate::transfer::TransferOptions;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// In-process store. Directories are implicit: a path is a directory when
/// some file lives beneath it. Listing is sorted by name.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file, replacing any previous content.
    pub fn insert(&self, path: &str, data: impl Into<Vec<u8>>) {
        self.files.write().insert(normalize_remote(path).to_string(), data.into());
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.files.read().get(normalize_remote(path)).cloned()
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }

    fn is_dir(files: &BTreeMap<String, Vec<u8>>, dir: &str) -> bool {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        dir.is_empty() || files.keys().any(|k| k.starts_with(&prefix))
    }
}

impl DataLakeFileSystem for MemoryFileSystem {
    fn list(&self, path: &str) -> Result<Vec<String>> {
        let dir = normalize_remote(path).trim_end_matches('/');
        let files = self.files.read();
        if files.contains_key(dir) {
            return Ok(vec![dir.to_string()]);
        }
        if !Self::is_dir(&files, dir) {
            return Err(DatalakeError::NotFound(dir.to_string()));
        }
        let prefix = if dir.is_empty() { String::new() } else { format!("{dir}/") };
        let mut children = BTreeSet::new();
        for key in files.keys() {
            if let Some(rest) = key.strip_prefix(&prefix) {
                let child = rest.split('/').next().unwrap_or(rest);
                if !child.is_empty() {
                    children.insert(format!("{prefix}{child}"));
                }
            }
        }
        Ok(children.into_iter().collect())
    }

    fn exists(&self, path: &str) -> Result<bool> {
        let p = normalize_remote(path);
        let files = self.files.read();
        Ok(files.contains_key(p) || Self::is_dir(&files, p))
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.get(path).ok_or_else(|| DatalakeError::NotFound(normalize_remote(path).to_string()))
    }

    fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        self.insert(path, data);
        Ok(())
    }

    fn append(&self, path: &str, data: &[u8]) -> Result<()> {
        self.files
            .write()
            .entry(normalize_remote(path).to_string())
            .or_default()
            .extend_from_slice(data);
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<()> {
        let p = normalize_remote(path).trim_end_matches('/').to_string();
        let prefix = format!("{p}/");
        self.files.write().retain(|k, _| *k != p && !k.starts_with(&prefix));
        Ok(())
    }

    fn upload_bulk(&self, local: &Path, remote: &str, opts: &TransferOptions) -> Result<()> {
        if !opts.overwrite() && self.exists(remote)? {
            return Err(DatalakeError::AlreadyExists(remote.to_string()));
        }
        let data = fs::read(local).map_err(|e| DatalakeError::transfer(remote, e))?;
        self.insert(remote, data);
        Ok(())
    }

    fn download_bulk(&self, remote: &str, local: &Path, opts: &TransferOptions) -> Result<()> {
        if !opts.overwrite() && local.exists() {
            return Err(DatalakeError::AlreadyExists(local.display().to_string()));
        }
        let data = self.read(remote)?;
        if let Some(parent) = local.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| DatalakeError::io(parent, e))?;
        }
        fs::write(local, data).map_err(|e| DatalakeError::transfer(remote, e))
    }
}
