// src/upload.rs
//! Hands the finished fix log to an object store

use crate::{
    error::{GpsError, Result},
    sink::FixLog,
};
use log::info;
use std::path::{Component, Path, PathBuf};

/// Somewhere a finished log can be put under a bucket and key.
pub trait ObjectStore {
    fn put(&self, bucket: &str, key: &str, body: &[u8]) -> Result<()>;
}

/// Object store laid out as `root/<bucket>/<key>` on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        for name in [bucket, key] {
            let path = Path::new(name);
            if name.is_empty() || !path.components().all(|c| matches!(c, Component::Normal(_))) {
                return Err(GpsError::Upload(format!("invalid object name '{}'", name)));
            }
        }
        Ok(self.root.join(bucket).join(key))
    }
}

impl ObjectStore for LocalObjectStore {
    fn put(&self, bucket: &str, key: &str, body: &[u8]) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| GpsError::Upload(format!("Failed to create {}: {}", parent.display(), e)))?;
        }
        std::fs::write(&path, body)
            .map_err(|e| GpsError::Upload(format!("Failed to write {}: {}", path.display(), e)))?;
        Ok(())
    }
}

/// Read the whole log and put it, byte for byte, at `bucket`/`key`.
pub fn upload_log(store: &dyn ObjectStore, log: &FixLog, bucket: &str, key: &str) -> Result<usize> {
    let body = log.read_bytes()?;
    store.put(bucket, key, &body)?;
    info!("Uploaded {} ({} bytes) to {}/{}", log.path().display(), body.len(), bucket, key);
    Ok(body.len())
}
