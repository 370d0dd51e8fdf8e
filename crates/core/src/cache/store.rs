//! Per-entry content files.
//!
//! Each cached response is written to its own randomly named file inside the
//! cache directory. Writes land in a `tmp_` file first and are renamed into
//! place, so a failed write never leaves a truncated content file behind.

use crate::Error;
use crate::response::Response;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

const CONTENT_EXTENSION: &str = "json";
const TEMP_PREFIX: &str = "tmp_";

/// Content file storage rooted at the cache directory.
#[derive(Debug, Clone)]
pub struct ContentStore {
    dir: PathBuf,
}

impl ContentStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist `response` under a fresh unique name and return its path.
    pub fn write(&self, response: &Response) -> Result<PathBuf, Error> {
        let path = self.dir.join(format!("{}.{CONTENT_EXTENSION}", Uuid::new_v4()));
        write_json_atomic(&self.dir, &path, response)?;
        tracing::debug!("stored {} ({} bytes body) at {}", response.url, response.text.len(), path.display());
        Ok(path)
    }

    /// Read the response stored at `path`.
    pub fn read(path: &Path) -> Result<Response, Error> {
        let data = fs::read(path).map_err(|e| Error::storage(path, e))?;
        serde_json::from_slice(&data).map_err(|e| Error::Corrupt { path: path.to_path_buf(), reason: e.to_string() })
    }

    /// Remove a content file.
    ///
    /// Returns `Ok(false)` when the file was already gone.
    pub fn remove(path: &Path) -> Result<bool, Error> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::storage(path, e)),
        }
    }

    /// Delete content files not listed in `referenced`.
    ///
    /// Only `*.json` files directly inside the store directory are
    /// candidates; `keep` names additional files to leave alone.
    pub fn remove_unreferenced(&self, referenced: &HashSet<PathBuf>, keep: &Path) -> Result<usize, Error> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir).map_err(|e| Error::storage(&self.dir, e))? {
            let path = entry.map_err(|e| Error::storage(&self.dir, e))?.path();
            let is_content = path.extension().and_then(|e| e.to_str()) == Some(CONTENT_EXTENSION);
            if !is_content || path == keep || referenced.contains(&path) || !path.is_file() {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => tracing::debug!("could not remove orphaned {}: {}", path.display(), e),
            }
        }
        Ok(removed)
    }

    /// Delete leftover temp files from writes interrupted by a crash.
    pub fn remove_temp_files(&self) -> Result<usize, Error> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir).map_err(|e| Error::storage(&self.dir, e))? {
            let path = entry.map_err(|e| Error::storage(&self.dir, e))?.path();
            let is_temp = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name.starts_with(TEMP_PREFIX));
            if is_temp && path.is_file() && fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Serialize `value` as JSON to `path` via a temp file in `dir`.
pub(crate) fn write_json_atomic<T: Serialize>(dir: &Path, path: &Path, value: &T) -> Result<(), Error> {
    let data = serde_json::to_vec(value).map_err(|e| Error::Serialize { path: path.to_path_buf(), source: e })?;
    let temp = dir.join(format!("{TEMP_PREFIX}{}", Uuid::new_v4()));

    let result = fs::File::create(&temp)
        .and_then(|mut file| {
            file.write_all(&data)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&temp, path));

    if let Err(e) = result {
        fs::remove_file(&temp).ok();
        return Err(Error::storage(path, e));
    }
    Ok(())
}
