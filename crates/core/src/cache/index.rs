//! Cache directory lifecycle and the in-memory request index.
//!
//! The index lives in memory between [`HttpCache::open`] and
//! [`HttpCache::close`]. Entries added in between are only durable after a
//! successful [`HttpCache::flush`] or close.

use super::entry::CacheEntry;
use super::store::{ContentStore, write_json_atomic};
use crate::Error;
use crate::request::Request;
use crate::response::Response;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the index inside the cache directory.
pub const INDEX_FILE: &str = "index.json";

const INDEX_VERSION: u32 = 1;

#[derive(Serialize)]
struct IndexFileRef<'a> {
    version: u32,
    entries: Vec<IndexRecordRef<'a>>,
}

#[derive(Serialize)]
struct IndexRecordRef<'a> {
    request: &'a Request,
    entry: &'a CacheEntry,
}

#[derive(Deserialize)]
struct IndexFile {
    version: u32,
    entries: Vec<IndexRecord>,
}

#[derive(Deserialize)]
struct IndexRecord {
    request: Request,
    entry: CacheEntry,
}

/// A disk-backed HTTP response cache.
///
/// Holds at most one entry per request identity (see [`Request::cache_key`]).
/// Every method takes the cache by reference, so one lookup-then-update
/// sequence completes before another caller can touch the index.
#[derive(Debug)]
pub struct HttpCache {
    dir: PathBuf,
    store: ContentStore,
    index: BTreeMap<Request, CacheEntry>,
    dirty: bool,
}

impl HttpCache {
    /// Open the cache rooted at `dir`.
    ///
    /// Creates the directory if it doesn't exist and loads the index file if
    /// one is present. Content files left behind by a session that never
    /// flushed are removed.
    ///
    /// # Errors
    ///
    /// - [`Error::Configuration`] if `dir` exists but is not a directory
    /// - [`Error::Storage`] if the directory or index cannot be read
    /// - [`Error::Corrupt`] if the index file cannot be decoded
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, Error> {
        let dir = dir.as_ref();

        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| Error::storage(dir, e))?;
        }
        if !dir.is_dir() {
            return Err(Error::Configuration(format!("{} is not a directory", dir.display())));
        }
        let dir = fs::canonicalize(dir).map_err(|e| Error::storage(dir, e))?;

        let store = ContentStore::new(dir.clone());
        match store.remove_temp_files() {
            Ok(0) => {}
            Ok(removed) => tracing::warn!(removed, "removed leftover temp files from cache dir"),
            Err(e) => tracing::warn!(error = %e, "failed to sweep cache temp files"),
        }

        let index_path = dir.join(INDEX_FILE);
        let index = if index_path.is_file() { load_index(&index_path)? } else { BTreeMap::new() };

        let referenced: HashSet<PathBuf> = index.values().map(|entry| entry.path.clone()).collect();
        match store.remove_unreferenced(&referenced, &index_path) {
            Ok(0) => {}
            Ok(removed) => tracing::warn!(removed, "removed content files not referenced by the index"),
            Err(e) => tracing::warn!(error = %e, "failed to sweep unreferenced content files"),
        }

        tracing::debug!("opened cache at {} with {} entries", dir.display(), index.len());

        Ok(Self { dir, store, index, dirty: false })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Store `response` for `request`, replacing any existing entry.
    ///
    /// The previous entry's content file is removed before the new one is
    /// written. On a write failure nothing is inserted.
    pub fn put(&mut self, request: Request, response: Response) -> Result<(), Error> {
        if self.delete(&request) {
            tracing::debug!("replacing cached entry for {}", request.url);
        }

        let path = self.store.write(&response)?;
        let entry = CacheEntry::new(response, path, chrono::Utc::now().timestamp());
        self.index.insert(request, entry);
        self.dirty = true;
        Ok(())
    }

    /// Look up the entry for `request` without judging its freshness.
    pub fn find(&self, request: &Request) -> Option<&CacheEntry> {
        self.index.get(request)
    }

    /// Mutable lookup. Refreshing the returned entry marks the cache dirty.
    pub fn find_mut(&mut self, request: &Request) -> Option<&mut CacheEntry> {
        self.index.get_mut(request)
    }

    /// Whether the in-memory index differs from the last flushed one.
    pub fn is_dirty(&self) -> bool {
        self.dirty || self.index.values().any(CacheEntry::is_modified)
    }

    /// Remove the entry for `request` and its content file.
    ///
    /// A content file that is already gone is not an error; other removal
    /// failures are logged and the index entry is dropped regardless.
    /// Returns whether an entry existed.
    pub fn delete(&mut self, request: &Request) -> bool {
        let Some(entry) = self.index.remove(request) else {
            return false;
        };
        self.dirty = true;

        match ContentStore::remove(entry.path()) {
            Ok(true) => {}
            Ok(false) => tracing::debug!("content file {} already missing", entry.path().display()),
            Err(e) => tracing::warn!(error = %e, "failed to remove cached content file"),
        }
        true
    }

    /// Iterate over all entries in derived-key order.
    pub fn iter(&self) -> impl Iterator<Item = (&Request, &CacheEntry)> {
        self.index.iter()
    }

    /// Write the full index to disk, replacing the previous index file.
    pub fn flush(&mut self) -> Result<(), Error> {
        let index_path = self.index_path();
        let file = IndexFileRef {
            version: INDEX_VERSION,
            entries: self
                .index
                .iter()
                .map(|(request, entry)| IndexRecordRef { request, entry })
                .collect(),
        };
        write_json_atomic(&self.dir, &index_path, &file)?;
        self.dirty = false;
        self.index.values_mut().for_each(CacheEntry::mark_flushed);

        tracing::debug!("flushed {} cache entries to {}", self.index.len(), index_path.display());
        Ok(())
    }

    /// Flush the index and release the cache.
    pub fn close(mut self) -> Result<(), Error> {
        self.flush()
    }
}

impl Drop for HttpCache {
    fn drop(&mut self) {
        if self.is_dirty() {
            tracing::warn!(
                dir = %self.dir.display(),
                entries = self.index.len(),
                "cache dropped without close; unflushed index changes are lost"
            );
        }
    }
}

fn load_index(path: &Path) -> Result<BTreeMap<Request, CacheEntry>, Error> {
    let data = fs::read(path).map_err(|e| Error::storage(path, e))?;
    let file: IndexFile =
        serde_json::from_slice(&data).map_err(|e| Error::Corrupt { path: path.to_path_buf(), reason: e.to_string() })?;

    if file.version != INDEX_VERSION {
        return Err(Error::Corrupt {
            path: path.to_path_buf(),
            reason: format!("unsupported index version {}", file.version),
        });
    }

    Ok(file
        .entries
        .into_iter()
        .map(|record| (record.request, record.entry))
        .collect())
}
