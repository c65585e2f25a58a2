//! Filesystem implementation of [`ObjectStorage`].
//!
//! Each area is a directory below the storage root. Object metadata lives in a
//! JSON sidecar next to the data file (`<key>.meta.json`). Data and sidecar are
//! written to a temporary file in the target directory first and then persisted
//! by rename, so readers never observe a half written object.

use crate::storage::{Area, ObjectMetadata, ObjectStorage, StorageError};
use chrono::Utc;
use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;

const META_SUFFIX: &str = ".meta.json";
const CHUNK_SIZE: usize = 64 * 1024;

pub struct LocalFsStorage {
    root: PathBuf,
    temp_ttl: Duration,
}

impl LocalFsStorage {
    /// Creates the area directories below `root` when missing.
    pub fn new(root: impl Into<PathBuf>, temp_ttl: Duration) -> Result<Self, StorageError> {
        let root = root.into();
        for area in [Area::Temp, Area::Permanent] {
            let dir = root.join(area.as_str());
            fs::create_dir_all(&dir).map_err(|e| StorageError::io(area.as_str(), e))?;
        }
        Ok(Self { root, temp_ttl })
    }

    fn area_dir(&self, area: Area) -> PathBuf {
        self.root.join(area.as_str())
    }

    fn object_path(&self, area: Area, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.area_dir(area).join(key))
    }

    fn is_expired(&self, meta: &ObjectMetadata) -> bool {
        let age = Utc::now().signed_duration_since(meta.created_at);
        age.to_std().map(|age| age > self.temp_ttl).unwrap_or(false)
    }

    fn read_metadata(&self, area: Area, key: &str) -> Result<ObjectMetadata, StorageError> {
        let path = self.object_path(area, key)?;
        let raw = match fs::read(meta_path(&path)) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => return Err(StorageError::io(key, e)),
        };
        if !path.is_file() {
            return Err(StorageError::NotFound(key.to_string()));
        }
        let meta: ObjectMetadata =
            serde_json::from_slice(&raw).map_err(|source| StorageError::Metadata {
                key: key.to_string(),
                source,
            })?;
        if area == Area::Temp && self.is_expired(&meta) {
            return Err(StorageError::NotFound(key.to_string()));
        }
        Ok(meta)
    }

    fn collect_keys(&self, dir: &Path, base: &Path, keys: &mut Vec<String>) -> Result<(), StorageError> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(StorageError::io(&dir.to_string_lossy(), e)),
        };
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::io(&dir.to_string_lossy(), e))?;
            let path = entry.path();
            if path.is_dir() {
                self.collect_keys(&path, base, keys)?;
                continue;
            }
            let Ok(relative) = path.strip_prefix(base) else {
                continue;
            };
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            if key.ends_with(META_SUFFIX) || key.starts_with(".tmp") || key.contains("/.tmp") {
                continue;
            }
            keys.push(key);
        }
        Ok(())
    }
}

impl ObjectStorage for LocalFsStorage {
    fn get(&self, area: Area, key: &str) -> Result<Box<dyn Read + Send>, StorageError> {
        self.read_metadata(area, key)?;
        let path = self.object_path(area, key)?;
        match File::open(&path) {
            Ok(file) => Ok(Box::new(file)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(key.to_string())),
            Err(e) => Err(StorageError::io(key, e)),
        }
    }

    fn put(
        &self,
        area: Area,
        key: &str,
        content_type: &str,
        body: &mut dyn Read,
    ) -> Result<ObjectMetadata, StorageError> {
        let path = self.object_path(area, key)?;
        let parent = path
            .parent()
            .ok_or_else(|| StorageError::InvalidKey(key.to_string()))?;
        fs::create_dir_all(parent).map_err(|e| StorageError::io(key, e))?;

        let mut data = NamedTempFile::new_in(parent).map_err(|e| StorageError::io(key, e))?;
        let mut hasher = md5::Context::new();
        let mut content_length = 0u64;
        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            let n = match body.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(StorageError::io(key, e)),
            };
            hasher.consume(&buf[..n]);
            data.write_all(&buf[..n])
                .map_err(|e| StorageError::io(key, e))?;
            content_length += n as u64;
        }

        let meta = ObjectMetadata {
            content_type: content_type.to_string(),
            content_length,
            md5: format!("{:x}", hasher.finalize()),
            created_at: Utc::now(),
        };
        let mut sidecar = NamedTempFile::new_in(parent).map_err(|e| StorageError::io(key, e))?;
        serde_json::to_writer(&mut sidecar, &meta).map_err(|source| StorageError::Metadata {
            key: key.to_string(),
            source,
        })?;

        data.persist(&path)
            .map_err(|e| StorageError::io(key, e.error))?;
        sidecar
            .persist(meta_path(&path))
            .map_err(|e| StorageError::io(key, e.error))?;
        Ok(meta)
    }

    fn metadata(&self, area: Area, key: &str) -> Result<ObjectMetadata, StorageError> {
        self.read_metadata(area, key)
    }

    fn copy(&self, temp_key: &str, permanent_key: &str) -> Result<ObjectMetadata, StorageError> {
        validate_key(permanent_key)?;
        let meta = match self.read_metadata(Area::Temp, temp_key) {
            Ok(meta) => meta,
            Err(StorageError::NotFound(_)) => {
                return Err(StorageError::TempNotFound(temp_key.to_string()))
            }
            Err(e) => return Err(e),
        };
        let mut source = match self.get(Area::Temp, temp_key) {
            Ok(source) => source,
            Err(StorageError::NotFound(_)) => {
                return Err(StorageError::TempNotFound(temp_key.to_string()))
            }
            Err(e) => return Err(e),
        };
        self.put(Area::Permanent, permanent_key, &meta.content_type, &mut source)
    }

    fn delete(&self, area: Area, key: &str) -> Result<(), StorageError> {
        let path = self.object_path(area, key)?;
        for target in [meta_path(&path), path] {
            match fs::remove_file(&target) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(StorageError::io(key, e)),
            }
        }
        Ok(())
    }

    fn list(&self, area: Area, prefix: &str) -> Result<Vec<String>, StorageError> {
        let base = self.area_dir(area);
        let mut keys = Vec::new();
        self.collect_keys(&base, &base, &mut keys)?;
        keys.retain(|key| key.starts_with(prefix));
        keys.sort();
        Ok(keys)
    }

    fn purge_expired_temp(&self) -> Result<usize, StorageError> {
        let mut purged = 0;
        for key in self.list(Area::Temp, "")? {
            let expired = match self.read_metadata(Area::Temp, &key) {
                Ok(_) => false,
                Err(StorageError::NotFound(_)) | Err(StorageError::Metadata { .. }) => true,
                Err(e) => return Err(e),
            };
            if expired {
                self.delete(Area::Temp, &key)?;
                purged += 1;
            }
        }
        Ok(purged)
    }
}

fn meta_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(META_SUFFIX);
    PathBuf::from(name)
}

/// Keys are relative, `/` separated and never escape their area.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let invalid = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.ends_with(META_SUFFIX)
        || key
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == ".." || segment.starts_with(".tmp"));
    if invalid {
        Err(StorageError::InvalidKey(key.to_string()))
    } else {
        Ok(())
    }
}
