//! # Object Storage
//!
//! Two storage areas back the document pipeline:
//!
//! - **temp**: client uploads land here through signed PUT URLs. Objects are
//!   time bounded and may be purged at any moment once they expire.
//! - **permanent**: promoted supporting documents, templates and generated
//!   PDFs. Keys in this area are derived from business identifiers (see
//!   [`keys`]) so any object can be located again without a lookup table.
//!
//! The [`ObjectStorage`] trait is the only surface the rest of the backend
//! uses. Calls are blocking and are executed on the blocking pool by callers.

pub mod keys;
pub mod local;
pub mod promotion;
pub mod signing;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Area {
    Temp,
    Permanent,
}

impl Area {
    pub fn as_str(self) -> &'static str {
        match self {
            Area::Temp => "temp",
            Area::Permanent => "permanent",
        }
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Area {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "temp" => Ok(Area::Temp),
            "permanent" => Ok(Area::Permanent),
            other => Err(StorageError::InvalidKey(format!("unknown area '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    pub content_type: String,
    pub content_length: u64,
    /// Hex MD5 of the object bytes, used as the ETag.
    pub md5: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    /// The source of a promotion is missing or expired in the temp area.
    #[error("temp file not found: {0}")]
    TempNotFound(String),

    #[error("invalid object key: {0}")]
    InvalidKey(String),

    #[error("storage IO error on '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt metadata for '{key}': {source}")]
    Metadata {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    pub(crate) fn io(key: &str, source: std::io::Error) -> Self {
        StorageError::Io {
            key: key.to_string(),
            source,
        }
    }
}

pub trait ObjectStorage: Send + Sync {
    /// Opens an object for reading.
    fn get(&self, area: Area, key: &str) -> Result<Box<dyn Read + Send>, StorageError>;

    /// Writes an object, replacing any previous object under the same key.
    fn put(
        &self,
        area: Area,
        key: &str,
        content_type: &str,
        body: &mut dyn Read,
    ) -> Result<ObjectMetadata, StorageError>;

    /// Fails with [`StorageError::NotFound`] when the object is absent.
    fn metadata(&self, area: Area, key: &str) -> Result<ObjectMetadata, StorageError>;

    /// Copies a temp object into the permanent area. Fails with
    /// [`StorageError::TempNotFound`] when the source is absent.
    fn copy(&self, temp_key: &str, permanent_key: &str) -> Result<ObjectMetadata, StorageError>;

    /// Removes an object. Removing an absent object is not an error.
    fn delete(&self, area: Area, key: &str) -> Result<(), StorageError>;

    /// Keys in an area starting with `prefix`, sorted.
    fn list(&self, area: Area, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Deletes expired temp objects and returns how many were removed.
    fn purge_expired_temp(&self) -> Result<usize, StorageError>;
}
