//! Promotion of uploaded files from the temp area into permanent storage.
//!
//! Recording the promoted file in the relational store is the caller's job;
//! callers run promotion inside the same database transaction as the row
//! insert so a failed insert rolls the case back.

use crate::storage::{Area, ObjectMetadata, ObjectStorage, StorageError};

#[derive(Debug, Clone, PartialEq)]
pub struct PromotedFile {
    pub temp_key: String,
    pub permanent_key: String,
    pub metadata: ObjectMetadata,
}

impl PromotedFile {
    /// File name part of the permanent key.
    pub fn basename(&self) -> &str {
        self.permanent_key
            .rsplit('/')
            .next()
            .unwrap_or(&self.permanent_key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromotionRequest {
    pub temp_key: String,
    pub permanent_key: String,
}

/// Copies one temp object to its permanent key.
pub fn save_file(
    storage: &dyn ObjectStorage,
    temp_key: &str,
    permanent_key: &str,
) -> Result<PromotedFile, StorageError> {
    let metadata = storage.copy(temp_key, permanent_key)?;
    log::debug!("promoted {} -> {}", temp_key, permanent_key);
    Ok(PromotedFile {
        temp_key: temp_key.to_string(),
        permanent_key: permanent_key.to_string(),
        metadata,
    })
}

/// Promotes a batch. Every temp key is resolved before the first copy, so a
/// single missing upload fails the whole batch and nothing is promoted.
pub fn save_files(
    storage: &dyn ObjectStorage,
    requests: &[PromotionRequest],
) -> Result<Vec<PromotedFile>, StorageError> {
    for request in requests {
        match storage.metadata(Area::Temp, &request.temp_key) {
            Ok(_) => {}
            Err(StorageError::NotFound(_)) => {
                return Err(StorageError::TempNotFound(request.temp_key.clone()))
            }
            Err(e) => return Err(e),
        }
    }
    requests
        .iter()
        .map(|request| save_file(storage, &request.temp_key, &request.permanent_key))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::local::LocalFsStorage;
    use std::io::Cursor;
    use std::time::Duration;

    fn request(temp: &str, permanent: &str) -> PromotionRequest {
        PromotionRequest {
            temp_key: temp.to_string(),
            permanent_key: permanent.to_string(),
        }
    }

    #[test]
    fn batch_with_a_missing_upload_promotes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFsStorage::new(dir.path(), Duration::from_secs(60)).unwrap();
        storage
            .put(Area::Temp, "present.pdf", "application/pdf", &mut Cursor::new(b"a"))
            .unwrap();

        let err = save_files(
            &storage,
            &[
                request("present.pdf", "dismissal/C1-doc0.pdf"),
                request("missing.pdf", "dismissal/C1-doc1.pdf"),
            ],
        )
        .unwrap_err();

        assert!(matches!(err, StorageError::TempNotFound(key) if key == "missing.pdf"));
        assert!(storage.list(Area::Permanent, "").unwrap().is_empty());
    }

    #[test]
    fn batch_promotes_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFsStorage::new(dir.path(), Duration::from_secs(60)).unwrap();
        for key in ["a.pdf", "b.jpg"] {
            storage
                .put(Area::Temp, key, "application/octet-stream", &mut Cursor::new(key.as_bytes()))
                .unwrap();
        }
        let promoted = save_files(
            &storage,
            &[request("a.pdf", "promotion/C2-doc0.pdf"), request("b.jpg", "promotion/C2-doc1.jpg")],
        )
        .unwrap();
        assert_eq!(promoted.len(), 2);
        assert_eq!(promoted[1].basename(), "C2-doc1.jpg");
        assert_eq!(
            storage.list(Area::Permanent, "promotion/").unwrap(),
            vec!["promotion/C2-doc0.pdf", "promotion/C2-doc1.jpg"]
        );
    }
}
