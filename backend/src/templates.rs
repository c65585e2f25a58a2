//! Template repository.
//!
//! One docx per [`TemplateKind`] lives in permanent storage under
//! `templates/{kind}.docx`. Uploading replaces it; there is no history, so
//! every render fetches the current copy again.

use crate::error::AppError;
use crate::storage::{Area, ObjectMetadata, ObjectStorage, StorageError};
use common::model::template::TemplateKind;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::NamedTempFile;

#[derive(Clone)]
pub struct TemplateRepository {
    storage: Arc<dyn ObjectStorage>,
    scratch_dir: PathBuf,
}

pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

impl TemplateRepository {
    pub fn new(storage: Arc<dyn ObjectStorage>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage,
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Copies the current template into a scratch file removed on drop.
    pub fn fetch(&self, kind: TemplateKind) -> Result<NamedTempFile, AppError> {
        let mut reader = match self.storage.get(Area::Permanent, &kind.storage_key()) {
            Ok(reader) => reader,
            Err(StorageError::NotFound(_)) => {
                return Err(AppError::NotFound(format!("template '{}'", kind)))
            }
            Err(e) => return Err(e.into()),
        };
        let mut local = tempfile::Builder::new()
            .prefix("template-")
            .suffix(".docx")
            .tempfile_in(&self.scratch_dir)?;
        io::copy(&mut reader, local.as_file_mut())?;
        Ok(local)
    }

    /// Replaces the template of `kind`.
    pub fn upload(&self, kind: TemplateKind, body: &mut dyn Read) -> Result<ObjectMetadata, AppError> {
        let metadata = self
            .storage
            .put(Area::Permanent, &kind.storage_key(), DOCX_CONTENT_TYPE, body)?;
        log::info!("template {} replaced ({} bytes)", kind, metadata.content_length);
        Ok(metadata)
    }

    pub fn exists(&self, kind: TemplateKind) -> Result<bool, AppError> {
        match self.storage.metadata(Area::Permanent, &kind.storage_key()) {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
