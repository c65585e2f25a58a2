//! Lazy document generation with a permanent-storage cache.
//!
//! A generated document lives at a deterministic key. Before rendering, the
//! key is checked: a non-empty PDF there is reused as is, anything else is
//! rendered again. Rendering only fills a scratch file; callers decide when
//! the result replaces the stored object.

use crate::deadline::blocking;
use crate::error::AppError;
use crate::render::DocumentRenderer;
use crate::storage::{Area, ObjectMetadata, ObjectStorage, StorageError};
use crate::templates::TemplateRepository;
use common::model::template::TemplateKind;
use common::model::template_data::TemplateData;
use mime_guess::mime;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::NamedTempFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheCheck {
    Hit,
    Miss,
}

/// Decides whether the object at `key` can be served without rendering.
pub fn ensure_generated(
    storage: &dyn ObjectStorage,
    key: &str,
    force_regenerate: bool,
) -> Result<CacheCheck, StorageError> {
    if force_regenerate {
        return Ok(CacheCheck::Miss);
    }
    let metadata = match storage.metadata(Area::Permanent, key) {
        Ok(metadata) => metadata,
        Err(StorageError::NotFound(_)) => return Ok(CacheCheck::Miss),
        Err(e) => return Err(e),
    };
    let is_pdf = metadata
        .content_type
        .parse::<mime::Mime>()
        .map(|m| m.essence_str() == mime::APPLICATION_PDF.essence_str())
        .unwrap_or(false);
    if metadata.content_length > 0 && is_pdf {
        Ok(CacheCheck::Hit)
    } else {
        log::warn!(
            "cached object {} is unusable ({}, {} bytes), regenerating",
            key,
            metadata.content_type,
            metadata.content_length
        );
        Ok(CacheCheck::Miss)
    }
}

/// Template data checked and serialized for the renderer.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub template: TemplateKind,
    pub data: serde_json::Value,
}

impl RenderRequest {
    /// Fails with a client error naming every blank required field.
    pub fn new<D: TemplateData>(data: &D) -> Result<Self, AppError> {
        let missing = data.missing_fields();
        if !missing.is_empty() {
            return Err(AppError::BadRequest(format!(
                "missing required fields for {}: {}",
                data.template(),
                missing.join(", ")
            )));
        }
        Ok(Self {
            template: data.template(),
            data: serde_json::to_value(data)?,
        })
    }
}

/// A rendered PDF waiting in scratch space until it is stored.
pub struct RenderedPdf {
    template: TemplateKind,
    file: NamedTempFile,
}

impl RenderedPdf {
    /// Writes the PDF to `key` in permanent storage. Runs on the blocking pool.
    pub fn store(&self, storage: &dyn ObjectStorage, key: &str) -> Result<ObjectMetadata, AppError> {
        let mut file = File::open(self.file.path())?;
        let metadata = storage.put(Area::Permanent, key, mime::APPLICATION_PDF.as_ref(), &mut file)?;
        log::info!(
            "stored {} rendered from template {} ({} bytes)",
            key,
            self.template,
            metadata.content_length
        );
        Ok(metadata)
    }
}

#[derive(Clone)]
pub struct DocumentGenerator {
    storage: Arc<dyn ObjectStorage>,
    templates: TemplateRepository,
    renderer: Arc<dyn DocumentRenderer>,
    scratch_dir: PathBuf,
}

impl DocumentGenerator {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        templates: TemplateRepository,
        renderer: Arc<dyn DocumentRenderer>,
        scratch_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            storage,
            templates,
            renderer,
            scratch_dir: scratch_dir.into(),
        }
    }

    /// [`ensure_generated`] on the blocking pool.
    pub async fn check_cache(&self, key: &str, force_regenerate: bool) -> Result<CacheCheck, AppError> {
        let storage = self.storage.clone();
        let key = key.to_string();
        blocking(move || Ok(ensure_generated(storage.as_ref(), &key, force_regenerate)?)).await
    }

    /// Renders `request` into scratch space. Nothing is stored until
    /// [`RenderedPdf::store`] is called.
    pub async fn render(&self, request: &RenderRequest) -> Result<RenderedPdf, AppError> {
        let templates = self.templates.clone();
        let kind = request.template;
        let template = blocking(move || templates.fetch(kind)).await?;
        let output = tempfile::Builder::new()
            .prefix("rendered-")
            .suffix(".pdf")
            .tempfile_in(&self.scratch_dir)?;

        self.renderer
            .render_as_pdf(&request.data, template.path(), output.path())
            .await?;
        Ok(RenderedPdf {
            template: kind,
            file: output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::local::LocalFsStorage;
    use crate::test_support::CountingRenderer;
    use common::model::payload::DismissalPayload;
    use common::model::template_data::{AcceptanceLetterData, DocumentStamp};
    use std::io::Cursor;
    use std::time::Duration;

    struct Fixture {
        _dir: tempfile::TempDir,
        storage: Arc<LocalFsStorage>,
        renderer: Arc<CountingRenderer>,
        generator: DocumentGenerator,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let scratch = dir.path().join("scratch");
        std::fs::create_dir_all(&scratch).unwrap();
        let storage =
            Arc::new(LocalFsStorage::new(dir.path().join("store"), Duration::from_secs(60)).unwrap());
        let renderer = Arc::new(CountingRenderer::default());
        let templates = TemplateRepository::new(storage.clone(), &scratch);
        templates
            .upload(TemplateKind::AcceptanceLetter, &mut Cursor::new(b"docx"))
            .unwrap();
        let generator = DocumentGenerator::new(storage.clone(), templates, renderer.clone(), &scratch);
        Fixture {
            _dir: dir,
            storage,
            renderer,
            generator,
        }
    }

    fn request() -> RenderRequest {
        let dismissal = DismissalPayload {
            nama: "Rina".into(),
            nip: "199001012015032001".into(),
            jabatan_fungsional: "Analis Kepegawaian".into(),
            instansi: "BKN".into(),
            alasan: "Pensiun".into(),
            no_usulan: "U-1".into(),
            tgl_usulan: "2024-04-01".into(),
        };
        let stamp = DocumentStamp {
            no_dokumen: "800/1".into(),
            tgl_dokumen: "2024-05-01".into(),
        };
        RenderRequest::new(&AcceptanceLetterData::new(&dismissal, &stamp)).unwrap()
    }

    async fn render_and_store(fx: &Fixture, key: &str) {
        let rendered = fx.generator.render(&request()).await.unwrap();
        rendered.store(fx.storage.as_ref(), key).unwrap();
    }

    #[tokio::test]
    async fn stored_render_is_served_from_cache() {
        let fx = fixture();
        let key = "acceptance/C1.pdf";
        assert_eq!(fx.generator.check_cache(key, false).await.unwrap(), CacheCheck::Miss);

        render_and_store(&fx, key).await;
        assert_eq!(fx.generator.check_cache(key, false).await.unwrap(), CacheCheck::Hit);
        assert_eq!(fx.generator.check_cache(key, true).await.unwrap(), CacheCheck::Miss);
        assert_eq!(fx.renderer.calls(), 1);
        let meta = fx.storage.metadata(Area::Permanent, key).unwrap();
        assert_eq!(meta.content_type, "application/pdf");
        assert!(meta.content_length > 0);
    }

    #[tokio::test]
    async fn rendering_alone_stores_nothing() {
        let fx = fixture();
        let rendered = fx.generator.render(&request()).await.unwrap();
        assert_eq!(fx.renderer.calls(), 1);
        assert!(matches!(
            fx.storage.metadata(Area::Permanent, "acceptance/C1.pdf"),
            Err(StorageError::NotFound(_))
        ));
        drop(rendered);
    }

    #[tokio::test]
    async fn unusable_cached_object_is_replaced() {
        let fx = fixture();
        let key = "acceptance/C1.pdf";
        fx.storage
            .put(Area::Permanent, key, "text/plain", &mut Cursor::new(b"oops"))
            .unwrap();
        assert_eq!(fx.generator.check_cache(key, false).await.unwrap(), CacheCheck::Miss);

        render_and_store(&fx, key).await;
        assert_eq!(fx.generator.check_cache(key, false).await.unwrap(), CacheCheck::Hit);
        assert_eq!(
            fx.storage.metadata(Area::Permanent, key).unwrap().content_type,
            "application/pdf"
        );
    }

    #[tokio::test]
    async fn missing_template_stops_before_rendering() {
        let fx = fixture();
        let mut req = request();
        req.template = TemplateKind::Certificate;
        let err = match fx.generator.render(&req).await {
            Ok(_) => panic!("rendered without a template"),
            Err(e) => e,
        };
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(fx.renderer.calls(), 0);
    }

    #[test]
    fn cache_check_rules() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFsStorage::new(dir.path(), Duration::from_secs(60)).unwrap();
        assert_eq!(ensure_generated(&storage, "x/C.pdf", false).unwrap(), CacheCheck::Miss);

        storage
            .put(Area::Permanent, "x/C.pdf", "application/pdf; charset=binary", &mut Cursor::new(b"%PDF"))
            .unwrap();
        assert_eq!(ensure_generated(&storage, "x/C.pdf", false).unwrap(), CacheCheck::Hit);
        assert_eq!(ensure_generated(&storage, "x/C.pdf", true).unwrap(), CacheCheck::Miss);

        storage
            .put(Area::Permanent, "x/E.pdf", "application/pdf", &mut Cursor::new(b""))
            .unwrap();
        assert_eq!(ensure_generated(&storage, "x/E.pdf", false).unwrap(), CacheCheck::Miss);
    }

    #[test]
    fn blank_fields_are_rejected_before_rendering() {
        let dismissal = DismissalPayload {
            nama: "Rina".into(),
            nip: String::new(),
            jabatan_fungsional: "Analis".into(),
            instansi: "BKN".into(),
            alasan: "Pensiun".into(),
            no_usulan: "U-1".into(),
            tgl_usulan: String::new(),
        };
        let stamp = DocumentStamp {
            no_dokumen: String::new(),
            tgl_dokumen: "2024-05-01".into(),
        };
        let err = RenderRequest::new(&AcceptanceLetterData::new(&dismissal, &stamp)).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(m) if m.contains("nip") && m.contains("no_dokumen")));
    }
}
