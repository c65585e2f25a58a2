//! Fixtures shared by the unit tests.

use crate::db::Database;
use crate::deadline::Deadline;
use crate::generation::DocumentGenerator;
use crate::render::{DocumentRenderer, RenderError};
use crate::services::AppState;
use crate::storage::local::LocalFsStorage;
use crate::storage::signing::UrlSigner;
use crate::storage::{Area, ObjectStorage};
use crate::templates::TemplateRepository;
use crate::workflows::CaseService;
use async_trait::async_trait;
use common::model::template::TemplateKind;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Writes a minimal docx whose body is `body_xml`.
pub fn write_docx(path: &Path, body_xml: &str) {
    let file = std::fs::File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(br#"<?xml version="1.0" encoding="UTF-8"?><Types/>"#)
        .unwrap();
    zip.start_file("word/document.xml", options).unwrap();
    write!(
        zip,
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document><w:body>{}</w:body></w:document>"#,
        body_xml
    )
    .unwrap();
    zip.finish().unwrap();
}

/// Bytes of a minimal docx, for uploads.
pub fn docx_bytes(body_xml: &str) -> Vec<u8> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("t.docx");
    write_docx(&path, body_xml);
    std::fs::read(path).unwrap()
}

/// Writes an executable shell script and returns its path.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> String {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}

/// Renderer that writes a fake PDF numbered by call and records every call.
#[derive(Default)]
pub struct CountingRenderer {
    calls: AtomicUsize,
    last_data: Mutex<Option<serde_json::Value>>,
    delay: Mutex<Duration>,
}

impl CountingRenderer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Makes every following PDF render wait `delay` before writing.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn last_data(&self) -> Option<serde_json::Value> {
        self.last_data.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentRenderer for CountingRenderer {
    async fn render(
        &self,
        data: &serde_json::Value,
        _template_path: &Path,
        output_path: &Path,
    ) -> Result<(), RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_data.lock().unwrap() = Some(data.clone());
        std::fs::write(output_path, b"PK fake docx")?;
        Ok(())
    }

    async fn render_as_pdf(
        &self,
        data: &serde_json::Value,
        _template_path: &Path,
        output_path: &Path,
    ) -> Result<(), RenderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_data.lock().unwrap() = Some(data.clone());
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        std::fs::write(output_path, format!("%PDF-1.4 #{} {}", call, data))?;
        Ok(())
    }
}

/// A case service over temporary storage, database and scratch directory,
/// with every template uploaded and a [`CountingRenderer`].
pub struct TestEnv {
    pub dir: tempfile::TempDir,
    pub storage: Arc<LocalFsStorage>,
    pub renderer: Arc<CountingRenderer>,
    pub signer: Arc<UrlSigner>,
    pub db: Database,
    pub templates: TemplateRepository,
    pub service: CaseService,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let scratch = dir.path().join("scratch");
        std::fs::create_dir_all(&scratch).unwrap();
        let storage =
            Arc::new(LocalFsStorage::new(dir.path().join("store"), Duration::from_secs(3600)).unwrap());
        let renderer = Arc::new(CountingRenderer::default());
        let signer = Arc::new(
            UrlSigner::new("http://jf.test", b"test-secret", Duration::from_secs(900)).unwrap(),
        );
        let db = Database::open(dir.path().join("jf.sqlite")).unwrap();
        let templates = TemplateRepository::new(storage.clone(), &scratch);
        for kind in TemplateKind::ALL {
            let body = docx_bytes("<w:t>{{nama}}</w:t>");
            templates.upload(kind, &mut body.as_slice()).unwrap();
        }
        let generator = DocumentGenerator::new(
            storage.clone(),
            templates.clone(),
            renderer.clone(),
            &scratch,
        );
        let service = CaseService::new(
            db.clone(),
            storage.clone(),
            signer.clone(),
            generator,
        );
        Self {
            dir,
            storage,
            renderer,
            signer,
            db,
            templates,
            service,
        }
    }

    /// Stores an upload in the temp area, as a signed PUT would.
    pub fn put_temp(&self, key: &str, bytes: &[u8]) {
        let content_type = mime_guess::from_path(key).first_or_octet_stream();
        self.storage
            .put(Area::Temp, key, content_type.as_ref(), &mut &bytes[..])
            .unwrap();
    }

    /// Handler state over this environment.
    pub fn app_state(&self) -> AppState {
        AppState {
            cases: self.service.clone(),
            storage: self.storage.clone(),
            signer: self.signer.clone(),
            templates: self.templates.clone(),
            db: self.db.clone(),
            scratch_dir: self.dir.path().join("scratch"),
            request_timeout: Duration::from_secs(10),
            max_upload_bytes: 1024 * 1024,
        }
    }

    pub fn case_count(&self) -> i64 {
        let deadline = Deadline::after(Duration::from_secs(5));
        let conn = self.db.connect(&deadline).unwrap();
        conn.query_row("SELECT COUNT(*) FROM cases", [], |row| row.get(0))
            .unwrap()
    }
}
