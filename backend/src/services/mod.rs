//! HTTP surface of the backend.
//!
//! Each sub-module exposes a `configure_routes()` scope. Handlers translate
//! HTTP into calls on the shared [`AppState`] and hand failures to the
//! injected [`ErrorTaxonomy`](crate::error::ErrorTaxonomy).

pub mod cases;
pub mod maintenance;
pub mod storage;
pub mod templates;

use crate::db::Database;
use crate::deadline::Deadline;
use crate::storage::signing::UrlSigner;
use crate::storage::ObjectStorage;
use crate::templates::TemplateRepository;
use crate::workflows::CaseService;
use actix_web::web;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Everything handlers need, shared as `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub cases: CaseService,
    pub storage: Arc<dyn ObjectStorage>,
    pub signer: Arc<UrlSigner>,
    pub templates: TemplateRepository,
    pub db: Database,
    pub scratch_dir: PathBuf,
    pub request_timeout: Duration,
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Deadline for one request, starting now.
    pub fn deadline(&self) -> Deadline {
        Deadline::after(self.request_timeout)
    }
}

/// Registers every API scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(storage::configure_routes())
        .service(templates::configure_routes())
        .service(cases::configure_routes())
        .service(maintenance::configure_routes());
}
