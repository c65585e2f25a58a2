//! # Template Service Module
//!
//! Endpoints managing the docx templates the renderer fills, one per
//! [`TemplateKind`](common::model::template::TemplateKind).
//!
//! ## Sub-modules:
//! - `upload`: Replaces a template from a multipart upload after checking its
//!   placeholder syntax.
//! - `get`: Hands out a signed download URL of the current template.

mod get;
mod upload;

use actix_web::web::{get, put, scope};
use actix_web::Scope;

/// The base path for all template-related API endpoints.
const API_PATH: &str = "/api/templates";

/// Configures and returns the Actix `Scope` for all template-related routes.
///
/// # Registered Routes:
///
/// *   **`PUT /{kind}`**:
///     - **Handler**: `upload::process`
///     - **Description**: Expects a multipart body with a `file` field holding
///       a `.docx`. Answers `422` when a placeholder is malformed and reports
///       whether the stored template was already identical.
///
/// *   **`GET /{kind}`**:
///     - **Handler**: `get::process`
///     - **Description**: Returns a signed URL of the template, or `404` when
///       none has been uploaded.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/{kind}", put().to(upload::process))
        .route("/{kind}", get().to(get::process))
}
