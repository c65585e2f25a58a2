//! Case endpoints for every workflow.
//!
//! The first path segment names the workflow (`activity`, `requirement`,
//! `dismissal`, `promotion`, `promotion-cpns`, `assessment-team`). A case
//! looked up under another workflow than its own is reported as not found.
//!
//! - `POST /api/cases/{workflow}`: submit a case with its uploaded documents.
//! - `GET /api/cases/{workflow}/{id}`: the case and its documents.
//! - `POST .../{id}/revision|resubmit|accept|reject|publish`: status changes.
//! - `GET .../{id}/artifact`: signed link to the generated PDF, rendering it
//!   on a cache miss.
//! - `POST .../{id}/artifact/sign`: marks the generated PDF as signed.

use crate::error::AppError;
use actix_web::web::{get, post, scope};
use actix_web::Scope;
use common::model::case::WorkflowKind;

mod artifact;
mod detail;
mod submit;
mod transition;

const API_PATH: &str = "/api/cases";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/{workflow}", post().to(submit::process))
        .route("/{workflow}/{id}", get().to(detail::process))
        .route("/{workflow}/{id}/revision", post().to(transition::revision))
        .route("/{workflow}/{id}/resubmit", post().to(transition::resubmit))
        .route("/{workflow}/{id}/accept", post().to(transition::accept))
        .route("/{workflow}/{id}/reject", post().to(transition::reject))
        .route("/{workflow}/{id}/publish", post().to(transition::publish))
        .route("/{workflow}/{id}/artifact", get().to(artifact::download))
        .route("/{workflow}/{id}/artifact/sign", post().to(artifact::sign))
}

fn parse_workflow(segment: &str) -> Result<WorkflowKind, AppError> {
    segment
        .parse()
        .map_err(|_| AppError::NotFound(format!("workflow '{}'", segment)))
}
