//! Storage maintenance jobs.
//!
//! - `POST /api/maintenance/reconcile`: starts a background sweep that purges
//!   expired uploads and compares permanent storage with the database. It
//!   returns a `job_id` immediately.
//! - `GET /api/maintenance/status/{job_id}`: the current `JobStatus` of a job.
//!   A completed sweep carries its `ReconcileReport` as JSON.

use actix_web::web::{get, post, scope};
use actix_web::Scope;

mod get_status;
mod reconcile;

const API_PATH: &str = "/api/maintenance";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/reconcile", post().to(reconcile::process))
        .route("/status/{job_id}", get().to(get_status::process))
}
