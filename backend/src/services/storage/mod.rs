//! Direct client access to object storage.
//!
//! - `POST /api/storage/upload-url`: issues a temp key and a signed PUT URL
//!   for one upload. Only PDF, JPEG and PNG files are accepted.
//! - `PUT /api/storage/objects/temp/{key}`: receives the upload.
//! - `GET /api/storage/objects/{area}/{key}`: serves an object.
//!
//! Object routes require the `expires` and `signature` query parameters
//! produced by [`UrlSigner`](crate::storage::signing::UrlSigner).

use actix_web::web::{get, post, put, scope};
use actix_web::Scope;

mod objects;
mod upload_url;

const API_PATH: &str = "/api/storage";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/upload-url", post().to(upload_url::process))
        .route("/objects/{area}/{key:.*}", get().to(objects::download))
        .route("/objects/{area}/{key:.*}", put().to(objects::upload))
}
