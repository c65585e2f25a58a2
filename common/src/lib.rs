//! Types shared between the HTTP layer and the document pipeline: case and
//! document models, per-workflow payloads, renderer template data and the
//! request bodies accepted by the API.

pub mod jobs;
pub mod model;
pub mod requests;
