//! Status change handlers. Reject, revision, resubmit and publish accept an
//! empty body; accept requires the decision fields. A body that is present
//! must be valid JSON.

use super::parse_workflow;
use crate::error::{AppError, ErrorTaxonomy};
use crate::services::AppState;
use actix_web::{web, HttpResponse};
use common::model::case::TransitionOutcome;
use common::requests::{AcceptRequest, NoteRequest, ResubmitRequest};
use serde::de::DeserializeOwned;

type CasePath = web::Path<(String, String)>;

fn respond(taxonomy: &ErrorTaxonomy, result: Result<TransitionOutcome, AppError>) -> HttpResponse {
    match result {
        Ok(outcome) => HttpResponse::Ok().json(outcome),
        Err(e) => taxonomy.respond(&e),
    }
}

/// Defaults for an empty body, otherwise the body parsed as JSON.
fn optional_json<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("invalid JSON body: {}", e)))
}

pub async fn revision(
    state: web::Data<AppState>,
    taxonomy: web::Data<ErrorTaxonomy>,
    path: CasePath,
    body: web::Bytes,
) -> HttpResponse {
    let (workflow, id) = path.into_inner();
    let result = async {
        let workflow = parse_workflow(&workflow)?;
        let request: NoteRequest = optional_json(&body)?;
        state
            .cases
            .request_revision(workflow, &id, request, &state.deadline())
            .await
    }
    .await;
    respond(&taxonomy, result)
}

pub async fn resubmit(
    state: web::Data<AppState>,
    taxonomy: web::Data<ErrorTaxonomy>,
    path: CasePath,
    body: web::Bytes,
) -> HttpResponse {
    let (workflow, id) = path.into_inner();
    let result = async {
        let workflow = parse_workflow(&workflow)?;
        let request: ResubmitRequest = optional_json(&body)?;
        state
            .cases
            .resubmit(workflow, &id, request, &state.deadline())
            .await
    }
    .await;
    respond(&taxonomy, result)
}

pub async fn accept(
    state: web::Data<AppState>,
    taxonomy: web::Data<ErrorTaxonomy>,
    path: CasePath,
    body: web::Json<AcceptRequest>,
) -> HttpResponse {
    let (workflow, id) = path.into_inner();
    let result = async {
        let workflow = parse_workflow(&workflow)?;
        state
            .cases
            .accept(workflow, &id, body.into_inner(), &state.deadline())
            .await
    }
    .await;
    respond(&taxonomy, result)
}

pub async fn reject(
    state: web::Data<AppState>,
    taxonomy: web::Data<ErrorTaxonomy>,
    path: CasePath,
    body: web::Bytes,
) -> HttpResponse {
    let (workflow, id) = path.into_inner();
    let result = async {
        let workflow = parse_workflow(&workflow)?;
        let request: NoteRequest = optional_json(&body)?;
        state
            .cases
            .reject(workflow, &id, request, &state.deadline())
            .await
    }
    .await;
    respond(&taxonomy, result)
}

pub async fn publish(
    state: web::Data<AppState>,
    taxonomy: web::Data<ErrorTaxonomy>,
    path: CasePath,
) -> HttpResponse {
    let (workflow, id) = path.into_inner();
    let result = async {
        let workflow = parse_workflow(&workflow)?;
        state.cases.publish(workflow, &id, &state.deadline()).await
    }
    .await;
    respond(&taxonomy, result)
}
