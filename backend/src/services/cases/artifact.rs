use super::parse_workflow;
use crate::error::{AppError, ErrorTaxonomy};
use crate::services::AppState;
use actix_web::{web, HttpResponse, Responder};
use common::model::document::{ArtifactLink, Document};
use common::requests::ArtifactQuery;

/// `GET .../{id}/artifact?attendee_id=&regenerate=`
pub async fn download(
    state: web::Data<AppState>,
    taxonomy: web::Data<ErrorTaxonomy>,
    path: web::Path<(String, String)>,
    query: web::Query<ArtifactQuery>,
) -> impl Responder {
    let (workflow, id) = path.into_inner();
    match artifact_link(&state, &workflow, &id, query.into_inner()).await {
        Ok(link) => HttpResponse::Ok().json(link),
        Err(e) => taxonomy.respond(&e),
    }
}

async fn artifact_link(
    state: &AppState,
    workflow: &str,
    id: &str,
    query: ArtifactQuery,
) -> Result<ArtifactLink, AppError> {
    let workflow = parse_workflow(workflow)?;
    state
        .cases
        .artifact(workflow, id, query, &state.deadline())
        .await
}

/// `POST .../{id}/artifact/sign?attendee_id=`
pub async fn sign(
    state: web::Data<AppState>,
    taxonomy: web::Data<ErrorTaxonomy>,
    path: web::Path<(String, String)>,
    query: web::Query<ArtifactQuery>,
) -> impl Responder {
    let (workflow, id) = path.into_inner();
    match sign_document(&state, &workflow, &id, query.into_inner().attendee_id).await {
        Ok(document) => HttpResponse::Ok().json(document),
        Err(e) => taxonomy.respond(&e),
    }
}

async fn sign_document(
    state: &AppState,
    workflow: &str,
    id: &str,
    attendee_id: Option<String>,
) -> Result<Document, AppError> {
    let workflow = parse_workflow(workflow)?;
    state
        .cases
        .sign_artifact(workflow, id, attendee_id, &state.deadline())
        .await
}
