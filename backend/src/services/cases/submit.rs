use super::parse_workflow;
use crate::error::{AppError, ErrorTaxonomy};
use crate::services::AppState;
use actix_web::{web, HttpResponse, Responder};
use common::model::case::CaseRecord;
use common::requests::SubmitCaseRequest;

pub async fn process(
    state: web::Data<AppState>,
    taxonomy: web::Data<ErrorTaxonomy>,
    workflow: web::Path<String>,
    body: web::Json<SubmitCaseRequest>,
) -> impl Responder {
    match submit_case(&state, &workflow, body.into_inner()).await {
        Ok(case) => HttpResponse::Created().json(case),
        Err(e) => taxonomy.respond(&e),
    }
}

async fn submit_case(
    state: &AppState,
    workflow: &str,
    request: SubmitCaseRequest,
) -> Result<CaseRecord, AppError> {
    let workflow = parse_workflow(workflow)?;
    state.cases.submit(workflow, request, &state.deadline()).await
}
