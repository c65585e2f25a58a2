use super::parse_workflow;
use crate::error::{AppError, ErrorTaxonomy};
use crate::services::AppState;
use actix_web::{web, HttpResponse, Responder};
use common::model::case::CaseRecord;

pub async fn process(
    state: web::Data<AppState>,
    taxonomy: web::Data<ErrorTaxonomy>,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (workflow, id) = path.into_inner();
    match get_case(&state, &workflow, &id).await {
        Ok(case) => HttpResponse::Ok().json(case),
        Err(e) => taxonomy.respond(&e),
    }
}

async fn get_case(state: &AppState, workflow: &str, id: &str) -> Result<CaseRecord, AppError> {
    let workflow = parse_workflow(workflow)?;
    state.cases.get(workflow, id, &state.deadline()).await
}
