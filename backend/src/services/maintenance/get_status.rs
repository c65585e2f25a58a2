use crate::error::{AppError, ErrorTaxonomy};
use crate::job_controller::state::JobsState;
use actix_web::{web, HttpResponse, Responder};

pub(crate) async fn process(
    job_id: web::Path<String>,
    state: web::Data<JobsState>,
    taxonomy: web::Data<ErrorTaxonomy>,
) -> impl Responder {
    let job_id = job_id.into_inner();
    match state.status(&job_id).await {
        Some(status) => HttpResponse::Ok().json(status),
        None => taxonomy.respond(&AppError::NotFound(format!("job '{}'", job_id))),
    }
}
