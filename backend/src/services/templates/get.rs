use crate::deadline::blocking;
use crate::error::{AppError, ErrorTaxonomy};
use crate::services::AppState;
use actix_web::{web, HttpResponse, Responder};
use common::model::document::SignedUrl;
use common::model::template::TemplateKind;

pub async fn process(
    state: web::Data<AppState>,
    taxonomy: web::Data<ErrorTaxonomy>,
    kind: web::Path<String>,
) -> impl Responder {
    match template_url(&state, &kind).await {
        Ok(url) => HttpResponse::Ok().json(url),
        Err(e) => taxonomy.respond(&e),
    }
}

async fn template_url(state: &AppState, kind: &str) -> Result<SignedUrl, AppError> {
    let kind: TemplateKind = kind
        .parse()
        .map_err(|_| AppError::NotFound(format!("template kind '{}'", kind)))?;
    let templates = state.templates.clone();
    let exists = state
        .deadline()
        .run(blocking(move || templates.exists(kind)))
        .await?;
    if !exists {
        return Err(AppError::NotFound(format!("template '{}'", kind)));
    }
    Ok(state.signer.sign_get(&kind.storage_key()))
}
