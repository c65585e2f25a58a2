use crate::error::{AppError, ErrorTaxonomy};
use crate::services::AppState;
use crate::storage::keys::temp_upload_key;
use actix_web::{web, HttpResponse, Responder};
use common::model::document::UploadTicket;
use common::requests::UploadUrlRequest;
use mime_guess::mime;

const ALLOWED_TYPES: [&str; 3] = ["application/pdf", "image/jpeg", "image/png"];

pub async fn process(
    state: web::Data<AppState>,
    taxonomy: web::Data<ErrorTaxonomy>,
    body: web::Json<UploadUrlRequest>,
) -> impl Responder {
    match issue_upload_url(&state, body.into_inner()) {
        Ok(ticket) => HttpResponse::Ok().json(ticket),
        Err(e) => taxonomy.respond(&e),
    }
}

fn issue_upload_url(state: &AppState, request: UploadUrlRequest) -> Result<UploadTicket, AppError> {
    if request.filename.trim().is_empty() {
        return Err(AppError::BadRequest("filename must not be empty".to_string()));
    }
    let content_type: mime::Mime = request
        .content_type
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid content type '{}'", request.content_type)))?;
    let essence = content_type.essence_str();
    if !ALLOWED_TYPES.contains(&essence) {
        return Err(AppError::BadRequest(format!(
            "unsupported content type '{}', expected one of {}",
            essence,
            ALLOWED_TYPES.join(", ")
        )));
    }
    if !mime_guess::from_path(&request.filename)
        .iter()
        .any(|guess| guess.essence_str() == essence)
    {
        return Err(AppError::BadRequest(format!(
            "file name '{}' does not match content type '{}'",
            request.filename, essence
        )));
    }

    let key = temp_upload_key(&request.filename);
    let signed = state.signer.sign_put(&key);
    log::debug!("issued upload URL for {} as {}", request.filename, key);
    Ok(UploadTicket {
        key,
        url: signed.url,
        expires_at: signed.expires_at,
    })
}
