use crate::deadline::blocking;
use crate::error::{AppError, ErrorTaxonomy};
use crate::services::AppState;
use crate::storage::signing::SignedMethod;
use crate::storage::{Area, ObjectMetadata};
use actix_web::http::header::{CONTENT_TYPE, ETAG};
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
pub struct SignatureQuery {
    pub expires: i64,
    pub signature: String,
}

fn authorize(
    state: &AppState,
    method: SignedMethod,
    area: &str,
    key: &str,
    query: &SignatureQuery,
) -> Result<Area, AppError> {
    let area: Area = area.parse()?;
    if state
        .signer
        .verify(method, area, key, query.expires, &query.signature, Utc::now())
    {
        Ok(area)
    } else {
        Err(AppError::InvalidSignature)
    }
}

pub async fn download(
    state: web::Data<AppState>,
    taxonomy: web::Data<ErrorTaxonomy>,
    path: web::Path<(String, String)>,
    query: web::Query<SignatureQuery>,
) -> HttpResponse {
    let (area, key) = path.into_inner();
    match read_object(&state, &area, key, &query).await {
        Ok((metadata, bytes)) => HttpResponse::Ok()
            .content_type(metadata.content_type)
            .insert_header((ETAG, format!("\"{}\"", metadata.md5)))
            .body(bytes),
        Err(e) => taxonomy.respond(&e),
    }
}

async fn read_object(
    state: &AppState,
    area: &str,
    key: String,
    query: &SignatureQuery,
) -> Result<(ObjectMetadata, Vec<u8>), AppError> {
    let area = authorize(state, SignedMethod::Get, area, &key, query)?;
    let storage = state.storage.clone();
    state
        .deadline()
        .run(blocking(move || {
            let metadata = storage.metadata(area, &key)?;
            let mut reader = storage.get(area, &key)?;
            let mut bytes = Vec::with_capacity(metadata.content_length as usize);
            reader.read_to_end(&mut bytes)?;
            Ok((metadata, bytes))
        }))
        .await
}

pub async fn upload(
    state: web::Data<AppState>,
    taxonomy: web::Data<ErrorTaxonomy>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
    query: web::Query<SignatureQuery>,
    body: web::Bytes,
) -> HttpResponse {
    let (area, key) = path.into_inner();
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    match write_object(&state, &area, key, &query, content_type, body).await {
        Ok(metadata) => HttpResponse::Ok().json(metadata),
        Err(e) => taxonomy.respond(&e),
    }
}

async fn write_object(
    state: &AppState,
    area: &str,
    key: String,
    query: &SignatureQuery,
    content_type: Option<String>,
    body: web::Bytes,
) -> Result<ObjectMetadata, AppError> {
    let area = authorize(state, SignedMethod::Put, area, &key, query)?;
    if area != Area::Temp {
        return Err(AppError::InvalidSignature);
    }
    if body.is_empty() {
        return Err(AppError::BadRequest("upload body is empty".to_string()));
    }
    let content_type = content_type
        .unwrap_or_else(|| mime_guess::from_path(&key).first_or_octet_stream().to_string());
    let storage = state.storage.clone();
    let metadata = state
        .deadline()
        .run(blocking(move || {
            Ok(storage.put(area, &key, &content_type, &mut body.as_ref())?)
        }))
        .await?;
    log::debug!("received upload of {} bytes", metadata.content_length);
    Ok(metadata)
}
