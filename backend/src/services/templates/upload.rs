use crate::deadline::blocking;
use crate::error::{AppError, ErrorTaxonomy};
use crate::render::template_check::check_template;
use crate::render::RenderError;
use crate::services::AppState;
use crate::storage::{Area, StorageError};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use common::model::template::TemplateKind;
use futures_util::StreamExt;
use md5::Context;
use serde::Serialize;
use std::io::Write;
use tempfile::NamedTempFile;

#[derive(Debug, Serialize)]
pub struct TemplateUpload {
    pub kind: TemplateKind,
    pub md5: String,
    pub content_length: u64,
    /// The stored template already had these exact bytes.
    pub unchanged: bool,
}

pub async fn process(
    state: web::Data<AppState>,
    taxonomy: web::Data<ErrorTaxonomy>,
    kind: web::Path<String>,
    payload: Multipart,
) -> impl Responder {
    match upload_template(&state, &kind, payload).await {
        Ok(result) => HttpResponse::Ok().json(result),
        Err(e) => taxonomy.respond(&e),
    }
}

async fn upload_template(
    state: &AppState,
    kind: &str,
    mut payload: Multipart,
) -> Result<TemplateUpload, AppError> {
    let kind: TemplateKind = kind
        .parse()
        .map_err(|_| AppError::NotFound(format!("template kind '{}'", kind)))?;

    let mut local = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(".docx")
        .tempfile_in(&state.scratch_dir)?;
    let mut md5_hasher = Context::new();
    let mut size: usize = 0;
    let mut file_written = false;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| AppError::BadRequest(e.to_string()))?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));
        if name.as_deref() != Some("file") {
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
            .unwrap_or_default();
        if !filename.to_ascii_lowercase().ends_with(".docx") {
            return Err(AppError::BadRequest("The file must end with .docx".to_string()));
        }

        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| AppError::BadRequest(e.to_string()))?;
            size += chunk.len();
            if size > state.max_upload_bytes {
                return Err(AppError::BadRequest(format!(
                    "template exceeds {} bytes",
                    state.max_upload_bytes
                )));
            }
            md5_hasher.consume(&chunk);
            local.write_all(&chunk)?;
        }
        file_written = true;
    }

    if !file_written || size == 0 {
        return Err(AppError::BadRequest("Missing file".to_string()));
    }
    let computed_md5 = format!("{:x}", md5_hasher.finalize());

    let storage = state.storage.clone();
    let templates = state.templates.clone();
    let expected = computed_md5.clone();
    state
        .deadline()
        .run(blocking(move || {
            local.flush()?;
            match check_template(local.path()) {
                Ok(()) => {}
                Err(RenderError::LoadTemplate(message)) => {
                    return Err(AppError::BadRequest(format!(
                        "uploaded file is not a docx document: {}",
                        message
                    )))
                }
                Err(e) => return Err(e.into()),
            }

            match storage.metadata(Area::Permanent, &kind.storage_key()) {
                Ok(existing) if existing.md5 == expected => {
                    return Ok(TemplateUpload {
                        kind,
                        md5: expected,
                        content_length: existing.content_length,
                        unchanged: true,
                    })
                }
                Ok(_) | Err(StorageError::NotFound(_)) => {}
                Err(e) => return Err(e.into()),
            }

            let mut file = local.reopen()?;
            let metadata = templates.upload(kind, &mut file)?;
            Ok(TemplateUpload {
                kind,
                md5: metadata.md5,
                content_length: metadata.content_length,
                unchanged: false,
            })
        }))
        .await
}
