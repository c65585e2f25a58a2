//! Deterministic storage keys.
//!
//! Permanent keys are computed from case and attendee identifiers only, so
//! any consumer can recompute where a document lives. Uploaded file names are
//! never part of a permanent key.

use common::model::case::{Artifact, WorkflowKind};
use std::path::Path;
use uuid::Uuid;

/// Key of a generated artifact: `cert/{case}-{attendee}.pdf` for certificates,
/// `{prefix}/{case}.pdf` for letters.
pub fn artifact_key(artifact: Artifact, case_id: &str, attendee_id: Option<&str>) -> String {
    match attendee_id {
        Some(attendee) if artifact.per_attendee() => {
            format!("{}/{}-{}.pdf", artifact.key_prefix(), case_id, attendee)
        }
        _ => format!("{}/{}.pdf", artifact.key_prefix(), case_id),
    }
}

/// Key of the `index`-th supporting document of a case.
pub fn supporting_document_key(
    workflow: WorkflowKind,
    case_id: &str,
    index: usize,
    temp_key: &str,
) -> String {
    format!("{}/{}-doc{}{}", workflow.as_str(), case_id, index, extension(temp_key))
}

pub fn attendee_photo_key(case_id: &str, attendee_id: &str, temp_key: &str) -> String {
    format!("photo/{}-{}{}", case_id, attendee_id, extension(temp_key))
}

/// A fresh collision resistant temp key keeping the client file extension.
pub fn temp_upload_key(client_filename: &str) -> String {
    format!("{}{}", Uuid::new_v4(), extension(client_filename))
}

/// Permanent key prefixes that hold case documents, used by reconciliation.
pub fn document_prefixes() -> Vec<String> {
    let mut prefixes: Vec<String> = WorkflowKind::ALL
        .iter()
        .map(|w| format!("{}/", w.as_str()))
        .collect();
    prefixes.extend(
        WorkflowKind::ALL
            .iter()
            .map(|w| format!("{}/", w.artifact().key_prefix())),
    );
    prefixes.push("photo/".to_string());
    prefixes.sort();
    prefixes.dedup();
    prefixes
}

/// Lower-cased `.ext` of a file name, empty when there is none.
fn extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}
