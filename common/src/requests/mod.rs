use serde::Deserialize;

/// Request body for a temp upload URL.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadUrlRequest {
    /// Name of the file on the client, only its extension is kept.
    pub filename: String,
    pub content_type: String,
}

/// A file previously uploaded to temp storage, referenced at submit time.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentUpload {
    /// Temp storage key returned by the upload URL endpoint.
    pub filename: String,
    pub document_name: String,
    #[serde(default)]
    pub document_number: Option<String>,
    #[serde(default)]
    pub document_date: Option<String>,
    #[serde(default)]
    pub signer_id: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Case submission. `payload` is validated against the workflow in the URL.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitCaseRequest {
    pub payload: serde_json::Value,
    #[serde(default)]
    pub documents: Vec<DocumentUpload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AcceptRequest {
    pub document_number: String,
    pub document_date: String,
    pub signer_id: String,
    #[serde(default)]
    pub note: Option<String>,
}

/// Body of reject, revision and publish transitions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteRequest {
    #[serde(default)]
    pub note: Option<String>,
}

/// Resubmission of a case sent back for revision, with optional extra documents.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResubmitRequest {
    #[serde(default)]
    pub documents: Vec<DocumentUpload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtifactQuery {
    #[serde(default)]
    pub attendee_id: Option<String>,
    /// Bypass the stored PDF and render again.
    #[serde(default)]
    pub regenerate: bool,
}
