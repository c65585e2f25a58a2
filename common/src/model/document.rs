use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a document uploaded by the submitter as supporting evidence.
/// Generated documents use the artifact name as their role instead.
pub const SUPPORTING_ROLE: &str = "supporting";

/// A stored document attached to a case.
///
/// `filename` is always a server-generated storage key. Once `is_signed` is set
/// the document is never regenerated or re-signed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub filename: String,
    pub document_name: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendee_id: Option<String>,
    pub document_number: Option<String>,
    pub document_date: Option<String>,
    pub signer_id: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_signed: bool,
    pub signed_at: Option<DateTime<Utc>>,
}

/// A time limited, pre-authorized URL for direct object access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Response of a temp upload request: where to PUT the bytes and the key to
/// reference the file with at submit time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadTicket {
    pub key: String,
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Response of an artifact download request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactLink {
    pub filename: String,
    pub url: String,
    pub expires_at: DateTime<Utc>,
    /// `false` when the stored PDF was reused without invoking the renderer.
    pub regenerated: bool,
}
