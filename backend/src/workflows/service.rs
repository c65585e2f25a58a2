use crate::db::{cases, documents, immediate, Database};
use crate::deadline::{blocking, Deadline};
use crate::error::AppError;
use crate::generation::{CacheCheck, DocumentGenerator};
use crate::storage::keys::{artifact_key, supporting_document_key};
use crate::storage::local::validate_key;
use crate::storage::promotion::{save_files, PromotionRequest};
use crate::storage::signing::UrlSigner;
use crate::storage::ObjectStorage;
use crate::workflows::guard::{ensure_generatable, next_status, Transition};
use crate::workflows::payload::CasePayload;
use chrono::{DateTime, Utc};
use common::model::case::{CaseRecord, CaseStatus, TransitionOutcome, WorkflowKind};
use common::model::document::{ArtifactLink, Document, SUPPORTING_ROLE};
use common::model::template_data::DocumentStamp;
use common::requests::{
    AcceptRequest, ArtifactQuery, DocumentUpload, NoteRequest, ResubmitRequest, SubmitCaseRequest,
};
use rusqlite::Connection;
use std::sync::Arc;
use uuid::Uuid;

/// Orchestrates every workflow: submission, status transitions and the
/// generated artifact of accepted cases.
#[derive(Clone)]
pub struct CaseService {
    db: Database,
    storage: Arc<dyn ObjectStorage>,
    signer: Arc<UrlSigner>,
    generator: DocumentGenerator,
}

/// Loads a case of `workflow`; a case of another workflow is not found.
fn load_case(conn: &Connection, workflow: WorkflowKind, id: &str) -> Result<CaseRecord, AppError> {
    cases::find(conn, id)?
        .filter(|case| case.workflow == workflow)
        .ok_or_else(|| AppError::NotFound(format!("{} case '{}'", workflow, id)))
}

fn check_uploads(uploads: &[DocumentUpload]) -> Result<(), AppError> {
    for upload in uploads {
        if upload.document_name.trim().is_empty() {
            return Err(AppError::BadRequest(format!(
                "document '{}' needs a document_name",
                upload.filename
            )));
        }
        validate_key(&upload.filename)?;
    }
    Ok(())
}

/// Permanent keys and rows of uploaded supporting documents, numbered from
/// `first_index`.
fn supporting_documents(
    workflow: WorkflowKind,
    case_id: &str,
    first_index: usize,
    uploads: &[DocumentUpload],
    now: DateTime<Utc>,
) -> (Vec<PromotionRequest>, Vec<Document>) {
    uploads
        .iter()
        .enumerate()
        .map(|(offset, upload)| {
            let key =
                supporting_document_key(workflow, case_id, first_index + offset, &upload.filename);
            let request = PromotionRequest {
                temp_key: upload.filename.clone(),
                permanent_key: key.clone(),
            };
            let document = Document {
                filename: key,
                document_name: upload.document_name.trim().to_string(),
                role: SUPPORTING_ROLE.to_string(),
                attendee_id: None,
                document_number: upload.document_number.clone(),
                document_date: upload.document_date.clone(),
                signer_id: upload.signer_id.clone(),
                note: upload.note.clone(),
                created_at: now,
                is_signed: false,
                signed_at: None,
            };
            (request, document)
        })
        .unzip()
}

fn require_text(fields: &[(&str, &str)]) -> Result<(), AppError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "missing required fields: {}",
            missing.join(", ")
        )))
    }
}

enum Change {
    Note(Option<String>),
    Accept(AcceptRequest),
    Resubmit(Vec<DocumentUpload>),
    None,
}

impl CaseService {
    pub fn new(
        db: Database,
        storage: Arc<dyn ObjectStorage>,
        signer: Arc<UrlSigner>,
        generator: DocumentGenerator,
    ) -> Self {
        Self {
            db,
            storage,
            signer,
            generator,
        }
    }

    /// Creates a case in `created`, promoting its uploads into permanent
    /// storage inside the same transaction as the inserts.
    pub async fn submit(
        &self,
        workflow: WorkflowKind,
        request: SubmitCaseRequest,
        deadline: &Deadline,
    ) -> Result<CaseRecord, AppError> {
        let mut payload = CasePayload::parse(workflow, &request.payload)?;
        check_uploads(&request.documents)?;

        let case_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let mut promotions = payload.relocate_photos(&case_id);
        for promotion in &promotions {
            validate_key(&promotion.temp_key)?;
        }
        let (document_promotions, document_rows) =
            supporting_documents(workflow, &case_id, 0, &request.documents, now);
        promotions.extend(document_promotions);

        let record = CaseRecord {
            id: case_id,
            workflow,
            status: CaseStatus::Created,
            payload: payload.to_value()?,
            document_number: None,
            document_date: None,
            signer_id: None,
            note: None,
            created_at: now,
            modified_at: now,
            documents: document_rows,
        };

        let db = self.db.clone();
        let storage = self.storage.clone();
        let deadline_copy = *deadline;
        let record = deadline
            .run(blocking(move || {
                let mut conn = db.connect(&deadline_copy)?;
                let tx = immediate(&mut conn)?;
                cases::insert(&tx, &record)?;
                save_files(storage.as_ref(), &promotions)?;
                for document in &record.documents {
                    documents::insert(&tx, &record.id, document)?;
                }
                deadline_copy.check()?;
                tx.commit()?;
                Ok(record)
            }))
            .await?;
        log::info!(
            "{} case {} submitted with {} documents",
            workflow,
            record.id,
            record.documents.len()
        );
        Ok(record)
    }

    /// The case with all of its documents.
    pub async fn get(
        &self,
        workflow: WorkflowKind,
        id: &str,
        deadline: &Deadline,
    ) -> Result<CaseRecord, AppError> {
        let db = self.db.clone();
        let id = id.to_string();
        let deadline_copy = *deadline;
        deadline
            .run(blocking(move || {
                let conn = db.connect(&deadline_copy)?;
                let mut case = load_case(&conn, workflow, &id)?;
                case.documents = documents::list(&conn, &id)?;
                Ok(case)
            }))
            .await
    }

    pub async fn request_revision(
        &self,
        workflow: WorkflowKind,
        id: &str,
        request: NoteRequest,
        deadline: &Deadline,
    ) -> Result<TransitionOutcome, AppError> {
        self.transition(workflow, id, Transition::Revision, Change::Note(request.note), deadline)
            .await
    }

    /// Returns a case from `revision` to `created`, optionally adding more
    /// supporting documents.
    pub async fn resubmit(
        &self,
        workflow: WorkflowKind,
        id: &str,
        request: ResubmitRequest,
        deadline: &Deadline,
    ) -> Result<TransitionOutcome, AppError> {
        check_uploads(&request.documents)?;
        self.transition(
            workflow,
            id,
            Transition::Resubmit,
            Change::Resubmit(request.documents),
            deadline,
        )
        .await
    }

    pub async fn accept(
        &self,
        workflow: WorkflowKind,
        id: &str,
        request: AcceptRequest,
        deadline: &Deadline,
    ) -> Result<TransitionOutcome, AppError> {
        require_text(&[
            ("document_number", &request.document_number),
            ("document_date", &request.document_date),
            ("signer_id", &request.signer_id),
        ])?;
        self.transition(workflow, id, Transition::Accept, Change::Accept(request), deadline)
            .await
    }

    pub async fn reject(
        &self,
        workflow: WorkflowKind,
        id: &str,
        request: NoteRequest,
        deadline: &Deadline,
    ) -> Result<TransitionOutcome, AppError> {
        self.transition(workflow, id, Transition::Reject, Change::Note(request.note), deadline)
            .await
    }

    /// Moves an accepted activity to `cert_published` or an accepted
    /// promotion to `verified`.
    pub async fn publish(
        &self,
        workflow: WorkflowKind,
        id: &str,
        deadline: &Deadline,
    ) -> Result<TransitionOutcome, AppError> {
        self.transition(workflow, id, Transition::Publish, Change::None, deadline)
            .await
    }

    async fn transition(
        &self,
        workflow: WorkflowKind,
        id: &str,
        transition: Transition,
        change: Change,
        deadline: &Deadline,
    ) -> Result<TransitionOutcome, AppError> {
        let db = self.db.clone();
        let storage = self.storage.clone();
        let id = id.to_string();
        let deadline_copy = *deadline;
        let outcome = deadline
            .run(blocking(move || {
                let mut conn = db.connect(&deadline_copy)?;
                let tx = immediate(&mut conn)?;
                let case = load_case(&tx, workflow, &id)?;
                let status = next_status(workflow, case.status, transition)?;
                let now = Utc::now();
                match change {
                    Change::Accept(accept) => cases::accept(
                        &tx,
                        &id,
                        accept.document_number.trim(),
                        accept.document_date.trim(),
                        accept.signer_id.trim(),
                        accept.note.as_deref(),
                        now,
                    )?,
                    Change::Note(note) => {
                        cases::update_status(&tx, &id, status, note.as_deref(), now)?
                    }
                    Change::Resubmit(uploads) => {
                        let first = documents::count_supporting(&tx, &id)?;
                        let (promotions, rows) =
                            supporting_documents(workflow, &id, first, &uploads, now);
                        save_files(storage.as_ref(), &promotions)?;
                        for row in &rows {
                            documents::insert(&tx, &id, row)?;
                        }
                        cases::update_status(&tx, &id, status, None, now)?
                    }
                    Change::None => cases::update_status(&tx, &id, status, None, now)?,
                }
                deadline_copy.check()?;
                tx.commit()?;
                Ok(TransitionOutcome {
                    id,
                    status,
                    modified_at: now,
                })
            }))
            .await?;
        log::info!(
            "{} case {}: {} -> {}",
            workflow,
            outcome.id,
            transition.as_str(),
            outcome.status
        );
        Ok(outcome)
    }

    /// Signed download link of the case artifact, generating it first when
    /// it is missing, unusable or `regenerate` is set. A fresh render is
    /// stored only while the document row is still unsigned.
    pub async fn artifact(
        &self,
        workflow: WorkflowKind,
        id: &str,
        query: ArtifactQuery,
        deadline: &Deadline,
    ) -> Result<ArtifactLink, AppError> {
        let artifact = workflow.artifact();
        let attendee_id = if artifact.per_attendee() {
            query.attendee_id.filter(|a| !a.trim().is_empty())
        } else {
            None
        };

        let case = self.get(workflow, id, deadline).await?;
        ensure_generatable(workflow, case.status)?;
        let payload = CasePayload::from_stored(workflow, &case.payload)?;
        let stamp = DocumentStamp {
            no_dokumen: case.document_number.clone().unwrap_or_default(),
            tgl_dokumen: case.document_date.clone().unwrap_or_default(),
        };
        let request = payload.render_request(&stamp, attendee_id.as_deref(), &self.signer)?;
        let key = artifact_key(artifact, &case.id, attendee_id.as_deref());

        let existing = case.documents.iter().find(|doc| doc.filename == key).cloned();
        let signed = existing.as_ref().map(|doc| doc.is_signed).unwrap_or(false);
        if signed && query.regenerate {
            return Err(AppError::DocumentSigned);
        }

        let rendered = if signed {
            // A signed document is only ever served, never rendered again.
            let check = deadline.run(self.generator.check_cache(&key, false)).await?;
            if check == CacheCheck::Miss {
                log::error!("signed document {} is missing from storage", key);
                return Err(AppError::DocumentSigned);
            }
            None
        } else {
            match deadline
                .run(self.generator.check_cache(&key, query.regenerate))
                .await?
            {
                CacheCheck::Hit => None,
                CacheCheck::Miss => Some(deadline.run(self.generator.render(&request)).await?),
            }
        };
        let regenerated = rendered.is_some();

        if regenerated || existing.is_none() {
            let document_name = match attendee_id.as_deref() {
                Some(_) => format!(
                    "{} - {}",
                    artifact.label(),
                    request.data["nama"].as_str().unwrap_or_default()
                ),
                None => artifact.label().to_string(),
            };
            let row = Document {
                filename: key.clone(),
                document_name,
                role: artifact.as_str().to_string(),
                attendee_id: attendee_id.clone(),
                document_number: case.document_number.clone(),
                document_date: case.document_date.clone(),
                signer_id: case.signer_id.clone(),
                note: None,
                created_at: Utc::now(),
                is_signed: false,
                signed_at: None,
            };
            let db = self.db.clone();
            let storage = self.storage.clone();
            let case_id = case.id.clone();
            let deadline_copy = *deadline;
            deadline
                .run(blocking(move || {
                    let mut conn = db.connect(&deadline_copy)?;
                    let tx = immediate(&mut conn)?;
                    // The row may have been signed while rendering.
                    let now_signed = documents::find(&tx, &case_id, &row.filename)?
                        .map(|doc| doc.is_signed)
                        .unwrap_or(false);
                    if now_signed {
                        return match rendered {
                            Some(_) => Err(AppError::DocumentSigned),
                            None => Ok(()),
                        };
                    }
                    if let Some(pdf) = &rendered {
                        pdf.store(storage.as_ref(), &row.filename)?;
                    }
                    documents::upsert_generated(&tx, &case_id, &row)?;
                    deadline_copy.check()?;
                    tx.commit()?;
                    Ok(())
                }))
                .await?;
        }

        let signed_url = self.signer.sign_get(&key);
        Ok(ArtifactLink {
            filename: key,
            url: signed_url.url,
            expires_at: signed_url.expires_at,
            regenerated,
        })
    }

    /// Marks the generated artifact as signed; it can no longer be
    /// regenerated afterwards.
    pub async fn sign_artifact(
        &self,
        workflow: WorkflowKind,
        id: &str,
        attendee_id: Option<String>,
        deadline: &Deadline,
    ) -> Result<Document, AppError> {
        let artifact = workflow.artifact();
        let attendee_id = if artifact.per_attendee() {
            Some(attendee_id.filter(|a| !a.trim().is_empty()).ok_or_else(|| {
                AppError::BadRequest("attendee_id is required for certificates".to_string())
            })?)
        } else {
            None
        };
        let db = self.db.clone();
        let case_id = id.to_string();
        let deadline_copy = *deadline;
        let document = deadline
            .run(blocking(move || {
                let mut conn = db.connect(&deadline_copy)?;
                let tx = immediate(&mut conn)?;
                let case = load_case(&tx, workflow, &case_id)?;
                ensure_generatable(workflow, case.status)?;
                let key = artifact_key(artifact, &case_id, attendee_id.as_deref());
                let document = documents::find(&tx, &case_id, &key)?.ok_or_else(|| {
                    AppError::NotFound(format!("generated document '{}'", key))
                })?;
                if document.is_signed {
                    return Err(AppError::DocumentSigned);
                }
                let now = Utc::now();
                if !documents::mark_signed(&tx, &case_id, &key, case.signer_id.as_deref(), now)? {
                    return Err(AppError::DocumentSigned);
                }
                let signed = documents::find(&tx, &case_id, &key)?
                    .ok_or_else(|| AppError::NotFound(format!("generated document '{}'", key)))?;
                deadline_copy.check()?;
                tx.commit()?;
                Ok(signed)
            }))
            .await?;
        log::info!("{} case {}: signed {}", workflow, id, document.filename);
        Ok(document)
    }
}
