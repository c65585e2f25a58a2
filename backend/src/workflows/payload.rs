//! Typed case payloads and their template data.

use crate::error::AppError;
use crate::generation::RenderRequest;
use crate::storage::keys::attendee_photo_key;
use crate::storage::promotion::PromotionRequest;
use crate::storage::signing::UrlSigner;
use common::model::case::WorkflowKind;
use common::model::payload::{
    ActivityPayload, AssessmentTeamPayload, DismissalPayload, PromotionCpnsPayload,
    PromotionPayload, RequirementPayload,
};
use common::model::template_data::{
    AcceptanceLetterData, AssessmentTeamLetterData, CertificateData, DocumentStamp,
    PromotionCpnsLetterData, PromotionLetterData, RecommendationLetterData,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum CasePayload {
    Activity(ActivityPayload),
    Requirement(RequirementPayload),
    Dismissal(DismissalPayload),
    Promotion(PromotionPayload),
    PromotionCpns(PromotionCpnsPayload),
    AssessmentTeam(AssessmentTeamPayload),
}

fn decode<T: DeserializeOwned>(workflow: WorkflowKind, value: &Value) -> Result<T, AppError> {
    serde_json::from_value(value.clone())
        .map_err(|e| AppError::BadRequest(format!("invalid {} payload: {}", workflow, e)))
}

impl CasePayload {
    /// Decodes and validates a submitted payload.
    pub fn parse(workflow: WorkflowKind, value: &Value) -> Result<Self, AppError> {
        let payload = match workflow {
            WorkflowKind::Activity => CasePayload::Activity(decode(workflow, value)?),
            WorkflowKind::Requirement => CasePayload::Requirement(decode(workflow, value)?),
            WorkflowKind::Dismissal => CasePayload::Dismissal(decode(workflow, value)?),
            WorkflowKind::Promotion => CasePayload::Promotion(decode(workflow, value)?),
            WorkflowKind::PromotionCpns => CasePayload::PromotionCpns(decode(workflow, value)?),
            WorkflowKind::AssessmentTeam => CasePayload::AssessmentTeam(decode(workflow, value)?),
        };
        payload.validate().map_err(AppError::BadRequest)?;
        Ok(payload)
    }

    /// Decodes a payload read back from the database.
    pub fn from_stored(workflow: WorkflowKind, value: &Value) -> Result<Self, AppError> {
        Self::parse(workflow, value)
            .map_err(|e| AppError::Internal(format!("stored payload is unreadable: {}", e)))
    }

    fn validate(&self) -> Result<(), String> {
        match self {
            CasePayload::Activity(p) => p.validate(),
            CasePayload::Requirement(p) => p.validate(),
            CasePayload::Dismissal(p) => p.validate(),
            CasePayload::Promotion(p) => p.validate(),
            CasePayload::PromotionCpns(p) => p.validate(),
            CasePayload::AssessmentTeam(p) => p.validate(),
        }
    }

    pub fn to_value(&self) -> Result<Value, AppError> {
        let value = match self {
            CasePayload::Activity(p) => serde_json::to_value(p)?,
            CasePayload::Requirement(p) => serde_json::to_value(p)?,
            CasePayload::Dismissal(p) => serde_json::to_value(p)?,
            CasePayload::Promotion(p) => serde_json::to_value(p)?,
            CasePayload::PromotionCpns(p) => serde_json::to_value(p)?,
            CasePayload::AssessmentTeam(p) => serde_json::to_value(p)?,
        };
        Ok(value)
    }

    /// Points attendee photos at their permanent keys and returns the copies
    /// needed to get them there.
    pub fn relocate_photos(&mut self, case_id: &str) -> Vec<PromotionRequest> {
        let CasePayload::Activity(activity) = self else {
            return Vec::new();
        };
        let mut requests = Vec::new();
        for attendee in &mut activity.attendees {
            let Some(temp_key) = attendee.foto.take().filter(|k| !k.trim().is_empty()) else {
                continue;
            };
            let permanent_key = attendee_photo_key(case_id, &attendee.id, &temp_key);
            attendee.foto = Some(permanent_key.clone());
            requests.push(PromotionRequest {
                temp_key,
                permanent_key,
            });
        }
        requests
    }

    /// Template data for the case artifact. Certificates are per attendee
    /// and need `attendee_id`.
    pub fn render_request(
        &self,
        stamp: &DocumentStamp,
        attendee_id: Option<&str>,
        signer: &UrlSigner,
    ) -> Result<RenderRequest, AppError> {
        match self {
            CasePayload::Activity(activity) => {
                let attendee_id = attendee_id.ok_or_else(|| {
                    AppError::BadRequest("attendee_id is required for certificates".to_string())
                })?;
                let attendee = activity
                    .attendee(attendee_id)
                    .ok_or_else(|| AppError::NotFound(format!("attendee '{}'", attendee_id)))?;
                let foto = attendee
                    .foto
                    .as_deref()
                    .map(|key| signer.sign_get(key).url)
                    .unwrap_or_default();
                RenderRequest::new(&CertificateData::new(activity, attendee, foto, stamp))
            }
            CasePayload::Requirement(p) => RenderRequest::new(&RecommendationLetterData::new(p, stamp)),
            CasePayload::Dismissal(p) => RenderRequest::new(&AcceptanceLetterData::new(p, stamp)),
            CasePayload::Promotion(p) => RenderRequest::new(&PromotionLetterData::new(p, stamp)),
            CasePayload::PromotionCpns(p) => {
                RenderRequest::new(&PromotionCpnsLetterData::new(p, stamp))
            }
            CasePayload::AssessmentTeam(p) => {
                RenderRequest::new(&AssessmentTeamLetterData::new(p, stamp))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::template::TemplateKind;
    use serde_json::json;
    use std::time::Duration;

    fn activity() -> Value {
        json!({
            "kegiatan": "Pelatihan Analis",
            "instansi_penyelenggara": "BKN",
            "tgl_mulai": "2024-03-01",
            "tgl_selesai": "2024-03-05",
            "no_usulan": "U-7",
            "attendees": [
                {"id": "A1", "nama": "Rina", "nip": "1990", "foto": "tmp-1.JPG",
                 "jabatan_fungsional": "Analis", "instansi": "BKN"},
                {"id": "A2", "nama": "Budi", "nip": "1991",
                 "jabatan_fungsional": "Analis", "instansi": "BKN"}
            ]
        })
    }

    fn stamp() -> DocumentStamp {
        DocumentStamp {
            no_dokumen: "800/3".into(),
            tgl_dokumen: "2024-06-01".into(),
        }
    }

    #[test]
    fn invalid_payloads_are_client_errors() {
        let err = CasePayload::parse(WorkflowKind::Dismissal, &json!({"nama": "x"})).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(m) if m.starts_with("invalid dismissal payload")));

        let mut blank = activity();
        blank["kegiatan"] = json!(" ");
        assert!(matches!(
            CasePayload::parse(WorkflowKind::Activity, &blank),
            Err(AppError::BadRequest(m)) if m.contains("kegiatan")
        ));
    }

    #[test]
    fn photos_move_to_deterministic_keys() {
        let mut payload = CasePayload::parse(WorkflowKind::Activity, &activity()).unwrap();
        let requests = payload.relocate_photos("C9");
        assert_eq!(
            requests,
            vec![PromotionRequest {
                temp_key: "tmp-1.JPG".into(),
                permanent_key: "photo/C9-A1.jpg".into(),
            }]
        );
        let value = payload.to_value().unwrap();
        assert_eq!(value["attendees"][0]["foto"], "photo/C9-A1.jpg");
        assert!(value["attendees"][1]["foto"].is_null());
    }

    #[test]
    fn certificate_data_is_per_attendee() {
        let signer = UrlSigner::new("http://jf.test", b"k", Duration::from_secs(60)).unwrap();
        let mut payload = CasePayload::parse(WorkflowKind::Activity, &activity()).unwrap();
        payload.relocate_photos("C9");

        assert!(matches!(
            payload.render_request(&stamp(), None, &signer),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            payload.render_request(&stamp(), Some("A3"), &signer),
            Err(AppError::NotFound(_))
        ));

        let request = payload.render_request(&stamp(), Some("A1"), &signer).unwrap();
        assert_eq!(request.template, TemplateKind::Certificate);
        assert_eq!(request.data["nama"], "Rina");
        assert_eq!(request.data["no_dokumen"], "800/3");
        let foto = request.data["foto"].as_str().unwrap();
        assert!(foto.starts_with("http://jf.test/api/storage/objects/permanent/photo/C9-A1.jpg?"));

        let without_photo = payload.render_request(&stamp(), Some("A2"), &signer).unwrap();
        assert_eq!(without_photo.data["foto"], "");
    }
}
