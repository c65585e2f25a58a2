use crate::model::document::Document;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The administrative workflows a case can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowKind {
    Activity,
    Requirement,
    Dismissal,
    Promotion,
    PromotionCpns,
    AssessmentTeam,
}

impl WorkflowKind {
    pub const ALL: [WorkflowKind; 6] = [
        WorkflowKind::Activity,
        WorkflowKind::Requirement,
        WorkflowKind::Dismissal,
        WorkflowKind::Promotion,
        WorkflowKind::PromotionCpns,
        WorkflowKind::AssessmentTeam,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowKind::Activity => "activity",
            WorkflowKind::Requirement => "requirement",
            WorkflowKind::Dismissal => "dismissal",
            WorkflowKind::Promotion => "promotion",
            WorkflowKind::PromotionCpns => "promotion-cpns",
            WorkflowKind::AssessmentTeam => "assessment-team",
        }
    }

    /// The document generated once a case of this workflow is accepted.
    pub fn artifact(self) -> Artifact {
        match self {
            WorkflowKind::Activity => Artifact::Certificate,
            WorkflowKind::Requirement => Artifact::RecommendationLetter,
            WorkflowKind::Dismissal => Artifact::AcceptanceLetter,
            WorkflowKind::Promotion => Artifact::PromotionLetter,
            WorkflowKind::PromotionCpns => Artifact::PromotionCpnsLetter,
            WorkflowKind::AssessmentTeam => Artifact::AssessmentTeamLetter,
        }
    }

    /// Terminal status reachable only from `Accepted`, for the workflows that have one.
    pub fn terminal_extension(self) -> Option<CaseStatus> {
        match self {
            WorkflowKind::Activity => Some(CaseStatus::CertPublished),
            WorkflowKind::Promotion => Some(CaseStatus::Verified),
            _ => None,
        }
    }
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkflowKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown workflow '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Created,
    Revision,
    Accepted,
    Rejected,
    CertPublished,
    Verified,
}

impl CaseStatus {
    const ALL: [CaseStatus; 6] = [
        CaseStatus::Created,
        CaseStatus::Revision,
        CaseStatus::Accepted,
        CaseStatus::Rejected,
        CaseStatus::CertPublished,
        CaseStatus::Verified,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CaseStatus::Created => "created",
            CaseStatus::Revision => "revision",
            CaseStatus::Accepted => "accepted",
            CaseStatus::Rejected => "rejected",
            CaseStatus::CertPublished => "cert_published",
            CaseStatus::Verified => "verified",
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CaseStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown case status '{}'", s))
    }
}

/// Generated documents, one per workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Artifact {
    Certificate,
    RecommendationLetter,
    AcceptanceLetter,
    PromotionLetter,
    PromotionCpnsLetter,
    AssessmentTeamLetter,
}

impl Artifact {
    pub fn as_str(self) -> &'static str {
        match self {
            Artifact::Certificate => "certificate",
            Artifact::RecommendationLetter => "recommendation_letter",
            Artifact::AcceptanceLetter => "acceptance_letter",
            Artifact::PromotionLetter => "promotion_letter",
            Artifact::PromotionCpnsLetter => "promotion_cpns_letter",
            Artifact::AssessmentTeamLetter => "assessment_team_letter",
        }
    }

    /// Storage prefix of the generated PDFs.
    pub fn key_prefix(self) -> &'static str {
        match self {
            Artifact::Certificate => "cert",
            Artifact::RecommendationLetter => "recommendation",
            Artifact::AcceptanceLetter => "acceptance",
            Artifact::PromotionLetter => "promotion",
            Artifact::PromotionCpnsLetter => "promotion-cpns",
            Artifact::AssessmentTeamLetter => "assessment-team",
        }
    }

    /// Certificates are issued per attendee; every other artifact is per case.
    pub fn per_attendee(self) -> bool {
        matches!(self, Artifact::Certificate)
    }

    /// Human readable document name recorded with the generated file.
    pub fn label(self) -> &'static str {
        match self {
            Artifact::Certificate => "Sertifikat Kegiatan",
            Artifact::RecommendationLetter => "Surat Rekomendasi Kebutuhan",
            Artifact::AcceptanceLetter => "Surat Persetujuan Pemberhentian",
            Artifact::PromotionLetter => "Surat Kenaikan Jenjang",
            Artifact::PromotionCpnsLetter => "Surat Pengangkatan CPNS",
            Artifact::AssessmentTeamLetter => "Surat Penetapan Tim Penilai",
        }
    }
}

/// A case as stored in the relational store, with its documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseRecord {
    pub id: String,
    pub workflow: WorkflowKind,
    pub status: CaseStatus,
    pub payload: serde_json::Value,
    pub document_number: Option<String>,
    pub document_date: Option<String>,
    pub signer_id: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[serde(default)]
    pub documents: Vec<Document>,
}

/// Result of a status transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub id: String,
    pub status: CaseStatus,
    pub modified_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_names_round_trip_through_from_str() {
        for kind in WorkflowKind::ALL {
            assert_eq!(kind.to_string().parse::<WorkflowKind>().unwrap(), kind);
        }
        assert!("promotion_cpns".parse::<WorkflowKind>().is_err());
    }

    #[test]
    fn only_activity_and_promotion_have_a_terminal_extension() {
        let extended: Vec<_> = WorkflowKind::ALL
            .into_iter()
            .filter_map(|kind| kind.terminal_extension().map(|s| (kind, s)))
            .collect();
        assert_eq!(
            extended,
            vec![
                (WorkflowKind::Activity, CaseStatus::CertPublished),
                (WorkflowKind::Promotion, CaseStatus::Verified),
            ]
        );
    }

    #[test]
    fn status_serializes_as_snake_case() {
        let json = serde_json::to_string(&CaseStatus::CertPublished).unwrap();
        assert_eq!(json, "\"cert_published\"");
        assert_eq!("cert_published".parse::<CaseStatus>().unwrap(), CaseStatus::CertPublished);
    }
}
