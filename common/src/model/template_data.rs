//! Data handed to the renderer for each template.
//!
//! Field names are the wire contract with the external renderer: every key
//! must match a placeholder in the corresponding template, so renaming a field
//! here means updating the stored template as well.

use crate::model::payload::{
    ActivityPayload, AssessmentMember, AssessmentTeamPayload, Attendee, DismissalPayload,
    PromotionCpnsPayload, PromotionPayload, RequirementNeed, RequirementPayload,
};
use crate::model::template::TemplateKind;
use serde::Serialize;

/// Template data with a known template and a list of required fields.
pub trait TemplateData: Serialize {
    fn template(&self) -> TemplateKind;

    /// Names of required fields that are blank.
    fn missing_fields(&self) -> Vec<&'static str>;
}

fn blank(fields: &[(&'static str, &str)]) -> Vec<&'static str> {
    fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect()
}

/// Number and date stamped on a case when it is accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentStamp {
    pub no_dokumen: String,
    pub tgl_dokumen: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CertificateData {
    pub nama: String,
    pub nip: String,
    pub tempat_lahir: String,
    pub tgl_lahir: String,
    /// Signed URL of the attendee photo, empty when no photo was uploaded.
    pub foto: String,
    pub jabatan_fungsional: String,
    pub instansi: String,
    pub instansi_penyelenggara: String,
    pub kualifikasi: String,
    pub kegiatan: String,
    pub durasi: String,
    pub no_usulan: String,
    pub tgl_mulai: String,
    pub tgl_selesai: String,
    pub deskripsi: String,
    pub no_dokumen: String,
    pub tgl_dokumen: String,
}

impl CertificateData {
    pub fn new(
        activity: &ActivityPayload,
        attendee: &Attendee,
        foto: String,
        stamp: &DocumentStamp,
    ) -> Self {
        Self {
            nama: attendee.nama.clone(),
            nip: attendee.nip.clone(),
            tempat_lahir: attendee.tempat_lahir.clone(),
            tgl_lahir: attendee.tgl_lahir.clone(),
            foto,
            jabatan_fungsional: attendee.jabatan_fungsional.clone(),
            instansi: attendee.instansi.clone(),
            instansi_penyelenggara: activity.instansi_penyelenggara.clone(),
            kualifikasi: attendee.kualifikasi.clone(),
            kegiatan: activity.kegiatan.clone(),
            durasi: activity.durasi.clone(),
            no_usulan: activity.no_usulan.clone(),
            tgl_mulai: activity.tgl_mulai.clone(),
            tgl_selesai: activity.tgl_selesai.clone(),
            deskripsi: activity.deskripsi.clone(),
            no_dokumen: stamp.no_dokumen.clone(),
            tgl_dokumen: stamp.tgl_dokumen.clone(),
        }
    }
}

impl TemplateData for CertificateData {
    fn template(&self) -> TemplateKind {
        TemplateKind::Certificate
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        blank(&[
            ("nama", &self.nama),
            ("nip", &self.nip),
            ("jabatan_fungsional", &self.jabatan_fungsional),
            ("instansi", &self.instansi),
            ("instansi_penyelenggara", &self.instansi_penyelenggara),
            ("kegiatan", &self.kegiatan),
            ("no_usulan", &self.no_usulan),
            ("tgl_mulai", &self.tgl_mulai),
            ("tgl_selesai", &self.tgl_selesai),
            ("no_dokumen", &self.no_dokumen),
            ("tgl_dokumen", &self.tgl_dokumen),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationLetterData {
    pub nama_instansi: String,
    pub no_usulan: String,
    pub tgl_usulan: String,
    pub kebutuhan: Vec<RequirementNeed>,
    pub no_dokumen: String,
    pub tgl_dokumen: String,
}

impl RecommendationLetterData {
    pub fn new(requirement: &RequirementPayload, stamp: &DocumentStamp) -> Self {
        Self {
            nama_instansi: requirement.nama_instansi.clone(),
            no_usulan: requirement.no_usulan.clone(),
            tgl_usulan: requirement.tgl_usulan.clone(),
            kebutuhan: requirement.kebutuhan.clone(),
            no_dokumen: stamp.no_dokumen.clone(),
            tgl_dokumen: stamp.tgl_dokumen.clone(),
        }
    }
}

impl TemplateData for RecommendationLetterData {
    fn template(&self) -> TemplateKind {
        TemplateKind::RecommendationLetter
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = blank(&[
            ("nama_instansi", &self.nama_instansi),
            ("no_usulan", &self.no_usulan),
            ("tgl_usulan", &self.tgl_usulan),
            ("no_dokumen", &self.no_dokumen),
            ("tgl_dokumen", &self.tgl_dokumen),
        ]);
        if self.kebutuhan.is_empty() {
            missing.push("kebutuhan");
        }
        missing
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceptanceLetterData {
    pub nama: String,
    pub nip: String,
    pub jabatan_fungsional: String,
    pub instansi: String,
    pub alasan: String,
    pub no_usulan: String,
    pub tgl_usulan: String,
    pub no_dokumen: String,
    pub tgl_dokumen: String,
}

impl AcceptanceLetterData {
    pub fn new(dismissal: &DismissalPayload, stamp: &DocumentStamp) -> Self {
        Self {
            nama: dismissal.nama.clone(),
            nip: dismissal.nip.clone(),
            jabatan_fungsional: dismissal.jabatan_fungsional.clone(),
            instansi: dismissal.instansi.clone(),
            alasan: dismissal.alasan.clone(),
            no_usulan: dismissal.no_usulan.clone(),
            tgl_usulan: dismissal.tgl_usulan.clone(),
            no_dokumen: stamp.no_dokumen.clone(),
            tgl_dokumen: stamp.tgl_dokumen.clone(),
        }
    }
}

impl TemplateData for AcceptanceLetterData {
    fn template(&self) -> TemplateKind {
        TemplateKind::AcceptanceLetter
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        blank(&[
            ("nama", &self.nama),
            ("nip", &self.nip),
            ("jabatan_fungsional", &self.jabatan_fungsional),
            ("instansi", &self.instansi),
            ("alasan", &self.alasan),
            ("no_usulan", &self.no_usulan),
            ("no_dokumen", &self.no_dokumen),
            ("tgl_dokumen", &self.tgl_dokumen),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromotionLetterData {
    pub nama: String,
    pub nip: String,
    pub jabatan_fungsional: String,
    pub instansi: String,
    pub pangkat_lama: String,
    pub pangkat_baru: String,
    pub angka_kredit: String,
    pub no_usulan: String,
    pub no_dokumen: String,
    pub tgl_dokumen: String,
}

impl PromotionLetterData {
    pub fn new(promotion: &PromotionPayload, stamp: &DocumentStamp) -> Self {
        Self {
            nama: promotion.nama.clone(),
            nip: promotion.nip.clone(),
            jabatan_fungsional: promotion.jabatan_fungsional.clone(),
            instansi: promotion.instansi.clone(),
            pangkat_lama: promotion.pangkat_lama.clone(),
            pangkat_baru: promotion.pangkat_baru.clone(),
            angka_kredit: promotion.angka_kredit.clone(),
            no_usulan: promotion.no_usulan.clone(),
            no_dokumen: stamp.no_dokumen.clone(),
            tgl_dokumen: stamp.tgl_dokumen.clone(),
        }
    }
}

impl TemplateData for PromotionLetterData {
    fn template(&self) -> TemplateKind {
        TemplateKind::PromotionLetter
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        blank(&[
            ("nama", &self.nama),
            ("nip", &self.nip),
            ("jabatan_fungsional", &self.jabatan_fungsional),
            ("pangkat_lama", &self.pangkat_lama),
            ("pangkat_baru", &self.pangkat_baru),
            ("angka_kredit", &self.angka_kredit),
            ("no_dokumen", &self.no_dokumen),
            ("tgl_dokumen", &self.tgl_dokumen),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromotionCpnsLetterData {
    pub nama: String,
    pub nip: String,
    pub jabatan_fungsional: String,
    pub instansi: String,
    pub tmt_cpns: String,
    pub no_usulan: String,
    pub no_dokumen: String,
    pub tgl_dokumen: String,
}

impl PromotionCpnsLetterData {
    pub fn new(promotion: &PromotionCpnsPayload, stamp: &DocumentStamp) -> Self {
        Self {
            nama: promotion.nama.clone(),
            nip: promotion.nip.clone(),
            jabatan_fungsional: promotion.jabatan_fungsional.clone(),
            instansi: promotion.instansi.clone(),
            tmt_cpns: promotion.tmt_cpns.clone(),
            no_usulan: promotion.no_usulan.clone(),
            no_dokumen: stamp.no_dokumen.clone(),
            tgl_dokumen: stamp.tgl_dokumen.clone(),
        }
    }
}

impl TemplateData for PromotionCpnsLetterData {
    fn template(&self) -> TemplateKind {
        TemplateKind::PromotionCpnsLetter
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        blank(&[
            ("nama", &self.nama),
            ("nip", &self.nip),
            ("jabatan_fungsional", &self.jabatan_fungsional),
            ("tmt_cpns", &self.tmt_cpns),
            ("no_dokumen", &self.no_dokumen),
            ("tgl_dokumen", &self.tgl_dokumen),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentTeamLetterData {
    pub nama_instansi: String,
    pub jabatan_fungsional: String,
    pub no_usulan: String,
    pub anggota: Vec<AssessmentMember>,
    pub no_dokumen: String,
    pub tgl_dokumen: String,
}

impl AssessmentTeamLetterData {
    pub fn new(team: &AssessmentTeamPayload, stamp: &DocumentStamp) -> Self {
        Self {
            nama_instansi: team.nama_instansi.clone(),
            jabatan_fungsional: team.jabatan_fungsional.clone(),
            no_usulan: team.no_usulan.clone(),
            anggota: team.anggota.clone(),
            no_dokumen: stamp.no_dokumen.clone(),
            tgl_dokumen: stamp.tgl_dokumen.clone(),
        }
    }
}

impl TemplateData for AssessmentTeamLetterData {
    fn template(&self) -> TemplateKind {
        TemplateKind::AssessmentTeamLetter
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = blank(&[
            ("nama_instansi", &self.nama_instansi),
            ("jabatan_fungsional", &self.jabatan_fungsional),
            ("no_dokumen", &self.no_dokumen),
            ("tgl_dokumen", &self.tgl_dokumen),
        ]);
        if self.anggota.is_empty() {
            missing.push("anggota");
        }
        missing
    }
}
