//! Workflow specific case payloads.
//!
//! Payloads are stored as JSON next to the case row and are the source for
//! the template data handed to the renderer once the case is accepted.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Collects the names of blank required fields.
fn blank_fields<'a>(fields: &[(&'a str, &str)]) -> Vec<&'a str> {
    fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect()
}

fn require(fields: &[(&str, &str)]) -> Result<(), String> {
    let missing = blank_fields(fields);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(format!("missing required fields: {}", missing.join(", ")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendee {
    pub id: String,
    pub nama: String,
    pub nip: String,
    #[serde(default)]
    pub tempat_lahir: String,
    #[serde(default)]
    pub tgl_lahir: String,
    /// Temp key of the uploaded photo at submit time, permanent key afterwards.
    #[serde(default)]
    pub foto: Option<String>,
    pub jabatan_fungsional: String,
    pub instansi: String,
    #[serde(default)]
    pub kualifikasi: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityPayload {
    pub kegiatan: String,
    pub instansi_penyelenggara: String,
    #[serde(default)]
    pub deskripsi: String,
    #[serde(default)]
    pub durasi: String,
    pub tgl_mulai: String,
    pub tgl_selesai: String,
    pub no_usulan: String,
    pub attendees: Vec<Attendee>,
}

impl ActivityPayload {
    pub fn validate(&self) -> Result<(), String> {
        require(&[
            ("kegiatan", &self.kegiatan),
            ("instansi_penyelenggara", &self.instansi_penyelenggara),
            ("tgl_mulai", &self.tgl_mulai),
            ("tgl_selesai", &self.tgl_selesai),
            ("no_usulan", &self.no_usulan),
        ])?;
        if self.attendees.is_empty() {
            return Err("an activity needs at least one attendee".to_string());
        }
        let mut seen = HashSet::new();
        for attendee in &self.attendees {
            require(&[
                ("attendees.id", &attendee.id),
                ("attendees.nama", &attendee.nama),
                ("attendees.nip", &attendee.nip),
                ("attendees.jabatan_fungsional", &attendee.jabatan_fungsional),
                ("attendees.instansi", &attendee.instansi),
            ])?;
            if !seen.insert(attendee.id.as_str()) {
                return Err(format!("duplicate attendee id '{}'", attendee.id));
            }
        }
        Ok(())
    }

    pub fn attendee(&self, id: &str) -> Option<&Attendee> {
        self.attendees.iter().find(|a| a.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementNeed {
    pub jabatan_fungsional: String,
    pub jumlah: u32,
    /// Current headcount in the position.
    #[serde(default)]
    pub bezetting: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementPayload {
    pub nama_instansi: String,
    pub no_usulan: String,
    pub tgl_usulan: String,
    pub kebutuhan: Vec<RequirementNeed>,
}

impl RequirementPayload {
    pub fn validate(&self) -> Result<(), String> {
        require(&[
            ("nama_instansi", &self.nama_instansi),
            ("no_usulan", &self.no_usulan),
            ("tgl_usulan", &self.tgl_usulan),
        ])?;
        if self.kebutuhan.is_empty() {
            return Err("a requirement needs at least one position".to_string());
        }
        for need in &self.kebutuhan {
            require(&[("kebutuhan.jabatan_fungsional", &need.jabatan_fungsional)])?;
            if need.jumlah == 0 {
                return Err(format!(
                    "requested amount for '{}' must be positive",
                    need.jabatan_fungsional
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DismissalPayload {
    pub nama: String,
    pub nip: String,
    pub jabatan_fungsional: String,
    pub instansi: String,
    pub alasan: String,
    pub no_usulan: String,
    pub tgl_usulan: String,
}

impl DismissalPayload {
    pub fn validate(&self) -> Result<(), String> {
        require(&[
            ("nama", &self.nama),
            ("nip", &self.nip),
            ("jabatan_fungsional", &self.jabatan_fungsional),
            ("instansi", &self.instansi),
            ("alasan", &self.alasan),
            ("no_usulan", &self.no_usulan),
            ("tgl_usulan", &self.tgl_usulan),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionPayload {
    pub nama: String,
    pub nip: String,
    pub jabatan_fungsional: String,
    pub instansi: String,
    pub pangkat_lama: String,
    pub pangkat_baru: String,
    pub angka_kredit: String,
    pub no_usulan: String,
}

impl PromotionPayload {
    pub fn validate(&self) -> Result<(), String> {
        require(&[
            ("nama", &self.nama),
            ("nip", &self.nip),
            ("jabatan_fungsional", &self.jabatan_fungsional),
            ("instansi", &self.instansi),
            ("pangkat_lama", &self.pangkat_lama),
            ("pangkat_baru", &self.pangkat_baru),
            ("angka_kredit", &self.angka_kredit),
            ("no_usulan", &self.no_usulan),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionCpnsPayload {
    pub nama: String,
    pub nip: String,
    pub jabatan_fungsional: String,
    pub instansi: String,
    pub tmt_cpns: String,
    pub no_usulan: String,
}

impl PromotionCpnsPayload {
    pub fn validate(&self) -> Result<(), String> {
        require(&[
            ("nama", &self.nama),
            ("nip", &self.nip),
            ("jabatan_fungsional", &self.jabatan_fungsional),
            ("instansi", &self.instansi),
            ("tmt_cpns", &self.tmt_cpns),
            ("no_usulan", &self.no_usulan),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentMember {
    pub nama: String,
    pub nip: String,
    pub peran: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentTeamPayload {
    pub nama_instansi: String,
    pub jabatan_fungsional: String,
    pub no_usulan: String,
    pub anggota: Vec<AssessmentMember>,
}

impl AssessmentTeamPayload {
    pub fn validate(&self) -> Result<(), String> {
        require(&[
            ("nama_instansi", &self.nama_instansi),
            ("jabatan_fungsional", &self.jabatan_fungsional),
            ("no_usulan", &self.no_usulan),
        ])?;
        if self.anggota.is_empty() {
            return Err("an assessment team needs at least one member".to_string());
        }
        for member in &self.anggota {
            require(&[
                ("anggota.nama", &member.nama),
                ("anggota.nip", &member.nip),
                ("anggota.peran", &member.peran),
            ])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attendee(id: &str) -> Attendee {
        Attendee {
            id: id.to_string(),
            nama: "Siti Aminah".to_string(),
            nip: "198701012010012001".to_string(),
            tempat_lahir: "Bandung".to_string(),
            tgl_lahir: "1 Januari 1987".to_string(),
            foto: None,
            jabatan_fungsional: "Analis Kepegawaian".to_string(),
            instansi: "Pemerintah Kota Bandung".to_string(),
            kualifikasi: "Ahli Pertama".to_string(),
        }
    }

    fn activity() -> ActivityPayload {
        ActivityPayload {
            kegiatan: "Pelatihan Analis Kepegawaian".to_string(),
            instansi_penyelenggara: "Badan Kepegawaian Negara".to_string(),
            deskripsi: String::new(),
            durasi: "40 JP".to_string(),
            tgl_mulai: "2 Maret 2026".to_string(),
            tgl_selesai: "6 Maret 2026".to_string(),
            no_usulan: "USL-001".to_string(),
            attendees: vec![attendee("a1")],
        }
    }

    #[test]
    fn activity_requires_attendees_with_unique_ids() {
        assert!(activity().validate().is_ok());

        let mut empty = activity();
        empty.attendees.clear();
        assert!(empty.validate().is_err());

        let mut dup = activity();
        dup.attendees.push(attendee("a1"));
        let err = dup.validate().unwrap_err();
        assert!(err.contains("duplicate attendee id 'a1'"));
    }

    #[test]
    fn blank_fields_are_reported_by_name() {
        let payload = DismissalPayload {
            nama: "Budi".to_string(),
            nip: " ".to_string(),
            jabatan_fungsional: "Pranata Komputer".to_string(),
            instansi: "BKN".to_string(),
            alasan: String::new(),
            no_usulan: "USL-9".to_string(),
            tgl_usulan: "1 Mei 2026".to_string(),
        };
        assert_eq!(
            payload.validate().unwrap_err(),
            "missing required fields: nip, alasan"
        );
    }

    #[test]
    fn requirement_rejects_zero_amounts() {
        let payload = RequirementPayload {
            nama_instansi: "Kabupaten Sleman".to_string(),
            no_usulan: "USL-2".to_string(),
            tgl_usulan: "3 Mei 2026".to_string(),
            kebutuhan: vec![RequirementNeed {
                jabatan_fungsional: "Arsiparis".to_string(),
                jumlah: 0,
                bezetting: 4,
            }],
        };
        assert!(payload.validate().unwrap_err().contains("Arsiparis"));
    }
}
