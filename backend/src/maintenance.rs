//! Storage reconciliation.
//!
//! Case rows are written in a transaction while file promotion is a separate
//! step, so the two can drift apart: a rolled back submit may leave promoted
//! copies behind and an object may disappear under a committed row. The sweep
//! purges expired uploads and reports both kinds of drift without deleting
//! anything permanent.

use crate::db::{cases, documents};
use crate::error::AppError;
use crate::storage::keys::document_prefixes;
use crate::storage::{Area, ObjectStorage};
use common::jobs::ReconcileReport;
use common::model::case::WorkflowKind;
use common::model::payload::ActivityPayload;
use rusqlite::Connection;
use std::collections::BTreeSet;

/// Keys the relational store refers to: document rows and attendee photos.
pub fn referenced_keys(conn: &Connection) -> Result<BTreeSet<String>, AppError> {
    let mut keys: BTreeSet<String> = documents::all_filenames(conn)?.into_iter().collect();
    for payload in cases::payloads(conn, WorkflowKind::Activity)? {
        match serde_json::from_value::<ActivityPayload>(payload) {
            Ok(activity) => keys.extend(activity.attendees.into_iter().filter_map(|a| a.foto)),
            Err(e) => log::warn!("skipping unreadable activity payload: {}", e),
        }
    }
    Ok(keys)
}

pub fn stored_keys(storage: &dyn ObjectStorage) -> Result<BTreeSet<String>, AppError> {
    let mut keys = BTreeSet::new();
    for prefix in document_prefixes() {
        keys.extend(storage.list(Area::Permanent, &prefix)?);
    }
    Ok(keys)
}

/// Runs the full sweep, calling `progress` with a percentage between steps.
pub fn reconcile(
    conn: &Connection,
    storage: &dyn ObjectStorage,
    progress: impl Fn(u32),
) -> Result<ReconcileReport, AppError> {
    let purged_temp = storage.purge_expired_temp()?;
    progress(30);
    let referenced = referenced_keys(conn)?;
    progress(60);
    let stored = stored_keys(storage)?;
    progress(90);

    let report = ReconcileReport {
        purged_temp,
        orphaned_objects: stored.difference(&referenced).cloned().collect(),
        missing_objects: referenced.difference(&stored).cloned().collect(),
    };
    log::info!(
        "reconciliation purged {} uploads, {} orphaned and {} missing objects",
        report.purged_temp,
        report.orphaned_objects.len(),
        report.missing_objects.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deadline::Deadline;
    use crate::test_support::TestEnv;
    use common::requests::SubmitCaseRequest;
    use serde_json::json;
    use std::cell::RefCell;
    use std::time::Duration;

    #[tokio::test]
    async fn reports_orphans_and_missing_objects() {
        let env = TestEnv::new();
        env.put_temp("laporan.pdf", b"%PDF");
        let request: SubmitCaseRequest = serde_json::from_value(json!({
            "payload": {
                "nama": "Rina", "nip": "1990", "jabatan_fungsional": "Analis",
                "instansi": "BKN", "alasan": "Pensiun", "no_usulan": "U-1",
                "tgl_usulan": "2024-01-01"
            },
            "documents": [{"filename": "laporan.pdf", "document_name": "Laporan"}]
        }))
        .unwrap();
        let deadline = Deadline::after(Duration::from_secs(10));
        let case = env
            .service
            .submit(WorkflowKind::Dismissal, request, &deadline)
            .await
            .unwrap();

        let kept = format!("dismissal/{}-doc0.pdf", case.id);
        env.storage
            .put(Area::Permanent, "dismissal/ghost-doc0.pdf", "application/pdf", &mut &b"x"[..])
            .unwrap();

        let conn = env.db.connect(&deadline).unwrap();
        let steps = RefCell::new(Vec::new());
        let report = reconcile(&conn, env.storage.as_ref(), |p| steps.borrow_mut().push(p)).unwrap();
        assert_eq!(report.orphaned_objects, vec!["dismissal/ghost-doc0.pdf"]);
        assert!(report.missing_objects.is_empty());
        assert_eq!(steps.into_inner(), vec![30, 60, 90]);

        env.storage.delete(Area::Permanent, &kept).unwrap();
        let report = reconcile(&conn, env.storage.as_ref(), |_| {}).unwrap();
        assert_eq!(report.missing_objects, vec![kept]);
    }
}
