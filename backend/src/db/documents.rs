use chrono::{DateTime, Utc};
use common::model::document::{Document, SUPPORTING_ROLE};
use rusqlite::{params, Connection, OptionalExtension, Row};

const COLUMNS: &str = "filename, document_name, role, attendee_id, document_number, document_date, \
                       signer_id, note, created_at, is_signed, signed_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Document> {
    let attendee_id: String = row.get(3)?;
    Ok(Document {
        filename: row.get(0)?,
        document_name: row.get(1)?,
        role: row.get(2)?,
        attendee_id: (!attendee_id.is_empty()).then_some(attendee_id),
        document_number: row.get(4)?,
        document_date: row.get(5)?,
        signer_id: row.get(6)?,
        note: row.get(7)?,
        created_at: row.get(8)?,
        is_signed: row.get(9)?,
        signed_at: row.get(10)?,
    })
}

pub fn insert(conn: &Connection, case_id: &str, doc: &Document) -> rusqlite::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO documents (case_id, {}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            COLUMNS
        ),
        params![
            case_id,
            doc.filename,
            doc.document_name,
            doc.role,
            doc.attendee_id.as_deref().unwrap_or(""),
            doc.document_number,
            doc.document_date,
            doc.signer_id,
            doc.note,
            doc.created_at,
            doc.is_signed,
            doc.signed_at,
        ],
    )?;
    Ok(())
}

/// Records a generated document, refreshing an unsigned row with the same
/// filename. Signed rows are left untouched.
pub fn upsert_generated(conn: &Connection, case_id: &str, doc: &Document) -> rusqlite::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO documents (case_id, {}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 0, NULL)
             ON CONFLICT (filename) DO UPDATE SET
                 document_name = excluded.document_name,
                 document_number = excluded.document_number,
                 document_date = excluded.document_date,
                 signer_id = excluded.signer_id,
                 created_at = excluded.created_at
             WHERE documents.is_signed = 0",
            COLUMNS
        ),
        params![
            case_id,
            doc.filename,
            doc.document_name,
            doc.role,
            doc.attendee_id.as_deref().unwrap_or(""),
            doc.document_number,
            doc.document_date,
            doc.signer_id,
            doc.note,
            doc.created_at,
        ],
    )?;
    Ok(())
}

pub fn list(conn: &Connection, case_id: &str) -> rusqlite::Result<Vec<Document>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM documents WHERE case_id = ?1 ORDER BY id",
        COLUMNS
    ))?;
    let rows = stmt.query_map(params![case_id], from_row)?;
    rows.collect()
}

pub fn find(conn: &Connection, case_id: &str, filename: &str) -> rusqlite::Result<Option<Document>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM documents WHERE case_id = ?1 AND filename = ?2",
            COLUMNS
        ),
        params![case_id, filename],
        from_row,
    )
    .optional()
}

pub fn count_supporting(conn: &Connection, case_id: &str) -> rusqlite::Result<usize> {
    conn.query_row(
        "SELECT COUNT(*) FROM documents WHERE case_id = ?1 AND role = ?2",
        params![case_id, SUPPORTING_ROLE],
        |row| row.get(0),
    )
}

/// Stamps a document as signed. Returns false when it was already signed.
pub fn mark_signed(
    conn: &Connection,
    case_id: &str,
    filename: &str,
    signer_id: Option<&str>,
    now: DateTime<Utc>,
) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE documents SET is_signed = 1, signed_at = ?1, signer_id = COALESCE(?2, signer_id)
         WHERE case_id = ?3 AND filename = ?4 AND is_signed = 0",
        params![now, signer_id, case_id, filename],
    )?;
    Ok(changed == 1)
}

/// Every stored filename, sorted.
pub fn all_filenames(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT filename FROM documents ORDER BY filename")?;
    let rows = stmt.query_map([], |row| row.get(0))?;
    rows.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{cases, Database};
    use crate::deadline::Deadline;
    use common::model::case::{CaseRecord, CaseStatus, WorkflowKind};
    use std::time::Duration;

    fn generated(filename: &str, created_at: DateTime<Utc>) -> Document {
        Document {
            filename: filename.to_string(),
            document_name: "Sertifikat Kegiatan".to_string(),
            role: "certificate".to_string(),
            attendee_id: Some("A1".to_string()),
            document_number: Some("800/1".to_string()),
            document_date: Some("2024-05-01".to_string()),
            signer_id: Some("NIP-1".to_string()),
            note: None,
            created_at,
            is_signed: false,
            signed_at: None,
        }
    }

    fn setup() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("jf.sqlite")).unwrap();
        let conn = db.connect(&Deadline::after(Duration::from_secs(5))).unwrap();
        let now = Utc::now();
        cases::insert(
            &conn,
            &CaseRecord {
                id: "C1".to_string(),
                workflow: WorkflowKind::Activity,
                status: CaseStatus::Accepted,
                payload: serde_json::json!({}),
                document_number: None,
                document_date: None,
                signer_id: None,
                note: None,
                created_at: now,
                modified_at: now,
                documents: Vec::new(),
            },
        )
        .unwrap();
        (dir, conn)
    }

    #[test]
    fn upsert_refreshes_unsigned_rows_only() {
        let (_dir, conn) = setup();
        let first = Utc::now();
        upsert_generated(&conn, "C1", &generated("cert/C1-A1.pdf", first)).unwrap();
        let second = first + chrono::Duration::seconds(10);
        upsert_generated(&conn, "C1", &generated("cert/C1-A1.pdf", second)).unwrap();

        let docs = list(&conn, "C1").unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].created_at, second);
        assert_eq!(docs[0].attendee_id.as_deref(), Some("A1"));

        assert!(mark_signed(&conn, "C1", "cert/C1-A1.pdf", None, second).unwrap());
        assert!(!mark_signed(&conn, "C1", "cert/C1-A1.pdf", None, second).unwrap());

        let third = second + chrono::Duration::seconds(10);
        upsert_generated(&conn, "C1", &generated("cert/C1-A1.pdf", third)).unwrap();
        let signed = find(&conn, "C1", "cert/C1-A1.pdf").unwrap().unwrap();
        assert!(signed.is_signed);
        assert_eq!(signed.created_at, second);
    }

    #[test]
    fn supporting_documents_are_counted_per_case() {
        let (_dir, conn) = setup();
        let mut doc = generated("activity/C1-doc0.pdf", Utc::now());
        doc.role = SUPPORTING_ROLE.to_string();
        doc.attendee_id = None;
        insert(&conn, "C1", &doc).unwrap();

        assert_eq!(count_supporting(&conn, "C1").unwrap(), 1);
        assert_eq!(count_supporting(&conn, "C2").unwrap(), 0);
        assert_eq!(all_filenames(&conn).unwrap(), vec!["activity/C1-doc0.pdf"]);
        assert!(find(&conn, "C1", "activity/C1-doc0.pdf").unwrap().unwrap().attendee_id.is_none());
    }
}
