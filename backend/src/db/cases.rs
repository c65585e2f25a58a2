use crate::db::conversion_error;
use chrono::{DateTime, Utc};
use common::model::case::{CaseRecord, CaseStatus, WorkflowKind};
use rusqlite::{params, Connection, OptionalExtension, Row};

const COLUMNS: &str = "id, workflow, status, payload, document_number, document_date, \
                       signer_id, note, created_at, modified_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<CaseRecord> {
    let workflow: String = row.get(1)?;
    let status: String = row.get(2)?;
    let payload: String = row.get(3)?;
    Ok(CaseRecord {
        id: row.get(0)?,
        workflow: workflow.parse().map_err(|e| conversion_error(1, e))?,
        status: status.parse().map_err(|e| conversion_error(2, e))?,
        payload: serde_json::from_str(&payload).map_err(|e| conversion_error(3, e.to_string()))?,
        document_number: row.get(4)?,
        document_date: row.get(5)?,
        signer_id: row.get(6)?,
        note: row.get(7)?,
        created_at: row.get(8)?,
        modified_at: row.get(9)?,
        documents: Vec::new(),
    })
}

pub fn insert(conn: &Connection, case: &CaseRecord) -> rusqlite::Result<()> {
    conn.execute(
        &format!("INSERT INTO cases ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)", COLUMNS),
        params![
            case.id,
            case.workflow.as_str(),
            case.status.as_str(),
            case.payload.to_string(),
            case.document_number,
            case.document_date,
            case.signer_id,
            case.note,
            case.created_at,
            case.modified_at,
        ],
    )?;
    Ok(())
}

/// The case without its documents.
pub fn find(conn: &Connection, id: &str) -> rusqlite::Result<Option<CaseRecord>> {
    conn.query_row(
        &format!("SELECT {} FROM cases WHERE id = ?1", COLUMNS),
        params![id],
        from_row,
    )
    .optional()
}

pub fn update_status(
    conn: &Connection,
    id: &str,
    status: CaseStatus,
    note: Option<&str>,
    now: DateTime<Utc>,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE cases SET status = ?1, note = COALESCE(?2, note), modified_at = ?3 WHERE id = ?4",
        params![status.as_str(), note, now, id],
    )?;
    Ok(())
}

/// Moves the case to `accepted` and stores the number, date and signer used
/// on its generated documents.
pub fn accept(
    conn: &Connection,
    id: &str,
    document_number: &str,
    document_date: &str,
    signer_id: &str,
    note: Option<&str>,
    now: DateTime<Utc>,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE cases SET status = ?1, document_number = ?2, document_date = ?3, signer_id = ?4,
             note = COALESCE(?5, note), modified_at = ?6
         WHERE id = ?7",
        params![
            CaseStatus::Accepted.as_str(),
            document_number,
            document_date,
            signer_id,
            note,
            now,
            id
        ],
    )?;
    Ok(())
}

/// Payloads of every case of a workflow.
pub fn payloads(conn: &Connection, workflow: WorkflowKind) -> rusqlite::Result<Vec<serde_json::Value>> {
    let mut stmt = conn.prepare("SELECT payload FROM cases WHERE workflow = ?1")?;
    let rows = stmt.query_map(params![workflow.as_str()], |row| row.get::<_, String>(0))?;
    rows.map(|text| {
        let text = text?;
        serde_json::from_str(&text).map_err(|e| conversion_error(0, e.to_string()))
    })
    .collect()
}
