use crate::deadline::Deadline;
use crate::error::AppError;
use crate::job_controller::state::{JobUpdate, JobsState};
use crate::maintenance;
use crate::services::AppState;
use actix_web::{web, HttpResponse, Responder};
use common::jobs::{JobStatus, ReconcileReport};
use std::time::Duration;
use tokio::sync::mpsc;

/// Upper bound for database waits inside the sweep.
const JOB_TIMEOUT: Duration = Duration::from_secs(600);

pub(crate) async fn process(
    jobs_state: web::Data<JobsState>,
    state: web::Data<AppState>,
) -> impl Responder {
    let job_id = schedule_reconcile_job(jobs_state, state).await;
    HttpResponse::Ok().body(job_id)
}

async fn schedule_reconcile_job(
    jobs_state: web::Data<JobsState>,
    state: web::Data<AppState>,
) -> String {
    let job_id = jobs_state.register().await;
    let tx = jobs_state.tx.clone();
    let js = jobs_state.clone();
    let value = job_id.clone();

    tokio::spawn(async move {
        let value_for_blocking = value.clone();
        let handle = tokio::task::spawn_blocking(move || {
            reconcile_blocking(&state, tx, value_for_blocking)
        });

        let status = match handle.await {
            Ok(Ok(report)) => match serde_json::to_string(&report) {
                Ok(json) => JobStatus::Completed(json),
                Err(e) => JobStatus::Failed(e.to_string()),
            },
            Ok(Err(e)) => {
                log::error!("reconciliation job {} failed: {}", value, e);
                JobStatus::Failed(e.to_string())
            }
            Err(join_err) => JobStatus::Failed(format!("join error: {}", join_err)),
        };
        js.set(&value, status).await;
    });

    job_id
}

fn reconcile_blocking(
    state: &AppState,
    tx: mpsc::Sender<JobUpdate>,
    job_id: String,
) -> Result<ReconcileReport, AppError> {
    let send_progress = |percent: u32| {
        let _ = tx.blocking_send(JobUpdate {
            job_id: job_id.clone(),
            status: JobStatus::InProgress(percent),
        });
    };
    send_progress(0);
    let conn = state.db.connect(&Deadline::after(JOB_TIMEOUT))?;
    maintenance::reconcile(&conn, state.storage.as_ref(), send_progress)
}
