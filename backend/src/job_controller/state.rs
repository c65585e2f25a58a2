//! State of background jobs.
//!
//! Jobs such as the storage reconciliation sweep run outside the
//! request/response cycle. Handlers register a job as `Pending` and hand its
//! id to the client; the worker reports progress through an MPSC channel and
//! `start_job_updater` applies those updates to the shared map that the
//! status endpoint reads.

use common::jobs::JobStatus;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, RwLock};

/// Shared map of job statuses plus the sender workers report through.
/// Injected into the application as `web::Data`.
#[derive(Clone)]
pub struct JobsState {
    pub jobs: Arc<RwLock<HashMap<String, JobStatus>>>,
    pub tx: mpsc::Sender<JobUpdate>,
}

#[derive(Debug)]
pub struct JobUpdate {
    pub(crate) job_id: String,
    pub(crate) status: JobStatus,
}

impl JobsState {
    /// A fresh state and the receiver to hand to [`start_job_updater`].
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<JobUpdate>) {
        let (tx, rx) = mpsc::channel(capacity);
        let state = Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            tx,
        };
        (state, rx)
    }

    /// Registers a new job as pending and returns its id.
    pub async fn register(&self) -> String {
        let job_id = uuid::Uuid::new_v4().to_string();
        self.jobs
            .write()
            .await
            .insert(job_id.clone(), JobStatus::Pending);
        job_id
    }

    pub async fn set(&self, job_id: &str, status: JobStatus) {
        self.jobs.write().await.insert(job_id.to_string(), status);
    }

    pub async fn status(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs.read().await.get(job_id).cloned()
    }
}

/// Applies job updates until every sender is gone. Spawned once at startup.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        // A late progress report must not overwrite a final status.
        if matches!(
            jobs.get(&update.job_id),
            Some(JobStatus::Completed(_)) | Some(JobStatus::Failed(_))
        ) && matches!(update.status, JobStatus::InProgress(_))
        {
            continue;
        }
        jobs.insert(update.job_id, update.status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn updates_flow_through_the_channel() {
        let (state, rx) = JobsState::new(8);
        let job_id = state.register().await;
        assert_eq!(state.status(&job_id).await, Some(JobStatus::Pending));

        // The updater gets its own sender so dropping ours closes the channel.
        let (unused_tx, _unused_rx) = mpsc::channel(1);
        let updater_state = JobsState {
            jobs: state.jobs.clone(),
            tx: unused_tx,
        };
        let tx = state.tx.clone();
        let updater = tokio::spawn(start_job_updater(updater_state, rx));
        tx.send(JobUpdate {
            job_id: job_id.clone(),
            status: JobStatus::InProgress(50),
        })
        .await
        .unwrap();
        state.set(&job_id, JobStatus::Completed("{}".into())).await;
        tx.send(JobUpdate {
            job_id: job_id.clone(),
            status: JobStatus::InProgress(90),
        })
        .await
        .unwrap();

        drop(tx);
        let JobsState { tx: state_tx, jobs } = state;
        drop(state_tx);
        updater.await.unwrap();

        let jobs = jobs.read().await;
        assert_eq!(jobs.get(&job_id), Some(&JobStatus::Completed("{}".into())));
        assert!(jobs.get("unknown").is_none());
    }
}
