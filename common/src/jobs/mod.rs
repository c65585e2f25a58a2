use serde::{Deserialize, Serialize};

/// Status of a background job tracked by the backend job controller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    /// Percentage of the job done so far.
    InProgress(u32),
    /// Carries the JSON encoded job result.
    Completed(String),
    Failed(String),
}

/// Result of a storage reconciliation sweep.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Expired temp uploads removed by the sweep.
    pub purged_temp: usize,
    /// Permanent objects no case row refers to.
    pub orphaned_objects: Vec<String>,
    /// Keys recorded on cases whose object is gone.
    pub missing_objects: Vec<String>,
}
