//! Case status machine.
//!
//! ```text
//! created ──revision──▶ revision ──resubmit──▶ created
//! created ──accept────▶ accepted ──publish───▶ cert_published | verified
//! created | revision ──reject──▶ rejected
//! ```

use crate::error::AppError;
use common::model::case::{CaseStatus, WorkflowKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Revision,
    Resubmit,
    Accept,
    Reject,
    Publish,
}

impl Transition {
    pub fn as_str(self) -> &'static str {
        match self {
            Transition::Revision => "revision",
            Transition::Resubmit => "resubmit",
            Transition::Accept => "accept",
            Transition::Reject => "reject",
            Transition::Publish => "publish",
        }
    }
}

/// Status reached by applying `transition` to a case in `current`.
pub fn next_status(
    workflow: WorkflowKind,
    current: CaseStatus,
    transition: Transition,
) -> Result<CaseStatus, AppError> {
    use common::model::case::CaseStatus::*;

    match (transition, current) {
        (Transition::Revision, Created) => Ok(Revision),
        (Transition::Resubmit, Revision) => Ok(Created),
        (Transition::Accept, Created) => Ok(Accepted),
        (Transition::Accept, Accepted) => Err(AppError::AlreadyAccepted),
        (Transition::Reject, Created | Revision) => Ok(Rejected),
        (Transition::Publish, status) => match workflow.terminal_extension() {
            None => Err(AppError::BadRequest(format!(
                "{} cases have no publish step",
                workflow
            ))),
            Some(terminal) if status == Accepted => Ok(terminal),
            Some(_) => Err(AppError::ProcessedFurther(status)),
        },
        (_, status) => Err(AppError::ProcessedFurther(status)),
    }
}

/// Generated documents exist only for accepted cases and their terminal
/// extension.
pub fn ensure_generatable(workflow: WorkflowKind, status: CaseStatus) -> Result<(), AppError> {
    if status == CaseStatus::Accepted || workflow.terminal_extension() == Some(status) {
        Ok(())
    } else {
        Err(AppError::NotAccepted(status))
    }
}
