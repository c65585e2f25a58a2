//! # Workflow Orchestrators
//!
//! All six workflows share one state machine ([`guard`]) and one service
//! ([`service::CaseService`]); what differs per workflow is the payload and
//! the template data derived from it ([`payload`]).

pub mod guard;
pub mod payload;
pub mod service;

pub use service::CaseService;
