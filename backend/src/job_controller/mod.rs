//! Background jobs tracked outside the request cycle.

pub mod state;
