//! Audit trail of accepted survey transitions.
//!
//! The survey appends one record per accepted configuration, vote,
//! finalization and grant. Rejected operations leave no record.

mod events;
mod log;

pub use events::AuditEvent;
pub use log::{AuditError, AuditLog, AuditRecord, GENESIS_HASH, PendingRecord};
