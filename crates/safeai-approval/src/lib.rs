//! Durable approval workflow (spec component C8): pending/approved/denied/
//! expired requests, dedup-keyed creation, file-backed persistence with
//! cross-process mtime reload.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod manager;
mod model;

pub use manager::{ApprovalManager, ApprovalValidationResult};
pub use model::{ApprovalRequest, ApprovalStatus};
