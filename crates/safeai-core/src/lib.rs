//! Shared primitives for the SafeAI runtime policy enforcement engine.
//!
//! This crate holds the pieces every other `safeai-*` crate needs and that
//! have no business logic of their own: the tag hierarchy, the `Detection`
//! and `PolicyDecision` data model, the `Boundary`/`DecisionAction` closed
//! enums, the compact duration grammar, deterministic context hashing, and
//! prefixed ID generation.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod boundary;
mod clock;
mod decision;
mod detection;
mod duration;
mod error;
mod hash;
mod ids;
mod tag;

pub use boundary::{AuditAction, Boundary, DecisionAction};
pub use clock::{system_clock, Clock, SharedClock, SystemClock};
pub use decision::PolicyDecision;
pub use detection::Detection;
pub use duration::{parse_duration, parse_last_window};
pub use error::{Result, SafeAiError};
pub use hash::context_hash;
pub use ids::{new_approval_request_id, new_capability_token_id, new_event_id};
pub use tag::{expand_tags, normalize_tag, tags_intersect_hierarchically};
