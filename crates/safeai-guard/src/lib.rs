//! Composition root for the four enforcement boundaries: input scanner,
//! structured scanner, output guard, and the action interceptor, plus the
//! agent-to-agent message pipeline. Each module wires shared
//! classifier/policy/registry/audit handles into one boundary's
//! classify → tag → policy → action flow.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod action;
mod input;
mod message;
mod output;
mod redact;
mod structured;

pub use action::{ActionInterceptor, InterceptResult, ResponseInterceptResult, ToolCall};
pub use input::{InputScanner, ScanResult};
pub use message::{AgentMessage, AgentMessagePipeline, AgentMessageResult};
pub use output::{render_template, GuardResult, OutputGuard};
pub use redact::redact_spans;
pub use structured::{LeafDetections, StructuredScanResult, StructuredScanner};
