//! Append-only JSONL audit log with deterministic event hashing and an
//! in-process, filterable query surface (spec component C4).

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod event;
mod logger;
mod query;

pub use event::{AuditEvent, AuditEventBuilder};
pub use logger::AuditLogger;
pub use query::{query, AuditFilter};

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use safeai_core::{AuditAction, Boundary};

    use super::*;

    #[test]
    fn emit_writes_one_line_and_computes_hash() {
        let dir = tempfile::tempdir().unwrap();
        let logger = AuditLogger::open(dir.path().join("audit.jsonl")).unwrap();
        let event = AuditEventBuilder::new(Boundary::Input, AuditAction::Block)
            .reason("default deny")
            .agent_id("agent-1")
            .build();
        let written = logger.emit(event).unwrap();
        assert!(written.context_hash.starts_with("sha256:"));

        let contents = std::fs::read_to_string(logger.path()).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }

    #[test]
    fn callbacks_run_after_write_and_panics_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let logger = AuditLogger::open(dir.path().join("audit.jsonl")).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        logger.on_emit(move |_event| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });
        logger.on_emit(|_event| panic!("callback boom"));

        let event = AuditEventBuilder::new(Boundary::Output, AuditAction::Allow)
            .reason("ok")
            .agent_id("agent-1")
            .build();
        let result = logger.emit(event);
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn query_filters_by_boundary_and_respects_limit() {
        let dir = tempfile::tempdir().unwrap();
        let logger = AuditLogger::open(dir.path().join("audit.jsonl")).unwrap();
        for _ in 0..3 {
            let e = AuditEventBuilder::new(Boundary::Input, AuditAction::Allow)
                .reason("ok")
                .agent_id("a")
                .build();
            logger.emit(e).unwrap();
        }
        let e = AuditEventBuilder::new(Boundary::Output, AuditAction::Allow)
            .reason("ok")
            .agent_id("a")
            .build();
        logger.emit(e).unwrap();

        let filter = AuditFilter { boundary: Some(Boundary::Input), limit: Some(2), ..Default::default() };
        let results = query(&logger, &filter).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|e| e.boundary == Boundary::Input));
    }

    #[test]
    fn query_on_missing_file_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let logger = AuditLogger::open(dir.path().join("audit.jsonl")).unwrap();
        std::fs::remove_file(logger.path()).unwrap();
        let results = query(&logger, &AuditFilter::default()).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn data_tag_filter_matches_hierarchically() {
        let dir = tempfile::tempdir().unwrap();
        let logger = AuditLogger::open(dir.path().join("audit.jsonl")).unwrap();
        let e = AuditEventBuilder::new(Boundary::Input, AuditAction::Redact)
            .reason("pii redacted")
            .agent_id("a")
            .data_tags(vec!["personal.pii.ssn".to_string()])
            .build();
        logger.emit(e).unwrap();

        let filter = AuditFilter { data_tag: Some("personal".to_string()), ..Default::default() };
        let results = query(&logger, &filter).unwrap();
        assert_eq!(results.len(), 1);
    }
}
