//! Schema-bound, per-agent, TTL'd memory controller (spec component C14).

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod controller;
mod model;
mod registry;

pub use controller::MemoryController;
pub use model::{FieldType, MemoryEntry, MemoryField, MemoryScope, MemorySchema, MemorySchemaDocument};
pub use registry::MemoryRegistry;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use safeai_audit::AuditLogger;
    use safeai_policy::Engine as PolicyEngine;

    use super::*;

    fn sample_schema() -> MemorySchema {
        MemorySchema {
            name: "conversation".to_string(),
            scope: MemoryScope::Session,
            fields: vec![
                MemoryField {
                    name: "notes".to_string(),
                    field_type: FieldType::String,
                    tag: "personal.pii".to_string(),
                    retention: None,
                    encrypted: false,
                    required: false,
                },
                MemoryField {
                    name: "ssn".to_string(),
                    field_type: FieldType::String,
                    tag: "personal.pii.ssn".to_string(),
                    retention: Some("1h".to_string()),
                    encrypted: true,
                    required: false,
                },
            ],
            max_entries: 1,
            default_retention: "1h".to_string(),
        }
    }

    #[test]
    fn write_rejects_undeclared_key() {
        let controller = MemoryController::new(sample_schema());
        assert!(!controller.write("agent-1", "unknown", json!("x")));
    }

    #[test]
    fn write_rejects_type_mismatch() {
        let controller = MemoryController::new(sample_schema());
        assert!(!controller.write("agent-1", "notes", json!(42)));
    }

    #[test]
    fn max_entries_blocks_new_key_but_allows_update() {
        let controller = MemoryController::new(sample_schema());
        assert!(controller.write("agent-1", "notes", json!("first")));
        assert!(!controller.write("agent-1", "ssn", json!("123-45-6789")));
        assert!(controller.write("agent-1", "notes", json!("updated")));
        assert_eq!(controller.read("agent-1", "notes"), Some(json!("updated")));
    }

    #[test]
    fn encrypted_read_returns_handle_not_plaintext() {
        let controller = MemoryController::new(MemorySchema { max_entries: 5, ..sample_schema() });
        controller.write("agent-1", "ssn", json!("123-45-6789"));
        let value = controller.read("agent-1", "ssn").unwrap();
        let handle_id = value.as_str().unwrap();
        assert!(handle_id.starts_with("hdl_"));
        assert_ne!(handle_id, "123-45-6789");
    }

    #[test]
    fn resolve_handle_requires_matching_owner() {
        let controller = MemoryController::new(MemorySchema { max_entries: 5, ..sample_schema() });
        controller.write("agent-1", "ssn", json!("123-45-6789"));
        let handle = controller.read("agent-1", "ssn").unwrap();
        let handle_id = handle.as_str().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let audit = AuditLogger::open(dir.path().join("audit.jsonl")).unwrap();
        let policy = PolicyEngine::new();

        assert!(controller.resolve_handle(handle_id, "agent-2", &policy, &audit).is_none());
        let resolved = controller.resolve_handle(handle_id, "agent-1", &policy, &audit);
        // Default-deny policy engine blocks resolution until a rule allows it.
        assert!(resolved.is_none());
    }

    #[test]
    fn purge_expired_removes_elapsed_entries_and_emits_event() {
        use std::sync::Arc;

        struct FixedClock(std::sync::Mutex<chrono::DateTime<chrono::Utc>>);
        impl safeai_core::Clock for FixedClock {
            fn now(&self) -> chrono::DateTime<chrono::Utc> {
                *self.0.lock().unwrap()
            }
        }

        let clock = Arc::new(FixedClock(std::sync::Mutex::new(chrono::Utc::now())));
        let schema = MemorySchema {
            fields: vec![MemoryField {
                name: "notes".to_string(),
                field_type: FieldType::String,
                tag: "personal.pii".to_string(),
                retention: Some("1s".to_string()),
                encrypted: false,
                required: false,
            }],
            max_entries: 5,
            ..sample_schema()
        };
        let controller = MemoryController::with_clock(schema, clock.clone());
        controller.write("agent-1", "notes", json!("hello"));

        *clock.0.lock().unwrap() = chrono::Utc::now() + chrono::Duration::seconds(2);

        let dir = tempfile::tempdir().unwrap();
        let audit = AuditLogger::open(dir.path().join("audit.jsonl")).unwrap();
        let removed = controller.purge_expired(&audit);
        assert_eq!(removed, 1);
        assert!(controller.read("agent-1", "notes").is_none());
    }
}
