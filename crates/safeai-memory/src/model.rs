//! `MemorySchema`/`MemoryField`/`MemoryEntry` (spec.md §3).
//!
//! Grounded on `original_source/safeai/core/memory.py`'s dataclasses and
//! `models.py`'s `MemorySchemaDocumentModel`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a schema's entries live relative to a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryScope {
    /// Scoped to one session.
    Session,
    /// Scoped to one user across sessions.
    User,
    /// Shared across all agents/users.
    Global,
}

/// Declared runtime type of a memory field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// JSON string.
    String,
    /// JSON integer (no fractional component).
    Integer,
    /// JSON number (integer or float).
    Number,
    /// JSON boolean.
    Boolean,
    /// JSON array.
    List,
    /// JSON object.
    Object,
}

impl FieldType {
    /// Whether `value`'s runtime shape matches this declared type
    /// (spec.md §3 "type-matches the value").
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::List => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

/// One declared field in a [`MemorySchema`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MemoryField {
    /// Field key, matched against the `write`/`read` key argument.
    pub name: String,
    /// Declared runtime type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Data tag associated with this field's values.
    pub tag: String,
    /// Retention override; falls back to the schema's `default_retention`.
    #[serde(default)]
    pub retention: Option<String>,
    /// Whether reads of this field return an opaque handle instead of the
    /// plaintext value.
    #[serde(default)]
    pub encrypted: bool,
    /// Reserved for future validation; not currently enforced on write.
    #[serde(default)]
    pub required: bool,
}

/// A named, versioned memory schema: the set of fields one controller
/// instance enforces.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MemorySchema {
    /// Schema name.
    pub name: String,
    /// Storage scope.
    pub scope: MemoryScope,
    /// Declared fields, keyed by name at lookup time.
    pub fields: Vec<MemoryField>,
    /// Maximum distinct keys per agent bucket; enforced only on insertion
    /// of a *new* key (updates to existing keys are always permitted).
    pub max_entries: usize,
    /// Default retention duration string, used when a field doesn't
    /// override it.
    pub default_retention: String,
}

impl MemorySchema {
    /// Looks up a declared field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&MemoryField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A single stored value with its computed expiry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MemoryEntry {
    /// The stored value (never populated for encrypted fields once read
    /// through a handle; the raw entry itself still holds plaintext at
    /// rest, matching the original's in-memory store).
    pub value: Value,
    /// When this entry expires.
    pub expires_at: chrono::DateTime<chrono::Utc>,
    /// Data tag carried for policy evaluation on handle resolution.
    pub tag: String,
    /// Whether this entry's field is declared `encrypted`.
    pub encrypted: bool,
}

/// Document envelope a schema file deserializes from: `{version, schemas}`.
/// Per spec.md §9 Open Question resolution (see `DESIGN.md`), multiple
/// schemas may be declared; [`crate::MemoryRegistry`] keeps one controller
/// per schema rather than silently keeping only the first.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MemorySchemaDocument {
    /// Schema version tag, e.g. `"v1alpha1"`.
    #[serde(default)]
    pub version: Option<String>,
    /// Declared schemas, in file order.
    pub schemas: Vec<MemorySchema>,
}
