//! # Tool Usage Events
//!
//! A [`ToolUsageEvent`] records one attempted use of an AI tool by an
//! agency-side actor. Events are immutable — they are created at evaluation
//! time and stored verbatim inside decision context snapshots, which is
//! what makes later replay possible.
//!
//! ## Field Paths
//!
//! Rule clauses address event fields by dot path (`tool.version`,
//! `actor.role`). Resolution happens over the event's canonical JSON
//! projection; an unknown path resolves to `None`, never an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The AI tool named by an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRef {
    /// Stable tool identifier (registry key).
    pub id: String,
    /// Display name, as matched by `equals` clauses.
    pub name: String,
    /// Tool version string. Free-form; version clauses parse it leniently.
    pub version: String,
}

/// The actor performing the tool usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The actor's role within their context (e.g. `designer`, `researcher`).
    pub role: String,
}

/// What the actor is doing with the tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDetail {
    /// Action category (e.g. `FinalAssetGeneration`, `Research`).
    #[serde(rename = "type")]
    pub action_type: String,
    /// Optional free-text note from the actor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// The governance scope the event occurred in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventContext {
    /// The tenant (enterprise) the event belongs to.
    pub tenant_id: String,
    /// The policy snapshot in effect when the event was evaluated.
    pub policy_snapshot_id: String,
}

/// One attempted use of an AI tool, as submitted for evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUsageEvent {
    /// The tool being used.
    pub tool: ToolRef,
    /// Who is using it.
    pub actor: Actor,
    /// What they are doing.
    pub action: ActionDetail,
    /// Where (which governance scope).
    pub context: EventContext,
    /// When the event was created.
    pub ts: DateTime<Utc>,
}

impl ToolUsageEvent {
    /// Canonical JSON projection used for dot-path field resolution.
    pub fn to_value(&self) -> serde_json::Value {
        // Serialization of a plain struct tree cannot fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Resolve a dot path (`tool.version`) within a JSON document.
///
/// Returns `None` for any missing segment or non-object traversal. Array
/// indexing is intentionally unsupported — event documents are object trees.
pub fn lookup_path<'a>(doc: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    let mut current = doc;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}
