//! # Policy Rules & Condition Trees
//!
//! A [`PolicyRule`] pairs a recursive condition tree with the decision to
//! return when the tree matches. The serde representation follows the wire
//! schema policy authors write:
//!
//! ```json
//! {
//!   "rule_id": "R1-PROHIBIT-OLD-MJ",
//!   "name": "Prohibit Midjourney < 6.0.0",
//!   "priority": 10,
//!   "is_active": true,
//!   "context_id": "global-media-tools",
//!   "conditions": {
//!     "operator": "AND",
//!     "clauses": [
//!       { "field": "tool.name", "operator": "equals", "value": "Midjourney" },
//!       { "field": "tool.version", "operator": "semver_less_than", "value": "6.0.0" }
//!     ]
//!   },
//!   "decision": { "status": "Prohibited", "reason": "...", "audit_trigger": true }
//! }
//! ```
//!
//! Group members may themselves be groups — the tree is recursive. The
//! operator enums are closed: adding an operator is a compile-time change
//! that forces every `match` to be revisited.

use serde::{Deserialize, Serialize};

use crate::verdict::VerdictStatus;

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

/// Combinator for a condition group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupOperator {
    /// All member conditions must hold. An empty group holds vacuously.
    And,
    /// At least one member condition must hold. An empty group never holds.
    Or,
}

/// Comparison operator for a leaf clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseOperator {
    /// Strict equality against the resolved field value.
    Equals,
    /// Dotted-version numeric compare: field value strictly below the
    /// clause value. Malformed versions degrade to `false`.
    SemverLessThan,
}

// ---------------------------------------------------------------------------
// Condition tree
// ---------------------------------------------------------------------------

/// A leaf comparison against one event field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    /// Dot path into the event document (`tool.version`).
    pub field: String,
    /// How to compare.
    pub operator: ClauseOperator,
    /// The value to compare against.
    pub value: serde_json::Value,
}

/// A combinator node over child conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionGroup {
    /// AND or OR.
    pub operator: GroupOperator,
    /// Member conditions; each may be a clause or a nested group.
    pub clauses: Vec<ConditionNode>,
}

/// A node in the condition tree: a group or a leaf clause.
///
/// Untagged serde: a node with `operator: "AND"|"OR"` and `clauses` is a
/// group; a node with `field` is a clause. The two forms cannot collide
/// because clause operators are lowercase identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionNode {
    /// AND/OR over children.
    Group(ConditionGroup),
    /// Leaf comparison.
    Clause(Clause),
}

impl ConditionNode {
    /// Convenience constructor for an AND group.
    pub fn all(clauses: Vec<ConditionNode>) -> Self {
        Self::Group(ConditionGroup {
            operator: GroupOperator::And,
            clauses,
        })
    }

    /// Convenience constructor for an OR group.
    pub fn any(clauses: Vec<ConditionNode>) -> Self {
        Self::Group(ConditionGroup {
            operator: GroupOperator::Or,
            clauses,
        })
    }

    /// Convenience constructor for a leaf clause.
    pub fn clause(field: &str, operator: ClauseOperator, value: serde_json::Value) -> Self {
        Self::Clause(Clause {
            field: field.to_string(),
            operator,
            value,
        })
    }
}

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// The decision a rule renders when its condition tree matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDecision {
    /// Verdict status to return.
    pub status: VerdictStatus,
    /// Reason text copied into the verdict.
    pub reason: String,
    /// Whether a match should raise an audit flag on the decision record.
    pub audit_trigger: bool,
}

/// One policy rule within a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRule {
    /// Stable rule identifier, unique within a snapshot.
    pub rule_id: String,
    /// Human-readable name.
    pub name: String,
    /// Evaluation order: lower priority values are evaluated first and win.
    pub priority: i32,
    /// Inactive rules are skipped entirely.
    pub is_active: bool,
    /// The scope this rule applies to. Equal to a tenant id, a snapshot id,
    /// or a shared `global`-prefixed pack scope.
    pub context_id: String,
    /// The condition tree.
    pub conditions: ConditionNode,
    /// The decision rendered on match.
    pub decision: RuleDecision,
}
