//! # Rule Evaluation Engine
//!
//! [`evaluate`] classifies one tool-usage event against a rule set. It is a
//! pure function: no I/O, no shared state, and total over arbitrary inputs.
//!
//! ## Algorithm
//!
//! 1. Filter to rules that are active and whose scope applies to the event.
//! 2. Sort ascending by `(priority, rule_id)` — lower priority values are
//!    evaluated first, the rule id is a deterministic tiebreaker.
//! 3. Evaluate each rule's condition tree; the first match wins and its
//!    decision becomes the verdict.
//! 4. No match ⇒ the fail-closed fallback: `RequiresReview`, never
//!    `Approved`.
//!
//! ## Degradation
//!
//! A missing field path makes the clause false. A malformed version string
//! in `semver_less_than` compares as not-less-than and is logged. Neither
//! aborts evaluation — only rule-set validation (a store-boundary concern,
//! see [`validate_rule_set`]) produces errors.

use std::collections::HashMap;

use aigov_core::{version::semver_less_than, ValidationError};

use crate::event::{lookup_path, EventContext, ToolUsageEvent};
use crate::rule::{Clause, ClauseOperator, ConditionNode, GroupOperator, PolicyRule};
use crate::verdict::Verdict;

/// Scope ids with this prefix name cross-tenant rule packs that apply to
/// every tenant.
pub const SHARED_SCOPE_PREFIX: &str = "global";

/// Whether a rule's scope applies to the event's context.
///
/// A rule applies when its `context_id` equals the event's tenant, equals
/// the snapshot the event was evaluated under, or names a shared
/// (`global`-prefixed) rule pack. An empty `context_id` is treated as
/// shared.
fn scope_matches(context_id: &str, context: &EventContext) -> bool {
    context_id.is_empty()
        || context_id == context.tenant_id
        || context_id == context.policy_snapshot_id
        || context_id.starts_with(SHARED_SCOPE_PREFIX)
}

/// Evaluate an event against a rule set, returning the winning verdict.
///
/// Total and deterministic: every input produces exactly one verdict from
/// the closed status enum, and identical inputs produce identical outputs.
pub fn evaluate(event: &ToolUsageEvent, rules: &[PolicyRule]) -> Verdict {
    let doc = event.to_value();

    let mut applicable: Vec<&PolicyRule> = rules
        .iter()
        .filter(|r| r.is_active && scope_matches(&r.context_id, &event.context))
        .collect();
    applicable.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| a.rule_id.cmp(&b.rule_id))
    });

    for rule in applicable {
        if eval_node(&rule.conditions, &doc) {
            tracing::debug!(rule_id = %rule.rule_id, status = %rule.decision.status, "rule matched");
            return Verdict {
                status: rule.decision.status,
                reason: rule.decision.reason.clone(),
                rule_id: Some(rule.rule_id.clone()),
                policy_snapshot_id: None,
            };
        }
    }

    Verdict::fallback()
}

/// Recursively evaluate one condition node against the event document.
fn eval_node(node: &ConditionNode, doc: &serde_json::Value) -> bool {
    match node {
        ConditionNode::Group(group) => match group.operator {
            GroupOperator::And => group.clauses.iter().all(|c| eval_node(c, doc)),
            GroupOperator::Or => group.clauses.iter().any(|c| eval_node(c, doc)),
        },
        ConditionNode::Clause(clause) => eval_clause(clause, doc),
    }
}

/// Evaluate a leaf clause. Any resolution or comparison failure is `false`.
fn eval_clause(clause: &Clause, doc: &serde_json::Value) -> bool {
    let Some(actual) = lookup_path(doc, &clause.field) else {
        return false;
    };

    match clause.operator {
        ClauseOperator::Equals => values_equal(actual, &clause.value),
        ClauseOperator::SemverLessThan => {
            let (Some(actual), Some(bound)) = (actual.as_str(), clause.value.as_str()) else {
                tracing::warn!(field = %clause.field, "semver_less_than requires string operands — clause is false");
                return false;
            };
            semver_less_than(actual, bound)
        }
    }
}

/// Strict equality. String-to-string compares exactly; everything else uses
/// JSON value equality.
fn values_equal(actual: &serde_json::Value, expected: &serde_json::Value) -> bool {
    match (actual.as_str(), expected.as_str()) {
        (Some(a), Some(b)) => a == b,
        _ => actual == expected,
    }
}

/// Validate a rule set before it is accepted into a snapshot.
///
/// Rejects empty rule ids and duplicate priorities within one scope —
/// relying on sort stability to break priority ties would make evaluation
/// order an accident of input order.
pub fn validate_rule_set(rules: &[PolicyRule]) -> Result<(), ValidationError> {
    let mut seen: HashMap<(&str, i32), &str> = HashMap::new();
    for rule in rules {
        if rule.rule_id.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                field: "rule_id".to_string(),
            });
        }
        if let Some(first) = seen.insert((rule.context_id.as_str(), rule.priority), &rule.rule_id)
        {
            return Err(ValidationError::DuplicatePriority {
                scope: rule.context_id.clone(),
                priority: rule.priority,
                first: first.to_string(),
                second: rule.rule_id.clone(),
            });
        }
    }
    Ok(())
}
