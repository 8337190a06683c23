#![deny(missing_docs)]

//! # aigov-policy — Rule Evaluation Engine & Policy Snapshot Store
//!
//! The decision-making half of the governance core:
//!
//! - [`event`] — the immutable [`ToolUsageEvent`] a verdict is rendered on,
//!   with dot-path field resolution.
//! - [`rule`] — [`PolicyRule`] and the recursive condition tree
//!   ([`ConditionNode`]), matching the wire schema used by policy authors.
//! - [`engine`] — [`evaluate`]: pure, deterministic, total, fail-closed.
//! - [`snapshot`] — [`SnapshotStore`]: per-enterprise append-only arena of
//!   versioned snapshots with a single active-index pointer, mutated only
//!   through one atomic transition.
//!
//! ## Determinism
//!
//! Given identical event and rule set, [`evaluate`] produces an identical
//! verdict: rules are ordered by `(priority, rule_id)`, condition
//! evaluation is pure, and clause failures degrade to `false` rather than
//! aborting.

pub mod engine;
pub mod event;
pub mod rule;
pub mod snapshot;
pub mod verdict;

pub use engine::{evaluate, validate_rule_set};
pub use event::{ActionDetail, Actor, EventContext, ToolRef, ToolUsageEvent};
pub use rule::{Clause, ClauseOperator, ConditionGroup, ConditionNode, GroupOperator, PolicyRule, RuleDecision};
pub use snapshot::{PolicySnapshot, SnapshotError, SnapshotStatus, SnapshotStore};
pub use verdict::{Verdict, VerdictStatus};
