//! # Decision Replay Engine
//!
//! Loads one historical decision, substitutes the policy snapshot, re-runs
//! the evaluation engine over the frozen event, and measures the
//! divergence.
//!
//! ## Confidence model
//!
//! Historical decisions may lack a recorded confidence; the engine then
//! uses [`DEFAULT_ORIGINAL_CONFIDENCE`] — a documented heuristic, not a
//! measured value. Replayed confidence is verdict-derived:
//! [`RULE_MATCH_CONFIDENCE`] when an explicit rule decided,
//! [`FALLBACK_CONFIDENCE`] on the fail-closed fallback path. Both are
//! approximation boundaries; downstream analysis must not read stronger
//! semantics into them.

use std::sync::Arc;

use aigov_core::{AuditEntry, AuditEntryKind, AuditSink, DecisionId, SnapshotId, ThreadId};
use aigov_policy::{evaluate, PolicySnapshot, SnapshotStore, Verdict, VerdictStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decision::{DecisionOutcome, DecisionStore, PolicyState};
use crate::impact::{assess_impact, ImpactAssessment};

/// Confidence assumed for historical decisions that recorded none.
/// A heuristic stand-in, not ground truth.
pub const DEFAULT_ORIGINAL_CONFIDENCE: f64 = 0.8;

/// Confidence assigned to a replayed verdict decided by an explicit rule.
pub const RULE_MATCH_CONFIDENCE: f64 = 0.9;

/// Confidence assigned to a replayed verdict from the fail-closed fallback.
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

// ---------------------------------------------------------------------------
// Errors & targets
// ---------------------------------------------------------------------------

/// Errors from single-decision replay.
#[derive(Error, Debug)]
pub enum ReplayError {
    /// No decision with this id exists.
    #[error("decision {0} not found")]
    NotFound(DecisionId),

    /// The decision exists but predates context snapshotting.
    #[error("decision {0} has no context snapshot and cannot be replayed")]
    DataIncomplete(DecisionId),

    /// The requested target policy could not be resolved.
    #[error("target policy not found: {0}")]
    PolicyNotFound(String),
}

/// Which policy snapshot to replay against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayTarget {
    /// The enterprise's currently active snapshot.
    CurrentActive,
    /// An explicit version label of the decision's enterprise.
    ByVersion(String),
    /// An explicit snapshot id.
    ById(SnapshotId),
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// A structural difference between two policy states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyChange {
    /// Total rule count differs.
    RuleCountChanged {
        /// Rule count in the original policy.
        from: usize,
        /// Rule count in the target policy.
        to: usize,
    },
    /// Active rule count differs.
    ActiveRuleCountChanged {
        /// Active rule count in the original policy.
        from: usize,
        /// Active rule count in the target policy.
        to: usize,
    },
}

impl std::fmt::Display for PolicyChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RuleCountChanged { from, to } => {
                write!(f, "rule count changed: {from} -> {to}")
            }
            Self::ActiveRuleCountChanged { from, to } => {
                write!(f, "active rule count changed: {from} -> {to}")
            }
        }
    }
}

/// The historical side of a replay comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginalDecision {
    /// The replayed decision's id.
    pub action_id: DecisionId,
    /// The governance thread it belongs to.
    pub thread_id: ThreadId,
    /// Normalized historical outcome.
    pub outcome: DecisionOutcome,
    /// Recorded confidence, or [`DEFAULT_ORIGINAL_CONFIDENCE`].
    pub confidence: f64,
    /// Recorded rationale, empty when none was stored.
    pub rationale: String,
    /// Version label of the policy in effect at decision time.
    pub policy_version: String,
    /// When the decision was recorded.
    pub decision_date: DateTime<Utc>,
}

/// The simulated side of a replay comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayedDecision {
    /// Normalized replayed outcome.
    pub outcome: DecisionOutcome,
    /// Verdict-derived confidence.
    pub confidence: f64,
    /// Reason from the replayed verdict.
    pub rationale: String,
    /// Version label of the target policy.
    pub policy_version: String,
    /// The full replayed verdict.
    pub verdict: Verdict,
}

/// Divergence analysis between original and replayed decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayAnalysis {
    /// Whether the normalized outcome changed.
    pub outcome_changed: bool,
    /// `replayed.confidence − original.confidence`.
    pub confidence_delta: f64,
    /// Structural differences between the two policies.
    pub policy_changes: Vec<PolicyChange>,
    /// Classified impact (ordered ladder, first match wins).
    pub impact_assessment: ImpactAssessment,
}

/// The full result of replaying one decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayResult {
    /// The historical decision.
    pub original_decision: OriginalDecision,
    /// The simulated decision under the target policy.
    pub replayed_decision: ReplayedDecision,
    /// The comparison.
    pub analysis: ReplayAnalysis,
}

// ---------------------------------------------------------------------------
// ReplayEngine
// ---------------------------------------------------------------------------

/// Single-decision replay engine.
#[derive(Clone)]
pub struct ReplayEngine {
    decisions: Arc<dyn DecisionStore>,
    snapshots: SnapshotStore,
    audit: Arc<dyn AuditSink>,
}

impl ReplayEngine {
    /// Create an engine over the given stores.
    pub fn new(
        decisions: Arc<dyn DecisionStore>,
        snapshots: SnapshotStore,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            decisions,
            snapshots,
            audit,
        }
    }

    /// Access the underlying decision store.
    pub fn decisions(&self) -> &Arc<dyn DecisionStore> {
        &self.decisions
    }

    /// Access the underlying snapshot store.
    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    /// Replay one decision against a target policy.
    ///
    /// Holds tool, actor, action, and context fixed; substitutes only the
    /// policy state; re-runs the pure evaluation engine over the frozen
    /// event.
    pub fn replay(
        &self,
        decision_id: DecisionId,
        target: ReplayTarget,
    ) -> Result<ReplayResult, ReplayError> {
        let decision = self
            .decisions
            .get(decision_id)
            .ok_or(ReplayError::NotFound(decision_id))?;
        let snapshot = decision
            .context_snapshot
            .as_ref()
            .ok_or(ReplayError::DataIncomplete(decision_id))?;

        let target_policy = self.resolve_target(&decision.enterprise_id, &target)?;

        // Substitute only the policy state; the event is held fixed.
        let mut verdict = evaluate(&snapshot.event, &target_policy.rules);
        verdict.policy_snapshot_id = Some(target_policy.id.to_string());

        let replayed_outcome = verdict_outcome(verdict.status);
        let replayed_confidence = if verdict.rule_id.is_some() {
            RULE_MATCH_CONFIDENCE
        } else {
            FALLBACK_CONFIDENCE
        };

        let original_outcome = decision.action_type.outcome();
        let original_confidence = snapshot
            .external
            .as_ref()
            .and_then(|e| e.confidence)
            .unwrap_or(DEFAULT_ORIGINAL_CONFIDENCE);

        let outcome_changed = replayed_outcome != original_outcome;
        let confidence_delta = replayed_confidence - original_confidence;
        let policy_changes = diff_policy(&snapshot.policy_state, &target_policy);
        let impact = assess_impact(outcome_changed, confidence_delta, policy_changes.len());

        self.audit.append(AuditEntry::new(
            AuditEntryKind::DecisionReplayed,
            Some(decision_id.to_string()),
            Some(serde_json::json!({
                "from_version": snapshot.policy_state.version.clone(),
                "to_version": target_policy.version.clone(),
                "outcome_changed": outcome_changed,
                "impact": impact.as_str(),
            })),
        ));

        Ok(ReplayResult {
            original_decision: OriginalDecision {
                action_id: decision.id,
                thread_id: decision.thread_id,
                outcome: original_outcome,
                confidence: original_confidence,
                rationale: decision.rationale.clone().unwrap_or_default(),
                policy_version: snapshot.policy_state.version.clone(),
                decision_date: decision.created_at,
            },
            replayed_decision: ReplayedDecision {
                outcome: replayed_outcome,
                confidence: replayed_confidence,
                rationale: verdict.reason.clone(),
                policy_version: target_policy.version.clone(),
                verdict,
            },
            analysis: ReplayAnalysis {
                outcome_changed,
                confidence_delta,
                policy_changes,
                impact_assessment: impact,
            },
        })
    }

    fn resolve_target(
        &self,
        enterprise_id: &aigov_core::EnterpriseId,
        target: &ReplayTarget,
    ) -> Result<PolicySnapshot, ReplayError> {
        let resolved = match target {
            ReplayTarget::CurrentActive => self.snapshots.active(*enterprise_id),
            ReplayTarget::ByVersion(version) => self.snapshots.by_version(*enterprise_id, version),
            ReplayTarget::ById(id) => self.snapshots.by_id(*id),
        };
        resolved.map_err(|e| ReplayError::PolicyNotFound(e.to_string()))
    }
}

impl std::fmt::Debug for ReplayEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplayEngine").finish_non_exhaustive()
    }
}

/// Map a verdict status to a comparable decision outcome.
///
/// `RequiresReview` normalizes to `Escalated`: both mean "a human decides".
pub fn verdict_outcome(status: VerdictStatus) -> DecisionOutcome {
    match status {
        VerdictStatus::Approved => DecisionOutcome::Approved,
        VerdictStatus::Prohibited => DecisionOutcome::Blocked,
        VerdictStatus::RequiresReview => DecisionOutcome::Escalated,
    }
}

/// Structural diff between the frozen policy state and the target snapshot.
///
/// Rule-count and active-rule-count deltas today; per-field rule diffs are
/// an extension point.
pub fn diff_policy(original: &PolicyState, target: &PolicySnapshot) -> Vec<PolicyChange> {
    let mut changes = Vec::new();
    if original.rules.len() != target.rules.len() {
        changes.push(PolicyChange::RuleCountChanged {
            from: original.rules.len(),
            to: target.rules.len(),
        });
    }
    let original_active = original.active_rule_count();
    let target_active = target.active_rule_count();
    if original_active != target_active {
        changes.push(PolicyChange::ActiveRuleCountChanged {
            from: original_active,
            to: target_active,
        });
    }
    changes
}
