//! # Governance Decision Records
//!
//! A [`GovernanceAction`] is one row in the append-only decision log. Its
//! `context_snapshot` freezes the evaluated event and the policy state in
//! effect at decision time — sufficient to deterministically re-run the
//! evaluation later with only the policy substituted.
//!
//! ## Action types
//!
//! Historical decisions carry free-form action-type literals accumulated
//! across product generations (`approve`, `HumanBlockDecision`,
//! `auto_clear`, …). [`ActionType`] is the exhaustive tagged form;
//! [`ActionType::outcome`] is a *total* normalization into
//! [`DecisionOutcome`] — unmapped literals conservatively normalize to
//! [`DecisionOutcome::Pending`], never to an approval.

use std::sync::Arc;

use aigov_core::{DecisionId, EnterpriseId, SnapshotId, ThreadId};
use aigov_policy::{PolicyRule, ToolUsageEvent};
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ActionType
// ---------------------------------------------------------------------------

/// The recorded action type of a historical decision.
///
/// Closed over the known literals; anything else is preserved verbatim in
/// [`ActionType::Unknown`] so nothing is lost on a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionType {
    /// Human approval (short form).
    Approve,
    /// Human rejection (short form).
    Reject,
    /// Escalated to a reviewer.
    Escalate,
    /// Human approval (workflow form).
    HumanApproveDecision,
    /// Human block (workflow form).
    HumanBlockDecision,
    /// Agent-issued automatic approval.
    AgentAutoApprove,
    /// Agent-issued automatic block.
    AgentAutoBlock,
    /// Draft decision awaiting submission.
    DraftDecision,
    /// Automatic clearance without review.
    AutoClear,
    /// A literal this build does not recognize.
    Unknown(String),
}

impl ActionType {
    /// Parse a stored literal. Total — unknown literals are preserved.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "approve" => Self::Approve,
            "reject" => Self::Reject,
            "escalate" => Self::Escalate,
            "HumanApproveDecision" => Self::HumanApproveDecision,
            "HumanBlockDecision" => Self::HumanBlockDecision,
            "AgentAutoApprove" => Self::AgentAutoApprove,
            "AgentAutoBlock" => Self::AgentAutoBlock,
            "draft_decision" => Self::DraftDecision,
            "auto_clear" => Self::AutoClear,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// The stored literal for this action type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Escalate => "escalate",
            Self::HumanApproveDecision => "HumanApproveDecision",
            Self::HumanBlockDecision => "HumanBlockDecision",
            Self::AgentAutoApprove => "AgentAutoApprove",
            Self::AgentAutoBlock => "AgentAutoBlock",
            Self::DraftDecision => "draft_decision",
            Self::AutoClear => "auto_clear",
            Self::Unknown(raw) => raw,
        }
    }

    /// Total normalization into a comparable outcome.
    ///
    /// Unmapped literals normalize to [`DecisionOutcome::Pending`] — the
    /// conservative bucket, never an approval.
    pub fn outcome(&self) -> DecisionOutcome {
        match self {
            Self::Approve | Self::HumanApproveDecision | Self::AgentAutoApprove | Self::AutoClear => {
                DecisionOutcome::Approved
            }
            Self::Reject | Self::HumanBlockDecision | Self::AgentAutoBlock => {
                DecisionOutcome::Blocked
            }
            Self::Escalate => DecisionOutcome::Escalated,
            Self::DraftDecision | Self::Unknown(_) => DecisionOutcome::Pending,
        }
    }
}

impl From<String> for ActionType {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<ActionType> for String {
    fn from(value: ActionType) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized decision outcome, used to compare original vs replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionOutcome {
    /// The usage went ahead.
    Approved,
    /// The usage was stopped.
    Blocked,
    /// The decision was pushed to a human reviewer.
    Escalated,
    /// No terminal outcome (drafts, unknown literals).
    Pending,
}

impl DecisionOutcome {
    /// Return the wire string for this outcome.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Blocked => "blocked",
            Self::Escalated => "escalated",
            Self::Pending => "pending",
        }
    }
}

impl std::fmt::Display for DecisionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Context snapshot
// ---------------------------------------------------------------------------

/// The policy state frozen into a decision record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyState {
    /// The snapshot the rules came from, when known.
    pub snapshot_id: Option<SnapshotId>,
    /// Version label of the policy in effect.
    pub version: String,
    /// The full rule set in effect at decision time.
    pub rules: Vec<PolicyRule>,
}

impl PolicyState {
    /// Count of active rules frozen into this state.
    pub fn active_rule_count(&self) -> usize {
        self.rules.iter().filter(|r| r.is_active).count()
    }
}

/// Context captured from collaborating systems at decision time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ExternalContext {
    /// Evaluation confidence reported at decision time, if any.
    pub confidence: Option<f64>,
}

/// Everything needed to deterministically re-run a decision, except the
/// policy being substituted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    /// The evaluated event, verbatim.
    pub event: ToolUsageEvent,
    /// The policy state in effect at decision time.
    pub policy_state: PolicyState,
    /// External context captured alongside the decision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<ExternalContext>,
}

// ---------------------------------------------------------------------------
// GovernanceAction
// ---------------------------------------------------------------------------

/// One row in the append-only decision log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceAction {
    /// Decision identifier.
    pub id: DecisionId,
    /// The governance thread this decision belongs to.
    pub thread_id: ThreadId,
    /// The enterprise the decision was made for.
    pub enterprise_id: EnterpriseId,
    /// Recorded action type literal.
    pub action_type: ActionType,
    /// Free-text rationale recorded with the decision.
    pub rationale: Option<String>,
    /// Frozen evaluation context. Absent on records predating context
    /// snapshotting — such records cannot be replayed.
    pub context_snapshot: Option<ContextSnapshot>,
    /// When the decision was recorded.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// DecisionStore
// ---------------------------------------------------------------------------

/// Read/append boundary to the decision log.
///
/// The log itself is external to the governance core; this trait is the
/// seam. Implementations must be append-only — records are never mutated
/// or deleted.
pub trait DecisionStore: Send + Sync {
    /// Load one decision by id.
    fn get(&self, id: DecisionId) -> Option<GovernanceAction>;

    /// Append a decision record.
    fn append(&self, action: GovernanceAction);

    /// Select bulk-replay candidates: decisions for the enterprise, created
    /// within the last `window_days`, with an action type in the whitelist
    /// and a context snapshot present, capped at `limit` (oldest first).
    fn candidates(
        &self,
        enterprise_id: EnterpriseId,
        window_days: i64,
        action_types: &[ActionType],
        limit: usize,
    ) -> Vec<GovernanceAction>;
}

/// Process-local decision log for tests and single-node deployments.
#[derive(Debug, Default)]
pub struct InMemoryDecisionStore {
    records: RwLock<Vec<GovernanceAction>>,
}

impl InMemoryDecisionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store behind an `Arc`, ready to share.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Number of records in the log.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DecisionStore for InMemoryDecisionStore {
    fn get(&self, id: DecisionId) -> Option<GovernanceAction> {
        self.records.read().iter().find(|a| a.id == id).cloned()
    }

    fn append(&self, action: GovernanceAction) {
        self.records.write().push(action);
    }

    fn candidates(
        &self,
        enterprise_id: EnterpriseId,
        window_days: i64,
        action_types: &[ActionType],
        limit: usize,
    ) -> Vec<GovernanceAction> {
        let cutoff = Utc::now() - Duration::days(window_days);
        self.records
            .read()
            .iter()
            .filter(|a| {
                a.enterprise_id == enterprise_id
                    && a.created_at >= cutoff
                    && a.context_snapshot.is_some()
                    && action_types.contains(&a.action_type)
            })
            .take(limit)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aigov_policy::{ActionDetail, Actor, EventContext, ToolRef};

    fn event() -> ToolUsageEvent {
        ToolUsageEvent {
            tool: ToolRef {
                id: "mj".into(),
                name: "Midjourney".into(),
                version: "5.2.0".into(),
            },
            actor: Actor {
                role: "designer".into(),
            },
            action: ActionDetail {
                action_type: "FinalAssetGeneration".into(),
                note: None,
            },
            context: EventContext {
                tenant_id: "tenant".into(),
                policy_snapshot_id: "v1".into(),
            },
            ts: Utc::now(),
        }
    }

    fn action(enterprise_id: EnterpriseId, action_type: &str, with_snapshot: bool) -> GovernanceAction {
        GovernanceAction {
            id: DecisionId::new(),
            thread_id: ThreadId::new(),
            enterprise_id,
            action_type: ActionType::parse(action_type),
            rationale: None,
            context_snapshot: with_snapshot.then(|| ContextSnapshot {
                event: event(),
                policy_state: PolicyState {
                    snapshot_id: None,
                    version: "1.0".into(),
                    rules: vec![],
                },
                external: None,
            }),
            created_at: Utc::now(),
        }
    }

    // ── ActionType ───────────────────────────────────────────────

    #[test]
    fn known_literals_roundtrip() {
        for literal in [
            "approve",
            "reject",
            "escalate",
            "HumanApproveDecision",
            "HumanBlockDecision",
            "AgentAutoApprove",
            "AgentAutoBlock",
            "draft_decision",
            "auto_clear",
        ] {
            let parsed = ActionType::parse(literal);
            assert!(!matches!(parsed, ActionType::Unknown(_)), "{literal} should be known");
            assert_eq!(parsed.as_str(), literal);
        }
    }

    #[test]
    fn unknown_literal_preserved_verbatim() {
        let parsed = ActionType::parse("legacy_bulk_import");
        assert_eq!(parsed, ActionType::Unknown("legacy_bulk_import".into()));
        assert_eq!(parsed.as_str(), "legacy_bulk_import");
    }

    #[test]
    fn outcome_mapping_is_total() {
        assert_eq!(ActionType::Approve.outcome(), DecisionOutcome::Approved);
        assert_eq!(ActionType::HumanApproveDecision.outcome(), DecisionOutcome::Approved);
        assert_eq!(ActionType::AgentAutoApprove.outcome(), DecisionOutcome::Approved);
        assert_eq!(ActionType::AutoClear.outcome(), DecisionOutcome::Approved);
        assert_eq!(ActionType::Reject.outcome(), DecisionOutcome::Blocked);
        assert_eq!(ActionType::HumanBlockDecision.outcome(), DecisionOutcome::Blocked);
        assert_eq!(ActionType::AgentAutoBlock.outcome(), DecisionOutcome::Blocked);
        assert_eq!(ActionType::Escalate.outcome(), DecisionOutcome::Escalated);
        assert_eq!(ActionType::DraftDecision.outcome(), DecisionOutcome::Pending);
        assert_eq!(
            ActionType::Unknown("anything".into()).outcome(),
            DecisionOutcome::Pending
        );
    }

    #[test]
    fn action_type_serde_uses_literals() {
        let json = serde_json::to_string(&ActionType::HumanBlockDecision).unwrap();
        assert_eq!(json, "\"HumanBlockDecision\"");
        let back: ActionType = serde_json::from_str("\"auto_clear\"").unwrap();
        assert_eq!(back, ActionType::AutoClear);
        let unknown: ActionType = serde_json::from_str("\"mystery\"").unwrap();
        assert_eq!(unknown, ActionType::Unknown("mystery".into()));
    }

    #[test]
    fn outcome_wire_strings_are_lowercase() {
        assert_eq!(
            serde_json::to_string(&DecisionOutcome::Escalated).unwrap(),
            "\"escalated\""
        );
    }

    // ── InMemoryDecisionStore ────────────────────────────────────

    #[test]
    fn append_and_get() {
        let store = InMemoryDecisionStore::new();
        let a = action(EnterpriseId::new(), "approve", true);
        let id = a.id;
        store.append(a);
        assert!(store.get(id).is_some());
        assert!(store.get(DecisionId::new()).is_none());
    }

    #[test]
    fn candidates_filter_by_enterprise_and_type() {
        let store = InMemoryDecisionStore::new();
        let ours = EnterpriseId::new();
        let theirs = EnterpriseId::new();
        store.append(action(ours, "approve", true));
        store.append(action(ours, "escalate", true));
        store.append(action(ours, "draft_decision", true));
        store.append(action(theirs, "approve", true));

        let whitelist = vec![ActionType::Approve, ActionType::Escalate];
        let found = store.candidates(ours, 365, &whitelist, 100);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|a| a.enterprise_id == ours));
    }

    #[test]
    fn candidates_require_context_snapshot() {
        let store = InMemoryDecisionStore::new();
        let enterprise = EnterpriseId::new();
        store.append(action(enterprise, "approve", true));
        store.append(action(enterprise, "approve", false));

        let found = store.candidates(enterprise, 365, &[ActionType::Approve], 100);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn candidates_respect_limit() {
        let store = InMemoryDecisionStore::new();
        let enterprise = EnterpriseId::new();
        for _ in 0..10 {
            store.append(action(enterprise, "approve", true));
        }
        let found = store.candidates(enterprise, 365, &[ActionType::Approve], 3);
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn candidates_exclude_stale_decisions() {
        let store = InMemoryDecisionStore::new();
        let enterprise = EnterpriseId::new();
        let mut old = action(enterprise, "approve", true);
        old.created_at = Utc::now() - Duration::days(400);
        store.append(old);
        store.append(action(enterprise, "approve", true));

        let found = store.candidates(enterprise, 365, &[ActionType::Approve], 100);
        assert_eq!(found.len(), 1);
    }
}
