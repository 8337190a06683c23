//! # Cross-Crate Governance Pipeline
//!
//! End-to-end tests over the domain crates, without the HTTP layer:
//! provisioning → authorization → policy activation → evaluation →
//! decision recording → replay → bulk impact analysis, with the audit log
//! observing every step.

use std::sync::Arc;

use aigov_auth::{
    AuthService, DirectoryStore, NewEnterprise, NewSeat, Role, RolePermissionCache, SessionStore,
};
use aigov_core::{AuditEntryKind, DecisionId, EnterpriseId, InMemoryAuditLog, ThreadId};
use aigov_policy::{
    evaluate, ClauseOperator, ConditionNode, PolicyRule, RuleDecision, SnapshotStore,
    ToolUsageEvent, VerdictStatus,
};
use aigov_replay::{
    ActionType, BulkReplayOptions, BulkReplayOrchestrator, ContextSnapshot, DecisionStore,
    ExternalContext, GovernanceAction, ImpactAssessment, InMemoryDecisionStore, PolicyState,
    ReplayEngine, ReplayTarget, RULE_MATCH_CONFIDENCE,
};
use chrono::Utc;

// =========================================================================
// Fixtures
// =========================================================================

fn midjourney_rules() -> Vec<PolicyRule> {
    vec![
        PolicyRule {
            rule_id: "R1-PROHIBIT-OLD-MJ".into(),
            name: "Prohibit Midjourney < 6.0.0".into(),
            priority: 10,
            is_active: true,
            context_id: "global-media-tools".into(),
            conditions: ConditionNode::all(vec![
                ConditionNode::clause("tool.name", ClauseOperator::Equals, "Midjourney".into()),
                ConditionNode::clause(
                    "tool.version",
                    ClauseOperator::SemverLessThan,
                    "6.0.0".into(),
                ),
            ]),
            decision: RuleDecision {
                status: VerdictStatus::Prohibited,
                reason: "Midjourney versions older than 6.0.0 are not compliant.".into(),
                audit_trigger: true,
            },
        },
        PolicyRule {
            rule_id: "R2-REVIEW-UNKNOWN".into(),
            name: "Review unknown/unversioned tools".into(),
            priority: 50,
            is_active: true,
            context_id: "global-media-tools".into(),
            conditions: ConditionNode::any(vec![
                ConditionNode::clause("tool.version", ClauseOperator::Equals, "unknown".into()),
                ConditionNode::clause("tool.version", ClauseOperator::Equals, "N/A".into()),
            ]),
            decision: RuleDecision {
                status: VerdictStatus::RequiresReview,
                reason: "Tool version information is missing or unrecognized.".into(),
                audit_trigger: false,
            },
        },
    ]
}

fn tool_event(enterprise: EnterpriseId, name: &str, version: &str) -> ToolUsageEvent {
    serde_json::from_value(serde_json::json!({
        "tool": { "id": name.to_lowercase(), "name": name, "version": version },
        "actor": { "role": "designer" },
        "action": { "type": "FinalAssetGeneration" },
        "context": { "tenantId": enterprise.to_string(), "policySnapshotId": "pending" },
        "ts": Utc::now().to_rfc3339(),
    }))
    .expect("well-formed event")
}

struct Stack {
    auth: AuthService,
    snapshots: SnapshotStore,
    decisions: Arc<InMemoryDecisionStore>,
    replay: ReplayEngine,
    audit: Arc<InMemoryAuditLog>,
}

fn stack() -> Stack {
    let audit = Arc::new(InMemoryAuditLog::default());
    let auth = AuthService::new(
        DirectoryStore::new(),
        SessionStore::new(),
        Arc::new(RolePermissionCache::default()),
        audit.clone(),
    );
    let snapshots = SnapshotStore::new();
    let decisions = InMemoryDecisionStore::shared();
    let replay = ReplayEngine::new(decisions.clone(), snapshots.clone(), audit.clone());
    Stack {
        auth,
        snapshots,
        decisions,
        replay,
        audit,
    }
}

/// Record one engine-rendered decision the way the governed path does.
fn record_decision(
    stack: &Stack,
    enterprise: EnterpriseId,
    event: ToolUsageEvent,
    version: &str,
    rules: Vec<PolicyRule>,
) -> (DecisionId, VerdictStatus) {
    let verdict = evaluate(&event, &rules);
    let action_type = match verdict.status {
        VerdictStatus::Approved => ActionType::AgentAutoApprove,
        VerdictStatus::Prohibited => ActionType::AgentAutoBlock,
        VerdictStatus::RequiresReview => ActionType::Escalate,
    };
    let confidence = if verdict.rule_id.is_some() {
        RULE_MATCH_CONFIDENCE
    } else {
        aigov_replay::FALLBACK_CONFIDENCE
    };
    let action = GovernanceAction {
        id: DecisionId::new(),
        thread_id: ThreadId::new(),
        enterprise_id: enterprise,
        action_type,
        rationale: Some(verdict.reason.clone()),
        context_snapshot: Some(ContextSnapshot {
            event,
            policy_state: PolicyState {
                snapshot_id: None,
                version: version.into(),
                rules,
            },
            external: Some(ExternalContext {
                confidence: Some(confidence),
            }),
        }),
        created_at: Utc::now(),
    };
    let id = action.id;
    stack.decisions.append(action);
    (id, verdict.status)
}

// =========================================================================
// Pipeline 1: provision → authorize → evaluate → record → replay
// =========================================================================

#[test]
fn full_governance_flow_from_login_to_replay() {
    let stack = stack();

    // 1. Provision the enterprise owner and their enterprise.
    let owner = stack
        .auth
        .directory()
        .provision_user("owner@acme.example", "hunter2", "Acme Owner")
        .unwrap();
    let (enterprise, _) = stack
        .auth
        .create_enterprise(
            NewEnterprise {
                name: "Acme Pharma".into(),
                slug: "acme".into(),
                kind: "pharma".into(),
            },
            owner.id,
        )
        .unwrap();

    // 2. Authenticate; the session binds the default (owner) context.
    let session = stack.auth.authenticate("owner@acme.example", "hunter2").unwrap();
    assert!(stack
        .auth
        .check_permission(session.token.token_id, "policies", "activate", None)
        .unwrap());

    // 3. Submit and activate policy v1.0.
    let v1 = stack
        .snapshots
        .submit_draft(enterprise.id, "1.0", midjourney_rules())
        .unwrap();
    stack.snapshots.activate(enterprise.id, v1).unwrap();

    // 4. Evaluate an event against the active snapshot; record the decision.
    let active = stack.snapshots.active(enterprise.id).unwrap();
    let event = tool_event(enterprise.id, "Midjourney", "5.2.0");
    let (decision_id, status) = record_decision(
        &stack,
        enterprise.id,
        event,
        &active.version,
        active.rules.clone(),
    );
    assert_eq!(status, VerdictStatus::Prohibited);

    // 5. Replay against the same version: nothing moves.
    let result = stack
        .replay
        .replay(decision_id, ReplayTarget::ByVersion("1.0".into()))
        .unwrap();
    assert!(!result.analysis.outcome_changed);
    assert_eq!(result.analysis.impact_assessment, ImpactAssessment::None);

    // 6. Activate a permissive v2.0 (no rules); replay shows the flip.
    let v2 = stack.snapshots.submit_draft(enterprise.id, "2.0", vec![]).unwrap();
    stack.snapshots.activate(enterprise.id, v2).unwrap();
    let result = stack
        .replay
        .replay(decision_id, ReplayTarget::CurrentActive)
        .unwrap();
    assert!(result.analysis.outcome_changed);
    // blocked → escalated (fallback) under the empty rule set.
    assert_eq!(
        result.replayed_decision.verdict.status,
        VerdictStatus::RequiresReview
    );

    // 7. The audit log observed the session and both replays.
    assert_eq!(
        stack.audit.entries_of_kind(AuditEntryKind::SessionOpened).len(),
        1
    );
    assert_eq!(
        stack
            .audit
            .entries_of_kind(AuditEntryKind::DecisionReplayed)
            .len(),
        2
    );
    assert_eq!(
        stack
            .audit
            .entries_of_kind(AuditEntryKind::EnterpriseCreated)
            .len(),
        1
    );
}

// =========================================================================
// Pipeline 2: bulk impact analysis across a version migration
// =========================================================================

#[tokio::test]
async fn bulk_replay_measures_policy_drift() {
    let stack = stack();
    let owner = stack
        .auth
        .directory()
        .provision_user("owner@acme.example", "hunter2", "Owner")
        .unwrap();
    let (enterprise, _) = stack
        .auth
        .create_enterprise(
            NewEnterprise {
                name: "Acme".into(),
                slug: "acme".into(),
                kind: "pharma".into(),
            },
            owner.id,
        )
        .unwrap();

    // History: five decisions under v1.0 (strict), one under v0.9.
    let v1_rules = midjourney_rules();
    for version in ["5.0.0", "5.1.0", "5.2.0"] {
        record_decision(
            &stack,
            enterprise.id,
            tool_event(enterprise.id, "Midjourney", version),
            "1.0",
            v1_rules.clone(),
        );
    }
    for version in ["6.1.0", "7.0.0"] {
        record_decision(
            &stack,
            enterprise.id,
            tool_event(enterprise.id, "Midjourney", version),
            "1.0",
            v1_rules.clone(),
        );
    }
    record_decision(
        &stack,
        enterprise.id,
        tool_event(enterprise.id, "Midjourney", "5.0.0"),
        "0.9",
        v1_rules.clone(),
    );

    // Target: v2.0 drops the prohibition entirely.
    let v1 = stack
        .snapshots
        .submit_draft(enterprise.id, "1.0", v1_rules)
        .unwrap();
    stack.snapshots.activate(enterprise.id, v1).unwrap();
    let v2 = stack.snapshots.submit_draft(enterprise.id, "2.0", vec![]).unwrap();
    stack.snapshots.activate(enterprise.id, v2).unwrap();

    let orchestrator = BulkReplayOrchestrator::new(stack.replay.clone()).with_concurrency(4);
    let report = orchestrator
        .bulk_replay(enterprise.id, "1.0", "2.0", BulkReplayOptions::default())
        .await
        .unwrap();

    // The v0.9 decision is a candidate but silently excluded.
    assert_eq!(report.summary.total_decisions, 6);
    assert_eq!(report.summary.processed_decisions, 5);
    // The three blocked decisions flip to escalated; the two escalated stay.
    assert_eq!(report.summary.outcome_changes, 3);
    assert_eq!(
        report.summary.impact_distribution.total(),
        report.summary.processed_decisions
    );
    assert_eq!(report.details.len(), 5);
}

// =========================================================================
// Pipeline 3: seat hierarchy and scoped sessions
// =========================================================================

#[test]
fn seat_member_sessions_are_scoped_and_gated() {
    let stack = stack();
    let owner = stack
        .auth
        .directory()
        .provision_user("owner@acme.example", "hunter2", "Owner")
        .unwrap();
    let (enterprise, _) = stack
        .auth
        .create_enterprise(
            NewEnterprise {
                name: "Acme".into(),
                slug: "acme".into(),
                kind: "pharma".into(),
            },
            owner.id,
        )
        .unwrap();
    let (seat, _) = stack
        .auth
        .create_agency_seat(
            enterprise.id,
            NewSeat {
                name: "North Agency".into(),
                slug: "north".into(),
            },
            owner.id,
        )
        .unwrap();

    // A member joins the seat and authenticates.
    let member = stack
        .auth
        .directory()
        .provision_user("member@north.example", "secret", "Member")
        .unwrap();
    stack
        .auth
        .directory()
        .create_context(
            member.id,
            enterprise.id,
            Some(seat.id),
            Role::SeatMember,
            vec![],
            true,
        )
        .unwrap();
    let session = stack.auth.authenticate("member@north.example", "secret").unwrap();
    assert_eq!(session.token.seat_id, Some(seat.id));

    // Seat members submit decisions but cannot activate policies or replay.
    assert!(stack
        .auth
        .check_permission(session.token.token_id, "decisions", "write", None)
        .unwrap());
    assert!(!stack
        .auth
        .check_permission(session.token.token_id, "policies", "activate", None)
        .unwrap());
    assert!(!stack
        .auth
        .check_permission(session.token.token_id, "replay", "run", None)
        .unwrap());

    // The member cannot switch into the owner's context.
    let owner_context = stack.auth.directory().default_context(owner.id).unwrap();
    let err = stack
        .auth
        .switch_context(member.id, owner_context.id)
        .unwrap_err();
    assert_eq!(err, aigov_auth::AuthError::Forbidden);
}
