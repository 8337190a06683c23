//! # Policy Snapshot Store
//!
//! Versioned rule sets per enterprise. Each enterprise owns an append-only
//! arena of snapshots plus a single active-index pointer; the pointer is
//! mutated only through [`SnapshotStore::activate`], which retires the
//! previous active snapshot and flips the index inside one write lock.
//! Concurrent readers can therefore never observe two active snapshots for
//! the same enterprise.
//!
//! Explicit version lookups ([`SnapshotStore::by_version`],
//! [`SnapshotStore::by_id`]) bypass the active pointer — retired snapshots
//! stay reachable, which is what makes decision replay possible.

use std::collections::HashMap;
use std::sync::Arc;

use aigov_core::{EnterpriseId, SnapshotId, ValidationError};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::validate_rule_set;
use crate::rule::PolicyRule;

// ---------------------------------------------------------------------------
// PolicySnapshot
// ---------------------------------------------------------------------------

/// Lifecycle status of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotStatus {
    /// Submitted but not yet in effect.
    Draft,
    /// The snapshot currently in effect for its enterprise.
    Active,
    /// Superseded by a later activation. Still reachable by version/id.
    Retired,
}

/// An immutable, versioned rule set in effect at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySnapshot {
    /// Snapshot identifier.
    pub id: SnapshotId,
    /// Owning enterprise.
    pub enterprise_id: EnterpriseId,
    /// Version label, unique per enterprise (e.g. `"2.1"`).
    pub version: String,
    /// Lifecycle status.
    pub status: SnapshotStatus,
    /// The rules frozen into this snapshot.
    pub rules: Vec<PolicyRule>,
    /// When this snapshot was (last) activated.
    pub activated_at: Option<DateTime<Utc>>,
}

impl PolicySnapshot {
    /// Count of active rules within the snapshot.
    pub fn active_rule_count(&self) -> usize {
        self.rules.iter().filter(|r| r.is_active).count()
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from snapshot store operations.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// The enterprise has no active snapshot.
    #[error("enterprise {0} has no active policy snapshot")]
    NoActive(EnterpriseId),

    /// No snapshot with the requested version exists for the enterprise.
    #[error("policy version '{version}' not found for enterprise {enterprise_id}")]
    VersionNotFound {
        /// The enterprise queried.
        enterprise_id: EnterpriseId,
        /// The missing version label.
        version: String,
    },

    /// No snapshot with the requested id exists.
    #[error("policy snapshot {0} not found")]
    SnapshotNotFound(SnapshotId),

    /// A snapshot with this version label already exists for the enterprise.
    #[error("policy version '{version}' already exists for enterprise {enterprise_id}")]
    VersionExists {
        /// The enterprise queried.
        enterprise_id: EnterpriseId,
        /// The duplicate version label.
        version: String,
    },

    /// The rule set failed validation.
    #[error(transparent)]
    InvalidRuleSet(#[from] ValidationError),
}

// ---------------------------------------------------------------------------
// SnapshotStore
// ---------------------------------------------------------------------------

/// Per-enterprise snapshot arena.
#[derive(Debug, Default)]
struct EnterpriseArena {
    /// Append-only list of snapshots, in submission order.
    snapshots: Vec<PolicySnapshot>,
    /// Index of the active snapshot, if any. The only field
    /// [`SnapshotStore::activate`] mutates besides the statuses it swaps.
    active: Option<usize>,
}

/// Thread-safe, cloneable snapshot store.
///
/// The lock is `parking_lot`, never held across `.await` points.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    inner: Arc<RwLock<HashMap<EnterpriseId, EnterpriseArena>>>,
}

impl SnapshotStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit a draft snapshot for an enterprise.
    ///
    /// The rule set is validated here — duplicate priorities within one
    /// scope and empty rule ids are rejected before the snapshot exists.
    /// Version labels are unique per enterprise.
    pub fn submit_draft(
        &self,
        enterprise_id: EnterpriseId,
        version: impl Into<String>,
        rules: Vec<PolicyRule>,
    ) -> Result<SnapshotId, SnapshotError> {
        let version = version.into();
        validate_rule_set(&rules)?;

        let mut guard = self.inner.write();
        let arena = guard.entry(enterprise_id).or_default();
        if arena.snapshots.iter().any(|s| s.version == version) {
            return Err(SnapshotError::VersionExists {
                enterprise_id,
                version,
            });
        }

        let id = SnapshotId::new();
        arena.snapshots.push(PolicySnapshot {
            id,
            enterprise_id,
            version,
            status: SnapshotStatus::Draft,
            rules,
            activated_at: None,
        });
        Ok(id)
    }

    /// Activate a snapshot, retiring the previously active one.
    ///
    /// One atomic transition under a single write lock: the previous active
    /// snapshot becomes `Retired`, the target becomes `Active`, and the
    /// active index flips — together or not at all. Returns the activated
    /// snapshot.
    pub fn activate(
        &self,
        enterprise_id: EnterpriseId,
        snapshot_id: SnapshotId,
    ) -> Result<PolicySnapshot, SnapshotError> {
        let mut guard = self.inner.write();
        let arena = guard
            .get_mut(&enterprise_id)
            .ok_or(SnapshotError::SnapshotNotFound(snapshot_id))?;
        let target = arena
            .snapshots
            .iter()
            .position(|s| s.id == snapshot_id)
            .ok_or(SnapshotError::SnapshotNotFound(snapshot_id))?;

        if arena.active == Some(target) {
            // Re-activating the already-active snapshot is a no-op.
            return Ok(arena.snapshots[target].clone());
        }

        if let Some(previous) = arena.active {
            arena.snapshots[previous].status = SnapshotStatus::Retired;
        }
        arena.snapshots[target].status = SnapshotStatus::Active;
        arena.snapshots[target].activated_at = Some(Utc::now());
        arena.active = Some(target);

        tracing::info!(
            %enterprise_id,
            %snapshot_id,
            version = %arena.snapshots[target].version,
            "policy snapshot activated"
        );
        Ok(arena.snapshots[target].clone())
    }

    /// The active snapshot for an enterprise.
    pub fn active(&self, enterprise_id: EnterpriseId) -> Result<PolicySnapshot, SnapshotError> {
        let guard = self.inner.read();
        let arena = guard
            .get(&enterprise_id)
            .ok_or(SnapshotError::NoActive(enterprise_id))?;
        arena
            .active
            .map(|i| arena.snapshots[i].clone())
            .ok_or(SnapshotError::NoActive(enterprise_id))
    }

    /// Look up a snapshot by version label, regardless of status.
    pub fn by_version(
        &self,
        enterprise_id: EnterpriseId,
        version: &str,
    ) -> Result<PolicySnapshot, SnapshotError> {
        let guard = self.inner.read();
        guard
            .get(&enterprise_id)
            .and_then(|arena| arena.snapshots.iter().find(|s| s.version == version))
            .cloned()
            .ok_or_else(|| SnapshotError::VersionNotFound {
                enterprise_id,
                version: version.to_string(),
            })
    }

    /// Look up a snapshot by id, regardless of owner or status.
    pub fn by_id(&self, snapshot_id: SnapshotId) -> Result<PolicySnapshot, SnapshotError> {
        let guard = self.inner.read();
        guard
            .values()
            .flat_map(|arena| arena.snapshots.iter())
            .find(|s| s.id == snapshot_id)
            .cloned()
            .ok_or(SnapshotError::SnapshotNotFound(snapshot_id))
    }

    /// All version labels for an enterprise, in submission order.
    pub fn list_versions(&self, enterprise_id: EnterpriseId) -> Vec<String> {
        self.inner
            .read()
            .get(&enterprise_id)
            .map(|arena| arena.snapshots.iter().map(|s| s.version.clone()).collect())
            .unwrap_or_default()
    }

    /// Count of snapshots with `Active` status for an enterprise.
    ///
    /// Exposed for invariant assertions; always 0 or 1 by construction.
    pub fn active_count(&self, enterprise_id: EnterpriseId) -> usize {
        self.inner
            .read()
            .get(&enterprise_id)
            .map(|arena| {
                arena
                    .snapshots
                    .iter()
                    .filter(|s| s.status == SnapshotStatus::Active)
                    .count()
            })
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{ClauseOperator, ConditionNode, RuleDecision};
    use crate::verdict::VerdictStatus;

    fn rule(id: &str, priority: i32) -> PolicyRule {
        PolicyRule {
            rule_id: id.into(),
            name: format!("rule {id}"),
            priority,
            is_active: true,
            context_id: "global-media-tools".into(),
            conditions: ConditionNode::clause(
                "tool.name",
                ClauseOperator::Equals,
                "Midjourney".into(),
            ),
            decision: RuleDecision {
                status: VerdictStatus::Prohibited,
                reason: "test".into(),
                audit_trigger: false,
            },
        }
    }

    #[test]
    fn submit_and_activate() {
        let store = SnapshotStore::new();
        let enterprise = EnterpriseId::new();
        let id = store
            .submit_draft(enterprise, "1.0", vec![rule("R1", 10)])
            .unwrap();

        assert!(store.active(enterprise).is_err());
        let activated = store.activate(enterprise, id).unwrap();
        assert_eq!(activated.status, SnapshotStatus::Active);
        assert!(activated.activated_at.is_some());
        assert_eq!(store.active(enterprise).unwrap().id, id);
    }

    #[test]
    fn activation_retires_predecessor_atomically() {
        let store = SnapshotStore::new();
        let enterprise = EnterpriseId::new();
        let v1 = store
            .submit_draft(enterprise, "1.0", vec![rule("R1", 10)])
            .unwrap();
        let v2 = store
            .submit_draft(enterprise, "2.0", vec![rule("R1", 10), rule("R2", 20)])
            .unwrap();

        store.activate(enterprise, v1).unwrap();
        store.activate(enterprise, v2).unwrap();

        assert_eq!(store.active(enterprise).unwrap().id, v2);
        assert_eq!(store.active_count(enterprise), 1);
        assert_eq!(
            store.by_version(enterprise, "1.0").unwrap().status,
            SnapshotStatus::Retired
        );
    }

    #[test]
    fn retired_snapshots_stay_reachable_by_version() {
        let store = SnapshotStore::new();
        let enterprise = EnterpriseId::new();
        let v1 = store
            .submit_draft(enterprise, "1.0", vec![rule("R1", 10)])
            .unwrap();
        let v2 = store.submit_draft(enterprise, "2.0", vec![]).unwrap();
        store.activate(enterprise, v1).unwrap();
        store.activate(enterprise, v2).unwrap();

        let retired = store.by_version(enterprise, "1.0").unwrap();
        assert_eq!(retired.id, v1);
        assert_eq!(retired.rules.len(), 1);
    }

    #[test]
    fn duplicate_version_rejected() {
        let store = SnapshotStore::new();
        let enterprise = EnterpriseId::new();
        store.submit_draft(enterprise, "1.0", vec![]).unwrap();
        let err = store.submit_draft(enterprise, "1.0", vec![]).unwrap_err();
        assert!(matches!(err, SnapshotError::VersionExists { .. }));
    }

    #[test]
    fn invalid_rule_set_rejected_at_submission() {
        let store = SnapshotStore::new();
        let enterprise = EnterpriseId::new();
        // Two rules, same scope, same priority.
        let err = store
            .submit_draft(enterprise, "1.0", vec![rule("R1", 10), rule("R2", 10)])
            .unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidRuleSet(_)));
    }

    #[test]
    fn unknown_version_is_not_found() {
        let store = SnapshotStore::new();
        let enterprise = EnterpriseId::new();
        store.submit_draft(enterprise, "1.0", vec![]).unwrap();
        let err = store.by_version(enterprise, "9.9").unwrap_err();
        assert!(matches!(err, SnapshotError::VersionNotFound { .. }));
    }

    #[test]
    fn by_id_finds_any_enterprise() {
        let store = SnapshotStore::new();
        let a = EnterpriseId::new();
        let b = EnterpriseId::new();
        let id_a = store.submit_draft(a, "1.0", vec![]).unwrap();
        let id_b = store.submit_draft(b, "1.0", vec![]).unwrap();
        assert_eq!(store.by_id(id_a).unwrap().enterprise_id, a);
        assert_eq!(store.by_id(id_b).unwrap().enterprise_id, b);
    }

    #[test]
    fn reactivating_active_snapshot_is_noop() {
        let store = SnapshotStore::new();
        let enterprise = EnterpriseId::new();
        let id = store.submit_draft(enterprise, "1.0", vec![]).unwrap();
        store.activate(enterprise, id).unwrap();
        let first = store.active(enterprise).unwrap();
        store.activate(enterprise, id).unwrap();
        let second = store.active(enterprise).unwrap();
        assert_eq!(first.activated_at, second.activated_at);
        assert_eq!(store.active_count(enterprise), 1);
    }

    #[test]
    fn single_active_invariant_under_concurrent_activations() {
        use std::thread;

        let store = SnapshotStore::new();
        let enterprise = EnterpriseId::new();
        let ids: Vec<SnapshotId> = (0..8)
            .map(|i| store.submit_draft(enterprise, format!("{i}.0"), vec![]).unwrap())
            .collect();

        thread::scope(|scope| {
            for id in &ids {
                let store = store.clone();
                scope.spawn(move || {
                    store.activate(enterprise, *id).unwrap();
                });
            }
        });

        // Whichever activation landed last, exactly one snapshot is active.
        assert_eq!(store.active_count(enterprise), 1);
        assert!(store.active(enterprise).is_ok());
    }

    #[test]
    fn list_versions_in_submission_order() {
        let store = SnapshotStore::new();
        let enterprise = EnterpriseId::new();
        store.submit_draft(enterprise, "1.0", vec![]).unwrap();
        store.submit_draft(enterprise, "1.1", vec![]).unwrap();
        store.submit_draft(enterprise, "2.0", vec![]).unwrap();
        assert_eq!(store.list_versions(enterprise), vec!["1.0", "1.1", "2.0"]);
    }

    #[test]
    fn active_rule_count_counts_only_active() {
        let mut inactive = rule("R2", 20);
        inactive.is_active = false;
        let snapshot = PolicySnapshot {
            id: SnapshotId::new(),
            enterprise_id: EnterpriseId::new(),
            version: "1.0".into(),
            status: SnapshotStatus::Draft,
            rules: vec![rule("R1", 10), inactive],
            activated_at: None,
        };
        assert_eq!(snapshot.active_rule_count(), 1);
    }
}
