//! # Bulk Replay Orchestrator
//!
//! Replays every qualifying historical decision of an enterprise from one
//! policy version to another and aggregates the impact distribution.
//!
//! ## Selection semantics
//!
//! The candidate set is: decisions for the enterprise, inside the recency
//! window, action type in the whitelist, context snapshot present, capped
//! at `limit`. That count is `total_decisions`. Of the candidates, only
//! those whose *stored* policy version equals `from_version` are replayed —
//! version mismatch is a silent filter, not an error.
//! `processed_decisions < total_decisions` is how partial coverage and
//! per-item failures surface.
//!
//! ## Resource bounds
//!
//! Replays run under a `tokio::sync::Semaphore` concurrency cap so a large
//! batch cannot saturate the evaluation backend, and each replay is wrapped
//! in `tokio::time::timeout` so one slow item cannot stall the batch. A
//! failed or timed-out item is logged and excluded; it never aborts the
//! batch.

use std::sync::Arc;
use std::time::Duration;

use aigov_core::EnterpriseId;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::decision::{ActionType, DecisionStore};
use crate::engine::{ReplayEngine, ReplayError, ReplayResult, ReplayTarget};
use crate::impact::ImpactAssessment;

/// Default candidate cap.
pub const DEFAULT_LIMIT: usize = 100;
/// Default recency window in days.
pub const DEFAULT_TIME_WINDOW_DAYS: i64 = 365;
/// Default concurrency cap for the replay loop.
pub const DEFAULT_CONCURRENCY: usize = 8;
/// Default per-decision replay timeout.
pub const DEFAULT_PER_DECISION_TIMEOUT: Duration = Duration::from_secs(5);

/// Options for one bulk replay run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BulkReplayOptions {
    /// Candidate cap; defaults to [`DEFAULT_LIMIT`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Recency window in days; defaults to [`DEFAULT_TIME_WINDOW_DAYS`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_window_days: Option<i64>,
    /// Action-type whitelist; defaults to [`default_action_types`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_types: Option<Vec<ActionType>>,
}

/// The action types replayed when the caller does not narrow the set.
pub fn default_action_types() -> Vec<ActionType> {
    vec![
        ActionType::Approve,
        ActionType::Reject,
        ActionType::Escalate,
        ActionType::HumanApproveDecision,
        ActionType::HumanBlockDecision,
        ActionType::AgentAutoApprove,
        ActionType::AgentAutoBlock,
        ActionType::DraftDecision,
        ActionType::AutoClear,
    ]
}

/// Five-bucket impact histogram.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactDistribution {
    /// Count of `none` impacts.
    pub none: usize,
    /// Count of `low` impacts.
    pub low: usize,
    /// Count of `medium` impacts.
    pub medium: usize,
    /// Count of `high` impacts.
    pub high: usize,
    /// Count of `critical` impacts.
    pub critical: usize,
}

impl ImpactDistribution {
    /// Record one impact.
    pub fn record(&mut self, impact: ImpactAssessment) {
        match impact {
            ImpactAssessment::None => self.none += 1,
            ImpactAssessment::Low => self.low += 1,
            ImpactAssessment::Medium => self.medium += 1,
            ImpactAssessment::High => self.high += 1,
            ImpactAssessment::Critical => self.critical += 1,
        }
    }

    /// Total impacts recorded.
    pub fn total(&self) -> usize {
        self.none + self.low + self.medium + self.high + self.critical
    }
}

/// Aggregate metrics over a bulk replay run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkReplaySummary {
    /// Candidate decisions (window + whitelist + snapshot present + limit).
    pub total_decisions: usize,
    /// Decisions actually replayed (version matched, replay succeeded).
    pub processed_decisions: usize,
    /// Replays whose normalized outcome changed.
    pub outcome_changes: usize,
    /// Mean confidence delta across processed replays (0 when none).
    pub average_confidence_delta: f64,
    /// Histogram over processed replays.
    pub impact_distribution: ImpactDistribution,
}

/// Result of one bulk replay run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkReplayReport {
    /// The enterprise replayed.
    pub enterprise_id: EnterpriseId,
    /// Source policy version.
    pub from_version: String,
    /// Target policy version.
    pub to_version: String,
    /// Aggregate metrics.
    pub summary: BulkReplaySummary,
    /// Per-decision results, in completion order.
    pub details: Vec<ReplayResult>,
}

/// Bounded-concurrency batch replay over the decision log.
#[derive(Clone)]
pub struct BulkReplayOrchestrator {
    engine: ReplayEngine,
    concurrency: usize,
    per_decision_timeout: Duration,
}

impl BulkReplayOrchestrator {
    /// Create an orchestrator with default bounds.
    pub fn new(engine: ReplayEngine) -> Self {
        Self {
            engine,
            concurrency: DEFAULT_CONCURRENCY,
            per_decision_timeout: DEFAULT_PER_DECISION_TIMEOUT,
        }
    }

    /// Override the concurrency cap (minimum 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Override the per-decision timeout.
    pub fn with_per_decision_timeout(mut self, timeout: Duration) -> Self {
        self.per_decision_timeout = timeout;
        self
    }

    /// Replay the enterprise's qualifying decisions from `from_version` to
    /// `to_version`.
    ///
    /// Fails only when the target policy version does not exist; individual
    /// replay failures are logged and excluded.
    pub async fn bulk_replay(
        &self,
        enterprise_id: EnterpriseId,
        from_version: &str,
        to_version: &str,
        options: BulkReplayOptions,
    ) -> Result<BulkReplayReport, ReplayError> {
        // Resolve the target up front so a bad version fails the request,
        // not every item.
        self.engine
            .snapshots()
            .by_version(enterprise_id, to_version)
            .map_err(|e| ReplayError::PolicyNotFound(e.to_string()))?;

        let limit = options.limit.unwrap_or(DEFAULT_LIMIT);
        let window_days = options.time_window_days.unwrap_or(DEFAULT_TIME_WINDOW_DAYS);
        let action_types = options.action_types.unwrap_or_else(default_action_types);

        let candidates =
            self.engine
                .decisions()
                .candidates(enterprise_id, window_days, &action_types, limit);
        let total_decisions = candidates.len();

        // Silent version filter: only decisions made under the source
        // version are replayed.
        let matching: Vec<_> = candidates
            .into_iter()
            .filter(|d| {
                d.context_snapshot
                    .as_ref()
                    .is_some_and(|s| s.policy_state.version == from_version)
            })
            .collect();

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut join_set = JoinSet::new();
        for decision in matching {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };
            let engine = self.engine.clone();
            let target = ReplayTarget::ByVersion(to_version.to_string());
            let timeout = self.per_decision_timeout;
            let decision_id = decision.id;
            join_set.spawn(async move {
                let _permit = permit;
                let outcome = tokio::time::timeout(
                    timeout,
                    tokio::task::spawn_blocking(move || engine.replay(decision_id, target)),
                )
                .await;
                (decision_id, outcome)
            });
        }

        let mut details = Vec::new();
        let mut outcome_changes = 0usize;
        let mut delta_sum = 0.0f64;
        let mut distribution = ImpactDistribution::default();

        while let Some(joined) = join_set.join_next().await {
            let Ok((decision_id, outcome)) = joined else {
                tracing::warn!("bulk replay worker panicked — item excluded");
                continue;
            };
            let result = match outcome {
                Ok(Ok(Ok(result))) => result,
                Ok(Ok(Err(e))) => {
                    tracing::warn!(%decision_id, error = %e, "replay failed — item excluded");
                    continue;
                }
                Ok(Err(join_err)) => {
                    tracing::warn!(%decision_id, error = %join_err, "replay task failed — item excluded");
                    continue;
                }
                Err(_) => {
                    tracing::warn!(%decision_id, timeout_ms = self.per_decision_timeout.as_millis() as u64, "replay timed out — item excluded");
                    continue;
                }
            };

            if result.analysis.outcome_changed {
                outcome_changes += 1;
            }
            delta_sum += result.analysis.confidence_delta;
            distribution.record(result.analysis.impact_assessment);
            details.push(result);
        }

        let processed_decisions = details.len();
        let average_confidence_delta = if processed_decisions > 0 {
            delta_sum / processed_decisions as f64
        } else {
            0.0
        };

        tracing::info!(
            %enterprise_id,
            from_version,
            to_version,
            total_decisions,
            processed_decisions,
            outcome_changes,
            "bulk replay complete"
        );

        Ok(BulkReplayReport {
            enterprise_id,
            from_version: from_version.to_string(),
            to_version: to_version.to_string(),
            summary: BulkReplaySummary {
                total_decisions,
                processed_decisions,
                outcome_changes,
                average_confidence_delta,
                impact_distribution: distribution,
            },
            details,
        })
    }
}

impl std::fmt::Debug for BulkReplayOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkReplayOrchestrator")
            .field("concurrency", &self.concurrency)
            .field("per_decision_timeout", &self.per_decision_timeout)
            .finish()
    }
}
