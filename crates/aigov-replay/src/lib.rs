#![deny(missing_docs)]

//! # aigov-replay — Decision Replay & Policy Impact Analysis
//!
//! "What-if" simulation over the decision log: re-run a historical
//! governance decision under a different policy snapshot and measure what
//! changed.
//!
//! - [`decision`] — the append-only [`GovernanceAction`] record, its context
//!   snapshot, and the total action-type → outcome normalization.
//! - [`engine`] — [`ReplayEngine`]: load one decision, substitute the
//!   policy, re-evaluate, diff, classify impact.
//! - [`impact`] — the ordered impact ladder (`none` → `critical`).
//! - [`bulk`] — [`BulkReplayOrchestrator`]: bounded-concurrency batch
//!   replay with per-decision timeouts and partial-failure tolerance.
//!
//! ## The replay contract
//!
//! A decision is replayable iff its `context_snapshot` is present: the
//! snapshot holds the original event and policy state, so re-evaluation is
//! deterministic except for the policy being substituted. Decisions
//! predating context snapshotting fail with
//! [`ReplayError::DataIncomplete`] — distinct from not existing at all.

pub mod bulk;
pub mod decision;
pub mod engine;
pub mod impact;

pub use bulk::{
    BulkReplayOptions, BulkReplayOrchestrator, BulkReplayReport, BulkReplaySummary,
    ImpactDistribution,
};
pub use decision::{
    ActionType, ContextSnapshot, DecisionOutcome, DecisionStore, ExternalContext,
    GovernanceAction, InMemoryDecisionStore, PolicyState,
};
pub use engine::{
    OriginalDecision, PolicyChange, ReplayAnalysis, ReplayEngine, ReplayError, ReplayResult,
    ReplayTarget, ReplayedDecision, DEFAULT_ORIGINAL_CONFIDENCE, FALLBACK_CONFIDENCE,
    RULE_MATCH_CONFIDENCE,
};
pub use impact::{assess_impact, ImpactAssessment};
