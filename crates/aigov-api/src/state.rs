//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers via
//! the `State` extractor.
//!
//! ## Architecture
//!
//! AppState aggregates the governance core's stores and services:
//!
//! - **AuthService** — directory, sessions, and the injected role cache.
//! - **SnapshotStore** — per-enterprise policy snapshot arenas.
//! - **InMemoryDecisionStore** — the in-process decision log; when a
//!   Postgres pool is configured, decisions are also written through to the
//!   durable external log (`crate::db`).
//! - **ReplayEngine / BulkReplayOrchestrator** — single and batch replay.
//! - **InMemoryAuditLog** — the audit sink every component appends into.

use std::sync::Arc;
use std::time::Duration;

use aigov_auth::{AuthService, DirectoryStore, RolePermissionCache, SessionStore};
use aigov_core::InMemoryAuditLog;
use aigov_policy::SnapshotStore;
use aigov_replay::{BulkReplayOrchestrator, InMemoryDecisionStore, ReplayEngine};
use sqlx::PgPool;

/// Server configuration, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// TCP port to bind.
    pub port: u16,
    /// Concurrency cap for bulk replay.
    pub bulk_concurrency: usize,
    /// Per-decision replay timeout.
    pub bulk_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            bulk_concurrency: aigov_replay::bulk::DEFAULT_CONCURRENCY,
            bulk_timeout: aigov_replay::bulk::DEFAULT_PER_DECISION_TIMEOUT,
        }
    }
}

impl AppConfig {
    /// Build configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            bulk_concurrency: std::env::var("BULK_REPLAY_CONCURRENCY")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.bulk_concurrency),
            bulk_timeout: std::env::var("BULK_REPLAY_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.bulk_timeout),
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: AppConfig,
    /// The hierarchical authorization service.
    pub auth: AuthService,
    /// Policy snapshot store.
    pub snapshots: SnapshotStore,
    /// In-process decision log.
    pub decisions: Arc<InMemoryDecisionStore>,
    /// Single-decision replay engine.
    pub replay: ReplayEngine,
    /// Bounded-concurrency bulk replay.
    pub orchestrator: BulkReplayOrchestrator,
    /// Process-local audit log.
    pub audit: Arc<InMemoryAuditLog>,
    /// Durable external log, when configured.
    pub pool: Option<PgPool>,
}

impl AppState {
    /// Assemble an in-memory state (no Postgres pool).
    pub fn in_memory(config: AppConfig) -> Self {
        Self::assemble(config, None)
    }

    /// Assemble the full state.
    pub fn assemble(config: AppConfig, pool: Option<PgPool>) -> Self {
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
        let orchestrator = BulkReplayOrchestrator::new(replay.clone())
            .with_concurrency(config.bulk_concurrency)
            .with_per_decision_timeout(config.bulk_timeout);

        Self {
            config,
            auth,
            snapshots,
            decisions,
            replay,
            orchestrator,
            audit,
            pool,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("pool", &self.pool.as_ref().map(|_| "[configured]"))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let config = AppConfig::default();
        assert_eq!(config.port, 8080);
        assert!(config.bulk_concurrency >= 1);
        assert!(config.bulk_timeout > Duration::from_millis(0));
    }

    #[test]
    fn in_memory_state_assembles() {
        let state = AppState::in_memory(AppConfig::default());
        assert!(state.pool.is_none());
        assert!(state.audit.is_empty());
        assert!(state.decisions.is_empty());
    }

    #[test]
    fn state_clones_share_stores() {
        let state = AppState::in_memory(AppConfig::default());
        let clone = state.clone();
        let enterprise = aigov_core::EnterpriseId::new();
        clone.snapshots.submit_draft(enterprise, "1.0", vec![]).unwrap();
        // The original sees the clone's write.
        assert_eq!(state.snapshots.list_versions(enterprise), vec!["1.0"]);
    }
}
