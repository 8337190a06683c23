//! # Authorization Service
//!
//! The façade the rest of the system talks to: `authenticate`,
//! `switch_context`, `check_permission`, `logout`, and the transactional
//! `create_enterprise` / `create_agency_seat`. Everything above this seam
//! (policy evaluation, replay, the HTTP surface) is gated through it.

use std::sync::Arc;

use aigov_core::{
    AuditEntry, AuditEntryKind, AuditSink, ContextId, EnterpriseId, TokenId, UserId,
};
use chrono::Duration;

use crate::cache::RolePermissionCache;
use crate::directory::{
    AgencySeat, DirectoryStore, Enterprise, NewEnterprise, NewSeat, User, UserContext,
};
use crate::error::AuthError;
use crate::role::role_permissions;
use crate::session::{ContextToken, SessionState, SessionStore};

/// An authenticated, context-bound session.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// The authenticated user.
    pub user: User,
    /// The bound context.
    pub context: UserContext,
    /// The context-bound token.
    pub token: ContextToken,
}

/// The hierarchical authorization service.
#[derive(Clone)]
pub struct AuthService {
    directory: DirectoryStore,
    sessions: SessionStore,
    role_cache: Arc<RolePermissionCache>,
    audit: Arc<dyn AuditSink>,
    token_ttl: Duration,
}

impl AuthService {
    /// Create a service over the given stores and injected cache.
    pub fn new(
        directory: DirectoryStore,
        sessions: SessionStore,
        role_cache: Arc<RolePermissionCache>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            directory,
            sessions,
            role_cache,
            audit,
            token_ttl: SessionStore::default_ttl(),
        }
    }

    /// Override the token lifetime.
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Access the directory store.
    pub fn directory(&self) -> &DirectoryStore {
        &self.directory
    }

    /// Access the session store.
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    // -- Session lifecycle ---------------------------------------------------

    /// Authenticate and bind a session to the user's default context.
    ///
    /// Every failure path — unknown identifier, wrong secret, inactive
    /// user, missing default context — returns the same
    /// [`AuthError::InvalidCredentials`].
    pub fn authenticate(&self, identifier: &str, secret: &str) -> Result<AuthSession, AuthError> {
        let user = self.directory.verify_credentials(identifier, secret)?;
        let context = self
            .directory
            .default_context(user.id)
            .ok_or(AuthError::InvalidCredentials)?;
        self.directory.touch_context(context.id);

        let token = self.sessions.issue(
            user.id,
            context.id,
            context.enterprise_id,
            context.seat_id,
            context.role,
            context.permissions.clone(),
            SessionState::Authenticated,
            self.token_ttl,
        );

        self.audit.append(AuditEntry::new(
            AuditEntryKind::SessionOpened,
            Some(user.id.to_string()),
            Some(serde_json::json!({
                "context_id": context.id.to_string(),
                "role": context.role.as_str(),
            })),
        ));

        Ok(AuthSession {
            user,
            context,
            token,
        })
    }

    /// Rebind a session to a different context owned by the same user.
    ///
    /// Ownership is verified before liveness: a context owned by someone
    /// else fails with [`AuthError::Forbidden`], an unknown or inactive one
    /// with [`AuthError::ContextNotFound`]. Goes through the directory's
    /// atomic switch operation, never read-then-write.
    pub fn switch_context(
        &self,
        user_id: UserId,
        context_id: ContextId,
    ) -> Result<AuthSession, AuthError> {
        let user = self
            .directory
            .user(user_id)
            .ok_or(AuthError::InvalidCredentials)?;
        let context = self.directory.context_for_switch(user_id, context_id)?;

        let token = self.sessions.issue(
            user_id,
            context.id,
            context.enterprise_id,
            context.seat_id,
            context.role,
            context.permissions.clone(),
            SessionState::ContextSwitched,
            self.token_ttl,
        );

        self.audit.append(AuditEntry::new(
            AuditEntryKind::ContextSwitched,
            Some(user_id.to_string()),
            Some(serde_json::json!({
                "context_id": context.id.to_string(),
                "enterprise_id": context.enterprise_id.to_string(),
            })),
        ));

        Ok(AuthSession {
            user,
            context,
            token,
        })
    }

    /// Validate a presented token.
    pub fn validate_token(&self, token_id: TokenId) -> Result<ContextToken, AuthError> {
        self.sessions.validate(token_id)
    }

    /// Close a session. Idempotent.
    pub fn logout(&self, token_id: TokenId) {
        if let Ok(token) = self.sessions.validate(token_id) {
            self.audit.append(AuditEntry::new(
                AuditEntryKind::SessionClosed,
                Some(token.user_id.to_string()),
                None,
            ));
        }
        self.sessions.revoke(token_id);
    }

    /// All active contexts of the token's user, default first.
    pub fn contexts_for_token(&self, token_id: TokenId) -> Result<Vec<UserContext>, AuthError> {
        let token = self.sessions.validate(token_id)?;
        Ok(self.directory.contexts_for_user(token.user_id))
    }

    // -- Permission checks ---------------------------------------------------

    /// Check whether the session may perform `action` on `resource`.
    ///
    /// Resolution order:
    /// 1. the designated superuser role short-circuits `true`;
    /// 2. the token's embedded permission snapshot (issuance-time, not
    ///    re-resolved);
    /// 3. the cached role → permission table.
    ///
    /// An invalid or expired token is an error, not `false` — callers must
    /// distinguish "denied" from "not authenticated".
    pub fn check_permission(
        &self,
        token_id: TokenId,
        resource: &str,
        action: &str,
        resource_id: Option<&str>,
    ) -> Result<bool, AuthError> {
        let token = self.sessions.validate(token_id)?;

        if token.role.is_superuser() {
            return Ok(true);
        }

        if token
            .permissions
            .iter()
            .any(|p| p.grants(resource, action, resource_id))
        {
            return Ok(true);
        }

        let role_grants = self
            .role_cache
            .get_or_compute(token.role, role_permissions);
        Ok(role_grants
            .iter()
            .any(|p| p.grants(resource, action, resource_id)))
    }

    /// [`Self::check_permission`] that maps denial to
    /// [`AuthError::Forbidden`].
    pub fn require_permission(
        &self,
        token_id: TokenId,
        resource: &str,
        action: &str,
        resource_id: Option<&str>,
    ) -> Result<ContextToken, AuthError> {
        if self.check_permission(token_id, resource, action, resource_id)? {
            self.sessions.validate(token_id)
        } else {
            Err(AuthError::Forbidden)
        }
    }

    // -- Provisioning --------------------------------------------------------

    /// Create an enterprise with the creator as its owner.
    ///
    /// Entity row, owning default context, and audit entry commit together
    /// or not at all.
    pub fn create_enterprise(
        &self,
        params: NewEnterprise,
        created_by: UserId,
    ) -> Result<(Enterprise, UserContext), AuthError> {
        let (enterprise, context) = self.directory.create_enterprise(params, created_by)?;
        self.audit.append(AuditEntry::new(
            AuditEntryKind::EnterpriseCreated,
            Some(enterprise.id.to_string()),
            Some(serde_json::json!({
                "name": enterprise.name.clone(),
                "slug": enterprise.slug.clone(),
                "created_by": created_by.to_string(),
            })),
        ));
        Ok((enterprise, context))
    }

    /// Create an agency seat with the creator as its admin.
    pub fn create_agency_seat(
        &self,
        enterprise_id: EnterpriseId,
        params: NewSeat,
        created_by: UserId,
    ) -> Result<(AgencySeat, UserContext), AuthError> {
        let (seat, context) = self
            .directory
            .create_agency_seat(enterprise_id, params, created_by)?;
        self.audit.append(AuditEntry::new(
            AuditEntryKind::SeatCreated,
            Some(seat.id.to_string()),
            Some(serde_json::json!({
                "enterprise_id": enterprise_id.to_string(),
                "name": seat.name.clone(),
                "created_by": created_by.to_string(),
            })),
        ));
        Ok((seat, context))
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("directory", &self.directory)
            .field("sessions", &self.sessions)
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}
