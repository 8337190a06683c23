//! # Context-Bound Sessions
//!
//! A session is a [`ContextToken`]: an opaque token id bound to exactly one
//! user context, carrying the permission snapshot taken at issuance. The
//! snapshot is deliberately *not* re-resolved per request — permission
//! changes reach existing sessions only through reissue or expiry.
//!
//! ## State machine
//!
//! ```text
//! Unauthenticated ──authenticate──▶ Authenticated (default context)
//!        ▲                               │ switch_context
//!        │                               ▼
//!        └──── logout / expiry ──── ContextSwitched
//! ```
//!
//! `Unauthenticated` is the absence of a token; the two live states record
//! whether the session still sits on the user's default context.

use std::collections::HashMap;
use std::sync::Arc;

use aigov_core::{ContextId, EnterpriseId, SeatId, TokenId, UserId};
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::role::{Permission, Role};

/// Live session states. The unauthenticated state is the absence of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Bound to the user's default context at login.
    Authenticated,
    /// Rebound to a non-default owned context.
    ContextSwitched,
}

/// An issued context-bound token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextToken {
    /// Opaque token identifier presented as the bearer credential.
    pub token_id: TokenId,
    /// The authenticated user.
    pub user_id: UserId,
    /// The bound context.
    pub context_id: ContextId,
    /// Enterprise scope of the bound context.
    pub enterprise_id: EnterpriseId,
    /// Seat scope of the bound context, when seat-level.
    pub seat_id: Option<SeatId>,
    /// Role within the bound context.
    pub role: Role,
    /// Permission snapshot taken at issuance. Not re-resolved per request.
    pub permissions: Vec<Permission>,
    /// Where the session sits in the state machine.
    pub state: SessionState,
    /// When the token was issued.
    pub issued_at: DateTime<Utc>,
    /// When the token stops validating.
    pub expires_at: DateTime<Utc>,
}

impl ContextToken {
    /// Whether the token has expired as of `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Thread-safe, cloneable store of live sessions.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<TokenId, ContextToken>>>,
}

impl SessionStore {
    /// Default token lifetime.
    pub fn default_ttl() -> Duration {
        Duration::hours(24)
    }

    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a token bound to the given context.
    #[allow(clippy::too_many_arguments)]
    pub fn issue(
        &self,
        user_id: UserId,
        context_id: ContextId,
        enterprise_id: EnterpriseId,
        seat_id: Option<SeatId>,
        role: Role,
        permissions: Vec<Permission>,
        state: SessionState,
        ttl: Duration,
    ) -> ContextToken {
        let now = Utc::now();
        let token = ContextToken {
            token_id: TokenId::new(),
            user_id,
            context_id,
            enterprise_id,
            seat_id,
            role,
            permissions,
            state,
            issued_at: now,
            expires_at: now + ttl,
        };
        self.inner.write().insert(token.token_id, token.clone());
        token
    }

    /// Validate a presented token id.
    ///
    /// Unknown and expired tokens fail identically with
    /// [`AuthError::InvalidCredentials`]; expired tokens are removed on the
    /// way out (the session returns to `Unauthenticated`).
    pub fn validate(&self, token_id: TokenId) -> Result<ContextToken, AuthError> {
        let mut guard = self.inner.write();
        let Some(token) = guard.get(&token_id) else {
            return Err(AuthError::InvalidCredentials);
        };
        if token.is_expired(Utc::now()) {
            guard.remove(&token_id);
            return Err(AuthError::InvalidCredentials);
        }
        Ok(token.clone())
    }

    /// Revoke one token. Idempotent.
    pub fn revoke(&self, token_id: TokenId) {
        self.inner.write().remove(&token_id);
    }

    /// Revoke every token of a user (used on user deactivation).
    pub fn revoke_for_user(&self, user_id: UserId) {
        self.inner.write().retain(|_, t| t.user_id != user_id);
    }

    /// Number of live tokens.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether no tokens are live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("tokens", &self.len())
            .finish()
    }
}
