//! # Directory Store
//!
//! Users, enterprises, agency seats, and user contexts behind a single
//! lock. Every multi-row write (enterprise + owner context, seat + admin
//! context, default reassignment) runs under one write-lock acquisition, so
//! it commits together or not at all and readers never observe partial
//! state.
//!
//! ## Invariants
//!
//! - Exactly one `is_default` context per user with at least one active
//!   context; creation and deactivation repair the flag atomically.
//! - Contexts are soft-deactivated, never deleted.
//! - All validation happens before the first mutation; a failed operation
//!   leaves no rows behind.

use std::collections::HashMap;
use std::sync::Arc;

use aigov_core::{ContextId, EnterpriseId, SeatId, UserId};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::AuthError;
use crate::role::{Permission, Role};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A platform user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier.
    pub id: UserId,
    /// Login identifier (email).
    pub identifier: String,
    /// Display name.
    pub name: String,
    /// Deactivated users cannot authenticate.
    pub is_active: bool,
    /// When the user was provisioned.
    pub created_at: DateTime<Utc>,
}

/// A regulated enterprise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enterprise {
    /// Enterprise identifier.
    pub id: EnterpriseId,
    /// Display name.
    pub name: String,
    /// URL-safe slug, unique across the platform.
    pub slug: String,
    /// Enterprise category (`pharma`, `agency_network`, …).
    pub kind: String,
    /// When the enterprise was created.
    pub created_at: DateTime<Utc>,
}

/// An agency seat nested under an enterprise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgencySeat {
    /// Seat identifier.
    pub id: SeatId,
    /// Owning enterprise.
    pub enterprise_id: EnterpriseId,
    /// Display name.
    pub name: String,
    /// URL-safe slug, unique within the enterprise.
    pub slug: String,
    /// When the seat was created.
    pub created_at: DateTime<Utc>,
}

/// One user's membership in a governance scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    /// Context identifier.
    pub id: ContextId,
    /// The member.
    pub user_id: UserId,
    /// The enterprise scope.
    pub enterprise_id: EnterpriseId,
    /// The nested seat scope, when the membership is seat-level.
    pub seat_id: Option<SeatId>,
    /// The member's role within this scope.
    pub role: Role,
    /// Explicit grants attached to this membership.
    pub permissions: Vec<Permission>,
    /// Whether this is the context sessions bind to at login.
    pub is_default: bool,
    /// Soft-deactivation flag; inactive contexts cannot be switched into.
    pub is_active: bool,
    /// Last time a session bound or switched to this context.
    pub last_accessed: Option<DateTime<Utc>>,
    /// When the membership was created.
    pub created_at: DateTime<Utc>,
}

/// Parameters for creating an enterprise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEnterprise {
    /// Display name.
    pub name: String,
    /// URL-safe slug, unique across the platform.
    pub slug: String,
    /// Enterprise category.
    pub kind: String,
}

/// Parameters for creating an agency seat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSeat {
    /// Display name.
    pub name: String,
    /// URL-safe slug, unique within the enterprise.
    pub slug: String,
}

// ---------------------------------------------------------------------------
// DirectoryStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct DirectoryInner {
    users: HashMap<UserId, User>,
    /// identifier → (user, sha256 of the secret)
    credentials: HashMap<String, (UserId, [u8; 32])>,
    enterprises: HashMap<EnterpriseId, Enterprise>,
    seats: HashMap<SeatId, AgencySeat>,
    contexts: HashMap<ContextId, UserContext>,
}

/// Thread-safe, cloneable directory over one lock.
///
/// The lock is `parking_lot`, never held across `.await` points.
#[derive(Clone, Default)]
pub struct DirectoryStore {
    inner: Arc<RwLock<DirectoryInner>>,
}

fn secret_digest(secret: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.finalize().into()
}

impl DirectoryStore {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    // -- Users ---------------------------------------------------------------

    /// Provision a user with login credentials.
    pub fn provision_user(
        &self,
        identifier: &str,
        secret: &str,
        name: &str,
    ) -> Result<User, AuthError> {
        if identifier.trim().is_empty() {
            return Err(AuthError::Validation("identifier must not be empty".into()));
        }
        let mut guard = self.inner.write();
        if guard.credentials.contains_key(identifier) {
            return Err(AuthError::Validation(format!(
                "identifier '{identifier}' is already provisioned"
            )));
        }
        let user = User {
            id: UserId::new(),
            identifier: identifier.to_string(),
            name: name.to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        guard
            .credentials
            .insert(identifier.to_string(), (user.id, secret_digest(secret)));
        guard.users.insert(user.id, user.clone());
        Ok(user)
    }

    /// Verify login credentials.
    ///
    /// Constant-time digest comparison; the error never distinguishes an
    /// unknown identifier from a wrong secret or an inactive user.
    pub fn verify_credentials(&self, identifier: &str, secret: &str) -> Result<User, AuthError> {
        let guard = self.inner.read();
        let provided = secret_digest(secret);
        let Some((user_id, stored)) = guard.credentials.get(identifier) else {
            // Burn the same comparison cost on unknown identifiers.
            let _ = provided[..].ct_eq(&provided[..]);
            return Err(AuthError::InvalidCredentials);
        };
        if !bool::from(provided[..].ct_eq(&stored[..])) {
            return Err(AuthError::InvalidCredentials);
        }
        match guard.users.get(user_id) {
            Some(user) if user.is_active => Ok(user.clone()),
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    /// Load a user by id.
    pub fn user(&self, user_id: UserId) -> Option<User> {
        self.inner.read().users.get(&user_id).cloned()
    }

    // -- Contexts ------------------------------------------------------------

    /// Create a membership context for a user.
    ///
    /// Default handling is atomic with the insert: a user's first active
    /// context becomes the default regardless of the flag passed; when
    /// `is_default` is set, any previous default is cleared in the same
    /// write.
    pub fn create_context(
        &self,
        user_id: UserId,
        enterprise_id: EnterpriseId,
        seat_id: Option<SeatId>,
        role: Role,
        permissions: Vec<Permission>,
        is_default: bool,
    ) -> Result<UserContext, AuthError> {
        let mut guard = self.inner.write();
        if !guard.users.contains_key(&user_id) {
            return Err(AuthError::NotFound(format!("user {user_id}")));
        }
        if !guard.enterprises.contains_key(&enterprise_id) {
            return Err(AuthError::NotFound(format!("enterprise {enterprise_id}")));
        }
        if let Some(seat) = seat_id {
            match guard.seats.get(&seat) {
                Some(s) if s.enterprise_id == enterprise_id => {}
                Some(_) => {
                    return Err(AuthError::Validation(
                        "seat does not belong to the enterprise".into(),
                    ))
                }
                None => return Err(AuthError::NotFound(format!("seat {seat}"))),
            }
        }
        Ok(Self::insert_context_locked(
            &mut guard,
            user_id,
            enterprise_id,
            seat_id,
            role,
            permissions,
            is_default,
        ))
    }

    /// Insert a context under an already-held write lock.
    ///
    /// Shared by [`Self::create_context`] and the transactional enterprise
    /// and seat creation paths.
    fn insert_context_locked(
        guard: &mut DirectoryInner,
        user_id: UserId,
        enterprise_id: EnterpriseId,
        seat_id: Option<SeatId>,
        role: Role,
        permissions: Vec<Permission>,
        is_default: bool,
    ) -> UserContext {
        let has_default = guard
            .contexts
            .values()
            .any(|c| c.user_id == user_id && c.is_active && c.is_default);
        let make_default = is_default || !has_default;
        if make_default {
            for context in guard.contexts.values_mut() {
                if context.user_id == user_id {
                    context.is_default = false;
                }
            }
        }
        let context = UserContext {
            id: ContextId::new(),
            user_id,
            enterprise_id,
            seat_id,
            role,
            permissions,
            is_default: make_default,
            is_active: true,
            last_accessed: None,
            created_at: Utc::now(),
        };
        guard.contexts.insert(context.id, context.clone());
        context
    }

    /// The user's default context.
    pub fn default_context(&self, user_id: UserId) -> Option<UserContext> {
        self.inner
            .read()
            .contexts
            .values()
            .find(|c| c.user_id == user_id && c.is_active && c.is_default)
            .cloned()
    }

    /// All active contexts for a user, default first, then by recency.
    pub fn contexts_for_user(&self, user_id: UserId) -> Vec<UserContext> {
        let mut contexts: Vec<UserContext> = self
            .inner
            .read()
            .contexts
            .values()
            .filter(|c| c.user_id == user_id && c.is_active)
            .cloned()
            .collect();
        contexts.sort_by(|a, b| {
            b.is_default
                .cmp(&a.is_default)
                .then_with(|| b.last_accessed.cmp(&a.last_accessed))
        });
        contexts
    }

    /// Load a context by id, regardless of owner or status.
    pub fn context(&self, context_id: ContextId) -> Option<UserContext> {
        self.inner.read().contexts.get(&context_id).cloned()
    }

    /// Resolve a context for a switch, atomically touching `last_accessed`.
    ///
    /// Ownership is checked before liveness: a context owned by someone
    /// else is `Forbidden` (uniform message); an unknown or inactive
    /// context is `ContextNotFound`.
    pub fn context_for_switch(
        &self,
        user_id: UserId,
        context_id: ContextId,
    ) -> Result<UserContext, AuthError> {
        let mut guard = self.inner.write();
        let context = guard
            .contexts
            .get_mut(&context_id)
            .ok_or(AuthError::ContextNotFound)?;
        if context.user_id != user_id {
            return Err(AuthError::Forbidden);
        }
        if !context.is_active {
            return Err(AuthError::ContextNotFound);
        }
        context.last_accessed = Some(Utc::now());
        Ok(context.clone())
    }

    /// Record that a session bound to this context.
    pub fn touch_context(&self, context_id: ContextId) {
        if let Some(context) = self.inner.write().contexts.get_mut(&context_id) {
            context.last_accessed = Some(Utc::now());
        }
    }

    /// Soft-deactivate a context, repairing the default flag atomically.
    ///
    /// When the deactivated context was the default, the most recently
    /// accessed remaining active context (if any) becomes the default in
    /// the same write.
    pub fn deactivate_context(&self, context_id: ContextId) -> Result<(), AuthError> {
        let mut guard = self.inner.write();
        let context = guard
            .contexts
            .get_mut(&context_id)
            .ok_or(AuthError::ContextNotFound)?;
        let was_default = context.is_default;
        let user_id = context.user_id;
        context.is_active = false;
        context.is_default = false;

        if was_default {
            let successor = guard
                .contexts
                .values_mut()
                .filter(|c| c.user_id == user_id && c.is_active)
                .max_by_key(|c| (c.last_accessed, c.created_at))
                .map(|c| {
                    c.is_default = true;
                    c.id
                });
            if let Some(promoted) = successor {
                tracing::debug!(%user_id, context = %promoted, "default context reassigned after deactivation");
            }
        }
        Ok(())
    }

    // -- Enterprises & seats -------------------------------------------------

    /// Create an enterprise plus the creator's owning default context.
    ///
    /// One transaction: validation first, then both inserts under the same
    /// write lock. A failed validation leaves no enterprise row and no
    /// context row.
    pub fn create_enterprise(
        &self,
        params: NewEnterprise,
        created_by: UserId,
    ) -> Result<(Enterprise, UserContext), AuthError> {
        if params.slug.trim().is_empty() {
            return Err(AuthError::Validation("slug must not be empty".into()));
        }
        let mut guard = self.inner.write();
        if !guard.users.contains_key(&created_by) {
            return Err(AuthError::TransactionAborted(format!(
                "creator {created_by} does not exist"
            )));
        }
        if guard.enterprises.values().any(|e| e.slug == params.slug) {
            return Err(AuthError::TransactionAborted(format!(
                "enterprise slug '{}' is taken",
                params.slug
            )));
        }

        let enterprise = Enterprise {
            id: EnterpriseId::new(),
            name: params.name,
            slug: params.slug,
            kind: params.kind,
            created_at: Utc::now(),
        };
        guard.enterprises.insert(enterprise.id, enterprise.clone());
        let context = Self::insert_context_locked(
            &mut guard,
            created_by,
            enterprise.id,
            None,
            Role::EnterpriseOwner,
            vec![Permission::all()],
            true,
        );
        Ok((enterprise, context))
    }

    /// Create an agency seat plus the creator's seat-admin context.
    ///
    /// Same transactional shape as [`Self::create_enterprise`].
    pub fn create_agency_seat(
        &self,
        enterprise_id: EnterpriseId,
        params: NewSeat,
        created_by: UserId,
    ) -> Result<(AgencySeat, UserContext), AuthError> {
        if params.slug.trim().is_empty() {
            return Err(AuthError::Validation("slug must not be empty".into()));
        }
        let mut guard = self.inner.write();
        if !guard.users.contains_key(&created_by) {
            return Err(AuthError::TransactionAborted(format!(
                "creator {created_by} does not exist"
            )));
        }
        if !guard.enterprises.contains_key(&enterprise_id) {
            return Err(AuthError::TransactionAborted(format!(
                "enterprise {enterprise_id} does not exist"
            )));
        }
        if guard
            .seats
            .values()
            .any(|s| s.enterprise_id == enterprise_id && s.slug == params.slug)
        {
            return Err(AuthError::TransactionAborted(format!(
                "seat slug '{}' is taken within the enterprise",
                params.slug
            )));
        }

        let seat = AgencySeat {
            id: SeatId::new(),
            enterprise_id,
            name: params.name,
            slug: params.slug,
            created_at: Utc::now(),
        };
        guard.seats.insert(seat.id, seat.clone());
        let context = Self::insert_context_locked(
            &mut guard,
            created_by,
            enterprise_id,
            Some(seat.id),
            Role::SeatAdmin,
            vec![
                Permission::new("agency_seats", "manage").for_resource_id(seat.id.to_string()),
                Permission::new("contexts", "invite"),
            ],
            false,
        );
        Ok((seat, context))
    }

    /// Load an enterprise by id.
    pub fn enterprise(&self, enterprise_id: EnterpriseId) -> Option<Enterprise> {
        self.inner.read().enterprises.get(&enterprise_id).cloned()
    }

    /// Load a seat by id.
    pub fn seat(&self, seat_id: SeatId) -> Option<AgencySeat> {
        self.inner.read().seats.get(&seat_id).cloned()
    }

    /// Number of enterprises in the directory. Exposed for invariant tests.
    pub fn enterprise_count(&self) -> usize {
        self.inner.read().enterprises.len()
    }

    /// Number of contexts in the directory. Exposed for invariant tests.
    pub fn context_count(&self) -> usize {
        self.inner.read().contexts.len()
    }

    /// Number of default contexts a user holds. Always 0 or 1; exposed for
    /// invariant tests.
    pub fn default_count(&self, user_id: UserId) -> usize {
        self.inner
            .read()
            .contexts
            .values()
            .filter(|c| c.user_id == user_id && c.is_active && c.is_default)
            .count()
    }
}

impl std::fmt::Debug for DirectoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = self.inner.read();
        f.debug_struct("DirectoryStore")
            .field("users", &guard.users.len())
            .field("enterprises", &guard.enterprises.len())
            .field("seats", &guard.seats.len())
            .field("contexts", &guard.contexts.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> (DirectoryStore, User, Enterprise) {
        let directory = DirectoryStore::new();
        let user = directory
            .provision_user("owner@acme.example", "hunter2", "Acme Owner")
            .unwrap();
        let (enterprise, _) = directory
            .create_enterprise(
                NewEnterprise {
                    name: "Acme Pharma".into(),
                    slug: "acme".into(),
                    kind: "pharma".into(),
                },
                user.id,
            )
            .unwrap();
        (directory, user, enterprise)
    }

    // ── Credentials ──────────────────────────────────────────────

    #[test]
    fn verify_accepts_correct_secret() {
        let (directory, user, _) = seeded();
        let verified = directory
            .verify_credentials("owner@acme.example", "hunter2")
            .unwrap();
        assert_eq!(verified.id, user.id);
    }

    #[test]
    fn verify_rejects_wrong_secret_uniformly() {
        let (directory, _, _) = seeded();
        let wrong_secret = directory
            .verify_credentials("owner@acme.example", "nope")
            .unwrap_err();
        let unknown_user = directory
            .verify_credentials("ghost@acme.example", "hunter2")
            .unwrap_err();
        assert_eq!(wrong_secret, AuthError::InvalidCredentials);
        assert_eq!(unknown_user, AuthError::InvalidCredentials);
        assert_eq!(wrong_secret.to_string(), unknown_user.to_string());
    }

    #[test]
    fn duplicate_identifier_rejected() {
        let (directory, _, _) = seeded();
        let err = directory
            .provision_user("owner@acme.example", "x", "Dup")
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    // ── Default context invariant ────────────────────────────────

    #[test]
    fn first_context_becomes_default() {
        let (directory, user, _) = seeded();
        // Enterprise creation gave the owner a default context.
        assert_eq!(directory.default_count(user.id), 1);
        let default = directory.default_context(user.id).unwrap();
        assert_eq!(default.role, Role::EnterpriseOwner);
        assert!(default.is_default);
    }

    #[test]
    fn explicit_default_clears_previous() {
        let (directory, user, enterprise) = seeded();
        let second = directory
            .create_context(user.id, enterprise.id, None, Role::Observer, vec![], true)
            .unwrap();
        assert_eq!(directory.default_count(user.id), 1);
        assert_eq!(directory.default_context(user.id).unwrap().id, second.id);
    }

    #[test]
    fn non_default_context_does_not_move_the_flag() {
        let (directory, user, enterprise) = seeded();
        let original_default = directory.default_context(user.id).unwrap().id;
        directory
            .create_context(user.id, enterprise.id, None, Role::Observer, vec![], false)
            .unwrap();
        assert_eq!(directory.default_count(user.id), 1);
        assert_eq!(directory.default_context(user.id).unwrap().id, original_default);
    }

    #[test]
    fn deactivating_default_promotes_successor() {
        let (directory, user, enterprise) = seeded();
        let default = directory.default_context(user.id).unwrap();
        let other = directory
            .create_context(user.id, enterprise.id, None, Role::Observer, vec![], false)
            .unwrap();
        directory.touch_context(other.id);

        directory.deactivate_context(default.id).unwrap();
        assert_eq!(directory.default_count(user.id), 1);
        assert_eq!(directory.default_context(user.id).unwrap().id, other.id);
    }

    #[test]
    fn invariant_holds_across_operation_sequences() {
        let (directory, user, enterprise) = seeded();
        let mut ids = vec![directory.default_context(user.id).unwrap().id];
        for i in 0..4 {
            let ctx = directory
                .create_context(
                    user.id,
                    enterprise.id,
                    None,
                    Role::Observer,
                    vec![],
                    i % 2 == 0,
                )
                .unwrap();
            ids.push(ctx.id);
            assert_eq!(directory.default_count(user.id), 1);
        }
        for id in ids.iter().take(3) {
            let _ = directory.deactivate_context(*id);
            assert!(directory.default_count(user.id) <= 1);
        }
        // Two active contexts remain; exactly one default among them.
        assert_eq!(directory.default_count(user.id), 1);
    }

    // ── Context switching ────────────────────────────────────────

    #[test]
    fn switch_to_foreign_context_is_forbidden() {
        let (directory, _, enterprise) = seeded();
        let other_user = directory
            .provision_user("rival@acme.example", "secret", "Rival")
            .unwrap();
        let foreign = directory
            .create_context(other_user.id, enterprise.id, None, Role::Observer, vec![], true)
            .unwrap();

        let intruder = directory
            .provision_user("intruder@acme.example", "secret", "Intruder")
            .unwrap();
        let err = directory
            .context_for_switch(intruder.id, foreign.id)
            .unwrap_err();
        assert_eq!(err, AuthError::Forbidden);
    }

    #[test]
    fn switch_to_unknown_context_is_not_found() {
        let (directory, user, _) = seeded();
        let err = directory
            .context_for_switch(user.id, ContextId::new())
            .unwrap_err();
        assert_eq!(err, AuthError::ContextNotFound);
    }

    #[test]
    fn switch_to_inactive_context_is_not_found() {
        let (directory, user, enterprise) = seeded();
        let context = directory
            .create_context(user.id, enterprise.id, None, Role::Observer, vec![], false)
            .unwrap();
        directory.deactivate_context(context.id).unwrap();
        let err = directory.context_for_switch(user.id, context.id).unwrap_err();
        assert_eq!(err, AuthError::ContextNotFound);
    }

    #[test]
    fn switch_touches_last_accessed() {
        let (directory, user, _) = seeded();
        let context = directory.default_context(user.id).unwrap();
        assert!(context.last_accessed.is_none());
        let switched = directory.context_for_switch(user.id, context.id).unwrap();
        assert!(switched.last_accessed.is_some());
    }

    // ── Transactional creation ───────────────────────────────────

    #[test]
    fn enterprise_creation_is_all_or_nothing() {
        let directory = DirectoryStore::new();
        // Creator does not exist: neither enterprise nor context row lands.
        let err = directory
            .create_enterprise(
                NewEnterprise {
                    name: "Ghost Corp".into(),
                    slug: "ghost".into(),
                    kind: "pharma".into(),
                },
                UserId::new(),
            )
            .unwrap_err();
        assert!(matches!(err, AuthError::TransactionAborted(_)));
        assert_eq!(directory.enterprise_count(), 0);
        assert_eq!(directory.context_count(), 0);
    }

    #[test]
    fn duplicate_slug_aborts_without_partial_state() {
        let (directory, user, _) = seeded();
        let contexts_before = directory.context_count();
        let err = directory
            .create_enterprise(
                NewEnterprise {
                    name: "Acme Again".into(),
                    slug: "acme".into(),
                    kind: "pharma".into(),
                },
                user.id,
            )
            .unwrap_err();
        assert!(matches!(err, AuthError::TransactionAborted(_)));
        assert_eq!(directory.enterprise_count(), 1);
        assert_eq!(directory.context_count(), contexts_before);
    }

    #[test]
    fn seat_creation_under_unknown_enterprise_leaves_nothing() {
        let (directory, user, _) = seeded();
        let contexts_before = directory.context_count();
        let err = directory
            .create_agency_seat(
                EnterpriseId::new(),
                NewSeat {
                    name: "North".into(),
                    slug: "north".into(),
                },
                user.id,
            )
            .unwrap_err();
        assert!(matches!(err, AuthError::TransactionAborted(_)));
        assert_eq!(directory.context_count(), contexts_before);
        assert!(directory.seat(SeatId::new()).is_none());
    }

    #[test]
    fn seat_creation_grants_seat_admin_context() {
        let (directory, user, enterprise) = seeded();
        let (seat, context) = directory
            .create_agency_seat(
                enterprise.id,
                NewSeat {
                    name: "North".into(),
                    slug: "north".into(),
                },
                user.id,
            )
            .unwrap();
        assert_eq!(context.role, Role::SeatAdmin);
        assert_eq!(context.seat_id, Some(seat.id));
        // The owner already had a default; the seat context must not steal it.
        assert!(!context.is_default);
        assert_eq!(directory.default_count(user.id), 1);
    }

    #[test]
    fn seat_context_carries_bound_manage_grant() {
        let (directory, user, enterprise) = seeded();
        let (seat, context) = directory
            .create_agency_seat(
                enterprise.id,
                NewSeat {
                    name: "North".into(),
                    slug: "north".into(),
                },
                user.id,
            )
            .unwrap();
        assert!(context
            .permissions
            .iter()
            .any(|p| p.grants("agency_seats", "manage", Some(&seat.id.to_string()))));
        assert!(!context
            .permissions
            .iter()
            .any(|p| p.grants("agency_seats", "manage", Some("other-seat"))));
    }

    #[test]
    fn contexts_for_user_orders_default_first() {
        let (directory, user, enterprise) = seeded();
        let second = directory
            .create_context(user.id, enterprise.id, None, Role::Observer, vec![], false)
            .unwrap();
        directory.touch_context(second.id);
        let contexts = directory.contexts_for_user(user.id);
        assert_eq!(contexts.len(), 2);
        assert!(contexts[0].is_default);
    }

    #[test]
    fn seat_must_belong_to_enterprise() {
        let (directory, user, enterprise) = seeded();
        let (other_enterprise, _) = directory
            .create_enterprise(
                NewEnterprise {
                    name: "Other".into(),
                    slug: "other".into(),
                    kind: "agency_network".into(),
                },
                user.id,
            )
            .unwrap();
        let (seat, _) = directory
            .create_agency_seat(
                other_enterprise.id,
                NewSeat {
                    name: "South".into(),
                    slug: "south".into(),
                },
                user.id,
            )
            .unwrap();
        let err = directory
            .create_context(
                user.id,
                enterprise.id,
                Some(seat.id),
                Role::SeatMember,
                vec![],
                false,
            )
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }
}
