//! # Roles & Permissions
//!
//! The closed role enum for the enterprise → agency-seat → user hierarchy,
//! the [`Permission`] grant type, and the built-in role → permission table.
//!
//! Permissions are `(resource, action)` pairs with an optional resource-id
//! binding. `"*"` is the wildcard on either component; the enterprise
//! owner's default context carries a single wildcard grant.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Roles in the governance hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform operator. Short-circuits every permission check.
    PlatformSuperAdmin,
    /// Owns an enterprise: full control of its policies, seats, and users.
    EnterpriseOwner,
    /// Administers an enterprise's policies and decisions without owning it.
    EnterpriseAdmin,
    /// Administers one agency seat: members, assignments, seat decisions.
    SeatAdmin,
    /// Works within one agency seat: submits tool usage for evaluation.
    SeatMember,
    /// Read-only access to decisions and policies in scope.
    Observer,
}

impl Role {
    /// Return the wire string for this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlatformSuperAdmin => "platform_super_admin",
            Self::EnterpriseOwner => "enterprise_owner",
            Self::EnterpriseAdmin => "enterprise_admin",
            Self::SeatAdmin => "seat_admin",
            Self::SeatMember => "seat_member",
            Self::Observer => "observer",
        }
    }

    /// Whether this role bypasses permission checks entirely.
    pub fn is_superuser(&self) -> bool {
        matches!(self, Self::PlatformSuperAdmin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Permission
// ---------------------------------------------------------------------------

/// One `(resource, action)` grant, optionally bound to a single resource id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    /// Resource family (`policies`, `decisions`, `replay`, `agency_seats`,
    /// `contexts`, `audit`) or `"*"`.
    pub resource: String,
    /// Action (`read`, `write`, `activate`, `run`, `create`, `manage`,
    /// `invite`) or `"*"`.
    pub action: String,
    /// When present, the grant applies to this resource instance only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
}

impl Permission {
    /// A grant for one `(resource, action)` pair.
    pub fn new(resource: &str, action: &str) -> Self {
        Self {
            resource: resource.to_string(),
            action: action.to_string(),
            resource_id: None,
        }
    }

    /// The universal grant (`*`/`*`).
    pub fn all() -> Self {
        Self::new("*", "*")
    }

    /// Bind this grant to a single resource instance.
    pub fn for_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Whether this grant covers the requested access.
    pub fn grants(&self, resource: &str, action: &str, resource_id: Option<&str>) -> bool {
        let resource_ok = self.resource == "*" || self.resource == resource;
        let action_ok = self.action == "*" || self.action == action;
        let id_ok = match (&self.resource_id, resource_id) {
            (None, _) => true,
            (Some(bound), Some(requested)) => bound == requested,
            (Some(_), None) => false,
        };
        resource_ok && action_ok && id_ok
    }
}

// ---------------------------------------------------------------------------
// Role → permission table
// ---------------------------------------------------------------------------

/// The built-in permissions of a role.
///
/// This is the source the [`crate::RolePermissionCache`] computes from. The
/// superuser role returns the wildcard for completeness even though checks
/// short-circuit before consulting it.
pub fn role_permissions(role: Role) -> Vec<Permission> {
    match role {
        Role::PlatformSuperAdmin => vec![Permission::all()],
        Role::EnterpriseOwner => vec![Permission::all()],
        Role::EnterpriseAdmin => vec![
            Permission::new("policies", "read"),
            Permission::new("policies", "write"),
            Permission::new("policies", "activate"),
            Permission::new("decisions", "read"),
            Permission::new("decisions", "write"),
            Permission::new("replay", "run"),
            Permission::new("agency_seats", "create"),
            Permission::new("audit", "read"),
        ],
        Role::SeatAdmin => vec![
            Permission::new("decisions", "read"),
            Permission::new("decisions", "write"),
            Permission::new("agency_seats", "manage"),
            Permission::new("contexts", "invite"),
            Permission::new("policies", "read"),
        ],
        Role::SeatMember => vec![
            Permission::new("decisions", "read"),
            Permission::new("decisions", "write"),
            Permission::new("policies", "read"),
        ],
        Role::Observer => vec![
            Permission::new("decisions", "read"),
            Permission::new("policies", "read"),
        ],
    }
}
