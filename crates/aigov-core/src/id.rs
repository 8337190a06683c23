//! # Identifier Newtypes
//!
//! Domain-primitive newtypes for identifiers throughout the governance core.
//! Each identifier is a distinct type — you cannot pass a [`UserId`] where
//! an [`EnterpriseId`] is expected. All are UUID-backed and always valid by
//! construction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

uuid_id! {
    /// A platform user. One user may hold many [`ContextId`]-scoped memberships.
    UserId
}

uuid_id! {
    /// A regulated enterprise — the root of the authorization hierarchy.
    EnterpriseId
}

uuid_id! {
    /// An agency seat nested under an enterprise.
    SeatId
}

uuid_id! {
    /// A user context: the (enterprise, optional seat, role, permissions)
    /// scope a session binds to.
    ContextId
}

uuid_id! {
    /// A versioned policy snapshot.
    SnapshotId
}

uuid_id! {
    /// A recorded governance decision (one row in the decision log).
    DecisionId
}

uuid_id! {
    /// A governance thread grouping related decisions.
    ThreadId
}

uuid_id! {
    /// An issued context-bound session token.
    TokenId
}
