#![deny(missing_docs)]

//! # aigov-auth — Hierarchical Context & Authorization Layer
//!
//! Resolves which governance scope a user may act in across the
//! enterprise → agency-seat → user hierarchy, and gates every read/write of
//! the policy and replay engines.
//!
//! - [`role`] — the closed [`Role`] enum, [`Permission`] grants, and the
//!   built-in role → permission table.
//! - [`cache`] — [`RolePermissionCache`]: an injected TTL cache with
//!   explicit invalidate-on-write hooks. Process-local by design; staleness
//!   across instances is a documented gap, not a hidden one.
//! - [`directory`] — users, enterprises, seats, and [`UserContext`] rows,
//!   behind one lock so multi-row writes commit together or not at all.
//! - [`session`] — context-bound tokens and the
//!   `Unauthenticated → Authenticated → ContextSwitched` state machine.
//! - [`service`] — [`AuthService`]: `authenticate`, `switch_context`,
//!   `check_permission`, `logout`, and the transactional
//!   `create_enterprise` / `create_agency_seat`.
//!
//! ## Enumeration resistance
//!
//! Authentication and authorization failures use fixed messages
//! (`invalid credentials`, `access denied`) regardless of which internal
//! check failed.

pub mod cache;
pub mod directory;
pub mod error;
pub mod role;
pub mod service;
pub mod session;

pub use cache::RolePermissionCache;
pub use directory::{
    AgencySeat, DirectoryStore, Enterprise, NewEnterprise, NewSeat, User, UserContext,
};
pub use error::AuthError;
pub use role::{role_permissions, Permission, Role};
pub use service::{AuthService, AuthSession};
pub use session::{ContextToken, SessionState, SessionStore};
