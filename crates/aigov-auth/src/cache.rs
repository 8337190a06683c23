//! # Role → Permission Cache
//!
//! An explicit cache abstraction for role permission lookups: TTL-bounded
//! entries plus invalidate-on-write hooks, injected into the service rather
//! than living as a module-level singleton.
//!
//! ## Consistency
//!
//! The cache is process-local with no cross-instance invalidation. A
//! permission change on another instance is visible here only after the
//! entry's TTL lapses or this process restarts. That staleness window is
//! intentional and documented — do not paper over it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::role::{Permission, Role};

struct CacheEntry {
    permissions: Arc<Vec<Permission>>,
    cached_at: Instant,
}

/// TTL cache over role → permission sets.
pub struct RolePermissionCache {
    ttl: Duration,
    entries: RwLock<HashMap<Role, CacheEntry>>,
}

impl RolePermissionCache {
    /// Default entry lifetime.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

    /// Create a cache with the given TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Look up a role's permissions, computing and caching on miss or
    /// expiry.
    pub fn get_or_compute(
        &self,
        role: Role,
        compute: impl FnOnce(Role) -> Vec<Permission>,
    ) -> Arc<Vec<Permission>> {
        {
            let guard = self.entries.read();
            if let Some(entry) = guard.get(&role) {
                if entry.cached_at.elapsed() < self.ttl {
                    return Arc::clone(&entry.permissions);
                }
            }
        }

        let permissions = Arc::new(compute(role));
        self.entries.write().insert(
            role,
            CacheEntry {
                permissions: Arc::clone(&permissions),
                cached_at: Instant::now(),
            },
        );
        permissions
    }

    /// Invalidate-on-write hook for one role.
    ///
    /// Call whenever a role's permission set is changed through this
    /// instance; other instances rely on TTL expiry.
    pub fn invalidate(&self, role: Role) {
        if self.entries.write().remove(&role).is_some() {
            tracing::debug!(role = %role, "role permission cache entry invalidated");
        }
    }

    /// Drop every cached entry.
    pub fn invalidate_all(&self) {
        self.entries.write().clear();
    }

    /// Number of live (possibly expired) entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RolePermissionCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TTL)
    }
}

impl std::fmt::Debug for RolePermissionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RolePermissionCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::role_permissions;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn second_lookup_hits_cache() {
        let cache = RolePermissionCache::default();
        let computes = AtomicUsize::new(0);
        let compute = |role: Role| {
            computes.fetch_add(1, Ordering::SeqCst);
            role_permissions(role)
        };

        let first = cache.get_or_compute(Role::SeatMember, compute);
        let second = cache.get_or_compute(Role::SeatMember, compute);
        assert_eq!(computes.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
    }

    #[test]
    fn distinct_roles_have_distinct_entries() {
        let cache = RolePermissionCache::default();
        cache.get_or_compute(Role::SeatMember, role_permissions);
        cache.get_or_compute(Role::Observer, role_permissions);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn ttl_expiry_triggers_recompute() {
        let cache = RolePermissionCache::new(Duration::from_millis(0));
        let computes = AtomicUsize::new(0);
        let compute = |role: Role| {
            computes.fetch_add(1, Ordering::SeqCst);
            role_permissions(role)
        };

        cache.get_or_compute(Role::Observer, compute);
        cache.get_or_compute(Role::Observer, compute);
        assert_eq!(computes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn invalidate_drops_entry_immediately() {
        let cache = RolePermissionCache::default();
        let computes = AtomicUsize::new(0);
        let compute = |role: Role| {
            computes.fetch_add(1, Ordering::SeqCst);
            role_permissions(role)
        };

        cache.get_or_compute(Role::SeatAdmin, compute);
        cache.invalidate(Role::SeatAdmin);
        cache.get_or_compute(Role::SeatAdmin, compute);
        assert_eq!(computes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn invalidate_all_empties_the_cache() {
        let cache = RolePermissionCache::default();
        cache.get_or_compute(Role::SeatMember, role_permissions);
        cache.get_or_compute(Role::Observer, role_permissions);
        cache.invalidate_all();
        assert!(cache.is_empty());
    }
}
