use std::time::Duration;

use bazaar_permissions::EffectivePermission;
use r2e_cache::TtlCache;
use uuid::Uuid;

/// Shared, mutex-guarded-by-construction (DashMap-backed) cache of
/// permission lookups a deployed replica performs against the control
/// plane, with a per-entry TTL — grounded in the original deployment's
/// `Permissions` class (5-minute expiration, lazy eviction). Keyed by
/// caller id since a replica serves exactly one model.
#[derive(Clone)]
pub struct ReplicaPermissionCache {
    inner: TtlCache<Uuid, EffectivePermission>,
}

impl ReplicaPermissionCache {
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(5 * 60))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self { inner: TtlCache::new(ttl) }
    }

    pub fn get(&self, caller: Uuid) -> Option<EffectivePermission> {
        self.inner.get(&caller)
    }

    pub fn insert(&self, caller: Uuid, permission: EffectivePermission) {
        self.inner.insert(caller, permission);
    }

    pub fn invalidate(&self, caller: Uuid) {
        self.inner.remove(&caller);
    }

    pub fn clear(&self) {
        self.inner.clear();
    }
}

impl Default for ReplicaPermissionCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_then_insert_then_hit() {
        let cache = ReplicaPermissionCache::new();
        let caller = Uuid::new_v4();
        assert!(cache.get(caller).is_none());
        cache.insert(caller, EffectivePermission::Write);
        assert_eq!(cache.get(caller), Some(EffectivePermission::Write));
    }

    #[test]
    fn invalidate_clears_single_entry() {
        let cache = ReplicaPermissionCache::new();
        let caller = Uuid::new_v4();
        cache.insert(caller, EffectivePermission::Read);
        cache.invalidate(caller);
        assert!(cache.get(caller).is_none());
    }
}
