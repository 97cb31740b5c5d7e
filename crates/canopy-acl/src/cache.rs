//! Versioned LRU cache of resolved permissions
//!
//! Entries are keyed by (tenant, actor, node, tree version). Every committed
//! mutation bumps the version, so an entry computed before a mutation can
//! never be returned after it, even if the computation raced with the write.

use lru::LruCache;
use parking_lot::RwLock;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::prelude::*;
use crate::resolve::EffectivePermission;

type CacheKey = (TnId, ActorId, NodeId, u64);

pub struct PermissionCache {
	cache: Option<RwLock<LruCache<CacheKey, Option<EffectivePermission>>>>,
	version: AtomicU64,
}

impl PermissionCache {
	pub fn new(capacity: usize) -> Self {
		Self {
			cache: NonZeroUsize::new(capacity).map(|cap| RwLock::new(LruCache::new(cap))),
			version: AtomicU64::new(0),
		}
	}

	/// Current tree version. Read it before resolving, then store under it.
	pub fn version(&self) -> u64 {
		self.version.load(Ordering::Acquire)
	}

	pub fn get(
		&self,
		tn_id: TnId,
		actor_id: &ActorId,
		node_id: &NodeId,
		version: u64,
	) -> Option<Option<EffectivePermission>> {
		let cache = self.cache.as_ref()?;
		let key = (tn_id, actor_id.clone(), node_id.clone(), version);
		cache.write().get(&key).cloned()
	}

	pub fn put(
		&self,
		tn_id: TnId,
		actor_id: &ActorId,
		node_id: &NodeId,
		version: u64,
		value: Option<EffectivePermission>,
	) {
		let Some(cache) = self.cache.as_ref() else {
			return;
		};
		// A put for an outdated version would only evict live entries
		if version != self.version() {
			return;
		}
		cache.write().put((tn_id, actor_id.clone(), node_id.clone(), version), value);
	}

	/// Invalidates every cached resolution. Called after each committed mutation.
	pub fn invalidate(&self) -> u64 {
		let version = self.version.fetch_add(1, Ordering::AcqRel) + 1;
		if let Some(cache) = self.cache.as_ref() {
			cache.write().clear();
		}
		version
	}

	pub fn len(&self) -> usize {
		self.cache.as_ref().map_or(0, |cache| cache.read().len())
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl std::fmt::Debug for PermissionCache {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PermissionCache")
			.field("len", &self.len())
			.field("version", &self.version())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::resolve::PermissionSource;

	fn admin_on(node: &NodeId) -> Option<EffectivePermission> {
		Some(EffectivePermission {
			permission: Permission::Admin,
			source: PermissionSource::Grant { node_id: node.clone() },
		})
	}

	#[test]
	fn test_hit_and_miss() {
		let cache = PermissionCache::new(8);
		let actor = ActorId::from("alice");
		let node = NodeId::new("n1").unwrap();
		let v = cache.version();

		assert_eq!(cache.get(TnId(1), &actor, &node, v), None);
		cache.put(TnId(1), &actor, &node, v, admin_on(&node));
		assert_eq!(cache.get(TnId(1), &actor, &node, v), Some(admin_on(&node)));
		assert_eq!(cache.get(TnId(2), &actor, &node, v), None);

		// "no access" is cached too
		let other = ActorId::from("bob");
		cache.put(TnId(1), &other, &node, v, None);
		assert_eq!(cache.get(TnId(1), &other, &node, v), Some(None));
	}

	#[test]
	fn test_invalidate_bumps_version() {
		let cache = PermissionCache::new(8);
		let actor = ActorId::from("alice");
		let node = NodeId::new("n1").unwrap();
		let v = cache.version();
		cache.put(TnId(1), &actor, &node, v, admin_on(&node));

		let v2 = cache.invalidate();
		assert_eq!(v2, v + 1);
		assert!(cache.is_empty());
		assert_eq!(cache.get(TnId(1), &actor, &node, v2), None);

		// a resolution that started before the mutation is not stored
		cache.put(TnId(1), &actor, &node, v, admin_on(&node));
		assert!(cache.is_empty());
	}

	#[test]
	fn test_disabled_cache() {
		let cache = PermissionCache::new(0);
		let actor = ActorId::from("alice");
		let node = NodeId::new("n1").unwrap();
		cache.put(TnId(1), &actor, &node, 0, admin_on(&node));
		assert_eq!(cache.get(TnId(1), &actor, &node, 0), None);
		assert_eq!(cache.len(), 0);
	}
}

// vim: ts=4
