//! Write scopes over whole trees
//!
//! Writers lock the root of every tree they touch. Locks are always taken in
//! sorted order, so a move between two trees cannot deadlock against another
//! move in the opposite direction. Readers never lock.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::prelude::*;

type LockKey = (TnId, NodeId);

#[derive(Debug, Default)]
pub struct SubtreeLocks {
	locks: Mutex<HashMap<LockKey, Arc<AsyncMutex<()>>>>,
}

/// Held write scope; released on drop
#[derive(Debug)]
pub struct SubtreeGuard {
	roots: Vec<NodeId>,
	_guards: Vec<OwnedMutexGuard<()>>,
}

impl SubtreeGuard {
	pub fn roots(&self) -> &[NodeId] {
		&self.roots
	}
}

impl SubtreeLocks {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn lock(&self, tn_id: TnId, roots: &[&NodeId]) -> SubtreeGuard {
		let mut roots: Vec<NodeId> = roots.iter().map(|root| (*root).clone()).collect();
		roots.sort();
		roots.dedup();

		let mutexes: Vec<Arc<AsyncMutex<()>>> = {
			let mut locks = self.locks.lock();
			// Drop entries nobody holds or waits for
			locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
			roots
				.iter()
				.map(|root| Arc::clone(locks.entry((tn_id, root.clone())).or_default()))
				.collect()
		};

		let mut guards = Vec::with_capacity(mutexes.len());
		for mutex in mutexes {
			guards.push(mutex.lock_owned().await);
		}
		debug!(tn_id = %tn_id, roots = ?roots, "Acquired subtree write scope");

		SubtreeGuard { roots, _guards: guards }
	}
}


// vim: ts=4
