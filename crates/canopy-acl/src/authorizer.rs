//! Authorizer façade
//!
//! The single entry point used by the rest of the system. Reads go through
//! the permission cache and are bounded by the resolve timeout. Writes take
//! the write scope of every tree they touch, re-check authorization inside
//! it, commit, then invalidate the cache.

use std::sync::Arc;

use canopy_types::account::{AccountLookup, ActorKind};
use canopy_types::acl_adapter::{AclAdapter, Membership, Node, Visibility, VisibilityType};

use crate::cache::PermissionCache;
use crate::cascade::CascadeCoordinator;
use crate::config::AclConfig;
use crate::lock::{SubtreeGuard, SubtreeLocks};
use crate::membership::MembershipService;
use crate::prelude::*;
use crate::resolve::{self, EffectivePermission, ResolutionEngine};
use crate::tree::PathTree;
use crate::visibility::VisibilityService;

/// A node may be moved by another writer while we wait for its tree's lock
const LOCK_ATTEMPTS: usize = 3;

#[derive(Debug)]
pub struct Authorizer {
	config: AclConfig,
	accounts: Arc<dyn AccountLookup>,
	tree: PathTree,
	resolver: ResolutionEngine,
	memberships: MembershipService,
	visibility: VisibilityService,
	cascade: CascadeCoordinator,
	cache: PermissionCache,
	locks: SubtreeLocks,
}

impl Authorizer {
	pub fn new(
		adapter: Arc<dyn AclAdapter>,
		accounts: Arc<dyn AccountLookup>,
		config: AclConfig,
	) -> Self {
		let tree = PathTree::new(adapter.clone(), config.max_depth);
		let resolver = ResolutionEngine::new(adapter.clone(), accounts.clone());
		let memberships = MembershipService::new(adapter.clone(), accounts.clone(), resolver.clone());
		let visibility = VisibilityService::new(adapter.clone(), resolver.clone());
		let cascade = CascadeCoordinator::new(adapter, tree.clone(), config.max_descendants);
		let cache = PermissionCache::new(config.cache_capacity);

		Self {
			config,
			accounts,
			tree,
			resolver,
			memberships,
			visibility,
			cascade,
			cache,
			locks: SubtreeLocks::new(),
		}
	}

	pub fn config(&self) -> &AclConfig {
		&self.config
	}

	pub fn tree(&self) -> &PathTree {
		&self.tree
	}

	// Resolution
	//************

	/// Effective permission of `actor_id` on `node_id`, `None` meaning no access
	pub async fn effective(
		&self,
		tn_id: TnId,
		actor_id: &ActorId,
		node_id: &NodeId,
	) -> ClResult<Option<EffectivePermission>> {
		let version = self.cache.version();
		if let Some(hit) = self.cache.get(tn_id, actor_id, node_id, version) {
			return Ok(hit);
		}

		let res = tokio::time::timeout(
			self.config.resolve_timeout,
			self.resolver.effective(tn_id, actor_id, node_id),
		)
		.await
		.map_err(|_| {
			warn!(tn_id = %tn_id, actor = %actor_id, node = %node_id, "Permission resolution timed out");
			Error::Timeout
		})??;

		self.cache.put(tn_id, actor_id, node_id, version, res.clone());
		Ok(res)
	}

	/// Fails with `InsufficientPermission` unless the effective permission satisfies `required`
	pub async fn require(
		&self,
		tn_id: TnId,
		actor_id: &ActorId,
		node_id: &NodeId,
		required: Permission,
	) -> ClResult<EffectivePermission> {
		let res = self.effective(tn_id, actor_id, node_id).await?;
		resolve::check(res, required)
	}

	pub async fn is_public(&self, tn_id: TnId, node_id: &NodeId) -> ClResult<bool> {
		self.visibility.is_public_at(tn_id, node_id).await
	}

	pub async fn is_hidden(&self, tn_id: TnId, node_id: &NodeId) -> ClResult<bool> {
		self.visibility.is_hidden_at(tn_id, node_id).await
	}

	/// Ancestor ids, root first and the node itself last
	pub async fn ancestors(&self, tn_id: TnId, node_id: &NodeId) -> ClResult<Vec<NodeId>> {
		self.tree.ancestors_of(tn_id, node_id).await
	}

	/// Drops cached resolutions. Must be called after an account's kind changes.
	pub fn accounts_changed(&self) {
		self.cache.invalidate();
	}

	// Memberships
	//*************

	/// Direct grant of `actor_id` on `node_id`, without inheritance
	pub async fn direct_grant(
		&self,
		tn_id: TnId,
		node_id: &NodeId,
		actor_id: &ActorId,
	) -> ClResult<Option<Permission>> {
		self.memberships.get(tn_id, node_id, actor_id).await
	}

	pub async fn grant(
		&self,
		tn_id: TnId,
		grantor_id: &ActorId,
		node_id: &NodeId,
		actor_id: &ActorId,
		permission: Permission,
	) -> ClResult<Membership> {
		let (_, _guard) = self.lock_nodes(tn_id, &[node_id]).await?;
		let membership =
			self.memberships.put(tn_id, node_id, actor_id, permission, grantor_id).await?;
		self.cache.invalidate();
		Ok(membership)
	}

	/// Removes a direct grant. Returns whether one existed.
	pub async fn revoke(
		&self,
		tn_id: TnId,
		grantor_id: &ActorId,
		node_id: &NodeId,
		actor_id: &ActorId,
	) -> ClResult<bool> {
		let (_, _guard) = self.lock_nodes(tn_id, &[node_id]).await?;
		let removed = self.memberships.remove(tn_id, node_id, actor_id, grantor_id).await?;
		if removed {
			self.cache.invalidate();
		}
		Ok(removed)
	}

	/// Direct grants on a node. Requires Read.
	pub async fn list_members(
		&self,
		tn_id: TnId,
		actor_id: &ActorId,
		node_id: &NodeId,
	) -> ClResult<Vec<Membership>> {
		self.require(tn_id, actor_id, node_id, Permission::Read).await?;
		self.memberships.list_for_node(tn_id, node_id).await
	}

	// Visibilities
	//**************

	pub async fn set_visibility(
		&self,
		tn_id: TnId,
		actor_id: &ActorId,
		node_id: &NodeId,
		typ: VisibilityType,
	) -> ClResult<Visibility> {
		let (_, _guard) = self.lock_nodes(tn_id, &[node_id]).await?;
		self.resolver.require(tn_id, actor_id, node_id, Permission::Admin).await?;
		let visibility = self.visibility.set(tn_id, node_id, typ, actor_id).await?;
		self.cache.invalidate();
		Ok(visibility)
	}

	pub async fn unset_visibility(
		&self,
		tn_id: TnId,
		actor_id: &ActorId,
		node_id: &NodeId,
		typ: VisibilityType,
	) -> ClResult<bool> {
		let (_, _guard) = self.lock_nodes(tn_id, &[node_id]).await?;
		self.resolver.require(tn_id, actor_id, node_id, Permission::Admin).await?;
		let removed = self.visibility.unset(tn_id, node_id, typ).await?;
		if removed {
			self.cache.invalidate();
		}
		Ok(removed)
	}

	/// Tags directly on a node. Requires Read.
	pub async fn list_visibilities(
		&self,
		tn_id: TnId,
		actor_id: &ActorId,
		node_id: &NodeId,
	) -> ClResult<Vec<Visibility>> {
		self.require(tn_id, actor_id, node_id, Permission::Read).await?;
		self.visibility.list(tn_id, node_id).await
	}

	// Structure
	//***********

	/// Creates a node under `parent_id`, or a new root.
	///
	/// Creating a root requires a Member and makes them its Admin. Creating a
	/// child requires Write on the parent; a creator without inherited Admin
	/// receives Admin on the new node.
	pub async fn create_node(
		&self,
		tn_id: TnId,
		actor_id: &ActorId,
		parent_id: Option<&NodeId>,
	) -> ClResult<Node> {
		let creator = self.accounts.resolve_actor(tn_id, actor_id).await?;
		let node = match parent_id {
			None => {
				creator.ensure_can_grant()?;
				self.cascade.create(tn_id, None, &creator, true).await?
			}
			Some(parent_id) => {
				let (mut nodes, _guard) = self.lock_nodes(tn_id, &[parent_id]).await?;
				let parent = nodes.pop().ok_or_else(|| Error::NodeNotFound(parent_id.clone()))?;
				let held =
					self.resolver.require(tn_id, actor_id, parent_id, Permission::Write).await?;
				let grant_admin =
					held.permission < Permission::Admin && creator.kind() == ActorKind::Member;
				self.cascade.create(tn_id, Some(&parent), &creator, grant_admin).await?
			}
		};
		self.cache.invalidate();
		info!(tn_id = %tn_id, actor = %actor_id, node = %node.id, path = %node.path, "Node created");
		Ok(node)
	}

	/// Moves a subtree. Requires Admin on the node and Write on the new parent.
	pub async fn move_node(
		&self,
		tn_id: TnId,
		actor_id: &ActorId,
		node_id: &NodeId,
		new_parent_id: Option<&NodeId>,
	) -> ClResult<Node> {
		let (node, new_parent, _guard) = self.lock_pair(tn_id, node_id, new_parent_id).await?;
		self.resolver.require(tn_id, actor_id, node_id, Permission::Admin).await?;
		if let Some(parent_id) = new_parent_id {
			self.resolver.require(tn_id, actor_id, parent_id, Permission::Write).await?;
		}

		let moved = self.cascade.move_subtree(tn_id, &node, new_parent.as_ref()).await?;
		if moved.path != node.path {
			self.cache.invalidate();
			info!(tn_id = %tn_id, actor = %actor_id, node = %node_id, from = %node.path, to = %moved.path, "Node moved");
		}
		Ok(moved)
	}

	/// Copies a subtree. Requires Read on the node and Write on the new parent.
	///
	/// Grants are not copied: the copying actor becomes the only Admin of the
	/// copy. Visibility tags are copied.
	pub async fn copy_node(
		&self,
		tn_id: TnId,
		actor_id: &ActorId,
		node_id: &NodeId,
		new_parent_id: Option<&NodeId>,
	) -> ClResult<Node> {
		let (node, new_parent, _guard) = self.lock_pair(tn_id, node_id, new_parent_id).await?;
		self.resolver.require(tn_id, actor_id, node_id, Permission::Read).await?;
		if let Some(parent_id) = new_parent_id {
			self.resolver.require(tn_id, actor_id, parent_id, Permission::Write).await?;
		}

		let copier = self.accounts.resolve_actor(tn_id, actor_id).await?;
		let copy = self.cascade.copy_subtree(tn_id, &node, new_parent.as_ref(), &copier).await?;
		self.cache.invalidate();
		info!(tn_id = %tn_id, actor = %actor_id, node = %node_id, copy = %copy.id, path = %copy.path, "Node copied");
		Ok(copy)
	}

	/// Deletes a subtree with all its grants and tags. Requires Admin.
	/// Returns the number of deleted nodes.
	pub async fn delete_node(&self, tn_id: TnId, actor_id: &ActorId, node_id: &NodeId) -> ClResult<usize> {
		let (mut nodes, _guard) = self.lock_nodes(tn_id, &[node_id]).await?;
		let node = nodes.pop().ok_or_else(|| Error::NodeNotFound(node_id.clone()))?;
		self.resolver.require(tn_id, actor_id, node_id, Permission::Admin).await?;

		let deleted = self.cascade.delete_subtree(tn_id, &node).await?;
		self.cache.invalidate();
		info!(tn_id = %tn_id, actor = %actor_id, node = %node_id, deleted, "Node deleted");
		Ok(deleted)
	}

	// Write scopes
	//**************

	/// Locks the trees of a node and an optional second node
	async fn lock_pair(
		&self,
		tn_id: TnId,
		node_id: &NodeId,
		other_id: Option<&NodeId>,
	) -> ClResult<(Node, Option<Node>, SubtreeGuard)> {
		let mut ids = vec![node_id];
		ids.extend(other_id);
		let (nodes, guard) = self.lock_nodes(tn_id, &ids).await?;
		let mut nodes = nodes.into_iter();
		let node = nodes.next().ok_or_else(|| Error::NodeNotFound(node_id.clone()))?;
		Ok((node, nodes.next(), guard))
	}

	/// Reads the nodes, locks their trees and re-reads them under the lock.
	///
	/// A concurrent move may carry a node into another tree between the read
	/// and the lock; then the lock is released and taken again.
	async fn lock_nodes(
		&self,
		tn_id: TnId,
		node_ids: &[&NodeId],
	) -> ClResult<(Vec<Node>, SubtreeGuard)> {
		let mut nodes = self.read_nodes(tn_id, node_ids).await?;
		for _ in 0..LOCK_ATTEMPTS {
			let roots: Vec<&NodeId> = nodes.iter().map(Node::root_id).collect();
			let guard = self.locks.lock(tn_id, &roots).await;
			let fresh = self.read_nodes(tn_id, node_ids).await?;
			if fresh.iter().zip(&nodes).all(|(a, b)| a.root_id() == b.root_id()) {
				return Ok((fresh, guard));
			}
			debug!(tn_id = %tn_id, roots = ?guard.roots(), "Tree changed while locking, retrying");
			nodes = fresh;
		}
		warn!(tn_id = %tn_id, nodes = ?node_ids, "Could not acquire a stable write scope");
		Err(Error::Timeout)
	}

	async fn read_nodes(&self, tn_id: TnId, node_ids: &[&NodeId]) -> ClResult<Vec<Node>> {
		let mut nodes = Vec::with_capacity(node_ids.len());
		for node_id in node_ids {
			nodes.push(self.tree.node(tn_id, node_id).await?);
		}
		Ok(nodes)
	}
}

// vim: ts=4
