//! Membership grants
//!
//! Direct grants only: nothing here looks at inheritance except the grantor
//! check, which resolves the grantor's effective permission.

use std::sync::Arc;

use canopy_types::account::AccountLookup;
use canopy_types::acl_adapter::{AclAdapter, Membership};

use crate::prelude::*;
use crate::resolve::ResolutionEngine;

#[derive(Clone, Debug)]
pub struct MembershipService {
	adapter: Arc<dyn AclAdapter>,
	accounts: Arc<dyn AccountLookup>,
	resolver: ResolutionEngine,
}

impl MembershipService {
	pub fn new(
		adapter: Arc<dyn AclAdapter>,
		accounts: Arc<dyn AccountLookup>,
		resolver: ResolutionEngine,
	) -> Self {
		Self { adapter, accounts, resolver }
	}

	/// Direct grant of `actor_id` on `node_id`
	pub async fn get(
		&self,
		tn_id: TnId,
		node_id: &NodeId,
		actor_id: &ActorId,
	) -> ClResult<Option<Permission>> {
		let membership = self.adapter.read_membership(tn_id, node_id, actor_id).await?;
		Ok(membership.map(|m| m.permission))
	}

	/// Creates or updates the grant of `actor_id` on `node_id`.
	///
	/// The grantor must be a Member holding Admin on the node, and Guests can
	/// only ever receive Read.
	pub async fn put(
		&self,
		tn_id: TnId,
		node_id: &NodeId,
		actor_id: &ActorId,
		permission: Permission,
		grantor_id: &ActorId,
	) -> ClResult<Membership> {
		let grantor = self.accounts.resolve_actor(tn_id, grantor_id).await?;
		grantor.ensure_can_grant()?;
		self.ensure_admin(tn_id, grantor_id, node_id).await?;

		let grantee = self.accounts.resolve_actor(tn_id, actor_id).await?;
		let ceiling = grantee.permission_ceiling();
		if permission > ceiling {
			warn!(
				tn_id = %tn_id,
				actor = %actor_id,
				kind = ?grantee.kind(),
				requested = %permission,
				"Grant above the actor's permission ceiling rejected"
			);
			return Err(Error::InvalidGrantor(format!(
				"'{}' can be granted at most {}, not {}",
				actor_id, ceiling, permission
			)));
		}

		let now = Timestamp::now();
		let created_at = self
			.adapter
			.read_membership(tn_id, node_id, actor_id)
			.await?
			.map_or(now, |existing| existing.created_at);
		let membership = Membership {
			node_id: node_id.clone(),
			actor_id: actor_id.clone(),
			permission,
			granted_by: Some(grantor_id.clone()),
			created_at,
			updated_at: now,
		};
		let membership = self.adapter.upsert_membership(tn_id, &membership).await?;
		info!(
			tn_id = %tn_id,
			node = %node_id,
			actor = %actor_id,
			permission = %permission,
			grantor = %grantor_id,
			"Membership granted"
		);
		Ok(membership)
	}

	/// Removes the grant of `actor_id` on `node_id`.
	///
	/// Admins may remove any grant, everybody may remove their own. The only
	/// remaining Admin grant along the node's path cannot be removed.
	pub async fn remove(
		&self,
		tn_id: TnId,
		node_id: &NodeId,
		actor_id: &ActorId,
		grantor_id: &ActorId,
	) -> ClResult<bool> {
		let lineage = self.resolver.lineage(tn_id, node_id, None).await?;

		if grantor_id != actor_id {
			let grantor = self.accounts.resolve_actor(tn_id, grantor_id).await?;
			grantor.ensure_can_grant()?;
			self.ensure_admin(tn_id, grantor_id, node_id).await?;
		}

		let Some(existing) = self.adapter.read_membership(tn_id, node_id, actor_id).await? else {
			return Ok(false);
		};

		if existing.permission == Permission::Admin {
			self.ensure_other_admin(tn_id, &lineage.node.path, node_id, actor_id).await?;
		}

		let removed = self.adapter.delete_membership(tn_id, node_id, actor_id).await?;
		info!(tn_id = %tn_id, node = %node_id, actor = %actor_id, grantor = %grantor_id, "Membership revoked");
		Ok(removed)
	}

	/// Direct grants on a node, no inheritance
	pub async fn list_for_node(&self, tn_id: TnId, node_id: &NodeId) -> ClResult<Vec<Membership>> {
		self.adapter.list_memberships(tn_id, node_id).await
	}

	async fn ensure_admin(&self, tn_id: TnId, grantor_id: &ActorId, node_id: &NodeId) -> ClResult<()> {
		let held = self.resolver.effective(tn_id, grantor_id, node_id).await?.map(|p| p.permission);
		if held != Some(Permission::Admin) {
			warn!(tn_id = %tn_id, grantor = %grantor_id, node = %node_id, held = ?held, "Non-admin grantor rejected");
			return Err(Error::InvalidGrantor(format!(
				"'{}' is not an admin of node '{}'",
				grantor_id, node_id
			)));
		}
		Ok(())
	}

	/// Fails with `LastAdmin` unless another Admin grant exists on the path
	async fn ensure_other_admin(
		&self,
		tn_id: TnId,
		path: &NodePath,
		node_id: &NodeId,
		actor_id: &ActorId,
	) -> ClResult<()> {
		for ancestor in path.closest_first() {
			let memberships = self.adapter.list_memberships(tn_id, ancestor).await?;
			let other_admin = memberships.iter().any(|m| {
				m.permission == Permission::Admin
					&& !(m.node_id == *node_id && m.actor_id == *actor_id)
			});
			if other_admin {
				return Ok(());
			}
		}
		Err(Error::LastAdmin)
	}
}

// vim: ts=4
