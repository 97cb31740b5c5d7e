//! Effective permission resolution
//!
//! Resolution of (actor, node):
//! 1. Walk the node's ancestors closest-first; the first direct grant of the
//!    actor is the base permission. Grants further up are not consulted, so a
//!    restrictive grant close to the node overrides a permissive one above it.
//! 2. Without any grant, a Public ancestor-or-self yields an implicit Read.
//! 3. A Hidden ancestor-or-self vetoes every base permission below Write.
//!
//! The base permission is capped by the actor's kind before the veto, so a
//! Guest never resolves above Read even if it still holds an older grant.

use serde::Serialize;
use std::sync::Arc;

use canopy_types::account::AccountLookup;
use canopy_types::acl_adapter::{AclAdapter, Lineage, VisibilityType};

use crate::prelude::*;
use crate::walk;

/// Where an effective permission comes from
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "type")]
pub enum PermissionSource {
	/// Direct grant on the given ancestor-or-self
	Grant { node_id: NodeId },
	/// Implicit Read from a Public ancestor-or-self
	Public { node_id: NodeId },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectivePermission {
	pub permission: Permission,
	pub source: PermissionSource,
}

impl EffectivePermission {
	pub fn satisfies(&self, required: Permission) -> bool {
		self.permission.satisfies(required)
	}
}

/// Pure resolution over a lineage snapshot
pub fn resolve(lineage: &Lineage) -> Option<EffectivePermission> {
	resolve_capped(lineage, Permission::Admin)
}

/// Like [`resolve`], with the granted permission capped at `ceiling`
pub fn resolve_capped(lineage: &Lineage, ceiling: Permission) -> Option<EffectivePermission> {
	let base = if let Some(grant) = walk::closest_grant(lineage) {
		EffectivePermission {
			permission: grant.permission.min(ceiling),
			source: PermissionSource::Grant { node_id: grant.node_id.clone() },
		}
	} else if let Some(public) = walk::tagged_ancestor(lineage, VisibilityType::Public) {
		EffectivePermission {
			permission: Permission::Read,
			source: PermissionSource::Public { node_id: public.clone() },
		}
	} else {
		return None;
	};

	if base.permission < Permission::Write && walk::is_tagged(lineage, VisibilityType::Hidden) {
		return None;
	}

	Some(base)
}

/// Resolves effective permissions against an [`AclAdapter`]
#[derive(Clone, Debug)]
pub struct ResolutionEngine {
	adapter: Arc<dyn AclAdapter>,
	accounts: Arc<dyn AccountLookup>,
}

impl ResolutionEngine {
	pub fn new(adapter: Arc<dyn AclAdapter>, accounts: Arc<dyn AccountLookup>) -> Self {
		Self { adapter, accounts }
	}

	/// Reads the lineage of a node, mapping unknown ids to `NodeNotFound`
	pub async fn lineage(
		&self,
		tn_id: TnId,
		node_id: &NodeId,
		actor_id: Option<&ActorId>,
	) -> ClResult<Lineage> {
		match self.adapter.read_lineage(tn_id, node_id, actor_id).await {
			Err(Error::NotFound) => Err(Error::NodeNotFound(node_id.clone())),
			res => res,
		}
	}

	pub async fn effective(
		&self,
		tn_id: TnId,
		actor_id: &ActorId,
		node_id: &NodeId,
	) -> ClResult<Option<EffectivePermission>> {
		let lineage = self.lineage(tn_id, node_id, Some(actor_id)).await?;
		let ceiling = match walk::closest_grant(&lineage) {
			Some(grant) if grant.permission > Permission::Read => {
				self.ceiling_of(tn_id, actor_id).await?
			}
			_ => Permission::Admin,
		};
		let res = resolve_capped(&lineage, ceiling);
		debug!(
			tn_id = %tn_id,
			actor = %actor_id,
			node = %node_id,
			permission = ?res.as_ref().map(|p| p.permission),
			source = ?res.as_ref().map(|p| &p.source),
			"Resolved effective permission"
		);
		Ok(res)
	}

	/// Unregistered actors get the Guest ceiling
	async fn ceiling_of(&self, tn_id: TnId, actor_id: &ActorId) -> ClResult<Permission> {
		match self.accounts.kind_of(tn_id, actor_id).await {
			Ok(kind) => Ok(kind.permission_ceiling()),
			Err(Error::NotFound) => {
				debug!(tn_id = %tn_id, actor = %actor_id, "Grant held by unknown actor");
				Ok(Permission::Read)
			}
			Err(err) => Err(err),
		}
	}

	/// Resolves and fails with `InsufficientPermission` below `required`
	pub async fn require(
		&self,
		tn_id: TnId,
		actor_id: &ActorId,
		node_id: &NodeId,
		required: Permission,
	) -> ClResult<EffectivePermission> {
		let res = self.effective(tn_id, actor_id, node_id).await?;
		check(res, required)
	}
}

/// Turns a resolution result into a `require` outcome
pub fn check(res: Option<EffectivePermission>, required: Permission) -> ClResult<EffectivePermission> {
	match res {
		Some(effective) if effective.satisfies(required) => Ok(effective),
		res => Err(Error::InsufficientPermission { required, held: res.map(|p| p.permission) }),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use canopy_types::acl_adapter::{Membership, Node, Visibility};

	fn id(s: &str) -> NodeId {
		NodeId::new(s).unwrap()
	}

	fn lineage(path: &str, grants: &[(&str, Permission)], tags: &[(&str, VisibilityType)]) -> Lineage {
		let path = NodePath::parse(path).unwrap();
		let node_id = path.ids().last().unwrap().clone();
		Lineage {
			node: Node { id: node_id, path, created_at: Timestamp(0) },
			grants: grants
				.iter()
				.map(|(node, permission)| Membership {
					node_id: id(node),
					actor_id: ActorId::from("a"),
					permission: *permission,
					granted_by: None,
					created_at: Timestamp(0),
					updated_at: Timestamp(0),
				})
				.collect(),
			visibilities: tags
				.iter()
				.map(|(node, typ)| Visibility {
					node_id: id(node),
					typ: *typ,
					created_by: None,
					created_at: Timestamp(0),
				})
				.collect(),
		}
	}

	fn perm(l: &Lineage) -> Option<Permission> {
		resolve(l).map(|p| p.permission)
	}

	#[test]
	fn test_no_grant_no_tag_is_no_access() {
		assert_eq!(perm(&lineage("r.c1", &[], &[])), None);
	}

	#[test]
	fn test_closest_ancestor_wins() {
		let l = lineage("gp.p.c", &[("gp", Permission::Admin), ("c", Permission::Read)], &[]);
		assert_eq!(perm(&l), Some(Permission::Read));

		let l = lineage("gp.p.c", &[("gp", Permission::Read), ("p", Permission::Admin)], &[]);
		assert_eq!(
			resolve(&l).map(|p| p.source),
			Some(PermissionSource::Grant { node_id: id("p") })
		);
	}

	#[test]
	fn test_public_grants_read() {
		let l = lineage("r.c1.g1", &[], &[("r", VisibilityType::Public)]);
		assert_eq!(
			resolve(&l),
			Some(EffectivePermission {
				permission: Permission::Read,
				source: PermissionSource::Public { node_id: id("r") },
			})
		);
	}

	#[test]
	fn test_grant_beats_public() {
		let l = lineage("r.c1", &[("c1", Permission::Write)], &[("r", VisibilityType::Public)]);
		assert_eq!(perm(&l), Some(Permission::Write));
	}

	#[test]
	fn test_hidden_veto() {
		let tags = [("r", VisibilityType::Public), ("c1", VisibilityType::Hidden)];
		assert_eq!(perm(&lineage("r.c1", &[], &tags)), None);
		assert_eq!(perm(&lineage("r.c1", &[("r", Permission::Read)], &tags)), None);
		assert_eq!(
			perm(&lineage("r.c1", &[("c1", Permission::Write)], &tags)),
			Some(Permission::Write)
		);
		assert_eq!(
			perm(&lineage("r.c1.x", &[("r", Permission::Admin)], &tags)),
			Some(Permission::Admin)
		);
	}

	#[test]
	fn test_hidden_does_not_affect_siblings() {
		let tags = [("r", VisibilityType::Public), ("c1", VisibilityType::Hidden)];
		assert_eq!(perm(&lineage("r.c2", &[], &tags)), Some(Permission::Read));
	}

	#[test]
	fn test_capped_grant_keeps_source() {
		let l = lineage("r.c1", &[("r", Permission::Admin)], &[]);
		assert_eq!(
			resolve_capped(&l, Permission::Read),
			Some(EffectivePermission {
				permission: Permission::Read,
				source: PermissionSource::Grant { node_id: id("r") },
			})
		);
		assert_eq!(resolve_capped(&l, Permission::Admin), resolve(&l));
	}

	#[test]
	fn test_capped_grant_is_vetoed_by_hidden() {
		let l = lineage("r.c1", &[("r", Permission::Admin)], &[("c1", VisibilityType::Hidden)]);
		assert_eq!(perm(&l), Some(Permission::Admin));
		assert_eq!(resolve_capped(&l, Permission::Read), None);
	}

	#[test]
	fn test_check() {
		let l = lineage("r", &[("r", Permission::Admin)], &[]);
		for required in Permission::ALL {
			assert!(check(resolve(&l), required).is_ok());
		}

		let l = lineage("r", &[("r", Permission::Read)], &[]);
		match check(resolve(&l), Permission::Write) {
			Err(Error::InsufficientPermission { required, held }) => {
				assert_eq!(required, Permission::Write);
				assert_eq!(held, Some(Permission::Read));
			}
			res => panic!("unexpected: {:?}", res),
		}
		assert!(matches!(
			check(None, Permission::Read),
			Err(Error::InsufficientPermission { held: None, .. })
		));
	}
}

// vim: ts=4
