//! Public / Hidden visibility overlay
//!
//! Tags inherit by ancestor existence: a tag on any ancestor-or-self activates
//! it for the node. The lookup reuses the same ancestor walk as resolution.

use std::sync::Arc;

use canopy_types::acl_adapter::{AclAdapter, Visibility, VisibilityType};

use crate::prelude::*;
use crate::resolve::ResolutionEngine;
use crate::walk;

#[derive(Clone, Debug)]
pub struct VisibilityService {
	adapter: Arc<dyn AclAdapter>,
	resolver: ResolutionEngine,
}

impl VisibilityService {
	pub fn new(adapter: Arc<dyn AclAdapter>, resolver: ResolutionEngine) -> Self {
		Self { adapter, resolver }
	}

	pub async fn is_tagged_at(
		&self,
		tn_id: TnId,
		node_id: &NodeId,
		typ: VisibilityType,
	) -> ClResult<bool> {
		let lineage = self.resolver.lineage(tn_id, node_id, None).await?;
		Ok(walk::is_tagged(&lineage, typ))
	}

	pub async fn is_public_at(&self, tn_id: TnId, node_id: &NodeId) -> ClResult<bool> {
		self.is_tagged_at(tn_id, node_id, VisibilityType::Public).await
	}

	pub async fn is_hidden_at(&self, tn_id: TnId, node_id: &NodeId) -> ClResult<bool> {
		self.is_tagged_at(tn_id, node_id, VisibilityType::Hidden).await
	}

	/// Tags a node. Setting an existing tag keeps the original row.
	pub async fn set(
		&self,
		tn_id: TnId,
		node_id: &NodeId,
		typ: VisibilityType,
		actor_id: &ActorId,
	) -> ClResult<Visibility> {
		let visibility = Visibility {
			node_id: node_id.clone(),
			typ,
			created_by: Some(actor_id.clone()),
			created_at: Timestamp::now(),
		};
		let visibility = self.adapter.create_visibility(tn_id, &visibility).await?;
		info!(tn_id = %tn_id, node = %node_id, typ = %typ, actor = %actor_id, "Visibility set");
		Ok(visibility)
	}

	pub async fn unset(&self, tn_id: TnId, node_id: &NodeId, typ: VisibilityType) -> ClResult<bool> {
		let removed = self.adapter.delete_visibility(tn_id, node_id, typ).await?;
		if removed {
			info!(tn_id = %tn_id, node = %node_id, typ = %typ, "Visibility unset");
		}
		Ok(removed)
	}

	/// Tags directly on a node
	pub async fn list(&self, tn_id: TnId, node_id: &NodeId) -> ClResult<Vec<Visibility>> {
		self.adapter.list_visibilities(tn_id, node_id).await
	}
}

// vim: ts=4
