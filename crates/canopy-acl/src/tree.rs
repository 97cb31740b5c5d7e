//! Path tree queries
//!
//! The hierarchy exists only as materialized paths. Ancestors are read from a
//! node's own path, descendants are found by prefix queries in the adapter.

use std::sync::Arc;

use canopy_types::acl_adapter::{AclAdapter, Node};

use crate::prelude::*;

#[derive(Clone, Debug)]
pub struct PathTree {
	adapter: Arc<dyn AclAdapter>,
	max_depth: usize,
}

impl PathTree {
	pub fn new(adapter: Arc<dyn AclAdapter>, max_depth: usize) -> Self {
		Self { adapter, max_depth }
	}

	pub async fn node(&self, tn_id: TnId, node_id: &NodeId) -> ClResult<Node> {
		match self.adapter.read_node(tn_id, node_id).await {
			Err(Error::NotFound) => Err(Error::NodeNotFound(node_id.clone())),
			res => res,
		}
	}

	/// Ancestor ids of a node, root first and the node itself last
	pub async fn ancestors_of(&self, tn_id: TnId, node_id: &NodeId) -> ClResult<Vec<NodeId>> {
		let node = self.node(tn_id, node_id).await?;
		Ok(node.path.ids().to_vec())
	}

	/// Is `candidate` the node `of` or one of its descendants?
	pub async fn is_descendant_or_self(
		&self,
		tn_id: TnId,
		candidate: &NodeId,
		of: &NodeId,
	) -> ClResult<bool> {
		let candidate = self.node(tn_id, candidate).await?;
		let of = self.node(tn_id, of).await?;
		Ok(candidate.path.is_descendant_or_self_of(&of.path))
	}

	/// Path of a new node `id` under `parent` (or a new root), depth checked
	pub fn child_path(&self, parent: Option<&Node>, id: NodeId) -> ClResult<NodePath> {
		let path = match parent {
			Some(parent) => parent.path.child(id),
			None => NodePath::root(id),
		};
		self.check_depth(path.depth())?;
		Ok(path)
	}

	pub fn check_depth(&self, depth: usize) -> ClResult<()> {
		if depth > self.max_depth {
			return Err(Error::HierarchyTooDeep { depth, max: self.max_depth });
		}
		Ok(())
	}

	/// The node and all its descendants, shallowest first
	pub async fn subtree_nodes(&self, tn_id: TnId, node: &Node) -> ClResult<Vec<Node>> {
		self.adapter.list_subtree_nodes(tn_id, &node.path).await
	}
}

// vim: ts=4
