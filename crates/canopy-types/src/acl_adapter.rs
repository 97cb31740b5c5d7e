//! Adapter that stores the content tree, membership grants and visibility tags.
//!
//! The engine never holds child pointers: children are discovered by path
//! prefix queries against the adapter. Structural mutations are handed to
//! the adapter as a [`ChangeSet`] which it must apply atomically.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::fmt::Debug;

use crate::prelude::*;

/// A content node
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
	pub id: NodeId,
	/// Root first, the node itself last
	pub path: NodePath,
	pub created_at: Timestamp,
}

impl Node {
	pub fn parent_id(&self) -> Option<&NodeId> {
		self.path.parent_id()
	}

	pub fn root_id(&self) -> &NodeId {
		self.path.root_id().unwrap_or(&self.id)
	}

	pub fn is_root(&self) -> bool {
		self.path.depth() == 1
	}
}

/// A direct permission grant of one actor on one node
#[skip_serializing_none]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
	pub node_id: NodeId,
	pub actor_id: ActorId,
	pub permission: Permission,
	/// `None` for grants created by the system (node creation, copy)
	pub granted_by: Option<ActorId>,
	pub created_at: Timestamp,
	pub updated_at: Timestamp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityType {
	Public,
	Hidden,
}

impl VisibilityType {
	pub fn code(self) -> &'static str {
		match self {
			VisibilityType::Public => "P",
			VisibilityType::Hidden => "H",
		}
	}

	pub fn from_code(code: &str) -> ClResult<Self> {
		match code {
			"P" => Ok(VisibilityType::Public),
			"H" => Ok(VisibilityType::Hidden),
			_ => Err(Error::Parse),
		}
	}
}

impl std::fmt::Display for VisibilityType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			VisibilityType::Public => "public",
			VisibilityType::Hidden => "hidden",
		})
	}
}

/// A visibility tag attached to a node
#[skip_serializing_none]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visibility {
	pub node_id: NodeId,
	#[serde(rename = "type")]
	pub typ: VisibilityType,
	pub created_by: Option<ActorId>,
	pub created_at: Timestamp,
}

/// Everything needed to resolve one (actor, node) pair, read from one snapshot.
///
/// `grants` holds the grants of the requested actor on any node of `node.path`,
/// `visibilities` every tag on any node of `node.path`.
#[derive(Clone, Debug)]
pub struct Lineage {
	pub node: Node,
	pub grants: Vec<Membership>,
	pub visibilities: Vec<Visibility>,
}

/// A node with all its descendants and their rows, read from one snapshot.
///
/// `nodes` is ordered by depth, so parents always precede their children.
#[derive(Clone, Debug)]
pub struct Subtree {
	pub root: Node,
	pub nodes: Vec<Node>,
	pub memberships: Vec<Membership>,
	pub visibilities: Vec<Visibility>,
}

impl Subtree {
	/// Number of strict descendants of the subtree root
	pub fn descendant_count(&self) -> usize {
		self.nodes.len().saturating_sub(1)
	}

	/// Deepest path length found in the subtree
	pub fn max_depth(&self) -> usize {
		self.nodes.iter().map(|n| n.path.depth()).max().unwrap_or(self.root.path.depth())
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CascadeOp {
	Create,
	Move,
	Copy,
	Delete,
}

impl std::fmt::Display for CascadeOp {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			CascadeOp::Create => "create",
			CascadeOp::Move => "move",
			CascadeOp::Copy => "copy",
			CascadeOp::Delete => "delete",
		})
	}
}

/// A single row-level change
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeChange {
	InsertNode(Node),
	RewritePath { node_id: NodeId, path: NodePath },
	DeleteNode(NodeId),
	PutMembership(Membership),
	DeleteMemberships(NodeId),
	PutVisibility(Visibility),
	DeleteVisibilities(NodeId),
}

/// Ordered list of changes that must be applied all-or-nothing
#[derive(Clone, Debug)]
pub struct ChangeSet {
	pub op: CascadeOp,
	pub changes: Vec<TreeChange>,
}

impl ChangeSet {
	pub fn new(op: CascadeOp) -> Self {
		Self { op, changes: Vec::new() }
	}

	pub fn push(&mut self, change: TreeChange) {
		self.changes.push(change);
	}

	pub fn len(&self) -> usize {
		self.changes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.changes.is_empty()
	}
}

/// A `Canopy` ACL adapter
///
/// Every `AclAdapter` implementation is required to implement this trait.
/// An `AclAdapter` persists three logical tables: nodes (id, path, parent),
/// memberships (node, actor, permission) and visibilities (node, type).
#[async_trait]
pub trait AclAdapter: Debug + Send + Sync {
	// Nodes
	//*******

	/// Reads a node. Fails with `NotFound` for unknown ids.
	async fn read_node(&self, tn_id: TnId, node_id: &NodeId) -> ClResult<Node>;

	/// Lists the node at `path` and all its descendants (prefix query), ordered by depth
	async fn list_subtree_nodes(&self, tn_id: TnId, path: &NodePath) -> ClResult<Vec<Node>>;

	// Memberships
	//*************

	/// Reads the direct grant of `actor_id` on `node_id`, if any
	async fn read_membership(
		&self,
		tn_id: TnId,
		node_id: &NodeId,
		actor_id: &ActorId,
	) -> ClResult<Option<Membership>>;

	/// Creates or updates the grant for (node, actor). Returns the stored row.
	async fn upsert_membership(&self, tn_id: TnId, membership: &Membership) -> ClResult<Membership>;

	/// Deletes the grant for (node, actor). Returns whether a row existed.
	async fn delete_membership(
		&self,
		tn_id: TnId,
		node_id: &NodeId,
		actor_id: &ActorId,
	) -> ClResult<bool>;

	/// Lists the direct grants on a node (no inheritance)
	async fn list_memberships(&self, tn_id: TnId, node_id: &NodeId) -> ClResult<Vec<Membership>>;

	// Visibilities
	//**************

	/// Lists the tags directly on a node
	async fn list_visibilities(&self, tn_id: TnId, node_id: &NodeId) -> ClResult<Vec<Visibility>>;

	/// Creates a tag. An existing tag of the same type is kept as is.
	async fn create_visibility(&self, tn_id: TnId, visibility: &Visibility) -> ClResult<Visibility>;

	/// Deletes a tag. Returns whether a row existed.
	async fn delete_visibility(
		&self,
		tn_id: TnId,
		node_id: &NodeId,
		typ: VisibilityType,
	) -> ClResult<bool>;

	// Snapshots
	//***********

	/// Reads a node with the grants of `actor_id` and the tags along its path.
	///
	/// All rows must come from one consistent snapshot. With `actor_id` set to
	/// `None` no grants are returned.
	async fn read_lineage(
		&self,
		tn_id: TnId,
		node_id: &NodeId,
		actor_id: Option<&ActorId>,
	) -> ClResult<Lineage>;

	/// Reads a node, its descendants and all their rows from one consistent snapshot
	async fn read_subtree(&self, tn_id: TnId, node_id: &NodeId) -> ClResult<Subtree>;

	/// Applies a change set atomically: either every change persists or none does.
	///
	/// An adapter that cannot tell whether a failed change set was committed
	/// must fail with `CascadeFailure { persisted: true, .. }`.
	async fn apply_changes(&self, tn_id: TnId, changes: &ChangeSet) -> ClResult<()>;
}


// vim: ts=4
