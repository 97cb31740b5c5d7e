//! Structural cascades: create, move, copy and delete of whole subtrees
//!
//! Each cascade reads its subtree from one snapshot, plans the full list of
//! row changes in memory and hands them to the adapter as one atomic
//! [`ChangeSet`]. The planners are pure functions so they can be tested
//! without storage.
//!
//! ```text
//!  move:   Attached -> Detached -> Relocating -> Attached
//!  copy:   Attached -> Cloning  -> Attached
//!  delete: Attached -> Deleting -> Gone
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use canopy_types::account::Actor;
use canopy_types::acl_adapter::{
	AclAdapter, CascadeOp, ChangeSet, Membership, Node, Subtree, TreeChange, Visibility,
};

use crate::prelude::*;
use crate::tree::PathTree;

/// Lifecycle stage of a subtree during a cascade, used for tracing only
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CascadeStage {
	Attached,
	Detached,
	Relocating,
	Cloning,
	Deleting,
	Gone,
}

/// Plans a move of `subtree` under `onto` (or to the top level).
///
/// Ids are kept, every path is rewritten. Memberships and visibilities are
/// keyed by node id so they travel with the nodes untouched.
pub fn plan_move(subtree: &Subtree, onto: Option<&NodePath>) -> ClResult<ChangeSet> {
	let mut changes = ChangeSet::new(CascadeOp::Move);
	for node in &subtree.nodes {
		let path = node.path.rebase(&subtree.root.path, onto).ok_or_else(|| {
			Error::ValidationError(format!("node '{}' is outside the moved subtree", node.id))
		})?;
		changes.push(TreeChange::RewritePath { node_id: node.id.clone(), path });
	}
	Ok(changes)
}

/// Plans a copy of `subtree` under `onto` (or as a new root).
///
/// Every node gets a fresh id from `next_id`, the structure is kept. Only the
/// visibility tags are duplicated. No grant is copied: the copying actor
/// receives Admin on the new root and nothing else. Returns the change set and
/// the new root node.
pub fn plan_copy(
	subtree: &Subtree,
	onto: Option<&NodePath>,
	copier: &ActorId,
	now: Timestamp,
	mut next_id: impl FnMut() -> NodeId,
) -> ClResult<(ChangeSet, Node)> {
	let mut changes = ChangeSet::new(CascadeOp::Copy);
	let mut copies: HashMap<&NodeId, Node> = HashMap::with_capacity(subtree.nodes.len());

	for node in &subtree.nodes {
		let id = next_id();
		let path = if node.id == subtree.root.id {
			match onto {
				Some(onto) => onto.child(id.clone()),
				None => NodePath::root(id.clone()),
			}
		} else {
			let parent = node
				.parent_id()
				.and_then(|parent_id| copies.get(parent_id))
				.ok_or_else(|| {
					Error::ValidationError(format!("parent of '{}' not copied before it", node.id))
				})?;
			parent.path.child(id.clone())
		};
		let copy = Node { id, path, created_at: now };
		changes.push(TreeChange::InsertNode(copy.clone()));
		copies.insert(&node.id, copy);
	}

	for visibility in &subtree.visibilities {
		let Some(copy) = copies.get(&visibility.node_id) else {
			continue;
		};
		changes.push(TreeChange::PutVisibility(Visibility {
			node_id: copy.id.clone(),
			typ: visibility.typ,
			created_by: visibility.created_by.clone(),
			created_at: now,
		}));
	}

	let root = copies
		.remove(&subtree.root.id)
		.ok_or_else(|| Error::ValidationError("subtree root missing from its nodes".into()))?;
	changes.push(TreeChange::PutMembership(Membership {
		node_id: root.id.clone(),
		actor_id: copier.clone(),
		permission: Permission::Admin,
		granted_by: None,
		created_at: now,
		updated_at: now,
	}));

	Ok((changes, root))
}

/// Plans a delete of `subtree`: all rows first, then the nodes deepest first
pub fn plan_delete(subtree: &Subtree) -> ChangeSet {
	let mut changes = ChangeSet::new(CascadeOp::Delete);
	for node in &subtree.nodes {
		changes.push(TreeChange::DeleteMemberships(node.id.clone()));
		changes.push(TreeChange::DeleteVisibilities(node.id.clone()));
	}
	for node in subtree.nodes.iter().rev() {
		changes.push(TreeChange::DeleteNode(node.id.clone()));
	}
	changes
}

/// Runs cascades against an [`AclAdapter`].
///
/// Authorization and write scopes are the caller's business; the coordinator
/// only enforces the structural limits.
#[derive(Clone, Debug)]
pub struct CascadeCoordinator {
	adapter: Arc<dyn AclAdapter>,
	tree: PathTree,
	max_descendants: usize,
}

impl CascadeCoordinator {
	pub fn new(adapter: Arc<dyn AclAdapter>, tree: PathTree, max_descendants: usize) -> Self {
		Self { adapter, tree, max_descendants }
	}

	/// Inserts a new node under `parent` (or a new root). With `grant_admin`
	/// the creator receives Admin on it in the same transaction.
	pub async fn create(
		&self,
		tn_id: TnId,
		parent: Option<&Node>,
		creator: &Actor,
		grant_admin: bool,
	) -> ClResult<Node> {
		let now = Timestamp::now();
		let id = NodeId::random();
		let path = self.tree.child_path(parent, id.clone())?;
		let node = Node { id, path, created_at: now };

		let mut changes = ChangeSet::new(CascadeOp::Create);
		changes.push(TreeChange::InsertNode(node.clone()));
		if grant_admin {
			changes.push(TreeChange::PutMembership(Membership {
				node_id: node.id.clone(),
				actor_id: creator.id().clone(),
				permission: Permission::Admin,
				granted_by: None,
				created_at: now,
				updated_at: now,
			}));
		}
		self.apply(tn_id, &changes).await?;
		Ok(node)
	}

	/// Moves `node` with its whole subtree under `new_parent` (or to the top level)
	pub async fn move_subtree(
		&self,
		tn_id: TnId,
		node: &Node,
		new_parent: Option<&Node>,
	) -> ClResult<Node> {
		if let Some(parent) = new_parent
			&& parent.path.is_descendant_or_self_of(&node.path)
		{
			return Err(Error::CyclicMove);
		}
		if node.parent_id() == new_parent.map(|p| &p.id) {
			debug!(tn_id = %tn_id, node = %node.id, "Move onto the current parent, nothing to do");
			return Ok(node.clone());
		}

		self.stage(tn_id, node, CascadeOp::Move, CascadeStage::Detached);
		let subtree = self.read_subtree(tn_id, node).await?;
		let onto = new_parent.map(|p| &p.path);
		self.check_limits(&subtree, onto)?;

		self.stage(tn_id, node, CascadeOp::Move, CascadeStage::Relocating);
		let changes = plan_move(&subtree, onto)?;
		self.apply(tn_id, &changes).await?;
		self.stage(tn_id, node, CascadeOp::Move, CascadeStage::Attached);

		let path = node.path.rebase(&subtree.root.path, onto).ok_or_else(|| {
			Error::ValidationError(format!("node '{}' is outside the moved subtree", node.id))
		})?;
		Ok(Node { id: node.id.clone(), path, created_at: node.created_at })
	}

	/// Copies `node` with its whole subtree under `new_parent` (or as a new root).
	///
	/// The source subtree is read completely before anything is written, so
	/// copying a node into its own subtree terminates.
	pub async fn copy_subtree(
		&self,
		tn_id: TnId,
		node: &Node,
		new_parent: Option<&Node>,
		copier: &Actor,
	) -> ClResult<Node> {
		copier.ensure_can_grant()?;

		let subtree = self.read_subtree(tn_id, node).await?;
		let onto = new_parent.map(|p| &p.path);
		self.check_limits(&subtree, onto)?;

		self.stage(tn_id, node, CascadeOp::Copy, CascadeStage::Cloning);
		let (changes, root) =
			plan_copy(&subtree, onto, copier.id(), Timestamp::now(), NodeId::random)?;
		self.apply(tn_id, &changes).await?;
		self.stage(tn_id, &root, CascadeOp::Copy, CascadeStage::Attached);
		Ok(root)
	}

	/// Deletes `node` with all descendants and their rows. Returns the number
	/// of deleted nodes.
	pub async fn delete_subtree(&self, tn_id: TnId, node: &Node) -> ClResult<usize> {
		let subtree = self.read_subtree(tn_id, node).await?;
		if subtree.descendant_count() > self.max_descendants {
			return Err(Error::TooManyDescendants {
				count: subtree.descendant_count(),
				max: self.max_descendants,
			});
		}

		self.stage(tn_id, node, CascadeOp::Delete, CascadeStage::Deleting);
		let changes = plan_delete(&subtree);
		self.apply(tn_id, &changes).await?;
		self.stage(tn_id, node, CascadeOp::Delete, CascadeStage::Gone);
		Ok(subtree.nodes.len())
	}

	async fn read_subtree(&self, tn_id: TnId, node: &Node) -> ClResult<Subtree> {
		match self.adapter.read_subtree(tn_id, &node.id).await {
			Err(Error::NotFound) => Err(Error::NodeNotFound(node.id.clone())),
			res => res,
		}
	}

	/// Descendant count and resulting depth of a subtree re-attached under `onto`
	fn check_limits(&self, subtree: &Subtree, onto: Option<&NodePath>) -> ClResult<()> {
		let count = subtree.descendant_count();
		if count > self.max_descendants {
			return Err(Error::TooManyDescendants { count, max: self.max_descendants });
		}
		let relative = subtree.max_depth() + 1 - subtree.root.path.depth();
		self.tree.check_depth(onto.map_or(0, NodePath::depth) + relative)
	}

	async fn apply(&self, tn_id: TnId, changes: &ChangeSet) -> ClResult<()> {
		match self.adapter.apply_changes(tn_id, changes).await {
			Ok(()) => Ok(()),
			// The adapter knows best whether anything was committed
			Err(err @ Error::CascadeFailure { .. }) => {
				warn!(tn_id = %tn_id, op = %changes.op, changes = changes.len(), "Cascade failed: {}", err);
				Err(err)
			}
			Err(err) => {
				warn!(tn_id = %tn_id, op = %changes.op, changes = changes.len(), "Cascade rolled back: {}", err);
				Err(Error::CascadeFailure { op: changes.op, persisted: false })
			}
		}
	}

	fn stage(&self, tn_id: TnId, node: &Node, op: CascadeOp, stage: CascadeStage) {
		debug!(tn_id = %tn_id, node = %node.id, path = %node.path, op = %op, stage = ?stage, "Cascade stage");
	}
}


// vim: ts=4
