//! Ancestor walk shared by grant resolution and visibility inheritance.

use canopy_types::acl_adapter::{Lineage, Membership, Visibility, VisibilityType};

use crate::prelude::*;

/// Walks `path` from the node itself towards the root and returns the first
/// row attached to one of the visited nodes, together with that node.
pub fn closest<'a, 'p, T, F>(
	path: &'p NodePath,
	rows: &'a [T],
	node_of: F,
) -> Option<(&'p NodeId, &'a T)>
where
	F: Fn(&T) -> &NodeId,
{
	path.closest_first()
		.find_map(|id| rows.iter().find(|row| node_of(row) == id).map(|row| (id, row)))
}

/// Closest grant of the lineage's actor
pub fn closest_grant(lineage: &Lineage) -> Option<&Membership> {
	closest(&lineage.node.path, &lineage.grants, |m| &m.node_id).map(|(_, m)| m)
}

/// Closest ancestor-or-self carrying a tag of type `typ`
pub fn tagged_ancestor(lineage: &Lineage, typ: VisibilityType) -> Option<&NodeId> {
	let tags: Vec<&Visibility> = lineage.visibilities.iter().filter(|v| v.typ == typ).collect();
	closest(&lineage.node.path, &tags, |v| &v.node_id).map(|(id, _)| id)
}

pub fn is_tagged(lineage: &Lineage, typ: VisibilityType) -> bool {
	tagged_ancestor(lineage, typ).is_some()
}

#[cfg(test)]
mod tests {
	use super::*;
	use canopy_types::acl_adapter::Node;

	fn id(s: &str) -> NodeId {
		NodeId::new(s).unwrap()
	}

	fn lineage(path: &str) -> Lineage {
		let path = NodePath::parse(path).unwrap();
		let node_id = path.ids().last().unwrap().clone();
		Lineage {
			node: Node { id: node_id, path, created_at: Timestamp(0) },
			grants: vec![],
			visibilities: vec![],
		}
	}

	fn grant(node: &str, permission: Permission) -> Membership {
		Membership {
			node_id: id(node),
			actor_id: ActorId::from("a"),
			permission,
			granted_by: None,
			created_at: Timestamp(0),
			updated_at: Timestamp(0),
		}
	}

	fn tag(node: &str, typ: VisibilityType) -> Visibility {
		Visibility { node_id: id(node), typ, created_by: None, created_at: Timestamp(0) }
	}

	#[test]
	fn test_closest_grant_prefers_nearest() {
		let mut l = lineage("r.c1.g1");
		l.grants = vec![grant("r", Permission::Admin), grant("c1", Permission::Read)];
		assert_eq!(closest_grant(&l).map(|m| m.permission), Some(Permission::Read));

		l.grants = vec![grant("r", Permission::Admin)];
		assert_eq!(closest_grant(&l).map(|m| m.node_id.as_str()), Some("r"));
	}

	#[test]
	fn test_rows_outside_path_are_ignored() {
		let mut l = lineage("r.c1");
		l.grants = vec![grant("c2", Permission::Admin)];
		assert!(closest_grant(&l).is_none());
	}

	#[test]
	fn test_tags_filter_by_type() {
		let mut l = lineage("r.c1.g1");
		l.visibilities = vec![tag("r", VisibilityType::Public), tag("g1", VisibilityType::Hidden)];
		assert_eq!(tagged_ancestor(&l, VisibilityType::Public).map(NodeId::as_str), Some("r"));
		assert_eq!(tagged_ancestor(&l, VisibilityType::Hidden).map(NodeId::as_str), Some("g1"));

		l.visibilities = vec![tag("r", VisibilityType::Public)];
		assert!(!is_tagged(&l, VisibilityType::Hidden));
	}
}

// vim: ts=4
