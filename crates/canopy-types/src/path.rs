//! Materialized node paths
//!
//! A path is the ordered list of ancestor ids of a node, root first and the
//! node itself last. Paths are never empty. Their string form joins the ids
//! with `.`, which is what storage adapters index for prefix queries.

use serde::{Deserialize, Serialize};

use crate::prelude::*;

pub const PATH_SEPARATOR: char = '.';

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodePath(Vec<NodeId>);

impl NodePath {
	/// Path of a root node
	pub fn root(id: NodeId) -> Self {
		Self(vec![id])
	}

	pub fn parse(s: &str) -> ClResult<Self> {
		let ids = s.split(PATH_SEPARATOR).map(NodeId::new).collect::<ClResult<Vec<_>>>()?;
		if ids.is_empty() {
			return Err(Error::Parse);
		}
		Ok(Self(ids))
	}

	/// Path of a new child `id` under this path
	pub fn child(&self, id: NodeId) -> Self {
		let mut ids = Vec::with_capacity(self.0.len() + 1);
		ids.extend_from_slice(&self.0);
		ids.push(id);
		Self(ids)
	}

	pub fn ids(&self) -> &[NodeId] {
		&self.0
	}

	pub fn depth(&self) -> usize {
		self.0.len()
	}

	pub fn root_id(&self) -> Option<&NodeId> {
		self.0.first()
	}

	/// Second-to-last element, `None` for roots
	pub fn parent_id(&self) -> Option<&NodeId> {
		self.0.len().checked_sub(2).and_then(|idx| self.0.get(idx))
	}

	/// Iterates ids from the node itself up to the root
	pub fn closest_first(&self) -> impl Iterator<Item = &NodeId> {
		self.0.iter().rev()
	}

	/// Prefix test: is this path `of` itself or somewhere below it?
	pub fn is_descendant_or_self_of(&self, of: &NodePath) -> bool {
		self.0.starts_with(&of.0)
	}

	/// Rewrites this path for a move of the subtree rooted at `from`.
	///
	/// The moved subtree root keeps its id and is re-attached under `onto`
	/// (or becomes a root when `onto` is `None`). Returns `None` if this path
	/// is not inside `from`.
	pub fn rebase(&self, from: &NodePath, onto: Option<&NodePath>) -> Option<NodePath> {
		if !self.is_descendant_or_self_of(from) {
			return None;
		}
		let suffix = self.0.get(from.0.len() - 1..)?;
		let mut ids = Vec::with_capacity(onto.map_or(0, NodePath::depth) + suffix.len());
		if let Some(onto) = onto {
			ids.extend_from_slice(&onto.0);
		}
		ids.extend_from_slice(suffix);
		Some(Self(ids))
	}

	/// `GLOB` pattern matching every strict descendant of this path.
	///
	/// Ids never contain glob metacharacters, and unlike `LIKE` the match is
	/// case sensitive.
	pub fn descendant_glob(&self) -> String {
		format!("{}{}*", self, PATH_SEPARATOR)
	}
}

impl std::fmt::Display for NodePath {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		for (i, id) in self.0.iter().enumerate() {
			if i > 0 {
				write!(f, "{}", PATH_SEPARATOR)?;
			}
			f.write_str(id.as_str())?;
		}
		Ok(())
	}
}

impl TryFrom<String> for NodePath {
	type Error = Error;

	fn try_from(value: String) -> ClResult<Self> {
		Self::parse(&value)
	}
}

impl From<NodePath> for String {
	fn from(value: NodePath) -> Self {
		value.to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn path(s: &str) -> NodePath {
		NodePath::parse(s).unwrap()
	}

	fn id(s: &str) -> NodeId {
		NodeId::new(s).unwrap()
	}

	#[test]
	fn test_parse_and_display() {
		let p = path("r.c1.g1");
		assert_eq!(p.depth(), 3);
		assert_eq!(p.to_string(), "r.c1.g1");
		assert!(NodePath::parse("").is_err());
		assert!(NodePath::parse("r..c").is_err());
	}

	#[test]
	fn test_child_and_parent() {
		let root = NodePath::root(id("r"));
		assert_eq!(root.parent_id(), None);
		let child = root.child(id("c1"));
		assert_eq!(child, path("r.c1"));
		assert_eq!(child.parent_id(), Some(&id("r")));
		assert_eq!(child.root_id(), Some(&id("r")));
	}

	#[test]
	fn test_closest_first() {
		let p = path("r.c1.g1");
		let ids: Vec<&str> = p.closest_first().map(NodeId::as_str).collect();
		assert_eq!(ids, vec!["g1", "c1", "r"]);
	}

	#[test]
	fn test_descendant_prefix_is_segment_based() {
		assert!(path("r.c1.g1").is_descendant_or_self_of(&path("r.c1")));
		assert!(path("r.c1").is_descendant_or_self_of(&path("r.c1")));
		assert!(!path("r.c1").is_descendant_or_self_of(&path("r.c1.g1")));
		// "c10" shares a string prefix with "c1" but is a sibling
		assert!(!path("r.c10").is_descendant_or_self_of(&path("r.c1")));
	}

	#[test]
	fn test_rebase() {
		let from = path("r.c1");
		assert_eq!(path("r.c1.g1").rebase(&from, Some(&path("x"))), Some(path("x.c1.g1")));
		assert_eq!(path("r.c1").rebase(&from, Some(&path("x.y"))), Some(path("x.y.c1")));
		assert_eq!(path("r.c1.g1").rebase(&from, None), Some(path("c1.g1")));
		assert_eq!(path("r.c2").rebase(&from, None), None);
	}

	#[test]
	fn test_descendant_glob() {
		assert_eq!(path("r.c1").descendant_glob(), "r.c1.*");
	}
}

// vim: ts=4
