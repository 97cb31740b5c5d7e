//! SQLite ACL adapter storage tests
//!
//! Tests row storage, snapshot reads and atomic change sets directly against
//! the adapter, without the engine.

use canopy::account::{AccountLookup, ActorKind};
use canopy::acl_adapter::{
	AclAdapter, CascadeOp, ChangeSet, Membership, Node, TreeChange, Visibility, VisibilityType,
};
use canopy::prelude::*;
use canopy_acl_adapter_sqlite::AclAdapterSqlite;
use tempfile::TempDir;

const TN: TnId = TnId(1);

async fn create_test_adapter() -> (AclAdapterSqlite, TempDir) {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	let adapter = AclAdapterSqlite::new(temp_dir.path()).await.expect("Failed to create adapter");
	(adapter, temp_dir)
}

fn id(s: &str) -> NodeId {
	NodeId::new(s).expect("valid node id")
}

fn node(path: &str) -> Node {
	let path = NodePath::parse(path).expect("valid path");
	let id = path.ids().last().expect("non-empty path").clone();
	Node { id, path, created_at: Timestamp(100) }
}

fn grant(node: &str, actor: &str, permission: Permission) -> Membership {
	Membership {
		node_id: id(node),
		actor_id: ActorId::from(actor),
		permission,
		granted_by: Some(ActorId::from("root")),
		created_at: Timestamp(100),
		updated_at: Timestamp(100),
	}
}

fn tag(node: &str, typ: VisibilityType) -> Visibility {
	Visibility { node_id: id(node), typ, created_by: None, created_at: Timestamp(100) }
}

/// Inserts nodes (parents first) in one change set
async fn insert_tree(adapter: &AclAdapterSqlite, paths: &[&str]) {
	let mut changes = ChangeSet::new(CascadeOp::Create);
	for path in paths {
		changes.push(TreeChange::InsertNode(node(path)));
	}
	adapter.apply_changes(TN, &changes).await.expect("Should insert nodes");
}

#[tokio::test]
async fn test_read_node_and_not_found() {
	let (adapter, _temp) = create_test_adapter().await;
	insert_tree(&adapter, &["r", "r.c1"]).await;

	let c1 = adapter.read_node(TN, &id("c1")).await.expect("Should read node");
	assert_eq!(c1.path.to_string(), "r.c1");
	assert_eq!(c1.created_at, Timestamp(100));

	assert!(matches!(adapter.read_node(TN, &id("nope")).await, Err(Error::NotFound)));
	// tenants are isolated
	assert!(matches!(adapter.read_node(TnId(2), &id("c1")).await, Err(Error::NotFound)));
}

#[tokio::test]
async fn test_subtree_listing_is_segment_based_and_ordered() {
	let (adapter, _temp) = create_test_adapter().await;
	insert_tree(&adapter, &["r", "r.c1", "r.c10", "r.c1.g1", "r.c1.g1.x"]).await;

	let nodes = adapter
		.list_subtree_nodes(TN, &NodePath::parse("r.c1").expect("valid path"))
		.await
		.expect("Should list subtree");
	let paths: Vec<String> = nodes.iter().map(|n| n.path.to_string()).collect();
	assert_eq!(paths, vec!["r.c1", "r.c1.g1", "r.c1.g1.x"]);
}

#[tokio::test]
async fn test_subtree_listing_is_case_sensitive() {
	let (adapter, _temp) = create_test_adapter().await;
	insert_tree(&adapter, &["r", "r.ab", "r.AB", "r.ab.x", "r.AB.y"]).await;

	let nodes = adapter
		.list_subtree_nodes(TN, &NodePath::parse("r.ab").expect("valid path"))
		.await
		.expect("Should list subtree");
	let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
	assert_eq!(ids, vec!["ab", "x"]);
}

#[tokio::test]
async fn test_upsert_membership_is_idempotent() {
	let (adapter, _temp) = create_test_adapter().await;
	insert_tree(&adapter, &["r"]).await;

	adapter.upsert_membership(TN, &grant("r", "alice", Permission::Read)).await.expect("first");
	let mut update = grant("r", "alice", Permission::Write);
	update.created_at = Timestamp(200);
	update.updated_at = Timestamp(200);
	let stored = adapter.upsert_membership(TN, &update).await.expect("second");

	assert_eq!(stored.permission, Permission::Write);
	// created_at of the first grant is kept
	assert_eq!(stored.created_at, Timestamp(100));
	assert_eq!(stored.updated_at, Timestamp(200));

	let all = adapter.list_memberships(TN, &id("r")).await.expect("Should list");
	assert_eq!(all.len(), 1);

	assert!(adapter.delete_membership(TN, &id("r"), &ActorId::from("alice")).await.expect("delete"));
	assert!(!adapter.delete_membership(TN, &id("r"), &ActorId::from("alice")).await.expect("delete"));
	assert_eq!(adapter.read_membership(TN, &id("r"), &ActorId::from("alice")).await.expect("read"), None);
}

#[tokio::test]
async fn test_create_visibility_keeps_existing_tag() {
	let (adapter, _temp) = create_test_adapter().await;
	insert_tree(&adapter, &["r"]).await;

	let mut first = tag("r", VisibilityType::Public);
	first.created_by = Some(ActorId::from("alice"));
	adapter.create_visibility(TN, &first).await.expect("first");

	let mut second = tag("r", VisibilityType::Public);
	second.created_by = Some(ActorId::from("bob"));
	second.created_at = Timestamp(999);
	let stored = adapter.create_visibility(TN, &second).await.expect("second");
	assert_eq!(stored, first);

	let tags = adapter.list_visibilities(TN, &id("r")).await.expect("Should list");
	assert_eq!(tags.len(), 1);
	assert!(adapter.delete_visibility(TN, &id("r"), VisibilityType::Public).await.expect("delete"));
	assert!(!adapter.delete_visibility(TN, &id("r"), VisibilityType::Hidden).await.expect("delete"));
}

#[tokio::test]
async fn test_read_lineage() {
	let (adapter, _temp) = create_test_adapter().await;
	insert_tree(&adapter, &["r", "r.c1", "r.c1.g1", "r.c2"]).await;
	adapter.upsert_membership(TN, &grant("r", "alice", Permission::Admin)).await.expect("grant");
	adapter.upsert_membership(TN, &grant("g1", "alice", Permission::Read)).await.expect("grant");
	adapter.upsert_membership(TN, &grant("c2", "alice", Permission::Write)).await.expect("grant");
	adapter.upsert_membership(TN, &grant("c1", "bob", Permission::Write)).await.expect("grant");
	adapter.create_visibility(TN, &tag("r", VisibilityType::Public)).await.expect("tag");
	adapter.create_visibility(TN, &tag("c2", VisibilityType::Hidden)).await.expect("tag");

	let lineage = adapter
		.read_lineage(TN, &id("g1"), Some(&ActorId::from("alice")))
		.await
		.expect("Should read lineage");
	assert_eq!(lineage.node.path.to_string(), "r.c1.g1");
	let mut granted: Vec<&str> = lineage.grants.iter().map(|m| m.node_id.as_str()).collect();
	granted.sort_unstable();
	assert_eq!(granted, vec!["g1", "r"]);
	assert_eq!(lineage.visibilities, vec![tag("r", VisibilityType::Public)]);

	let anonymous = adapter.read_lineage(TN, &id("g1"), None).await.expect("Should read lineage");
	assert!(anonymous.grants.is_empty());
	assert_eq!(anonymous.visibilities.len(), 1);

	assert!(matches!(adapter.read_lineage(TN, &id("nope"), None).await, Err(Error::NotFound)));
}

#[tokio::test]
async fn test_read_subtree() {
	let (adapter, _temp) = create_test_adapter().await;
	insert_tree(&adapter, &["r", "r.c1", "r.c1.g1", "r.c2"]).await;
	adapter.upsert_membership(TN, &grant("r", "alice", Permission::Admin)).await.expect("grant");
	adapter.upsert_membership(TN, &grant("g1", "bob", Permission::Write)).await.expect("grant");
	adapter.create_visibility(TN, &tag("c1", VisibilityType::Hidden)).await.expect("tag");
	adapter.create_visibility(TN, &tag("c2", VisibilityType::Public)).await.expect("tag");

	let subtree = adapter.read_subtree(TN, &id("c1")).await.expect("Should read subtree");
	assert_eq!(subtree.root.id, id("c1"));
	assert_eq!(subtree.descendant_count(), 1);
	assert_eq!(subtree.memberships, vec![grant("g1", "bob", Permission::Write)]);
	assert_eq!(subtree.visibilities, vec![tag("c1", VisibilityType::Hidden)]);
}

#[tokio::test]
async fn test_rewrite_path_updates_parent() {
	let (adapter, _temp) = create_test_adapter().await;
	insert_tree(&adapter, &["r", "r.c1", "o"]).await;

	let mut changes = ChangeSet::new(CascadeOp::Move);
	changes.push(TreeChange::RewritePath {
		node_id: id("c1"),
		path: NodePath::parse("o.c1").expect("valid path"),
	});
	adapter.apply_changes(TN, &changes).await.expect("Should move");

	let moved = adapter.read_node(TN, &id("c1")).await.expect("Should read node");
	assert_eq!(moved.path.to_string(), "o.c1");
	assert_eq!(moved.parent_id(), Some(&id("o")));
	let under_o = adapter
		.list_subtree_nodes(TN, &NodePath::parse("o").expect("valid path"))
		.await
		.expect("Should list");
	assert_eq!(under_o.len(), 2);
}

#[tokio::test]
async fn test_failed_change_set_rolls_back() {
	let (adapter, _temp) = create_test_adapter().await;
	insert_tree(&adapter, &["r"]).await;

	let mut changes = ChangeSet::new(CascadeOp::Copy);
	changes.push(TreeChange::InsertNode(node("x")));
	changes.push(TreeChange::PutMembership(grant("x", "alice", Permission::Admin)));
	// duplicate primary key
	changes.push(TreeChange::InsertNode(node("r")));
	assert!(adapter.apply_changes(TN, &changes).await.is_err());

	assert!(matches!(adapter.read_node(TN, &id("x")).await, Err(Error::NotFound)));
	assert_eq!(adapter.read_membership(TN, &id("x"), &ActorId::from("alice")).await.expect("read"), None);

	let mut changes = ChangeSet::new(CascadeOp::Move);
	changes.push(TreeChange::RewritePath {
		node_id: id("missing"),
		path: NodePath::parse("r.missing").expect("valid path"),
	});
	assert!(matches!(adapter.apply_changes(TN, &changes).await, Err(Error::NotFound)));
}

#[tokio::test]
async fn test_accounts() {
	let (adapter, _temp) = create_test_adapter().await;
	let alice = ActorId::from("alice");
	adapter.create_account(TN, &alice, ActorKind::Guest).await.expect("create");
	assert_eq!(adapter.kind_of(TN, &alice).await.expect("kind"), ActorKind::Guest);

	adapter.create_account(TN, &alice, ActorKind::Member).await.expect("update");
	assert_eq!(adapter.kind_of(TN, &alice).await.expect("kind"), ActorKind::Member);

	assert!(matches!(adapter.kind_of(TN, &ActorId::from("nobody")).await, Err(Error::NotFound)));
	assert!(matches!(adapter.kind_of(TnId(2), &alice).await, Err(Error::NotFound)));
}

// vim: ts=4
