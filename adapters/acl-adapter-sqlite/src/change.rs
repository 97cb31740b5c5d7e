//! Atomic change sets
//!
//! All changes of a set run in one transaction. The first failing change
//! aborts the set; dropping the transaction rolls every earlier change back.

use sqlx::{SqliteConnection, SqlitePool};

use canopy::acl_adapter::{ChangeSet, Node, TreeChange};
use canopy::prelude::*;

use crate::utils::db_err;
use crate::{membership, visibility};

pub(crate) async fn apply(db: &SqlitePool, tn_id: TnId, changes: &ChangeSet) -> ClResult<()> {
	let mut tx = db.begin().await.map_err(db_err)?;
	for change in &changes.changes {
		apply_one(&mut *tx, tn_id, change).await.inspect_err(|err| {
			warn!(tn_id = %tn_id, op = %changes.op, "Rolling back change set at {:?}: {}", change, err);
		})?;
	}
	tx.commit().await.map_err(db_err)?;
	debug!(tn_id = %tn_id, op = %changes.op, changes = changes.len(), "Change set committed");
	Ok(())
}

fn depth_of(path: &NodePath) -> u32 {
	u32::try_from(path.depth()).unwrap_or(u32::MAX)
}

async fn insert_node(conn: &mut SqliteConnection, tn_id: TnId, node: &Node) -> ClResult<()> {
	sqlx::query(
		"INSERT INTO nodes (tn_id, node_id, path, parent_id, depth, created_at)
		VALUES (?, ?, ?, ?, ?, ?)",
	)
	.bind(tn_id.0)
	.bind(node.id.as_str())
	.bind(node.path.to_string())
	.bind(node.parent_id().map(NodeId::as_str))
	.bind(depth_of(&node.path))
	.bind(node.created_at.0)
	.execute(conn)
	.await
	.map_err(db_err)?;
	Ok(())
}

async fn apply_one(conn: &mut SqliteConnection, tn_id: TnId, change: &TreeChange) -> ClResult<()> {
	match change {
		TreeChange::InsertNode(node) => insert_node(conn, tn_id, node).await?,
		TreeChange::RewritePath { node_id, path } => {
			let res = sqlx::query(
				"UPDATE nodes SET path = ?, parent_id = ?, depth = ? WHERE tn_id = ? AND node_id = ?",
			)
			.bind(path.to_string())
			.bind(path.parent_id().map(NodeId::as_str))
			.bind(depth_of(path))
			.bind(tn_id.0)
			.bind(node_id.as_str())
			.execute(conn)
			.await
			.map_err(db_err)?;
			if res.rows_affected() == 0 {
				return Err(Error::NotFound);
			}
		}
		TreeChange::DeleteNode(node_id) => {
			sqlx::query("DELETE FROM nodes WHERE tn_id = ? AND node_id = ?")
				.bind(tn_id.0)
				.bind(node_id.as_str())
				.execute(conn)
				.await
				.map_err(db_err)?;
		}
		TreeChange::PutMembership(membership) => {
			membership::upsert(conn, tn_id, membership).await?;
		}
		TreeChange::DeleteMemberships(node_id) => {
			sqlx::query("DELETE FROM memberships WHERE tn_id = ? AND node_id = ?")
				.bind(tn_id.0)
				.bind(node_id.as_str())
				.execute(conn)
				.await
				.map_err(db_err)?;
		}
		TreeChange::PutVisibility(visibility) => {
			visibility::create(conn, tn_id, visibility).await?;
		}
		TreeChange::DeleteVisibilities(node_id) => {
			sqlx::query("DELETE FROM visibilities WHERE tn_id = ? AND node_id = ?")
				.bind(tn_id.0)
				.bind(node_id.as_str())
				.execute(conn)
				.await
				.map_err(db_err)?;
		}
	}
	Ok(())
}

// vim: ts=4
