//! Node rows
//!
//! Nodes are only ever inserted, re-pathed or deleted through change sets
//! (see `change.rs`); this module holds the read side.

use sqlx::SqliteExecutor;

use canopy::acl_adapter::Node;
use canopy::prelude::*;

use crate::utils::{collect_res, db_err, map_res, node_from_row};

pub(crate) async fn read<'c>(db: impl SqliteExecutor<'c>, tn_id: TnId, node_id: &NodeId) -> ClResult<Node> {
	let res = sqlx::query("SELECT node_id, path, created_at FROM nodes WHERE tn_id = ? AND node_id = ?")
		.bind(tn_id.0)
		.bind(node_id.as_str())
		.fetch_one(db)
		.await;

	map_res(res, |row| node_from_row(&row))
}

/// The node at `path` and all its descendants, parents before children
pub(crate) async fn list_subtree<'c>(
	db: impl SqliteExecutor<'c>,
	tn_id: TnId,
	path: &NodePath,
) -> ClResult<Vec<Node>> {
	let rows = sqlx::query(
		"SELECT node_id, path, created_at FROM nodes
		WHERE tn_id = ? AND (path = ? OR path GLOB ?)
		ORDER BY depth, path",
	)
	.bind(tn_id.0)
	.bind(path.to_string())
	.bind(path.descendant_glob())
	.fetch_all(db)
	.await
	.map_err(db_err)?;

	collect_res(rows.iter().map(node_from_row))
}

// vim: ts=4
