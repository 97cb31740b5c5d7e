//! Consistent multi-table reads
//!
//! Each read runs inside one transaction. In WAL mode the transaction sees a
//! single snapshot, so a concurrent move or revoke is observed either entirely
//! or not at all.

use sqlx::SqlitePool;

use canopy::acl_adapter::{Lineage, Subtree};
use canopy::prelude::*;

use crate::node;
use crate::utils::{collect_res, db_err, membership_from_row, push_in, visibility_from_row};

pub(crate) async fn read_lineage(
	db: &SqlitePool,
	tn_id: TnId,
	node_id: &NodeId,
	actor_id: Option<&ActorId>,
) -> ClResult<Lineage> {
	let mut tx = db.begin().await.map_err(db_err)?;
	let node = node::read(&mut *tx, tn_id, node_id).await?;

	let grants = match actor_id {
		Some(actor_id) => {
			let mut query = sqlx::QueryBuilder::new(
				"SELECT node_id, actor_id, perm, granted_by, created_at, updated_at
				FROM memberships WHERE tn_id = ",
			);
			query.push_bind(tn_id.0).push(" AND actor_id = ").push_bind(actor_id.as_str());
			query.push(" AND node_id IN ");
			let mut query = push_in(query, node.path.ids());
			let rows = query.build().fetch_all(&mut *tx).await.map_err(db_err)?;
			collect_res(rows.iter().map(membership_from_row))?
		}
		None => Vec::new(),
	};

	let mut query = sqlx::QueryBuilder::new(
		"SELECT node_id, type, created_by, created_at FROM visibilities WHERE tn_id = ",
	);
	query.push_bind(tn_id.0).push(" AND node_id IN ");
	let mut query = push_in(query, node.path.ids());
	let rows = query.build().fetch_all(&mut *tx).await.map_err(db_err)?;
	let visibilities = collect_res(rows.iter().map(visibility_from_row))?;

	tx.commit().await.map_err(db_err)?;
	Ok(Lineage { node, grants, visibilities })
}

pub(crate) async fn read_subtree(db: &SqlitePool, tn_id: TnId, node_id: &NodeId) -> ClResult<Subtree> {
	let mut tx = db.begin().await.map_err(db_err)?;
	let root = node::read(&mut *tx, tn_id, node_id).await?;
	let nodes = node::list_subtree(&mut *tx, tn_id, &root.path).await?;
	let (path, glob) = (root.path.to_string(), root.path.descendant_glob());

	let rows = sqlx::query(
		"SELECT m.node_id AS node_id, m.actor_id AS actor_id, m.perm AS perm,
			m.granted_by AS granted_by, m.created_at AS created_at, m.updated_at AS updated_at
		FROM memberships m
		JOIN nodes n ON n.tn_id = m.tn_id AND n.node_id = m.node_id
		WHERE m.tn_id = ? AND (n.path = ? OR n.path GLOB ?)
		ORDER BY n.depth, n.path, m.actor_id",
	)
	.bind(tn_id.0)
	.bind(path.as_str())
	.bind(glob.as_str())
	.fetch_all(&mut *tx)
	.await
	.map_err(db_err)?;
	let memberships = collect_res(rows.iter().map(membership_from_row))?;

	let rows = sqlx::query(
		"SELECT v.node_id AS node_id, v.type AS type, v.created_by AS created_by,
			v.created_at AS created_at
		FROM visibilities v
		JOIN nodes n ON n.tn_id = v.tn_id AND n.node_id = v.node_id
		WHERE v.tn_id = ? AND (n.path = ? OR n.path GLOB ?)
		ORDER BY n.depth, n.path, v.type",
	)
	.bind(tn_id.0)
	.bind(path.as_str())
	.bind(glob.as_str())
	.fetch_all(&mut *tx)
	.await
	.map_err(db_err)?;
	let visibilities = collect_res(rows.iter().map(visibility_from_row))?;

	tx.commit().await.map_err(db_err)?;
	Ok(Subtree { root, nodes, memberships, visibilities })
}

// vim: ts=4
