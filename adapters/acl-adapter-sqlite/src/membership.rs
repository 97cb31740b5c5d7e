//! Membership grants

use sqlx::{SqliteExecutor, SqlitePool};

use canopy::acl_adapter::Membership;
use canopy::prelude::*;

use crate::utils::{collect_res, db_err, map_res, membership_from_row};

pub(crate) async fn read(
	db: &SqlitePool,
	tn_id: TnId,
	node_id: &NodeId,
	actor_id: &ActorId,
) -> ClResult<Option<Membership>> {
	let row = sqlx::query(
		"SELECT node_id, actor_id, perm, granted_by, created_at, updated_at
		FROM memberships WHERE tn_id = ? AND node_id = ? AND actor_id = ?",
	)
	.bind(tn_id.0)
	.bind(node_id.as_str())
	.bind(actor_id.as_str())
	.fetch_optional(db)
	.await
	.map_err(db_err)?;

	row.as_ref().map(membership_from_row).transpose().map_err(db_err)
}

/// Inserts or updates a grant. `created_at` of an existing row is kept.
pub(crate) async fn upsert<'c>(
	db: impl SqliteExecutor<'c>,
	tn_id: TnId,
	membership: &Membership,
) -> ClResult<Membership> {
	let res = sqlx::query(
		"INSERT INTO memberships (tn_id, node_id, actor_id, perm, granted_by, created_at, updated_at)
		VALUES (?, ?, ?, ?, ?, ?, ?)
		ON CONFLICT(tn_id, node_id, actor_id) DO UPDATE SET
			perm = excluded.perm,
			granted_by = excluded.granted_by,
			updated_at = excluded.updated_at
		RETURNING node_id, actor_id, perm, granted_by, created_at, updated_at",
	)
	.bind(tn_id.0)
	.bind(membership.node_id.as_str())
	.bind(membership.actor_id.as_str())
	.bind(membership.permission.code())
	.bind(membership.granted_by.as_ref().map(ActorId::as_str))
	.bind(membership.created_at.0)
	.bind(membership.updated_at.0)
	.fetch_one(db)
	.await;

	map_res(res, |row| membership_from_row(&row))
}

pub(crate) async fn delete(
	db: &SqlitePool,
	tn_id: TnId,
	node_id: &NodeId,
	actor_id: &ActorId,
) -> ClResult<bool> {
	let res = sqlx::query("DELETE FROM memberships WHERE tn_id = ? AND node_id = ? AND actor_id = ?")
		.bind(tn_id.0)
		.bind(node_id.as_str())
		.bind(actor_id.as_str())
		.execute(db)
		.await
		.map_err(db_err)?;

	Ok(res.rows_affected() > 0)
}

pub(crate) async fn list(db: &SqlitePool, tn_id: TnId, node_id: &NodeId) -> ClResult<Vec<Membership>> {
	let rows = sqlx::query(
		"SELECT node_id, actor_id, perm, granted_by, created_at, updated_at
		FROM memberships WHERE tn_id = ? AND node_id = ? ORDER BY actor_id",
	)
	.bind(tn_id.0)
	.bind(node_id.as_str())
	.fetch_all(db)
	.await
	.map_err(db_err)?;

	collect_res(rows.iter().map(membership_from_row))
}

// vim: ts=4
