//! Visibility tags

use sqlx::{SqliteExecutor, SqlitePool};

use canopy::acl_adapter::{Visibility, VisibilityType};
use canopy::prelude::*;

use crate::utils::{collect_res, db_err, map_res, visibility_from_row};

pub(crate) async fn list(db: &SqlitePool, tn_id: TnId, node_id: &NodeId) -> ClResult<Vec<Visibility>> {
	let rows = sqlx::query(
		"SELECT node_id, type, created_by, created_at
		FROM visibilities WHERE tn_id = ? AND node_id = ? ORDER BY type",
	)
	.bind(tn_id.0)
	.bind(node_id.as_str())
	.fetch_all(db)
	.await
	.map_err(db_err)?;

	collect_res(rows.iter().map(visibility_from_row))
}

/// Inserts a tag, or returns the already stored one untouched
pub(crate) async fn create<'c>(
	db: impl SqliteExecutor<'c>,
	tn_id: TnId,
	visibility: &Visibility,
) -> ClResult<Visibility> {
	// The no-op update makes RETURNING yield the existing row on conflict
	let res = sqlx::query(
		"INSERT INTO visibilities (tn_id, node_id, type, created_by, created_at)
		VALUES (?, ?, ?, ?, ?)
		ON CONFLICT(tn_id, node_id, type) DO UPDATE SET created_at = created_at
		RETURNING node_id, type, created_by, created_at",
	)
	.bind(tn_id.0)
	.bind(visibility.node_id.as_str())
	.bind(visibility.typ.code())
	.bind(visibility.created_by.as_ref().map(ActorId::as_str))
	.bind(visibility.created_at.0)
	.fetch_one(db)
	.await;

	map_res(res, |row| visibility_from_row(&row))
}

pub(crate) async fn delete(
	db: &SqlitePool,
	tn_id: TnId,
	node_id: &NodeId,
	typ: VisibilityType,
) -> ClResult<bool> {
	let res = sqlx::query("DELETE FROM visibilities WHERE tn_id = ? AND node_id = ? AND type = ?")
		.bind(tn_id.0)
		.bind(node_id.as_str())
		.bind(typ.code())
		.execute(db)
		.await
		.map_err(db_err)?;

	Ok(res.rows_affected() > 0)
}

// vim: ts=4
