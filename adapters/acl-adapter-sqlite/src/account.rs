//! Actor kinds (Member / Guest)

use sqlx::{Row, SqlitePool};

use canopy::account::ActorKind;
use canopy::prelude::*;

use crate::utils::{db_err, map_res};

pub(crate) async fn create(
	db: &SqlitePool,
	tn_id: TnId,
	actor_id: &ActorId,
	kind: ActorKind,
) -> ClResult<()> {
	sqlx::query(
		"INSERT INTO accounts (tn_id, actor_id, kind) VALUES (?, ?, ?)
		ON CONFLICT(tn_id, actor_id) DO UPDATE SET kind = excluded.kind",
	)
	.bind(tn_id.0)
	.bind(actor_id.as_str())
	.bind(kind.code())
	.execute(db)
	.await
	.map_err(db_err)?;

	Ok(())
}

pub(crate) async fn kind_of(db: &SqlitePool, tn_id: TnId, actor_id: &ActorId) -> ClResult<ActorKind> {
	let res = sqlx::query("SELECT kind FROM accounts WHERE tn_id = ? AND actor_id = ?")
		.bind(tn_id.0)
		.bind(actor_id.as_str())
		.fetch_one(db)
		.await;

	let kind: String = map_res(res, |row| row.try_get("kind"))?;
	ActorKind::from_code(&kind)
}

// vim: ts=4
