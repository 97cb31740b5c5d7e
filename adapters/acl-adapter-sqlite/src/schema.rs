//! Database schema initialization

use sqlx::SqlitePool;

/// Initialize the database schema with all required tables and indexes
pub(crate) async fn init_db(db: &SqlitePool) -> Result<(), sqlx::Error> {
	let mut tx = db.begin().await?;

	// Nodes
	//*******
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS nodes (
		tn_id integer NOT NULL,
		node_id text NOT NULL,
		path text NOT NULL,
		parent_id text,
		depth integer NOT NULL,
		created_at integer NOT NULL,
		PRIMARY KEY(tn_id, node_id)
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_nodes_path ON nodes(tn_id, path)")
		.execute(&mut *tx)
		.await?;

	// Memberships
	//*************
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS memberships (
		tn_id integer NOT NULL,
		node_id text NOT NULL,
		actor_id text NOT NULL,
		perm char(1) NOT NULL,
		granted_by text,
		created_at integer NOT NULL,
		updated_at integer NOT NULL,
		PRIMARY KEY(tn_id, node_id, actor_id)
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query(
		"CREATE INDEX IF NOT EXISTS idx_memberships_actor ON memberships(tn_id, actor_id)",
	)
	.execute(&mut *tx)
	.await?;

	// Visibilities
	//**************
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS visibilities (
		tn_id integer NOT NULL,
		node_id text NOT NULL,
		type char(1) NOT NULL,
		created_by text,
		created_at integer NOT NULL,
		PRIMARY KEY(tn_id, node_id, type)
	)",
	)
	.execute(&mut *tx)
	.await?;

	// Accounts
	//**********
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS accounts (
		tn_id integer NOT NULL,
		actor_id text NOT NULL,
		kind char(1) NOT NULL,
		created_at datetime DEFAULT (unixepoch()),
		PRIMARY KEY(tn_id, actor_id)
	)",
	)
	.execute(&mut *tx)
	.await?;

	tx.commit().await?;
	Ok(())
}

// vim: ts=4
