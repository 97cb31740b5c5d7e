//! SQLite-backed ACL adapter for Canopy.
//!
//! Stores nodes with their materialized paths, membership grants, visibility
//! tags and the account kinds used by the engine's Guest rules. Snapshot reads
//! and change sets each run inside a single transaction.

#![forbid(unsafe_code)]

use async_trait::async_trait;
use sqlx::sqlite::{self, SqlitePool};
use std::path::Path;

use canopy::account::{AccountLookup, ActorKind};
use canopy::acl_adapter::{
	AclAdapter, ChangeSet, Lineage, Membership, Node, Subtree, Visibility, VisibilityType,
};
use canopy::prelude::*;

mod account;
mod change;
mod membership;
mod node;
mod schema;
mod snapshot;
mod utils;
mod visibility;

use schema::init_db;

#[derive(Debug)]
pub struct AclAdapterSqlite {
	db: SqlitePool,
}

impl AclAdapterSqlite {
	/// Opens (or creates) `acl.db` inside `dir`
	pub async fn new(dir: impl AsRef<Path>) -> ClResult<Self> {
		tokio::fs::create_dir_all(dir.as_ref()).await?;
		let opts = sqlite::SqliteConnectOptions::new()
			.filename(dir.as_ref().join("acl.db"))
			.create_if_missing(true)
			.journal_mode(sqlite::SqliteJournalMode::Wal);
		let db = sqlite::SqlitePoolOptions::new()
			.max_connections(5)
			.connect_with(opts)
			.await
			.inspect_err(|err| warn!("DbError: {:#?}", err))
			.or(Err(Error::DbError))?;

		init_db(&db)
			.await
			.inspect_err(|err| warn!("DbError: {:#?}", err))
			.or(Err(Error::DbError))?;

		Ok(Self { db })
	}

	/// Registers an actor with its kind. Re-registering updates the kind.
	pub async fn create_account(&self, tn_id: TnId, actor_id: &ActorId, kind: ActorKind) -> ClResult<()> {
		account::create(&self.db, tn_id, actor_id, kind).await
	}
}

#[async_trait]
impl AclAdapter for AclAdapterSqlite {
	// Nodes
	//*******
	async fn read_node(&self, tn_id: TnId, node_id: &NodeId) -> ClResult<Node> {
		node::read(&self.db, tn_id, node_id).await
	}

	async fn list_subtree_nodes(&self, tn_id: TnId, path: &NodePath) -> ClResult<Vec<Node>> {
		node::list_subtree(&self.db, tn_id, path).await
	}

	// Memberships
	//*************
	async fn read_membership(
		&self,
		tn_id: TnId,
		node_id: &NodeId,
		actor_id: &ActorId,
	) -> ClResult<Option<Membership>> {
		membership::read(&self.db, tn_id, node_id, actor_id).await
	}

	async fn upsert_membership(&self, tn_id: TnId, membership: &Membership) -> ClResult<Membership> {
		membership::upsert(&self.db, tn_id, membership).await
	}

	async fn delete_membership(
		&self,
		tn_id: TnId,
		node_id: &NodeId,
		actor_id: &ActorId,
	) -> ClResult<bool> {
		membership::delete(&self.db, tn_id, node_id, actor_id).await
	}

	async fn list_memberships(&self, tn_id: TnId, node_id: &NodeId) -> ClResult<Vec<Membership>> {
		membership::list(&self.db, tn_id, node_id).await
	}

	// Visibilities
	//**************
	async fn list_visibilities(&self, tn_id: TnId, node_id: &NodeId) -> ClResult<Vec<Visibility>> {
		visibility::list(&self.db, tn_id, node_id).await
	}

	async fn create_visibility(&self, tn_id: TnId, visibility: &Visibility) -> ClResult<Visibility> {
		visibility::create(&self.db, tn_id, visibility).await
	}

	async fn delete_visibility(
		&self,
		tn_id: TnId,
		node_id: &NodeId,
		typ: VisibilityType,
	) -> ClResult<bool> {
		visibility::delete(&self.db, tn_id, node_id, typ).await
	}

	// Snapshots
	//***********
	async fn read_lineage(
		&self,
		tn_id: TnId,
		node_id: &NodeId,
		actor_id: Option<&ActorId>,
	) -> ClResult<Lineage> {
		snapshot::read_lineage(&self.db, tn_id, node_id, actor_id).await
	}

	async fn read_subtree(&self, tn_id: TnId, node_id: &NodeId) -> ClResult<Subtree> {
		snapshot::read_subtree(&self.db, tn_id, node_id).await
	}

	async fn apply_changes(&self, tn_id: TnId, changes: &ChangeSet) -> ClResult<()> {
		change::apply(&self.db, tn_id, changes).await
	}
}

#[async_trait]
impl AccountLookup for AclAdapterSqlite {
	async fn kind_of(&self, tn_id: TnId, actor_id: &ActorId) -> ClResult<ActorKind> {
		account::kind_of(&self.db, tn_id, actor_id).await
	}
}

// vim: ts=4
