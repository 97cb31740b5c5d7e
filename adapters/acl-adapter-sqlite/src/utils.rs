//! Shared utilities for the SQLite adapter
//!
//! Error mapping and row decoding used by all table modules.

use canopy::acl_adapter::{Membership, Node, Visibility, VisibilityType};
use canopy::prelude::*;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

/// Build an IN clause with parameterized values
pub(crate) fn push_in<'a>(
	mut query: sqlx::QueryBuilder<'a, sqlx::Sqlite>,
	values: &'a [impl AsRef<str>],
) -> sqlx::QueryBuilder<'a, sqlx::Sqlite> {
	query.push("(");
	for (i, value) in values.iter().enumerate() {
		if i > 0 {
			query.push(", ");
		}
		query.push_bind(value.as_ref());
	}
	query.push(")");
	query
}

/// Log database error for debugging
pub(crate) fn inspect(err: &sqlx::Error) {
	warn!("DB: {:#?}", err);
}

/// Map a single-row query result, translating SQL errors to ClResult
pub(crate) fn map_res<T, F>(row: Result<SqliteRow, sqlx::Error>, f: F) -> ClResult<T>
where
	F: FnOnce(SqliteRow) -> Result<T, sqlx::Error>,
{
	match row {
		Ok(row) => f(row).inspect_err(inspect).map_err(|_| Error::DbError),
		Err(sqlx::Error::RowNotFound) => Err(Error::NotFound),
		Err(err) => {
			inspect(&err);
			Err(Error::DbError)
		}
	}
}

/// Collect an iterator of query results, translating errors
pub(crate) fn collect_res<T>(
	iter: impl Iterator<Item = Result<T, sqlx::Error>>,
) -> ClResult<Vec<T>> {
	let mut items = Vec::new();
	for item in iter {
		items.push(item.inspect_err(inspect).map_err(|_| Error::DbError)?);
	}
	Ok(items)
}

/// Translate a driver error into `DbError`
pub(crate) fn db_err(err: sqlx::Error) -> Error {
	inspect(&err);
	Error::DbError
}

fn decode_err(err: Error) -> sqlx::Error {
	sqlx::Error::Decode(Box::new(err))
}

pub(crate) fn node_from_row(row: &SqliteRow) -> Result<Node, sqlx::Error> {
	let id: String = row.try_get("node_id")?;
	let path: &str = row.try_get("path")?;
	Ok(Node {
		id: NodeId::new(id).map_err(decode_err)?,
		path: NodePath::parse(path).map_err(decode_err)?,
		created_at: Timestamp(row.try_get("created_at")?),
	})
}

pub(crate) fn membership_from_row(row: &SqliteRow) -> Result<Membership, sqlx::Error> {
	let node_id: String = row.try_get("node_id")?;
	let perm: &str = row.try_get("perm")?;
	Ok(Membership {
		node_id: NodeId::new(node_id).map_err(decode_err)?,
		actor_id: ActorId::from(row.try_get::<&str, _>("actor_id")?),
		permission: Permission::from_code(perm).map_err(decode_err)?,
		granted_by: row.try_get::<Option<&str>, _>("granted_by")?.map(ActorId::from),
		created_at: Timestamp(row.try_get("created_at")?),
		updated_at: Timestamp(row.try_get("updated_at")?),
	})
}

pub(crate) fn visibility_from_row(row: &SqliteRow) -> Result<Visibility, sqlx::Error> {
	let node_id: String = row.try_get("node_id")?;
	let typ: &str = row.try_get("type")?;
	Ok(Visibility {
		node_id: NodeId::new(node_id).map_err(decode_err)?,
		typ: VisibilityType::from_code(typ).map_err(decode_err)?,
		created_by: row.try_get::<Option<&str>, _>("created_by")?.map(ActorId::from),
		created_at: Timestamp(row.try_get("created_at")?),
	})
}

// vim: ts=4
