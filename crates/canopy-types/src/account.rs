//! Actor variants and the account lookup interface.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorKind {
	/// Full account, can hold Admin and author grants
	Member,
	/// Node-scoped login, capped at Read and never a grantor
	Guest,
}

impl ActorKind {
	pub fn code(self) -> &'static str {
		match self {
			ActorKind::Member => "M",
			ActorKind::Guest => "G",
		}
	}

	pub fn from_code(code: &str) -> ClResult<Self> {
		match code {
			"M" => Ok(ActorKind::Member),
			"G" => Ok(ActorKind::Guest),
			_ => Err(Error::Parse),
		}
	}

	/// Highest permission an actor of this kind may hold
	pub fn permission_ceiling(self) -> Permission {
		match self {
			ActorKind::Member => Permission::Admin,
			ActorKind::Guest => Permission::Read,
		}
	}
}

/// An actor resolved through [`AccountLookup`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Actor {
	Member(ActorId),
	Guest(ActorId),
}

impl Actor {
	pub fn new(id: ActorId, kind: ActorKind) -> Self {
		match kind {
			ActorKind::Member => Actor::Member(id),
			ActorKind::Guest => Actor::Guest(id),
		}
	}

	pub fn id(&self) -> &ActorId {
		match self {
			Actor::Member(id) | Actor::Guest(id) => id,
		}
	}

	pub fn kind(&self) -> ActorKind {
		match self {
			Actor::Member(_) => ActorKind::Member,
			Actor::Guest(_) => ActorKind::Guest,
		}
	}

	/// Highest permission this actor may ever be granted
	pub fn permission_ceiling(&self) -> Permission {
		self.kind().permission_ceiling()
	}

	/// Fails with `InvalidGrantor` unless the actor may author grants
	pub fn ensure_can_grant(&self) -> ClResult<()> {
		match self {
			Actor::Member(_) => Ok(()),
			Actor::Guest(id) => {
				Err(Error::InvalidGrantor(format!("guest '{}' cannot grant permissions", id)))
			}
		}
	}
}

/// Account lookup, implemented by the surrounding system
#[async_trait]
pub trait AccountLookup: Debug + Send + Sync {
	/// Returns the kind of an actor. Fails with `NotFound` for unknown actors.
	async fn kind_of(&self, tn_id: TnId, actor_id: &ActorId) -> ClResult<ActorKind>;

	/// Resolves an actor id into an [`Actor`]
	async fn resolve_actor(&self, tn_id: TnId, actor_id: &ActorId) -> ClResult<Actor> {
		let kind = self.kind_of(tn_id, actor_id).await?;
		Ok(Actor::new(actor_id.clone(), kind))
	}
}


// vim: ts=4
