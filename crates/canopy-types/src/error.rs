//! Error handling subsystem. Implements a custom Error type.

use std::fmt;

use crate::acl_adapter::CascadeOp;
use crate::permission::Permission;
use crate::types::NodeId;

pub type ClResult<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
	// Core errors
	NotFound,
	NodeNotFound(NodeId),
	/// The effective permission of the actor does not satisfy the required one
	InsufficientPermission {
		required: Permission,
		held: Option<Permission>,
	},
	/// A Guest or a non-Admin actor tried to create or remove a grant
	InvalidGrantor(String),
	CyclicMove,
	/// A cascade failed. `persisted` tells whether any part of it may have been committed.
	CascadeFailure {
		op: CascadeOp,
		persisted: bool,
	},
	HierarchyTooDeep {
		depth: usize,
		max: usize,
	},
	TooManyDescendants {
		count: usize,
		max: usize,
	},
	LastAdmin,
	ValidationError(String),
	Timeout,
	DbError,
	Parse,

	// externals
	Io(std::io::Error),
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Error::NotFound => write!(f, "not found"),
			Error::NodeNotFound(node_id) => write!(f, "node not found: {}", node_id),
			Error::InsufficientPermission { required, held: Some(held) } => {
				write!(f, "insufficient permission: {} required, {} held", required, held)
			}
			Error::InsufficientPermission { required, held: None } => {
				write!(f, "insufficient permission: {} required, no access", required)
			}
			Error::InvalidGrantor(msg) => write!(f, "invalid grantor: {}", msg),
			Error::CyclicMove => write!(f, "cannot move a node into its own subtree"),
			Error::CascadeFailure { op, persisted } => {
				write!(f, "{} cascade failed (persisted: {})", op, persisted)
			}
			Error::HierarchyTooDeep { depth, max } => {
				write!(f, "hierarchy too deep: {} levels, maximum is {}", depth, max)
			}
			Error::TooManyDescendants { count, max } => {
				write!(f, "too many descendants: {}, maximum is {}", count, max)
			}
			Error::LastAdmin => write!(f, "cannot remove the last admin grant"),
			Error::ValidationError(msg) => write!(f, "validation error: {}", msg),
			Error::Timeout => write!(f, "timeout"),
			Error::DbError => write!(f, "database error"),
			Error::Parse => write!(f, "parse error"),
			Error::Io(err) => write!(f, "io error: {}", err),
		}
	}
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::Io(err)
	}
}

impl Error {
	/// Errors that describe a permission decision rather than a malfunction
	pub fn is_access_denied(&self) -> bool {
		matches!(
			self,
			Error::NodeNotFound(_) | Error::InsufficientPermission { .. } | Error::InvalidGrantor(_)
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_display_insufficient_permission() {
		let err =
			Error::InsufficientPermission { required: Permission::Admin, held: Some(Permission::Read) };
		assert_eq!(err.to_string(), "insufficient permission: admin required, read held");

		let err = Error::InsufficientPermission { required: Permission::Read, held: None };
		assert_eq!(err.to_string(), "insufficient permission: read required, no access");
	}

	#[test]
	fn test_access_denied_classification() {
		assert!(Error::InvalidGrantor("guest".into()).is_access_denied());
		assert!(!Error::DbError.is_access_denied());
		assert!(!Error::CascadeFailure { op: CascadeOp::Move, persisted: false }.is_access_denied());
	}
}

// vim: ts=4
