//! Permission lattice
//!
//! Permissions form a total order: `Read < Write < Admin`. Every check in the
//! engine goes through [`Permission::satisfies`], so a higher permission always
//! implies all lower ones.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
	Read = 1,
	Write = 2,
	Admin = 3,
}

impl Permission {
	pub const ALL: [Permission; 3] = [Permission::Read, Permission::Write, Permission::Admin];

	/// Numeric level of the permission (Read=1, Write=2, Admin=3)
	pub fn level(self) -> u8 {
		self as u8
	}

	/// `held` satisfies `required` iff it is at least as strong
	pub fn satisfies(self, required: Permission) -> bool {
		self >= required
	}

	/// Single character code used by storage adapters
	pub fn code(self) -> &'static str {
		match self {
			Permission::Read => "R",
			Permission::Write => "W",
			Permission::Admin => "A",
		}
	}

	pub fn from_code(code: &str) -> ClResult<Self> {
		match code {
			"R" => Ok(Permission::Read),
			"W" => Ok(Permission::Write),
			"A" => Ok(Permission::Admin),
			_ => Err(Error::Parse),
		}
	}
}

/// Lattice join of two optional permissions
pub fn max(a: Option<Permission>, b: Option<Permission>) -> Option<Permission> {
	a.max(b)
}

/// `None` (no access) satisfies nothing
pub fn satisfies(held: Option<Permission>, required: Permission) -> bool {
	held.is_some_and(|held| held.satisfies(required))
}

impl std::fmt::Display for Permission {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			Permission::Read => "read",
			Permission::Write => "write",
			Permission::Admin => "admin",
		})
	}
}

impl FromStr for Permission {
	type Err = Error;

	fn from_str(s: &str) -> ClResult<Self> {
		match s {
			"read" => Ok(Permission::Read),
			"write" => Ok(Permission::Write),
			"admin" => Ok(Permission::Admin),
			_ => Err(Error::ValidationError(format!("unknown permission: '{}'", s))),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_total_order() {
		assert!(Permission::Read < Permission::Write);
		assert!(Permission::Write < Permission::Admin);
		assert_eq!(Permission::Admin.level(), 3);
	}

	#[test]
	fn test_admin_implies_everything() {
		for required in Permission::ALL {
			assert!(Permission::Admin.satisfies(required));
		}
		assert!(Permission::Write.satisfies(Permission::Read));
		assert!(!Permission::Write.satisfies(Permission::Admin));
		assert!(!Permission::Read.satisfies(Permission::Write));
	}

	#[test]
	fn test_optional_helpers() {
		assert!(!satisfies(None, Permission::Read));
		assert!(satisfies(Some(Permission::Write), Permission::Read));
		assert_eq!(max(None, Some(Permission::Read)), Some(Permission::Read));
		assert_eq!(max(Some(Permission::Admin), Some(Permission::Read)), Some(Permission::Admin));
		assert_eq!(max(None, None), None);
	}

	#[test]
	fn test_codes() {
		for perm in Permission::ALL {
			assert_eq!(Permission::from_code(perm.code()).unwrap(), perm);
			assert_eq!(perm.to_string().parse::<Permission>().unwrap(), perm);
		}
		assert!(Permission::from_code("X").is_err());
		assert!("owner".parse::<Permission>().is_err());
	}
}

// vim: ts=4
