//! Common types used throughout the Canopy engine.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::prelude::*;
use crate::utils::random_id;

// TnId //
//******//
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TnId(pub u32);

impl std::fmt::Display for TnId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl Serialize for TnId {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_u32(self.0)
	}
}

impl<'de> Deserialize<'de> for TnId {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		Ok(TnId(u32::deserialize(deserializer)?))
	}
}

// Timestamp //
//***********//
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub i64);

impl Timestamp {
	pub fn now() -> Timestamp {
		let res = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default();
		Timestamp(i64::try_from(res.as_secs()).unwrap_or(i64::MAX))
	}
}

impl std::fmt::Display for Timestamp {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl Serialize for Timestamp {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_i64(self.0)
	}
}

impl<'de> Deserialize<'de> for Timestamp {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		Ok(Timestamp(i64::deserialize(deserializer)?))
	}
}

// NodeId //
//********//
/// Opaque identifier of a content node.
///
/// Restricted to ASCII alphanumerics and `-`, so ids can be joined into a
/// path string with `.` and matched with `GLOB` prefixes safely.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId(Box<str>);

impl NodeId {
	pub fn new(id: impl Into<Box<str>>) -> ClResult<Self> {
		let id = id.into();
		if id.is_empty() {
			return Err(Error::ValidationError("node id cannot be empty".into()));
		}
		if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
			return Err(Error::ValidationError(format!("invalid node id: '{}'", id)));
		}
		Ok(Self(id))
	}

	/// Allocates a fresh random id
	pub fn random() -> Self {
		Self(random_id().into_boxed_str())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl AsRef<str> for NodeId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

impl std::fmt::Display for NodeId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

impl TryFrom<String> for NodeId {
	type Error = Error;

	fn try_from(value: String) -> ClResult<Self> {
		Self::new(value)
	}
}

impl From<NodeId> for String {
	fn from(value: NodeId) -> Self {
		value.0.into_string()
	}
}

// ActorId //
//*********//
/// Identifier of an actor (a Member account or a Guest login).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub Box<str>);

impl ActorId {
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl AsRef<str> for ActorId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

impl From<&str> for ActorId {
	fn from(value: &str) -> Self {
		Self(value.into())
	}
}

impl std::fmt::Display for ActorId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_node_id_validation() {
		assert!(NodeId::new("abc-123").is_ok());
		assert!(NodeId::new("").is_err());
		assert!(NodeId::new("a.b").is_err());
		assert!(NodeId::new("a_b").is_err());
		assert!(NodeId::new("a%").is_err());
	}

	#[test]
	fn test_random_node_ids_are_valid_and_distinct() {
		let a = NodeId::random();
		let b = NodeId::random();
		assert_ne!(a, b);
		assert!(NodeId::new(a.as_str()).is_ok());
	}

	#[test]
	fn test_node_id_serde() {
		let id: NodeId = serde_json::from_str("\"root1\"").unwrap();
		assert_eq!(id.as_str(), "root1");
		assert!(serde_json::from_str::<NodeId>("\"bad.id\"").is_err());
	}
}

// vim: ts=4
