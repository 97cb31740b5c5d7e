//! Engine configuration
//!
//! Limits that bound the cost of resolution and of structural mutations.

use serde::Deserialize;
use std::time::Duration;

/// Main access-control configuration
#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AclConfig {
	/// Maximum path length (root counts as 1)
	pub max_depth: usize,
	/// Maximum number of descendants a single move, copy or delete may touch
	pub max_descendants: usize,
	/// Number of cached resolutions (0 disables the cache)
	pub cache_capacity: usize,
	/// Upper bound for one `effective()` resolution
	#[serde(with = "duration_ms")]
	pub resolve_timeout: Duration,
}

impl Default for AclConfig {
	fn default() -> Self {
		Self {
			max_depth: 15,
			max_descendants: 400,
			cache_capacity: 4096,
			resolve_timeout: Duration::from_secs(5),
		}
	}
}

mod duration_ms {
	use serde::{Deserialize, Deserializer};
	use std::time::Duration;

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		Ok(Duration::from_millis(u64::deserialize(deserializer)?))
	}
}


// vim: ts=4
