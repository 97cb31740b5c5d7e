pub use crate::error::{ClResult, Error};
pub use crate::path::NodePath;
pub use crate::permission::Permission;
pub use crate::types::{ActorId, NodeId, Timestamp, TnId};

pub use tracing::{debug, debug_span, error, error_span, info, info_span, warn, warn_span};

// vim: ts=4
