//! Hierarchical access-control resolution engine.
//!
//! Decides, for an (actor, node) pair, which permission applies. Nodes form a
//! forest addressed by materialized paths, grants are attached to arbitrary
//! nodes and inherit downward (closest ancestor wins), and a Public/Hidden
//! visibility overlay grants or conceals read access independently of grants.
//!
//! Other subsystems only talk to the [`Authorizer`] façade:
//!
//! ```text
//! caller ─► Authorizer ─► ResolutionEngine ─► AclAdapter (lineage snapshot)
//!                     └─► CascadeCoordinator ─► AclAdapter (atomic change set)
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod authorizer;
pub mod cache;
pub mod cascade;
pub mod config;
pub mod lock;
pub mod membership;
pub mod prelude;
pub mod resolve;
pub mod tree;
pub mod visibility;
pub mod walk;

pub use authorizer::Authorizer;
pub use config::AclConfig;
pub use resolve::{EffectivePermission, PermissionSource, ResolutionEngine};

// vim: ts=4
