//! Shared types, adapter traits, and core utilities for the Canopy access-control engine.
//!
//! This crate contains the foundational types that are shared between the
//! engine crate and all storage adapter implementations. Keeping them in a
//! separate crate lets adapter crates compile without pulling in the engine.

pub mod account;
pub mod acl_adapter;
pub mod error;
pub mod path;
pub mod permission;
pub mod prelude;
pub mod types;
pub mod utils;

// vim: ts=4
