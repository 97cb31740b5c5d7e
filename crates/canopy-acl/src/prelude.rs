pub use canopy_types::prelude::*;

// vim: ts=4
