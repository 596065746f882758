//! # Shared Types Crate
//!
//! Protocol primitives shared by the validator database and the slashing
//! protection service.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: keys, epochs and signable objects are
//!   defined once here.
//! - **Layout Constants**: `params` holds the constants the on-disk history
//!   format depends on.

pub mod entities;
pub mod params;

pub use entities::*;
pub use params::*;
