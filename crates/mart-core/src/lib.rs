//! # mart-core
//!
//! Shared primitives for the MartKit platform: integer money, newtype
//! identifiers, and credential hashing. Every other MartKit crate builds
//! on these types.

pub mod ids;
pub mod money;
pub mod secret;

pub use ids::*;
pub use money::Money;
