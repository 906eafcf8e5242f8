//! Utility types and functions.
//!
//! - [`Error`] / [`Result`] - Error handling
//! - Math type re-exports from glam and float helpers

mod error;
mod math;

pub use error::*;
pub use math::*;
