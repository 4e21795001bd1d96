//! University catalog.

pub mod model;
pub mod seed;

pub use model::{Competitiveness, University};
