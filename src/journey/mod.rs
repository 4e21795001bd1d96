//! Journey orchestration: per-student serialization and the boundary
//! operations.

mod locks;
pub mod service;

pub use locks::StudentLocks;
pub use service::{CounselOutcome, JourneyService, JourneyStatus, UnlockOutcome};
