//! Shortlist ledger and entry model.

pub mod ledger;
pub mod model;

pub use ledger::ShortlistLedger;
pub use model::{Category, ShortlistCounts, ShortlistEntry};
