//! Abroad Counsel: study-abroad journey state machine and counselling
//! engine.

pub mod api;
pub mod config;
pub mod counsel;
pub mod error;
pub mod journey;
pub mod llm;
pub mod shortlist;
pub mod store;
pub mod students;
pub mod tasks;
pub mod universities;
