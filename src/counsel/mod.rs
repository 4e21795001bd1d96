//! Counselling: advice generation and the action execution pipeline.

pub mod advice;
pub mod executor;
pub mod generator;
pub mod prompts;
pub mod source;

pub use advice::{Advice, ProposedAction, parse_advice};
pub use executor::{ActionExecutor, AppliedAction, ExecutionReport, FailedAction};
pub use generator::{AdviceGenerator, AdviceOrigin};
pub use prompts::{ProfileSnapshot, UniversitySummary};
pub use source::{AdviceSource, CannedAdviceSource, RemoteAdviceSource};
