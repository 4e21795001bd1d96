//! Student records, onboarding answers, the journey stage machine and the
//! profile strength scorer.

pub mod model;
pub mod stage;
pub mod strength;

pub use model::{Academic, Budget, Exams, Onboarding, ProfileSummary, StudyGoals, Student};
pub use stage::{Stage, StageInfo, StageTrigger};
