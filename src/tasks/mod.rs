//! Application tasks.

pub mod model;

pub use model::{Task, TaskPriority, TaskType};
