//! Application task data model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of work a task represents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    #[serde(alias = "Sop", alias = "SOP")]
    Sop,
    #[serde(alias = "Exam")]
    Exam,
    #[serde(alias = "Form")]
    Form,
    #[serde(alias = "Deadline")]
    Deadline,
    #[serde(alias = "Document")]
    Document,
    #[default]
    #[serde(alias = "General")]
    General,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sop => "sop",
            Self::Exam => "exam",
            Self::Form => "form",
            Self::Deadline => "deadline",
            Self::Document => "document",
            Self::General => "general",
        }
    }
}

impl std::str::FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sop" => Ok(Self::Sop),
            "exam" => Ok(Self::Exam),
            "form" => Ok(Self::Form),
            "deadline" => Ok(Self::Deadline),
            "document" => Ok(Self::Document),
            "general" => Ok(Self::General),
            _ => Err(format!("unknown task type '{s}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    #[serde(alias = "Low")]
    Low,
    #[default]
    #[serde(alias = "Medium")]
    Medium,
    #[serde(alias = "High")]
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::str::FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("unknown task priority '{s}'")),
        }
    }
}

/// A unit of application work owned by a student, optionally scoped to
/// one university.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub student_id: Uuid,
    /// Tasks scoped to a university are removed when it is unlocked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub university_id: Option<Uuid>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub task_type: TaskType,
    pub priority: TaskPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub completed: bool,
    /// Created by the counsel action pipeline rather than by hand.
    pub generated_by_ai: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(student_id: Uuid, title: impl Into<String>, task_type: TaskType) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            student_id,
            university_id: None,
            title: title.into(),
            description: None,
            task_type,
            priority: TaskPriority::default(),
            due_date: None,
            completed: false,
            generated_by_ai: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_due_date(mut self, due: NaiveDate) -> Self {
        self.due_date = Some(due);
        self
    }

    /// Builder: scope to a university.
    pub fn for_university(mut self, university_id: Uuid) -> Self {
        self.university_id = Some(university_id);
        self
    }

    pub fn generated(mut self) -> Self {
        self.generated_by_ai = true;
        self
    }
}
