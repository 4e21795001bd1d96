//! Shortlist entries and derived counts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How ambitious a shortlisted university is for this student.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[serde(alias = "Dream", alias = "DREAM")]
    Dream,
    #[default]
    #[serde(alias = "Target", alias = "TARGET")]
    Target,
    #[serde(alias = "Safe", alias = "SAFE")]
    Safe,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dream => "dream",
            Self::Target => "target",
            Self::Safe => "safe",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dream" => Ok(Self::Dream),
            "target" => Ok(Self::Target),
            "safe" => Ok(Self::Safe),
            _ => Err(format!("unknown category '{s}'")),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One (student, university) pair on the shortlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortlistEntry {
    pub student_id: Uuid,
    pub university_id: Uuid,
    pub category: Category,
    /// At most one entry per student is locked.
    pub locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShortlistEntry {
    pub fn new(student_id: Uuid, university_id: Uuid, category: Category) -> Self {
        let now = Utc::now();
        Self {
            student_id,
            university_id,
            category,
            locked: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Number of shortlisted universities per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortlistCounts {
    pub dream: u32,
    pub target: u32,
    pub safe: u32,
}

impl ShortlistCounts {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a ShortlistEntry>) -> Self {
        let mut counts = Self::default();
        for entry in entries {
            counts.record(entry.category);
        }
        counts
    }

    pub fn record(&mut self, category: Category) {
        match category {
            Category::Dream => self.dream += 1,
            Category::Target => self.target += 1,
            Category::Safe => self.safe += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.dream + self.target + self.safe
    }
}
