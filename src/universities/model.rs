//! University catalog entries.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How selective a university is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Competitiveness {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl Competitiveness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::VeryHigh => "very_high",
        }
    }
}

impl std::str::FromStr for Competitiveness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "very_high" => Ok(Self::VeryHigh),
            other => Err(format!("unknown competitiveness '{other}'")),
        }
    }
}

impl std::fmt::Display for Competitiveness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A university in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct University {
    pub id: Uuid,
    pub name: String,
    pub country: String,
    pub degree_types: Vec<String>,
    /// Average yearly cost in USD.
    pub avg_cost: u64,
    pub competitiveness: Competitiveness,
    pub min_gpa: f64,
    pub exam_requirements: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranking: Option<u32>,
}

impl University {
    pub fn new(
        name: impl Into<String>,
        country: impl Into<String>,
        avg_cost: u64,
        competitiveness: Competitiveness,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            country: country.into(),
            degree_types: Vec::new(),
            avg_cost,
            competitiveness,
            min_gpa: 2.5,
            exam_requirements: Vec::new(),
            description: None,
            ranking: None,
        }
    }

    pub fn with_min_gpa(mut self, min_gpa: f64) -> Self {
        self.min_gpa = min_gpa;
        self
    }

    pub fn with_degree_types(mut self, degrees: &[&str]) -> Self {
        self.degree_types = degrees.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn with_exam_requirements(mut self, exams: &[&str]) -> Self {
        self.exam_requirements = exams.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_ranking(mut self, ranking: u32) -> Self {
        self.ranking = Some(ranking);
        self
    }
}
