//! Built-in catalog loaded into an empty database at startup.

use tracing::info;

use super::model::{Competitiveness, University};
use crate::error::DatabaseError;
use crate::store::Database;

struct SeedEntry {
    name: &'static str,
    country: &'static str,
    avg_cost: u64,
    competitiveness: Competitiveness,
    min_gpa: f64,
    exams: &'static [&'static str],
    description: &'static str,
    ranking: u32,
}

const CATALOG: &[SeedEntry] = &[
    SeedEntry {
        name: "Harvard University",
        country: "USA",
        avg_cost: 60_000,
        competitiveness: Competitiveness::VeryHigh,
        min_gpa: 3.8,
        exams: &["IELTS", "GRE"],
        description: "Top-tier research university",
        ranking: 3,
    },
    SeedEntry {
        name: "Massachusetts Institute of Technology",
        country: "USA",
        avg_cost: 59_000,
        competitiveness: Competitiveness::VeryHigh,
        min_gpa: 3.8,
        exams: &["IELTS", "GRE", "GMAT"],
        description: "Leading tech and engineering university",
        ranking: 2,
    },
    SeedEntry {
        name: "Stanford University",
        country: "USA",
        avg_cost: 57_000,
        competitiveness: Competitiveness::VeryHigh,
        min_gpa: 3.8,
        exams: &["IELTS", "GRE"],
        description: "Prestigious research university",
        ranking: 4,
    },
    SeedEntry {
        name: "University of Cambridge",
        country: "UK",
        avg_cost: 45_000,
        competitiveness: Competitiveness::VeryHigh,
        min_gpa: 3.7,
        exams: &["IELTS"],
        description: "Historic institution of excellence",
        ranking: 5,
    },
    SeedEntry {
        name: "University of Oxford",
        country: "UK",
        avg_cost: 44_000,
        competitiveness: Competitiveness::VeryHigh,
        min_gpa: 3.7,
        exams: &["IELTS"],
        description: "World-renowned academic institution",
        ranking: 6,
    },
    SeedEntry {
        name: "ETH Zurich",
        country: "Switzerland",
        avg_cost: 50_000,
        competitiveness: Competitiveness::VeryHigh,
        min_gpa: 3.7,
        exams: &["IELTS", "GRE"],
        description: "Top engineering and science university",
        ranking: 10,
    },
    SeedEntry {
        name: "National University of Singapore",
        country: "Singapore",
        avg_cost: 32_000,
        competitiveness: Competitiveness::High,
        min_gpa: 3.4,
        exams: &["IELTS"],
        description: "Leading Asian university",
        ranking: 8,
    },
    SeedEntry {
        name: "University of Toronto",
        country: "Canada",
        avg_cost: 30_000,
        competitiveness: Competitiveness::High,
        min_gpa: 3.5,
        exams: &["IELTS", "GRE"],
        description: "Top Canadian research university",
        ranking: 21,
    },
    SeedEntry {
        name: "Seoul National University",
        country: "South Korea",
        avg_cost: 25_000,
        competitiveness: Competitiveness::High,
        min_gpa: 3.3,
        exams: &["IELTS"],
        description: "Leading South Korean university",
        ranking: 30,
    },
    SeedEntry {
        name: "University of British Columbia",
        country: "Canada",
        avg_cost: 28_000,
        competitiveness: Competitiveness::High,
        min_gpa: 3.4,
        exams: &["IELTS", "GRE"],
        description: "Prestigious Canadian university",
        ranking: 34,
    },
    SeedEntry {
        name: "University of Melbourne",
        country: "Australia",
        avg_cost: 35_000,
        competitiveness: Competitiveness::High,
        min_gpa: 3.5,
        exams: &["IELTS", "GRE"],
        description: "Leading Australian university",
        ranking: 37,
    },
    SeedEntry {
        name: "University of Tokyo",
        country: "Japan",
        avg_cost: 28_000,
        competitiveness: Competitiveness::Medium,
        min_gpa: 3.2,
        exams: &["IELTS", "GRE"],
        description: "Premier Japanese university",
        ranking: 39,
    },
    SeedEntry {
        name: "University of Amsterdam",
        country: "Netherlands",
        avg_cost: 20_000,
        competitiveness: Competitiveness::Medium,
        min_gpa: 3.2,
        exams: &["IELTS"],
        description: "Research-intensive university",
        ranking: 58,
    },
    SeedEntry {
        name: "Heidelberg University",
        country: "Germany",
        avg_cost: 15_000,
        competitiveness: Competitiveness::Medium,
        min_gpa: 3.0,
        exams: &["IELTS"],
        description: "Oldest German university",
        ranking: 64,
    },
    SeedEntry {
        name: "University of São Paulo",
        country: "Brazil",
        avg_cost: 12_000,
        competitiveness: Competitiveness::Medium,
        min_gpa: 3.0,
        exams: &["IELTS"],
        description: "Top university in Latin America",
        ranking: 84,
    },
];

/// The built-in catalog as fresh `University` values.
pub fn default_catalog() -> Vec<University> {
    CATALOG
        .iter()
        .map(|e| {
            University::new(e.name, e.country, e.avg_cost, e.competitiveness)
                .with_degree_types(&["Masters", "PhD"])
                .with_min_gpa(e.min_gpa)
                .with_exam_requirements(e.exams)
                .with_description(e.description)
                .with_ranking(e.ranking)
        })
        .collect()
}

/// Insert the built-in catalog if no universities exist yet.
/// Returns the number of rows inserted.
pub async fn seed_if_empty(db: &dyn Database) -> Result<usize, DatabaseError> {
    if !db.list_universities().await?.is_empty() {
        return Ok(0);
    }
    let catalog = default_catalog();
    for university in &catalog {
        db.insert_university(university).await?;
    }
    info!(count = catalog.len(), "Seeded university catalog");
    Ok(catalog.len())
}
