//! Counselling prompt construction.

use std::fmt::Write;

use serde::Serialize;
use uuid::Uuid;

use crate::students::{Onboarding, Stage};
use crate::universities::{Competitiveness, University};

/// Catalog row embedded in the prompt so the service can propose
/// shortlist actions by id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UniversitySummary {
    pub id: Uuid,
    pub name: String,
    pub country: String,
    pub avg_cost: u64,
    pub competitiveness: Competitiveness,
}

impl From<&University> for UniversitySummary {
    fn from(u: &University) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            country: u.country.clone(),
            avg_cost: u.avg_cost,
            competitiveness: u.competitiveness,
        }
    }
}

/// Everything the advice source may look at. Built fresh per request.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileSnapshot {
    pub student_name: String,
    pub onboarding: Onboarding,
    pub strength: u8,
    pub stage: Stage,
    pub shortlisted_count: u32,
    pub locked_university: Option<String>,
    pub candidates: Vec<UniversitySummary>,
}

const SYSTEM_PROMPT: &str = "You are an expert study abroad counsellor. \
Assess the student's profile, name concrete strengths and gaps, and propose next steps. \
Respond with a single JSON object and nothing else.";

const RESPONSE_FORMAT: &str = r#"{
  "message": "Your counselling message",
  "strengths": ["strength"],
  "gaps": ["gap"],
  "recommendations": ["recommendation"],
  "actions": [
    {"type": "shortlist", "university_id": "<id from the list above>", "category": "dream|target|safe"},
    {"type": "create_task", "title": "Task title", "description": "Task description",
     "task_type": "sop|exam|form|deadline|document|general", "priority": "low|medium|high",
     "due_date": "YYYY-MM-DD"}
  ]
}"#;

pub fn system_prompt() -> &'static str {
    SYSTEM_PROMPT
}

/// Render the user prompt for a snapshot.
pub fn build_counsel_prompt(snapshot: &ProfileSnapshot) -> String {
    let o = &snapshot.onboarding;
    let mut prompt = String::with_capacity(2048);

    let _ = writeln!(prompt, "Student: {}", snapshot.student_name);
    let _ = writeln!(prompt, "\nProfile:");
    let _ = writeln!(prompt, "- Education Level: {}", text(&o.academic.education_level));
    let _ = writeln!(prompt, "- Major: {}", text(&o.academic.major));
    let _ = writeln!(prompt, "- Graduation Year: {}", number(o.academic.graduation_year));
    let _ = writeln!(
        prompt,
        "- GPA: {}",
        o.academic
            .gpa
            .map(|g| format!("{g:.2}"))
            .unwrap_or_else(|| "Not provided".to_string())
    );
    let _ = writeln!(prompt, "- Intended Degree: {}", text(&o.study_goals.intended_degree));
    let _ = writeln!(prompt, "- Field of Study: {}", text(&o.study_goals.field_of_study));
    let _ = writeln!(prompt, "- Intake Year: {}", number(o.study_goals.intake_year));
    let countries = if o.study_goals.preferred_countries.is_empty() {
        "Not provided".to_string()
    } else {
        o.study_goals.preferred_countries.join(", ")
    };
    let _ = writeln!(prompt, "- Preferred Countries: {countries}");
    let _ = writeln!(
        prompt,
        "- Yearly Budget (USD): {}",
        number(o.budget.yearly_budget)
    );
    let _ = writeln!(prompt, "- Funding Type: {}", text(&o.budget.funding_type));
    let _ = writeln!(prompt, "- IELTS Status: {}", text(&o.exams.ielts));
    let _ = writeln!(prompt, "- GRE/GMAT Status: {}", text(&o.exams.gre_gmat));
    let _ = writeln!(prompt, "- SOP Status: {}", text(&o.exams.sop));
    let _ = writeln!(prompt, "- Profile Strength: {}/100", snapshot.strength);
    let _ = writeln!(prompt, "- Stage: {}", snapshot.stage);
    let _ = writeln!(prompt, "- Shortlisted Universities: {}", snapshot.shortlisted_count);
    let _ = writeln!(
        prompt,
        "- Locked University: {}",
        snapshot.locked_university.as_deref().unwrap_or("None")
    );

    if !snapshot.candidates.is_empty() {
        let _ = writeln!(prompt, "\nUniversities you may shortlist (id | name | country | yearly cost | competitiveness):");
        for u in &snapshot.candidates {
            let _ = writeln!(
                prompt,
                "- {} | {} | {} | ${} | {}",
                u.id, u.name, u.country, u.avg_cost, u.competitiveness
            );
        }
    }

    let _ = writeln!(
        prompt,
        "\nProvide an assessment of strengths and gaps, specific recommendations, \
         and next steps as actions. Only shortlist universities from the list above."
    );
    let _ = write!(prompt, "\nFormat the response as JSON:\n{RESPONSE_FORMAT}");
    prompt
}

fn text(field: &Option<String>) -> &str {
    match field.as_deref() {
        Some(s) if !s.trim().is_empty() => s,
        _ => "Not provided",
    }
}

fn number<T: std::fmt::Display>(field: Option<T>) -> String {
    field
        .map(|n| n.to_string())
        .unwrap_or_else(|| "Not provided".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> ProfileSnapshot {
        let mut onboarding = Onboarding::default();
        onboarding.academic.major = Some("Computer Science".into());
        onboarding.academic.gpa = Some(3.8);
        onboarding.study_goals.preferred_countries = vec!["Canada".into(), "UK".into()];
        ProfileSnapshot {
            student_name: "Asha".into(),
            onboarding,
            strength: 40,
            stage: Stage::DiscoveringUniversities,
            shortlisted_count: 0,
            locked_university: None,
            candidates: vec![UniversitySummary::from(
                &University::new("ETH Zurich", "Switzerland", 50_000, Competitiveness::VeryHigh),
            )],
        }
    }

    #[test]
    fn prompt_embeds_profile_fields() {
        let prompt = build_counsel_prompt(&snapshot());
        assert!(prompt.contains("- Major: Computer Science"));
        assert!(prompt.contains("- GPA: 3.80"));
        assert!(prompt.contains("- Preferred Countries: Canada, UK"));
        assert!(prompt.contains("- IELTS Status: Not provided"));
        assert!(prompt.contains("- Locked University: None"));
        assert!(prompt.contains("- Profile Strength: 40/100"));
    }

    #[test]
    fn prompt_lists_candidates_and_format() {
        let snap = snapshot();
        let prompt = build_counsel_prompt(&snap);
        let id = snap.candidates[0].id.to_string();
        assert!(prompt.contains(&id));
        assert!(prompt.contains("ETH Zurich | Switzerland | $50000 | very_high"));
        assert!(prompt.contains("\"type\": \"create_task\""));
    }

    #[test]
    fn prompt_names_locked_university() {
        let mut snap = snapshot();
        snap.locked_university = Some("University of Toronto".into());
        snap.candidates.clear();
        let prompt = build_counsel_prompt(&snap);
        assert!(prompt.contains("- Locked University: University of Toronto"));
        assert!(!prompt.contains("Universities you may shortlist"));
    }
}
