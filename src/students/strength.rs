//! Profile strength scorer: weighted presence check over onboarding fields.

use super::model::Onboarding;

const EDUCATION_LEVEL: u32 = 10;
const MAJOR: u32 = 10;
const GPA: u32 = 15;
const INTENDED_DEGREE: u32 = 15;
const FIELD_OF_STUDY: u32 = 15;
const PREFERRED_COUNTRIES: u32 = 15;
const YEARLY_BUDGET: u32 = 10;
const IELTS: u32 = 10;

/// Score onboarding answers on a 0-100 scale. Pure and deterministic.
pub fn score(onboarding: &Onboarding) -> u8 {
    let academic = &onboarding.academic;
    let goals = &onboarding.study_goals;

    let weighted = [
        (present(&academic.education_level), EDUCATION_LEVEL),
        (present(&academic.major), MAJOR),
        (academic.gpa.is_some_and(|g| g > 0.0), GPA),
        (present(&goals.intended_degree), INTENDED_DEGREE),
        (present(&goals.field_of_study), FIELD_OF_STUDY),
        (
            goals.preferred_countries.iter().any(|c| !c.trim().is_empty()),
            PREFERRED_COUNTRIES,
        ),
        (onboarding.budget.yearly_budget.is_some_and(|b| b > 0), YEARLY_BUDGET),
        (present(&onboarding.exams.ielts), IELTS),
    ];

    let total: u32 = weighted
        .iter()
        .filter(|(filled, _)| *filled)
        .map(|(_, weight)| weight)
        .sum();

    total.min(100) as u8
}

fn present(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::students::model::{Academic, Budget, Exams, StudyGoals};

    fn complete() -> Onboarding {
        Onboarding {
            academic: Academic {
                education_level: Some("Bachelor's".into()),
                major: Some("Computer Science".into()),
                graduation_year: Some(2024),
                gpa: Some(3.8),
            },
            study_goals: StudyGoals {
                intended_degree: Some("Masters".into()),
                field_of_study: Some("Machine Learning".into()),
                intake_year: Some(2026),
                preferred_countries: vec!["USA".into(), "Canada".into()],
            },
            budget: Budget {
                yearly_budget: Some(40_000),
                funding_type: Some("Self-funded".into()),
            },
            exams: Exams {
                ielts: Some("Completed".into()),
                gre_gmat: None,
                sop: None,
            },
        }
    }

    #[test]
    fn complete_profile_scores_100() {
        assert_eq!(score(&complete()), 100);
    }

    #[test]
    fn empty_profile_scores_zero() {
        assert_eq!(score(&Onboarding::default()), 0);
    }

    #[test]
    fn blank_and_zero_values_count_as_missing() {
        let mut o = complete();
        o.academic.major = Some("   ".into());
        o.academic.gpa = Some(0.0);
        o.budget.yearly_budget = Some(0);
        o.study_goals.preferred_countries = vec![String::new()];
        assert_eq!(
            u32::from(score(&o)),
            100 - MAJOR - GPA - YEARLY_BUDGET - PREFERRED_COUNTRIES
        );
    }

    #[test]
    fn repeated_calls_are_identical() {
        let o = complete();
        assert_eq!(score(&o), score(&o));
    }

    #[test]
    fn filling_fields_never_lowers_score() {
        let target = complete();
        let mut o = Onboarding::default();
        let mut last = score(&o);

        for step in 0..8 {
            match step {
                0 => o.academic.education_level = target.academic.education_level.clone(),
                1 => o.academic.major = target.academic.major.clone(),
                2 => o.academic.gpa = target.academic.gpa,
                3 => o.study_goals.intended_degree = target.study_goals.intended_degree.clone(),
                4 => o.study_goals.field_of_study = target.study_goals.field_of_study.clone(),
                5 => {
                    o.study_goals.preferred_countries =
                        target.study_goals.preferred_countries.clone()
                }
                6 => o.budget.yearly_budget = target.budget.yearly_budget,
                _ => o.exams.ielts = target.exams.ielts.clone(),
            }
            let next = score(&o);
            assert!(next >= last, "score dropped from {last} to {next} at step {step}");
            last = next;
        }
        assert_eq!(last, 100);
    }

    #[test]
    fn unscored_fields_do_not_contribute() {
        let mut o = Onboarding::default();
        o.exams.gre_gmat = Some("Completed".into());
        o.budget.funding_type = Some("Scholarship".into());
        o.academic.graduation_year = Some(2023);
        assert_eq!(score(&o), 0);
    }
}
