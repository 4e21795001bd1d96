//! Journey stage machine.
//!
//! Persisted values only ever move through explicit triggers:
//! BuildingProfile → DiscoveringUniversities on onboarding,
//! (Discovering | Finalizing | Preparing) → PreparingApplications on lock,
//! any post-onboarding stage → DiscoveringUniversities on unlock.
//! `FinalizingUniversities` is never persisted; it is a presented view of a
//! discovering student that already has shortlist entries.

use serde::{Deserialize, Serialize};

use crate::error::JourneyError;

/// The four phases of a student's application journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Stage {
    BuildingProfile = 1,
    DiscoveringUniversities = 2,
    FinalizingUniversities = 3,
    PreparingApplications = 4,
}

/// Events that move the persisted stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageTrigger {
    OnboardingCompleted,
    UniversityLocked,
    UniversityUnlocked,
}

impl Stage {
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::BuildingProfile),
            2 => Some(Self::DiscoveringUniversities),
            3 => Some(Self::FinalizingUniversities),
            4 => Some(Self::PreparingApplications),
            _ => None,
        }
    }

    /// Stage after `trigger` fires, or `InvalidState` if the trigger is not
    /// permitted from here.
    pub fn apply(self, trigger: StageTrigger) -> Result<Stage, JourneyError> {
        use Stage::*;
        use StageTrigger::*;
        match (self, trigger) {
            (BuildingProfile, OnboardingCompleted) => Ok(DiscoveringUniversities),
            // Resubmitting onboarding never moves a student backwards.
            (current, OnboardingCompleted) => Ok(current),
            (BuildingProfile, UniversityLocked) => Err(JourneyError::InvalidState(
                "cannot lock a university before onboarding is complete".to_string(),
            )),
            (_, UniversityLocked) => Ok(PreparingApplications),
            (BuildingProfile, UniversityUnlocked) => Err(JourneyError::InvalidState(
                "cannot unlock a university before onboarding is complete".to_string(),
            )),
            (_, UniversityUnlocked) => Ok(DiscoveringUniversities),
        }
    }

    /// Stage shown to the student. Discovering with at least one shortlisted
    /// university presents as Finalizing.
    pub fn presented(self, shortlisted: u32) -> Stage {
        match self {
            Self::DiscoveringUniversities if shortlisted > 0 => Self::FinalizingUniversities,
            other => other,
        }
    }

    pub fn info(self) -> StageInfo {
        let (name, description) = match self {
            Self::BuildingProfile => ("Building Profile", "Complete your onboarding"),
            Self::DiscoveringUniversities => ("Discovering Universities", "Shortlist universities"),
            Self::FinalizingUniversities => {
                ("Finalizing Universities", "Lock at least one university")
            }
            Self::PreparingApplications => {
                ("Preparing Applications", "Complete application tasks")
            }
        };
        StageInfo {
            stage: self,
            name,
            description,
        }
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::BuildingProfile
    }
}

impl From<Stage> for u8 {
    fn from(stage: Stage) -> u8 {
        stage.number()
    }
}

impl TryFrom<u8> for Stage {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Stage::from_number(n).ok_or_else(|| format!("invalid stage {n}, expected 1-4"))
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.number(), self.info().name)
    }
}

/// Human-facing label for a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageInfo {
    pub stage: Stage,
    pub name: &'static str,
    pub description: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn onboarding_moves_building_to_discovering() {
        let next = Stage::BuildingProfile
            .apply(StageTrigger::OnboardingCompleted)
            .unwrap();
        assert_eq!(next, Stage::DiscoveringUniversities);
    }

    #[test]
    fn onboarding_resubmission_keeps_stage() {
        for stage in [Stage::DiscoveringUniversities, Stage::PreparingApplications] {
            assert_eq!(stage.apply(StageTrigger::OnboardingCompleted).unwrap(), stage);
        }
    }

    #[test]
    fn lock_moves_to_preparing() {
        for stage in [
            Stage::DiscoveringUniversities,
            Stage::FinalizingUniversities,
            Stage::PreparingApplications,
        ] {
            assert_eq!(
                stage.apply(StageTrigger::UniversityLocked).unwrap(),
                Stage::PreparingApplications,
                "{stage} should lock"
            );
        }
    }

    #[test]
    fn unlock_reverts_to_discovering() {
        assert_eq!(
            Stage::PreparingApplications
                .apply(StageTrigger::UniversityUnlocked)
                .unwrap(),
            Stage::DiscoveringUniversities
        );
    }

    #[test]
    fn building_profile_rejects_lock_and_unlock() {
        assert!(matches!(
            Stage::BuildingProfile.apply(StageTrigger::UniversityLocked),
            Err(JourneyError::InvalidState(_))
        ));
        assert!(matches!(
            Stage::BuildingProfile.apply(StageTrigger::UniversityUnlocked),
            Err(JourneyError::InvalidState(_))
        ));
    }

    #[test]
    fn presented_stage_derives_finalizing() {
        assert_eq!(
            Stage::DiscoveringUniversities.presented(0),
            Stage::DiscoveringUniversities
        );
        assert_eq!(
            Stage::DiscoveringUniversities.presented(2),
            Stage::FinalizingUniversities
        );
        assert_eq!(
            Stage::PreparingApplications.presented(3),
            Stage::PreparingApplications
        );
    }

    #[test]
    fn serde_uses_stage_number() {
        let json = serde_json::to_string(&Stage::PreparingApplications).unwrap();
        assert_eq!(json, "4");
        let parsed: Stage = serde_json::from_str("2").unwrap();
        assert_eq!(parsed, Stage::DiscoveringUniversities);
        assert!(serde_json::from_str::<Stage>("7").is_err());
    }

    #[test]
    fn stage_info_names() {
        assert_eq!(Stage::BuildingProfile.info().name, "Building Profile");
        assert_eq!(
            Stage::FinalizingUniversities.info().description,
            "Lock at least one university"
        );
    }
}
