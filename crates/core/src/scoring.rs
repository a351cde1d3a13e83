//! Assessment Scoring
//!
//! Pure, deterministic score computation over a completed motivational
//! profile. No I/O and no side effects; the completion handoff calls this
//! exactly once per interview.

use crate::profile::PersonaProfile;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const PROJECTS_CAP: u32 = 500;
pub const PERSONA_CAP: u32 = 200;
pub const CREDENTIALS_CAP: u32 = 150;
pub const EXPERIENCE_CAP: u32 = 100;
pub const CONTINUOUS_LEARNING_CAP: u32 = 50;

/// The five weighted sub-scores making up a total assessment score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub projects: u32,
    pub persona: u32,
    pub credentials: u32,
    pub experience: u32,
    pub continuous_learning: u32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u32 {
        self.projects
            + self.persona
            + self.credentials
            + self.experience
            + self.continuous_learning
    }
}

/// Components earned outside the interview itself. Absent components score
/// zero; a supplied `persona` value overrides the profile-derived one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExternalComponents {
    pub projects: Option<u32>,
    pub persona: Option<u32>,
    pub credentials: Option<u32>,
    pub experience: Option<u32>,
    pub continuous_learning: Option<u32>,
}

/// Qualitative band, a step function of the total at 200-point intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScoreLevel {
    #[serde(rename = "Aspiring Professional")]
    Aspiring,
    #[serde(rename = "Emerging Professional")]
    Emerging,
    #[serde(rename = "Competent Professional")]
    Competent,
    #[serde(rename = "Skilled Professional")]
    Skilled,
    #[serde(rename = "Expert Professional")]
    Expert,
}

impl ScoreLevel {
    pub fn from_total(total: u32) -> Self {
        match total {
            800.. => ScoreLevel::Expert,
            600.. => ScoreLevel::Skilled,
            400.. => ScoreLevel::Competent,
            200.. => ScoreLevel::Emerging,
            _ => ScoreLevel::Aspiring,
        }
    }
}

impl fmt::Display for ScoreLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScoreLevel::Aspiring => "Aspiring Professional",
            ScoreLevel::Emerging => "Emerging Professional",
            ScoreLevel::Competent => "Competent Professional",
            ScoreLevel::Skilled => "Skilled Professional",
            ScoreLevel::Expert => "Expert Professional",
        };
        write!(f, "{}", s)
    }
}

/// A computed score: the total always equals the sum of the breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentScore {
    pub total: u32,
    pub breakdown: ScoreBreakdown,
    pub level: ScoreLevel,
}

/// The one-time output of a completed interview: the frozen profile plus its
/// derived score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    pub profile: PersonaProfile,
    pub score: AssessmentScore,
}

/// Computes the score breakdown for a (possibly absent) profile.
///
/// The persona component is worth the full [`PERSONA_CAP`] once a completed
/// profile exists and zero otherwise; the remaining components come from
/// `external` and default to zero. Every component is clamped to its cap.
pub fn calculate_score(
    profile: Option<&PersonaProfile>,
    external: Option<&ExternalComponents>,
) -> AssessmentScore {
    let ext = external.copied().unwrap_or_default();
    let persona_default = if profile.is_some() { PERSONA_CAP } else { 0 };

    let breakdown = ScoreBreakdown {
        projects: ext.projects.unwrap_or(0).min(PROJECTS_CAP),
        persona: ext.persona.unwrap_or(persona_default).min(PERSONA_CAP),
        credentials: ext.credentials.unwrap_or(0).min(CREDENTIALS_CAP),
        experience: ext.experience.unwrap_or(0).min(EXPERIENCE_CAP),
        continuous_learning: ext
            .continuous_learning
            .unwrap_or(0)
            .min(CONTINUOUS_LEARNING_CAP),
    };

    let total = breakdown.total();
    AssessmentScore {
        total,
        breakdown,
        level: ScoreLevel::from_total(total),
    }
}
