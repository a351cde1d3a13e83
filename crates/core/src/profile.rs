use serde::{Deserialize, Serialize};
use std::fmt;

/// The five conflict-handling styles a branching-scenario choice can be
/// tagged with. The tag accumulates into the interview's running tally and
/// the analysis folds the dominant style into the final profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictStyle {
    Competing,
    Collaborating,
    Compromising,
    Avoiding,
    Accommodating,
}

impl fmt::Display for ConflictStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConflictStyle::Competing => "competing",
            ConflictStyle::Collaborating => "collaborating",
            ConflictStyle::Compromising => "compromising",
            ConflictStyle::Avoiding => "avoiding",
            ConflictStyle::Accommodating => "accommodating",
        };
        write!(f, "{}", s)
    }
}

/// Qualitative emotional-intelligence snapshot derived from the interview.
///
/// Values are free-form labels produced by the analysis (e.g. "High",
/// "Developing"), not numeric scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EqSnapshot {
    pub self_awareness: String,
    pub self_management: String,
    pub social_awareness: String,
    pub relationship_management: String,
}

/// Notable quotations and behavioral signals surfaced by the analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehavioralFlags {
    #[serde(default)]
    pub green_flags: Vec<String>,
    #[serde(default)]
    pub red_flags: Vec<String>,
}

/// The frozen motivational profile produced once per interview by the
/// dialogue backend's analysis call. Immutable after creation; later edits
/// to the conversation never feed back into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaProfile {
    /// The candidate's articulated purpose ("WHY") in their own words.
    pub stated_why: String,
    /// Observed operating values ("HOW") inferred from the conversation.
    pub observed_how: Vec<String>,
    /// 0-100 coherence between the stated WHY and observed behavior.
    pub coherence_score: u8,
    /// 0-100 consistency/trustworthiness signal.
    pub trust_index: u8,
    pub dominant_conflict_style: ConflictStyle,
    pub eq_snapshot: EqSnapshot,
    #[serde(default)]
    pub key_quotations_and_behavioral_flags: BehavioralFlags,
    pub alignment_summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile() -> PersonaProfile {
        PersonaProfile {
            stated_why: "To help people grow".to_string(),
            observed_how: vec!["mentoring".to_string(), "listening first".to_string()],
            coherence_score: 82,
            trust_index: 77,
            dominant_conflict_style: ConflictStyle::Collaborating,
            eq_snapshot: EqSnapshot {
                self_awareness: "High".to_string(),
                self_management: "Moderate".to_string(),
                social_awareness: "High".to_string(),
                relationship_management: "Moderate".to_string(),
            },
            key_quotations_and_behavioral_flags: BehavioralFlags {
                green_flags: vec!["Consistent purpose across answers".to_string()],
                red_flags: vec![],
            },
            alignment_summary: "Strong alignment between purpose and practice.".to_string(),
        }
    }

    #[test]
    fn conflict_style_serializes_lowercase() {
        let json = serde_json::to_string(&ConflictStyle::Accommodating).unwrap();
        assert_eq!(json, "\"accommodating\"");

        let parsed: ConflictStyle = serde_json::from_str("\"competing\"").unwrap();
        assert_eq!(parsed, ConflictStyle::Competing);
    }

    #[test]
    fn profile_round_trips_camel_case() {
        let profile = sample_profile();
        let json = serde_json::to_string(&profile).unwrap();

        assert!(json.contains("statedWhy"));
        assert!(json.contains("dominantConflictStyle"));
        assert!(json.contains("eqSnapshot"));
        assert!(json.contains("keyQuotationsAndBehavioralFlags"));

        let parsed: PersonaProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, profile);
    }

    #[test]
    fn profile_tolerates_missing_flags() {
        // Analysis backends occasionally omit the flags block entirely.
        let json = r#"{
            "statedWhy": "w",
            "observedHow": [],
            "coherenceScore": 10,
            "trustIndex": 20,
            "dominantConflictStyle": "avoiding",
            "eqSnapshot": {
                "selfAwareness": "Low",
                "selfManagement": "Low",
                "socialAwareness": "Low",
                "relationshipManagement": "Low"
            },
            "alignmentSummary": "s"
        }"#;
        let parsed: PersonaProfile = serde_json::from_str(json).unwrap();
        assert!(parsed.key_quotations_and_behavioral_flags.green_flags.is_empty());
        assert!(parsed.key_quotations_and_behavioral_flags.red_flags.is_empty());
    }
}
