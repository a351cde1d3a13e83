//! Completion Handoff
//!
//! The one-time transition from open interview to frozen, scored, persisted
//! result. The context is frozen before this runs (the arbiter's analysis
//! phase rejects any submission arriving meanwhile). A store failure is
//! logged and the computed result is still returned; an analysis failure
//! produces no result and leaves the context open for retry.

use crate::db::AssessmentStore;
use persona_core::context::InterviewContext;
use persona_core::dialogue::{DialogueError, DialogueService};
use persona_core::scoring::{AssessmentResult, calculate_score};
use tracing::{error, info};

pub async fn finalize(
    dialogue: &dyn DialogueService,
    store: &dyn AssessmentStore,
    user_id: &str,
    context: &InterviewContext,
) -> Result<AssessmentResult, DialogueError> {
    let profile = dialogue.analyze(context).await?;
    let score = calculate_score(Some(&profile), None);
    info!(total = score.total, level = %score.level, "assessment scored");

    if let Err(e) = store.save(user_id, &profile, &score).await {
        // Non-fatal: the result is still shown; persistence can be retried
        // out of band.
        error!(error = ?e, "failed to persist assessment");
    }

    Ok(AssessmentResult { profile, score })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MockAssessmentStore;
    use anyhow::anyhow;
    use persona_core::dialogue::ScriptedDialogue;
    use persona_core::profile::{ConflictStyle, EqSnapshot, PersonaProfile};
    use persona_core::scoring::{PERSONA_CAP, ScoreLevel};

    fn profile() -> PersonaProfile {
        PersonaProfile {
            stated_why: "To help people grow".to_string(),
            observed_how: vec!["coaching".to_string()],
            coherence_score: 80,
            trust_index: 75,
            dominant_conflict_style: ConflictStyle::Collaborating,
            eq_snapshot: EqSnapshot {
                self_awareness: "High".to_string(),
                self_management: "High".to_string(),
                social_awareness: "High".to_string(),
                relationship_management: "High".to_string(),
            },
            key_quotations_and_behavioral_flags: Default::default(),
            alignment_summary: "Aligned".to_string(),
        }
    }

    #[tokio::test]
    async fn success_scores_and_persists_once() {
        let dialogue = ScriptedDialogue::new(vec![], Some(profile()));
        let mut store = MockAssessmentStore::new();
        store
            .expect_save()
            .times(1)
            .withf(|user_id, _, score| user_id == "user-1" && score.total == PERSONA_CAP)
            .returning(|_, _, _| Ok(()));

        let result = finalize(&dialogue, &store, "user-1", &InterviewContext::new())
            .await
            .unwrap();

        assert_eq!(result.profile, profile());
        assert_eq!(result.score.total, PERSONA_CAP);
        assert_eq!(result.score.level, ScoreLevel::Emerging);
    }

    #[tokio::test]
    async fn persistence_failure_is_not_fatal() {
        let dialogue = ScriptedDialogue::new(vec![], Some(profile()));
        let mut store = MockAssessmentStore::new();
        store
            .expect_save()
            .times(1)
            .returning(|_, _, _| Err(anyhow!("database unavailable")));

        let result = finalize(&dialogue, &store, "user-1", &InterviewContext::new()).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn analysis_failure_produces_no_result_and_skips_the_store() {
        let dialogue = ScriptedDialogue::failing();
        let mut store = MockAssessmentStore::new();
        store.expect_save().times(0);

        let result = finalize(&dialogue, &store, "user-1", &InterviewContext::new()).await;

        assert!(result.is_err());
    }
}
