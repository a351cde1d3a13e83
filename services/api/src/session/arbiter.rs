//! Input Arbiter
//!
//! Serializes the three input sources (typed submit, recognized speech,
//! choice click) into a single ordered stream of user turns. One phase value
//! answers "can a new submission be accepted"; it is held from acceptance
//! until the resulting context mutation is fully applied, which is the sole
//! ordering primitive of the session.

use crate::models::ChatMessage;
use persona_core::dialogue::{ChoiceSelection, Interaction};

/// Lifecycle of the session's single processing slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    TurnInFlight,
    Analyzing,
    Complete,
}

/// Where a submission came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionKind {
    Typed,
    RecognizedSpeech,
    Choice,
}

/// An accepted user turn, ready for the turn engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub text: String,
    pub kind: SubmissionKind,
    pub choice: Option<ChoiceSelection>,
}

/// Why a submission was not accepted. Concurrency violations are surfaced
/// to the user; invalid input is dropped quietly.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Rejection {
    #[error("please wait, I'm still working on your previous answer")]
    TurnInFlight,
    #[error("your interview is being analyzed")]
    Analyzing,
    #[error("this interview has already concluded")]
    SessionComplete,
    #[error("no interview is in progress")]
    NotStarted,
    #[error("empty submission")]
    EmptyInput,
    #[error("choice index {0} does not match an offered option")]
    InvalidChoice(usize),
}

impl Rejection {
    /// Invalid input is ignored without user-visible feedback.
    pub fn is_silent(&self) -> bool {
        matches!(self, Rejection::EmptyInput | Rejection::InvalidChoice(_))
    }
}

#[derive(Debug)]
pub struct InputArbiter {
    phase: SessionPhase,
}

impl Default for InputArbiter {
    fn default() -> Self {
        Self::new()
    }
}

impl InputArbiter {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Idle,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    fn guard_idle(&self) -> Result<(), Rejection> {
        match self.phase {
            SessionPhase::Idle => Ok(()),
            SessionPhase::TurnInFlight => Err(Rejection::TurnInFlight),
            SessionPhase::Analyzing => Err(Rejection::Analyzing),
            SessionPhase::Complete => Err(Rejection::SessionComplete),
        }
    }

    /// Accepts a typed or recognized-speech submission, taking the in-flight
    /// slot. Whitespace-only input is rejected without consuming the slot.
    pub fn submit_text(
        &mut self,
        raw: &str,
        kind: SubmissionKind,
    ) -> Result<Submission, Rejection> {
        self.guard_idle()?;
        let text = raw.trim();
        if text.is_empty() {
            return Err(Rejection::EmptyInput);
        }
        self.phase = SessionPhase::TurnInFlight;
        Ok(Submission {
            text: text.to_string(),
            kind,
            choice: None,
        })
    }

    /// Accepts a choice submission, resolving the index against the options
    /// the latest interactive prompt offered. A branching-scenario choice
    /// carries its classification tag.
    pub fn submit_choice(
        &mut self,
        prompt: Option<&ChatMessage>,
        index: usize,
    ) -> Result<Submission, Rejection> {
        self.guard_idle()?;
        let choice = prompt
            .and_then(|p| resolve_choice(&p.interaction, index))
            .ok_or(Rejection::InvalidChoice(index))?;
        self.phase = SessionPhase::TurnInFlight;
        Ok(Submission {
            text: choice.text.clone(),
            kind: SubmissionKind::Choice,
            choice: Some(choice),
        })
    }

    /// Returns the slot after a turn resolved with a next question or with a
    /// recoverable failure.
    pub fn release(&mut self) {
        if self.phase == SessionPhase::TurnInFlight {
            self.phase = SessionPhase::Idle;
        }
    }

    /// Transitions into analysis after a terminal turn outcome. Rejected if
    /// analysis already started or finished, so finalize runs at most once.
    pub fn begin_analysis(&mut self) -> Result<(), Rejection> {
        match self.phase {
            SessionPhase::TurnInFlight => {
                self.phase = SessionPhase::Analyzing;
                Ok(())
            }
            SessionPhase::Analyzing => Err(Rejection::Analyzing),
            SessionPhase::Complete => Err(Rejection::SessionComplete),
            SessionPhase::Idle => Err(Rejection::NotStarted),
        }
    }

    /// Reopens the session after a failed analysis; the context stays open
    /// so the user is not forced to restart.
    pub fn fail_analysis(&mut self) {
        if self.phase == SessionPhase::Analyzing {
            self.phase = SessionPhase::Idle;
        }
    }

    /// Marks the session terminal after a successful analysis.
    pub fn complete(&mut self) {
        self.phase = SessionPhase::Complete;
    }
}

fn resolve_choice(interaction: &Interaction, index: usize) -> Option<ChoiceSelection> {
    match interaction {
        Interaction::SingleChoice { options } => options.get(index).map(|text| ChoiceSelection {
            index,
            text: text.clone(),
            style: None,
        }),
        Interaction::BranchingScenario(scenario) => {
            scenario.choices.get(index).map(|c| ChoiceSelection {
                index,
                text: c.text.clone(),
                style: Some(c.style),
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use persona_core::dialogue::{BranchingScenario, ScenarioChoice};
    use persona_core::profile::ConflictStyle;

    fn scenario_prompt() -> ChatMessage {
        ChatMessage::system(
            "A teammate pushes back hard in front of the group.",
            Interaction::BranchingScenario(BranchingScenario {
                opening_scene: "Sprint planning".to_string(),
                prompt: "What do you do first?".to_string(),
                choices: vec![
                    ScenarioChoice {
                        text: "Hold your position".to_string(),
                        style: ConflictStyle::Competing,
                    },
                    ScenarioChoice {
                        text: "Find middle ground".to_string(),
                        style: ConflictStyle::Compromising,
                    },
                    ScenarioChoice {
                        text: "Give them the win".to_string(),
                        style: ConflictStyle::Accommodating,
                    },
                ],
            }),
        )
    }

    #[test]
    fn only_the_first_of_interleaved_submissions_is_accepted() {
        let mut arbiter = InputArbiter::new();

        let first = arbiter.submit_text("typed answer", SubmissionKind::Typed);
        assert!(first.is_ok());
        assert_eq!(arbiter.phase(), SessionPhase::TurnInFlight);

        // Everything arriving while the turn is in flight is a no-op.
        assert_eq!(
            arbiter.submit_text("spoken answer", SubmissionKind::RecognizedSpeech),
            Err(Rejection::TurnInFlight)
        );
        assert_eq!(
            arbiter.submit_choice(Some(&scenario_prompt()), 0),
            Err(Rejection::TurnInFlight)
        );

        arbiter.release();
        assert!(
            arbiter
                .submit_text("next answer", SubmissionKind::Typed)
                .is_ok()
        );
    }

    #[test]
    fn whitespace_input_does_not_consume_the_slot() {
        let mut arbiter = InputArbiter::new();
        assert_eq!(
            arbiter.submit_text("   \n\t ", SubmissionKind::Typed),
            Err(Rejection::EmptyInput)
        );
        assert_eq!(arbiter.phase(), SessionPhase::Idle);
    }

    #[test]
    fn choice_resolution_attaches_the_classification_tag() {
        let mut arbiter = InputArbiter::new();
        let prompt = scenario_prompt();

        let submission = arbiter.submit_choice(Some(&prompt), 2).unwrap();
        assert_eq!(submission.kind, SubmissionKind::Choice);
        assert_eq!(submission.text, "Give them the win");
        let choice = submission.choice.unwrap();
        assert_eq!(choice.index, 2);
        assert_eq!(choice.style, Some(ConflictStyle::Accommodating));
    }

    #[test]
    fn single_choice_resolution_has_no_tag() {
        let mut arbiter = InputArbiter::new();
        let prompt = ChatMessage::system(
            "Pick one.",
            Interaction::SingleChoice {
                options: vec!["Impact".to_string(), "Stability".to_string()],
            },
        );

        let submission = arbiter.submit_choice(Some(&prompt), 1).unwrap();
        assert_eq!(submission.text, "Stability");
        assert_eq!(submission.choice.unwrap().style, None);
    }

    #[test]
    fn malformed_choice_index_is_rejected_without_consuming_the_slot() {
        let mut arbiter = InputArbiter::new();
        let prompt = scenario_prompt();

        assert_eq!(
            arbiter.submit_choice(Some(&prompt), 9),
            Err(Rejection::InvalidChoice(9))
        );
        assert_eq!(
            arbiter.submit_choice(None, 0),
            Err(Rejection::InvalidChoice(0))
        );
        assert_eq!(arbiter.phase(), SessionPhase::Idle);
    }

    #[test]
    fn analysis_begins_at_most_once() {
        let mut arbiter = InputArbiter::new();
        arbiter.submit_text("final answer", SubmissionKind::Typed).unwrap();

        assert!(arbiter.begin_analysis().is_ok());
        assert_eq!(arbiter.begin_analysis(), Err(Rejection::Analyzing));
        assert_eq!(
            arbiter.submit_text("too late", SubmissionKind::Typed),
            Err(Rejection::Analyzing)
        );

        arbiter.complete();
        assert_eq!(arbiter.begin_analysis(), Err(Rejection::SessionComplete));
        assert_eq!(
            arbiter.submit_text("still too late", SubmissionKind::Typed),
            Err(Rejection::SessionComplete)
        );
    }

    #[test]
    fn failed_analysis_reopens_the_session() {
        let mut arbiter = InputArbiter::new();
        arbiter.submit_text("final answer", SubmissionKind::Typed).unwrap();
        arbiter.begin_analysis().unwrap();

        arbiter.fail_analysis();
        assert_eq!(arbiter.phase(), SessionPhase::Idle);
        assert!(arbiter.submit_text("retry", SubmissionKind::Typed).is_ok());
    }
}
