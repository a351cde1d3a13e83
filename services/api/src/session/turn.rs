//! Turn Engine
//!
//! Drives one accepted user turn through the dialogue backend and applies
//! the result to the interview context. The engine is the only component
//! that mutates the context; it receives exclusive ownership for the
//! duration of the turn.

use crate::models::ChatMessage;
use crate::session::arbiter::Submission;
use anyhow::Result;
use persona_core::context::{AnswerValue, InterviewContext};
use persona_core::dialogue::DialogueService;
use tracing::warn;

/// How an accepted turn resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The backend produced a next system message.
    Continue { message: ChatMessage },
    /// The backend signalled no further questions are needed.
    Complete,
    /// The safety ceiling on user turns forced completion.
    ForcedComplete,
}

/// Advances the interview by one user turn.
///
/// The user turn is appended to the history before the dialogue backend is
/// consulted, so the backend always sees the newest utterance as part of the
/// context. The continue/complete decision belongs to the backend alone; the
/// engine enforces only the configured turn ceiling.
pub async fn advance(
    dialogue: &dyn DialogueService,
    max_turns: u32,
    context: &mut InterviewContext,
    submission: &Submission,
) -> Result<TurnOutcome> {
    context.push_user_turn(&submission.text);

    let key = context.next_turn_key();
    context.record_answer(key, AnswerValue::Text(submission.text.clone()))?;
    if let Some(choice) = &submission.choice {
        if let Some(style) = choice.style {
            context.tally_conflict_style(style);
        }
    }

    if context.user_turn_count() as u32 > max_turns {
        warn!(
            user_turns = context.user_turn_count(),
            ceiling = max_turns,
            "turn ceiling exceeded, forcing interview completion"
        );
        return Ok(TurnOutcome::ForcedComplete);
    }

    let reply = dialogue
        .next_turn(&submission.text, context, submission.choice.as_ref())
        .await?;

    if let Some(stage) = reply.stage {
        if !context.set_stage(stage) {
            warn!(?stage, current = ?context.stage, "ignoring backward stage directive");
        }
    }

    if reply.is_complete {
        return Ok(TurnOutcome::Complete);
    }

    context.push_system_turn(&reply.content);
    let message = ChatMessage::system(reply.content, reply.interaction);
    Ok(TurnOutcome::Continue { message })
}
