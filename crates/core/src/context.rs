//! Interview Context
//!
//! This module holds the append-only conversational state of one interview:
//! the stage marker, the unique-key answer map, and the ordered turn history.
//! The context carries no orchestration logic of its own; the turn engine is
//! the only component that mutates it.

use crate::profile::ConflictStyle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Well-known answer key holding the running conflict-style tally built up
/// from branching-scenario choices.
pub const CONFLICT_TALLY_KEY: &str = "conflict_style_tally";

/// The phase of the interview, which selects the prompt template the
/// dialogue backend works from.
///
/// Stages advance monotonically except for `Simulation`, the explicit branch
/// stage an interview may enter and leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewStage {
    Intro,
    Probing,
    Simulation,
    Closing,
}

impl InterviewStage {
    fn rank(self) -> u8 {
        match self {
            InterviewStage::Intro => 0,
            InterviewStage::Probing => 1,
            InterviewStage::Simulation => 2,
            InterviewStage::Closing => 3,
        }
    }

    /// The branch stage may be entered and left out of rank order.
    pub fn is_branch(self) -> bool {
        matches!(self, InterviewStage::Simulation)
    }
}

/// Who authored a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    System,
}

/// One entry in the append-only conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub role: TurnRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// A recorded answer value. Free-text and spoken turns record raw text;
/// branching-scenario choices additionally fold their classification tag
/// into the conflict-style tally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerValue {
    Text(String),
    ConflictTally(BTreeMap<ConflictStyle, u32>),
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ContextError {
    #[error("answer key '{0}' already recorded")]
    DuplicateAnswerKey(String),
    #[error("answer key '{0}' not found")]
    UnknownAnswerKey(String),
}

/// The accumulated state of one interview.
///
/// Created at interview start and released at completion or restart; it
/// never survives either. `history` is the sole source of truth for how far
/// the interview has progressed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewContext {
    pub stage: InterviewStage,
    answers: BTreeMap<String, AnswerValue>,
    history: Vec<TurnRecord>,
}

impl Default for InterviewContext {
    fn default() -> Self {
        Self::new()
    }
}

impl InterviewContext {
    pub fn new() -> Self {
        Self {
            stage: InterviewStage::Intro,
            answers: BTreeMap::new(),
            history: Vec::new(),
        }
    }

    /// Appends a user utterance to the history. Entries are never reordered
    /// or truncated; position reflects arrival order.
    pub fn push_user_turn(&mut self, text: impl Into<String>) {
        self.history.push(TurnRecord {
            role: TurnRole::User,
            text: text.into(),
            timestamp: Utc::now(),
        });
    }

    /// Appends a system-authored message to the history.
    pub fn push_system_turn(&mut self, text: impl Into<String>) {
        self.history.push(TurnRecord {
            role: TurnRole::System,
            text: text.into(),
            timestamp: Utc::now(),
        });
    }

    pub fn history(&self) -> &[TurnRecord] {
        &self.history
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn user_turn_count(&self) -> usize {
        self.history
            .iter()
            .filter(|t| t.role == TurnRole::User)
            .count()
    }

    pub fn answers(&self) -> &BTreeMap<String, AnswerValue> {
        &self.answers
    }

    /// The monotonic key the next recorded free-text answer goes under.
    /// Derived from the number of user turns already in the history.
    pub fn next_turn_key(&self) -> String {
        format!("turn_{:02}", self.user_turn_count())
    }

    /// Records a new answer. Keys are unique; writing to an existing key is
    /// an error. Use [`InterviewContext::correct_answer`] to overwrite.
    pub fn record_answer(
        &mut self,
        key: impl Into<String>,
        value: AnswerValue,
    ) -> Result<(), ContextError> {
        let key = key.into();
        if self.answers.contains_key(&key) {
            return Err(ContextError::DuplicateAnswerKey(key));
        }
        self.answers.insert(key, value);
        Ok(())
    }

    /// Explicitly overwrites an already-recorded answer (a correction turn).
    /// Correcting a key that was never recorded is an error.
    pub fn correct_answer(
        &mut self,
        key: &str,
        value: AnswerValue,
    ) -> Result<(), ContextError> {
        match self.answers.get_mut(key) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(ContextError::UnknownAnswerKey(key.to_string())),
        }
    }

    /// Increments the running tally for a branching-scenario classification
    /// tag under [`CONFLICT_TALLY_KEY`].
    pub fn tally_conflict_style(&mut self, style: ConflictStyle) {
        let entry = self
            .answers
            .entry(CONFLICT_TALLY_KEY.to_string())
            .or_insert_with(|| AnswerValue::ConflictTally(BTreeMap::new()));
        if let AnswerValue::ConflictTally(tally) = entry {
            *tally.entry(style).or_insert(0) += 1;
        }
    }

    /// Applies a stage directive from the dialogue backend. Returns whether
    /// the change was applied: moves backward in rank are ignored unless the
    /// branch stage is involved on either side.
    pub fn set_stage(&mut self, next: InterviewStage) -> bool {
        let allowed = next.rank() >= self.stage.rank()
            || next.is_branch()
            || self.stage.is_branch();
        if allowed {
            self.stage = next;
        }
        allowed
    }

    /// Deterministic progress fraction over the expected total number of
    /// history entries, clamped to 1.0.
    pub fn progress(&self, expected_turns: usize) -> f32 {
        if expected_turns == 0 {
            return 1.0;
        }
        (self.history.len() as f32 / expected_turns as f32).min(1.0)
    }
}
