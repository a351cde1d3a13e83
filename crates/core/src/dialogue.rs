//! Dialogue Service
//!
//! The contract with the generative backend that drives the interview: one
//! call per accepted user turn to produce the next system step, and one
//! analysis call at completion to produce the frozen profile. Any transport,
//! model, or parse failure maps to a single error type; callers treat all
//! failures identically.

use crate::context::{InterviewContext, InterviewStage, TurnRole};
use crate::profile::{ConflictStyle, PersonaProfile};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum DialogueError {
    #[error("dialogue backend request failed: {0}")]
    Backend(String),
    #[error("dialogue backend returned an unusable reply: {0}")]
    Malformed(String),
}

impl From<async_openai::error::OpenAIError> for DialogueError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        DialogueError::Backend(err.to_string())
    }
}

/// One labeled option of a branching scenario, tagged with the
/// classification value folded into the conflict-style tally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioChoice {
    pub text: String,
    pub style: ConflictStyle,
}

/// A structured conflict-resolution scenario the interview can branch into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BranchingScenario {
    pub opening_scene: String,
    pub prompt: String,
    pub choices: Vec<ScenarioChoice>,
}

/// What kind of input a system message expects next. A closed set; each
/// variant carries only the fields its mode needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Interaction {
    None,
    FreeText,
    SingleChoice { options: Vec<String> },
    BranchingScenario(BranchingScenario),
}

impl Default for Interaction {
    fn default() -> Self {
        Interaction::FreeText
    }
}

/// The choice a user made on a single-choice or branching-scenario turn,
/// resolved against the offered options before submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceSelection {
    pub index: usize,
    pub text: String,
    pub style: Option<ConflictStyle>,
}

/// One step decided by the dialogue backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DialogueReply {
    pub content: String,
    #[serde(default)]
    pub interaction: Interaction,
    #[serde(default)]
    pub stage: Option<InterviewStage>,
    #[serde(default)]
    pub is_complete: bool,
}

impl DialogueReply {
    /// A plain free-text follow-up question.
    pub fn question(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            interaction: Interaction::FreeText,
            stage: None,
            is_complete: false,
        }
    }

    /// A reply signalling no further questions are needed.
    pub fn completion() -> Self {
        Self {
            content: String::new(),
            interaction: Interaction::None,
            stage: Some(InterviewStage::Closing),
            is_complete: true,
        }
    }
}

/// The generative backend driving the interview.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DialogueService: Send + Sync {
    /// Decides the next step after a user turn. The newest utterance is
    /// already the final entry of `context.history()` when this is called.
    async fn next_turn<'a>(
        &'a self,
        user_text: &'a str,
        context: &'a InterviewContext,
        choice: Option<&'a ChoiceSelection>,
    ) -> Result<DialogueReply, DialogueError>;

    /// Produces the frozen motivational profile for a finished interview.
    async fn analyze(&self, context: &InterviewContext)
    -> Result<PersonaProfile, DialogueError>;
}

// --- Live implementation -------------------------------------------------

/// `DialogueService` for any OpenAI-compatible chat-completion endpoint.
///
/// The model is instructed to answer with a single JSON object; replies that
/// fail to parse degrade to a plain free-text question rather than erroring,
/// so a chatty model cannot stall the interview.
pub struct OpenAICompatibleDialogue {
    client: Client<OpenAIConfig>,
    model: String,
    prompts: HashMap<String, String>,
}

impl OpenAICompatibleDialogue {
    /// # Arguments
    ///
    /// * `config` - API key and base URL for the endpoint.
    /// * `model` - Chat model identifier (e.g. "gpt-4o").
    /// * `prompts` - Template map; must contain `"interviewer"` and
    ///   `"analysis"` keys.
    pub fn new(config: OpenAIConfig, model: String, prompts: HashMap<String, String>) -> Self {
        Self {
            client: Client::with_config(config),
            model,
            prompts,
        }
    }

    fn prompt(&self, key: &str) -> Result<&str, DialogueError> {
        self.prompts
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| DialogueError::Malformed(format!("missing prompt template '{key}'")))
    }

    fn history_messages(
        context: &InterviewContext,
    ) -> Result<Vec<ChatCompletionRequestMessage>, DialogueError> {
        let mut messages = Vec::with_capacity(context.history_len());
        for turn in context.history() {
            let msg = match turn.role {
                TurnRole::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(turn.text.clone())
                    .build()?
                    .into(),
                TurnRole::System => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(turn.text.clone())
                    .build()?
                    .into(),
            };
            messages.push(msg);
        }
        Ok(messages)
    }

    async fn complete(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
    ) -> Result<String, DialogueError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()?;
        let response = self.client.chat().create(request).await?;
        response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| DialogueError::Malformed("empty completion".to_string()))
    }
}

#[async_trait]
impl DialogueService for OpenAICompatibleDialogue {
    async fn next_turn<'a>(
        &'a self,
        _user_text: &'a str,
        context: &'a InterviewContext,
        choice: Option<&'a ChoiceSelection>,
    ) -> Result<DialogueReply, DialogueError> {
        let answers_json = serde_json::to_string_pretty(context.answers())
            .map_err(|e| DialogueError::Malformed(e.to_string()))?;
        let choice_note = match choice {
            Some(c) => format!(
                "\nThe latest user turn selected option {} ({}){}.",
                c.index,
                c.text,
                c.style
                    .map(|s| format!(", classified as '{s}'"))
                    .unwrap_or_default()
            ),
            None => String::new(),
        };
        let system = format!(
            "{}\n\n# Current Interview State\n\nStage: {:?}\nRecorded answers:\n```json\n{}\n```{}",
            self.prompt("interviewer")?,
            context.stage,
            answers_json,
            choice_note,
        );

        let mut messages: Vec<ChatCompletionRequestMessage> =
            vec![ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()?
                .into()];
        messages.extend(Self::history_messages(context)?);

        let content = self.complete(messages).await?;
        Ok(parse_reply(&content))
    }

    async fn analyze(
        &self,
        context: &InterviewContext,
    ) -> Result<PersonaProfile, DialogueError> {
        let transcript = context
            .history()
            .iter()
            .map(|t| {
                let who = match t.role {
                    TurnRole::User => "Candidate",
                    TurnRole::System => "Interviewer",
                };
                format!("{who}: {}", t.text)
            })
            .collect::<Vec<_>>()
            .join("\n");
        let answers_json = serde_json::to_string_pretty(context.answers())
            .map_err(|e| DialogueError::Malformed(e.to_string()))?;

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.prompt("analysis")?.to_string())
                .build()?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(format!(
                    "# Transcript\n{transcript}\n\n# Recorded answers\n```json\n{answers_json}\n```"
                ))
                .build()?
                .into(),
        ];

        let content = self.complete(messages).await?;
        let json = extract_json_object(&content).unwrap_or(&content);
        serde_json::from_str(json).map_err(|e| DialogueError::Malformed(e.to_string()))
    }
}

/// Parses a model reply into a [`DialogueReply`], degrading to a free-text
/// question when the JSON contract is not honored.
fn parse_reply(content: &str) -> DialogueReply {
    if let Some(json) = extract_json_object(content) {
        match serde_json::from_str::<DialogueReply>(json) {
            Ok(reply) => return reply,
            Err(e) => warn!(error = %e, "discarding unparseable structured reply"),
        }
    }
    DialogueReply::question(content.trim())
}

/// Extracts the outermost JSON object from a reply, tolerating markdown
/// fences and prose around it.
fn extract_json_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

// --- Scripted implementation ---------------------------------------------

/// A deterministic `DialogueService` for development and integration
/// testing: replays a fixed sequence of replies, then signals completion.
pub struct ScriptedDialogue {
    replies: Mutex<VecDeque<DialogueReply>>,
    analysis: Option<PersonaProfile>,
    fail: bool,
}

impl ScriptedDialogue {
    pub fn new(replies: Vec<DialogueReply>, analysis: Option<PersonaProfile>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            analysis,
            fail: false,
        }
    }

    /// A backend whose every call fails, for exercising degraded paths.
    pub fn failing() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            analysis: None,
            fail: true,
        }
    }
}

#[async_trait]
impl DialogueService for ScriptedDialogue {
    async fn next_turn<'a>(
        &'a self,
        _user_text: &'a str,
        _context: &'a InterviewContext,
        _choice: Option<&'a ChoiceSelection>,
    ) -> Result<DialogueReply, DialogueError> {
        if self.fail {
            return Err(DialogueError::Backend("scripted failure".to_string()));
        }
        let next = self.replies.lock().expect("replies lock").pop_front();
        Ok(next.unwrap_or_else(DialogueReply::completion))
    }

    async fn analyze(
        &self,
        _context: &InterviewContext,
    ) -> Result<PersonaProfile, DialogueError> {
        if self.fail {
            return Err(DialogueError::Backend("scripted failure".to_string()));
        }
        self.analysis
            .clone()
            .ok_or_else(|| DialogueError::Backend("no profile scripted".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reply_accepts_the_json_contract() {
        let reply = parse_reply(
            r#"{"content": "Which matters more?", "interaction": {"mode": "single_choice", "options": ["Impact", "Stability"]}, "stage": "probing", "is_complete": false}"#,
        );
        assert_eq!(reply.content, "Which matters more?");
        assert_eq!(
            reply.interaction,
            Interaction::SingleChoice {
                options: vec!["Impact".to_string(), "Stability".to_string()]
            }
        );
        assert_eq!(reply.stage, Some(InterviewStage::Probing));
        assert!(!reply.is_complete);
    }

    #[test]
    fn parse_reply_handles_fenced_json() {
        let reply = parse_reply(
            "Here you go:\n```json\n{\"content\": \"Tell me more.\", \"is_complete\": false}\n```",
        );
        assert_eq!(reply.content, "Tell me more.");
        assert_eq!(reply.interaction, Interaction::FreeText);
    }

    #[test]
    fn parse_reply_degrades_to_free_text() {
        let reply = parse_reply("What energizes you on a normal Tuesday?");
        assert_eq!(reply.content, "What energizes you on a normal Tuesday?");
        assert_eq!(reply.interaction, Interaction::FreeText);
        assert!(!reply.is_complete);
    }

    #[test]
    fn branching_scenario_round_trips() {
        let reply: DialogueReply = serde_json::from_str(
            r#"{
                "content": "A teammate disagrees with your plan in front of the group.",
                "interaction": {
                    "mode": "branching_scenario",
                    "opening_scene": "Sprint planning, tensions high.",
                    "prompt": "What do you do first?",
                    "choices": [
                        {"text": "Hold your position", "style": "competing"},
                        {"text": "Invite them to co-design", "style": "collaborating"},
                        {"text": "Let it go for now", "style": "accommodating"}
                    ]
                },
                "is_complete": false
            }"#,
        )
        .unwrap();

        let Interaction::BranchingScenario(scenario) = reply.interaction else {
            panic!("expected a branching scenario");
        };
        assert_eq!(scenario.choices.len(), 3);
        assert_eq!(scenario.choices[2].style, ConflictStyle::Accommodating);
    }

    #[tokio::test]
    async fn scripted_dialogue_replays_then_completes() {
        let service = ScriptedDialogue::new(vec![DialogueReply::question("Q1")], None);
        let ctx = InterviewContext::new();

        let first = service.next_turn("hi", &ctx, None).await.unwrap();
        assert_eq!(first.content, "Q1");
        assert!(!first.is_complete);

        let second = service.next_turn("more", &ctx, None).await.unwrap();
        assert!(second.is_complete);
    }

    #[tokio::test]
    async fn failing_dialogue_fails_both_entry_points() {
        let service = ScriptedDialogue::failing();
        let ctx = InterviewContext::new();
        assert!(service.next_turn("hi", &ctx, None).await.is_err());
        assert!(service.analyze(&ctx).await.is_err());
    }
}
