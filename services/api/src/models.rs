//! API and Database Models
//!
//! Data structures shared between the WebSocket session, the REST surface
//! (`utoipa` documented), and the `sqlx` persistence layer.

use chrono::{DateTime, Utc};
use persona_core::dialogue::Interaction;
use persona_core::profile::PersonaProfile;
use persona_core::scoring::AssessmentScore;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Author of a message in the user-visible conversation log.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    System,
    /// Transient status lines (e.g. analysis progress); never narrated.
    Meta,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::System => write!(f, "system"),
            MessageRole::Meta => write!(f, "meta"),
        }
    }
}

/// Narration lifecycle of one message. Only the narration coordinator moves
/// a message through these states.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NarrationState {
    #[default]
    Idle,
    Queued,
    Playing,
}

/// One entry of the user-visible conversation log.
///
/// Ids are random v4 UUIDs; both the narration coordinator and the client
/// index by id, so uniqueness within a session is load-bearing.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub interaction: Interaction,
    pub narration_state: NarrationState,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: MessageRole, content: impl Into<String>, interaction: Interaction) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            interaction,
            narration_state: NarrationState::Idle,
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content, Interaction::None)
    }

    pub fn system(content: impl Into<String>, interaction: Interaction) -> Self {
        Self::new(MessageRole::System, content, interaction)
    }

    pub fn meta(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Meta, content, Interaction::None)
    }

    /// Whether this message offers options a choice submission can resolve
    /// against.
    pub fn is_interactive_prompt(&self) -> bool {
        matches!(
            self.interaction,
            Interaction::SingleChoice { .. } | Interaction::BranchingScenario(_)
        )
    }
}

/// A persisted assessment row.
#[derive(Serialize, Deserialize, ToSchema, FromRow, Debug, Clone)]
pub struct AssessmentRecord {
    #[schema(value_type = String, format = Uuid)]
    pub id: Uuid,
    pub user_id: String,
    #[schema(value_type = Object)]
    pub profile: Json<PersonaProfile>,
    #[schema(value_type = Object)]
    pub score: Json<AssessmentScore>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}
