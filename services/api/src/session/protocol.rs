//! Defines the WebSocket message protocol between the client and the
//! interview session.

use crate::config::Config;
use crate::models::{ChatMessage, NarrationState};
use persona_core::profile::PersonaProfile;
use persona_core::scoring::AssessmentScore;
use persona_core::speech::VoiceParams;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session-lifetime voice configuration. Initialized once at handshake from
/// the service configuration; mutated only by the explicit toggle messages.
#[derive(Debug, Clone, Serialize)]
pub struct VoiceSessionState {
    pub narration_enabled: bool,
    pub auto_play: bool,
    pub voice_id: String,
    pub voice_params: VoiceParams,
    pub wake_word_enabled: bool,
}

impl VoiceSessionState {
    pub fn new(config: &Config, speech_available: bool) -> Self {
        Self {
            narration_enabled: speech_available,
            auto_play: speech_available,
            voice_id: config.voice_id.clone(),
            voice_params: VoiceParams::default(),
            wake_word_enabled: true,
        }
    }
}

/// Messages sent from the client to the server.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Identifies the user. This must be the first message.
    Init { user_id: String },
    /// Begins a fresh interview (or restarts after completion).
    Start,
    /// A typed submission.
    UserMessage { text: String },
    /// Selection of an option offered by the latest interactive prompt.
    Choice { index: usize },
    /// Replay narration for a previously received system message.
    Narrate { message_id: Uuid },
    SetVoiceEnabled { enabled: bool },
    SetAutoPlay { enabled: bool },
    SetWakeWordEnabled { enabled: bool },

    // Acoustic events forwarded from a client-side recognizer. They feed the
    // same ordered channel as a native backend's callbacks would.
    WakeWordDetected,
    ListeningChanged { listening: bool },
    SpeechRecognized { transcript: String },
    RecognizerError { message: String },
}

/// Messages sent from the server to the client.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirms successful session initialization.
    Initialized {
        session_id: Uuid,
        voice: VoiceSessionState,
    },
    /// A new entry of the conversation log, with the deterministic progress
    /// fraction derived from the interview history length.
    Turn { message: ChatMessage, progress: f32 },
    /// A submission was not accepted (e.g. a reply is still in flight).
    Rejected { reason: String },
    /// Narration lifecycle transition for one message.
    Narration {
        message_id: Uuid,
        state: NarrationState,
    },
    /// A fragment of synthesized narration audio (base64).
    NarrationAudio { message_id: Uuid, data: String },
    /// Wake-word listening status for the session.
    Listening { listening: bool, status: String },
    /// The interview concluded and analysis is running.
    AnalysisStarted { forced: bool },
    AnalysisComplete {
        profile: PersonaProfile,
        score: AssessmentScore,
    },
    /// Analysis failed; the interview stays open for retry.
    AnalysisFailed { message: String },
    /// Reports a fatal error to the client.
    Error { message: String },
}

impl PartialEq for VoiceSessionState {
    fn eq(&self, other: &Self) -> bool {
        self.narration_enabled == other.narration_enabled
            && self.auto_play == other.auto_play
            && self.voice_id == other.voice_id
            && self.wake_word_enabled == other.wake_word_enabled
    }
}
