//! Narration Coordinator
//!
//! Owns the play/stop/interrupt lifecycle of synthesized narration. At most
//! one narration is active at any instant: starting a new one stops the
//! previous one first, and a wake-word barge-in interrupts whatever is
//! playing. Synthesis failures are logged and swallowed; narration must
//! never block the conversation.

use crate::audio;
use crate::models::{ChatMessage, MessageRole, NarrationState};
use crate::session::protocol::{ServerMessage, VoiceSessionState};
use persona_core::speech::SpeechService;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;
use uuid::Uuid;

/// Narration lifecycle transitions, reported back to the session loop which
/// applies them to the conversation log and forwards them to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NarrationEvent {
    pub message_id: Uuid,
    pub state: NarrationState,
}

struct ActiveNarration {
    message_id: Uuid,
    handle: JoinHandle<()>,
}

pub struct NarrationCoordinator {
    speech: Option<Arc<dyn SpeechService>>,
    out_tx: mpsc::Sender<ServerMessage>,
    events_tx: mpsc::Sender<NarrationEvent>,
    delay: Duration,
    active: Option<ActiveNarration>,
}

impl NarrationCoordinator {
    pub fn new(
        speech: Option<Arc<dyn SpeechService>>,
        out_tx: mpsc::Sender<ServerMessage>,
        events_tx: mpsc::Sender<NarrationEvent>,
        delay: Duration,
    ) -> Self {
        Self {
            speech,
            out_tx,
            events_tx,
            delay,
            active: None,
        }
    }

    /// The message currently queued or playing, if any.
    pub fn active_message(&self) -> Option<Uuid> {
        self.active.as_ref().map(|a| a.message_id)
    }

    /// Queues narration for a system turn when session auto-play is on.
    pub async fn auto_narrate(&mut self, message: &ChatMessage, voice: &VoiceSessionState) {
        if message.role != MessageRole::System || !voice.auto_play {
            return;
        }
        self.narrate(message.id, &message.content, voice).await;
    }

    /// Starts narration for a message, stopping any active one first.
    pub async fn narrate(&mut self, message_id: Uuid, text: &str, voice: &VoiceSessionState) {
        if !voice.narration_enabled {
            return;
        }
        let Some(speech) = self.speech.clone() else {
            return;
        };

        self.interrupt().await;
        self.emit(message_id, NarrationState::Queued).await;

        let text = text.to_string();
        let voice_id = voice.voice_id.clone();
        let params = voice.voice_params;
        let delay = self.delay;
        let out_tx = self.out_tx.clone();
        let events_tx = self.events_tx.clone();

        let handle = tokio::spawn(async move {
            // Short pause so the message renders before audio starts.
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            match speech.synthesize(&text, &voice_id, &params).await {
                Ok(bytes) => {
                    let _ = events_tx
                        .send(NarrationEvent {
                            message_id,
                            state: NarrationState::Playing,
                        })
                        .await;
                    for data in audio::frame_clip(&bytes) {
                        if out_tx
                            .send(ServerMessage::NarrationAudio { message_id, data })
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                }
                Err(e) => {
                    warn!(%message_id, error = %e, "narration synthesis failed, skipping");
                }
            }
            let _ = events_tx
                .send(NarrationEvent {
                    message_id,
                    state: NarrationState::Idle,
                })
                .await;
        });

        self.active = Some(ActiveNarration { message_id, handle });
    }

    /// Stops any active narration. Idempotent and safe to call when nothing
    /// is playing; invoked on every barge-in.
    pub async fn interrupt(&mut self) {
        if let Some(active) = self.active.take() {
            active.handle.abort();
            self.emit(active.message_id, NarrationState::Idle).await;
        }
    }

    /// Lets the coordinator observe a delivered event so the active slot is
    /// cleared once its narration reaches `idle` on its own.
    pub fn acknowledge(&mut self, event: &NarrationEvent) {
        if event.state == NarrationState::Idle
            && self.active_message() == Some(event.message_id)
        {
            self.active = None;
        }
    }

    async fn emit(&self, message_id: Uuid, state: NarrationState) {
        let _ = self
            .events_tx
            .send(NarrationEvent { message_id, state })
            .await;
    }
}
