//! Wake-Word Bridge
//!
//! Translates acoustic events ("wake phrase heard", "utterance transcribed")
//! into arbiter submissions and narration interrupts. Events arrive through
//! a bounded channel drained by the session loop, so acoustic callbacks from
//! any thread are serialized into arrival order with everything else. The
//! bridge itself holds no polling loop; every transition is driven by the
//! backend's callbacks.

use persona_core::wake::WakeWordCallbacks;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Channel capacity for acoustic events. Recognizers emit at human speech
/// cadence; anything beyond this means the session loop has stalled.
const ACOUSTIC_CHANNEL_CAPACITY: usize = 32;

/// One event from the acoustic backend, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum AcousticEvent {
    WakeDetected,
    ListeningChanged(bool),
    Transcript(String),
    Error(String),
}

/// Bridge state machine, driven entirely by the backend's callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Disabled,
    Idle,
    Listening,
    Transcribing,
}

/// What the session loop should do in response to an acoustic event.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeAction {
    /// Barge-in: the user talking over the assistant always wins.
    InterruptNarration,
    /// A wake before the interview begins starts it.
    StartInterview,
    /// Forward a transcribed utterance as a recognized-speech submission.
    SubmitTranscript(String),
    /// Update the session-visible listening flag and status line.
    UpdateListening { listening: bool, status: String },
}

pub struct WakeWordBridge {
    state: BridgeState,
    tx: mpsc::Sender<AcousticEvent>,
}

impl WakeWordBridge {
    pub fn new(enabled: bool) -> (Self, mpsc::Receiver<AcousticEvent>) {
        let (tx, rx) = mpsc::channel(ACOUSTIC_CHANNEL_CAPACITY);
        let bridge = Self {
            state: if enabled {
                BridgeState::Idle
            } else {
                BridgeState::Disabled
            },
            tx,
        };
        (bridge, rx)
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        matches!(self.state, BridgeState::Listening | BridgeState::Transcribing)
    }

    /// Enqueues an event forwarded from a remote recognizer (the client side
    /// of the socket). Dropped with a warning if the session loop is stalled
    /// and the buffer is full.
    pub fn forward(&self, event: AcousticEvent) {
        if self.tx.try_send(event).is_err() {
            warn!("acoustic event buffer full, dropping event");
        }
    }

    /// Builds the callback set a native push-based backend registers with.
    /// Each callback enqueues into the same ordered channel.
    pub fn callbacks(&self) -> WakeWordCallbacks {
        let wake = self.tx.clone();
        let listening = self.tx.clone();
        let not_listening = self.tx.clone();
        let recognized = self.tx.clone();
        let error = self.tx.clone();
        WakeWordCallbacks {
            on_wake_word_detected: Box::new(move || {
                let _ = wake.try_send(AcousticEvent::WakeDetected);
            }),
            on_listening: Box::new(move || {
                let _ = listening.try_send(AcousticEvent::ListeningChanged(true));
            }),
            on_not_listening: Box::new(move || {
                let _ = not_listening.try_send(AcousticEvent::ListeningChanged(false));
            }),
            on_speech_recognized: Box::new(move |transcript| {
                let _ = recognized.try_send(AcousticEvent::Transcript(transcript));
            }),
            on_error: Box::new(move |message| {
                let _ = error.try_send(AcousticEvent::Error(message));
            }),
        }
    }

    /// Enables or disables wake-word handling. Disabling clears the
    /// session-visible listening status.
    pub fn set_enabled(&mut self, enabled: bool) -> Vec<BridgeAction> {
        match (enabled, self.state) {
            (false, _) => {
                self.state = BridgeState::Disabled;
                vec![BridgeAction::UpdateListening {
                    listening: false,
                    status: String::new(),
                }]
            }
            (true, BridgeState::Disabled) => {
                self.state = BridgeState::Idle;
                vec![]
            }
            (true, _) => vec![],
        }
    }

    /// Maps one acoustic event to session actions. While disabled, every
    /// event is ignored.
    pub fn handle(
        &mut self,
        event: AcousticEvent,
        interview_active: bool,
        wake_phrase: &str,
    ) -> Vec<BridgeAction> {
        if self.state == BridgeState::Disabled {
            debug!(?event, "wake-word bridge disabled, ignoring acoustic event");
            return vec![];
        }

        match event {
            AcousticEvent::WakeDetected => {
                self.state = BridgeState::Transcribing;
                let mut actions = vec![
                    BridgeAction::InterruptNarration,
                    BridgeAction::UpdateListening {
                        listening: true,
                        status: "Listening... say your message now".to_string(),
                    },
                ];
                if !interview_active {
                    actions.push(BridgeAction::StartInterview);
                }
                actions
            }
            AcousticEvent::ListeningChanged(true) => {
                self.state = BridgeState::Listening;
                vec![BridgeAction::UpdateListening {
                    listening: true,
                    status: format!("Listening for \"{wake_phrase}\"..."),
                }]
            }
            AcousticEvent::ListeningChanged(false) => {
                self.state = BridgeState::Idle;
                vec![BridgeAction::UpdateListening {
                    listening: false,
                    status: String::new(),
                }]
            }
            AcousticEvent::Transcript(transcript) => {
                self.state = BridgeState::Listening;
                let mut actions = vec![BridgeAction::UpdateListening {
                    listening: true,
                    status: String::new(),
                }];
                let trimmed = transcript.trim();
                if interview_active && !trimmed.is_empty() {
                    actions.push(BridgeAction::SubmitTranscript(trimmed.to_string()));
                }
                actions
            }
            AcousticEvent::Error(message) => {
                self.state = BridgeState::Idle;
                vec![BridgeAction::UpdateListening {
                    listening: false,
                    status: format!("Recognition error: {message}"),
                }]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHRASE: &str = "hey sensa";

    #[test]
    fn disabled_bridge_ignores_everything() {
        let (mut bridge, _rx) = WakeWordBridge::new(false);
        assert_eq!(bridge.state(), BridgeState::Disabled);

        assert!(bridge.handle(AcousticEvent::WakeDetected, true, PHRASE).is_empty());
        assert!(
            bridge
                .handle(AcousticEvent::Transcript("hello".to_string()), true, PHRASE)
                .is_empty()
        );
        assert_eq!(bridge.state(), BridgeState::Disabled);
    }

    #[test]
    fn wake_interrupts_and_starts_an_inactive_interview() {
        let (mut bridge, _rx) = WakeWordBridge::new(true);

        let actions = bridge.handle(AcousticEvent::WakeDetected, false, PHRASE);
        assert_eq!(actions[0], BridgeAction::InterruptNarration);
        assert!(actions.contains(&BridgeAction::StartInterview));
        assert_eq!(bridge.state(), BridgeState::Transcribing);
        assert!(bridge.is_listening());
    }

    #[test]
    fn wake_during_an_active_interview_only_barges_in() {
        let (mut bridge, _rx) = WakeWordBridge::new(true);

        let actions = bridge.handle(AcousticEvent::WakeDetected, true, PHRASE);
        assert_eq!(actions[0], BridgeAction::InterruptNarration);
        assert!(!actions.contains(&BridgeAction::StartInterview));
    }

    #[test]
    fn transcripts_submit_only_when_active_and_non_empty() {
        let (mut bridge, _rx) = WakeWordBridge::new(true);
        bridge.handle(AcousticEvent::WakeDetected, true, PHRASE);

        let actions = bridge.handle(
            AcousticEvent::Transcript("  I like hard problems  ".to_string()),
            true,
            PHRASE,
        );
        assert!(
            actions.contains(&BridgeAction::SubmitTranscript(
                "I like hard problems".to_string()
            ))
        );

        let actions = bridge.handle(AcousticEvent::Transcript("   ".to_string()), true, PHRASE);
        assert!(
            !actions
                .iter()
                .any(|a| matches!(a, BridgeAction::SubmitTranscript(_)))
        );

        let actions = bridge.handle(
            AcousticEvent::Transcript("hello".to_string()),
            false,
            PHRASE,
        );
        assert!(
            !actions
                .iter()
                .any(|a| matches!(a, BridgeAction::SubmitTranscript(_)))
        );
    }

    #[test]
    fn listening_callbacks_drive_the_state_machine() {
        let (mut bridge, _rx) = WakeWordBridge::new(true);
        assert_eq!(bridge.state(), BridgeState::Idle);

        bridge.handle(AcousticEvent::ListeningChanged(true), false, PHRASE);
        assert_eq!(bridge.state(), BridgeState::Listening);

        bridge.handle(AcousticEvent::ListeningChanged(false), false, PHRASE);
        assert_eq!(bridge.state(), BridgeState::Idle);
    }

    #[test]
    fn errors_recover_to_idle_without_stopping_the_interview() {
        let (mut bridge, _rx) = WakeWordBridge::new(true);
        bridge.handle(AcousticEvent::WakeDetected, true, PHRASE);

        let actions = bridge.handle(AcousticEvent::Error("mic lost".to_string()), true, PHRASE);
        assert_eq!(bridge.state(), BridgeState::Idle);
        assert_eq!(
            actions,
            vec![BridgeAction::UpdateListening {
                listening: false,
                status: "Recognition error: mic lost".to_string(),
            }]
        );
    }

    #[test]
    fn toggling_moves_between_disabled_and_idle() {
        let (mut bridge, _rx) = WakeWordBridge::new(true);

        let actions = bridge.set_enabled(false);
        assert_eq!(bridge.state(), BridgeState::Disabled);
        assert_eq!(
            actions,
            vec![BridgeAction::UpdateListening {
                listening: false,
                status: String::new(),
            }]
        );

        bridge.set_enabled(true);
        assert_eq!(bridge.state(), BridgeState::Idle);
    }

    #[tokio::test]
    async fn callbacks_feed_the_channel_in_order() {
        let (bridge, mut rx) = WakeWordBridge::new(true);
        let callbacks = bridge.callbacks();

        (callbacks.on_listening)();
        (callbacks.on_wake_word_detected)();
        (callbacks.on_speech_recognized)("hello".to_string());
        (callbacks.on_error)("oops".to_string());

        assert_eq!(rx.recv().await, Some(AcousticEvent::ListeningChanged(true)));
        assert_eq!(rx.recv().await, Some(AcousticEvent::WakeDetected));
        assert_eq!(
            rx.recv().await,
            Some(AcousticEvent::Transcript("hello".to_string()))
        );
        assert_eq!(rx.recv().await, Some(AcousticEvent::Error("oops".to_string())));
    }

    #[tokio::test]
    async fn forward_enqueues_client_side_events() {
        let (bridge, mut rx) = WakeWordBridge::new(true);
        bridge.forward(AcousticEvent::WakeDetected);
        assert_eq!(rx.recv().await, Some(AcousticEvent::WakeDetected));
    }
}
