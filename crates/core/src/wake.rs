//! Wake-Word Service Surface
//!
//! Acoustic backends are push-based: they accept a set of callbacks at
//! registration time and invoke them as the recognizer changes state. This
//! module defines that registration payload; the session's wake-word bridge
//! builds one that forwards every event into its ordered channel.

/// Callback set handed to an acoustic backend at registration.
pub struct WakeWordCallbacks {
    /// The wake phrase was heard.
    pub on_wake_word_detected: Box<dyn Fn() + Send + Sync>,
    /// The recognizer began listening for the wake phrase.
    pub on_listening: Box<dyn Fn() + Send + Sync>,
    /// The recognizer stopped listening.
    pub on_not_listening: Box<dyn Fn() + Send + Sync>,
    /// A full utterance was transcribed after a wake.
    pub on_speech_recognized: Box<dyn Fn(String) + Send + Sync>,
    /// The recognizer reported an error; the interview keeps going.
    pub on_error: Box<dyn Fn(String) + Send + Sync>,
}
