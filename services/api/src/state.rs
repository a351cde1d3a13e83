//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds all shared,
//! clonable resources like the database pool and service clients.

use crate::config::Config;
use persona_core::{dialogue::DialogueService, speech::SpeechService};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all
/// handlers. All fields are public to be accessible from other modules.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<crate::db::Db>,
    pub dialogue: Arc<dyn DialogueService>,
    /// Absent when no synthesis backend is configured; narration is then
    /// disabled for every session.
    pub speech: Option<Arc<dyn SpeechService>>,
    /// Opening message of a fresh interview.
    pub greeting: Arc<String>,
    pub config: Arc<Config>,
}
