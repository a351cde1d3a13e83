//! Persona API Library Crate
//!
//! This library contains all the core logic for the interview web service:
//! the application state, database access, REST handlers, the WebSocket
//! session orchestration, and routing. The `api` binary is a thin wrapper
//! around this library.

pub mod audio;
pub mod config;
pub mod db;
pub mod handlers;
pub mod models;
pub mod router;
pub mod session;
pub mod state;
