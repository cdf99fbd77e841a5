//! Core types for nudge.
//!
//! Holds the tracked-source data model, the wire contract with the host
//! collaborator, the error taxonomy, the entity registry and the host CLI
//! settings. Nothing here performs I/O on its own.

pub mod error;
pub mod models;
pub mod protocol;
pub mod registry;
pub mod settings;

pub use error::{ErrorCategory, NudgeError, Result};
