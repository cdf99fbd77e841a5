//! Runtime layer for nudge.
//!
//! Owns the correlation bridge to the host collaborator, the per-source
//! surfaces, the action engine, the poll timer and the view coordinator.

pub mod bridge;
pub mod coordinator;
pub mod engine;
pub mod host;
pub mod projection;
pub mod scheduler;
pub mod surfaces;

#[cfg(test)]
mod test_support;

pub use nudge_core as core;

pub use bridge::CorrelationBridge;
pub use coordinator::ViewCoordinator;
pub use engine::SyncEngine;
pub use host::HostLink;
pub use projection::{HintSink, RenderHint};
