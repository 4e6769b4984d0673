// Re-export core modules for use by the binary or other consumers
pub mod core;
pub mod data;
pub mod persistence;
pub mod progress;
pub mod remote;
pub mod rules;
pub mod systems;

// Expose the main Session wrapper and types needed for interaction
pub use crate::core::session::{LearnerAction, Session, Snapshot};
