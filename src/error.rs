//! Error types shared by the runtime and its collaborators.
//!
//! Expected runtime conditions (unmapped input, unknown devices, rejected moves)
//! are not errors and never show up here.

use thiserror::Error;

/// Errors of the game loop lifecycle and its command channel
#[derive(Debug, Error)]
pub enum GameLoopError {
    /// The simulation task is gone or its command queue is closed
    #[error("Channel error: {0}")]
    ChannelError(String),

    /// Invalid configuration or startup failure
    #[error("Initialization error: {0}")]
    InitializationError(String),

    /// The simulation task panicked or was aborted
    #[error("Task error: {0}")]
    TaskError(String),
}

/// Best-effort asset failures; the game keeps running without the asset
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Failed to load asset {name}: {reason}")]
    LoadFailed { name: String, reason: String },
}
