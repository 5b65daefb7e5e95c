//! Game simulation core
//!
//! Everything here runs on the simulation task and is driven one tick at a time:
//!
//! 1. [`logic`] - state machine (Stopped / Paused / Playing) and per-tick orchestration
//! 2. [`objects`] - players, candies and their bounds-checked movement
//! 3. [`collision`] - player/candy scoring pass
//! 4. [`snapshot`] - read-only frame state for renderers
//!
//! # Tick
//!
//! ```text
//! bindings ──► player movement ──► candy physics ──► collisions ──► FrameSnapshot
//! ```

pub mod collision;
pub mod display;
pub mod logic;
pub mod objects;
pub mod snapshot;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use display::DisplayContext;
pub use logic::GameLogic;
pub use snapshot::FrameSnapshot;

/// Top-level game states; the game starts Stopped
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    #[default]
    Stopped,
    Paused,
    Playing,
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameState::Stopped => write!(f, "Stopped"),
            GameState::Paused => write!(f, "Paused"),
            GameState::Playing => write!(f, "Playing"),
        }
    }
}
