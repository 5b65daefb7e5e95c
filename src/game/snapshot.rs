//! Read-only frame state handed to renderers after each tick.

use chrono::{DateTime, Local};
use serde::Serialize;

use super::display::DisplayContext;
use super::objects::{Candy, Direction, Player};
use super::GameState;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlayerView {
    pub x: i32,
    pub y: i32,
    pub size: i32,
    pub direction: Direction,
    pub rotation: f32,
    pub score: u32,
    pub color: u32,
    pub controller_descriptor: String,
}

impl From<&Player> for PlayerView {
    fn from(player: &Player) -> Self {
        Self {
            x: player.x(),
            y: player.y(),
            size: player.size(),
            direction: player.direction(),
            rotation: player.rotation(),
            score: player.score(),
            color: player.color(),
            controller_descriptor: player.controller_descriptor().to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CandyView {
    pub x: i32,
    pub y: i32,
    pub size: i32,
    pub colors: [u32; 3],
}

impl From<&Candy> for CandyView {
    fn from(candy: &Candy) -> Self {
        Self {
            x: candy.x(),
            y: candy.y(),
            size: candy.size(),
            colors: candy.colors(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub state: GameState,
    pub display: DisplayContext,
    pub controller_count: usize,
    pub players: Vec<PlayerView>,
    pub candies: Vec<CandyView>,
    pub published_at: DateTime<Local>,
}

impl Default for FrameSnapshot {
    fn default() -> Self {
        Self {
            frame: 0,
            state: GameState::Stopped,
            display: DisplayContext::default(),
            controller_count: 0,
            players: Vec::new(),
            candies: Vec::new(),
            published_at: Local::now(),
        }
    }
}

impl FrameSnapshot {
    /// One-line score board, e.g. `Player1: 3  Player2: 0`
    pub fn score_line(&self) -> String {
        self.players
            .iter()
            .enumerate()
            .map(|(index, player)| format!("Player{}: {}", index + 1, player.score))
            .collect::<Vec<_>>()
            .join("  ")
    }
}
