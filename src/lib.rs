//! Candyfall: a multi-player catch game core.
//!
//! Players slide along the bottom edge and catch candies that fall with
//! increasing speed. Any number of gamepads and touchscreens can join; each
//! device drives one player, and a reconnecting device gets its player back.
//!
//! - [`controller`] - device input normalization and binding
//! - [`game`] - state machine, objects, collisions
//! - [`runtime`] - fixed-rate loop and host API
//! - [`config`] - TOML configuration

pub mod config;
pub mod controller;
pub mod error;
pub mod game;
pub mod runtime;
