//! Runtime: fixed-rate scheduling and the host-facing API
//!
//! 1. [`game_loop`] - statum lifecycle, simulation task, host commands
//! 2. [`sinks`] - renderer, audio and device-discovery collaborators
//!
//! # Architecture
//!
//! ```text
//! Host / GamepadBridge ──► mpsc<HostCommand> ──► simulation task ──► watch<FrameSnapshot>
//!                                                     │
//!                                             FrameSink, AudioSink
//! ```

pub mod game_loop;
pub mod sinks;

pub use game_loop::{
    next_tick_delay, Created, GameLoop, HostCommand, HostEvent, Running, Terminated,
};
pub use sinks::{AudioSink, DeviceSource, FrameSink, SilentAudio, StaticDeviceSource, TracingFrameSink};
