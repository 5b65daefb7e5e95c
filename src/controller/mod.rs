//! Controller subsystem: from raw device events to per-device input snapshots
//!
//! 1. [`input_mapper`] - platform key/axis codes to logical buttons and axes
//! 2. [`binding`] - one normalized input snapshot per device (gamepad or touchscreen)
//! 3. [`registry`] - live bindings, reconnect handling, player attachment
//! 4. [`gamepad_bridge`] - gilrs polling thread feeding the game loop
//!
//! # Architecture
//!
//! ```text
//! gilrs / host ──► HostCommand ──► ControllerRegistry ──► ControllerBinding
//!                                  (device id, descriptor)   (buttons, axes)
//! ```
//!
//! Bindings only hold the latest state; the game logic reads them once per tick.

pub mod binding;
pub mod gamepad_bridge;
pub mod input_mapper;
pub mod registry;

pub use binding::{ControllerBinding, DeviceInfo, MotionInput, TouchAction, TouchEvent};
pub use gamepad_bridge::GamepadBridge;
pub use input_mapper::{AxisReadings, Deadzones, DeviceId, LogicalAxis, LogicalButton, SourceFlags};
pub use registry::{BindOutcome, ControllerRegistry};
