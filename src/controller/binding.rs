//! Controller Binding - one normalized input snapshot per physical device
//!
//! A binding keeps the current logical button and axis vectors for one device.
//! Gamepads update it from key and axis events; touchscreens synthesize HatX
//! and button A from which half of the display the primary pointer touches.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::input_mapper::{
    calibrate, is_gamepad_capable, is_touchscreen_capable, map_button, AxisReadings, Deadzones,
    DeviceId, LogicalAxis, LogicalButton, SourceFlags, AXIS_COUNT, BUTTON_COUNT,
};
use crate::game::display::{DisplayContext, RectF};

/// Device description as reported by the host's device discovery
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub device_id: DeviceId,
    /// Stable identity, survives reconnects with a new `device_id`
    pub descriptor: String,
    pub sources: SourceFlags,
    /// Flat region per axis (`getMotionRangeFlat`)
    #[serde(skip, default = "centered_deadzones")]
    pub deadzones: Deadzones,
}

fn centered_deadzones() -> Deadzones {
    Deadzones::uniform(0.0)
}

impl DeviceInfo {
    pub fn new(device_id: DeviceId, descriptor: impl Into<String>, sources: SourceFlags) -> Self {
        Self {
            device_id,
            descriptor: descriptor.into(),
            sources,
            deadzones: centered_deadzones(),
        }
    }

    pub fn with_deadzones(mut self, deadzones: Deadzones) -> Self {
        self.deadzones = deadzones;
        self
    }
}

/// Touch action vocabulary of a touchscreen motion event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TouchAction {
    Down,
    PointerDown,
    Move,
    Up,
    PointerUp,
    Cancel,
    Outside,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchEvent {
    pub action: TouchAction,
    pub pointer_index: usize,
    pub x: f32,
    pub y: f32,
}

/// Motion input delivered to a binding
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MotionInput {
    Axes(AxisReadings),
    Touch(TouchEvent),
}

/// Touch tracking state of a touchscreen-backed binding
#[derive(Clone, Debug, PartialEq)]
pub struct TouchState {
    left_half: RectF,
    right_half: RectF,
    touched: bool,
}

impl TouchState {
    fn new(display: DisplayContext) -> Self {
        let half = display.width as f32 / 2.0;
        let height = display.height as f32;
        Self {
            left_half: RectF::new(0.0, 0.0, half, height),
            right_half: RectF::new(half, 0.0, display.width as f32, height),
            touched: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum BindingKind {
    Physical,
    Touchscreen(TouchState),
}

#[derive(Clone, Debug)]
pub struct ControllerBinding {
    device_id: DeviceId,
    descriptor: String,
    deadzones: Deadzones,
    buttons: [bool; BUTTON_COUNT],
    axes: [f32; AXIS_COUNT],
    kind: BindingKind,
}

impl ControllerBinding {
    /// Builds the binding variant matching the device's capabilities.
    ///
    /// Returns `None` for devices that are neither gamepads nor touchscreens.
    pub fn for_device(device: &DeviceInfo, display: DisplayContext) -> Option<Self> {
        let kind = if is_gamepad_capable(device.sources) {
            BindingKind::Physical
        } else if is_touchscreen_capable(device.sources) {
            BindingKind::Touchscreen(TouchState::new(display))
        } else {
            return None;
        };

        Some(Self {
            device_id: device.device_id,
            descriptor: device.descriptor.clone(),
            deadzones: device.deadzones,
            buttons: [false; BUTTON_COUNT],
            axes: [0.0; AXIS_COUNT],
            kind,
        })
    }

    pub fn device_id(&self) -> DeviceId {
        self.device_id
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn kind(&self) -> &BindingKind {
        &self.kind
    }

    pub fn is_touchscreen(&self) -> bool {
        matches!(self.kind, BindingKind::Touchscreen(_))
    }

    pub fn is_screen_touched(&self) -> bool {
        match &self.kind {
            BindingKind::Touchscreen(touch) => touch.touched,
            BindingKind::Physical => false,
        }
    }

    pub fn buttons(&self) -> &[bool; BUTTON_COUNT] {
        &self.buttons
    }

    pub fn axes(&self) -> [f32; AXIS_COUNT] {
        self.axes
    }

    pub fn is_pressed(&self, button: LogicalButton) -> bool {
        self.buttons[button.index()]
    }

    pub fn axis(&self, axis: LogicalAxis) -> f32 {
        self.axes[axis.index()]
    }

    /// Unmapped key codes are ignored
    pub fn apply_key_event(&mut self, key_code: i32, is_pressed: bool) {
        match map_button(key_code) {
            Some(button) => self.buttons[button.index()] = is_pressed,
            None => debug!(
                "Ignoring unmapped key code {} on device {}",
                key_code, self.device_id
            ),
        }
    }

    /// Recomputes every logical axis from one motion event
    pub fn apply_motion_event(&mut self, readings: &AxisReadings, deadzones: &Deadzones) {
        self.axes = calibrate(readings, deadzones);
    }

    /// Dispatches motion input by binding variant
    pub fn apply_motion(&mut self, input: &MotionInput) {
        match (self.is_touchscreen(), input) {
            (false, MotionInput::Axes(readings)) => {
                let deadzones = self.deadzones;
                self.apply_motion_event(readings, &deadzones);
            }
            (true, MotionInput::Touch(touch)) => self.apply_touch(touch),
            (_, other) => debug!(
                "Device {} ignores motion input {:?} for its variant",
                self.device_id, other
            ),
        }
    }

    /// Only the primary pointer is tracked
    fn apply_touch(&mut self, touch: &TouchEvent) {
        let BindingKind::Touchscreen(state) = &mut self.kind else {
            return;
        };
        let hat_x = LogicalAxis::HatX.index();
        let button_a = LogicalButton::A.index();

        match touch.action {
            TouchAction::Down | TouchAction::PointerDown if touch.pointer_index == 0 => {
                if state.left_half.contains(touch.x, touch.y) {
                    self.axes[hat_x] = -1.0;
                    self.buttons[button_a] = true;
                } else if state.right_half.contains(touch.x, touch.y) {
                    self.axes[hat_x] = 1.0;
                    self.buttons[button_a] = true;
                }
                state.touched = true;
                debug!(
                    "Touch down at ({:.1}, {:.1}) on device {}",
                    touch.x, touch.y, self.device_id
                );
            }
            TouchAction::Up | TouchAction::Cancel => {
                self.axes[hat_x] = 0.0;
                self.buttons[button_a] = false;
                state.touched = false;
                debug!("Touch released on device {}", self.device_id);
            }
            _ => {}
        }
    }

    /// Re-derives the touch halves after a display change
    pub fn set_display(&mut self, display: DisplayContext) {
        if let BindingKind::Touchscreen(state) = &mut self.kind {
            let touched = state.touched;
            *state = TouchState::new(display);
            state.touched = touched;
        }
    }
}
