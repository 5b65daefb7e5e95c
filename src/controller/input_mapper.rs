//! Input Mapper - normalizes raw platform input
//!
//! Translates device capability flags, key codes and raw axis readings into the
//! closed logical button/axis vocabulary used by every controller binding.
//! Codes follow the Android input constants so hosts can forward them untouched.

use serde::{Deserialize, Serialize};

/// Transient device identifier, only valid while the device is connected
pub type DeviceId = i32;

// Key codes
pub const KEYCODE_BACK: i32 = 4;
pub const KEYCODE_BUTTON_A: i32 = 96;
pub const KEYCODE_BUTTON_B: i32 = 97;
pub const KEYCODE_BUTTON_X: i32 = 99;
pub const KEYCODE_BUTTON_Y: i32 = 100;
pub const KEYCODE_BUTTON_L1: i32 = 102;
pub const KEYCODE_BUTTON_R1: i32 = 103;
pub const KEYCODE_BUTTON_L2: i32 = 104;
pub const KEYCODE_BUTTON_R2: i32 = 105;
pub const KEYCODE_BUTTON_THUMBL: i32 = 106;
pub const KEYCODE_BUTTON_THUMBR: i32 = 107;
pub const KEYCODE_BUTTON_START: i32 = 108;
pub const KEYCODE_BUTTON_SELECT: i32 = 109;
pub const KEYCODE_BUTTON_MODE: i32 = 110;

// Raw axis codes
pub const AXIS_X: u32 = 0;
pub const AXIS_Y: u32 = 1;
pub const AXIS_Z: u32 = 11;
pub const AXIS_RZ: u32 = 14;
pub const AXIS_HAT_X: u32 = 15;
pub const AXIS_HAT_Y: u32 = 16;
pub const AXIS_LTRIGGER: u32 = 17;
pub const AXIS_RTRIGGER: u32 = 18;
pub const AXIS_GAS: u32 = 22;
pub const AXIS_BRAKE: u32 = 23;

/// Device capability bit set as reported by the host's device discovery
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceFlags(pub u32);

impl SourceFlags {
    pub const GAMEPAD: SourceFlags = SourceFlags(0x0000_0401);
    pub const JOYSTICK: SourceFlags = SourceFlags(0x0100_0010);
    pub const TOUCHSCREEN: SourceFlags = SourceFlags(0x0000_1002);
    pub const KEYBOARD: SourceFlags = SourceFlags(0x0000_0101);

    pub const fn empty() -> Self {
        SourceFlags(0)
    }

    /// True if every bit of `other` is set
    pub const fn contains(self, other: SourceFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for SourceFlags {
    type Output = SourceFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        SourceFlags(self.0 | rhs.0)
    }
}

/// Logical buttons, in vector order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalButton {
    A,
    B,
    X,
    Y,
    L1,
    R1,
    L2,
    R2,
    Select,
    Start,
    ThumbL,
    ThumbR,
    Back,
    Power,
}

pub const BUTTON_COUNT: usize = 14;

impl LogicalButton {
    pub const ALL: [LogicalButton; BUTTON_COUNT] = [
        LogicalButton::A,
        LogicalButton::B,
        LogicalButton::X,
        LogicalButton::Y,
        LogicalButton::L1,
        LogicalButton::R1,
        LogicalButton::L2,
        LogicalButton::R2,
        LogicalButton::Select,
        LogicalButton::Start,
        LogicalButton::ThumbL,
        LogicalButton::ThumbR,
        LogicalButton::Back,
        LogicalButton::Power,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn key_code(self) -> i32 {
        match self {
            LogicalButton::A => KEYCODE_BUTTON_A,
            LogicalButton::B => KEYCODE_BUTTON_B,
            LogicalButton::X => KEYCODE_BUTTON_X,
            LogicalButton::Y => KEYCODE_BUTTON_Y,
            LogicalButton::L1 => KEYCODE_BUTTON_L1,
            LogicalButton::R1 => KEYCODE_BUTTON_R1,
            LogicalButton::L2 => KEYCODE_BUTTON_L2,
            LogicalButton::R2 => KEYCODE_BUTTON_R2,
            LogicalButton::Select => KEYCODE_BUTTON_SELECT,
            LogicalButton::Start => KEYCODE_BUTTON_START,
            LogicalButton::ThumbL => KEYCODE_BUTTON_THUMBL,
            LogicalButton::ThumbR => KEYCODE_BUTTON_THUMBR,
            LogicalButton::Back => KEYCODE_BACK,
            LogicalButton::Power => KEYCODE_BUTTON_MODE,
        }
    }
}

/// Logical axes, in vector order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalAxis {
    X,
    Y,
    Z,
    Rz,
    HatX,
    HatY,
    LTrigger,
    RTrigger,
    Brake,
    Gas,
}

pub const AXIS_COUNT: usize = 10;

impl LogicalAxis {
    pub const ALL: [LogicalAxis; AXIS_COUNT] = [
        LogicalAxis::X,
        LogicalAxis::Y,
        LogicalAxis::Z,
        LogicalAxis::Rz,
        LogicalAxis::HatX,
        LogicalAxis::HatY,
        LogicalAxis::LTrigger,
        LogicalAxis::RTrigger,
        LogicalAxis::Brake,
        LogicalAxis::Gas,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn axis_code(self) -> u32 {
        match self {
            LogicalAxis::X => AXIS_X,
            LogicalAxis::Y => AXIS_Y,
            LogicalAxis::Z => AXIS_Z,
            LogicalAxis::Rz => AXIS_RZ,
            LogicalAxis::HatX => AXIS_HAT_X,
            LogicalAxis::HatY => AXIS_HAT_Y,
            LogicalAxis::LTrigger => AXIS_LTRIGGER,
            LogicalAxis::RTrigger => AXIS_RTRIGGER,
            LogicalAxis::Brake => AXIS_BRAKE,
            LogicalAxis::Gas => AXIS_GAS,
        }
    }
}

/// Raw readings of one motion event, indexed by logical axis
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AxisReadings(pub [f32; AXIS_COUNT]);

impl AxisReadings {
    /// Builds readings from `(axis code, value)` pairs; unknown codes are skipped
    pub fn from_raw(raw: &[(u32, f32)]) -> Self {
        let mut readings = Self::default();
        for &(code, value) in raw {
            if let Some(axis) = map_axis(code) {
                readings.0[axis.index()] = value;
            }
        }
        readings
    }

    pub fn get(&self, axis: LogicalAxis) -> f32 {
        self.0[axis.index()]
    }

    pub fn set(&mut self, axis: LogicalAxis, value: f32) {
        self.0[axis.index()] = value;
    }
}

/// Per-axis flat regions reported by one device; `None` = the device has no such axis
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Deadzones(pub [Option<f32>; AXIS_COUNT]);

impl Deadzones {
    /// Every axis present with the same flat value
    pub fn uniform(flat: f32) -> Self {
        Self([Some(flat); AXIS_COUNT])
    }

    pub fn get(&self, axis: LogicalAxis) -> Option<f32> {
        self.0[axis.index()]
    }

    pub fn set(&mut self, axis: LogicalAxis, flat: Option<f32>) {
        self.0[axis.index()] = flat;
    }
}

pub fn is_gamepad_capable(flags: SourceFlags) -> bool {
    flags.contains(SourceFlags::GAMEPAD) || flags.contains(SourceFlags::JOYSTICK)
}

pub fn is_touchscreen_capable(flags: SourceFlags) -> bool {
    flags.contains(SourceFlags::TOUCHSCREEN)
}

pub fn map_button(key_code: i32) -> Option<LogicalButton> {
    LogicalButton::ALL
        .into_iter()
        .find(|button| button.key_code() == key_code)
}

pub fn map_axis(axis_code: u32) -> Option<LogicalAxis> {
    LogicalAxis::ALL
        .into_iter()
        .find(|axis| axis.axis_code() == axis_code)
}

/// Dead-zone filter: readings inside the flat region count as centered.
///
/// Unlike a rescaling deadzone, values outside the flat region pass through
/// unchanged, so every axis must be filtered with its own reported flat.
pub fn centered_axis_value(raw_value: f32, flat_deadzone: f32) -> f32 {
    if raw_value.abs() <= flat_deadzone {
        0.0
    } else {
        raw_value
    }
}

/// Calibrates a full reading vector; axes the device lacks read as zero
pub fn calibrate(readings: &AxisReadings, deadzones: &Deadzones) -> [f32; AXIS_COUNT] {
    let mut axes = [0.0; AXIS_COUNT];
    for axis in LogicalAxis::ALL {
        axes[axis.index()] = match deadzones.get(axis) {
            Some(flat) => centered_axis_value(readings.get(axis), flat),
            None => 0.0,
        };
    }
    axes
}
