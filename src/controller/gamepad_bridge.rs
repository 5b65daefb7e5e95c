use chrono::Local;
use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use std::collections::HashMap;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::binding::{DeviceInfo, MotionInput};
use super::input_mapper::{
    AxisReadings, Deadzones, DeviceId, LogicalAxis, LogicalButton, SourceFlags,
};
use crate::error::GameLoopError;
use crate::runtime::game_loop::{HostCommand, HostEvent};
use crate::runtime::sinks::StaticDeviceSource;

const POLL_IDLE: Duration = Duration::from_millis(2);
const STATS_INTERVAL_SECS: i64 = 30;

/// gilrs button to logical key code; D-pad buttons are handled as hat axes
fn key_code_for(button: Button) -> Option<i32> {
    let logical = match button {
        Button::South => LogicalButton::A,
        Button::East => LogicalButton::B,
        Button::West => LogicalButton::X,
        Button::North => LogicalButton::Y,
        Button::LeftTrigger => LogicalButton::L1,
        Button::RightTrigger => LogicalButton::R1,
        Button::LeftTrigger2 => LogicalButton::L2,
        Button::RightTrigger2 => LogicalButton::R2,
        Button::Select => LogicalButton::Select,
        Button::Start => LogicalButton::Start,
        Button::LeftThumb => LogicalButton::ThumbL,
        Button::RightThumb => LogicalButton::ThumbR,
        Button::Mode => LogicalButton::Power,
        _ => return None,
    };
    Some(logical.key_code())
}

/// D-pad button to the hat axis value it stands for while held
fn hat_direction(button: Button) -> Option<(LogicalAxis, f32)> {
    match button {
        Button::DPadLeft => Some((LogicalAxis::HatX, -1.0)),
        Button::DPadRight => Some((LogicalAxis::HatX, 1.0)),
        Button::DPadUp => Some((LogicalAxis::HatY, -1.0)),
        Button::DPadDown => Some((LogicalAxis::HatY, 1.0)),
        _ => None,
    }
}

/// Analog triggers arrive as button value changes
fn trigger_axis(button: Button) -> Option<LogicalAxis> {
    match button {
        Button::LeftTrigger2 => Some(LogicalAxis::LTrigger),
        Button::RightTrigger2 => Some(LogicalAxis::RTrigger),
        _ => None,
    }
}

/// gilrs axis to logical axis plus sign; gilrs Y grows upwards, ours downwards
fn logical_axis(axis: Axis) -> Option<(LogicalAxis, f32)> {
    match axis {
        Axis::LeftStickX => Some((LogicalAxis::X, 1.0)),
        Axis::LeftStickY => Some((LogicalAxis::Y, -1.0)),
        Axis::RightStickX => Some((LogicalAxis::Z, 1.0)),
        Axis::RightStickY => Some((LogicalAxis::Rz, -1.0)),
        Axis::LeftZ => Some((LogicalAxis::LTrigger, 1.0)),
        Axis::RightZ => Some((LogicalAxis::RTrigger, 1.0)),
        Axis::DPadX => Some((LogicalAxis::HatX, 1.0)),
        Axis::DPadY => Some((LogicalAxis::HatY, -1.0)),
        _ => None,
    }
}

fn gilrs_axis(axis: LogicalAxis) -> Option<Axis> {
    match axis {
        LogicalAxis::X => Some(Axis::LeftStickX),
        LogicalAxis::Y => Some(Axis::LeftStickY),
        LogicalAxis::Z => Some(Axis::RightStickX),
        LogicalAxis::Rz => Some(Axis::RightStickY),
        LogicalAxis::LTrigger => Some(Axis::LeftZ),
        LogicalAxis::RTrigger => Some(Axis::RightZ),
        LogicalAxis::HatX => Some(Axis::DPadX),
        LogicalAxis::HatY => Some(Axis::DPadY),
        LogicalAxis::Brake | LogicalAxis::Gas => None,
    }
}

/// Stable descriptor: lowercase hex of the gamepad UUID
pub fn descriptor_from_uuid(uuid: [u8; 16]) -> String {
    uuid.iter().map(|byte| format!("{:02x}", byte)).collect()
}

fn device_id(id: GamepadId) -> DeviceId {
    usize::from(id) as DeviceId
}

/// Flat region of one logical axis, `None` when the pad has no such axis
fn flat_for(gamepad: &Gamepad<'_>, axis: LogicalAxis) -> Option<f32> {
    let code = gilrs_axis(axis).and_then(|gilrs_axis| gamepad.axis_code(gilrs_axis));
    match (axis, code) {
        (_, Some(code)) => Some(gamepad.deadzone(code).unwrap_or(0.0)),
        // Synthesized from D-pad and trigger buttons
        (LogicalAxis::HatX | LogicalAxis::HatY | LogicalAxis::LTrigger | LogicalAxis::RTrigger, None) => {
            Some(0.0)
        }
        _ => None,
    }
}

struct BridgeState {
    gilrs: Gilrs,
    command_sender: mpsc::Sender<HostCommand>,
    devices: StaticDeviceSource,
    readings: HashMap<DeviceId, AxisReadings>,
}

impl BridgeState {
    fn device_info(&self, id: GamepadId) -> DeviceInfo {
        let gamepad = self.gilrs.gamepad(id);
        let mut deadzones = Deadzones::default();
        for axis in LogicalAxis::ALL {
            deadzones.set(axis, flat_for(&gamepad, axis));
        }

        DeviceInfo::new(
            device_id(id),
            descriptor_from_uuid(gamepad.uuid()),
            SourceFlags::GAMEPAD | SourceFlags::JOYSTICK,
        )
        .with_deadzones(deadzones)
    }

    fn connected(&mut self, id: GamepadId) -> HostEvent {
        let info = self.device_info(id);
        info!(
            "Gamepad connected: {} (device {}, descriptor {})",
            self.gilrs.gamepad(id).name(),
            info.device_id,
            info.descriptor
        );
        self.devices.insert(info.clone());
        HostEvent::DeviceAdded(info)
    }

    fn axis_event(&mut self, device_id: DeviceId, axis: LogicalAxis, value: f32) -> HostEvent {
        let readings = self.readings.entry(device_id).or_default();
        readings.set(axis, value);
        HostEvent::Motion {
            device_id,
            input: MotionInput::Axes(*readings),
        }
    }

    fn button_event(&mut self, device_id: DeviceId, button: Button, pressed: bool) -> Option<HostEvent> {
        if let Some((axis, value)) = hat_direction(button) {
            let value = if pressed { value } else { 0.0 };
            return Some(self.axis_event(device_id, axis, value));
        }

        match key_code_for(button) {
            Some(key_code) => Some(HostEvent::Key {
                device_id,
                key_code,
                pressed,
            }),
            None => {
                debug!("Ignoring unsupported button: {:?}", button);
                None
            }
        }
    }

    fn translate(&mut self, id: GamepadId, event: EventType) -> Option<HostEvent> {
        let device_id = device_id(id);
        match event {
            EventType::Connected => Some(self.connected(id)),
            EventType::Disconnected => {
                warn!("Gamepad disconnected: device {}", device_id);
                self.devices.remove(device_id);
                self.readings.remove(&device_id);
                Some(HostEvent::DeviceRemoved(device_id))
            }
            EventType::ButtonPressed(button, _) => self.button_event(device_id, button, true),
            EventType::ButtonReleased(button, _) => self.button_event(device_id, button, false),
            EventType::ButtonChanged(button, value, _) => {
                trigger_axis(button).map(|axis| self.axis_event(device_id, axis, value))
            }
            EventType::AxisChanged(axis, value, _) => match logical_axis(axis) {
                Some((logical, sign)) => Some(self.axis_event(device_id, logical, value * sign)),
                None => {
                    debug!("Ignoring unsupported axis: {:?}", axis);
                    None
                }
            },
            _ => None,
        }
    }

    fn forward(&self, event: HostEvent) -> bool {
        match self.command_sender.blocking_send(HostCommand::notify(event)) {
            Ok(()) => true,
            Err(e) => {
                warn!("Game loop no longer accepts commands: {}", e);
                false
            }
        }
    }

    /// Pads connected before the bridge started do not produce Connected events
    fn announce_connected(&mut self) -> bool {
        let ids: Vec<GamepadId> = self.gilrs.gamepads().map(|(id, _)| id).collect();
        info!("Found {} gamepads", ids.len());
        for id in ids {
            let event = self.connected(id);
            if !self.forward(event) {
                return false;
            }
        }
        true
    }

    fn run(&mut self, cancel: &CancellationToken) {
        info!("Starting gamepad bridge loop");
        let mut forwarded: u64 = 0;
        let mut last_log_time = Local::now();
        let log_interval = chrono::Duration::seconds(STATS_INTERVAL_SECS);

        while !cancel.is_cancelled() {
            let Some(Event { id, event, .. }) = self.gilrs.next_event() else {
                std::thread::sleep(POLL_IDLE);
                continue;
            };

            if let Some(host_event) = self.translate(id, event) {
                if !self.forward(host_event) {
                    break;
                }
                forwarded += 1;
            }

            let now = Local::now();
            if now - last_log_time > log_interval {
                info!(
                    "Gamepad bridge stats: forwarded {} events in last {} seconds",
                    forwarded,
                    log_interval.num_seconds()
                );
                forwarded = 0;
                last_log_time = now;
            }
        }
        info!("Gamepad bridge loop finished");
    }
}

/// Polls gilrs on its own OS thread and feeds the game loop's command channel
pub struct GamepadBridge {
    cancel: CancellationToken,
    thread_handle: Option<JoinHandle<()>>,
}

impl GamepadBridge {
    pub fn spawn(
        command_sender: mpsc::Sender<HostCommand>,
        devices: StaticDeviceSource,
        cancel: CancellationToken,
    ) -> Result<Self, GameLoopError> {
        let thread_cancel = cancel.clone();
        let thread_handle = std::thread::Builder::new()
            .name("gamepad-bridge".to_string())
            .spawn(move || {
                // Gilrs is created on the polling thread; it is not Send on every platform
                let gilrs = match Gilrs::new() {
                    Ok(gilrs) => {
                        info!("Successfully initialized gilrs");
                        gilrs
                    }
                    Err(e) => {
                        error!("Failed to initialize gilrs, gamepads unavailable: {}", e);
                        return;
                    }
                };

                let mut state = BridgeState {
                    gilrs,
                    command_sender,
                    devices,
                    readings: HashMap::new(),
                };
                if state.announce_connected() {
                    state.run(&thread_cancel);
                }
            })
            .map_err(|e| {
                GameLoopError::InitializationError(format!(
                    "Failed to spawn gamepad bridge thread: {}",
                    e
                ))
            })?;

        info!("Gamepad bridge started");
        Ok(Self {
            cancel,
            thread_handle: Some(thread_handle),
        })
    }

    /// Stops polling and joins the thread
    pub fn stop(mut self) -> Result<(), GameLoopError> {
        self.cancel.cancel();
        if let Some(handle) = self.thread_handle.take() {
            handle.join().map_err(|_| {
                GameLoopError::TaskError("Gamepad bridge thread panicked".to_string())
            })?;
        }
        info!("Gamepad bridge stopped");
        Ok(())
    }
}
