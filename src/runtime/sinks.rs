//! Collaborators the simulation talks to: renderer, audio and device discovery.
//!
//! The game loop owns one [`FrameSink`] and one [`AudioSink`] and only ever calls
//! them from the simulation task. [`DeviceSource`] is queried when the surface
//! comes up and, in single-controller mode, after a removal.

use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use crate::controller::binding::DeviceInfo;
use crate::controller::input_mapper::DeviceId;
use crate::error::AssetError;
use crate::game::display::DisplayContext;
use crate::game::snapshot::FrameSnapshot;

/// Receives one snapshot per tick
pub trait FrameSink: Send + 'static {
    fn draw(&mut self, frame: &FrameSnapshot);

    /// Geometry changed; cached visual resources should be rebuilt
    fn display_changed(&mut self, _surface: DisplayContext) {}
}

pub trait AudioSink: Send + 'static {
    fn load_cue(&mut self, name: &str) -> Result<(), AssetError>;

    fn play_one_shot(&mut self, name: &str);

    fn release(&mut self);
}

pub trait DeviceSource: Send + Sync + 'static {
    fn connected_devices(&self) -> Vec<DeviceInfo>;
}

/// Text HUD on the `debug` level; score changes are logged on `info`
#[derive(Debug, Default)]
pub struct TracingFrameSink {
    frames_drawn: u64,
    last_score_line: String,
}

impl TracingFrameSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }
}

impl FrameSink for TracingFrameSink {
    fn draw(&mut self, frame: &FrameSnapshot) {
        self.frames_drawn += 1;

        let score_line = frame.score_line();
        if score_line != self.last_score_line {
            info!("[{}] {}", frame.state, score_line);
            self.last_score_line = score_line;
        }

        debug!(
            "Frame {} ({}): {} players, {} candies, {} controllers",
            frame.frame,
            frame.state,
            frame.players.len(),
            frame.candies.len(),
            frame.controller_count
        );
    }

    fn display_changed(&mut self, surface: DisplayContext) {
        info!("Renderer surface now {}x{}", surface.width, surface.height);
    }
}

/// Audio backend that only records what it was asked to play
#[derive(Debug, Default)]
pub struct SilentAudio {
    loaded: Option<String>,
    played: u64,
    released: bool,
}

impl SilentAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> u64 {
        self.played
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl AudioSink for SilentAudio {
    fn load_cue(&mut self, name: &str) -> Result<(), AssetError> {
        if name.is_empty() {
            return Err(AssetError::NotFound("<empty cue name>".to_string()));
        }
        if name.contains(['/', '\\']) {
            return Err(AssetError::LoadFailed {
                name: name.to_string(),
                reason: "cue names are bare asset names, not paths".to_string(),
            });
        }
        debug!("Cue {} registered (silent)", name);
        self.loaded = Some(name.to_string());
        Ok(())
    }

    fn play_one_shot(&mut self, name: &str) {
        if self.loaded.as_deref() == Some(name) {
            self.played += 1;
            debug!("Playing cue {} (silent)", name);
        } else {
            debug!("Cue {} not loaded, skipping", name);
        }
    }

    fn release(&mut self) {
        info!("Releasing audio resources ({} cues played)", self.played);
        self.loaded = None;
        self.released = true;
    }
}

/// Connected-device list shared between a platform bridge and the game loop
#[derive(Clone, Debug, Default)]
pub struct StaticDeviceSource {
    devices: Arc<RwLock<Vec<DeviceInfo>>>,
}

impl StaticDeviceSource {
    pub fn new(devices: Vec<DeviceInfo>) -> Self {
        Self {
            devices: Arc::new(RwLock::new(devices)),
        }
    }

    /// Adds or replaces the entry with the same device id
    pub fn insert(&self, device: DeviceInfo) {
        match self.devices.write() {
            Ok(mut devices) => {
                devices.retain(|d| d.device_id != device.device_id);
                devices.push(device);
            }
            Err(e) => warn!("Device list unavailable: {}", e),
        }
    }

    pub fn remove(&self, device_id: DeviceId) {
        match self.devices.write() {
            Ok(mut devices) => devices.retain(|d| d.device_id != device_id),
            Err(e) => warn!("Device list unavailable: {}", e),
        }
    }
}

impl DeviceSource for StaticDeviceSource {
    fn connected_devices(&self) -> Vec<DeviceInfo> {
        match self.devices.read() {
            Ok(devices) => devices.clone(),
            Err(e) => {
                warn!("Device list unavailable: {}", e);
                Vec::new()
            }
        }
    }
}
