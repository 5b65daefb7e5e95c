//! Game loop with statum lifecycle and a fixed-rate simulation task
//!
//! # State Machine
//!
//! ```text
//! Created ──► Running ──► Terminated
//!   (start)      (shutdown)
//! ```
//!
//! # Simulation task
//!
//! ```text
//! cancel ───────┐
//! HostCommand ──┼──► select! (biased) ──► GameLogic ──► FrameSink / AudioSink
//! deadline ─────┘                              │
//!                                              ▼
//!                                      watch<FrameSnapshot>
//! ```
//!
//! Host events and ticks are handled by the same task, one at a time, so the
//! game state never needs a lock.

use chrono::Local;
use statum::{machine, state};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::sinks::{AudioSink, DeviceSource, FrameSink};
use crate::config::GameConfig;
use crate::controller::binding::{DeviceInfo, MotionInput, TouchEvent};
use crate::controller::input_mapper::{AxisReadings, DeviceId, KEYCODE_BACK};
use crate::error::GameLoopError;
use crate::game::logic::GameLogic;
use crate::game::snapshot::FrameSnapshot;

const STATS_INTERVAL_SECS: i64 = 30;

/// Everything the host can tell the game
#[derive(Clone, Debug, PartialEq)]
pub enum HostEvent {
    SurfaceReady { width: i32, height: i32 },
    SurfaceResized { width: i32, height: i32 },
    SurfaceLost,
    Key {
        device_id: DeviceId,
        key_code: i32,
        pressed: bool,
    },
    Motion {
        device_id: DeviceId,
        input: MotionInput,
    },
    BackPressed,
    DeviceAdded(DeviceInfo),
    DeviceRemoved(DeviceId),
}

/// A host event plus an optional channel for the "consumed" answer
#[derive(Debug)]
pub struct HostCommand {
    pub event: HostEvent,
    pub reply: Option<oneshot::Sender<bool>>,
}

impl HostCommand {
    /// Fire-and-forget command, used by platform bridges
    pub fn notify(event: HostEvent) -> Self {
        Self { event, reply: None }
    }
}

/// Delay from the end of a tick to the start of the next one, never negative
pub fn next_tick_delay(period: Duration, tick_cost: Duration) -> Duration {
    period.saturating_sub(tick_cost)
}

#[state]
#[derive(Debug, Clone)]
pub enum LoopState {
    Created,
    Running,
    Terminated,
}

/// Owned by the simulation task once the loop runs
struct Simulation {
    logic: GameLogic,
    frame_sink: Box<dyn FrameSink>,
    audio: Box<dyn AudioSink>,
    devices: Arc<dyn DeviceSource>,
    command_receiver: mpsc::Receiver<HostCommand>,
    frame_sender: watch::Sender<FrameSnapshot>,
    audio_cue: String,
}

#[machine]
pub struct GameLoop<S: LoopState> {
    config: GameConfig,
    command_sender: mpsc::Sender<HostCommand>,
    frame_receiver: watch::Receiver<FrameSnapshot>,
    cancel: CancellationToken,
    simulation: Option<Simulation>,
    task_handle: Option<JoinHandle<Result<(), GameLoopError>>>,
}

impl<S: LoopState> GameLoop<S> {
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn command_sender(&self) -> mpsc::Sender<HostCommand> {
        self.command_sender.clone()
    }

    pub fn subscribe_frames(&self) -> watch::Receiver<FrameSnapshot> {
        debug!("New frame subscriber");
        self.frame_receiver.clone()
    }

    /// Token that fires when the loop shuts down
    pub fn child_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }
}

impl GameLoop<Created> {
    pub fn create(
        config: GameConfig,
        frame_sink: Box<dyn FrameSink>,
        audio: Box<dyn AudioSink>,
        devices: Arc<dyn DeviceSource>,
    ) -> Result<Self, GameLoopError> {
        let logic = GameLogic::new(config.clone());
        Self::with_logic(config, logic, frame_sink, audio, devices)
    }

    /// Same as [`GameLoop::create`] with a caller-built [`GameLogic`]
    pub fn with_logic(
        config: GameConfig,
        logic: GameLogic,
        frame_sink: Box<dyn FrameSink>,
        audio: Box<dyn AudioSink>,
        devices: Arc<dyn DeviceSource>,
    ) -> Result<Self, GameLoopError> {
        config
            .validate()
            .map_err(|e| GameLoopError::InitializationError(e.to_string()))?;

        let (command_sender, command_receiver) = mpsc::channel(config.event_buffer);
        let (frame_sender, frame_receiver) = watch::channel(logic.snapshot());
        debug!(
            "Created command channel with buffer capacity {}",
            config.event_buffer
        );

        let simulation = Simulation {
            logic,
            frame_sink,
            audio,
            devices,
            command_receiver,
            frame_sender,
            audio_cue: config.audio_cue.clone(),
        };

        info!(
            "Game loop created, tick period {}ms",
            config.frame_interval_ms
        );
        Ok(Self::new(
            config,
            command_sender,
            frame_receiver,
            CancellationToken::new(),
            Some(simulation),
            None, // task_handle
        ))
    }

    /// Spawns the simulation task
    pub fn start(mut self) -> Result<GameLoop<Running>, GameLoopError> {
        let simulation = self.simulation.take().ok_or_else(|| {
            GameLoopError::InitializationError("Simulation already handed off".to_string())
        })?;

        let period = self.config.frame_interval();
        let cancel = self.cancel.clone();
        let task_handle = tokio::spawn(async move { simulation.run(period, cancel).await });
        self.task_handle = Some(task_handle);

        info!("Game loop started");
        Ok(self.transition())
    }
}

impl GameLoop<Running> {
    async fn request(&self, event: HostEvent) -> Result<bool, GameLoopError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_sender
            .send(HostCommand {
                event,
                reply: Some(reply_tx),
            })
            .await
            .map_err(|e| GameLoopError::ChannelError(format!("Failed to send command: {}", e)))?;

        reply_rx
            .await
            .map_err(|e| GameLoopError::ChannelError(format!("No reply from simulation: {}", e)))
    }

    pub async fn on_surface_ready(&self, width: i32, height: i32) -> Result<(), GameLoopError> {
        self.request(HostEvent::SurfaceReady { width, height })
            .await
            .map(|_| ())
    }

    pub async fn on_surface_resized(&self, width: i32, height: i32) -> Result<(), GameLoopError> {
        self.request(HostEvent::SurfaceResized { width, height })
            .await
            .map(|_| ())
    }

    pub async fn on_surface_lost(&self) -> Result<(), GameLoopError> {
        self.request(HostEvent::SurfaceLost).await.map(|_| ())
    }

    /// The back key is never consumed here; hosts route it to [`Self::on_back_pressed`]
    pub async fn on_key_down(&self, device_id: DeviceId, key_code: i32) -> Result<bool, GameLoopError> {
        if key_code == KEYCODE_BACK {
            return Ok(false);
        }
        self.request(HostEvent::Key {
            device_id,
            key_code,
            pressed: true,
        })
        .await
    }

    pub async fn on_key_up(&self, device_id: DeviceId, key_code: i32) -> Result<bool, GameLoopError> {
        if key_code == KEYCODE_BACK {
            return Ok(false);
        }
        self.request(HostEvent::Key {
            device_id,
            key_code,
            pressed: false,
        })
        .await
    }

    pub async fn on_touch_event(
        &self,
        device_id: DeviceId,
        touch: TouchEvent,
    ) -> Result<bool, GameLoopError> {
        self.request(HostEvent::Motion {
            device_id,
            input: MotionInput::Touch(touch),
        })
        .await
    }

    pub async fn on_motion_event(
        &self,
        device_id: DeviceId,
        readings: AxisReadings,
    ) -> Result<bool, GameLoopError> {
        self.request(HostEvent::Motion {
            device_id,
            input: MotionInput::Axes(readings),
        })
        .await
    }

    /// Returns false when the host should handle back itself (exit)
    pub async fn on_back_pressed(&self) -> Result<bool, GameLoopError> {
        self.request(HostEvent::BackPressed).await
    }

    pub async fn on_device_added(&self, device: DeviceInfo) -> Result<(), GameLoopError> {
        self.request(HostEvent::DeviceAdded(device))
            .await
            .map(|_| ())
    }

    pub async fn on_device_removed(&self, device_id: DeviceId) -> Result<(), GameLoopError> {
        self.request(HostEvent::DeviceRemoved(device_id))
            .await
            .map(|_| ())
    }

    /// Cancels the simulation task and waits until it has released its resources
    pub async fn shutdown(mut self) -> Result<GameLoop<Terminated>, GameLoopError> {
        debug!("Sending shutdown signal to simulation task");
        self.cancel.cancel();

        if let Some(handle) = self.task_handle.take() {
            match handle.await {
                Ok(result) => result?,
                Err(e) => {
                    error!("Simulation task panicked: {}", e);
                    return Err(GameLoopError::TaskError(format!(
                        "Simulation task panicked: {}",
                        e
                    )));
                }
            }
        }

        info!("Game loop terminated");
        Ok(self.transition())
    }
}

impl GameLoop<Terminated> {
    /// Last snapshot published before shutdown
    pub fn last_frame(&self) -> FrameSnapshot {
        self.frame_receiver.borrow().clone()
    }
}

/// Tick counters, logged and reset every 30 seconds
#[derive(Debug)]
struct LoopStats {
    ticks: u64,
    overruns: u64,
    commands: u64,
    total_cost: Duration,
    last_log_time: chrono::DateTime<Local>,
}

impl LoopStats {
    fn new() -> Self {
        Self {
            ticks: 0,
            overruns: 0,
            commands: 0,
            total_cost: Duration::ZERO,
            last_log_time: Local::now(),
        }
    }

    fn record_tick(&mut self, cost: Duration, period: Duration) {
        self.ticks += 1;
        self.total_cost += cost;
        if cost >= period {
            self.overruns += 1;
            debug!("Tick overran its period: {:?} >= {:?}", cost, period);
        }
    }

    fn average_cost(&self) -> Duration {
        match u32::try_from(self.ticks) {
            Ok(ticks) if ticks > 0 => self.total_cost / ticks,
            _ => Duration::ZERO,
        }
    }

    fn maybe_log(&mut self) {
        let now = Local::now();
        let interval = chrono::Duration::seconds(STATS_INTERVAL_SECS);
        if now - self.last_log_time <= interval {
            return;
        }

        info!(
            "Game loop stats: {} ticks, {} overruns, {} commands in last {} seconds (avg tick {:?})",
            self.ticks,
            self.overruns,
            self.commands,
            interval.num_seconds(),
            self.average_cost()
        );
        *self = Self {
            last_log_time: now,
            ..Self::new()
        };
    }
}

impl Simulation {
    async fn run(mut self, period: Duration, cancel: CancellationToken) -> Result<(), GameLoopError> {
        info!("Simulation task running");
        if let Err(e) = self.audio.load_cue(&self.audio_cue) {
            warn!("Audio cue unavailable, continuing silently: {}", e);
        }

        let mut stats = LoopStats::new();
        let mut deadline = Instant::now();

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    info!("Shutdown signal received by simulation task");
                    break;
                }

                command = self.command_receiver.recv() => match command {
                    Some(command) => {
                        stats.commands += 1;
                        self.handle_command(command);
                    }
                    None => {
                        warn!("Command channel closed, stopping simulation");
                        break;
                    }
                },

                _ = tokio::time::sleep_until(deadline) => {
                    let tick_start = Instant::now();
                    self.tick();
                    let cost = tick_start.elapsed();
                    stats.record_tick(cost, period);
                    deadline = Instant::now() + next_tick_delay(period, cost);
                }
            }

            stats.maybe_log();
        }

        self.teardown();
        Ok(())
    }

    fn tick(&mut self) {
        self.logic.tick();

        for _ in 0..self.logic.take_pending_cues() {
            self.audio.play_one_shot(&self.audio_cue);
        }

        let snapshot = self.logic.snapshot();
        self.frame_sink.draw(&snapshot);
        self.frame_sender.send_replace(snapshot);
    }

    fn handle_command(&mut self, command: HostCommand) {
        let HostCommand { event, reply } = command;
        debug!("Host event: {:?}", event);

        let display_before = self.logic.display();
        let consumed = match event {
            HostEvent::SurfaceReady { width, height } => {
                let devices = self.devices.connected_devices();
                let count = self.logic.on_surface_ready(width, height, &devices);
                info!("Surface ready with {} controllers", count);
                true
            }
            HostEvent::SurfaceResized { width, height } => {
                self.logic.on_surface_resized(width, height);
                true
            }
            HostEvent::SurfaceLost => {
                self.logic.on_surface_lost();
                true
            }
            HostEvent::Key {
                device_id,
                key_code,
                pressed,
            } => self.logic.on_key(device_id, key_code, pressed),
            HostEvent::Motion { device_id, input } => {
                self.logic.process_motion_event(device_id, &input)
            }
            HostEvent::BackPressed => self.logic.process_back_pressed(),
            HostEvent::DeviceAdded(device) => {
                self.logic.bind_device(&device);
                true
            }
            HostEvent::DeviceRemoved(device_id) => {
                let devices = self.devices.connected_devices();
                self.logic.on_device_removed(device_id, &devices);
                true
            }
        };

        let display = self.logic.display();
        if display != display_before {
            self.frame_sink.display_changed(display);
        }

        if let Some(reply) = reply {
            if reply.send(consumed).is_err() {
                debug!("Host stopped waiting for the reply");
            }
        }
    }

    /// Runs exactly once, after the last tick
    fn teardown(&mut self) {
        self.audio.release();
        self.logic.clear_controllers();
        info!("Simulation task finished after {} frames", self.logic.frame());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_tick_waits_for_the_rest_of_the_period() {
        let period = Duration::from_millis(32);
        assert_eq!(
            next_tick_delay(period, Duration::from_millis(5)),
            Duration::from_millis(27)
        );
    }

    #[test]
    fn overrun_fires_next_tick_immediately() {
        let period = Duration::from_millis(32);
        assert_eq!(next_tick_delay(period, Duration::from_millis(40)), Duration::ZERO);
        assert_eq!(next_tick_delay(period, period), Duration::ZERO);
    }

    #[test]
    fn stats_count_overruns() {
        let mut stats = LoopStats::new();
        let period = Duration::from_millis(32);
        stats.record_tick(Duration::from_millis(10), period);
        stats.record_tick(Duration::from_millis(40), period);

        assert_eq!(stats.ticks, 2);
        assert_eq!(stats.overruns, 1);
        assert_eq!(stats.average_cost(), Duration::from_millis(25));
    }
}
