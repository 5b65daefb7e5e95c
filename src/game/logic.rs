//! Game Logic - the Stopped / Paused / Playing state machine
//!
//! [`GameLogic`] owns the controller registry, the player roster and the candy
//! pool. The runtime feeds it host events between ticks and calls
//! [`GameLogic::tick`] once per frame period; nothing in here blocks or sleeps.
//!
//! ```text
//!            A                      back
//! Stopped ───────► Playing ◄──────────────► Paused
//!    ▲               (A)                      │
//!    └────────────────────────────────────────┘
//!                 B or back
//! ```
//!
//! Removing a controller forces Paused from any state; a display change
//! pauses a running game.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use super::collision::check_collisions;
use super::display::DisplayContext;
use super::objects::{Candy, Player, PlayerRoster};
use super::snapshot::{CandyView, FrameSnapshot, PlayerView};
use super::GameState;
use crate::config::{BindingDiscipline, GameConfig};
use crate::controller::binding::{DeviceInfo, MotionInput};
use crate::controller::input_mapper::{DeviceId, LogicalAxis, LogicalButton, KEYCODE_BACK};
use crate::controller::registry::ControllerRegistry;

pub struct GameLogic {
    config: GameConfig,
    state: GameState,
    display: DisplayContext,
    registry: ControllerRegistry,
    roster: PlayerRoster,
    candies: Vec<Candy>,
    data_initialized: bool,
    rng: StdRng,
    pending_cues: u32,
    frame: u64,
}

impl GameLogic {
    pub fn new(config: GameConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Deterministic candy spawns for a given seed
    pub fn with_rng(config: GameConfig, rng: StdRng) -> Self {
        info!(
            "Game logic created ({:?} binding, {} candies)",
            config.binding_discipline, config.candy_pool_size
        );
        Self {
            config,
            state: GameState::Stopped,
            display: DisplayContext::default(),
            registry: ControllerRegistry::new(),
            roster: PlayerRoster::new(),
            candies: Vec::new(),
            data_initialized: false,
            rng,
            pending_cues: 0,
            frame: 0,
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn display(&self) -> DisplayContext {
        self.display
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn is_data_initialized(&self) -> bool {
        self.data_initialized
    }

    pub fn registry(&self) -> &ControllerRegistry {
        &self.registry
    }

    pub fn controller_count(&self) -> usize {
        self.registry.controller_count()
    }

    pub fn players(&self) -> &[Player] {
        self.roster.players()
    }

    pub fn players_mut(&mut self) -> &mut [Player] {
        self.roster.players_mut()
    }

    pub fn candies(&self) -> &[Candy] {
        &self.candies
    }

    pub fn candies_mut(&mut self) -> &mut [Candy] {
        &mut self.candies
    }

    /// Catch cues accumulated since the last call
    pub fn take_pending_cues(&mut self) -> u32 {
        std::mem::take(&mut self.pending_cues)
    }

    /// Moves to `target`, runs its entry action and evaluates it once.
    ///
    /// Requesting the current state is a no-op and returns false.
    pub fn request_transition(&mut self, target: GameState) -> bool {
        if self.state == target {
            return false;
        }

        info!("Game state {} -> {}", self.state, target);
        self.state = target;
        self.enter_state();
        self.update_state();
        true
    }

    /// Only a running game can be paused
    pub fn request_pause(&mut self) -> bool {
        match self.state {
            GameState::Playing => self.request_transition(GameState::Paused),
            _ => false,
        }
    }

    /// One simulation step
    pub fn tick(&mut self) {
        self.update_state();
        self.frame += 1;
    }

    fn enter_state(&mut self) {
        match self.state {
            GameState::Stopped => self.data_initialized = false,
            GameState::Paused => {}
            GameState::Playing => {
                if !self.data_initialized {
                    self.init_game_data();
                }
            }
        }
    }

    fn update_state(&mut self) {
        match self.state {
            GameState::Stopped => self.process_main_menu_input(),
            GameState::Paused => self.process_paused_menu_input(),
            GameState::Playing => {
                self.process_players_move();
                self.process_candies_move();
                self.process_collisions();
            }
        }
    }

    /// Fresh roster in registry order and a full candy pool
    fn init_game_data(&mut self) {
        self.roster.clear();
        for binding in self.registry.bindings() {
            self.roster.spawn(self.display, binding.descriptor());
        }

        self.candies.clear();
        for _ in 0..self.config.candy_pool_size {
            self.candies.push(Candy::new(
                self.display,
                self.config.max_candy_velocity,
                &mut self.rng,
            ));
        }

        self.data_initialized = true;
        info!(
            "New game: {} players, {} candies on {}x{}",
            self.roster.len(),
            self.candies.len(),
            self.display.width,
            self.display.height
        );
    }

    fn process_main_menu_input(&mut self) {
        let start = self
            .registry
            .bindings()
            .any(|binding| binding.is_pressed(LogicalButton::A));
        if start {
            self.request_transition(GameState::Playing);
        }
    }

    fn process_paused_menu_input(&mut self) {
        let choice = self.registry.bindings().find_map(|binding| {
            if binding.is_pressed(LogicalButton::A) {
                Some(GameState::Playing)
            } else if binding.is_pressed(LogicalButton::B) {
                Some(GameState::Stopped)
            } else {
                None
            }
        });
        if let Some(target) = choice {
            self.request_transition(target);
        }
    }

    fn process_players_move(&mut self) {
        let ratio = self.config.move_ratio;
        for player in self.roster.players_mut() {
            let Some(binding) = self.registry.find_by_descriptor(player.controller_descriptor())
            else {
                continue;
            };

            let dx = ((binding.axis(LogicalAxis::HatX) + binding.axis(LogicalAxis::X)) * ratio)
                as i32;
            player.move_by(dx, 0);
            player.rotate(binding.axis(LogicalAxis::Z) * ratio);
        }
    }

    fn process_candies_move(&mut self) {
        for candy in &mut self.candies {
            candy.advance(&mut self.rng);
        }
    }

    fn process_collisions(&mut self) {
        let report = check_collisions(self.roster.players_mut(), &mut self.candies, &mut self.rng);
        self.pending_cues += report.hits.len() as u32;
    }

    /// Multi-controller bind; returns the controller count
    pub fn add_controller(&mut self, device: &DeviceInfo) -> usize {
        self.registry
            .bind_or_rebind(device, self.display, &mut self.roster)
            .controller_count
    }

    /// Single-controller bind; returns the controller count
    pub fn set_current_controller(&mut self, device: &DeviceInfo) -> usize {
        self.registry
            .set_primary(device, self.display, &mut self.roster)
            .controller_count
    }

    /// Drops the binding of `device_id`; any removal pauses the game
    pub fn remove_controller(&mut self, device_id: DeviceId) -> usize {
        let result = self.registry.unbind(device_id);
        if result.should_pause() {
            self.request_transition(GameState::Paused);
        }
        result.controller_count
    }

    /// Binds a device according to the configured discipline
    pub fn bind_device(&mut self, device: &DeviceInfo) -> usize {
        match self.config.binding_discipline {
            BindingDiscipline::Multi => self.add_controller(device),
            BindingDiscipline::Single => self.set_current_controller(device),
        }
    }

    /// Removal notification; in single mode the remaining devices are scanned again
    pub fn on_device_removed(&mut self, device_id: DeviceId, remaining: &[DeviceInfo]) -> usize {
        let count = self.remove_controller(device_id);
        if self.config.binding_discipline != BindingDiscipline::Single {
            return count;
        }

        let mut count = count;
        for device in remaining.iter().filter(|d| d.device_id != device_id) {
            count = self.set_current_controller(device);
        }
        count
    }

    /// Key events from unknown devices are swallowed too
    pub fn process_key_event(&mut self, device_id: DeviceId, key_code: i32, pressed: bool) -> bool {
        match self.registry.find_by_device_id_mut(device_id) {
            Some(binding) => binding.apply_key_event(key_code, pressed),
            None => debug!("Key {} from unbound device {}", key_code, device_id),
        }
        true
    }

    /// Returns false when no binding exists for the device
    pub fn process_motion_event(&mut self, device_id: DeviceId, input: &MotionInput) -> bool {
        match self.registry.find_by_device_id_mut(device_id) {
            Some(binding) => {
                binding.apply_motion(input);
                true
            }
            None => {
                debug!("Motion from unbound device {}", device_id);
                false
            }
        }
    }

    /// Host key entry point; BACK is left to [`GameLogic::process_back_pressed`]
    pub fn on_key(&mut self, device_id: DeviceId, key_code: i32, pressed: bool) -> bool {
        if key_code == KEYCODE_BACK {
            return false;
        }
        self.process_key_event(device_id, key_code, pressed)
    }

    /// Back navigation; false means the host should handle it (exit)
    pub fn process_back_pressed(&mut self) -> bool {
        match self.state {
            GameState::Stopped => false,
            GameState::Paused => self.request_transition(GameState::Stopped),
            GameState::Playing => self.request_transition(GameState::Paused),
        }
    }

    /// Returns true if the geometry actually changed
    pub fn set_display(&mut self, width: i32, height: i32) -> bool {
        let display = DisplayContext::new(width, height);
        if display == self.display {
            return false;
        }

        if display.is_empty() {
            warn!("Empty display {}x{}", width, height);
        }
        self.display = display;
        self.roster.set_display(display);
        for candy in &mut self.candies {
            candy.set_display(display);
        }
        self.registry.set_display(display);
        info!("Display set to {}x{}", width, height);
        true
    }

    /// Surface became available: take its geometry and bind what is connected
    pub fn on_surface_ready(&mut self, width: i32, height: i32, devices: &[DeviceInfo]) -> usize {
        self.set_display(width, height);
        for device in devices {
            self.bind_device(device);
        }
        self.controller_count()
    }

    pub fn on_surface_resized(&mut self, width: i32, height: i32) -> bool {
        let changed = self.set_display(width, height);
        self.request_pause();
        changed
    }

    pub fn on_surface_lost(&mut self) {
        self.request_pause();
    }

    /// Releases every binding, used at teardown
    pub fn clear_controllers(&mut self) {
        self.registry.clear();
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            frame: self.frame,
            state: self.state,
            display: self.display,
            controller_count: self.registry.controller_count(),
            players: self.roster.players().iter().map(PlayerView::from).collect(),
            candies: self.candies.iter().map(CandyView::from).collect(),
            published_at: chrono::Local::now(),
        }
    }
}
