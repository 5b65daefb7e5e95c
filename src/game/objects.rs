//! Game objects: players, candies and the player roster.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use super::display::{DisplayContext, Rect};

/// ARGB colors players cycle through
pub const PLAYER_COLORS: [u32; 4] = [0xFF00_00FF, 0xFFCC_CCCC, 0xFF00_FF00, 0xFFFF_FF00];

/// ARGB colors candies are painted with
pub const CANDY_COLORS: [u32; 12] = [
    0xFFF4_4336,
    0xFFFF_EBEE,
    0xFFFF_80AB,
    0xFFFF_4081,
    0xFFF5_0057,
    0xFFC5_1162,
    0xFFB9_F6CA,
    0xFF69_F0AE,
    0xFF00_E676,
    0xFF00_C853,
    0xFFF4_FF81,
    0xFFEE_FF41,
];

pub const DEFAULT_MAX_CANDY_VELOCITY: i32 = 15;

/// Sprite facing, the sign of the last horizontal delta
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Left,
    #[default]
    Center,
    Right,
}

impl Direction {
    pub fn from_delta(dx: i32) -> Self {
        match dx.signum() {
            -1 => Direction::Left,
            1 => Direction::Right,
            _ => Direction::Center,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    x: i32,
    y: i32,
    direction: Direction,
    rotation: f32,
    score: u32,
    color_index: usize,
    controller_descriptor: String,
    display: DisplayContext,
}

impl Player {
    /// A player at the origin, not yet placed
    pub fn new(display: DisplayContext, descriptor: impl Into<String>, color_index: usize) -> Self {
        Self {
            x: 0,
            y: 0,
            direction: Direction::Center,
            rotation: 0.0,
            score: 0,
            color_index: color_index % PLAYER_COLORS.len(),
            controller_descriptor: descriptor.into(),
            display,
        }
    }

    /// Creates a player on the catch line: horizontally centered, resting on the bottom edge
    pub fn spawn(display: DisplayContext, descriptor: impl Into<String>, color_index: usize) -> Self {
        let mut player = Self::new(display, descriptor, color_index);
        // Rests on the bottom edge, not near mid-height
        let (x, y) = catch_line_position(display);
        player.move_by(x, y);
        player
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn size(&self) -> i32 {
        self.display.player_size()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn color_index(&self) -> usize {
        self.color_index
    }

    pub fn color(&self) -> u32 {
        PLAYER_COLORS[self.color_index]
    }

    pub fn controller_descriptor(&self) -> &str {
        &self.controller_descriptor
    }

    pub fn set_controller_descriptor(&mut self, descriptor: impl Into<String>) {
        self.controller_descriptor = descriptor.into();
    }

    /// Takes the new geometry. A player whose box no longer fits goes back to the catch line.
    pub fn set_display(&mut self, display: DisplayContext) {
        self.display = display;
        if self.fits_at(self.x, self.y) {
            return;
        }

        let (x, y) = catch_line_position(display);
        if self.set_position(x, y) {
            debug!(
                "Player {} re-placed at ({}, {}) on {}x{}",
                self.controller_descriptor, x, y, self.display.width, self.display.height
            );
        }
    }

    fn fits_at(&self, x: i32, y: i32) -> bool {
        let half = self.size() / 2;
        let reachable = |c: i32| c.checked_sub(half).is_some() && c.checked_add(half).is_some();
        reachable(x)
            && reachable(y)
            && self.display.bounds().contains_rect(&Rect::around(x, y, half))
    }

    /// Moves unless the bounding box would leave the display; a rejected move is dropped.
    pub fn move_by(&mut self, dx: i32, dy: i32) -> bool {
        self.direction = Direction::from_delta(dx);

        let (Some(x), Some(y)) = (self.x.checked_add(dx), self.y.checked_add(dy)) else {
            return false;
        };
        if self.fits_at(x, y) {
            self.x = x;
            self.y = y;
            true
        } else {
            false
        }
    }

    /// Absolute placement with the same bounds check as [`Player::move_by`]
    pub fn set_position(&mut self, x: i32, y: i32) -> bool {
        if self.fits_at(x, y) {
            self.x = x;
            self.y = y;
            true
        } else {
            false
        }
    }

    pub fn rotate(&mut self, delta: f32) {
        self.rotation += delta;
    }

    pub fn add_score(&mut self) {
        self.score += 1;
    }
}

#[derive(Clone, Debug)]
pub struct Candy {
    x: i32,
    y: i32,
    velocity_x: i32,
    velocity_y: i32,
    acceleration: f32,
    acceleration_sum: f32,
    colors: [u32; 3],
    max_velocity: i32,
    display: DisplayContext,
}

impl Candy {
    pub fn new<R: Rng + ?Sized>(display: DisplayContext, max_velocity: i32, rng: &mut R) -> Self {
        let mut candy = Self {
            x: 0,
            y: 0,
            velocity_x: 0,
            velocity_y: 0,
            acceleration: 0.0,
            acceleration_sum: 0.0,
            colors: [CANDY_COLORS[0]; 3],
            max_velocity,
            display,
        };
        candy.reset(rng);
        candy
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn velocity(&self) -> (i32, i32) {
        (self.velocity_x, self.velocity_y)
    }

    pub fn acceleration(&self) -> f32 {
        self.acceleration
    }

    pub fn size(&self) -> i32 {
        self.display.candy_size()
    }

    pub fn colors(&self) -> [u32; 3] {
        self.colors
    }

    pub fn set_display(&mut self, display: DisplayContext) {
        self.display = display;
    }

    /// Unchecked placement; the next [`Candy::advance`] recycles it if out of range
    pub fn place(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    pub fn set_velocity(&mut self, velocity_x: i32, velocity_y: i32) {
        self.velocity_x = velocity_x;
        self.velocity_y = velocity_y;
    }

    /// Draws a fresh spawn state; candies may spawn above the visible top edge
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let width = self.display.width.max(1);
        let half_height = (self.display.height / 2).max(1);

        self.x = rng.gen_range(0..width);
        self.y = rng.gen_range(-half_height..half_height);
        self.velocity_x = rng.gen_range(-2..=2);
        self.velocity_y = rng.gen_range(2..=7);
        self.acceleration = rng.gen_range(1..=3) as f32 / 60.0;
        self.acceleration_sum = 0.0;

        for color in self.colors.iter_mut() {
            *color = CANDY_COLORS[rng.gen_range(0..CANDY_COLORS.len())];
        }
    }

    /// One physics step; returns true if the candy left its range and was recycled
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        self.acceleration_sum += self.acceleration;

        if self.acceleration_sum > 1.0 {
            self.velocity_x = if self.velocity_x > 0 {
                self.velocity_x + 1
            } else {
                self.velocity_x - 1
            };
            self.velocity_y = (self.velocity_y + 1).min(self.max_velocity);
            self.acceleration_sum = 0.0;
        }

        self.x += self.velocity_x;
        self.y += self.velocity_y;

        if self.display.extended_bounds().contains_point(self.x, self.y) {
            false
        } else {
            self.reset(rng);
            true
        }
    }
}

/// Players in join order, indexed by the descriptor of their controller
#[derive(Debug, Default)]
pub struct PlayerRoster {
    players: Vec<Player>,
    by_descriptor: HashMap<String, usize>,
    next_color: usize,
}

impl PlayerRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a player on the catch line; colors keep rotating across restarts
    pub fn spawn(&mut self, display: DisplayContext, descriptor: &str) -> usize {
        let player = Player::spawn(display, descriptor, self.next_color);
        self.next_color = (self.next_color + 1) % PLAYER_COLORS.len();

        let index = self.players.len();
        self.players.push(player);
        self.by_descriptor.insert(descriptor.to_string(), index);
        index
    }

    pub fn index_of(&self, descriptor: &str) -> Option<usize> {
        self.by_descriptor.get(descriptor).copied()
    }

    /// Points an existing player at a different controller
    pub fn rebind(&mut self, index: usize, descriptor: &str) {
        let Some(player) = self.players.get_mut(index) else {
            return;
        };
        let previous = player.controller_descriptor().to_string();
        player.set_controller_descriptor(descriptor);

        if self.by_descriptor.get(&previous) == Some(&index) {
            self.by_descriptor.remove(&previous);
        }
        self.by_descriptor.insert(descriptor.to_string(), index);
    }

    pub fn clear(&mut self) {
        self.players.clear();
        self.by_descriptor.clear();
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Player> {
        self.players.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Player> {
        self.players.get_mut(index)
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn players_mut(&mut self) -> &mut [Player] {
        &mut self.players
    }

    pub fn set_display(&mut self, display: DisplayContext) {
        for player in &mut self.players {
            player.set_display(display);
        }
    }
}

/// Center of a player resting on the bottom edge
fn catch_line_position(display: DisplayContext) -> (i32, i32) {
    let size = display.player_size();
    ((display.width - size) / 2, display.height - size / 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn display() -> DisplayContext {
        DisplayContext::new(800, 600)
    }

    #[test]
    fn rejected_move_leaves_position_unchanged() {
        let mut player = Player::new(display(), "pad", 0);
        assert_eq!(player.size(), 100);
        assert!(player.set_position(50, 300));

        assert!(!player.move_by(-100, 0));
        assert_eq!(player.position(), (50, 300));
        assert_eq!(player.direction(), Direction::Left);
    }

    #[test]
    fn moves_never_leave_the_display() {
        let mut player = Player::spawn(display(), "pad", 0);
        let deltas = [(-37, 0), (120, -45), (999, 0), (-5, 400), (13, 13), (-800, -3)];
        for _ in 0..50 {
            for (dx, dy) in deltas {
                player.move_by(dx, dy);
                let half = player.size() / 2;
                let (x, y) = player.position();
                assert!(x - half >= 0 && x + half <= 800, "x={x}");
                assert!(y - half >= 0 && y + half <= 600, "y={y}");
            }
        }
    }

    #[test]
    fn spawn_places_player_on_the_bottom_edge() {
        let player = Player::spawn(display(), "pad", 0);
        assert_eq!(player.position(), (350, 550));
        assert_eq!(player.direction(), Direction::Right);
    }

    #[test]
    fn shrinking_display_puts_player_back_on_the_catch_line() {
        let mut player = Player::spawn(display(), "pad", 0);
        player.set_display(DisplayContext::new(400, 300));

        assert_eq!(player.size(), 50);
        assert_eq!(player.position(), (175, 275));
        assert!(player.move_by(-10, 0));
        assert_eq!(player.position(), (165, 275));
    }

    #[test]
    fn growing_display_keeps_a_fitting_player_in_place() {
        let mut player = Player::spawn(display(), "pad", 0);
        player.set_display(DisplayContext::new(1024, 768));

        assert_eq!(player.size(), 128);
        assert_eq!(player.position(), (350, 550));
    }

    #[test]
    fn overflowing_move_is_rejected() {
        let mut player = Player::spawn(display(), "pad", 0);

        assert!(!player.move_by(i32::MAX, 0));
        assert!(!player.move_by(0, i32::MIN));
        assert!(!player.set_position(i32::MAX, i32::MAX));
        assert_eq!(player.position(), (350, 550));
    }

    #[test]
    fn rotation_and_score_accumulate() {
        let mut player = Player::new(display(), "pad", 5);
        player.rotate(2.5);
        player.rotate(-1.0);
        player.add_score();
        player.add_score();

        assert_eq!(player.rotation(), 1.5);
        assert_eq!(player.score(), 2);
        assert_eq!(player.color_index(), 1);
    }

    #[test]
    fn candy_spawns_inside_spawn_range() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let candy = Candy::new(display(), DEFAULT_MAX_CANDY_VELOCITY, &mut rng);
            let (x, y) = candy.position();
            let (vx, vy) = candy.velocity();
            assert!((0..800).contains(&x));
            assert!((-300..300).contains(&y));
            assert!((-2..=2).contains(&vx));
            assert!((2..=7).contains(&vy));
            assert!(candy.acceleration() > 0.0 && candy.acceleration() <= 3.0 / 60.0);
            assert!(candy.colors().iter().all(|c| CANDY_COLORS.contains(c)));
        }
    }

    #[test]
    fn candy_is_recycled_after_leaving_the_screen() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut candy = Candy::new(display(), DEFAULT_MAX_CANDY_VELOCITY, &mut rng);

        let mut recycled = false;
        for _ in 0..1_000 {
            if candy.advance(&mut rng) {
                recycled = true;
                break;
            }
        }

        assert!(recycled);
        let (x, y) = candy.position();
        assert!((0..800).contains(&x));
        assert!((-300..300).contains(&y));
    }

    #[test]
    fn candy_acceleration_pushes_away_from_zero_and_caps() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut candy = Candy::new(DisplayContext::new(100_000, 100_000), 15, &mut rng);
        candy.place(50_000, 0);
        candy.set_velocity(0, 14);

        for _ in 0..200 {
            candy.advance(&mut rng);
        }

        let (vx, vy) = candy.velocity();
        assert!(vx < 0);
        assert_eq!(vy, 15);
    }

    #[test]
    fn roster_rebind_moves_the_descriptor_index() {
        let mut roster = PlayerRoster::new();
        let first = roster.spawn(display(), "D1");
        roster.spawn(display(), "D2");

        roster.rebind(first, "D3");
        assert_eq!(roster.index_of("D1"), None);
        assert_eq!(roster.index_of("D3"), Some(first));
        assert_eq!(roster.get(first).unwrap().controller_descriptor(), "D3");
    }

    #[test]
    fn roster_colors_rotate_across_clears() {
        let mut roster = PlayerRoster::new();
        roster.spawn(display(), "a");
        roster.spawn(display(), "b");
        roster.clear();
        let index = roster.spawn(display(), "c");
        assert_eq!(roster.get(index).unwrap().color_index(), 2);
    }
}
