//! Collision pass between every player and every candy.
//!
//! O(players x candies); at single-digit player counts and a handful of
//! candies no spatial partitioning is needed.

use rand::Rng;
use tracing::debug;

use super::objects::{Candy, Player};

/// Result of one collision pass
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollisionReport {
    /// One entry per scoring hit: (candy index, player index)
    pub hits: Vec<(usize, usize)>,
    /// Candies recycled by this pass
    pub candies_reset: usize,
}

impl CollisionReport {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

fn distance(a: (i32, i32), b: (i32, i32)) -> f32 {
    let dx = (a.0 - b.0) as f32;
    let dy = (a.1 - b.1) as f32;
    (dx * dx + dy * dy).sqrt()
}

/// Scores every player touching a candy, then recycles that candy once
pub fn check_collisions<R: Rng + ?Sized>(
    players: &mut [Player],
    candies: &mut [Candy],
    rng: &mut R,
) -> CollisionReport {
    let mut report = CollisionReport::default();

    for (candy_index, candy) in candies.iter_mut().enumerate() {
        let candy_pos = candy.position();
        let mut needs_reset = false;

        for (player_index, player) in players.iter_mut().enumerate() {
            if distance(player.position(), candy_pos) < player.size() as f32 / 2.0 {
                player.add_score();
                report.hits.push((candy_index, player_index));
                needs_reset = true;
                debug!(
                    "Player {} caught candy {} (score {})",
                    player_index,
                    candy_index,
                    player.score()
                );
            }
        }

        if needs_reset {
            candy.reset(rng);
            report.candies_reset += 1;
        }
    }

    report
}
