//! Display geometry shared by every entity.
//!
//! Entities receive a [`DisplayContext`] value instead of reading ambient
//! display state; `GameLogic::set_display` pushes a new context into them.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayContext {
    pub width: i32,
    pub height: i32,
}

impl DisplayContext {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// The visible screen area
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    /// Screen area extended one screen height upwards so candies can fall in
    pub fn extended_bounds(&self) -> Rect {
        Rect::new(0, -self.height, self.width, self.height)
    }

    pub fn player_size(&self) -> i32 {
        self.width / 8
    }

    pub fn candy_size(&self) -> i32 {
        self.width / 30
    }
}

/// Integer rectangle, right/bottom exclusive for points
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Square of side `2 * half` around a center point
    pub const fn around(cx: i32, cy: i32, half: i32) -> Self {
        Self::new(cx - half, cy - half, cx + half, cy + half)
    }

    pub fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        !self.is_empty() && x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }

    /// An empty rectangle contains nothing
    pub fn contains_rect(&self, other: &Rect) -> bool {
        !self.is_empty()
            && self.left <= other.left
            && self.top <= other.top
            && self.right >= other.right
            && self.bottom >= other.bottom
    }
}

/// Float rectangle used for touch hit regions
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RectF {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl RectF {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        self.left < self.right
            && self.top < self.bottom
            && x >= self.left
            && x < self.right
            && y >= self.top
            && y < self.bottom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_containment_is_inclusive_for_rects() {
        let screen = Rect::new(0, 0, 800, 600);
        assert!(screen.contains_rect(&Rect::new(0, 0, 800, 600)));
        assert!(screen.contains_rect(&Rect::around(50, 300, 50)));
        assert!(!screen.contains_rect(&Rect::around(49, 300, 50)));
        assert!(!Rect::default().contains_rect(&Rect::default()));
    }

    #[test]
    fn point_containment_excludes_far_edges() {
        let extended = DisplayContext::new(640, 480).extended_bounds();
        assert!(extended.contains_point(0, -480));
        assert!(extended.contains_point(639, 479));
        assert!(!extended.contains_point(640, 0));
        assert!(!extended.contains_point(10, 480));
        assert!(!extended.contains_point(-1, 0));
    }

    #[test]
    fn entity_sizes_follow_display_width() {
        let display = DisplayContext::new(800, 600);
        assert_eq!(display.player_size(), 100);
        assert_eq!(display.candy_size(), 26);
    }
}
