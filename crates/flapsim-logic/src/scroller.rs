//! The scrolling floor band.

use serde::{Deserialize, Serialize};

use crate::config::SimConfig;

/// Horizontally repeating floor. Purely positional; the only gameplay
/// input it carries is the floor line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scroller {
    pub x: f32,
    /// Floor line (top of the drawn band).
    pub y: f32,
    pub velocity: f32,
    pub tile_width: f32,
    /// Birds deeper than `y - margin` are out of bounds.
    pub margin: f32,
}

impl Scroller {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            x: 0.0,
            y: config.floor_y(),
            velocity: config.floor.velocity,
            tile_width: config.floor.tile_width,
            margin: config.floor.margin,
        }
    }

    /// Scroll one frame, snapping back once a whole tile has gone by.
    pub fn advance(&mut self) {
        self.x -= self.velocity;
        if self.x <= -self.tile_width {
            self.x = 0.0;
        }
    }

    /// Deepest y a bird may occupy.
    pub fn playable_limit(&self) -> f32 {
        self.y - self.margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_after_one_tile() {
        let mut floor = Scroller::new(&SimConfig::default());
        for _ in 0..19 {
            floor.advance();
        }
        assert_eq!(floor.x, -47.5);
        floor.advance();
        assert_eq!(floor.x, 0.0);
    }

    #[test]
    fn stays_within_tile() {
        let mut floor = Scroller::new(&SimConfig::default());
        for _ in 0..1000 {
            floor.advance();
            assert!(floor.x <= 0.0 && floor.x > -floor.tile_width);
        }
        assert_eq!(floor.y, 734.0);
        assert_eq!(floor.playable_limit(), 724.0);
    }
}
