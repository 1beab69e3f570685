//! Read-only per-frame view handed to renderers and observers.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirdView {
    /// Population index of this bird.
    pub member: usize,
    pub x: f32,
    pub y: f32,
    pub tilt: f32,
    pub wing_frame: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleView {
    pub x: f32,
    pub top_sprite_y: f32,
    pub gap_top: f32,
    pub gap_bottom: f32,
    pub passed: bool,
}

/// Everything a renderer draws for one frame, plus the HUD counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub generation: u32,
    pub frame: u64,
    pub score: u32,
    pub alive: usize,
    pub birds: Vec<BirdView>,
    pub obstacles: Vec<ObstacleView>,
    pub floor_x: f32,
    pub floor_y: f32,
}

impl FrameSnapshot {
    /// One-line HUD text: score, generation and birds alive.
    pub fn hud_line(&self) -> String {
        format!(
            "Score: {}  Gen: {}  Birds Alive: {}",
            self.score, self.generation, self.alive
        )
    }
}
