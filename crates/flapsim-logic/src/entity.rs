//! Bird kinematics: jump impulse, parabolic fall, tilt and wing animation.
//!
//! Vertical motion is driven by the ticks elapsed since the last jump rather
//! than by integrating velocity. Each frame the displacement
//! `d = v·t + g·t²` is clamped to the terminal value, eased upward when
//! negative, and half of it is applied to `y`. Tilt and wing frame only
//! affect the rendered silhouette (and therefore the collision mask), never
//! the physics.

use serde::{Deserialize, Serialize};

use crate::config::BirdParams;
use crate::obstacle::Obstacle;

/// What a controller sees each frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Bird y.
    pub y: f32,
    /// Distance from the bird to the upper edge of the target gap.
    pub gap_top_distance: f32,
    /// Distance from the bird to the lower edge of the target gap.
    pub gap_bottom_distance: f32,
}

impl Observation {
    pub fn as_array(&self) -> [f32; 3] {
        [self.y, self.gap_top_distance, self.gap_bottom_distance]
    }
}

/// A single controlled bird.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bird {
    /// Horizontal position, fixed for the whole run.
    pub x: f32,
    pub y: f32,
    /// Velocity set by the last jump.
    pub velocity: f32,
    /// Ticks since the last jump.
    pub ticks: u32,
    /// y at the last jump, used for tilt decisions.
    pub reference_height: f32,
    /// Rendered tilt in degrees, positive is nose-up.
    pub tilt: f32,
    /// Frames into the wing-flap cycle.
    pub animation_ticks: u32,
}

impl Bird {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            velocity: 0.0,
            ticks: 0,
            reference_height: y,
            tilt: 0.0,
            animation_ticks: 0,
        }
    }

    /// Spawn at the configured coordinates.
    pub fn spawn(params: &BirdParams) -> Self {
        Self::new(params.spawn_x, params.spawn_y)
    }

    pub fn jump(&mut self, params: &BirdParams) {
        self.velocity = params.jump_impulse;
        self.ticks = 0;
        self.reference_height = self.y;
    }

    /// Advance one frame. Returns the displacement `d` (y moved by `d / 2`).
    pub fn advance(&mut self, params: &BirdParams) -> f32 {
        self.ticks += 1;
        let t = self.ticks as f32;

        let mut d = self.velocity * t + params.gravity * t * t;
        if d >= params.terminal_displacement {
            d = params.terminal_displacement;
        }
        if d < 0.0 {
            d -= params.upward_ease;
        }

        self.y += d / 2.0;

        if d < 0.0 || self.y < self.reference_height + params.tilt_hold {
            if self.tilt < params.max_tilt {
                self.tilt = params.max_tilt;
            }
        } else {
            self.tilt = (self.tilt - params.rotation_velocity).max(params.min_tilt);
        }

        self.animation_ticks += 1;
        if self.animation_ticks > params.animation_time * 4 {
            self.animation_ticks = 0;
        }
        // Diving holds the glide frame and re-phases the cycle to its middle.
        if self.tilt <= params.glide_tilt {
            self.animation_ticks = params.animation_time * 2;
        }

        d
    }

    /// Wing frame to draw: 0, 1, 2, 1 held `animation_time` frames each
    /// (the last for one extra frame), or the glide frame 1 while diving.
    pub fn wing_frame(&self, params: &BirdParams) -> u8 {
        if self.tilt <= params.glide_tilt {
            return 1;
        }
        let hold = params.animation_time;
        match self.animation_ticks {
            t if t < hold => 0,
            t if t < hold * 2 => 1,
            t if t < hold * 3 => 2,
            _ => 1,
        }
    }

    /// Build the controller input against the target obstacle.
    pub fn observe(&self, target: &Obstacle) -> Observation {
        Observation {
            y: self.y,
            gap_top_distance: (self.y - target.gap_top).abs(),
            gap_bottom_distance: (self.y - target.gap_bottom).abs(),
        }
    }

    /// True if the bird has left the legal vertical band.
    pub fn out_of_bounds(&self, lowest_legal_y: f32) -> bool {
        self.y < 0.0 || self.y > lowest_legal_y
    }
}
