//! Game constants: playfield size, kinematics, obstacle geometry, fitness.
//!
//! These are the defaults behind [`SimConfig`](crate::config::SimConfig).
//! Sprite sizes are the 2× scaled dimensions of the game's artwork.

pub mod playfield {
    pub const WIDTH: f32 = 600.0;
    pub const HEIGHT: f32 = 800.0;
    /// Target pacing for interactive drivers. The core never sleeps.
    pub const FPS: u32 = 60;
}

pub mod bird {
    pub const SPAWN_X: f32 = 230.0;
    pub const SPAWN_Y: f32 = 350.0;
    pub const SPRITE_WIDTH: u32 = 68;
    pub const SPRITE_HEIGHT: u32 = 48;
    /// Velocity applied by a jump (negative is up).
    pub const JUMP_IMPULSE: f32 = -10.5;
    /// Coefficient of `t²` in the displacement curve.
    pub const GRAVITY: f32 = 1.5;
    /// Displacement cap per tick (terminal fall speed).
    pub const TERMINAL_DISPLACEMENT: f32 = 16.0;
    /// Extra upward push added while moving up.
    pub const UPWARD_EASE: f32 = 2.0;
    pub const MAX_TILT: f32 = 12.5;
    pub const MIN_TILT: f32 = -90.0;
    /// Degrees of nose-down rotation per frame while falling.
    pub const ROTATION_VELOCITY: f32 = 10.0;
    /// How far below the jump height the bird may sink before it starts to dive.
    pub const TILT_HOLD: f32 = 50.0;
    /// Frames each wing frame is held.
    pub const ANIMATION_TIME: u32 = 5;
    /// Below this tilt the wings are held in the glide frame.
    pub const GLIDE_TILT: f32 = -80.0;
}

pub mod obstacle {
    /// Vertical size of the passable gap.
    pub const GAP: f32 = 200.0;
    /// Horizontal scroll per frame.
    pub const VELOCITY: f32 = 2.5;
    /// Gap top is drawn from `GAP_MIN..GAP_MAX`.
    pub const GAP_MIN: i32 = 50;
    pub const GAP_MAX: i32 = 450;
    pub const SPAWN_X: f32 = 700.0;
    pub const SPRITE_WIDTH: u32 = 104;
    pub const SPRITE_HEIGHT: u32 = 640;
    /// Rows of full-width lip at the open end of a piece.
    pub const LIP_HEIGHT: u32 = 48;
    /// Columns the body is inset from each side of the lip.
    pub const BODY_INSET: u32 = 4;
}

pub mod floor {
    pub const SPRITE_HEIGHT: u32 = 132;
    pub const VELOCITY: f32 = 2.5;
    /// The floor tile repeats every this many pixels.
    pub const TILE_WIDTH: f32 = 50.0;
    /// Birds deeper than `floor_y - MARGIN` are out of bounds.
    pub const MARGIN: f32 = 10.0;
}

pub mod fitness {
    pub const SURVIVAL_REWARD: f32 = 0.1;
    pub const COLLISION_PENALTY: f32 = 1.0;
    pub const PASS_REWARD: f32 = 5.0;
}

pub mod run {
    pub const POPULATION_SIZE: usize = 50;
    pub const GENERATIONS: u32 = 50;
    pub const SEED: u64 = 0;
    /// Controller output above this triggers a jump.
    pub const JUMP_THRESHOLD: f32 = 0.5;
    /// Width in degrees of one pre-rotated bird mask.
    pub const TILT_BUCKET: f32 = 2.5;
    /// Upper bound on pre-rotated bird masks per run.
    pub const MAX_TILT_BUCKETS: usize = 721;
}

/// Floor y for a playfield of `height` with a floor sprite of `sprite_height`.
///
/// The floor sprite is drawn half off the bottom of the window.
pub fn floor_y(height: f32, sprite_height: u32) -> f32 {
    height - sprite_height as f32 / 2.0
}
