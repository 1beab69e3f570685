//! Run configuration and validation.
//!
//! Every tunable the simulation reads lives in [`SimConfig`]. Defaults come
//! from [`constants`](crate::constants), and missing fields in a deserialized
//! config fall back to them, so a config file only needs the values it changes.
//!
//! ```
//! use flapsim_logic::config::{validate_config, SimConfig};
//!
//! let mut config = SimConfig::default();
//! config.population_size = 20;
//! assert!(validate_config(&config).is_empty());
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::{self, bird, fitness, floor, obstacle, playfield, run};

/// Full configuration for a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Birds per generation.
    pub population_size: usize,
    /// Generations the external trainer intends to run.
    pub generations: u32,
    /// Base seed; each generation derives its own obstacle seed from it.
    pub seed: u64,
    pub playfield: PlayfieldParams,
    pub bird: BirdParams,
    pub obstacle: ObstacleParams,
    pub floor: FloorParams,
    pub fitness: FitnessParams,
    /// Controller output above this triggers a jump.
    pub jump_threshold: f32,
    /// Width in degrees of one pre-rotated bird mask.
    pub tilt_bucket: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            population_size: run::POPULATION_SIZE,
            generations: run::GENERATIONS,
            seed: run::SEED,
            playfield: PlayfieldParams::default(),
            bird: BirdParams::default(),
            obstacle: ObstacleParams::default(),
            floor: FloorParams::default(),
            fitness: FitnessParams::default(),
            jump_threshold: run::JUMP_THRESHOLD,
            tilt_bucket: run::TILT_BUCKET,
        }
    }
}

impl SimConfig {
    /// The floor line the scroller is drawn at.
    pub fn floor_y(&self) -> f32 {
        constants::floor_y(self.playfield.height, self.floor.sprite_height)
    }

    /// Deepest y a bird may reach and stay alive.
    pub fn lowest_legal_y(&self) -> f32 {
        self.floor_y() - self.floor.margin
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayfieldParams {
    pub width: f32,
    pub height: f32,
    /// Pacing hint for interactive drivers.
    pub fps: u32,
}

impl Default for PlayfieldParams {
    fn default() -> Self {
        Self {
            width: playfield::WIDTH,
            height: playfield::HEIGHT,
            fps: playfield::FPS,
        }
    }
}

/// Bird kinematics and sprite size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BirdParams {
    pub spawn_x: f32,
    pub spawn_y: f32,
    pub sprite_width: u32,
    pub sprite_height: u32,
    pub jump_impulse: f32,
    pub gravity: f32,
    pub terminal_displacement: f32,
    pub upward_ease: f32,
    pub max_tilt: f32,
    pub min_tilt: f32,
    pub rotation_velocity: f32,
    pub tilt_hold: f32,
    pub animation_time: u32,
    pub glide_tilt: f32,
}

impl Default for BirdParams {
    fn default() -> Self {
        Self {
            spawn_x: bird::SPAWN_X,
            spawn_y: bird::SPAWN_Y,
            sprite_width: bird::SPRITE_WIDTH,
            sprite_height: bird::SPRITE_HEIGHT,
            jump_impulse: bird::JUMP_IMPULSE,
            gravity: bird::GRAVITY,
            terminal_displacement: bird::TERMINAL_DISPLACEMENT,
            upward_ease: bird::UPWARD_EASE,
            max_tilt: bird::MAX_TILT,
            min_tilt: bird::MIN_TILT,
            rotation_velocity: bird::ROTATION_VELOCITY,
            tilt_hold: bird::TILT_HOLD,
            animation_time: bird::ANIMATION_TIME,
            glide_tilt: bird::GLIDE_TILT,
        }
    }
}

/// Obstacle geometry and scrolling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleParams {
    pub gap: f32,
    pub velocity: f32,
    pub gap_min: i32,
    pub gap_max: i32,
    pub spawn_x: f32,
    pub sprite_width: u32,
    pub sprite_height: u32,
    pub lip_height: u32,
    pub body_inset: u32,
}

impl Default for ObstacleParams {
    fn default() -> Self {
        Self {
            gap: obstacle::GAP,
            velocity: obstacle::VELOCITY,
            gap_min: obstacle::GAP_MIN,
            gap_max: obstacle::GAP_MAX,
            spawn_x: obstacle::SPAWN_X,
            sprite_width: obstacle::SPRITE_WIDTH,
            sprite_height: obstacle::SPRITE_HEIGHT,
            lip_height: obstacle::LIP_HEIGHT,
            body_inset: obstacle::BODY_INSET,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloorParams {
    pub sprite_height: u32,
    pub velocity: f32,
    pub tile_width: f32,
    pub margin: f32,
}

impl Default for FloorParams {
    fn default() -> Self {
        Self {
            sprite_height: floor::SPRITE_HEIGHT,
            velocity: floor::VELOCITY,
            tile_width: floor::TILE_WIDTH,
            margin: floor::MARGIN,
        }
    }
}

/// Fitness rewards and penalties. The penalty is subtracted, so it is positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessParams {
    pub survival_reward: f32,
    pub collision_penalty: f32,
    pub pass_reward: f32,
}

impl Default for FitnessParams {
    fn default() -> Self {
        Self {
            survival_reward: fitness::SURVIVAL_REWARD,
            collision_penalty: fitness::COLLISION_PENALTY,
            pass_reward: fitness::PASS_REWARD,
        }
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// No birds to simulate.
    EmptyPopulation,
    /// Gap size must be positive.
    NonPositiveGap(f32),
    /// Obstacles must scroll left.
    NonPositiveVelocity(f32),
    /// `gap_min..gap_max` has no values.
    EmptyGapRange { min: i32, max: i32 },
    /// The lowest possible gap bottom sits at or below the floor.
    GapBelowFloor { bottom: f32, floor_y: f32 },
    /// A sprite dimension is zero.
    ZeroSpriteSize(&'static str),
    /// Playfield width or height is not positive.
    InvalidPlayfield { width: f32, height: f32 },
    /// `min_tilt` must be below `max_tilt`.
    InvertedTiltRange { min: f32, max: f32 },
    /// Tilt bucket must be positive.
    NonPositiveTiltBucket(f32),
    /// Tilt bucket is so narrow the tilt range needs too many masks.
    TooManyTiltBuckets { bucket: f32, buckets: f32, max: usize },
    /// Bird spawn point is outside the legal vertical range.
    SpawnOutOfBounds(f32),
    /// Obstacles must spawn at or beyond the bird.
    SpawnBehindBird { obstacle_x: f32, bird_x: f32 },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::EmptyPopulation => write!(f, "population size must be at least 1"),
            ConfigError::NonPositiveGap(gap) => write!(f, "gap must be positive, got {}", gap),
            ConfigError::NonPositiveVelocity(v) => {
                write!(f, "obstacle velocity must be positive, got {}", v)
            }
            ConfigError::EmptyGapRange { min, max } => {
                write!(f, "gap range {}..{} is empty", min, max)
            }
            ConfigError::GapBelowFloor { bottom, floor_y } => write!(
                f,
                "lowest gap bottom {} is not above the floor at {}",
                bottom, floor_y
            ),
            ConfigError::ZeroSpriteSize(which) => write!(f, "{} sprite has a zero dimension", which),
            ConfigError::InvalidPlayfield { width, height } => {
                write!(f, "playfield {}x{} is not positive", width, height)
            }
            ConfigError::InvertedTiltRange { min, max } => {
                write!(f, "tilt range [{}, {}] is inverted", min, max)
            }
            ConfigError::NonPositiveTiltBucket(b) => {
                write!(f, "tilt bucket must be positive, got {}", b)
            }
            ConfigError::TooManyTiltBuckets {
                bucket,
                buckets,
                max,
            } => write!(
                f,
                "tilt bucket {} needs {} masks, at most {} allowed",
                bucket, buckets, max
            ),
            ConfigError::SpawnOutOfBounds(y) => write!(f, "bird spawn y {} is out of bounds", y),
            ConfigError::SpawnBehindBird { obstacle_x, bird_x } => write!(
                f,
                "obstacle spawn x {} is behind the bird at {}",
                obstacle_x, bird_x
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Validate a configuration, returning all errors found.
pub fn validate_config(config: &SimConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if config.population_size == 0 {
        errors.push(ConfigError::EmptyPopulation);
    }
    if config.playfield.width <= 0.0 || config.playfield.height <= 0.0 {
        errors.push(ConfigError::InvalidPlayfield {
            width: config.playfield.width,
            height: config.playfield.height,
        });
    }

    let ob = &config.obstacle;
    if ob.gap <= 0.0 {
        errors.push(ConfigError::NonPositiveGap(ob.gap));
    }
    if ob.velocity <= 0.0 {
        errors.push(ConfigError::NonPositiveVelocity(ob.velocity));
    }
    if ob.gap_min >= ob.gap_max {
        errors.push(ConfigError::EmptyGapRange {
            min: ob.gap_min,
            max: ob.gap_max,
        });
    } else {
        let bottom = (ob.gap_max - 1) as f32 + ob.gap;
        if bottom >= config.floor_y() {
            errors.push(ConfigError::GapBelowFloor {
                bottom,
                floor_y: config.floor_y(),
            });
        }
    }
    if ob.sprite_width == 0 || ob.sprite_height == 0 {
        errors.push(ConfigError::ZeroSpriteSize("obstacle"));
    }
    if config.bird.sprite_width == 0 || config.bird.sprite_height == 0 {
        errors.push(ConfigError::ZeroSpriteSize("bird"));
    }
    if config.floor.sprite_height == 0 {
        errors.push(ConfigError::ZeroSpriteSize("floor"));
    }

    if config.bird.min_tilt >= config.bird.max_tilt {
        errors.push(ConfigError::InvertedTiltRange {
            min: config.bird.min_tilt,
            max: config.bird.max_tilt,
        });
    }
    let bucket = config.tilt_bucket;
    if bucket.is_nan() || bucket <= 0.0 {
        errors.push(ConfigError::NonPositiveTiltBucket(bucket));
    } else {
        let span = (config.bird.max_tilt - config.bird.min_tilt).abs();
        let buckets = (span / bucket).round() + 1.0;
        if buckets.is_nan() || buckets > run::MAX_TILT_BUCKETS as f32 {
            errors.push(ConfigError::TooManyTiltBuckets {
                bucket,
                buckets,
                max: run::MAX_TILT_BUCKETS,
            });
        }
    }

    let spawn_y = config.bird.spawn_y;
    if spawn_y < 0.0 || spawn_y > config.lowest_legal_y() {
        errors.push(ConfigError::SpawnOutOfBounds(spawn_y));
    }
    if ob.spawn_x < config.bird.spawn_x {
        errors.push(ConfigError::SpawnBehindBird {
            obstacle_x: ob.spawn_x,
            bird_x: config.bird.spawn_x,
        });
    }

    errors
}
