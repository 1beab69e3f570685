//! Pure simulation logic for FlapSim.
//!
//! This crate contains the whole per-frame game: bird kinematics, scrolling
//! obstacles, pixel-mask collision and the population step that ties them
//! together. It does no I/O, never sleeps and owns no global state, so the
//! same code runs under a windowed renderer, a headless trainer or a test.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`collision`] | Bird-vs-obstacle overlap on opaque pixels |
//! | [`config`] | Run configuration, defaults and validation |
//! | [`constants`] | Playfield, kinematics, obstacle and fitness constants |
//! | [`controller`] | Observation → action seam, reference controllers |
//! | [`entity`] | Bird kinematics, tilt, wing animation, observations |
//! | [`obstacle`] | Obstacle spawning, scrolling and retirement |
//! | [`scroller`] | Floor band and the lower playable bound |
//! | [`shape`] | Opaque-pixel masks and per-tilt bird silhouettes |
//! | [`simulation`] | Per-frame population step and generation state |
//! | [`snapshot`] | Read-only frame view for renderers |
//!
//! # Example
//!
//! ```
//! use flapsim_logic::config::SimConfig;
//! use flapsim_logic::controller::Constant;
//! use flapsim_logic::simulation::{Generation, GenerationState, Stage};
//!
//! let stage = Stage::new(SimConfig::default());
//! let controllers = [Constant(0.0); 4];
//! let mut fitness = [0.0f32; 4];
//!
//! let mut generation = Generation::new(&stage, 0, 42, &controllers, &mut fitness);
//! while generation.step() == GenerationState::Running {}
//!
//! // Nobody flapped, so everyone fell to the floor together.
//! assert_eq!(generation.score(), 0);
//! assert!(fitness.iter().all(|f| *f > 4.0));
//! ```

pub mod collision;
pub mod config;
pub mod constants;
pub mod controller;
pub mod entity;
pub mod obstacle;
pub mod scroller;
pub mod shape;
pub mod simulation;
pub mod snapshot;
