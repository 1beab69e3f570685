//! FlapSim Core - generation orchestration
//!
//! Wraps the pure step logic in `flapsim-logic` with everything a training
//! loop needs around it: per-generation seeding, a frame feed for renderers,
//! cancellation between frames, run history, config files and saved runs.
//!
//! # Architecture
//!
//! - **Engine**: [`SimulationEngine`](engine::SimulationEngine) owns the stage
//!   (config plus collision masks), the generation counter and the history
//! - **Observers**: a [`FrameObserver`](observer::FrameObserver) sees every
//!   frame and may stop the generation early
//! - **Persistence**: JSON config files in, bincode run records out
//!
//! # Example
//!
//! ```rust,no_run
//! use flapsim_core::prelude::*;
//!
//! let mut engine = SimulationEngine::new(SimConfig::default());
//! let controllers = vec![Constant(0.0); 50];
//! let mut fitness = vec![0.0f32; 50];
//!
//! // Train for as many generations as the config asks for
//! for _ in 0..engine.config().generations {
//!     let summary = engine.run_generation(&controllers, &mut fitness, &mut NullObserver);
//!     println!("{}", summary);
//! }
//! ```

pub mod config_file;
pub mod engine;
pub mod observer;
pub mod persistence;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::engine::{GenerationSummary, Outcome, SimulationEngine};
    pub use crate::observer::{Flow, FrameObserver, NullObserver, SnapshotRecorder};
    pub use flapsim_logic::config::SimConfig;
    pub use flapsim_logic::controller::{Constant, Controller, Perceptron};
    pub use flapsim_logic::snapshot::FrameSnapshot;
}
