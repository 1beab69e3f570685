//! Simulation engine - main entry point for running generations

use std::fmt;

use flapsim_logic::config::SimConfig;
use flapsim_logic::controller::Controller;
use flapsim_logic::simulation::{Generation, GenerationState, Stage};
use serde::{Deserialize, Serialize};

use crate::observer::{Flow, FrameObserver};
use crate::persistence::{RunRecord, SaveError};

/// How a generation came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Every bird was removed.
    Exhausted,
    /// The observer asked to stop.
    Cancelled,
    /// The engine's frame limit was reached with birds still alive.
    FrameLimit,
}

/// What the trainer gets back from one generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub index: u32,
    pub seed: u64,
    pub frames: u64,
    pub score: u32,
    pub best_fitness: f32,
    pub mean_fitness: f32,
    pub outcome: Outcome,
}

impl fmt::Display for GenerationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "gen {:>3}: score {:>3}, {:>6} frames, best {:>8.2}, mean {:>8.2} ({:?})",
            self.index, self.score, self.frames, self.best_fitness, self.mean_fitness, self.outcome
        )
    }
}

/// Main simulation engine
pub struct SimulationEngine {
    /// Config plus the collision masks built from it
    stage: Stage,
    /// Index of the next generation to run
    generation: u32,
    /// Summaries of every finished generation, oldest first
    history: Vec<GenerationSummary>,
    /// Hard cap on frames per generation
    frame_limit: Option<u64>,
}

impl SimulationEngine {
    /// Build the stage for `config`. Mask generation happens here, once.
    pub fn new(config: SimConfig) -> Self {
        Self {
            stage: Stage::new(config),
            generation: 0,
            history: Vec::new(),
            frame_limit: None,
        }
    }

    /// Pick up a saved run where it stopped.
    pub fn resume(record: RunRecord) -> Self {
        let mut engine = Self::new(record.config);
        engine.generation = record.history.len() as u32;
        engine.history = record.history;
        engine
    }

    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    pub fn set_frame_limit(&mut self, frames: Option<u64>) {
        self.frame_limit = frames;
    }

    pub fn frame_limit(&self) -> Option<u64> {
        self.frame_limit
    }

    pub fn config(&self) -> &SimConfig {
        &self.stage.config
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Index the next call to [`run_generation`](Self::run_generation) will use.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn history(&self) -> &[GenerationSummary] {
        &self.history
    }

    /// Highest score over all finished generations.
    pub fn best_score(&self) -> u32 {
        self.history.iter().map(|s| s.score).max().unwrap_or(0)
    }

    /// Obstacle seed for a generation: the base seed offset by its index.
    pub fn seed_for(&self, generation: u32) -> u64 {
        self.stage.config.seed.wrapping_add(generation as u64)
    }

    /// Run one generation to completion.
    ///
    /// One bird per controller; `fitness[i]` is zeroed and then accumulates
    /// bird `i`'s score as frames run. The observer sees every frame after it
    /// completes and may cancel.
    ///
    /// # Panics
    ///
    /// If `controllers` and `fitness` differ in length.
    pub fn run_generation<C, O>(
        &mut self,
        controllers: &[C],
        fitness: &mut [f32],
        observer: &mut O,
    ) -> GenerationSummary
    where
        C: Controller,
        O: FrameObserver + ?Sized,
    {
        let index = self.generation;
        let seed = self.seed_for(index);
        let wants_frames = observer.wants_frames();

        let (frames, score, outcome) = {
            let mut gen = Generation::new(&self.stage, index, seed, controllers, fitness);
            let outcome = loop {
                if gen.state() == GenerationState::Ended {
                    break Outcome::Exhausted;
                }
                if self.frame_limit.is_some_and(|limit| gen.frame() >= limit) {
                    break Outcome::FrameLimit;
                }
                gen.step();
                if wants_frames && observer.on_frame(&gen.snapshot()) == Flow::Stop {
                    break if gen.state() == GenerationState::Ended {
                        Outcome::Exhausted
                    } else {
                        Outcome::Cancelled
                    };
                }
            };
            (gen.frame(), gen.score(), outcome)
        };

        match outcome {
            Outcome::Cancelled => log::warn!(
                "generation {} cancelled at frame {} with birds still alive",
                index,
                frames
            ),
            Outcome::FrameLimit => log::warn!(
                "generation {} hit the {}-frame limit",
                index,
                frames
            ),
            Outcome::Exhausted => {}
        }

        let (best_fitness, mean_fitness) = if fitness.is_empty() {
            (0.0, 0.0)
        } else {
            (
                fitness.iter().copied().fold(f32::NEG_INFINITY, f32::max),
                fitness.iter().sum::<f32>() / fitness.len() as f32,
            )
        };
        let summary = GenerationSummary {
            index,
            seed,
            frames,
            score,
            best_fitness,
            mean_fitness,
            outcome,
        };

        log::info!("{}", summary);
        self.history.push(summary.clone());
        self.generation += 1;
        summary
    }

    /// Everything needed to resume or inspect this run later.
    pub fn record(&self) -> RunRecord {
        RunRecord::new(self.stage.config.clone(), self.history.clone())
    }

    /// Save the run record to a writer
    pub fn save<W: std::io::Write>(&self, writer: W) -> Result<(), SaveError> {
        crate::persistence::save_run(writer, &self.record())
    }

    /// Load a run record from a reader and resume it
    pub fn load<R: std::io::Read>(reader: R) -> Result<Self, SaveError> {
        let record = crate::persistence::load_run(reader)?;
        Ok(Self::resume(record))
    }
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NullObserver;
    use flapsim_logic::controller::Constant;
    use flapsim_logic::snapshot::FrameSnapshot;

    #[test]
    fn test_engine_creation() {
        let engine = SimulationEngine::default();
        assert_eq!(engine.generation(), 0);
        assert!(engine.history().is_empty());
        assert_eq!(engine.frame_limit(), None);
        assert_eq!(engine.best_score(), 0);
    }

    #[test]
    fn test_seed_per_generation() {
        let mut config = SimConfig::default();
        config.seed = u64::MAX;
        let engine = SimulationEngine::new(config);
        assert_eq!(engine.seed_for(0), u64::MAX);
        assert_eq!(engine.seed_for(1), 0);
    }

    #[test]
    fn test_generation_counter_advances() {
        let mut engine = SimulationEngine::default();
        let controllers = [Constant(0.0); 3];
        let mut fitness = [0.0f32; 3];
        for expected in 0..3 {
            let summary = engine.run_generation(&controllers, &mut fitness, &mut NullObserver);
            assert_eq!(summary.index, expected);
            assert_eq!(summary.outcome, Outcome::Exhausted);
            assert_eq!(summary.frames, 49);
        }
        assert_eq!(engine.generation(), 3);
        assert_eq!(engine.history().len(), 3);
    }

    #[test]
    fn test_summary_fitness_stats() {
        let mut engine = SimulationEngine::default();
        let controllers = [Constant(0.0); 2];
        let mut fitness = [0.0f32; 2];
        let summary = engine.run_generation(&controllers, &mut fitness, &mut NullObserver);
        assert!((summary.best_fitness - 4.9).abs() < 1e-3);
        assert!((summary.mean_fitness - 4.9).abs() < 1e-3);
        assert_eq!(summary.score, 0);
    }

    #[test]
    fn test_observer_cancels() {
        let mut engine = SimulationEngine::default();
        let controllers = [Constant(0.0)];
        let mut fitness = [0.0f32];
        let mut stop = |s: &FrameSnapshot| {
            if s.frame == 10 {
                Flow::Stop
            } else {
                Flow::Continue
            }
        };
        let summary = engine.run_generation(&controllers, &mut fitness, &mut stop);
        assert_eq!(summary.outcome, Outcome::Cancelled);
        assert_eq!(summary.frames, 10);
        assert!((fitness[0] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_frame_limit() {
        let mut engine = SimulationEngine::default().with_frame_limit(20);
        let controllers = [Constant(0.0)];
        let mut fitness = [0.0f32];
        let summary = engine.run_generation(&controllers, &mut fitness, &mut NullObserver);
        assert_eq!(summary.outcome, Outcome::FrameLimit);
        assert_eq!(summary.frames, 20);
    }

    #[test]
    fn test_empty_population() {
        let mut engine = SimulationEngine::default();
        let controllers: [Constant; 0] = [];
        let mut fitness: [f32; 0] = [];
        let summary = engine.run_generation(&controllers, &mut fitness, &mut NullObserver);
        assert_eq!(summary.frames, 0);
        assert_eq!(summary.best_fitness, 0.0);
        assert_eq!(summary.mean_fitness, 0.0);
        assert_eq!(summary.outcome, Outcome::Exhausted);
    }
}
