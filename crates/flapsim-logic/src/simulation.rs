//! Per-frame population step.
//!
//! A [`Generation`] owns the live birds, the obstacle list, the floor and the
//! score for one run of a population. Controllers and fitness slots belong to
//! the caller: the generation borrows them and writes fitness deltas straight
//! into the caller's slice, so results are visible the moment a frame returns.
//!
//! # Frame order
//!
//! 1. Pick the target obstacle (the next one once the lead bird has cleared
//!    the first).
//! 2. Advance every bird, reward survival, ask its controller, maybe jump.
//! 3. For each obstacle, rebuild the live set without birds that hit it
//!    (penalised), and mark the obstacle passed if a survivor is past it.
//! 4. Drop obstacles that have scrolled off, advance the rest.
//! 5. On a pass: score, reward every survivor, spawn a new obstacle.
//! 6. Drop birds that left the vertical bounds.
//! 7. An empty live set ends the generation.
//!
//! Birds are removed by rebuilding the live list, never by index while it is
//! being walked, so a removal can never skip or repeat a neighbour.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::collision;
use crate::config::SimConfig;
use crate::controller::Controller;
use crate::entity::{Bird, Observation};
use crate::obstacle::{retire_offscreen, Obstacle};
use crate::scroller::Scroller;
use crate::shape::SpriteMasks;
use crate::snapshot::{BirdView, FrameSnapshot, ObstacleView};

/// Immutable per-run data shared by every generation: config plus the
/// collision masks built from it.
#[derive(Debug, Clone)]
pub struct Stage {
    pub config: SimConfig,
    pub masks: SpriteMasks,
}

impl Stage {
    pub fn new(config: SimConfig) -> Self {
        let masks = SpriteMasks::new(&config);
        Self { config, masks }
    }
}

/// Whether a generation still has birds in the air.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationState {
    Running,
    Ended,
}

/// Why a bird left the live set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Removal {
    Collision,
    OutOfBounds,
}

/// Per-frame record of what changed, for callers that want more than the state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameEvents {
    /// Population indices removed this frame and why.
    pub removed: Vec<(usize, Removal)>,
    /// True when an obstacle was passed (score went up).
    pub scored: bool,
    pub jumps: usize,
}

#[derive(Debug, Clone)]
struct LiveBird {
    /// Index into the caller's controller and fitness slices.
    member: usize,
    bird: Bird,
}

/// One generation of a population.
pub struct Generation<'a, C: Controller> {
    stage: &'a Stage,
    controllers: &'a [C],
    fitness: &'a mut [f32],
    live: Vec<LiveBird>,
    obstacles: Vec<Obstacle>,
    floor: Scroller,
    rng: StdRng,
    index: u32,
    frame: u64,
    score: u32,
    state: GenerationState,
    last_events: FrameEvents,
}

impl<'a, C: Controller> Generation<'a, C> {
    /// Start a generation with one bird per controller and a single obstacle
    /// at the spawn x. Every fitness slot is reset to zero.
    ///
    /// # Panics
    ///
    /// If `controllers` and `fitness` differ in length.
    pub fn new(
        stage: &'a Stage,
        index: u32,
        seed: u64,
        controllers: &'a [C],
        fitness: &'a mut [f32],
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let ob = &stage.config.obstacle;
        let first = Obstacle::spawn(ob.spawn_x, ob, &mut rng);
        Self::with_obstacles(stage, index, rng, controllers, fitness, vec![first])
    }

    /// Start a generation with a prepared obstacle list. An empty list gets
    /// one freshly spawned obstacle.
    pub fn with_obstacles(
        stage: &'a Stage,
        index: u32,
        mut rng: StdRng,
        controllers: &'a [C],
        fitness: &'a mut [f32],
        mut obstacles: Vec<Obstacle>,
    ) -> Self {
        assert_eq!(
            controllers.len(),
            fitness.len(),
            "one fitness slot per controller"
        );
        if obstacles.is_empty() {
            let ob = &stage.config.obstacle;
            obstacles.push(Obstacle::spawn(ob.spawn_x, ob, &mut rng));
        }

        fitness.iter_mut().for_each(|f| *f = 0.0);
        let live: Vec<LiveBird> = (0..controllers.len())
            .map(|member| LiveBird {
                member,
                bird: Bird::spawn(&stage.config.bird),
            })
            .collect();
        let state = if live.is_empty() {
            GenerationState::Ended
        } else {
            GenerationState::Running
        };

        Self {
            stage,
            controllers,
            fitness,
            live,
            obstacles,
            floor: Scroller::new(&stage.config),
            rng,
            index,
            frame: 0,
            score: 0,
            state,
            last_events: FrameEvents::default(),
        }
    }

    pub fn state(&self) -> GenerationState {
        self.state
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// Frames stepped so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn alive(&self) -> usize {
        self.live.len()
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn floor(&self) -> &Scroller {
        &self.floor
    }

    pub fn fitness(&self) -> &[f32] {
        &self.fitness[..]
    }

    /// Live birds with their population index, lead bird first.
    pub fn birds(&self) -> impl Iterator<Item = (usize, &Bird)> {
        self.live.iter().map(|l| (l.member, &l.bird))
    }

    pub fn is_alive(&self, member: usize) -> bool {
        self.live.iter().any(|l| l.member == member)
    }

    /// What happened during the most recent frame.
    pub fn last_events(&self) -> &FrameEvents {
        &self.last_events
    }

    /// Index of the obstacle birds are steering for.
    fn target_index(&self) -> usize {
        let width = self.stage.config.obstacle.sprite_width as f32;
        match (self.live.first(), self.obstacles.first()) {
            (Some(lead), Some(first))
                if self.obstacles.len() > 1 && lead.bird.x > first.x + width =>
            {
                1
            }
            _ => 0,
        }
    }

    /// The observation a bird would get against the current target.
    pub fn observe(&self, bird: &Bird) -> Option<Observation> {
        self.obstacles
            .get(self.target_index())
            .map(|target| bird.observe(target))
    }

    /// Step one frame. Does nothing once the generation has ended.
    pub fn step(&mut self) -> GenerationState {
        if self.state == GenerationState::Ended {
            return self.state;
        }
        let stage = self.stage;
        let config = &stage.config;
        let masks = &stage.masks;
        let mut events = FrameEvents::default();

        // 1. target
        if self.obstacles.is_empty() {
            let ob = &config.obstacle;
            self.obstacles
                .push(Obstacle::spawn(ob.spawn_x, ob, &mut self.rng));
        }
        let target = self.obstacles[self.target_index()].clone();

        // 2. kinematics and decisions
        for live in self.live.iter_mut() {
            live.bird.advance(&config.bird);
            self.fitness[live.member] += config.fitness.survival_reward;

            let observation = live.bird.observe(&target);
            if self.controllers[live.member].decide(&observation) > config.jump_threshold {
                live.bird.jump(&config.bird);
                events.jumps += 1;
            }
        }

        // 3. collisions and pass-through
        let mut add_obstacle = false;
        for obstacle in self.obstacles.iter_mut() {
            let current = std::mem::take(&mut self.live);
            let mut survivors = Vec::with_capacity(current.len());
            for live in current {
                if let Some(hit) = collision::check(&live.bird, obstacle, masks) {
                    self.fitness[live.member] -= config.fitness.collision_penalty;
                    log::debug!(
                        "gen {} frame {}: bird {} hit {:?} piece at x={:.1}",
                        self.index,
                        self.frame,
                        live.member,
                        hit,
                        obstacle.x
                    );
                    events.removed.push((live.member, Removal::Collision));
                    continue;
                }
                if !obstacle.passed() && obstacle.x < live.bird.x && obstacle.mark_passed() {
                    add_obstacle = true;
                }
                survivors.push(live);
            }
            self.live = survivors;
        }

        // 4. retire, then scroll
        retire_offscreen(&mut self.obstacles, &config.obstacle);
        for obstacle in self.obstacles.iter_mut() {
            obstacle.advance(&config.obstacle);
        }

        // 5. score
        if add_obstacle {
            self.score += 1;
            for live in &self.live {
                self.fitness[live.member] += config.fitness.pass_reward;
            }
            self.obstacles.push(Obstacle::spawn(
                config.obstacle.spawn_x,
                &config.obstacle,
                &mut self.rng,
            ));
            events.scored = true;
        }

        // 6. bounds
        let limit = self.floor.playable_limit();
        self.live.retain(|live| {
            let out = live.bird.out_of_bounds(limit);
            if out {
                events.removed.push((live.member, Removal::OutOfBounds));
            }
            !out
        });

        self.floor.advance();
        self.frame += 1;
        self.last_events = events;

        // 7. end
        if self.live.is_empty() {
            self.state = GenerationState::Ended;
            log::info!(
                "generation {} ended after {} frames, score {}",
                self.index,
                self.frame,
                self.score
            );
        }
        self.state
    }

    /// Step until the live set is empty or `max_frames` more frames have run.
    pub fn run(&mut self, max_frames: Option<u64>) -> GenerationState {
        let start = self.frame;
        while self.state == GenerationState::Running {
            if max_frames.is_some_and(|max| self.frame - start >= max) {
                break;
            }
            self.step();
        }
        self.state
    }

    /// Read-only view for renderers.
    pub fn snapshot(&self) -> FrameSnapshot {
        let bird_params = &self.stage.config.bird;
        FrameSnapshot {
            generation: self.index,
            frame: self.frame,
            score: self.score,
            alive: self.live.len(),
            birds: self
                .live
                .iter()
                .map(|l| BirdView {
                    member: l.member,
                    x: l.bird.x,
                    y: l.bird.y,
                    tilt: l.bird.tilt,
                    wing_frame: l.bird.wing_frame(bird_params),
                })
                .collect(),
            obstacles: self
                .obstacles
                .iter()
                .map(|o| ObstacleView {
                    x: o.x,
                    top_sprite_y: o.top_sprite_y,
                    gap_top: o.gap_top,
                    gap_bottom: o.gap_bottom,
                    passed: o.passed(),
                })
                .collect(),
            floor_x: self.floor.x,
            floor_y: self.floor.y,
        }
    }
}
