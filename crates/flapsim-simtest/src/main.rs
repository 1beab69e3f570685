//! FlapSim Headless Simulation Harness
//!
//! Validates the simulation logic end to end, then trains a population of
//! perceptrons for a few generations with a simple elitist loop.
//! Runs entirely in-process, no window, no rendering.
//!
//! Usage:
//!   cargo run -p flapsim-simtest
//!   cargo run -p flapsim-simtest -- --verbose
//!   cargo run -p flapsim-simtest -- --config run.json --generations 20 --population 100 --seed 7 --save run.bin

use std::fs::File;
use std::io::BufWriter;

use flapsim_core::config_file::load_config;
use flapsim_core::engine::{Outcome, SimulationEngine};
use flapsim_core::observer::{NullObserver, SnapshotRecorder};
use flapsim_logic::config::{validate_config, SimConfig};
use flapsim_logic::controller::{Constant, Perceptron};
use flapsim_logic::entity::{Bird, Observation};
use flapsim_logic::obstacle::{retire_offscreen, Obstacle};
use flapsim_logic::shape::Mask;
use flapsim_logic::simulation::{Generation, GenerationState, Removal, Stage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Safety cap so a perfect flyer cannot hang the harness.
const TRAINING_FRAME_LIMIT: u64 = 5_000;

// ── Command line ────────────────────────────────────────────────────────

struct Args {
    verbose: bool,
    config: Option<String>,
    generations: Option<u32>,
    population: Option<usize>,
    seed: Option<u64>,
    save: Option<String>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        verbose: false,
        config: None,
        generations: None,
        population: None,
        seed: None,
        save: None,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(flag) = iter.next() {
        let mut value = || iter.next().ok_or_else(|| format!("{} needs a value", flag));
        match flag.as_str() {
            "--verbose" => args.verbose = true,
            "--config" => args.config = Some(value()?),
            "--save" => args.save = Some(value()?),
            "--generations" => args.generations = Some(parse_number(&flag, &value()?)?),
            "--population" => args.population = Some(parse_number(&flag, &value()?)?),
            "--seed" => args.seed = Some(parse_number(&flag, &value()?)?),
            other => return Err(format!("unknown argument {}", other)),
        }
    }
    Ok(args)
}

fn parse_number<T: std::str::FromStr>(flag: &str, text: &str) -> Result<T, String> {
    text.parse()
        .map_err(|_| format!("{} expects a number, got {:?}", flag, text))
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    };

    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    let mut config = match &args.config {
        Some(path) => match load_config(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("error: {}: {}", path, e);
                std::process::exit(2);
            }
        },
        None => SimConfig::default(),
    };
    if let Some(g) = args.generations {
        config.generations = g;
    }
    if let Some(p) = args.population {
        config.population_size = p;
    }
    if let Some(s) = args.seed {
        config.seed = s;
    }
    log::debug!(
        "population {}, {} generations, seed {}",
        config.population_size,
        config.generations,
        config.seed
    );

    println!("=== FlapSim Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Configuration
    results.extend(validate_configuration(&config, args.verbose));

    // 2. Bird kinematics
    results.extend(validate_kinematics(args.verbose));

    // 3. Obstacle lifecycle
    results.extend(validate_obstacles(args.verbose));

    // 4. Collision masks
    results.extend(validate_masks(args.verbose));

    // 5. End-to-end scenarios
    results.extend(validate_scenarios(args.verbose));

    // 6. Training run
    results.extend(run_training(&config, args.save.as_deref(), args.verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || args.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

/// Flaps whenever the bird is nearer the bottom of the gap than the top.
fn gap_tracker(o: &Observation) -> f32 {
    if o.gap_bottom_distance < o.gap_top_distance + 40.0 {
        1.0
    } else {
        0.0
    }
}

// ── 1. Configuration ────────────────────────────────────────────────────

fn validate_configuration(config: &SimConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Configuration ---");
    let mut results = Vec::new();

    let default_errors = validate_config(&SimConfig::default());
    results.push(TestResult {
        name: "config_defaults_valid".into(),
        passed: default_errors.is_empty(),
        detail: format!("{} problems in the defaults", default_errors.len()),
    });

    let errors = validate_config(config);
    results.push(TestResult {
        name: "config_run_valid".into(),
        passed: errors.is_empty(),
        detail: if errors.is_empty() {
            format!(
                "population {}, {} generations, seed {}",
                config.population_size, config.generations, config.seed
            )
        } else {
            errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ")
        },
    });

    let floor_y = SimConfig::default().floor_y();
    results.push(TestResult {
        name: "config_floor_line".into(),
        passed: floor_y == 734.0,
        detail: format!("floor at y={}", floor_y),
    });

    if verbose {
        match serde_json::to_string_pretty(config) {
            Ok(json) => println!("{}", json),
            Err(e) => println!("  (could not render config: {})", e),
        }
    }

    results
}

// ── 2. Kinematics ───────────────────────────────────────────────────────

fn validate_kinematics(_verbose: bool) -> Vec<TestResult> {
    println!("--- Bird Kinematics ---");
    let mut results = Vec::new();
    let params = SimConfig::default().bird;

    // Displacement never decreases while falling, then holds at the cap
    let mut bird = Bird::spawn(&params);
    let displacements: Vec<f32> = (0..30).map(|_| bird.advance(&params)).collect();
    let monotone = displacements.windows(2).all(|w| w[1] >= w[0]);
    let capped = displacements.iter().all(|d| *d <= params.terminal_displacement);
    results.push(TestResult {
        name: "kinematics_fall_monotone".into(),
        passed: monotone && capped,
        detail: format!(
            "first {:?}, last {:?}",
            displacements.first(),
            displacements.last()
        ),
    });

    // Jump resets velocity and ticks from any state
    let mut bird = Bird::spawn(&params);
    for _ in 0..17 {
        bird.advance(&params);
    }
    bird.jump(&params);
    results.push(TestResult {
        name: "kinematics_jump_reset".into(),
        passed: bird.ticks == 0
            && bird.velocity == params.jump_impulse
            && bird.reference_height == bird.y,
        detail: format!("v={} t={} ref={}", bird.velocity, bird.ticks, bird.reference_height),
    });

    // Tilt stays in range through a mix of jumps and falls
    let mut bird = Bird::spawn(&params);
    let mut in_range = true;
    for frame in 0..200 {
        if frame % 37 == 0 {
            bird.jump(&params);
        }
        bird.advance(&params);
        in_range &= bird.tilt <= params.max_tilt && bird.tilt >= params.min_tilt;
    }
    results.push(TestResult {
        name: "kinematics_tilt_range".into(),
        passed: in_range,
        detail: format!("tilt ended at {}", bird.tilt),
    });

    results
}

// ── 3. Obstacles ────────────────────────────────────────────────────────

fn validate_obstacles(_verbose: bool) -> Vec<TestResult> {
    println!("--- Obstacle Lifecycle ---");
    let mut results = Vec::new();
    let params = SimConfig::default().obstacle;
    let mut rng = StdRng::seed_from_u64(1);

    let spawned: Vec<Obstacle> = (0..2000)
        .map(|_| Obstacle::spawn(params.spawn_x, &params, &mut rng))
        .collect();
    let in_range = spawned
        .iter()
        .all(|o| o.gap_top >= params.gap_min as f32 && o.gap_top < params.gap_max as f32);
    let gap_exact = spawned.iter().all(|o| o.gap_bottom - o.gap_top == params.gap);
    let lowest = spawned.iter().map(|o| o.gap_top).fold(f32::MAX, f32::min);
    let highest = spawned.iter().map(|o| o.gap_top).fold(f32::MIN, f32::max);
    results.push(TestResult {
        name: "obstacle_gap_range".into(),
        passed: in_range && gap_exact,
        detail: format!("gap tops within [{}, {}]", lowest, highest),
    });

    let mut list = vec![
        Obstacle::with_gap_top(-200.0, 100.0, &params),
        Obstacle::with_gap_top(-120.0, 100.0, &params),
        Obstacle::with_gap_top(300.0, 100.0, &params),
    ];
    let first = retire_offscreen(&mut list, &params);
    let second = retire_offscreen(&mut list, &params);
    results.push(TestResult {
        name: "obstacle_retire_idempotent".into(),
        passed: first == 2 && second == 0 && list.len() == 1,
        detail: format!("retired {} then {}", first, second),
    });

    let mut ob = Obstacle::with_gap_top(100.0, 100.0, &params);
    let flips = [ob.mark_passed(), ob.mark_passed(), ob.mark_passed()];
    results.push(TestResult {
        name: "obstacle_passed_once".into(),
        passed: flips == [true, false, false] && ob.passed(),
        detail: format!("{:?}", flips),
    });

    results
}

// ── 4. Masks ────────────────────────────────────────────────────────────

fn validate_masks(verbose: bool) -> Vec<TestResult> {
    println!("--- Collision Masks ---");
    let mut results = Vec::new();
    let stage = Stage::new(SimConfig::default());

    results.push(TestResult {
        name: "masks_bucket_count".into(),
        passed: stage.masks.bucket_count() == 42,
        detail: format!("{} bird orientations", stage.masks.bucket_count()),
    });

    let mut rng = StdRng::seed_from_u64(11);
    let mut asymmetric = 0;
    let mut hits = 0;
    for _ in 0..500 {
        let a = random_mask(&mut rng);
        let b = random_mask(&mut rng);
        let dx = rng.gen_range(-20..20);
        let dy = rng.gen_range(-20..20);
        let ab = a.overlap(&b, (dx, dy)).is_some();
        let ba = b.overlap(&a, (-dx, -dy)).is_some();
        if ab != ba {
            asymmetric += 1;
        }
        if ab {
            hits += 1;
        }
    }
    results.push(TestResult {
        name: "masks_overlap_symmetric".into(),
        passed: asymmetric == 0,
        detail: format!("{} asymmetric of 500 ({} overlapping)", asymmetric, hits),
    });

    let level = stage.masks.bird(0.0).count();
    let diving = stage.masks.bird(-90.0).count();
    let ratio = diving as f32 / level as f32;
    results.push(TestResult {
        name: "masks_rotation_keeps_area".into(),
        passed: (0.9..1.1).contains(&ratio),
        detail: format!("{} px level, {} px diving", level, diving),
    });

    if verbose {
        println!(
            "  obstacle pieces: {} / {} opaque px",
            stage.masks.obstacle_top.count(),
            stage.masks.obstacle_bottom.count()
        );
    }

    results
}

fn random_mask(rng: &mut StdRng) -> Mask {
    let w = rng.gen_range(1..16);
    let h = rng.gen_range(1..16);
    let density: f64 = rng.gen_range(0.1..0.9);
    let mut mask = Mask::new(w, h);
    for y in 0..h {
        for x in 0..w {
            mask.set(x, y, rng.gen_bool(density));
        }
    }
    mask
}

// ── 5. Scenarios ────────────────────────────────────────────────────────

fn validate_scenarios(verbose: bool) -> Vec<TestResult> {
    println!("--- Scenarios ---");
    let mut results = Vec::new();
    let stage = Stage::new(SimConfig::default());

    // A bird that never flaps falls to the floor at a fixed frame
    let idle = [Constant(0.0)];
    let mut fitness = [0.0f32];
    let mut gen = Generation::new(&stage, 0, 0, &idle, &mut fitness);
    gen.run(Some(1_000));
    let frames = gen.frame();
    let removed = gen.last_events().removed.clone();
    let idle_fitness = gen.fitness()[0];
    results.push(TestResult {
        name: "scenario_idle_falls".into(),
        passed: gen.state() == GenerationState::Ended
            && frames == 49
            && removed == vec![(0, Removal::OutOfBounds)]
            && (idle_fitness - frames as f32 * 0.1).abs() < 1e-3,
        detail: format!("removed at frame {} with fitness {:.3}", frames, idle_fitness),
    });

    // A gap tracker stays in bounds and clears the first obstacle
    let limit = stage.config.lowest_legal_y();
    let tracker = [gap_tracker as fn(&Observation) -> f32];
    let mut failures = Vec::new();
    for seed in 0..25u64 {
        let mut fitness = [0.0f32];
        let mut gen = Generation::new(&stage, 0, seed, &tracker, &mut fitness);
        let mut in_bounds = true;
        for _ in 0..300 {
            gen.step();
            in_bounds &= gen.birds().all(|(_, b)| b.y >= 0.0 && b.y <= limit);
        }
        let score = gen.score();
        let fit = gen.fitness()[0];
        if !(in_bounds && gen.alive() == 1 && score == 1 && (fit - 35.0).abs() < 1e-2) {
            failures.push(format!("seed {}: score {} fitness {:.2}", seed, score, fit));
        }
    }
    results.push(TestResult {
        name: "scenario_tracker_scores".into(),
        passed: failures.is_empty(),
        detail: if failures.is_empty() {
            "25 seeds, one pass each within 300 frames".into()
        } else {
            failures.join("; ")
        },
    });

    // One bird collides, its neighbour carries on
    let pair: Vec<Box<dyn Fn(&Observation) -> f32>> =
        vec![Box::new(gap_tracker), Box::new(|_: &Observation| 0.0f32)];
    let mut fitness = [0.0f32; 2];
    let obstacles = vec![Obstacle::with_gap_top(300.0, 300.0, &stage.config.obstacle)];
    let mut gen = Generation::with_obstacles(
        &stage,
        0,
        StdRng::seed_from_u64(5),
        &pair,
        &mut fitness,
        obstacles,
    );
    let mut hit_frame = None;
    while gen.frame() < 100 && hit_frame.is_none() {
        gen.step();
        if gen.last_events().removed.contains(&(1, Removal::Collision)) {
            hit_frame = Some(gen.frame());
        }
    }
    let detail = match hit_frame {
        Some(n) => format!(
            "hit at frame {}, fitness {:.2} vs {:.2}",
            n,
            gen.fitness()[1],
            gen.fitness()[0]
        ),
        None => "no collision".into(),
    };
    let penalised = hit_frame
        .map(|n| (gen.fitness()[1] - (n as f32 * 0.1 - 1.0)).abs() < 1e-3)
        .unwrap_or(false);
    results.push(TestResult {
        name: "scenario_single_collision".into(),
        passed: penalised && gen.alive() == 1 && gen.is_alive(0),
        detail,
    });

    if verbose {
        println!("  {}", gen.snapshot().hud_line());
    }

    results
}

// ── 6. Training ─────────────────────────────────────────────────────────

fn run_training(config: &SimConfig, save: Option<&str>, verbose: bool) -> Vec<TestResult> {
    println!("--- Training ---");
    let mut results = Vec::new();

    if !validate_config(config).is_empty() {
        results.push(TestResult {
            name: "training_skipped".into(),
            passed: false,
            detail: "config is invalid".into(),
        });
        return results;
    }

    let mut engine = SimulationEngine::new(config.clone()).with_frame_limit(TRAINING_FRAME_LIMIT);
    let mut rng = StdRng::seed_from_u64(config.seed ^ 0x5EED);
    let mut population: Vec<Perceptron> = (0..config.population_size)
        .map(|_| Perceptron::random(&mut rng, 0.05))
        .collect();
    let mut fitness = vec![0.0f32; population.len()];

    for generation in 0..config.generations {
        let summary = if verbose && generation + 1 == config.generations {
            let mut recorder = SnapshotRecorder::new(100);
            let summary = engine.run_generation(&population, &mut fitness, &mut recorder);
            println!("  recorded {} frames of the final generation", recorder.frames.len());
            summary
        } else {
            engine.run_generation(&population, &mut fitness, &mut NullObserver)
        };
        println!("  {}", summary);
        population = next_population(&population, &fitness, &mut rng);
    }

    let history = engine.history();
    results.push(TestResult {
        name: "training_all_generations_ran".into(),
        passed: history.len() == config.generations as usize,
        detail: format!("{} summaries", history.len()),
    });

    let cancelled = history
        .iter()
        .filter(|s| s.outcome == Outcome::Cancelled)
        .count();
    results.push(TestResult {
        name: "training_no_cancellations".into(),
        passed: cancelled == 0,
        detail: format!(
            "best score {} over {} generations",
            engine.best_score(),
            history.len()
        ),
    });

    let consistent = history.iter().all(|s| s.best_fitness >= s.mean_fitness);
    results.push(TestResult {
        name: "training_summary_consistent".into(),
        passed: consistent,
        detail: "best fitness never below mean".into(),
    });

    if let Some(path) = save {
        let saved = File::create(path)
            .map_err(flapsim_core::persistence::SaveError::from)
            .and_then(|f| engine.save(BufWriter::new(f)));
        results.push(TestResult {
            name: "training_saved".into(),
            passed: saved.is_ok(),
            detail: match saved {
                Ok(()) => format!("run record written to {}", path),
                Err(e) => e.to_string(),
            },
        });
    }

    results
}

/// Keep the best fifth, refill with mutated copies of them.
fn next_population(current: &[Perceptron], fitness: &[f32], rng: &mut StdRng) -> Vec<Perceptron> {
    let mut order: Vec<usize> = (0..current.len()).collect();
    order.sort_by(|a, b| fitness[*b].total_cmp(&fitness[*a]));

    let elite = (current.len() / 5).max(1).min(current.len());
    if let Some(&best) = order.first() {
        log::debug!("best of generation: {:?} ({:.2})", current[best], fitness[best]);
    }
    let mut next: Vec<Perceptron> = order[..elite].iter().map(|&i| current[i].clone()).collect();
    while next.len() < current.len() {
        let parent = &current[order[rng.gen_range(0..elite)]];
        next.push(parent.mutated(rng, 0.3, 0.02));
    }
    next
}
