//! The decision seam between the simulation and whatever drives a bird.
//!
//! A controller maps an [`Observation`] to a single output; the bird jumps
//! when that output exceeds the configured threshold. The simulation only
//! ever calls [`Controller::decide`] and never mutates a controller.
//!
//! Any `Fn(&Observation) -> f32` is a controller, which covers boxed trait
//! objects (`Box<dyn Fn(&Observation) -> f32>`) for mixed populations.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::entity::Observation;

pub trait Controller {
    fn decide(&self, observation: &Observation) -> f32;
}

impl<F> Controller for F
where
    F: Fn(&Observation) -> f32,
{
    fn decide(&self, observation: &Observation) -> f32 {
        self(observation)
    }
}

/// Always returns the same output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Constant(pub f32);

impl Controller for Constant {
    fn decide(&self, _observation: &Observation) -> f32 {
        self.0
    }
}

/// Single tanh neuron over the three observation inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Perceptron {
    pub weights: [f32; 3],
    pub bias: f32,
}

impl Perceptron {
    pub fn new(weights: [f32; 3], bias: f32) -> Self {
        Self { weights, bias }
    }

    /// Weights and bias drawn uniformly from `[-scale, scale)`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, scale: f32) -> Self {
        Self {
            weights: [
                rng.gen_range(-scale..scale),
                rng.gen_range(-scale..scale),
                rng.gen_range(-scale..scale),
            ],
            bias: rng.gen_range(-scale..scale),
        }
    }

    /// Copy with each parameter nudged by up to `±strength` with probability `rate`.
    pub fn mutated<R: Rng + ?Sized>(&self, rng: &mut R, rate: f64, strength: f32) -> Self {
        let mut child = self.clone();
        for w in child.weights.iter_mut().chain(std::iter::once(&mut child.bias)) {
            if rng.gen_bool(rate) {
                *w += rng.gen_range(-strength..strength);
            }
        }
        child
    }
}

impl Controller for Perceptron {
    fn decide(&self, observation: &Observation) -> f32 {
        let inputs = observation.as_array();
        let sum: f32 = self
            .weights
            .iter()
            .zip(inputs.iter())
            .map(|(w, x)| w * x)
            .sum();
        (sum + self.bias).tanh()
    }
}
