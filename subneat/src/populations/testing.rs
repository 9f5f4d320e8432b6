//! A one-dimensional genome for exercising the
//! population machinery without neural networks.

use crate::{Genome, InnovationHistory};

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    fitness: f32,
}

impl Point {
    pub fn at(x: f32) -> Point {
        Point { x, fitness: 0.0 }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PointConfig {
    /// Spread of the initial positions.
    pub spread: f32,
    /// Largest displacement a mutation applies.
    pub step: f32,
}

#[derive(Debug, Error)]
#[error("negative step {0}")]
pub struct NegativeStep(f32);

/// Counts the number of times it was cleared.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Clears(pub usize);

impl InnovationHistory for Clears {
    type Config = PointConfig;

    fn new(_: &PointConfig) -> Clears {
        Clears(0)
    }

    fn clear(&mut self) {
        self.0 += 1;
    }
}

impl Genome for Point {
    type Config = PointConfig;
    type InnovationHistory = Clears;
    type ConfigError = NegativeStep;

    fn check_config(config: &PointConfig) -> Result<(), NegativeStep> {
        if config.step < 0.0 {
            Err(NegativeStep(config.step))
        } else {
            Ok(())
        }
    }

    fn new<R: Rng + ?Sized>(config: &PointConfig, rng: &mut R) -> Point {
        Point::at(rng.gen::<f32>() * config.spread)
    }

    fn genetic_distance(first: &Point, second: &Point, _: &PointConfig) -> f32 {
        (first.x - second.x).abs()
    }

    fn mate<R: Rng + ?Sized>(
        parent1: &Point,
        parent2: &Point,
        _: &PointConfig,
        _: &mut R,
    ) -> Point {
        Point::at((parent1.x + parent2.x) / 2.0)
    }

    fn mutate<R: Rng + ?Sized>(&mut self, _: &mut Clears, config: &PointConfig, rng: &mut R) {
        self.x += (rng.gen::<f32>() * 2.0 - 1.0) * config.step;
    }

    fn perturb<R: Rng + ?Sized>(&mut self, _: &mut Clears, config: &PointConfig, rng: &mut R) {
        self.x += (rng.gen::<f32>() * 2.0 - 1.0) * config.step / 10.0;
    }

    fn set_fitness(&mut self, fitness: f32) {
        self.fitness = fitness;
    }

    fn fitness(&self) -> f32 {
        self.fitness
    }
}
