use super::SubspeciesId;
use crate::Genome;

use serde::{Deserialize, Serialize};

/// A genome together with the bookkeeping
/// the population keeps on it while breeding.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Organism<G> {
    pub(super) genome: G,
    pub(super) adjusted_fitness: f32,
    pub(super) expected_offspring: f64,
    pub(super) generation: usize,
    pub(super) eliminate: bool,
    pub(super) champion: bool,
    pub(super) population_champion: bool,
    pub(super) population_champion_child: bool,
    pub(super) high_fitness: f32,
    pub(super) super_champion_offspring: usize,
    pub(super) subspecies: Option<SubspeciesId>,
    pub(super) evaluated: bool,
}

impl<G: Genome> Organism<G> {
    /// Wraps a genome born in `generation`.
    pub(super) fn new(genome: G, generation: usize) -> Organism<G> {
        Organism {
            genome,
            adjusted_fitness: 0.0,
            expected_offspring: 0.0,
            generation,
            eliminate: false,
            champion: false,
            population_champion: false,
            population_champion_child: false,
            high_fitness: 0.0,
            super_champion_offspring: 0,
            subspecies: None,
            evaluated: false,
        }
    }

    /// Sets the genome's fitness and marks the
    /// organism as evaluated.
    ///
    /// # Panics
    /// Panics if `fitness` is negative or NaN.
    pub fn set_fitness(&mut self, fitness: f32) {
        assert!(
            fitness >= 0.0,
            "fitness must be non-negative, got {}",
            fitness
        );
        self.genome.set_fitness(fitness);
        self.evaluated = true;
    }

    /// Returns the raw fitness of the organism's genome.
    pub fn fitness(&self) -> f32 {
        self.genome.fitness()
    }
}

impl<G> Organism<G> {
    pub fn genome(&self) -> &G {
        &self.genome
    }

    /// Fitness after age penalties and sharing
    /// within the subspecies.
    pub fn adjusted_fitness(&self) -> f32 {
        self.adjusted_fitness
    }

    /// Share of the next generation's offspring this
    /// organism's fitness earns, as a multiple of the
    /// population's average.
    pub fn expected_offspring(&self) -> f64 {
        self.expected_offspring
    }

    /// The generation the organism was born in.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Whether the organism was culled from reproduction.
    pub fn eliminated(&self) -> bool {
        self.eliminate
    }

    /// Whether the organism heads its subspecies.
    pub fn is_champion(&self) -> bool {
        self.champion
    }

    pub fn is_population_champion(&self) -> bool {
        self.population_champion
    }

    /// Whether the organism is the unmodified copy of the
    /// previous generation's population champion.
    pub fn is_population_champion_child(&self) -> bool {
        self.population_champion_child
    }

    /// For a population champion's child, the fitness
    /// of its parent.
    pub fn high_fitness(&self) -> f32 {
        self.high_fitness
    }

    pub fn super_champion_offspring(&self) -> usize {
        self.super_champion_offspring
    }

    /// The subspecies the organism was placed in.
    pub fn subspecies(&self) -> Option<SubspeciesId> {
        self.subspecies
    }

    pub fn evaluated(&self) -> bool {
        self.evaluated
    }
}
