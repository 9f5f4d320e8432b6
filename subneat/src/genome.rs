use rand::Rng;

/// An interface for genomes that can be used by NEAT.
///
/// Every stochastic operation draws from the `rng` it is handed,
/// so a population driven by a seeded generator evolves
/// reproducibly.
pub trait Genome: Clone {
    type Config;
    type InnovationHistory: InnovationHistory<Config = Self::Config>;
    type ConfigError: std::error::Error + Send + Sync + 'static;

    /// Checks a genetic configuration before any genome
    /// is generated with it.
    fn check_config(config: &Self::Config) -> Result<(), Self::ConfigError>;

    /// Returns a randomized template genome.
    fn new<R: Rng + ?Sized>(config: &Self::Config, rng: &mut R) -> Self;

    /// Returns the genetic distance between two genomes.
    ///
    /// Should be symmetric, and zero for a genome
    /// compared with itself.
    fn genetic_distance(first: &Self, second: &Self, config: &Self::Config) -> f32;

    /// Combines two genomes and returns a "child" genome.
    fn mate<R: Rng + ?Sized>(
        parent1: &Self,
        parent2: &Self,
        config: &Self::Config,
        rng: &mut R,
    ) -> Self;

    /// Applies the configured mix of structural and
    /// parametric mutations.
    fn mutate<R: Rng + ?Sized>(
        &mut self,
        history: &mut Self::InnovationHistory,
        config: &Self::Config,
        rng: &mut R,
    );

    /// Lightly alters a copy of a super champion,
    /// which should remain close to its parent.
    fn perturb<R: Rng + ?Sized>(
        &mut self,
        history: &mut Self::InnovationHistory,
        config: &Self::Config,
        rng: &mut R,
    );

    /// Sets the genome's fitness value.
    ///
    /// Should make sure that the fitness value is ≥0;
    /// otherwise NEAT will probably break.
    fn set_fitness(&mut self, fitness: f32);

    /// Returns the genome's fitness value.
    fn fitness(&self) -> f32;
}

/// An Innovation History is used to keep track
/// of genetic innovations throught successive
/// generations of genomes.
///
/// The exact function and utility of the
/// InnovationHistory is left to the implementor.
pub trait InnovationHistory {
    type Config;

    fn new(config: &Self::Config) -> Self;

    /// Forgets the innovations recorded so far.
    /// Called at the start of every generation's
    /// reproduction.
    fn clear(&mut self);
}
