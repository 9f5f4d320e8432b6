//! A Population is a collection of organisms.
//! These are grouped into subspecies, which can
//! be evolved using a genome evaluation function
//! as the source of selective pressure.
mod config;
mod errors;
pub mod logging;
mod offspring_factory;
mod organism;
mod subspecies;
#[cfg(test)]
pub(crate) mod testing;

use crate::{Genome, InnovationHistory};
pub use config::PopulationConfig;
pub use errors::{BreedError, ConfigError};
use offspring_factory::OffspringFactory;
pub use organism::Organism;
pub use subspecies::{Subspecies, SubspeciesId};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

/// Number of generations, beyond the dropoff age, the
/// population's best fitness may stagnate before delta
/// coding refocuses reproduction on the two best subspecies.
const DELTA_CODING_GRACE: usize = 5;

/// Minimum age for a subspecies to have offspring stolen.
const STEALING_MIN_AGE: usize = 5;

/// Minimum allotment for a subspecies to have offspring stolen.
const STEALING_MIN_OFFSPRING: usize = 2;

/// A population of organisms, clustered into subspecies.
#[derive(Serialize, Deserialize)]
pub struct Population<C, H, G> {
    subspecies: Vec<Subspecies<G>>,
    history: H,
    generation: usize,
    highest_fitness: f32,
    highest_last_changed: usize,
    population_config: PopulationConfig,
    genetic_config: C,
}

impl<C, H, G> Population<C, H, G>
where
    H: InnovationHistory<Config = C>,
    G: Genome<InnovationHistory = H, Config = C>,
{
    /// Creates a new population using the passed configurations,
    /// filled with randomized template genomes which are
    /// then speciated.
    ///
    /// The type of `genetic_config` depends on the implementation
    /// of [`Genome`], and is effectively opaque to the population.
    ///
    /// [`Genome`]: crate::Genome
    ///
    /// # Errors
    /// Returns an error if either configuration is invalid.
    ///
    /// # Examples
    /// ```
    /// # use subneat_nn::genomics::{GeneticConfig, NNGenome as G};
    /// use subneat::{Population, PopulationConfig};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let pop_config = PopulationConfig {
    ///     // Set desired configuration
    ///     size: std::num::NonZeroUsize::new(30).unwrap(),
    ///     ..PopulationConfig::default()
    /// };
    /// # let genetic_config = GeneticConfig::default();
    ///
    /// // With `G` a suitable type implementing `Genome`...
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    /// let population = Population::<_, _, G>::new(pop_config, genetic_config, &mut rng).unwrap();
    /// assert_eq!(population.genomes().count(), 30);
    /// ```
    pub fn new<R: Rng + ?Sized>(
        population_config: PopulationConfig,
        genetic_config: C,
        rng: &mut R,
    ) -> Result<Population<C, H, G>, ConfigError> {
        population_config.validate()?;
        G::check_config(&genetic_config).map_err(|e| ConfigError::Genetic(Box::new(e)))?;

        let mut population = Population {
            subspecies: vec![],
            history: H::new(&genetic_config),
            generation: 0,
            highest_fitness: 0.0,
            highest_last_changed: 0,
            population_config,
            genetic_config,
        };
        for _ in 0..population.population_config.size.get() {
            let genome = G::new(&population.genetic_config, rng);
            population.speciate(genome);
        }
        for subspecies in &mut population.subspecies {
            subspecies.to_next_generation();
        }
        Ok(population)
    }

    /// Places a genome into the first subspecies whose
    /// representative lies within the compatibility
    /// threshold, in creation order, or into a new
    /// subspecies if none does.
    ///
    /// The genome joins the next generation: it becomes
    /// a member of its subspecies, alongside the bred
    /// offspring, when the population next [evolves].
    ///
    /// [evolves]: Population::evolve
    pub fn speciate(&mut self, genome: G) {
        self.place(Organism::new(genome, self.generation));
    }

    fn place(&mut self, mut organism: Organism<G>) {
        let threshold = self.population_config.compatibility_threshold;
        let compatible = self.subspecies.iter().position(|s| {
            s.representative().map_or(false, |representative| {
                G::genetic_distance(&organism.genome, representative, &self.genetic_config)
                    < threshold
            })
        });

        let index = compatible.unwrap_or_else(|| {
            let born_this_generation = self
                .subspecies
                .iter()
                .filter(|s| s.id().0 == self.generation)
                .count();
            let id = SubspeciesId(self.generation, born_this_generation);
            trace!(%id, "new subspecies");
            self.subspecies.push(Subspecies::new(id));
            self.subspecies.len() - 1
        });
        organism.subspecies = Some(self.subspecies[index].id());
        self.subspecies[index].next_generation.push(organism);
    }

    /// Evaluates the fitness of each organism in the
    /// population using the passed evaluator.
    ///
    /// # Panics
    /// Panics if the evaluator returns a negative or NaN fitness.
    ///
    /// # Examples
    /// ```
    /// # use subneat_nn::genomics::GeneticConfig;
    /// # use subneat_nn::networks::FunctionApproximatorNetwork;
    /// use subneat::{Population, PopulationConfig};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// # let genetic_config = GeneticConfig::default();
    /// # let config = genetic_config.clone();
    /// let mut population = Population::new(
    ///     PopulationConfig::default(),
    ///     genetic_config,
    ///     &mut ChaCha8Rng::seed_from_u64(0),
    /// )
    /// .unwrap();
    ///
    /// population.evaluate_fitness(|g| {
    ///     # let mut network = FunctionApproximatorNetwork::new(g, &config);
    ///     # // Networks with outputs closer to 0 are given higher scores.
    ///     # let output = network.evaluate_at(&[1.0]).map_or(1.0, |o| o[0]);
    ///     # let fitness = (1.0 - output).powf(2.0);
    ///     // Compute genome's fitness...
    ///     return fitness;
    /// });
    /// ```
    pub fn evaluate_fitness<E>(&mut self, mut evaluator: E)
    where
        E: FnMut(&G) -> f32,
    {
        for organism in self.organisms_mut() {
            let fitness = evaluator(&organism.genome);
            organism.set_fitness(fitness);
        }
    }

    /// Evaluates the fitness of each organism, stopping
    /// at the first evaluation error.
    ///
    /// # Errors
    /// Returns the evaluator's error. Organisms evaluated
    /// before it keep their new fitness.
    ///
    /// # Panics
    /// Panics if the evaluator returns a negative or NaN fitness.
    pub fn try_evaluate_fitness<E, Err>(&mut self, mut evaluator: E) -> Result<(), Err>
    where
        E: FnMut(&G) -> Result<f32, Err>,
    {
        for organism in self.organisms_mut() {
            let fitness = evaluator(&organism.genome)?;
            organism.set_fitness(fitness);
        }
        Ok(())
    }

    /// Breeds the next generation from the current, evaluated one.
    ///
    /// Fitness is shared within subspecies and penalized for
    /// stagnation. Each subspecies is then allotted offspring
    /// in proportion to its members' adjusted fitness, and its
    /// best members reproduce. If the whole population stagnates,
    /// delta coding hands all offspring to the two best subspecies.
    /// Offspring are speciated as they are born, and subspecies
    /// left without offspring go extinct.
    ///
    /// # Errors
    /// Returns an error if the population's bookkeeping breaks,
    /// after which the population is left in an unspecified
    /// state.
    ///
    /// # Examples
    /// ```
    /// # use subneat_nn::genomics::{GeneticConfig, NNGenome as G};
    /// use subneat::{Population, PopulationConfig};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// # let genetic_config = GeneticConfig::default();
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    /// // With `G` a suitable type implementing `Genome`...
    /// let mut population =
    ///     Population::<_, _, G>::new(PopulationConfig::default(), genetic_config, &mut rng)
    ///         .unwrap();
    ///
    /// population.evaluate_fitness(|g| g.genes().len() as f32);
    ///
    /// if let Err(e) = population.evolve(&mut rng) {
    ///     eprintln!("{}", e);
    /// }
    /// assert_eq!(population.generation(), 1);
    /// ```
    pub fn evolve<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), BreedError> {
        debug!(
            generation = self.generation,
            subspecies = self.subspecies.len(),
            highest_fitness = self.highest_fitness,
            "breeding next generation"
        );

        self.reset_generation_state();
        for subspecies in &mut self.subspecies {
            subspecies.adjust_fitness(&self.population_config);
        }
        self.count_offspring();

        let sorted = self.sorted_subspecies();
        self.track_population_champion(&sorted);
        if self.highest_last_changed >= self.population_config.dropoff_age + DELTA_CODING_GRACE
        {
            self.delta_code(&sorted);
        } else if self.population_config.babies_stolen > 0 {
            self.steal_offspring(&sorted, rng);
        }

        for subspecies in &mut self.subspecies {
            subspecies.remove_eliminated();
        }

        self.generation += 1;
        let parents = self.subspecies.len();
        for index in 0..parents {
            let offspring = OffspringFactory::new(
                &self.subspecies,
                &sorted,
                &mut self.history,
                &self.genetic_config,
                &self.population_config,
                self.generation,
            )
            .reproduce(index, rng)?;
            for organism in offspring {
                self.place(organism);
            }
        }

        self.advance_subspecies();
        Ok(())
    }

    /// Clears the evaluation marks and the innovations
    /// recorded during the previous generation.
    fn reset_generation_state(&mut self) {
        for organism in self.organisms_mut() {
            organism.evaluated = false;
            organism.eliminate = false;
            organism.champion = false;
            organism.population_champion = false;
            organism.super_champion_offspring = 0;
        }
        self.history.clear();
    }

    /// Allots each subspecies its share of the next generation,
    /// in proportion to its members' adjusted fitness. Any
    /// shortfall goes to the subspecies expecting the most.
    fn count_offspring(&mut self) {
        let size = self.population_config.size.get();
        let (total, count) = self
            .subspecies
            .iter()
            .flat_map(|s| &s.members)
            .fold((0.0, 0), |(total, count), o| {
                (total + o.adjusted_fitness as f64, count + 1)
            });
        let average = total / count as f64;
        for organism in self.organisms_mut() {
            organism.expected_offspring = if average > 0.0 {
                organism.adjusted_fitness as f64 / average
            } else {
                0.0
            };
        }

        let mut skim = 0.0;
        let mut total_expected = 0;
        for subspecies in &mut self.subspecies {
            skim = subspecies.count_offspring(skim);
            total_expected += subspecies.expected_offspring;
        }

        if total_expected < size {
            // Subspecies founded through `speciate` have no members yet.
            let mut best: Option<usize> = None;
            for (index, subspecies) in self.subspecies.iter().enumerate() {
                if subspecies.members.is_empty() {
                    continue;
                }
                match best {
                    Some(b) if self.subspecies[b].expected_offspring
                        > subspecies.expected_offspring => {}
                    _ => best = Some(index),
                }
            }
            let Some(best) = best else {
                return;
            };
            self.subspecies[best].expected_offspring += 1;
            total_expected += 1;

            if total_expected < size {
                debug!(
                    missing = size - total_expected,
                    "offspring lost to rounding, handing the population to one subspecies"
                );
                for subspecies in &mut self.subspecies {
                    subspecies.expected_offspring = 0;
                }
                self.subspecies[best].expected_offspring = size;
            }
        }
    }

    /// Returns the subspecies' indices ordered by the
    /// fitness of their champions, best first.
    fn sorted_subspecies(&self) -> Vec<usize> {
        let mut sorted: Vec<usize> = (0..self.subspecies.len())
            .filter(|&i| !self.subspecies[i].members.is_empty())
            .collect();
        sorted.sort_by(|&a, &b| {
            let a = self.subspecies[a].members[0].genome.fitness();
            let b = self.subspecies[b].members[0].genome.fitness();
            b.total_cmp(&a)
        });
        sorted
    }

    /// Marks the population champion, and tracks whether
    /// the population's best fitness improved.
    fn track_population_champion(&mut self, sorted: &[usize]) {
        let Some(&best) = sorted.first() else {
            return;
        };
        let champion = &mut self.subspecies[best].members[0];
        champion.population_champion = true;

        let fitness = champion.genome.fitness();
        if fitness > self.highest_fitness {
            self.highest_fitness = fitness;
            self.highest_last_changed = 0;
            debug!(fitness, "new population fitness record");
        } else {
            self.highest_last_changed += 1;
        }
    }

    /// Refocuses reproduction on the best two subspecies,
    /// each receiving half of the population as copies of
    /// its champion.
    fn delta_code(&mut self, sorted: &[usize]) {
        let size = self.population_config.size.get();
        let half = size / 2;
        self.highest_last_changed = 0;
        info!(
            generation = self.generation,
            "population stagnated, applying delta coding"
        );

        match *sorted {
            [] => {}
            [only] => {
                let subspecies = &mut self.subspecies[only];
                subspecies.members[0].super_champion_offspring += size - half;
                subspecies.expected_offspring = size;
                subspecies.age_of_last_improvement = subspecies.age;
            }
            [first, second, ref rest @ ..] => {
                for (index, share) in [(first, half), (second, size - half)] {
                    let subspecies = &mut self.subspecies[index];
                    subspecies.members[0].super_champion_offspring = share;
                    subspecies.expected_offspring = share;
                    subspecies.age_of_last_improvement = subspecies.age;
                }
                for &index in rest {
                    self.subspecies[index].expected_offspring = 0;
                }
            }
        }
    }

    /// Takes offspring from old, unremarkable subspecies and
    /// gives them to the champions of the best ones that are
    /// still improving.
    fn steal_offspring<R: Rng + ?Sized>(&mut self, sorted: &[usize], rng: &mut R) {
        let quota = self.population_config.babies_stolen;
        let dropoff = self.population_config.dropoff_age;

        let mut stolen = 0;
        for &index in sorted.iter().skip(1).rev() {
            if stolen >= quota {
                break;
            }
            let subspecies = &mut self.subspecies[index];
            if subspecies.age > STEALING_MIN_AGE
                && subspecies.expected_offspring > STEALING_MIN_OFFSPRING
            {
                if subspecies.expected_offspring - 1 >= quota - stolen {
                    subspecies.expected_offspring -= quota - stolen;
                    stolen = quota;
                } else {
                    stolen += subspecies.expected_offspring - 1;
                    subspecies.expected_offspring = 1;
                }
            }
        }
        if stolen == 0 {
            return;
        }
        debug!(stolen, "offspring stolen from stagnant subspecies");

        // Subspecies past their dropoff age are dying, and get nothing.
        let receivers: Vec<usize> = sorted
            .iter()
            .copied()
            .filter(|&index| self.subspecies[index].last_improved() <= dropoff)
            .collect();
        let mut receivers = receivers.into_iter().peekable();
        for share in [quota / 5, quota / 5, quota / 10] {
            let Some(&index) = receivers.peek() else {
                break;
            };
            if stolen < share {
                continue;
            }
            let subspecies = &mut self.subspecies[index];
            subspecies.members[0].super_champion_offspring = share;
            subspecies.expected_offspring += share;
            stolen -= share;
            receivers.next();
        }
        for index in receivers {
            if stolen == 0 {
                break;
            }
            if rng.gen::<f32>() > 0.1 {
                let share = stolen.min(3);
                let subspecies = &mut self.subspecies[index];
                subspecies.members[0].super_champion_offspring = share;
                subspecies.expected_offspring += share;
                stolen -= share;
            }
        }

        if stolen > 0 {
            if let Some(&best) = sorted.first() {
                let subspecies = &mut self.subspecies[best];
                subspecies.members[0].super_champion_offspring += stolen;
                subspecies.expected_offspring += stolen;
            }
        }
    }

    /// Promotes every subspecies' offspring to members, aging
    /// the subspecies, and removes the ones left without any.
    fn advance_subspecies(&mut self) {
        self.subspecies.retain_mut(|subspecies| {
            if subspecies.next_generation.is_empty() {
                debug!(id = %subspecies.id(), "subspecies went extinct");
                return false;
            }
            subspecies.age += 1;
            subspecies.to_next_generation();
            true
        });
    }

    /// Returns the organism with the highest raw fitness.
    ///
    /// # Examples
    /// ```
    /// # use subneat_nn::genomics::{GeneticConfig, NNGenome as G};
    /// use subneat::{Population, PopulationConfig};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// # let genetic_config = GeneticConfig::default();
    /// // With `G` a suitable type implementing `Genome`...
    /// let mut population = Population::<_, _, G>::new(
    ///     PopulationConfig {
    ///         size: std::num::NonZeroUsize::new(20).unwrap(),
    ///         ..PopulationConfig::default()
    ///     },
    ///     genetic_config,
    ///     &mut ChaCha8Rng::seed_from_u64(0),
    /// )
    /// .unwrap();
    ///
    /// let mut fitness = 0.0;
    /// population.evaluate_fitness(move |_| {
    ///     fitness += 10.0;
    ///     fitness
    /// });
    ///
    /// assert_eq!(population.champion().fitness(), 20.0 * 10.0);
    /// ```
    pub fn champion(&self) -> &G {
        self.organisms()
            .map(Organism::genome)
            .max_by(|g1, g2| g1.fitness().total_cmp(&g2.fitness()))
            .expect("empty population has no champion")
    }

    /// Returns an iterator over all current organisms,
    /// grouped by subspecies.
    pub fn organisms(&self) -> impl Iterator<Item = &Organism<G>> {
        self.subspecies.iter().flat_map(|s| &s.members)
    }

    /// Returns an iterator over all current organisms, for
    /// evaluating them outside of [`evaluate_fitness`].
    ///
    /// [`evaluate_fitness`]: Population::evaluate_fitness
    pub fn organisms_mut(&mut self) -> impl Iterator<Item = &mut Organism<G>> {
        self.subspecies.iter_mut().flat_map(|s| &mut s.members)
    }

    /// Returns an iterator over all current genomes.
    ///
    /// # Examples
    /// ```
    /// # use subneat_nn::genomics::{GeneticConfig, NNGenome as G};
    /// use subneat::{Population, PopulationConfig};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// # let genetic_config = GeneticConfig::default();
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    /// // With `G` a suitable type implementing `Genome`...
    /// let population =
    ///     Population::<_, _, G>::new(PopulationConfig::default(), genetic_config, &mut rng)
    ///         .unwrap();
    ///
    /// for genome in population.genomes() {
    ///     println!("{}", genome);
    /// }
    /// ```
    pub fn genomes(&self) -> impl Iterator<Item = &G> {
        self.organisms().map(Organism::genome)
    }

    /// Returns an iterator over all current subspecies,
    /// in creation order.
    pub fn subspecies(&self) -> impl Iterator<Item = &Subspecies<G>> {
        self.subspecies.iter()
    }

    /// Returns the current generation number.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Returns the population's innovation history.
    pub fn history(&self) -> &H {
        &self.history
    }

    /// Returns the best raw fitness any population
    /// champion has reached.
    pub fn highest_fitness(&self) -> f32 {
        self.highest_fitness
    }

    /// Returns the number of generations since the
    /// population's best fitness last improved.
    pub fn generations_without_improvement(&self) -> usize {
        self.highest_last_changed
    }

    pub fn population_config(&self) -> &PopulationConfig {
        &self.population_config
    }

    pub fn genetic_config(&self) -> &C {
        &self.genetic_config
    }
}
