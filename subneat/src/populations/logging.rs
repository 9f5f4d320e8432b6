use super::{Population, SubspeciesId};

use crate::genome::{Genome, InnovationHistory};

use std::fmt;

/// Defines different possible reporting levels for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportingLevel {
    /// Clones the entire population.
    AllGenomes,
    /// Clones subspecies champions.
    SubspeciesChampions,
    /// Clones only the population champion.
    PopulationChampion,
    /// Clones no genomes.
    NoGenomes,
}

/// A snapshot of a population.
#[derive(Clone, Debug)]
pub struct Log<G> {
    pub generation_number: usize,
    pub generation_sample: GenerationMemberRecord<G>,
    pub subspecies_count: usize,
    pub highest_fitness: f32,
    pub generations_without_improvement: usize,
    pub genome_stats: Vec<(String, Stats)>,
}

impl<G> fmt::Display for Log<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Log {{")?;
        writeln!(f, "\tgeneration_number: {}", self.generation_number)?;
        writeln!(f, "\tsubspecies_count: {}", self.subspecies_count)?;
        writeln!(f, "\thighest_fitness: {}", self.highest_fitness)?;
        writeln!(
            f,
            "\tgenerations_without_improvement: {}",
            self.generations_without_improvement
        )?;
        for (name, stats) in &self.genome_stats {
            writeln!(f, "\t{}: {:?}", name, stats)?;
        }
        write!(f, "}}")
    }
}

/// A struct for reporting basic statistical data.
#[derive(Clone, Debug, PartialEq)]
pub struct Stats {
    pub maximum: f32,
    pub minimum: f32,
    pub mean: f32,
    pub median: f32,
}

impl Stats {
    /// Returns statistics about numbers in a sequence,
    /// or `None` if it is empty.
    ///
    /// # Examples
    /// ```
    /// use subneat::logging::Stats;
    ///
    /// let stats = Stats::from([-2.0, -1.0, 0.5, 1.0, 1.5].iter().copied()).unwrap();
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    /// ```
    pub fn from(data: impl Iterator<Item = f32>) -> Option<Stats> {
        let mut data: Vec<f32> = data.collect();
        if data.is_empty() {
            return None;
        }
        data.sort_unstable_by(f32::total_cmp);

        let mid = data.len() / 2;
        let median = if data.len() % 2 == 0 {
            (data[mid - 1] + data[mid]) / 2.0
        } else {
            data[mid]
        };
        Some(Stats {
            maximum: data[data.len() - 1],
            minimum: data[0],
            mean: data.iter().sum::<f32>() / data.len() as f32,
            median,
        })
    }
}

/// A reporting-level dependant store
/// of genomes from a population.
#[derive(Clone, Debug)]
pub enum GenerationMemberRecord<G> {
    /// Subspecies IDs, genomes, age and generations since
    /// last improvement.
    Subspecies(Vec<(SubspeciesId, Vec<G>, usize, usize)>),
    /// Only subspecies IDs, subspecies champions, age and
    /// generations since last improvement.
    SubspeciesChampions(Vec<(SubspeciesId, G, usize, usize)>),
    /// Only population champion.
    PopulationChampion(G),
    /// Empty.
    None,
}

/// A log of the evolution of a population over time.
#[derive(Clone, Debug)]
pub struct EvolutionLogger<G> {
    reporting_level: ReportingLevel,
    logs: Vec<Log<G>>,
}

impl<G: Genome> EvolutionLogger<G> {
    /// Returns a logger with the appropiate reporting level.
    ///
    /// # Examples
    /// ```
    /// # use subneat_nn::genomics::NNGenome as G;
    /// use subneat::logging::{EvolutionLogger, ReportingLevel};
    ///
    /// // With `G` a suitable type implementing `Genome`...
    /// let logger = EvolutionLogger::<G>::new(ReportingLevel::NoGenomes);
    /// ```
    pub fn new(reporting_level: ReportingLevel) -> EvolutionLogger<G> {
        EvolutionLogger {
            reporting_level,
            logs: vec![],
        }
    }

    /// Store a snapshot of a population.
    ///
    /// The `genome_stat_extractor` provides a way of
    /// obtaining arbitrary statistics on the population,
    /// where each statistic is named by `stat_names`.
    ///
    /// # Examples
    /// ```
    /// # use subneat_nn::genomics::{GeneticConfig, NNGenome as G};
    /// use subneat::{Population, PopulationConfig};
    /// use subneat::logging::{EvolutionLogger, ReportingLevel};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// // With `G` a suitable type implementing `Genome`...
    /// let mut logger = EvolutionLogger::<G>::new(ReportingLevel::NoGenomes);
    /// # let genetic_config = GeneticConfig::default();
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    /// let population = Population::new(PopulationConfig::zero(), genetic_config, &mut rng).unwrap();
    ///
    /// // Do something with the population...
    /// // Then log a snapshot.
    /// logger.log(&population, &|g| [g.fitness()], ["fitness"]);
    /// ```
    pub fn log<C, H, GSE, const N: usize>(
        &mut self,
        population: &Population<C, H, G>,
        genome_stat_extractor: &GSE,
        stat_names: [&str; N],
    ) where
        H: InnovationHistory<Config = C>,
        G: Genome<InnovationHistory = H, Config = C>,
        GSE: Fn(&G) -> [f32; N],
    {
        let stats = population.genomes().map(genome_stat_extractor);
        let genome_stats = stat_names
            .iter()
            .map(|name| name.to_string())
            .zip(unzip_n_vecs(stats))
            .filter_map(|(name, data)| Some((name, Stats::from(data.into_iter())?)))
            .collect();

        let generation_sample = match self.reporting_level {
            ReportingLevel::AllGenomes => GenerationMemberRecord::Subspecies(
                population
                    .subspecies()
                    .map(|s| {
                        (
                            s.id(),
                            s.members().iter().map(|o| o.genome().clone()).collect(),
                            s.age(),
                            s.last_improved(),
                        )
                    })
                    .collect(),
            ),
            ReportingLevel::SubspeciesChampions => GenerationMemberRecord::SubspeciesChampions(
                population
                    .subspecies()
                    .filter_map(|s| {
                        let champion = s.champion()?.genome().clone();
                        Some((s.id(), champion, s.age(), s.last_improved()))
                    })
                    .collect(),
            ),
            ReportingLevel::PopulationChampion => {
                GenerationMemberRecord::PopulationChampion(population.champion().clone())
            }
            ReportingLevel::NoGenomes => GenerationMemberRecord::None,
        };

        self.logs.push(Log {
            generation_number: population.generation(),
            generation_sample,
            subspecies_count: population.subspecies().count(),
            highest_fitness: population.highest_fitness(),
            generations_without_improvement: population.generations_without_improvement(),
            genome_stats,
        })
    }

    /// Iterate over all logged snapshots.
    ///
    /// # Examples
    /// ```
    /// # use subneat_nn::genomics::NNGenome as G;
    /// use subneat::logging::{EvolutionLogger, ReportingLevel};
    ///
    /// // With `G` a suitable type implementing `Genome`...
    /// let logger = EvolutionLogger::<G>::new(ReportingLevel::AllGenomes);
    /// // Log some stuff... then
    /// for log in logger.iter() {
    ///     println!("{}", log);
    /// }
    /// ```
    pub fn iter(&self) -> impl Iterator<Item = &Log<G>> {
        self.logs.iter()
    }
}

fn unzip_n_vecs<T, const N: usize>(iter: impl Iterator<Item = [T; N]>) -> Vec<Vec<T>> {
    let mut vecs: Vec<Vec<T>> = (0..N).map(|_| Vec::new()).collect();
    for items in iter {
        for (vec, item) in vecs.iter_mut().zip(items) {
            vec.push(item);
        }
    }
    vecs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::populations::testing::{Point, PointConfig};
    use crate::PopulationConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::num::NonZeroUsize;

    fn population() -> Population<PointConfig, crate::populations::testing::Clears, Point> {
        let config = PopulationConfig {
            size: NonZeroUsize::new(12).unwrap(),
            compatibility_threshold: 0.5,
            ..PopulationConfig::default()
        };
        let genetic_config = PointConfig {
            spread: 3.0,
            step: 0.1,
        };
        let mut population =
            Population::new(config, genetic_config, &mut ChaCha8Rng::seed_from_u64(0)).unwrap();
        population.evaluate_fitness(|p: &Point| p.x);
        population
    }

    #[test]
    fn even_median_averages_middle_values() {
        let stats = Stats::from([4.0, 1.0, 3.0, 2.0].into_iter()).unwrap();
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.mean, 2.5);
    }

    #[test]
    fn no_stats_for_empty_data() {
        assert_eq!(Stats::from(std::iter::empty()), None);
    }

    #[test]
    fn unzips_named_stats() {
        let vecs = unzip_n_vecs([[1, 2], [3, 4], [5, 6]].into_iter());
        assert_eq!(vecs, [vec![1, 3, 5], vec![2, 4, 6]]);
    }

    #[test]
    fn logs_subspecies_champions() {
        let population = population();
        let mut logger = EvolutionLogger::new(ReportingLevel::SubspeciesChampions);
        logger.log(&population, &|p: &Point| [p.x, p.fitness()], ["x", "fitness"]);

        let log = logger.iter().next().unwrap();
        assert_eq!(log.generation_number, 0);
        assert_eq!(log.subspecies_count, population.subspecies().count());
        assert_eq!(log.genome_stats.len(), 2);
        assert_eq!(log.genome_stats[0].1, log.genome_stats[1].1);
        match &log.generation_sample {
            GenerationMemberRecord::SubspeciesChampions(champions) => {
                assert_eq!(champions.len(), log.subspecies_count);
                let best = champions
                    .iter()
                    .map(|(_, g, ..)| g.fitness())
                    .fold(0.0, f32::max);
                assert_eq!(best, population.champion().fitness());
            }
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn logs_every_genome() {
        let population = population();
        let mut logger = EvolutionLogger::new(ReportingLevel::AllGenomes);
        logger.log(&population, &|p: &Point| [p.fitness()], ["fitness"]);

        let log = logger.iter().next().unwrap();
        match &log.generation_sample {
            GenerationMemberRecord::Subspecies(subspecies) => {
                let total: usize = subspecies.iter().map(|(_, g, ..)| g.len()).sum();
                assert_eq!(total, 12);
            }
            other => panic!("unexpected record {:?}", other),
        };
    }
}
