use super::{BreedError, Organism, PopulationConfig, Subspecies};
use crate::Genome;

use rand::Rng;
use rand_distr::StandardNormal;

/// Number of draws made for an interspecies partner
/// before settling for the parent's own subspecies.
const INTERSPECIES_ATTEMPTS: usize = 5;

/// Auxiliary type for offspring generation.
/// Produces a subspecies' allotted offspring from
/// the surviving members, according to the specified
/// configs.
pub(super) struct OffspringFactory<'a, G: Genome> {
    subspecies: &'a [Subspecies<G>],
    sorted: &'a [usize],
    history: &'a mut G::InnovationHistory,
    genetic_config: &'a G::Config,
    population_config: &'a PopulationConfig,
    generation: usize,
}

impl<'a, G: Genome> OffspringFactory<'a, G> {
    /// `sorted` holds indices into `subspecies`, ordered
    /// from best to worst champion.
    pub(super) fn new(
        subspecies: &'a [Subspecies<G>],
        sorted: &'a [usize],
        history: &'a mut G::InnovationHistory,
        genetic_config: &'a G::Config,
        population_config: &'a PopulationConfig,
        generation: usize,
    ) -> OffspringFactory<'a, G> {
        OffspringFactory {
            subspecies,
            sorted,
            history,
            genetic_config,
            population_config,
            generation,
        }
    }

    /// Generates the offspring allotted to the subspecies
    /// at `index`, in birth order.
    ///
    /// Copies of the champion come first, if it was granted
    /// super champion offspring or the subspecies is large
    /// enough. The rest are mutated copies of a random
    /// member, or crossovers.
    ///
    /// # Errors
    /// Fails if offspring are expected from an empty subspecies,
    /// or if more are expected than the whole population holds.
    pub(super) fn reproduce<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        rng: &mut R,
    ) -> Result<Vec<Organism<G>>, BreedError> {
        let all_subspecies = self.subspecies;
        let subspecies = &all_subspecies[index];
        let expected = subspecies.expected_offspring;
        if expected == 0 {
            return Ok(vec![]);
        }
        let members = &subspecies.members;
        if members.is_empty() {
            return Err(BreedError::EmptySubspecies {
                id: subspecies.id(),
                expected,
            });
        }
        let capacity = self.population_config.size.get();
        if expected > capacity {
            return Err(BreedError::CapacityExceeded {
                id: subspecies.id(),
                expected,
                capacity,
            });
        }

        let champion = &members[0];
        let mut super_champion_offspring = champion.super_champion_offspring;
        let mut champion_cloned = false;
        let mut offspring = Vec::with_capacity(expected);
        for _ in 0..expected {
            let child = if super_champion_offspring > 0 {
                let mut genome = champion.genome.clone();
                if super_champion_offspring > 1 {
                    genome.perturb(self.history, self.genetic_config, rng);
                }
                let mut child = Organism::new(genome, self.generation);
                if super_champion_offspring == 1 && champion.population_champion {
                    child.population_champion_child = true;
                    child.high_fitness = champion.genome.fitness();
                }
                super_champion_offspring -= 1;
                child
            } else if !champion_cloned && expected > 5 {
                champion_cloned = true;
                Organism::new(champion.genome.clone(), self.generation)
            } else if rng.gen::<f32>() < self.population_config.mutate_only_chance
                || members.len() == 1
            {
                let parent = &members[rng.gen_range(0..members.len())];
                let mut genome = parent.genome.clone();
                genome.mutate(self.history, self.genetic_config, rng);
                Organism::new(genome, self.generation)
            } else {
                Organism::new(self.crossover(index, rng), self.generation)
            };
            offspring.push(child);
        }

        Ok(offspring)
    }

    /// Mates a random member of the subspecies at `index` with
    /// either another random member, or the champion of a
    /// subspecies picked with a bias towards the best.
    fn crossover<R: Rng + ?Sized>(&mut self, index: usize, rng: &mut R) -> G {
        let subspecies = self.subspecies;
        let members = &subspecies[index].members;
        let mother_index = rng.gen_range(0..members.len());
        let (father_subspecies, father_index) =
            if rng.gen::<f32>() > self.population_config.interspecies_mating_chance {
                (index, rng.gen_range(0..members.len()))
            } else {
                (self.interspecies_partner(index, rng), 0)
            };

        let mother = &members[mother_index].genome;
        let father = &subspecies[father_subspecies].members[father_index].genome;
        let mut child = G::mate(mother, father, self.genetic_config, rng);

        if rng.gen::<f32>() > self.population_config.mate_only_chance
            || (father_subspecies, father_index) == (index, mother_index)
            || G::genetic_distance(mother, father, self.genetic_config) == 0.0
        {
            child.mutate(self.history, self.genetic_config, rng);
        }
        child
    }

    /// Picks a subspecies index from the sorted list,
    /// favoring the top. Gives up and returns `own`
    /// after a few draws land on it.
    fn interspecies_partner<R: Rng + ?Sized>(&self, own: usize, rng: &mut R) -> usize {
        let last = (self.sorted.len() - 1) as f32;
        let mut partner = own;
        for _ in 0..INTERSPECIES_ATTEMPTS {
            let gaussian: f32 = rng.sample(StandardNormal);
            let multiplier = (gaussian / 4.0).min(1.0);
            let position = (multiplier * last).round().max(0.0) as usize;
            partner = self.sorted[position];
            if partner != own {
                break;
            }
        }
        partner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::populations::testing::{Clears, Point, PointConfig};
    use crate::populations::SubspeciesId;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const GENETIC_CONFIG: PointConfig = PointConfig {
        spread: 1.0,
        step: 0.5,
    };

    fn subspecies(id: usize, positions: &[f32], expected: usize) -> Subspecies<Point> {
        let mut subspecies = Subspecies::new(SubspeciesId(0, id));
        for &x in positions {
            let mut organism = Organism::new(Point::at(x), 0);
            organism.set_fitness(x.abs());
            subspecies.members.push(organism);
        }
        subspecies.expected_offspring = expected;
        subspecies
    }

    fn config(size: usize) -> PopulationConfig {
        PopulationConfig {
            size: std::num::NonZeroUsize::new(size).unwrap(),
            mutate_only_chance: 0.25,
            mate_only_chance: 0.2,
            ..PopulationConfig::zero()
        }
    }

    #[test]
    fn empty_subspecies_is_fatal() {
        let subspecies = vec![subspecies(0, &[], 3)];
        let mut history = Clears(0);
        let config = config(10);
        let result = OffspringFactory::new(&subspecies, &[0], &mut history, &GENETIC_CONFIG, &config, 1)
            .reproduce(0, &mut ChaCha8Rng::seed_from_u64(0));
        assert_eq!(
            result.unwrap_err(),
            BreedError::EmptySubspecies {
                id: SubspeciesId(0, 0),
                expected: 3
            }
        );
    }

    #[test]
    fn oversized_allotment_is_fatal() {
        let subspecies = vec![subspecies(0, &[1.0], 11)];
        let mut history = Clears(0);
        let config = config(10);
        let result = OffspringFactory::new(&subspecies, &[0], &mut history, &GENETIC_CONFIG, &config, 1)
            .reproduce(0, &mut ChaCha8Rng::seed_from_u64(0));
        assert!(matches!(
            result,
            Err(BreedError::CapacityExceeded {
                expected: 11,
                capacity: 10,
                ..
            })
        ));
    }

    #[test]
    fn nothing_expected_nothing_produced() {
        let subspecies = vec![subspecies(0, &[], 0)];
        let mut history = Clears(0);
        let config = config(10);
        let offspring = OffspringFactory::new(&subspecies, &[0], &mut history, &GENETIC_CONFIG, &config, 1)
            .reproduce(0, &mut ChaCha8Rng::seed_from_u64(0))
            .unwrap();
        assert!(offspring.is_empty());
    }

    #[test]
    fn super_champion_offspring_come_first() {
        let mut subspecies = vec![subspecies(0, &[3.0, 1.0], 4)];
        subspecies[0].members[0].super_champion_offspring = 3;
        subspecies[0].members[0].population_champion = true;
        let mut history = Clears(0);
        let config = config(10);
        let offspring = OffspringFactory::new(&subspecies, &[0], &mut history, &GENETIC_CONFIG, &config, 7)
            .reproduce(0, &mut ChaCha8Rng::seed_from_u64(1))
            .unwrap();

        assert_eq!(offspring.len(), 4);
        assert!(offspring.iter().all(|o| o.generation() == 7));
        // Perturbed copies stay within a tenth of a step.
        for child in &offspring[0..2] {
            assert!((child.genome().x - 3.0).abs() <= 0.051);
            assert!(!child.is_population_champion_child());
        }
        // The last copy is exact, and remembers its parent's fitness.
        assert_eq!(offspring[2].genome().x, 3.0);
        assert!(offspring[2].is_population_champion_child());
        assert_eq!(offspring[2].high_fitness(), 3.0);
        assert!(!offspring[3].is_population_champion_child());
    }

    #[test]
    fn large_subspecies_clone_their_champion() {
        let subspecies = vec![subspecies(0, &[3.0, 1.0], 6)];
        let mut history = Clears(0);
        let config = config(10);
        let offspring = OffspringFactory::new(&subspecies, &[0], &mut history, &GENETIC_CONFIG, &config, 1)
            .reproduce(0, &mut ChaCha8Rng::seed_from_u64(2))
            .unwrap();
        assert_eq!(offspring.len(), 6);
        assert_eq!(offspring[0].genome().x, 3.0);
    }

    #[test]
    fn lone_members_are_mutated() {
        let subspecies = vec![subspecies(0, &[2.0], 5)];
        let mut history = Clears(0);
        let config = PopulationConfig {
            mutate_only_chance: 0.0,
            ..config(10)
        };
        let offspring = OffspringFactory::new(&subspecies, &[0], &mut history, &GENETIC_CONFIG, &config, 1)
            .reproduce(0, &mut ChaCha8Rng::seed_from_u64(3))
            .unwrap();
        for child in offspring {
            assert!((child.genome().x - 2.0).abs() <= 0.5);
            assert_ne!(child.genome().x, 2.0);
        }
    }

    #[test]
    fn interspecies_partner_favors_the_top() {
        let subspecies: Vec<_> = (0..4).map(|i| subspecies(i, &[i as f32], 0)).collect();
        let sorted = [3, 2, 1, 0];
        let mut history = Clears(0);
        let config = config(10);
        let factory =
            OffspringFactory::new(&subspecies, &sorted, &mut history, &GENETIC_CONFIG, &config, 1);
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        let mut picks = [0; 4];
        for _ in 0..1000 {
            picks[factory.interspecies_partner(0, &mut rng)] += 1;
        }
        assert!(picks[3] > picks[2]);
        assert!(picks[2] > picks[1]);
    }

    #[test]
    fn single_subspecies_mates_with_itself() {
        let subspecies = vec![subspecies(0, &[1.0], 0)];
        let mut history = Clears(0);
        let config = config(10);
        let factory =
            OffspringFactory::new(&subspecies, &[0], &mut history, &GENETIC_CONFIG, &config, 1);
        assert_eq!(factory.interspecies_partner(0, &mut ChaCha8Rng::seed_from_u64(5)), 0);
    }
}
