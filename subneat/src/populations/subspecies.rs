use super::{Organism, PopulationConfig};
use crate::Genome;

use serde::{Deserialize, Serialize};

use std::fmt;

/// Age up to which a subspecies is considered young,
/// and its fitness is multiplied by the configured
/// age significance.
const YOUTH_AGE: usize = 10;

/// Fitness multiplier for subspecies that failed to improve
/// within the configured dropoff age.
const STAGNATION_PENALTY: f32 = 0.01;

/// Identifies subspecies by their generation of
/// birth and their index within it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct SubspeciesId(pub usize, pub usize);

impl fmt::Display for SubspeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.0, self.1)
    }
}

/// A cluster of genetically similar organisms.
///
/// Holds two buffers: the current generation's members,
/// and the offspring placed into the subspecies while
/// the next generation is bred.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Subspecies<G> {
    id: SubspeciesId,
    pub(super) age: usize,
    pub(super) age_of_last_improvement: usize,
    max_fitness_ever: f32,
    pub(super) expected_offspring: usize,
    pub(super) members: Vec<Organism<G>>,
    pub(super) next_generation: Vec<Organism<G>>,
}

impl<G: Genome> Subspecies<G> {
    pub(super) fn new(id: SubspeciesId) -> Subspecies<G> {
        Subspecies {
            id,
            age: 1,
            age_of_last_improvement: 0,
            max_fitness_ever: 0.0,
            expected_offspring: 0,
            members: vec![],
            next_generation: vec![],
        }
    }

    /// Computes every member's adjusted fitness, sorts the
    /// members from best to worst and marks the ones that
    /// will not reproduce.
    ///
    /// Subspecies which have not improved within the dropoff
    /// age are penalized, while young ones are weighted by the
    /// age significance. Fitness is then shared among all members.
    pub(super) fn adjust_fitness(&mut self, config: &PopulationConfig) {
        if self.members.is_empty() {
            return;
        }

        let mut age_debt = (self.age - self.age_of_last_improvement + 1) as i64
            - config.dropoff_age as i64;
        if age_debt == 0 {
            age_debt = 1;
        }
        let count = self.members.len() as f32;
        for member in &mut self.members {
            let mut adjusted = member.genome.fitness();
            if age_debt >= 1 {
                adjusted *= STAGNATION_PENALTY;
            }
            if self.age <= YOUTH_AGE {
                adjusted *= config.age_significance;
            }
            member.adjusted_fitness = adjusted / count;
        }

        self.members
            .sort_by(|a, b| b.adjusted_fitness.total_cmp(&a.adjusted_fitness));

        let best = self.members[0].genome.fitness();
        if best > self.max_fitness_ever {
            self.max_fitness_ever = best;
            self.age_of_last_improvement = self.age;
        }

        let survivors = (config.survival_threshold * count + 1.0).floor() as usize;
        for member in self.members.iter_mut().skip(survivors) {
            member.eliminate = true;
        }
        self.members[0].champion = true;
    }

    /// Sums the members' expected offspring into the subspecies'
    /// whole number of offspring. Fractional parts are pooled in
    /// `skim`, which is carried across subspecies; the leftover
    /// is returned.
    pub(super) fn count_offspring(&mut self, mut skim: f64) -> f64 {
        self.expected_offspring = 0;
        for member in &self.members {
            let whole = member.expected_offspring.trunc();
            self.expected_offspring += whole as usize;
            skim += member.expected_offspring.fract();
            if skim > 1.0 {
                let carried = skim.trunc();
                self.expected_offspring += carried as usize;
                skim -= carried;
            }
        }
        skim
    }

    /// Removes the members marked for elimination.
    pub(super) fn remove_eliminated(&mut self) {
        self.members.retain(|member| !member.eliminate);
    }

    /// Returns the genome new organisms are compared against:
    /// the first offspring already placed in the next generation,
    /// or else the head of the current one.
    pub fn representative(&self) -> Option<&G> {
        self.next_generation
            .first()
            .or_else(|| self.members.first())
            .map(Organism::genome)
    }

    /// Replaces the current members with the next generation's.
    pub(super) fn to_next_generation(&mut self) {
        self.members = std::mem::take(&mut self.next_generation);
    }

    /// Returns the member with the highest raw fitness.
    pub fn champion(&self) -> Option<&Organism<G>> {
        self.members
            .iter()
            .max_by(|a, b| a.genome.fitness().total_cmp(&b.genome.fitness()))
    }
}

impl<G> Subspecies<G> {
    pub fn id(&self) -> SubspeciesId {
        self.id
    }

    /// Number of generations the subspecies has lived through,
    /// starting at 1.
    pub fn age(&self) -> usize {
        self.age
    }

    /// Number of generations since the subspecies'
    /// best fitness last improved.
    pub fn last_improved(&self) -> usize {
        self.age - self.age_of_last_improvement
    }

    /// Best raw fitness any member ever reached.
    pub fn max_fitness_ever(&self) -> f32 {
        self.max_fitness_ever
    }

    /// Offspring assigned for the generation being bred.
    pub fn expected_offspring(&self) -> usize {
        self.expected_offspring
    }

    pub fn members(&self) -> &[Organism<G>] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::populations::testing::Point;

    fn subspecies_with(fitnesses: &[f32]) -> Subspecies<Point> {
        let mut subspecies = Subspecies::new(SubspeciesId(0, 0));
        for &fitness in fitnesses {
            let mut organism = Organism::new(Point::at(0.0), 0);
            organism.set_fitness(fitness);
            subspecies.members.push(organism);
        }
        subspecies
    }

    fn config() -> PopulationConfig {
        PopulationConfig {
            dropoff_age: 15,
            age_significance: 1.0,
            survival_threshold: 0.2,
            ..PopulationConfig::zero()
        }
    }

    #[test]
    fn fitness_is_shared_and_sorted() {
        let mut subspecies = subspecies_with(&[1.0, 4.0, 2.0, 3.0]);
        subspecies.adjust_fitness(&config());

        let adjusted: Vec<f32> = subspecies
            .members()
            .iter()
            .map(Organism::adjusted_fitness)
            .collect();
        assert_eq!(adjusted, [1.0, 0.75, 0.5, 0.25]);
        assert!(subspecies.members()[0].is_champion());
        assert_eq!(subspecies.max_fitness_ever(), 4.0);
        assert_eq!(subspecies.last_improved(), 0);
    }

    #[test]
    fn survivors_follow_threshold() {
        let mut subspecies = subspecies_with(&[1.0; 10]);
        subspecies.adjust_fitness(&config());

        // floor(0.2 * 10 + 1) = 3
        let eliminated = subspecies
            .members()
            .iter()
            .filter(|m| m.eliminated())
            .count();
        assert_eq!(eliminated, 7);
        subspecies.remove_eliminated();
        assert_eq!(subspecies.len(), 3);
    }

    #[test]
    fn stagnation_penalty_applies_at_dropoff_boundary() {
        let mut subspecies = subspecies_with(&[2.0]);
        subspecies.max_fitness_ever = 10.0;
        // age - last + 1 - dropoff == 0
        subspecies.age = 30;
        subspecies.age_of_last_improvement = 16;
        subspecies.adjust_fitness(&config());
        assert!((subspecies.members()[0].adjusted_fitness() - 0.02).abs() < 1e-6);

        let mut subspecies = subspecies_with(&[2.0]);
        subspecies.max_fitness_ever = 10.0;
        subspecies.age = 29;
        subspecies.age_of_last_improvement = 16;
        subspecies.adjust_fitness(&config());
        assert_eq!(subspecies.members()[0].adjusted_fitness(), 2.0);
    }

    #[test]
    fn young_subspecies_are_weighted() {
        let config = PopulationConfig {
            age_significance: 1.5,
            ..config()
        };
        let mut subspecies = subspecies_with(&[2.0]);
        subspecies.adjust_fitness(&config);
        assert_eq!(subspecies.members()[0].adjusted_fitness(), 3.0);

        let mut subspecies = subspecies_with(&[2.0]);
        subspecies.age = 11;
        subspecies.age_of_last_improvement = 11;
        subspecies.adjust_fitness(&config);
        assert_eq!(subspecies.members()[0].adjusted_fitness(), 2.0);
    }

    #[test]
    fn skim_carries_fractions() {
        let mut first = subspecies_with(&[0.0, 0.0]);
        first.members[0].expected_offspring = 1.5;
        first.members[1].expected_offspring = 0.75;
        let skim = first.count_offspring(0.0);
        // 1 + 0.5 + 0.75 carries one whole offspring.
        assert_eq!(first.expected_offspring(), 2);
        assert!((skim - 0.25).abs() < 1e-9);

        let mut second = subspecies_with(&[0.0]);
        second.members[0].expected_offspring = 0.75;
        let skim = second.count_offspring(skim);
        // Exactly 1.0 is not carried.
        assert_eq!(second.expected_offspring(), 0);
        assert!((skim - 1.0).abs() < 1e-9);
    }

    #[test]
    fn representative_prefers_next_generation() {
        let mut subspecies = subspecies_with(&[1.0]);
        assert_eq!(subspecies.representative(), Some(&subspecies.members[0].genome));

        subspecies.next_generation.push(Organism::new(Point::at(5.0), 1));
        assert_eq!(subspecies.representative().map(|p| p.x), Some(5.0));

        subspecies.to_next_generation();
        assert_eq!(subspecies.len(), 1);
        assert!(subspecies.next_generation.is_empty());
    }
}
