use super::ConfigError;

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for population generation
/// and evolution.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0]. This is
/// checked by [`validate`] when a population
/// is created.
///
/// [`validate`]: PopulationConfig::validate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Size of the population.
    pub size: NonZeroUsize,
    /// Genetic distance threshold, beyond which
    /// genomes are considered as belonging to
    /// different subspecies.
    pub compatibility_threshold: f32,
    /// Top fraction of each subspecies which can
    /// participate in reproduction.
    pub survival_threshold: f32,
    /// Number of generations without improvement
    /// after which a subspecies' fitness is heavily
    /// penalized. Five generations more without
    /// improvement of the whole population trigger
    /// delta coding.
    pub dropoff_age: usize,
    /// Fitness multiplier for subspecies at most
    /// 10 generations old.
    pub age_significance: f32,
    /// Chance that a crossover's second parent
    /// comes from another subspecies.
    pub interspecies_mating_chance: f32,
    /// Chance that an offspring is a mutated copy
    /// of a single parent, instead of a crossover.
    pub mutate_only_chance: f32,
    /// Chance that a crossover's child is not
    /// mutated afterwards.
    pub mate_only_chance: f32,
    /// Number of offspring taken each generation from
    /// older subspecies and given to the champions of
    /// the best ones. 0 disables stealing.
    pub babies_stolen: usize,
}

impl PopulationConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, or in the case of
    /// `NonZeroUsize`s, 1.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to abbreviate configuration
    /// instantiation, or to fill in unused values.
    ///
    /// # Examples
    /// ```
    /// use subneat::PopulationConfig;
    ///
    /// let cfg1 = PopulationConfig::zero();
    ///
    /// let cfg2 = PopulationConfig {
    ///     // Specify some values here...
    ///     babies_stolen: 30,
    ///     // Default the rest...
    ///     ..PopulationConfig::zero()
    /// };
    /// ```
    pub const fn zero() -> PopulationConfig {
        PopulationConfig {
            // SAFETY: 1 is a valid NonZeroUsize. Replace this with
            // NonZeroUsize::new(1).unwrap() once const Option::unwrap
            // becomes stable.
            size: unsafe { NonZeroUsize::new_unchecked(1) },
            compatibility_threshold: 0.0,
            survival_threshold: 0.0,
            dropoff_age: 0,
            age_significance: 0.0,
            interspecies_mating_chance: 0.0,
            mutate_only_chance: 0.0,
            mate_only_chance: 0.0,
            babies_stolen: 0,
        }
    }

    /// Checks that every probability lies in [0, 1] and
    /// that the compatibility threshold and age significance
    /// are non-negative.
    ///
    /// # Errors
    /// Returns the first offending parameter.
    ///
    /// # Examples
    /// ```
    /// use subneat::PopulationConfig;
    ///
    /// assert!(PopulationConfig::default().validate().is_ok());
    /// assert!(PopulationConfig {
    ///     mate_only_chance: -0.2,
    ///     ..PopulationConfig::default()
    /// }
    /// .validate()
    /// .is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        let probabilities = [
            ("survival_threshold", self.survival_threshold),
            ("interspecies_mating_chance", self.interspecies_mating_chance),
            ("mutate_only_chance", self.mutate_only_chance),
            ("mate_only_chance", self.mate_only_chance),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ProbabilityOutOfRange { name, value });
            }
        }

        for (name, value) in [
            ("compatibility_threshold", self.compatibility_threshold),
            ("age_significance", self.age_significance),
        ] {
            if !(value >= 0.0) {
                return Err(ConfigError::Negative { name, value });
            }
        }
        Ok(())
    }
}

impl Default for PopulationConfig {
    /// The canonical NEAT parameter set, for a
    /// population of 150.
    fn default() -> PopulationConfig {
        PopulationConfig {
            // SAFETY: 150 is a valid NonZeroUsize.
            size: unsafe { NonZeroUsize::new_unchecked(150) },
            compatibility_threshold: 3.0,
            survival_threshold: 0.2,
            dropoff_age: 15,
            age_significance: 1.0,
            interspecies_mating_chance: 0.001,
            mutate_only_chance: 0.25,
            mate_only_chance: 0.2,
            babies_stolen: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_valid() {
        assert!(PopulationConfig::zero().validate().is_ok());
    }

    #[test]
    fn out_of_range_survival_threshold() {
        let config = PopulationConfig {
            survival_threshold: 1.5,
            ..PopulationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ProbabilityOutOfRange {
                name: "survival_threshold",
                ..
            })
        ));
    }

    #[test]
    fn negative_threshold() {
        let config = PopulationConfig {
            compatibility_threshold: -3.0,
            ..PopulationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Negative {
                name: "compatibility_threshold",
                ..
            })
        ));
    }

    #[test]
    fn deserializes_from_json() {
        let config: PopulationConfig = serde_json::from_str(
            r#"{"size":50,"compatibility_threshold":3.0,"survival_threshold":0.2,
                "dropoff_age":15,"age_significance":1.0,"interspecies_mating_chance":0.001,
                "mutate_only_chance":0.25,"mate_only_chance":0.2,"babies_stolen":0}"#,
        )
        .unwrap();
        assert_eq!(config.size.get(), 50);
        assert_eq!(
            config,
            PopulationConfig {
                size: config.size,
                ..PopulationConfig::default()
            }
        );
    }
}
