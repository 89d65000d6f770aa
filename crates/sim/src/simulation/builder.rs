//! Builder pattern for creating simulations.
//!
//! Provides a fluent API for configuring and creating simulations with
//! sensible defaults and comprehensive validation.

use std::sync::Arc;

use log::warn;

use crate::base::{AlphabetKind, Sequence};
pub use crate::errors::BuilderError;
use crate::evolution::{
    ConsensusFitness, ConservationGatedFitness, ConservationModel, CrossoverPolicy,
    FitnessFunction, MutationStrategy, SequenceScorer, SurvivorSelection,
};
use crate::genome::{CodonTable, Individual};
use crate::simulation::{Configuration, FitnessMode, Population, Simulation, Topology};

/// Builder for constructing Simulation instances with a fluent API.
///
/// Only the reference set is required. Without explicit seeds the reference
/// sequences themselves (deduplicated) form the initial population.
///
/// # Examples
///
/// ```
/// use easme_sim::base::{Alphabet, Sequence};
/// use easme_sim::simulation::SimulationBuilder;
///
/// let alphabet = Alphabet::amino_acids();
/// let reference: Vec<Sequence> = ["MKVLA", "MKVLA", "MRVLA", "MKILA"]
///     .iter()
///     .map(|s| Sequence::parse(s, &alphabet).unwrap())
///     .collect();
///
/// let mut sim = SimulationBuilder::new()
///     .reference(reference)
///     .generations(10)
///     .max_population_size(8)
///     .offspring_per_generation(4)
///     .seed(42)
///     .build()
///     .unwrap();
/// sim.run().unwrap();
/// assert_eq!(sim.generation(), 10);
/// ```
#[derive(Clone, Default)]
pub struct SimulationBuilder {
    config: Configuration,
    reference: Option<Vec<Sequence>>,
    seeds: Option<Vec<Individual>>,
    fitness: Option<Arc<dyn FitnessFunction>>,
    scorers: Option<(Arc<dyn SequenceScorer>, Arc<dyn SequenceScorer>)>,
    codons: Option<Arc<dyn CodonTable>>,
}

impl SimulationBuilder {
    /// Create a new simulation builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a loaded configuration.
    pub fn from_config(config: Configuration) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Set the number of generations to run (default: 100).
    pub fn generations(mut self, generations: usize) -> Self {
        self.config.execution.generations = generations;
        self
    }

    pub fn max_population_size(mut self, size: usize) -> Self {
        self.config.execution.max_population_size = size;
        self
    }

    pub fn offspring_per_generation(mut self, count: usize) -> Self {
        self.config.execution.offspring_per_generation = count;
        self
    }

    /// Size of the parent pool (default: the population size).
    pub fn parent_pool_size(mut self, size: usize) -> Self {
        self.config.execution.parent_pool_size = Some(size);
        self
    }

    /// Consecutive duplicate children tolerated per generation (default: 100).
    pub fn max_child_attempts(mut self, attempts: usize) -> Self {
        self.config.execution.max_child_attempts = attempts;
        self
    }

    /// Set the random seed for reproducibility (default: None = random).
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.execution.seed = Some(seed);
        self
    }

    pub fn topology(mut self, topology: Topology) -> Self {
        self.config.execution.topology = topology;
        self
    }

    pub fn alphabet(mut self, alphabet: AlphabetKind) -> Self {
        self.config.evolution.alphabet = alphabet;
        self
    }

    pub fn mutation(mut self, mutation: MutationStrategy) -> Self {
        self.config.evolution.mutation = mutation;
        self
    }

    pub fn crossover(mut self, crossover: CrossoverPolicy) -> Self {
        self.config.evolution.crossover = crossover;
        self
    }

    pub fn survivor_selection(mut self, selection: SurvivorSelection) -> Self {
        self.config.evolution.survivor_selection = selection;
        self
    }

    pub fn fitness_mode(mut self, mode: FitnessMode) -> Self {
        self.config.evolution.fitness = mode;
        self
    }

    /// Keep only seeds carrying this origin tag.
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.config.initialization.origin = Some(origin.into());
        self
    }

    /// Drop seeds of the wrong length instead of failing (default: false).
    pub fn drop_mismatched_seeds(mut self, drop: bool) -> Self {
        self.config.initialization.drop_mismatched_seeds = drop;
        self
    }

    /// Reference set the conservation model is built from (required).
    pub fn reference(mut self, reference: Vec<Sequence>) -> Self {
        self.reference = Some(reference);
        self
    }

    /// Initial individuals (default: the reference sequences).
    pub fn seeds(mut self, seeds: Vec<Individual>) -> Self {
        self.seeds = Some(seeds);
        self
    }

    /// Use a custom fitness function, overriding the configured mode.
    pub fn fitness_function(mut self, fitness: impl FitnessFunction + 'static) -> Self {
        self.fitness = Some(Arc::new(fitness));
        self
    }

    /// External validity and aggregation scorers for the conservation-gated
    /// fitness mode.
    pub fn external_scorers(
        mut self,
        validity: impl SequenceScorer + 'static,
        aggregation: impl SequenceScorer + 'static,
    ) -> Self {
        self.scorers = Some((Arc::new(validity), Arc::new(aggregation)));
        self
    }

    /// Codon table used to keep coding sequences in sync with mutations.
    pub fn codon_table(mut self, table: impl CodonTable + 'static) -> Self {
        self.codons = Some(Arc::new(table));
        self
    }

    /// Build and validate the simulation.
    pub fn build(self) -> Result<Simulation, BuilderError> {
        let config = self.config;
        config.validate()?;
        let alphabet = config
            .evolution
            .alphabet
            .build()
            .map_err(|e| BuilderError::InvalidParameter(format!("alphabet: {e}")))?;

        let mut reference = self
            .reference
            .ok_or(BuilderError::MissingRequired("reference"))?;
        let model = ConservationModel::build(&reference)?;
        reference.retain(|seq| seq.len() == model.len());

        if let MutationStrategy::Directed { count, .. } = config.evolution.mutation {
            if count > model.len() {
                return Err(BuilderError::InvalidParameter(format!(
                    "directed mutation count {count} exceeds the model length {}",
                    model.len()
                )));
            }
            let variable = model
                .mutability_likelihoods()
                .iter()
                .filter(|&&w| w > 0.0)
                .count();
            if count > variable {
                warn!(
                    "Directed mutation count {count} exceeds the {variable} variable positions; \
                     the remainder is drawn uniformly"
                );
            }
        }

        let fitness: Arc<dyn FitnessFunction> = match (self.fitness, config.evolution.fitness) {
            (Some(fitness), _) => fitness,
            (None, FitnessMode::Consensus) => Arc::new(ConsensusFitness),
            (None, FitnessMode::ConservationGated) => {
                let (validity, aggregation) = self
                    .scorers
                    .ok_or(BuilderError::MissingRequired("external_scorers"))?;
                Arc::new(ConservationGatedFitness::from_shared(validity, aggregation))
            }
        };

        let mut seeds = self.seeds.unwrap_or_else(|| {
            reference
                .iter()
                .enumerate()
                .map(|(i, seq)| Individual::new(format!("seed_{i}"), seq.clone()))
                .collect()
        });

        if let Some(origin) = &config.initialization.origin {
            seeds.retain(|ind| ind.origin() == Some(origin.as_str()));
        }

        if config.initialization.drop_mismatched_seeds {
            let before = seeds.len();
            seeds.retain(|ind| ind.sequence().len() == model.len());
            let dropped = before - seeds.len();
            if dropped > 0 {
                warn!(
                    "Dropped {dropped} seeds whose length differs from the model length {}",
                    model.len()
                );
            }
        }

        if seeds.is_empty() {
            return Err(BuilderError::EmptyPopulation);
        }

        let outside = |seq: &Sequence| seq.as_bytes().iter().any(|&b| !alphabet.contains(b));
        if let Some(seq) = reference.iter().find(|seq| outside(seq)) {
            return Err(BuilderError::InvalidParameter(format!(
                "reference sequence {seq} uses symbols outside the alphabet {alphabet}"
            )));
        }
        if let Some(ind) = seeds.iter().find(|ind| outside(ind.sequence())) {
            return Err(BuilderError::InvalidParameter(format!(
                "seed '{}' uses symbols outside the alphabet {alphabet}",
                ind.name()
            )));
        }

        let population = Population::initialize(
            seeds,
            config.execution.topology,
            &model,
            fitness.as_ref(),
        )?;

        Ok(Simulation::new(
            population,
            model,
            reference,
            alphabet,
            fitness,
            self.codons,
            config,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{Alphabet, FitnessValue};
    use crate::errors::{ConfigError, ConservationError, FitnessError};

    fn seq(text: &str) -> Sequence {
        Sequence::parse(text, &Alphabet::amino_acids()).unwrap()
    }

    fn reference() -> Vec<Sequence> {
        vec![seq("MKVLA"), seq("MKVLA"), seq("MRVLA"), seq("MKILA"), seq("MKV")]
    }

    #[test]
    fn test_builder_defaults_seed_from_reference() {
        let sim = SimulationBuilder::new().reference(reference()).build().unwrap();
        // the short sequence is dropped from the model and the seeds
        assert_eq!(sim.model().len(), 5);
        assert_eq!(sim.model().dropped(), 1);
        assert_eq!(sim.reference().len(), 4);
        // MKVLA appears twice
        assert_eq!(sim.population().size(), 3);
        assert_eq!(sim.population().forest()[0].name(), "seed_0");
        assert_eq!(sim.best().unwrap().fitness(), FitnessValue::new(1.0));
    }

    #[test]
    fn test_builder_missing_reference() {
        let err = SimulationBuilder::new().build().unwrap_err();
        assert!(matches!(err, BuilderError::MissingRequired("reference")));
    }

    #[test]
    fn test_builder_empty_reference() {
        let err = SimulationBuilder::new().reference(Vec::new()).build().unwrap_err();
        assert!(matches!(
            err,
            BuilderError::Conservation(ConservationError::EmptyInput)
        ));
    }

    #[test]
    fn test_builder_invalid_config() {
        let err = SimulationBuilder::new()
            .reference(reference())
            .offspring_per_generation(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, BuilderError::Config(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_builder_gated_mode_needs_scorers() {
        let err = SimulationBuilder::new()
            .reference(reference())
            .fitness_mode(FitnessMode::ConservationGated)
            .build()
            .unwrap_err();
        assert!(matches!(err, BuilderError::MissingRequired("external_scorers")));

        let sim = SimulationBuilder::new()
            .reference(reference())
            .fitness_mode(FitnessMode::ConservationGated)
            .external_scorers(|_: &Sequence| 0.5, |_: &Sequence| 0.5)
            .build()
            .unwrap();
        assert_eq!(sim.best().unwrap().fitness(), FitnessValue::new(0.25));
    }

    #[test]
    fn test_builder_seed_length_mismatch() {
        let seeds = vec![Individual::new("a", seq("MKVLA")), Individual::new("b", seq("MK"))];
        let err = SimulationBuilder::new()
            .reference(reference())
            .seeds(seeds.clone())
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            BuilderError::Fitness(FitnessError::LengthMismatch { .. })
        ));

        let sim = SimulationBuilder::new()
            .reference(reference())
            .seeds(seeds)
            .drop_mismatched_seeds(true)
            .build()
            .unwrap();
        assert_eq!(sim.population().size(), 1);
    }

    #[test]
    fn test_builder_origin_filter() {
        let seeds = vec![
            Individual::new("a", seq("MKVLA")).with_origin("Alabama"),
            Individual::new("b", seq("MRVLA")).with_origin("Texas"),
        ];
        let sim = SimulationBuilder::new()
            .reference(reference())
            .seeds(seeds.clone())
            .origin("Texas")
            .build()
            .unwrap();
        assert_eq!(sim.population().forest()[0].name(), "b");

        let err = SimulationBuilder::new()
            .reference(reference())
            .seeds(seeds)
            .origin("Ohio")
            .build()
            .unwrap_err();
        assert!(matches!(err, BuilderError::EmptyPopulation));
    }

    #[test]
    fn test_builder_rejects_directed_count_above_length() {
        let err = SimulationBuilder::new()
            .reference(reference())
            .mutation(MutationStrategy::Directed {
                count: 6,
                comparison_size: 0,
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, BuilderError::InvalidParameter(_)));

        // more than the two variable columns is still allowed
        assert!(
            SimulationBuilder::new()
                .reference(reference())
                .mutation(MutationStrategy::Directed {
                    count: 5,
                    comparison_size: 0,
                })
                .build()
                .is_ok()
        );
    }

    #[test]
    fn test_builder_rejects_symbols_outside_alphabet() {
        let err = SimulationBuilder::new()
            .alphabet(AlphabetKind::Custom {
                symbols: "MKVLA".into(),
            })
            .reference(reference())
            .build()
            .unwrap_err();
        assert!(matches!(err, BuilderError::InvalidParameter(_)));
    }
}
