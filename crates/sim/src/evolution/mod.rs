//! Evolution module: the conservation model and the operators built on it.
//!
//! - **Conservation**: per-position symbol statistics over a reference set
//! - **Fitness**: consensus matching and the conservation gate
//! - **Mutation**: uniform and likelihood-directed point mutation
//! - **Recombination**: crossover followed by mutation
//! - **Selection**: fitness-proportionate, truncation and k-tournament

pub mod conservation;
mod context;
pub mod fitness;
pub mod mutation;
pub mod recombination;
pub mod selection;

pub use conservation::{ConservationModel, PositionStats, PositionSummary};
pub use context::EvolutionContext;
pub use fitness::{
    ConsensusFitness, ConservationGatedFitness, FitnessFunction, SequenceScorer,
    conservation_gate, consensus_fitness, evaluate_batch,
};
pub use mutation::{Mutated, MutationStrategy, Substitution, directed_mutate, uniform_mutate};
pub use recombination::{CrossoverPolicy, Offspring, ReproductionModel};
pub use selection::{
    Scored, SurvivorSelection, fitness_proportionate, k_tournament, truncation,
};
