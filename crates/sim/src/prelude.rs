//! Commonly used imports for convenience.
//!
//! # Example
//!
//! ```
//! use easme_sim::prelude::*;
//!
//! let alphabet = Alphabet::amino_acids();
//! let reference = vec![
//!     Sequence::parse("MKVL", &alphabet).unwrap(),
//!     Sequence::parse("MKVI", &alphabet).unwrap(),
//! ];
//! let model = ConservationModel::build(&reference).unwrap();
//! assert_eq!(model.conserved_positions(), vec![0, 1, 2]);
//! ```

pub use crate::base::{Alphabet, AlphabetKind, FitnessValue, Sequence};
pub use crate::errors;
pub use crate::evolution::{
    ConsensusFitness, ConservationGatedFitness, ConservationModel, CrossoverPolicy,
    FitnessFunction, MutationStrategy, SurvivorSelection,
};
pub use crate::genome::{CodonTable, Individual, StandardGeneticCode};
pub use crate::simulation::{Configuration, Population, Simulation, SimulationBuilder, Topology};
pub use crate::storage::{Recorder, RecordingStrategy};
