use crate::base::{Alphabet, Sequence};
use crate::evolution::{ConservationModel, FitnessFunction};
use crate::genome::CodonTable;

/// Read-only inputs shared by the mutation and reproduction operators.
///
/// `reference` holds the reference sequences of the model's length; directed
/// mutation samples its comparison sets from it.
#[derive(Debug, Clone, Copy)]
pub struct EvolutionContext<'a> {
    pub model: &'a ConservationModel,
    pub reference: &'a [Sequence],
    pub alphabet: &'a Alphabet,
    pub fitness: &'a dyn FitnessFunction,
    pub codons: Option<&'a dyn CodonTable>,
}
