use std::sync::Arc;

use crate::base::{FitnessValue, Sequence};
use crate::errors::{FitnessError, TranslationError};
use crate::evolution::{ConservationModel, FitnessFunction};
use crate::genome::CodonTable;

/// One candidate solution: a residue sequence plus its score and lineage.
///
/// The `name` and `origin` are stored in `Arc<str>` so cloning individuals is
/// cheap for the identifier fields; the sequence itself is shared as well.
/// In tree topologies an individual exclusively owns its `descendants`.
#[derive(Debug, Clone)]
pub struct Individual {
    /// Unique identifier
    name: Arc<str>,
    /// Residue sequence
    sequence: Sequence,
    /// Nucleotide sequence that translates to `sequence`, when tracked.
    coding_sequence: Option<Sequence>,
    /// Provenance tag (informational)
    origin: Option<Arc<str>>,
    /// Cached fitness value. `None` indicates that the fitness has not
    /// been computed yet.
    fitness: Option<FitnessValue>,
    /// Accepted mutants of this individual (tree topology only).
    descendants: Vec<Individual>,
}

impl Individual {
    /// Create a new `Individual` with no coding sequence, origin or fitness.
    pub fn new(name: impl Into<Arc<str>>, sequence: Sequence) -> Self {
        Self {
            name: name.into(),
            sequence,
            coding_sequence: None,
            origin: None,
            fitness: None,
            descendants: Vec::new(),
        }
    }

    /// Attach a provenance tag.
    pub fn with_origin(mut self, origin: impl Into<Arc<str>>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Attach a coding sequence after checking that it translates to this
    /// individual's residue sequence.
    pub fn with_coding_sequence(
        mut self,
        coding: Sequence,
        table: &dyn CodonTable,
    ) -> Result<Self, TranslationError> {
        let translated = table.translate(&coding)?;
        if translated != self.sequence {
            return Err(TranslationError::Mismatch {
                expected: self.sequence.to_string(),
                translated: translated.to_string(),
            });
        }
        self.coding_sequence = Some(coding);
        Ok(self)
    }

    /// Attach a coding sequence produced by codon resynchronisation.
    pub(crate) fn with_resynced_coding(mut self, coding: Option<Sequence>) -> Self {
        self.coding_sequence = coding;
        self
    }

    /// Inherit an optional provenance tag.
    pub(crate) fn with_origin_opt(mut self, origin: Option<Arc<str>>) -> Self {
        self.origin = origin;
        self
    }

    pub(crate) fn renamed(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Return the individual's name as a `&str`.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Borrow the residue sequence.
    #[inline]
    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    /// Borrow the coding sequence, if tracked.
    #[inline]
    pub fn coding_sequence(&self) -> Option<&Sequence> {
        self.coding_sequence.as_ref()
    }

    #[inline]
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub(crate) fn origin_arc(&self) -> Option<Arc<str>> {
        self.origin.clone()
    }

    /// Return the cached fitness value for this individual.
    ///
    /// Returns `None` if the fitness has not yet been computed.
    #[inline]
    pub fn cached_fitness(&self) -> Option<FitnessValue> {
        self.fitness
    }

    /// Cached fitness, treating an unscored individual as lethal.
    #[inline]
    pub fn fitness(&self) -> FitnessValue {
        self.fitness.unwrap_or(FitnessValue::LETHAL_FITNESS)
    }

    /// Set the cached fitness value for this individual.
    #[inline]
    pub fn set_cached_fitness(&mut self, fitness: impl Into<FitnessValue>) {
        self.fitness = Some(fitness.into());
    }

    /// Score the sequence and cache the result.
    pub fn evaluate(
        &mut self,
        fitness: &dyn FitnessFunction,
        model: &ConservationModel,
    ) -> Result<FitnessValue, FitnessError> {
        let value = fitness.evaluate(&self.sequence, model)?;
        self.fitness = Some(value);
        Ok(value)
    }

    /// Direct descendants in insertion order.
    #[inline]
    pub fn descendants(&self) -> &[Individual] {
        &self.descendants
    }

    pub(crate) fn descendants_mut(&mut self) -> &mut Vec<Individual> {
        &mut self.descendants
    }

    pub(crate) fn take_descendants(&mut self) -> Vec<Individual> {
        std::mem::take(&mut self.descendants)
    }

    /// Append `child` as a descendant unless a sibling already carries the
    /// same sequence. Returns whether the child was attached.
    pub fn add_descendant(&mut self, child: Individual) -> bool {
        if self
            .descendants
            .iter()
            .any(|sibling| sibling.sequence == child.sequence)
        {
            return false;
        }
        self.descendants.push(child);
        true
    }

    /// Number of nodes in the subtree rooted here, including self.
    pub fn subtree_size(&self) -> usize {
        1 + self
            .descendants
            .iter()
            .map(Individual::subtree_size)
            .sum::<usize>()
    }
}
