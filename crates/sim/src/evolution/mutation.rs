//! Point mutation operators.
//!
//! Both operators return a new sequence and leave their input untouched:
//!
//! ## Uniform mutation
//! One position is chosen uniformly and replaced by a symbol drawn uniformly
//! from the alphabet minus the current symbol.
//!
//! ## Directed mutation
//! `count` distinct positions are chosen by weighted sampling without
//! replacement, where the weight of a position is its mutability likelihood
//! (`1 − conservation score`). Poorly conserved positions therefore mutate
//! more often and fully conserved positions never do. The likelihoods come
//! from a fresh conservation model over a comparison set sampled from the
//! reference sequences, so repeated mutations see slightly different
//! landscapes. A sample showing fewer than `count` variable positions is
//! redrawn a few times, then the whole reference set is used. Picks the
//! weights cannot supply are spread uniformly over the remaining positions.
//!
//! [`MutationStrategy`] selects between the two and turns a parent into a
//! scored child [`Individual`].

use std::sync::Arc;

use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::base::{Alphabet, Sequence};
use crate::errors::MutationError;
use crate::evolution::{ConservationModel, EvolutionContext};
use crate::genome::Individual;
use crate::genome::coding::resync_coding;

/// One replaced symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Substitution {
    pub position: usize,
    pub from: u8,
    pub to: u8,
}

/// A mutated copy and the substitutions that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutated {
    pub sequence: Sequence,
    /// Sorted by position.
    pub substitutions: Vec<Substitution>,
}

impl Mutated {
    /// `(position, new symbol)` pairs.
    pub fn edits(&self) -> Vec<(usize, u8)> {
        self.substitutions.iter().map(|s| (s.position, s.to)).collect()
    }

    fn apply<R: Rng + ?Sized>(
        sequence: &Sequence,
        mut positions: Vec<usize>,
        alphabet: &Alphabet,
        rng: &mut R,
    ) -> Result<Self, MutationError> {
        positions.sort_unstable();
        let mut substitutions = Vec::with_capacity(positions.len());
        for position in positions {
            let from = sequence.as_bytes()[position];
            let to = alphabet
                .choose_other(from, rng)
                .ok_or(MutationError::AlphabetTooSmall(alphabet.len()))?;
            substitutions.push(Substitution { position, from, to });
        }
        let edits: Vec<(usize, u8)> = substitutions.iter().map(|s| (s.position, s.to)).collect();
        let sequence = sequence.with_substitutions(&edits)?;
        Ok(Self {
            sequence,
            substitutions,
        })
    }
}

/// Replace exactly one uniformly chosen position.
///
/// # Errors
/// - `InsufficientDiversity` if the sequence is empty.
/// - `AlphabetTooSmall` if the alphabet offers no alternative symbol.
pub fn uniform_mutate<R: Rng + ?Sized>(
    sequence: &Sequence,
    alphabet: &Alphabet,
    rng: &mut R,
) -> Result<Mutated, MutationError> {
    if alphabet.len() < 2 {
        return Err(MutationError::AlphabetTooSmall(alphabet.len()));
    }
    if sequence.is_empty() {
        return Err(MutationError::InsufficientDiversity {
            requested: 1,
            available: 0,
        });
    }
    let position = rng.random_range(0..sequence.len());
    Mutated::apply(sequence, vec![position], alphabet, rng)
}

/// Replace exactly `count` distinct positions chosen with probability
/// proportional to `likelihoods`.
///
/// Once a position is picked its weight drops to zero, so the remaining
/// draws are conditioned on distinctness without an unbounded retry loop.
/// When fewer than `count` positions have a non-zero likelihood, all of them
/// are taken and the rest are drawn uniformly from the unpicked positions.
///
/// # Errors
/// - `AlphabetTooSmall` if the alphabet offers no alternative symbol.
/// - `LikelihoodLength` if `likelihoods` does not match the sequence.
/// - `InvalidLikelihood` for negative or non-finite weights.
/// - `InsufficientDiversity` if `count` exceeds the sequence length.
pub fn directed_mutate<R: Rng + ?Sized>(
    sequence: &Sequence,
    likelihoods: &[f64],
    count: usize,
    alphabet: &Alphabet,
    rng: &mut R,
) -> Result<Mutated, MutationError> {
    if alphabet.len() < 2 {
        return Err(MutationError::AlphabetTooSmall(alphabet.len()));
    }
    if likelihoods.len() != sequence.len() {
        return Err(MutationError::LikelihoodLength {
            likelihoods: likelihoods.len(),
            sequence: sequence.len(),
        });
    }
    if let Some(&bad) = likelihoods.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(MutationError::InvalidLikelihood(bad));
    }
    if count > sequence.len() {
        return Err(MutationError::InsufficientDiversity {
            requested: count,
            available: sequence.len(),
        });
    }
    if count == 0 {
        return Ok(Mutated {
            sequence: sequence.clone(),
            substitutions: Vec::new(),
        });
    }

    let eligible = likelihoods.iter().filter(|&&w| w > 0.0).count();
    let weighted = count.min(eligible);
    let mut positions = Vec::with_capacity(count);
    if weighted > 0 {
        let insufficient = |_| MutationError::InsufficientDiversity {
            requested: count,
            available: eligible,
        };
        let mut dist = WeightedIndex::new(likelihoods).map_err(insufficient)?;
        while positions.len() < weighted {
            let position = dist.sample(rng);
            positions.push(position);
            if positions.len() < weighted {
                dist.update_weights(&[(position, &0.0)]).map_err(insufficient)?;
            }
        }
    }
    if positions.len() < count {
        let rest: Vec<usize> = (0..sequence.len())
            .filter(|p| !positions.contains(p))
            .collect();
        let missing = count - positions.len();
        positions.extend(rest.choose_multiple(rng, missing).copied());
    }
    Mutated::apply(sequence, positions, alphabet, rng)
}

/// Which point mutation operator a run uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MutationStrategy {
    /// One uniformly chosen position per child.
    #[default]
    Uniform,
    /// `count` positions weighted by mutability likelihood.
    ///
    /// `comparison_size` reference sequences are sampled per mutation to
    /// derive the likelihoods; `0` uses the whole reference set.
    Directed {
        count: usize,
        #[serde(default)]
        comparison_size: usize,
    },
}

impl MutationStrategy {
    /// Mutate a sequence according to the strategy.
    pub fn mutate_sequence<R: Rng + ?Sized>(
        &self,
        sequence: &Sequence,
        ctx: &EvolutionContext<'_>,
        rng: &mut R,
    ) -> Result<Mutated, MutationError> {
        match *self {
            Self::Uniform => uniform_mutate(sequence, ctx.alphabet, rng),
            Self::Directed {
                count,
                comparison_size,
            } => {
                let likelihoods = comparison_likelihoods(ctx, count, comparison_size, rng)?;
                directed_mutate(sequence, &likelihoods, count, ctx.alphabet, rng)
            }
        }
    }

    /// Produce a scored child from a single parent. The parent is not touched.
    pub fn mutate_individual<R: Rng + ?Sized>(
        &self,
        parent: &Individual,
        name: impl Into<Arc<str>>,
        ctx: &EvolutionContext<'_>,
        rng: &mut R,
    ) -> Result<Individual, MutationError> {
        let mutated = self.mutate_sequence(parent.sequence(), ctx, rng)?;
        finish_child(
            name,
            mutated,
            parent.coding_sequence().cloned(),
            parent.origin_arc(),
            ctx,
        )
    }
}

/// Redraws of a comparison set that shows too few variable positions.
const COMPARISON_RESAMPLES: usize = 8;

/// Mutability likelihoods for one directed mutation.
///
/// A sampled comparison set must show at least `count` variable positions;
/// otherwise it is redrawn up to [`COMPARISON_RESAMPLES`] times before the
/// likelihoods of the full model are used.
fn comparison_likelihoods<R: Rng + ?Sized>(
    ctx: &EvolutionContext<'_>,
    count: usize,
    comparison_size: usize,
    rng: &mut R,
) -> Result<Vec<f64>, MutationError> {
    if comparison_size == 0 || comparison_size >= ctx.reference.len() {
        return Ok(ctx.model.mutability_likelihoods());
    }
    for _ in 0..COMPARISON_RESAMPLES {
        let comparison: Vec<&Sequence> =
            ctx.reference.choose_multiple(rng, comparison_size).collect();
        let likelihoods = ConservationModel::build(comparison)?.mutability_likelihoods();
        if likelihoods.iter().filter(|&&w| w > 0.0).count() >= count {
            return Ok(likelihoods);
        }
    }
    Ok(ctx.model.mutability_likelihoods())
}

/// Wrap a mutated sequence into a scored child, keeping a coding sequence in
/// sync when a codon table is available.
pub(crate) fn finish_child(
    name: impl Into<Arc<str>>,
    mutated: Mutated,
    coding: Option<Sequence>,
    origin: Option<Arc<str>>,
    ctx: &EvolutionContext<'_>,
) -> Result<Individual, MutationError> {
    let coding = match (coding, ctx.codons) {
        (Some(coding), Some(table)) => Some(resync_coding(&coding, &mutated.edits(), table)?),
        _ => None,
    };
    let mut child = Individual::new(name, mutated.sequence)
        .with_resynced_coding(coding)
        .with_origin_opt(origin);
    child.evaluate(ctx.fitness, ctx.model)?;
    Ok(child)
}
