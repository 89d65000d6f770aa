//! Reproduction: crossover of two parents followed by one mutation pass.
//!
//! The crossover policy is fixed per run and only draws from the supplied
//! random source, so a child is reproducible from the seed. Reproduction
//! makes no uniqueness promise; the population manager rejects duplicates.

use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::base::Sequence;
pub use crate::errors::RecombinationError;
use crate::evolution::mutation::finish_child;
use crate::evolution::{EvolutionContext, MutationStrategy};
use crate::genome::Individual;

/// How two parent sequences are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverPolicy {
    /// Each position independently from either parent with probability 1/2.
    #[default]
    Uniform,
    /// Prefix from parent A, suffix from parent B, cut at a uniform point.
    SinglePoint,
    /// Copy parent A; variation comes from mutation alone.
    None,
}

/// Result of crossover before mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Offspring {
    pub sequence: Sequence,
    /// Present only when both parents carry aligned coding sequences.
    pub coding: Option<Sequence>,
}

/// Crossover followed by mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReproductionModel {
    pub crossover: CrossoverPolicy,
    pub mutation: MutationStrategy,
}

/// Coding bytes usable for codon-level crossover of a `len`-residue sequence.
fn aligned_coding(parent: &Individual, len: usize) -> Option<&[u8]> {
    parent
        .coding_sequence()
        .map(Sequence::as_bytes)
        .filter(|bytes| bytes.len() >= len * 3)
}

impl ReproductionModel {
    pub fn new(crossover: CrossoverPolicy, mutation: MutationStrategy) -> Self {
        Self {
            crossover,
            mutation,
        }
    }

    /// Combine two equal-length parents. Codons travel with their residue.
    pub fn crossover<R: Rng + ?Sized>(
        &self,
        a: &Individual,
        b: &Individual,
        rng: &mut R,
    ) -> Result<Offspring, RecombinationError> {
        let len = a.sequence().len();
        if len != b.sequence().len() {
            return Err(RecombinationError::LengthMismatch {
                len1: len,
                len2: b.sequence().len(),
            });
        }

        let codings = match (aligned_coding(a, len), aligned_coding(b, len)) {
            (Some(ca), Some(cb)) if ca.len() == cb.len() => Some((ca, cb)),
            _ => None,
        };

        // from_b[i] is true when position i is inherited from parent B
        let from_b: Vec<bool> = match self.crossover {
            CrossoverPolicy::None => vec![false; len],
            CrossoverPolicy::Uniform => (0..len).map(|_| rng.random_bool(0.5)).collect(),
            CrossoverPolicy::SinglePoint => {
                if len < 2 {
                    vec![false; len]
                } else {
                    let point = rng.random_range(1..len);
                    (0..len).map(|i| i >= point).collect()
                }
            }
        };

        let (sa, sb) = (a.sequence().as_bytes(), b.sequence().as_bytes());
        let residues: Vec<u8> = from_b
            .iter()
            .enumerate()
            .map(|(i, &take_b)| if take_b { sb[i] } else { sa[i] })
            .collect();

        let coding = codings.map(|(ca, cb)| {
            let mut bytes = ca.to_vec();
            for (i, _) in from_b.iter().enumerate().filter(|(_, take_b)| **take_b) {
                bytes[i * 3..i * 3 + 3].copy_from_slice(&cb[i * 3..i * 3 + 3]);
            }
            Sequence::from_vec(bytes)
        });

        Ok(Offspring {
            sequence: Sequence::from_vec(residues),
            coding,
        })
    }

    /// Produce a scored child of `a` and `b`. The origin tag is taken from `a`.
    pub fn reproduce<R: Rng + ?Sized>(
        &self,
        a: &Individual,
        b: &Individual,
        name: impl Into<Arc<str>>,
        ctx: &EvolutionContext<'_>,
        rng: &mut R,
    ) -> Result<Individual, RecombinationError> {
        let offspring = self.crossover(a, b, rng)?;
        let mutated = self.mutation.mutate_sequence(&offspring.sequence, ctx, rng)?;
        Ok(finish_child(
            name,
            mutated,
            offspring.coding,
            a.origin_arc(),
            ctx,
        )?)
    }
}
