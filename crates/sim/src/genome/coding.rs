//! Translation between coding sequences and residue sequences.
//!
//! The engine only needs two lookups: translating a coding sequence and
//! picking a codon for a residue. Both live behind [`CodonTable`] so callers
//! can plug in a non-standard code or an organism-specific usage table.

use std::collections::HashMap;
use std::fmt::Debug;

use crate::base::Sequence;
use crate::errors::TranslationError;

/// Codon-level translation capability.
pub trait CodonTable: Debug + Send + Sync {
    /// Translate a coding sequence into residues.
    ///
    /// A single trailing stop codon is stripped.
    fn translate(&self, coding: &Sequence) -> Result<Sequence, TranslationError>;

    /// Pick the codon used to encode `residue`.
    fn choose_codon(&self, residue: u8) -> Result<[u8; 3], TranslationError>;
}

const BASES: [u8; 4] = *b"TCAG";

/// Standard genetic code, indexed as `16 * first + 4 * second + third` over
/// the base order T, C, A, G.
const STANDARD_CODE: &[u8; 64] =
    b"FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG";

const STOP: u8 = b'*';

fn base_index(base: u8) -> Option<usize> {
    match base {
        b'T' => Some(0),
        b'C' => Some(1),
        b'A' => Some(2),
        b'G' => Some(3),
        _ => None,
    }
}

fn codon_index(codon: &[u8]) -> Option<usize> {
    match codon {
        [a, b, c] => Some(16 * base_index(*a)? + 4 * base_index(*b)? + base_index(*c)?),
        _ => None,
    }
}

fn codon_at(index: usize) -> [u8; 3] {
    [BASES[index / 16], BASES[(index / 4) % 4], BASES[index % 4]]
}

/// The standard nuclear genetic code with optional codon usage weights.
///
/// Without weights, `choose_codon` returns the first synonymous codon in
/// table order. With weights, the highest-weighted synonymous codon wins and
/// ties fall back to table order.
#[derive(Debug, Clone, Default)]
pub struct StandardGeneticCode {
    usage: HashMap<[u8; 3], f64>,
}

impl StandardGeneticCode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach codon usage weights keyed by codon text (e.g. `"GCT"`).
    pub fn with_usage<I, S>(mut self, usage: I) -> Result<Self, TranslationError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        for (codon, weight) in usage {
            let text = codon.as_ref().to_ascii_uppercase();
            let bytes = text.as_bytes();
            if codon_index(bytes).is_none() || !weight.is_finite() || weight < 0.0 {
                return Err(TranslationError::InvalidUsage(codon.as_ref().to_string()));
            }
            self.usage.insert([bytes[0], bytes[1], bytes[2]], weight);
        }
        Ok(self)
    }

    /// Residue (or `*` for stop) encoded by a single codon.
    pub fn residue_for(&self, codon: &[u8]) -> Result<u8, TranslationError> {
        codon_index(codon)
            .map(|i| STANDARD_CODE[i])
            .ok_or_else(|| TranslationError::UnknownCodon(String::from_utf8_lossy(codon).into_owned()))
    }
}

impl CodonTable for StandardGeneticCode {
    fn translate(&self, coding: &Sequence) -> Result<Sequence, TranslationError> {
        let bytes = coding.as_bytes();
        if bytes.len() % 3 != 0 {
            return Err(TranslationError::IncompleteCodon { length: bytes.len() });
        }

        let codons = bytes.len() / 3;
        let mut residues = Vec::with_capacity(codons);
        for (position, codon) in bytes.chunks_exact(3).enumerate() {
            let residue = self.residue_for(codon)?;
            if residue == STOP {
                if position + 1 == codons {
                    break;
                }
                return Err(TranslationError::InternalStop { position });
            }
            residues.push(residue);
        }

        if residues.is_empty() {
            return Err(TranslationError::EmptyProtein);
        }
        Ok(Sequence::from_vec(residues))
    }

    fn choose_codon(&self, residue: u8) -> Result<[u8; 3], TranslationError> {
        let mut best: Option<(usize, f64)> = None;
        for (i, _) in STANDARD_CODE.iter().enumerate().filter(|&(_, &r)| r == residue) {
            let weight = self.usage.get(&codon_at(i)).copied().unwrap_or(0.0);
            if best.is_none_or(|(_, w)| weight > w) {
                best = Some((i, weight));
            }
        }
        best.map(|(i, _)| codon_at(i))
            .ok_or(TranslationError::NoCodonFor(residue as char))
    }
}

/// Rewrite the codons of `coding` at the given residue positions so that it
/// keeps translating to the edited residue sequence.
pub fn resync_coding(
    coding: &Sequence,
    edits: &[(usize, u8)],
    table: &dyn CodonTable,
) -> Result<Sequence, TranslationError> {
    let mut bytes = coding.as_bytes().to_vec();
    for &(position, residue) in edits {
        let codon = table.choose_codon(residue)?;
        let start = position * 3;
        let slot = bytes
            .get_mut(start..start + 3)
            .ok_or(TranslationError::IncompleteCodon { length: coding.len() })?;
        slot.copy_from_slice(&codon);
    }
    Ok(Sequence::from_vec(bytes))
}
