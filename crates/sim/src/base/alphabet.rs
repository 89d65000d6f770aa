use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::SequenceError;

/// The twenty standard amino acids in one-letter code.
pub const AMINO_ACIDS: &str = "ACDEFGHIKLMNPQRSTVWY";

/// The four DNA bases.
pub const NUCLEOTIDES: &str = "ACGT";

/// Shared, immutable alphabet.
///
/// Symbols are stored as uppercase ASCII bytes. The order determines the index
/// mapping. Cloning is cheap; one instance is shared by the whole run.
#[derive(Clone)]
pub struct Alphabet {
    symbols: Arc<[u8]>,
    symbol_to_index: Arc<HashMap<u8, usize>>,
}

impl Alphabet {
    /// Create a new alphabet from a string of symbols.
    ///
    /// Letters are uppercased and repeated symbols keep their first position.
    /// Whitespace and control characters are rejected.
    pub fn new(symbols: &str) -> Result<Self, SequenceError> {
        let mut ordered = Vec::with_capacity(symbols.len());
        let mut symbol_to_index = HashMap::new();

        for c in symbols.chars() {
            if !c.is_ascii_graphic() {
                return Err(SequenceError::InvalidSymbol(c));
            }
            let byte = c.to_ascii_uppercase() as u8;
            if let std::collections::hash_map::Entry::Vacant(slot) = symbol_to_index.entry(byte) {
                slot.insert(ordered.len());
                ordered.push(byte);
            }
        }

        if ordered.is_empty() {
            return Err(SequenceError::Empty);
        }

        Ok(Self {
            symbols: ordered.into(),
            symbol_to_index: Arc::new(symbol_to_index),
        })
    }

    /// Standard amino-acid alphabet (20 residues).
    pub fn amino_acids() -> Self {
        Self::from_static(AMINO_ACIDS)
    }

    /// Standard DNA alphabet (A, C, G, T).
    pub fn dna() -> Self {
        Self::from_static(NUCLEOTIDES)
    }

    fn from_static(symbols: &'static str) -> Self {
        let bytes: Vec<u8> = symbols.bytes().collect();
        let symbol_to_index = bytes.iter().enumerate().map(|(i, &b)| (b, i)).collect();
        Self {
            symbols: bytes.into(),
            symbol_to_index: Arc::new(symbol_to_index),
        }
    }

    /// Get the number of symbols in this alphabet
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Check if empty (never true for a constructed alphabet)
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Get all symbols as a byte slice
    #[inline]
    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }

    /// Check if a symbol byte is in the alphabet
    #[inline]
    pub fn contains(&self, symbol: u8) -> bool {
        self.symbol_to_index.contains_key(&symbol)
    }

    /// Position of `symbol` in the alphabet's ordering.
    #[inline]
    pub fn index_of(&self, symbol: u8) -> Option<usize> {
        self.symbol_to_index.get(&symbol).copied()
    }

    /// Map a character to its canonical symbol byte (case-insensitive).
    pub fn normalize(&self, c: char) -> Result<u8, SequenceError> {
        if !c.is_ascii() {
            return Err(SequenceError::InvalidSymbol(c));
        }
        let byte = c.to_ascii_uppercase() as u8;
        if self.contains(byte) {
            Ok(byte)
        } else {
            Err(SequenceError::InvalidSymbol(c))
        }
    }

    /// Draw a symbol uniformly from the alphabet excluding `current`.
    ///
    /// Returns `None` when no alternative exists. If `current` is not part of
    /// the alphabet every symbol is a valid replacement.
    pub fn choose_other<R: Rng + ?Sized>(&self, current: u8, rng: &mut R) -> Option<u8> {
        match self.index_of(current) {
            Some(skip) => {
                let alternatives = self.len() - 1;
                if alternatives == 0 {
                    return None;
                }
                let mut idx = rng.random_range(0..alternatives);
                if idx >= skip {
                    idx += 1;
                }
                Some(self.symbols[idx])
            }
            None if self.is_empty() => None,
            None => Some(self.symbols[rng.random_range(0..self.len())]),
        }
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::amino_acids()
    }
}

impl PartialEq for Alphabet {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.symbols, &other.symbols) || self.symbols == other.symbols
    }
}

impl Eq for Alphabet {}

impl fmt::Debug for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Alphabet").field(&self.to_string()).finish()
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in self.symbols.iter() {
            write!(f, "{}", b as char)?;
        }
        Ok(())
    }
}

/// Serializable selector for the alphabet a run operates over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlphabetKind {
    /// Twenty standard amino acids.
    #[default]
    AminoAcid,
    /// DNA bases A, C, G, T.
    Nucleotide,
    /// Any other set of single-character symbols.
    Custom { symbols: String },
}

impl AlphabetKind {
    /// Materialise the alphabet.
    pub fn build(&self) -> Result<Alphabet, SequenceError> {
        match self {
            Self::AminoAcid => Ok(Alphabet::amino_acids()),
            Self::Nucleotide => Ok(Alphabet::dna()),
            Self::Custom { symbols } => Alphabet::new(symbols),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_alphabet_amino_acids() {
        let alphabet = Alphabet::amino_acids();
        assert_eq!(alphabet.len(), 20);
        assert!(alphabet.contains(b'W'));
        assert!(!alphabet.contains(b'B'));
    }

    #[test]
    fn test_alphabet_dna() {
        let alphabet = Alphabet::dna();
        assert_eq!(alphabet.symbols(), b"ACGT");
        assert_eq!(alphabet.index_of(b'G'), Some(2));
        assert_eq!(alphabet.index_of(b'N'), None);
    }

    #[test]
    fn test_alphabet_new_dedups_and_uppercases() {
        let alphabet = Alphabet::new("acAc").unwrap();
        assert_eq!(alphabet.symbols(), b"AC");
    }

    #[test]
    fn test_alphabet_new_rejects_empty_and_whitespace() {
        assert_eq!(Alphabet::new(""), Err(SequenceError::Empty));
        assert_eq!(Alphabet::new("A C"), Err(SequenceError::InvalidSymbol(' ')));
    }

    #[test]
    fn test_normalize_is_case_insensitive() {
        let alphabet = Alphabet::dna();
        assert_eq!(alphabet.normalize('a'), Ok(b'A'));
        assert_eq!(alphabet.normalize('T'), Ok(b'T'));
        assert_eq!(alphabet.normalize('x'), Err(SequenceError::InvalidSymbol('x')));
    }

    #[test]
    fn test_choose_other_never_returns_current() {
        let alphabet = Alphabet::dna();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let s = alphabet.choose_other(b'C', &mut rng).unwrap();
            assert_ne!(s, b'C');
            assert!(alphabet.contains(s));
        }
    }

    #[test]
    fn test_choose_other_covers_all_alternatives() {
        let alphabet = Alphabet::dna();
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(alphabet.choose_other(b'A', &mut rng).unwrap());
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_choose_other_single_symbol() {
        let alphabet = Alphabet::new("A").unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        assert_eq!(alphabet.choose_other(b'A', &mut rng), None);
        assert_eq!(alphabet.choose_other(b'C', &mut rng), Some(b'A'));
    }

    #[test]
    fn test_alphabet_kind_serde() {
        let kind: AlphabetKind =
            serde_json::from_str(r#"{"kind":"custom","symbols":"AC"}"#).unwrap();
        assert_eq!(kind.build().unwrap().symbols(), b"AC");

        let json = serde_json::to_string(&AlphabetKind::Nucleotide).unwrap();
        assert_eq!(json, r#"{"kind":"nucleotide"}"#);
    }
}
