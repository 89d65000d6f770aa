use std::fmt;
use std::sync::Arc;

use super::Alphabet;
use crate::errors::SequenceError;

/// Immutable, shareable residue sequence.
///
/// `Sequence` holds uppercase symbol bytes in a reference-counted `Arc<[u8]>`.
/// Cloning is cheap and never copies the data. Every edit produces a new
/// `Sequence`, so a value published on one individual can never change under
/// another holder.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sequence(Arc<[u8]>);

impl Sequence {
    /// Parse a textual representation (e.g. "MKV") against an alphabet.
    ///
    /// Case-insensitive. Characters outside the alphabet produce
    /// `SequenceError::InvalidSymbol`; an empty string is rejected.
    ///
    /// ```rust
    /// # use easme_sim::base::{Alphabet, Sequence};
    /// let seq = Sequence::parse("acgt", &Alphabet::dna()).unwrap();
    /// assert_eq!(seq.to_string(), "ACGT");
    /// ```
    pub fn parse(text: &str, alphabet: &Alphabet) -> Result<Self, SequenceError> {
        if text.is_empty() {
            return Err(SequenceError::Empty);
        }
        let data: Result<Vec<u8>, _> = text.chars().map(|c| alphabet.normalize(c)).collect();
        Ok(Self(data?.into()))
    }

    /// Wrap bytes already known to be canonical symbols.
    pub(crate) fn from_vec(data: Vec<u8>) -> Self {
        Self(data.into())
    }

    /// Return the length of the sequence in residues.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return `true` if the sequence contains no residues.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Return the symbol at `index`, or `None` if out of range.
    #[inline]
    pub fn get(&self, index: usize) -> Option<u8> {
        self.0.get(index).copied()
    }

    /// Borrow the underlying symbol bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Produce a new sequence with the given `(position, symbol)` replacements.
    ///
    /// The receiver is left untouched.
    pub fn with_substitutions(&self, edits: &[(usize, u8)]) -> Result<Self, SequenceError> {
        let mut data = self.0.to_vec();
        for &(index, symbol) in edits {
            let len = data.len();
            let slot = data
                .get_mut(index)
                .ok_or(SequenceError::OutOfBounds { index, len })?;
            *slot = symbol;
        }
        Ok(Self(data.into()))
    }

    /// Number of positions at which two equal-length sequences differ.
    ///
    /// Returns `None` when the lengths differ.
    pub fn hamming_distance(&self, other: &Sequence) -> Option<usize> {
        if self.len() != other.len() {
            return None;
        }
        Some(
            self.0
                .iter()
                .zip(other.0.iter())
                .filter(|(a, b)| a != b)
                .count(),
        )
    }

    /// Return the current strong reference count to the shared data.
    pub fn strong_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in self.0.iter() {
            write!(f, "{}", b as char)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sequence(\"{self}\")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(text: &str) -> Sequence {
        Sequence::parse(text, &Alphabet::amino_acids()).unwrap()
    }

    #[test]
    fn test_parse_valid() {
        let s = seq("MKVL");
        assert_eq!(s.len(), 4);
        assert_eq!(s.get(0), Some(b'M'));
        assert_eq!(s.get(4), None);
    }

    #[test]
    fn test_parse_lowercase() {
        assert_eq!(seq("mkvl"), seq("MKVL"));
    }

    #[test]
    fn test_parse_invalid() {
        let err = Sequence::parse("ACGX", &Alphabet::dna()).unwrap_err();
        assert_eq!(err, SequenceError::InvalidSymbol('X'));
    }

    #[test]
    fn test_parse_empty() {
        let err = Sequence::parse("", &Alphabet::dna()).unwrap_err();
        assert_eq!(err, SequenceError::Empty);
    }

    #[test]
    fn test_with_substitutions_leaves_original() {
        let original = seq("AAAA");
        let edited = original.with_substitutions(&[(1, b'C'), (3, b'D')]).unwrap();
        assert_eq!(original.to_string(), "AAAA");
        assert_eq!(edited.to_string(), "ACAD");
    }

    #[test]
    fn test_with_substitutions_out_of_bounds() {
        let err = seq("AAAA").with_substitutions(&[(4, b'C')]).unwrap_err();
        assert_eq!(err, SequenceError::OutOfBounds { index: 4, len: 4 });
    }

    #[test]
    fn test_hamming_distance() {
        assert_eq!(seq("ACDE").hamming_distance(&seq("ACDF")), Some(1));
        assert_eq!(seq("ACDE").hamming_distance(&seq("ACDE")), Some(0));
        assert_eq!(seq("ACDE").hamming_distance(&seq("ACD")), None);
    }

    #[test]
    fn test_clone_is_cheap() {
        let a = seq("ACDEFGHIK");
        let b = a.clone();
        assert_eq!(a.strong_count(), 2);
        assert_eq!(a, b);
    }

    #[test]
    fn test_debug_shows_symbols() {
        assert_eq!(format!("{:?}", seq("MK")), "Sequence(\"MK\")");
    }
}
