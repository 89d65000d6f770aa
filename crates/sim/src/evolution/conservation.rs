//! Positional conservation statistics over a reference set.
//!
//! A [`ConservationModel`] records, for every position of the reference
//! sequences, how often each symbol was observed. It is built once and is
//! read-only afterwards. Everything that needs to know "how variable is this
//! position" reads it:
//!
//! - **Consensus fitness** rewards matching the plurality symbol.
//! - **The conservation gate** forbids changing positions that never varied.
//! - **Directed mutation** samples positions by `1 − conservation score`.
//!
//! Only sequences of the most common length take part. Sequences of any
//! other length cannot be compared position by position and are dropped
//! (and reported) rather than padded or truncated.

use std::collections::HashMap;

use log::{debug, warn};
use serde::Serialize;

use crate::base::Sequence;
use crate::errors::ConservationError;

/// Symbol counts observed at one position, most frequent first.
///
/// Symbols with equal counts keep the order in which they were first seen
/// in the reference set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionStats {
    counts: Vec<(u8, usize)>,
}

impl PositionStats {
    fn observe(&mut self, symbol: u8) {
        match self.counts.iter_mut().find(|(s, _)| *s == symbol) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((symbol, 1)),
        }
    }

    fn finish(&mut self) {
        // stable: equal counts stay in first-seen order
        self.counts.sort_by(|a, b| b.1.cmp(&a.1));
    }

    /// `(symbol, count)` pairs in descending count order.
    pub fn counts(&self) -> &[(u8, usize)] {
        &self.counts
    }

    /// Number of sequences that contributed to this position.
    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, c)| c).sum()
    }

    /// Highest count at this position.
    pub fn max_count(&self) -> usize {
        self.counts.first().map_or(0, |(_, c)| *c)
    }

    /// How often `symbol` was observed here.
    pub fn count_of(&self, symbol: u8) -> usize {
        self.counts
            .iter()
            .find(|(s, _)| *s == symbol)
            .map_or(0, |(_, c)| *c)
    }

    /// The plurality symbol (first-seen on ties).
    pub fn plurality(&self) -> Option<u8> {
        self.counts.first().map(|(s, _)| *s)
    }

    /// Every symbol sharing the highest count.
    pub fn plurality_symbols(&self) -> impl Iterator<Item = u8> + '_ {
        let max = self.max_count();
        self.counts
            .iter()
            .take_while(move |(_, c)| *c == max)
            .map(|(s, _)| *s)
    }

    /// True if `symbol` is one of the highest-count symbols.
    pub fn is_plurality(&self, symbol: u8) -> bool {
        let max = self.max_count();
        max > 0 && self.count_of(symbol) == max
    }

    /// True iff exactly one symbol was ever observed at this position.
    pub fn is_conserved(&self) -> bool {
        self.counts.len() == 1
    }

    /// Share of the reference set carrying the plurality symbol.
    pub fn conservation_score(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.max_count() as f64 / total as f64
    }

    /// Distinct symbols observed here, most frequent first.
    pub fn observed_symbols(&self) -> impl Iterator<Item = u8> + '_ {
        self.counts.iter().map(|(s, _)| *s)
    }
}

/// Exportable view of one position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSummary {
    pub position: usize,
    pub symbols: String,
    pub counts: Vec<usize>,
    pub conserved: bool,
    pub conservation: f64,
}

/// Per-position conservation statistics over a reference set.
#[derive(Debug, Clone, PartialEq)]
pub struct ConservationModel {
    positions: Vec<PositionStats>,
    retained: usize,
    dropped: usize,
}

impl ConservationModel {
    /// Build the model from a reference set.
    ///
    /// The mode length is the most frequent length among the inputs; ties
    /// between lengths with the same count go to the longer length.
    /// Sequences of any other length are dropped with a warning.
    ///
    /// # Errors
    /// - `EmptyInput` if `references` yields nothing.
    /// - `InconsistentLength` if there are several sequences and every one
    ///   has a different length.
    pub fn build<'a, I>(references: I) -> Result<Self, ConservationError>
    where
        I: IntoIterator<Item = &'a Sequence>,
    {
        let references: Vec<&Sequence> = references.into_iter().collect();
        if references.is_empty() {
            return Err(ConservationError::EmptyInput);
        }

        let mut by_length: HashMap<usize, usize> = HashMap::new();
        for seq in &references {
            *by_length.entry(seq.len()).or_default() += 1;
        }
        let (length, count) = by_length
            .iter()
            .map(|(&len, &count)| (len, count))
            .max_by_key(|&(len, count)| (count, len))
            .ok_or(ConservationError::EmptyInput)?;

        if count == 1 && references.len() > 1 {
            return Err(ConservationError::InconsistentLength {
                count: references.len(),
            });
        }

        let mut positions = vec![PositionStats { counts: Vec::new() }; length];
        for seq in references.iter().filter(|s| s.len() == length) {
            for (stats, &symbol) in positions.iter_mut().zip(seq.as_bytes()) {
                stats.observe(symbol);
            }
        }
        positions.iter_mut().for_each(PositionStats::finish);

        let dropped = references.len() - count;
        if dropped > 0 {
            warn!(
                "Conservation model: dropped {dropped} of {} reference sequences not of length {length}",
                references.len()
            );
        }
        debug!("Conservation model built: length {length}, {count} sequences");

        Ok(Self {
            positions,
            retained: count,
            dropped,
        })
    }

    /// Number of positions (the canonical sequence length).
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of reference sequences that contributed.
    pub fn retained(&self) -> usize {
        self.retained
    }

    /// Number of reference sequences dropped for having another length.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn positions(&self) -> &[PositionStats] {
        &self.positions
    }

    pub fn position(&self, index: usize) -> Option<&PositionStats> {
        self.positions.get(index)
    }

    /// True iff exactly one symbol was observed at `index`.
    pub fn is_conserved(&self, index: usize) -> bool {
        self.positions.get(index).is_some_and(PositionStats::is_conserved)
    }

    /// Indices of every conserved position.
    pub fn conserved_positions(&self) -> Vec<usize> {
        self.positions
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_conserved())
            .map(|(i, _)| i)
            .collect()
    }

    /// Plurality symbol at every position (first-seen on ties).
    pub fn consensus(&self) -> Sequence {
        Sequence::from_vec(self.positions.iter().filter_map(PositionStats::plurality).collect())
    }

    /// `max_count / retained` per position.
    pub fn conservation_scores(&self) -> Vec<f64> {
        self.positions.iter().map(PositionStats::conservation_score).collect()
    }

    /// `1 − conservation score` per position; weights for directed mutation.
    pub fn mutability_likelihoods(&self) -> Vec<f64> {
        self.positions
            .iter()
            .map(|p| 1.0 - p.conservation_score())
            .collect()
    }

    /// Distinct symbols observed at `index`, most frequent first.
    pub fn observed_symbols(&self, index: usize) -> Option<Vec<u8>> {
        self.positions.get(index).map(|p| p.observed_symbols().collect())
    }

    /// Serializable per-position table.
    pub fn summary(&self) -> Vec<PositionSummary> {
        self.positions
            .iter()
            .enumerate()
            .map(|(position, p)| PositionSummary {
                position,
                symbols: p.observed_symbols().map(char::from).collect(),
                counts: p.counts().iter().map(|(_, c)| *c).collect(),
                conserved: p.is_conserved(),
                conservation: p.conservation_score(),
            })
            .collect()
    }
}
