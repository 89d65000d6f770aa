//! Base types for sequence representation.
//!
//! This module provides the foundational types for representing residue
//! alphabets, immutable sequences, and clamped fitness values.

mod alphabet;
mod fitness;
mod sequence;

pub use alphabet::{Alphabet, AlphabetKind};
pub use fitness::FitnessValue;
pub use sequence::Sequence;
