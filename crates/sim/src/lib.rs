//! # Simulation Crate
//!
//! The `sim` crate provides the directed-evolution engine: a positional
//! conservation model built from reference sequences, the fitness functions
//! built on it, mutation, reproduction and selection operators, and the
//! generation loop over flat or lineage-tree populations.

pub mod base;
pub mod errors;
pub mod evolution;
pub mod genome;
pub mod prelude;
pub mod simulation;
pub mod storage;

pub use base::{Alphabet, Sequence};
