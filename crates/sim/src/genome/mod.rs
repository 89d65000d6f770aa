//! Genome structures: individuals, their lineage trees, and the optional
//! coding-sequence translation capability.

pub mod coding;
mod individual;
pub mod lineage;

pub use coding::{CodonTable, StandardGeneticCode};
pub use individual::Individual;
pub use lineage::NodePath;
