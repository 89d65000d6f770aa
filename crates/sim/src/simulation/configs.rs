//! Simulation configuration.
//!
//! A [`Configuration`] fully describes a run apart from its input sequences
//! and injected scorers, and can be saved next to the output to reproduce it.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::base::AlphabetKind;
use crate::errors::ConfigError;
use crate::evolution::{CrossoverPolicy, MutationStrategy, SurvivorSelection};

/// The master configuration struct.
/// Can be deserialized from a file to fully reproduce a simulation setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Configuration {
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub evolution: EvolutionConfig,
    #[serde(default)]
    pub initialization: InitializationConfig,
}

/// Lineage representation used for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    /// One flat list of live individuals per generation.
    #[default]
    Flat,
    /// A forest of lineage trees grown by hill climbing.
    Tree,
}

/// High-level run parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Total number of generations to simulate
    pub generations: usize,
    /// Survivors kept at the end of each generation
    pub max_population_size: usize,
    /// Unique children produced per generation
    pub offspring_per_generation: usize,
    /// Size of the fitness-proportionate parent pool (flat topology).
    /// Defaults to the current population size.
    #[serde(default)]
    pub parent_pool_size: Option<usize>,
    /// Consecutive duplicate children tolerated before a generation stalls
    #[serde(default = "default_max_child_attempts")]
    pub max_child_attempts: usize,
    /// Optional RNG seed for reproducibility
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub topology: Topology,
}

fn default_max_child_attempts() -> usize {
    100
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            generations: 100,
            max_population_size: 50,
            offspring_per_generation: 20,
            parent_pool_size: None,
            max_child_attempts: default_max_child_attempts(),
            seed: None,
            topology: Topology::Flat,
        }
    }
}

/// Which fitness function the builder installs when none is injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FitnessMode {
    /// Fraction of positions matching a plurality symbol.
    #[default]
    Consensus,
    /// Conservation gate times the external validity and aggregation scores.
    ConservationGated,
}

/// Grouped evolutionary parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EvolutionConfig {
    pub alphabet: AlphabetKind,
    pub mutation: MutationStrategy,
    pub crossover: CrossoverPolicy,
    pub survivor_selection: SurvivorSelection,
    pub fitness: FitnessMode,
}

/// How seed individuals are prepared before the first generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct InitializationConfig {
    /// Keep only seeds whose origin tag equals this value.
    pub origin: Option<String>,
    /// Drop seeds whose length differs from the conservation model instead
    /// of failing on them.
    pub drop_mismatched_seeds: bool,
}

impl Configuration {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    /// Check ranges and cross-field consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let exec = &self.execution;
        if exec.max_population_size == 0 {
            return Err(ConfigError::Invalid(
                "max_population_size must be at least 1".into(),
            ));
        }
        if exec.offspring_per_generation == 0 {
            return Err(ConfigError::Invalid(
                "offspring_per_generation must be at least 1".into(),
            ));
        }
        if exec.parent_pool_size == Some(0) {
            return Err(ConfigError::Invalid(
                "parent_pool_size must be at least 1 when set".into(),
            ));
        }
        if exec.max_child_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_child_attempts must be at least 1".into(),
            ));
        }
        if let MutationStrategy::Directed { count: 0, .. } = self.evolution.mutation {
            return Err(ConfigError::Invalid(
                "directed mutation count must be at least 1".into(),
            ));
        }
        if let MutationStrategy::Directed {
            comparison_size: 1,
            ..
        } = self.evolution.mutation
        {
            return Err(ConfigError::Invalid(
                "comparison_size must be 0 (whole reference) or at least 2".into(),
            ));
        }
        if let SurvivorSelection::Tournament { k: 0 } = self.evolution.survivor_selection {
            return Err(ConfigError::Invalid("tournament size must be at least 1".into()));
        }
        let alphabet = self
            .evolution
            .alphabet
            .build()
            .map_err(|e| ConfigError::Invalid(format!("alphabet: {e}")))?;
        if alphabet.len() < 2 {
            return Err(ConfigError::Invalid(format!(
                "alphabet needs at least two symbols, has {}",
                alphabet.len()
            )));
        }
        Ok(())
    }
}
