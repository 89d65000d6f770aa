//! Error types for every component of the engine.
//!
//! Each component reports its own enum so callers can match on the precise
//! precondition that failed. The generation loop wraps component errors in
//! [`SimulationError::Generation`] together with the generation number and the
//! lifecycle step that was running.

use crate::simulation::EngineState;
use thiserror::Error;

/// Error type for failures when constructing or manipulating a `Sequence`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    /// A character was not part of the alphabet.
    #[error("Invalid symbol in sequence: '{0}'")]
    InvalidSymbol(char),

    /// The sequence was empty when a non-empty sequence was required.
    #[error("Empty sequence not allowed")]
    Empty,

    /// An index was outside the valid range for a sequence.
    #[error("Index {index} out of bounds (len = {len})")]
    OutOfBounds { index: usize, len: usize },
}

/// Errors raised while building a conservation model from a reference set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConservationError {
    /// The reference set contained no sequences.
    #[error("Cannot build a conservation model from an empty reference set")]
    EmptyInput,

    /// Every reference sequence has a different length, so no position-wise
    /// comparison is possible.
    #[error("No usable majority length: all {count} reference sequences have distinct lengths")]
    InconsistentLength { count: usize },
}

/// Errors that can occur in fitness calculations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitnessError {
    /// The scored sequence is not the same length as the conservation model.
    #[error("Sequence length {actual} does not match conservation model length {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Invalid parameter value
    #[error("Invalid fitness parameter: {0}")]
    InvalidParameter(String),
}

/// Errors that can occur during mutation operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MutationError {
    /// More distinct positions were requested than the sequence can offer.
    #[error("Cannot mutate {requested} distinct positions: only {available} are eligible")]
    InsufficientDiversity { requested: usize, available: usize },

    /// Point mutation needs at least one alternative symbol.
    #[error("Alphabet needs at least two symbols to mutate (has {0})")]
    AlphabetTooSmall(usize),

    /// The likelihood vector does not line up with the sequence.
    #[error("Likelihood vector has {likelihoods} entries for a sequence of length {sequence}")]
    LikelihoodLength { likelihoods: usize, sequence: usize },

    /// A likelihood was negative, NaN or infinite.
    #[error("Invalid mutation likelihood: {0}")]
    InvalidLikelihood(f64),

    /// Scoring the mutated copy failed.
    #[error(transparent)]
    Fitness(#[from] FitnessError),

    /// Building the comparison model for directed mutation failed.
    #[error(transparent)]
    Conservation(#[from] ConservationError),

    /// An edit fell outside the sequence.
    #[error(transparent)]
    Sequence(#[from] SequenceError),

    /// The child's coding sequence could not be kept in sync.
    #[error("Coding sequence: {0}")]
    Translation(#[from] TranslationError),
}

/// Errors that can occur during reproduction (crossover followed by mutation).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecombinationError {
    /// Parents have different lengths
    #[error("Parent length mismatch: {len1} vs {len2}")]
    LengthMismatch { len1: usize, len2: usize },

    /// The mutation pass after crossover failed.
    #[error(transparent)]
    Mutation(#[from] MutationError),
}

/// Errors raised by selection strategies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// All fitness values are zero, so the roulette wheel is undefined.
    #[error("Fitness-proportionate selection is undefined: all {population} individuals have zero fitness")]
    DegenerateFitness { population: usize },

    /// Selection was asked to draw from an empty population.
    #[error("Cannot select from an empty population")]
    EmptyPopulation,

    /// Tournament size must be at least one.
    #[error("Invalid tournament size: {0}")]
    InvalidTournamentSize(usize),
}

/// Errors from the codon table capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslationError {
    /// Coding sequence length is not a multiple of three.
    #[error("Coding sequence length {length} is not a multiple of 3")]
    IncompleteCodon { length: usize },

    /// A codon contained a base outside A, C, G, T.
    #[error("Unknown codon: {0}")]
    UnknownCodon(String),

    /// A stop codon appeared before the end of the coding sequence.
    #[error("Internal stop codon at codon {position}")]
    InternalStop { position: usize },

    /// The coding sequence encodes no residues.
    #[error("Coding sequence translates to an empty protein")]
    EmptyProtein,

    /// No codon encodes the requested residue.
    #[error("No codon encodes residue '{0}'")]
    NoCodonFor(char),

    /// Codon usage weights contained a malformed codon.
    #[error("Invalid codon usage entry: {0}")]
    InvalidUsage(String),

    /// The translated coding sequence disagrees with the residue sequence.
    #[error("Coding sequence translates to {translated}, expected {expected}")]
    Mismatch { expected: String, translated: String },
}

/// Error types for sequence record ingestion.
#[derive(Debug, Error)]
pub enum InitializationError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// A record held a symbol outside the alphabet.
    #[error("Record '{name}': {source}")]
    Sequence {
        name: String,
        #[source]
        source: SequenceError,
    },

    /// A record's coding sequence could not be reconciled with its residues.
    #[error("Record '{name}': {source}")]
    Translation {
        name: String,
        #[source]
        source: TranslationError,
    },

    /// A record carries a coding sequence but no codon table was supplied.
    #[error("Record '{0}' has a coding sequence but no codon table was supplied")]
    MissingCodonTable(String),

    /// Unsupported input file format
    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),
}

/// Errors while loading, saving or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A value is out of range or inconsistent with another.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors while writing population snapshots.
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur during simulation building.
#[derive(Debug, Error)]
pub enum BuilderError {
    /// A required parameter is missing
    #[error("Missing required parameter: {0}")]
    MissingRequired(&'static str),

    /// An invalid parameter value was provided
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// No seed individuals survived filtering.
    #[error("No seed individuals remain after filtering")]
    EmptyPopulation,

    /// The configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The reference set could not be turned into a conservation model.
    #[error("Conservation model: {0}")]
    Conservation(#[from] ConservationError),

    /// Initial fitness evaluation failed.
    #[error("Initial fitness evaluation: {0}")]
    Fitness(#[from] FitnessError),
}

/// Error raised by one component while a generation was running.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StepError {
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Recombination(#[from] RecombinationError),
    #[error(transparent)]
    Mutation(#[from] MutationError),
    #[error(transparent)]
    Fitness(#[from] FitnessError),
}

/// Errors that abort a simulation run.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// A component failed during a generation.
    #[error("Generation {generation} failed while {step}: {source}")]
    Generation {
        generation: usize,
        step: EngineState,
        #[source]
        source: StepError,
    },

    /// Could not produce enough unique children within the retry budget.
    #[error(
        "Generation {generation} stalled: produced {produced} of {required} unique children, \
         {attempts} consecutive duplicates"
    )]
    ChildGenerationStalled {
        generation: usize,
        produced: usize,
        required: usize,
        attempts: usize,
    },

    /// Writing a snapshot failed.
    #[error("Storage: {0}")]
    Storage(#[from] StorageError),
}

impl SimulationError {
    /// Wrap a component error with the generation and step that raised it.
    pub fn at(generation: usize, step: EngineState, source: impl Into<StepError>) -> Self {
        Self::Generation {
            generation,
            step,
            source: source.into(),
        }
    }
}
