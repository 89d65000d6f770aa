//! Simulation engine and population management.
//!
//! - `Simulation`: the engine that runs generations (evaluate, reproduce,
//!   select) over a `Population`.
//! - `Population`: the live individuals, flat or as lineage trees.
//! - `SimulationBuilder`: fluent builder with validation and defaults.
//! - `Configuration`: serializable run parameters.
//! - `initialization`: reading sequence records and turning them into
//!   individuals.

pub mod builder;
pub mod configs;
pub mod engine;
pub mod initialization;
pub mod population;

pub use builder::SimulationBuilder;
pub use configs::{
    Configuration, EvolutionConfig, ExecutionConfig, FitnessMode, InitializationConfig, Topology,
};
pub use engine::{EngineState, Simulation};
pub use initialization::{
    SequenceRecord, create_individuals, filter_by_origin, load_records, parse_fasta, parse_json,
    write_json,
};
pub use population::{Lineage, Population, deduplicate};
