//! Storage module for persisting simulation output.
//!
//! Populations are captured as serializable snapshots and written as JSON,
//! one file per recorded generation.

mod recorder;
mod snapshot;

pub use recorder::{Recorder, RecordingStrategy};
pub use snapshot::{IndividualSnapshot, PopulationSnapshot};
