//! Writes population snapshots to an output directory as JSON.
//!
//! One file per recorded generation, named `generation_{n:06}.json`. Files
//! already written are never touched again, so the output of earlier
//! generations stays valid when a later one fails.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::StorageError;
use crate::simulation::{Configuration, Population};
use crate::storage::PopulationSnapshot;

/// Recording strategy for when to persist simulation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingStrategy {
    /// Record every N generations.
    EveryN(usize),

    /// Record at specific generations.
    Specific(Vec<usize>),

    /// Record all generations.
    All,

    /// No recording.
    None,
}

impl RecordingStrategy {
    /// Check if generation should be recorded
    pub fn should_record(&self, generation: usize) -> bool {
        match self {
            Self::EveryN(n) => generation.is_multiple_of(*n),
            Self::Specific(gens) => gens.contains(&generation),
            Self::All => true,
            Self::None => false,
        }
    }
}

/// Snapshot writer bound to one output directory.
#[derive(Debug)]
pub struct Recorder {
    dir: PathBuf,
    strategy: RecordingStrategy,
    last_written: Option<usize>,
}

impl Recorder {
    /// Create the output directory if needed.
    pub fn new(dir: impl AsRef<Path>, strategy: RecordingStrategy) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            strategy,
            last_written: None,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn strategy(&self) -> &RecordingStrategy {
        &self.strategy
    }

    pub fn path_for(&self, generation: usize) -> PathBuf {
        self.dir.join(format!("generation_{generation:06}.json"))
    }

    /// Write the run configuration next to the snapshots.
    pub fn write_config(&self, config: &Configuration) -> Result<PathBuf, StorageError> {
        let path = self.dir.join("config.json");
        write_pretty(&path, config)?;
        Ok(path)
    }

    /// Write a snapshot if the strategy selects this generation.
    pub fn record(&mut self, population: &Population) -> Result<Option<PathBuf>, StorageError> {
        if !self.strategy.should_record(population.generation()) {
            return Ok(None);
        }
        self.write(population).map(Some)
    }

    /// Write the final snapshot unless this generation is already on disk.
    pub fn record_final(&mut self, population: &Population) -> Result<PathBuf, StorageError> {
        let generation = population.generation();
        if self.last_written == Some(generation) {
            return Ok(self.path_for(generation));
        }
        self.write(population)
    }

    fn write(&mut self, population: &Population) -> Result<PathBuf, StorageError> {
        let generation = population.generation();
        let path = self.path_for(generation);
        write_pretty(&path, &PopulationSnapshot::capture(population))?;
        debug!("Recorded generation {generation} to {}", path.display());
        self.last_written = Some(generation);
        Ok(path)
    }

    /// Read a snapshot written by [`Recorder`].
    pub fn read(path: impl AsRef<Path>) -> Result<PopulationSnapshot, StorageError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

fn write_pretty<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
