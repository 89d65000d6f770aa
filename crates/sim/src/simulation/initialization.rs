//! Sequence record ingestion.
//!
//! Records come from FASTA (header = first word after `>`, sequence may span
//! several lines) or from a JSON array of objects with `name`, `sequence`
//! and optional `coding_sequence` and `origin` fields. Parsing only checks
//! structure; [`create_individuals`] validates symbols and coding sequences.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::base::{Alphabet, Sequence};
pub use crate::errors::InitializationError;
use crate::genome::{CodonTable, Individual};

/// One named input sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceRecord {
    pub name: String,
    pub sequence: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coding_sequence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl SequenceRecord {
    pub fn new(name: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sequence: sequence.into(),
            coding_sequence: None,
            origin: None,
        }
    }
}

/// Parse FASTA text.
pub fn parse_fasta(text: &str) -> Result<Vec<SequenceRecord>, InitializationError> {
    let mut records = Vec::new();
    let mut current_name: Option<String> = None;
    let mut current_seq = String::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix('>') {
            if let Some(name) = current_name.take() {
                if current_seq.is_empty() {
                    return Err(InitializationError::Parse(format!(
                        "FASTA record '{name}' has no sequence"
                    )));
                }
                records.push(SequenceRecord::new(name, std::mem::take(&mut current_seq)));
            }
            let name = header
                .split_whitespace()
                .next()
                .ok_or_else(|| InitializationError::Parse("Empty FASTA header".to_string()))?;
            current_name = Some(name.to_string());
        } else if current_name.is_some() {
            current_seq.push_str(line);
        } else {
            return Err(InitializationError::Parse(
                "Sequence data before the first FASTA header".to_string(),
            ));
        }
    }

    if let Some(name) = current_name {
        if current_seq.is_empty() {
            return Err(InitializationError::Parse(format!(
                "FASTA record '{name}' has no sequence"
            )));
        }
        records.push(SequenceRecord::new(name, current_seq));
    }

    if records.is_empty() {
        return Err(InitializationError::Parse(
            "No sequences found in FASTA input".to_string(),
        ));
    }
    Ok(records)
}

/// Parse a JSON array of records.
pub fn parse_json(text: &str) -> Result<Vec<SequenceRecord>, InitializationError> {
    let records: Vec<SequenceRecord> = serde_json::from_str(text)?;
    if records.is_empty() {
        return Err(InitializationError::Parse(
            "No sequences found in JSON input".to_string(),
        ));
    }
    Ok(records)
}

/// Load records from a file, choosing the parser by extension.
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<SequenceRecord>, InitializationError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "fa" | "fasta" | "faa" | "fna" => parse_fasta(&fs::read_to_string(path)?),
        "json" => parse_json(&fs::read_to_string(path)?),
        _ => Err(InitializationError::UnsupportedFormat(
            path.display().to_string(),
        )),
    }
}

/// Write records as a pretty JSON array.
pub fn write_json(
    path: impl AsRef<Path>,
    records: &[SequenceRecord],
) -> Result<(), InitializationError> {
    fs::write(path, serde_json::to_string_pretty(records)?)?;
    Ok(())
}

/// Records whose origin equals `origin`.
pub fn filter_by_origin(records: Vec<SequenceRecord>, origin: &str) -> Vec<SequenceRecord> {
    records
        .into_iter()
        .filter(|record| record.origin.as_deref() == Some(origin))
        .collect()
}

/// Turn records into individuals.
///
/// Every residue must belong to `alphabet`. A coding sequence is checked
/// against the residues with `codons`; a record with a coding sequence but
/// no codon table is an error.
pub fn create_individuals(
    records: &[SequenceRecord],
    alphabet: &Alphabet,
    codons: Option<&dyn CodonTable>,
) -> Result<Vec<Individual>, InitializationError> {
    let dna = Alphabet::dna();
    records
        .iter()
        .map(|record| {
            let sequence = Sequence::parse(&record.sequence, alphabet).map_err(|source| {
                InitializationError::Sequence {
                    name: record.name.clone(),
                    source,
                }
            })?;
            let mut individual = Individual::new(record.name.as_str(), sequence);
            if let Some(origin) = &record.origin {
                individual = individual.with_origin(origin.as_str());
            }
            if let Some(coding) = &record.coding_sequence {
                let table = codons
                    .ok_or_else(|| InitializationError::MissingCodonTable(record.name.clone()))?;
                let coding = Sequence::parse(coding, &dna).map_err(|source| {
                    InitializationError::Sequence {
                        name: record.name.clone(),
                        source,
                    }
                })?;
                individual = individual
                    .with_coding_sequence(coding, table)
                    .map_err(|source| InitializationError::Translation {
                        name: record.name.clone(),
                        source,
                    })?;
            }
            Ok(individual)
        })
        .collect()
}
