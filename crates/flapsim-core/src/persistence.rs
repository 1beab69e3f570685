//! Save/Load functionality for training runs
//!
//! Uses bincode for a compact binary record of the run: the config it was
//! started with and the summary of every finished generation. Resuming from
//! a record rebuilds the collision masks from the config, so they are never
//! stored.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use flapsim_logic::config::{validate_config, ConfigError, SimConfig};

use crate::engine::GenerationSummary;

/// Version number for save file format (increment when format changes)
const SAVE_VERSION: u32 = 1;

/// Serializable record of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Save format version
    pub version: u32,
    /// Config the run was started with
    pub config: SimConfig,
    /// Finished generations, oldest first
    pub history: Vec<GenerationSummary>,
}

impl RunRecord {
    pub fn new(config: SimConfig, history: Vec<GenerationSummary>) -> Self {
        Self {
            version: SAVE_VERSION,
            config,
            history,
        }
    }
}

/// Write a run record
pub fn save_run<W: Write>(writer: W, record: &RunRecord) -> Result<(), SaveError> {
    bincode::serialize_into(writer, record)?;
    Ok(())
}

/// Read a run record, rejecting other format versions and unusable configs
pub fn load_run<R: Read>(reader: R) -> Result<RunRecord, SaveError> {
    let record: RunRecord = bincode::deserialize_from(reader)?;

    if record.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: record.version,
        });
    }
    let errors = validate_config(&record.config);
    if !errors.is_empty() {
        return Err(SaveError::InvalidConfig(errors));
    }
    log::debug!(
        "loaded run record with {} generations",
        record.history.len()
    );
    Ok(record)
}

/// Errors that can occur during save/load
#[derive(Debug)]
pub enum SaveError {
    Io(std::io::Error),
    Bincode(Box<bincode::ErrorKind>),
    VersionMismatch { expected: u32, found: u32 },
    /// The record decoded but its config fails validation.
    InvalidConfig(Vec<ConfigError>),
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for SaveError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        SaveError::Bincode(e)
    }
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "IO error: {}", e),
            SaveError::Bincode(e) => write!(f, "Serialization error: {}", e),
            SaveError::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Save version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            SaveError::InvalidConfig(errors) => {
                write!(f, "Saved config is invalid:")?;
                for e in errors {
                    write!(f, " {};", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for SaveError {}
