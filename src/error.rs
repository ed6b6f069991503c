use crate::store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort an import run.
///
/// Everything else is recorded in [`crate::import::ImportStats`] and the run
/// carries on; only the program skeleton is a hard prerequisite.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to create program {slug}: {source}")]
    ProgramCreation { slug: String, source: StoreError },
    #[error("failed to create cycle {cycle_number}: {source}")]
    CycleCreation { cycle_number: i32, source: StoreError },
}

/// Errors reading parsed history documents.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to decode {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}
