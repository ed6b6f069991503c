//! Reading parsed history documents.
//!
//! A document holds either a single run or an array of runs, in the camelCase
//! JSON the log parser emits.

use crate::error::InputError;
use crate::models::ProgramInstanceData;
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    Many(Vec<ProgramInstanceData>),
    One(Box<ProgramInstanceData>),
}

/// Decode the runs held in a JSON string.
pub fn parse_runs(json: &str) -> Result<Vec<ProgramInstanceData>, serde_json::Error> {
    Ok(match serde_json::from_str(json)? {
        Document::Many(runs) => runs,
        Document::One(run) => vec![*run],
    })
}

pub fn load_runs(path: &Path) -> Result<Vec<ProgramInstanceData>, InputError> {
    let json = std::fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let runs = parse_runs(&json).map_err(|source| InputError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("{}: {} runs", path.display(), runs.len());
    Ok(runs)
}

/// Load every file in order, concatenating their runs.
pub fn load_all<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<ProgramInstanceData>, InputError> {
    let mut runs = Vec::new();
    for path in paths {
        runs.extend(load_runs(path.as_ref())?);
    }
    Ok(runs)
}
