use crate::verify::harness::FixCase;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixtures from {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse fixtures ({path}): {source}")]
    Toml {
        path: PathBuf,
        source: toml_edit::de::Error,
    },
}

#[derive(Debug, Default, Deserialize)]
struct FixtureFile {
    #[serde(default)]
    cases: Vec<FixCase>,
}

/// Cases from a TOML `[[cases]]` document.
pub fn cases_from_str(input: &str) -> Result<Vec<FixCase>, toml_edit::de::Error> {
    let file: FixtureFile = toml_edit::de::from_str(input)?;
    Ok(file.cases)
}

pub fn load_cases(path: impl AsRef<Path>) -> Result<Vec<FixCase>, FixtureError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| FixtureError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut cases = cases_from_str(&contents).map_err(|source| FixtureError::Toml {
        path: path.to_path_buf(),
        source,
    })?;
    for (index, case) in cases.iter_mut().enumerate() {
        if case.name.is_empty() {
            case.name = format!("case {}", index + 1);
        }
    }
    Ok(cases)
}
