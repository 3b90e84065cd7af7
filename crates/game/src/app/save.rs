use std::fmt::Display;
use std::io;
use std::path::{Path, PathBuf};

use quest_engine::{read_text_if_exists, write_text_atomic, ProgressSnapshot, ProgressStore};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

pub(crate) const SAVE_VERSION: u32 = 1;
pub(crate) const SAVE_FILE_NAME: &str = "progress.save.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SaveFile {
    pub(crate) save_version: u32,
    pub(crate) content_fingerprint: String,
    pub(crate) progress: ProgressSnapshot,
}

#[derive(Debug, Error)]
pub(crate) enum SaveError {
    #[error("read save '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("write save '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("encode save json: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("parse save json{}: {source}", at_path(.path))]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("validation failed at {field}: expected {expected}, got {actual}")]
    Mismatch {
        field: &'static str,
        expected: String,
        actual: String,
    },
}

fn at_path(path: &str) -> String {
    if path.is_empty() || path == "." {
        String::new()
    } else {
        format!(" at {path}")
    }
}

fn mismatch(field: &'static str, expected: impl Display, actual: impl Display) -> SaveError {
    SaveError::Mismatch {
        field,
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

pub(crate) fn save_path(save_dir: &Path) -> PathBuf {
    save_dir.join(SAVE_FILE_NAME)
}

pub(crate) fn write_progress(path: &Path, progress: &ProgressStore) -> Result<(), SaveError> {
    let save = SaveFile {
        save_version: SAVE_VERSION,
        content_fingerprint: progress.content().fingerprint().to_string(),
        progress: progress.snapshot(),
    };
    let json = serde_json::to_string_pretty(&save).map_err(SaveError::Encode)?;
    write_text_atomic(path, &json).map_err(|source| SaveError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "progress_saved");
    Ok(())
}

/// Restores `progress` from `path`. A missing file leaves progress untouched
/// and returns `Ok(false)`.
pub(crate) fn read_progress(path: &Path, progress: &mut ProgressStore) -> Result<bool, SaveError> {
    let Some(raw) = read_text_if_exists(path).map_err(|source| SaveError::Read {
        path: path.to_path_buf(),
        source,
    })?
    else {
        info!(path = %path.display(), "no_save_found");
        return Ok(false);
    };

    let save = parse_save_json(&raw)?;
    validate_save(&save, progress.content().fingerprint())?;
    progress.restore(&save.progress);
    info!(path = %path.display(), "progress_loaded");
    Ok(true)
}

fn parse_save_json(raw: &str) -> Result<SaveFile, SaveError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, SaveFile>(&mut deserializer).map_err(|error| {
        let path = error.path().to_string();
        SaveError::Parse {
            path,
            source: error.into_inner(),
        }
    })
}

fn validate_save(save: &SaveFile, fingerprint: &str) -> Result<(), SaveError> {
    if save.save_version != SAVE_VERSION {
        return Err(mismatch("save_version", SAVE_VERSION, save.save_version));
    }
    if save.content_fingerprint != fingerprint {
        return Err(mismatch(
            "content_fingerprint",
            fingerprint,
            &save.content_fingerprint,
        ));
    }
    Ok(())
}
