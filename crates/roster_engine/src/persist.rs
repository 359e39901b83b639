use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use harvest_logging::harvest_debug;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory {path:?} unusable: {message}")]
    OutputDir { path: PathBuf, message: String },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure the output directory exists, creating it when missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    let unusable = |message: String| PersistError::OutputDir {
        path: dir.to_path_buf(),
        message,
    };
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| unusable(e.to_string()))?;
        if !meta.is_dir() {
            return Err(unusable("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| unusable(e.to_string()))?;
    }
    Ok(())
}

/// Writes whole files under one directory via temp file + rename, so readers
/// never observe a half-written output and a failed run leaves no file behind.
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Replaces `{dir}/{filename}` with `content`.
    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        if target.exists() {
            fs::remove_file(&target)?;
        }
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        harvest_debug!("wrote {} bytes to {:?}", content.len(), target);
        Ok(target)
    }
}
