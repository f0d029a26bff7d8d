//! Report files on disk.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::{report_filename, RunId};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("report directory unusable: {0}")]
    OutputDir(String),
    #[error("{} is not a report in this directory", .0.display())]
    OutsideStore(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Create `dir` if needed and make sure it is a directory.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(PersistError::OutputDir(format!(
            "{} is not a directory",
            dir.display()
        ))),
        Err(err) if err.kind() == io::ErrorKind::NotFound => fs::create_dir_all(dir)
            .map_err(|err| PersistError::OutputDir(format!("{}: {err}", dir.display()))),
        Err(err) => Err(PersistError::OutputDir(format!("{}: {err}", dir.display()))),
    }
}

/// Directory holding one text file per finished run.
#[derive(Debug, Clone)]
pub struct ReportStore {
    dir: PathBuf,
}

impl ReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the report of `run_id`, replacing an earlier file of the same name.
    /// Readers never observe a half-written report.
    pub fn save(&self, keyword: &str, run_id: RunId, text: &str) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;
        let target = self.dir.join(report_filename(keyword, run_id));
        replace_file(&self.dir, &target, text.as_bytes())?;
        Ok(target)
    }

    /// Read back a report saved by this store.
    pub fn load(&self, path: &Path) -> Result<String, PersistError> {
        if path.parent() != Some(self.dir.as_path()) {
            return Err(PersistError::OutsideStore(path.to_path_buf()));
        }
        Ok(fs::read_to_string(path)?)
    }
}

fn replace_file(dir: &Path, target: &Path, bytes: &[u8]) -> Result<(), PersistError> {
    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(bytes)?;
    staged.as_file_mut().sync_all()?;
    // rename() over an existing file fails on Windows.
    if cfg!(windows) && target.exists() {
        fs::remove_file(target)?;
    }
    staged.persist(target).map_err(|err| PersistError::Io(err.error))?;
    Ok(())
}
