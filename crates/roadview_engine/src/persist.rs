use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory {path:?} unusable: {reason}")]
    OutputDir { path: PathBuf, reason: String },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Creates the results directory if needed and rejects a path that is a file.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    let unusable = |reason: String| PersistError::OutputDir {
        path: dir.to_path_buf(),
        reason,
    };
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(unusable("not a directory".to_string())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(|e| unusable(e.to_string()))
        }
        Err(err) => Err(unusable(err.to_string())),
    }
}

/// Writes files into `dir` through a temp file that is renamed into place, so
/// a reader never sees a partially downloaded artifact.
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Opens a temp file in the output directory for incremental writes.
    pub fn stage(&self) -> Result<StagedFile, PersistError> {
        ensure_output_dir(&self.dir)?;
        let tmp = NamedTempFile::with_prefix_in(".partial-", &self.dir)?;
        Ok(StagedFile {
            dir: self.dir.clone(),
            tmp,
            len: 0,
        })
    }

    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        let mut staged = self.stage()?;
        staged.append(content)?;
        staged.commit(filename)
    }
}

/// Temp file that becomes `{dir}/{filename}` on commit and disappears if dropped.
#[derive(Debug)]
pub struct StagedFile {
    dir: PathBuf,
    tmp: NamedTempFile,
    len: u64,
}

impl StagedFile {
    pub fn append(&mut self, chunk: &[u8]) -> Result<(), PersistError> {
        self.tmp.write_all(chunk)?;
        self.len += chunk.len() as u64;
        Ok(())
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn commit(mut self, filename: &str) -> Result<PathBuf, PersistError> {
        self.tmp.flush()?;
        self.tmp.as_file_mut().sync_all()?;

        let target = self.dir.join(filename);
        // A reload of the same job overwrites its earlier artifact.
        if target.exists() {
            fs::remove_file(&target)?;
        }
        self.tmp
            .persist(&target)
            .map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

/// File name for a downloaded result, unique per job.
pub fn result_filename(job_id: &str, original: &str) -> String {
    let short_id: String = job_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(8)
        .collect();
    let name: String = original
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            other => other,
        })
        .collect();
    let name = name.trim_start_matches('.');
    let name = if name.is_empty() { "result.mp4" } else { name };
    if short_id.is_empty() {
        format!("processed_{name}")
    } else {
        format!("processed_{short_id}_{name}")
    }
}
