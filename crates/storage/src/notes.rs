//! File note store: one text file per SOAP note.

use async_trait::async_trait;
use mediscreen_core::error::NoteError;
use mediscreen_core::note::{ClinicalNote, NoteStore};
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes notes to `<dir>/<subject>_SOAP_Note_<YYYYMMDD_HHMMSS>.txt`.
/// The directory is created on first use.
pub struct FileNoteStore {
    dir: PathBuf,
}

impl FileNoteStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl NoteStore for FileNoteStore {
    async fn persist(&self, note: &ClinicalNote) -> Result<String, NoteError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| NoteError::DirectoryFailed {
                path: self.dir.display().to_string(),
                reason: e.to_string(),
            })?;

        let path = self.dir.join(note.file_name());
        let location = path.display().to_string();
        tokio::fs::write(&path, note.body())
            .await
            .map_err(|e| NoteError::WriteFailed {
                path: location.clone(),
                reason: e.to_string(),
            })?;

        info!(path = %location, "SOAP note written");
        Ok(location)
    }
}
