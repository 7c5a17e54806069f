//! Per-study reference documents on disk.
//!
//! Each study type owns at most one `.docx` file under the documents
//! directory. File names are derived from the study name: path-unsafe
//! characters become `_` and a short SHA-256 suffix keeps names such as
//! "CT Abdomen/Pelvis" and "CT Abdomen Pelvis" from sharing a file.

use radimpress_core::error::DocumentError;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

use crate::atomic::write_atomic;

/// Stores one reference document per study type.
pub struct DocumentStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

/// Derive the file stem used for `study`.
///
/// `<sanitized>-<first 8 hex digits of sha256(study)>`
pub fn storage_key(study: &str) -> String {
    let sanitized: String = study
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let digest = Sha256::digest(study.as_bytes());
    format!("{sanitized}-{}", hex::encode(&digest[..4]))
}

impl DocumentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deterministic document path for `study`.
    pub fn path_for(&self, study: &str) -> PathBuf {
        self.dir.join(format!("{}.docx", storage_key(study)))
    }

    pub fn exists(&self, study: &str) -> bool {
        self.path_for(study).is_file()
    }

    /// Store `bytes` as `study`'s document, replacing any previous upload.
    pub fn save(&self, study: &str, bytes: &[u8]) -> Result<PathBuf, DocumentError> {
        if bytes.is_empty() {
            return Err(DocumentError::EmptyUpload(study.to_string()));
        }

        let path = self.path_for(study);
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        write_atomic(&path, bytes).map_err(|e| DocumentError::Io {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        info!(study, path = %path.display(), bytes = bytes.len(), "Reference document saved");
        Ok(path)
    }

    /// Delete `study`'s document.
    pub fn remove(&self, study: &str) -> Result<(), DocumentError> {
        let path = self.path_for(study);
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!(study, "Reference document removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(DocumentError::NotFound(study.to_string()))
            }
            Err(e) => Err(DocumentError::Io {
                path,
                reason: e.to_string(),
            }),
        }
    }

    /// Raw bytes of `study`'s document, `None` when absent.
    pub fn load(&self, study: &str) -> Result<Option<Vec<u8>>, DocumentError> {
        let path = self.path_for(study);
        match std::fs::read(&path) {
            Ok(bytes) => {
                debug!(study, bytes = bytes.len(), "Reference document read");
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DocumentError::Io {
                path,
                reason: e.to_string(),
            }),
        }
    }
}
