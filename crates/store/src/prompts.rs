//! Per-study prompt template overrides.
//!
//! Storage: a JSON object mapping study name → template, pretty-printed so
//! it stays readable when inspected by hand.
//!
//! ```json
//! {
//!   "CT Chest": "Rules: {document_content} End."
//! }
//! ```
//!
//! Every write re-reads the file, merges one entry and atomically replaces
//! the file while holding the store's write lock. Each study also carries an
//! in-process revision counter so concurrent editors can detect that someone
//! else saved first ([`PromptStore::save_if_revision`]).

use radimpress_core::error::PromptError;
use radimpress_core::template::{DEFAULT_PROMPT, has_placeholder};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::atomic::write_atomic;

/// A file-backed record of prompt template overrides.
pub struct PromptStore {
    path: PathBuf,
    /// Guards read-modify-write cycles; holds each study's revision.
    revisions: Mutex<HashMap<String, u64>>,
}

enum ReadOutcome {
    Absent,
    Loaded(BTreeMap<String, String>),
    Unreadable(String),
}

impl PromptStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            revisions: Mutex::new(HashMap::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> ReadOutcome {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return ReadOutcome::Absent,
            Err(e) => return ReadOutcome::Unreadable(e.to_string()),
        };
        match serde_json::from_str(&content) {
            Ok(map) => ReadOutcome::Loaded(map),
            Err(e) => ReadOutcome::Unreadable(e.to_string()),
        }
    }

    /// All stored overrides. Empty when the file is absent or unreadable.
    pub fn load_all(&self) -> BTreeMap<String, String> {
        match self.read() {
            ReadOutcome::Absent => BTreeMap::new(),
            ReadOutcome::Loaded(map) => map,
            ReadOutcome::Unreadable(reason) => {
                warn!(path = %self.path.display(), %reason, "Error loading prompts, using none");
                BTreeMap::new()
            }
        }
    }

    /// The template for `study`: its stored override or [`DEFAULT_PROMPT`].
    pub fn get(&self, study: &str) -> String {
        self.load_all()
            .remove(study)
            .unwrap_or_else(|| DEFAULT_PROMPT.to_string())
    }

    /// Whether `study` has a stored override.
    pub fn has_override(&self, study: &str) -> bool {
        self.load_all().contains_key(study)
    }

    /// Current revision of `study`'s template (0 until first saved by this process).
    pub fn revision(&self, study: &str) -> u64 {
        let revisions = self.revisions.lock().unwrap_or_else(|e| e.into_inner());
        revisions.get(study).copied().unwrap_or(0)
    }

    /// Save `template` for `study`, returning the new revision.
    pub fn save(&self, study: &str, template: &str) -> Result<u64, PromptError> {
        self.write(study, template, None)
    }

    /// Save only if `study` is still at `expected` revision.
    pub fn save_if_revision(
        &self,
        study: &str,
        template: &str,
        expected: u64,
    ) -> Result<u64, PromptError> {
        self.write(study, template, Some(expected))
    }

    fn write(&self, study: &str, template: &str, expected: Option<u64>) -> Result<u64, PromptError> {
        if !has_placeholder(template) {
            return Err(PromptError::MissingPlaceholder {
                study: study.to_string(),
            });
        }

        let mut revisions = self.revisions.lock().unwrap_or_else(|e| e.into_inner());
        let current = revisions.get(study).copied().unwrap_or(0);
        match expected {
            Some(expected) if expected != current => {
                return Err(PromptError::Conflict {
                    study: study.to_string(),
                    expected,
                    actual: current,
                });
            }
            _ => {}
        }

        let mut prompts = match self.read() {
            ReadOutcome::Absent => BTreeMap::new(),
            ReadOutcome::Loaded(map) => map,
            // Refuse to clobber other studies' templates with a partial map.
            ReadOutcome::Unreadable(reason) => {
                return Err(PromptError::WriteFailed {
                    path: self.path.clone(),
                    reason: format!("existing prompt file is unreadable: {reason}"),
                });
            }
        };
        prompts.insert(study.to_string(), template.to_string());

        let json = serde_json::to_string_pretty(&prompts).map_err(|e| PromptError::WriteFailed {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        write_atomic(&self.path, json.as_bytes()).map_err(|e| PromptError::WriteFailed {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        let next = current + 1;
        revisions.insert(study.to_string(), next);
        debug!(study, revision = next, "Prompt saved");
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, PromptStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = PromptStore::new(dir.path().join("study_prompts.json"));
        (dir, store)
    }

    #[test]
    fn unconfigured_study_gets_default_template() {
        let (_dir, store) = store();
        assert_eq!(store.get("CT Chest"), DEFAULT_PROMPT);
        assert!(!store.has_override("CT Chest"));
        assert!(store.load_all().is_empty());
    }

    #[test]
    fn save_merges_and_persists() {
        let (_dir, store) = store();
        store.save("CT Chest", "Chest: {document_content}").unwrap();
        store.save("MRI Brain", "Brain: {document_content}").unwrap();

        let all = store.load_all();
        assert_eq!(all.len(), 2);
        assert_eq!(store.get("CT Chest"), "Chest: {document_content}");
        assert!(store.has_override("MRI Brain"));

        // A fresh store over the same file sees the same records.
        let reopened = PromptStore::new(store.path());
        assert_eq!(reopened.get("MRI Brain"), "Brain: {document_content}");
    }

    #[test]
    fn file_is_pretty_printed() {
        let (_dir, store) = store();
        store.save("CT Chest", "{document_content}").unwrap();
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\n  \"CT Chest\""));
    }

    #[test]
    fn template_without_placeholder_rejected() {
        let (_dir, store) = store();
        let err = store.save("CT Chest", "Just summarize.").unwrap_err();
        assert!(matches!(err, PromptError::MissingPlaceholder { .. }));
        assert!(!store.path().exists());
    }

    #[test]
    fn malformed_file_reads_as_empty_but_is_not_overwritten() {
        let (_dir, store) = store();
        std::fs::write(store.path(), "{not json").unwrap();

        assert!(store.load_all().is_empty());
        assert_eq!(store.get("CT Chest"), DEFAULT_PROMPT);
        assert!(matches!(
            store.save("CT Chest", "{document_content}"),
            Err(PromptError::WriteFailed { .. })
        ));
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "{not json");
    }

    #[test]
    fn revisions_detect_concurrent_edits() {
        let (_dir, store) = store();
        assert_eq!(store.revision("CT Chest"), 0);

        // Two editors load revision 0; the first save wins.
        let rev = store
            .save_if_revision("CT Chest", "A {document_content}", 0)
            .unwrap();
        assert_eq!(rev, 1);

        let err = store
            .save_if_revision("CT Chest", "B {document_content}", 0)
            .unwrap_err();
        match err {
            PromptError::Conflict {
                expected, actual, ..
            } => {
                assert_eq!(expected, 0);
                assert_eq!(actual, 1);
            }
            other => panic!("expected conflict, got {other:?}"),
        }
        assert_eq!(store.get("CT Chest"), "A {document_content}");
    }

    #[test]
    fn concurrent_saves_do_not_lose_entries() {
        let (_dir, store) = store();
        let store = std::sync::Arc::new(store);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store
                        .save(&format!("Study {i}"), "{document_content}")
                        .unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(store.load_all().len(), 8);
    }
}
