//! Study type catalog backed by a human-editable TOML file.
//!
//! ```toml
//! studies = ["CT Chest", "CT Abdomen/Pelvis", "MRI Brain"]
//! ```
//!
//! The file is created with [`DEFAULT_STUDIES`] when it does not exist.
//! A file that cannot be read or parsed never stops the application: the
//! problem is logged and the built-in list is used instead.

use radimpress_core::StudyType;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

/// Built-in study types, in display order.
pub const DEFAULT_STUDIES: [&str; 18] = [
    "CT Chest",
    "CT Abdomen/Pelvis",
    "CT Head/Brain",
    "CT Spine",
    "MRI Brain",
    "MRI Spine",
    "MRI Abdomen",
    "MRI Pelvis",
    "MRI Musculoskeletal",
    "MRI Cardiac",
    "Ultrasound Abdomen",
    "Ultrasound Pelvis",
    "Ultrasound Renal",
    "Ultrasound Cardiac",
    "Chest X-ray",
    "MRCP",
    "CTA",
    "MRA",
];

#[derive(Debug, Serialize, Deserialize)]
struct StudiesFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    studies: Option<Vec<String>>,
}

/// The ordered, duplicate-free list of study types offered in the form.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyCatalog {
    studies: Vec<StudyType>,
}

impl StudyCatalog {
    /// Build a catalog from names, dropping blanks and later duplicates.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let studies = names
            .into_iter()
            .map(|n| n.into().trim().to_string())
            .filter(|n| !n.is_empty())
            .filter(|n| seen.insert(n.clone()))
            .map(StudyType::from)
            .collect();
        Self { studies }
    }

    /// The built-in catalog.
    pub fn builtin() -> Self {
        Self::new(DEFAULT_STUDIES)
    }

    /// Load study types from `path`.
    ///
    /// Absent file: the default list is written there and returned.
    /// Unreadable or malformed file: a warning is logged and the default
    /// list is returned.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            if let Err(e) = Self::write_default(path) {
                warn!(path = %path.display(), error = %e, "Could not create default studies file");
            } else {
                info!(path = %path.display(), "Created default studies file");
            }
            return Self::builtin();
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Error loading studies config, using defaults");
                return Self::builtin();
            }
        };

        match toml::from_str::<StudiesFile>(&content) {
            Ok(StudiesFile {
                studies: Some(names),
            }) => Self::new(names),
            Ok(StudiesFile { studies: None }) => {
                warn!(path = %path.display(), "Studies file has no `studies` key, using defaults");
                Self::builtin()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Error parsing studies config, using defaults");
                Self::builtin()
            }
        }
    }

    /// Serialize the default list as the studies file contents.
    pub fn default_toml() -> String {
        let file = StudiesFile {
            studies: Some(DEFAULT_STUDIES.iter().map(|s| s.to_string()).collect()),
        };
        toml::to_string_pretty(&file).unwrap_or_default()
    }

    fn write_default(path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, Self::default_toml())
    }

    pub fn studies(&self) -> &[StudyType] {
        &self.studies
    }

    /// Look up a study type by exact name.
    pub fn get(&self, name: &str) -> Option<&StudyType> {
        self.studies.iter().find(|s| s.as_str() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.studies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.studies.is_empty()
    }
}
