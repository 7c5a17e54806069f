//! Study type: the radiology procedure category that selects which
//! prompt template and reference document apply.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// A study type name such as "CT Chest" or "CT Abdomen/Pelvis".
///
/// Names are compared exactly; they may contain characters that are not
/// safe in file names, so storage keys are derived separately.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudyType(String);

impl StudyType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for StudyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StudyType {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for StudyType {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for StudyType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for StudyType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn serializes_as_plain_string() {
        let study = StudyType::from("CT Abdomen/Pelvis");
        assert_eq!(serde_json::to_string(&study).unwrap(), "\"CT Abdomen/Pelvis\"");
    }

    #[test]
    fn map_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(StudyType::from("MRI Brain"), 1);
        assert_eq!(map.get("MRI Brain"), Some(&1));
    }
}
