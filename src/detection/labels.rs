use crate::{Error, Result};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Maps class ids to human-readable names.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelTable {
    names: Vec<String>,
}

impl LabelTable {
    pub fn new(names: Vec<String>) -> Result<Self> {
        if names.is_empty() {
            return Err(Error::labels("label table is empty"));
        }
        Ok(Self { names })
    }

    pub fn name(&self, class_id: usize) -> Option<&str> {
        self.names.get(class_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// One name per line; line `n` names class `n`. Every line counts, so a
    /// blank line before the last name is rejected. Trailing blank lines are
    /// ignored.
    pub fn from_lines(content: &str) -> Result<Self> {
        let mut names: Vec<String> = content
            .lines()
            .map(str::trim)
            .map(str::to_string)
            .collect();
        while names.last().is_some_and(|name| name.is_empty()) {
            names.pop();
        }
        if let Some(id) = names.iter().position(String::is_empty) {
            return Err(Error::labels(format!(
                "class id {} has a blank name (line {})",
                id,
                id + 1
            )));
        }
        Self::new(names)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading labels from {}", path.display());
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::labels(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_lines(&content)
    }

    /// Parses the `names` metadata entry YOLO exporters write into ONNX
    /// models, e.g. `{0: 'apple', 1: "chef's knife"}`. Ids must cover
    /// `0..n` without gaps.
    pub fn from_names_metadata(raw: &str) -> Result<Self> {
        let entries: BTreeMap<usize, String> = serde_yaml::from_str(raw)
            .map_err(|e| Error::labels(format!("invalid names metadata: {}", e)))?;

        if let Some((expected, id)) = entries
            .keys()
            .enumerate()
            .find(|(expected, id)| expected != *id)
        {
            return Err(Error::labels(format!(
                "class id {} is missing from the label table (next id is {})",
                expected, id
            )));
        }

        Self::new(entries.into_values().collect())
    }
}
