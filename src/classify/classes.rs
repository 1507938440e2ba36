use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;

/// Sentinel label for probability indices beyond the loaded class list.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Versioned class-list artifact supplied alongside the model.
#[derive(Debug, Deserialize)]
struct ClassSetFile {
    #[allow(dead_code)]
    version: Option<u32>,
    classes: Vec<String>,
}

/// Ordered class names, index-aligned with the model's output vector.
///
/// Loaded once at startup and read-only for the lifetime of the session.
#[derive(Clone, Debug)]
pub struct ClassSet {
    names: Vec<String>,
}

impl ClassSet {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Synthetic fallback names `Class_0 .. Class_{N-1}` for a model output
    /// width of `n`, used when no artifact is supplied.
    pub fn synthetic(n: usize) -> Self {
        Self {
            names: (0..n).map(|i| format!("Class_{}", i)).collect(),
        }
    }

    /// Load the JSON artifact: `{"version": 1, "classes": ["Dime", ...]}`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read class list {}: {}", path.display(), e))?;
        let file: ClassSetFile = serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid class list {}: {}", path.display(), e))?;
        if file.classes.is_empty() {
            return Err(anyhow!("class list {} is empty", path.display()));
        }
        Ok(Self::new(file.classes))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Label for a probability index, or the `Unknown` sentinel when the
    /// index falls beyond the list.
    pub fn label(&self, index: usize) -> &str {
        self.names
            .get(index)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_LABEL)
    }
}
