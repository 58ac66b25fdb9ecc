//! Prompt Loader - Load and cache prompt template overrides from disk
//!
//! A template with id `chain.extract` lives at `<dir>/chain.extract.md`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::{ReflectorError, Result};

/// Loads and caches prompt templates from a directory
pub struct PromptLoader {
    templates_dir: PathBuf,
    cache: RwLock<HashMap<String, String>>,
}

impl PromptLoader {
    pub fn new(templates_dir: impl AsRef<Path>) -> Self {
        Self {
            templates_dir: templates_dir.as_ref().to_path_buf(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn templates_dir(&self) -> &Path {
        &self.templates_dir
    }

    /// Load a template by id, reading from disk on first use
    pub fn load(&self, id: &str) -> Result<String> {
        if let Some(content) = self.get(id) {
            return Ok(content);
        }

        let path = self.template_path(id);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            ReflectorError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to load template '{}' from {:?}: {}", id, path, e),
            ))
        })?;

        let mut cache = self
            .cache
            .write()
            .map_err(|e| ReflectorError::Template(format!("Template cache poisoned: {}", e)))?;
        cache.insert(id.to_string(), content.clone());

        Ok(content)
    }

    /// Get a cached template without touching the disk
    pub fn get(&self, id: &str) -> Option<String> {
        let cache = self.cache.read().ok()?;
        cache.get(id).cloned()
    }

    fn template_path(&self, id: &str) -> PathBuf {
        self.templates_dir.join(format!("{}.md", id))
    }

    /// Ids of all `*.md` templates in the directory, sorted
    pub fn list_available(&self) -> Result<Vec<String>> {
        if !self.templates_dir.is_dir() {
            return Err(ReflectorError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Templates directory {:?} does not exist", self.templates_dir),
            )));
        }

        let pattern = self.templates_dir.join("*.md");
        let pattern = pattern.to_string_lossy();
        let paths = glob::glob(&pattern)
            .map_err(|e| ReflectorError::Template(format!("Bad template glob {}: {}", pattern, e)))?;

        let mut ids: Vec<String> = paths
            .flatten()
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();

        ids.sort();
        Ok(ids)
    }
}
