use std::collections::BTreeMap;

use anyhow::{anyhow, Result};

use super::backend::PairClassifier;

/// Registry of classifier backends.
///
/// The analysis loop is single-threaded, so backends are owned directly and
/// lent out mutably for the duration of a run.
pub struct ClassifierRegistry {
    backends: BTreeMap<String, Box<dyn PairClassifier>>,
    default_name: Option<String>,
}

impl ClassifierRegistry {
    pub fn new() -> Self {
        Self {
            backends: BTreeMap::new(),
            default_name: None,
        }
    }

    /// Register a backend. The first registered backend becomes the default.
    pub fn register<B: PairClassifier + 'static>(&mut self, backend: B) {
        let name = backend.name().to_string();
        if self.default_name.is_none() {
            self.default_name = Some(name.clone());
        }
        self.backends.insert(name, Box::new(backend));
    }

    /// Set default backend by name.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.backends.contains_key(name) {
            return Err(anyhow!(
                "classifier backend '{}' not registered (available: {})",
                name,
                self.list().join(", ")
            ));
        }
        self.default_name = Some(name.to_string());
        Ok(())
    }

    /// Get backend by name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn PairClassifier + 'static)> {
        self.backends.get_mut(name).map(|backend| backend.as_mut())
    }

    /// Get default backend.
    pub fn default_backend_mut(&mut self) -> Option<&mut (dyn PairClassifier + 'static)> {
        let name = self.default_name.clone()?;
        self.get_mut(&name)
    }

    pub fn default_name(&self) -> Option<&str> {
        self.default_name.as_deref()
    }

    /// List registered backends, sorted by name.
    pub fn list(&self) -> Vec<String> {
        self.backends.keys().cloned().collect()
    }
}

impl Default for ClassifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}
