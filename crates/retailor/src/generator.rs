//! The generation seam.
//!
//! All rewritten text enters the pipeline through [`Generator::generate`],
//! one prompt in, one rewritten resume out. The core never speaks a
//! provider's wire protocol; hosts implement this trait per backend and
//! register each implementation under a provider id. Failures cross the seam
//! as opaque [`GeneratorError`]s: the refinement loop treats any of them as
//! fatal for the current job and leaves retry policy to the backend itself.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    #[error("provider returned malformed output: {0}")]
    Malformed(String),
    #[error("{0}")]
    Other(String),
}

/// A text-generation backend.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError>;
}

/// Provider-id to backend lookup, shared by the service and its worker.
#[derive(Clone, Default)]
pub struct GeneratorRegistry {
    backends: HashMap<String, Arc<dyn Generator>>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a backend under `provider`, replacing any previous
    /// registration for that id.
    pub fn register(&mut self, provider: impl Into<String>, backend: Arc<dyn Generator>) {
        let provider = provider.into();
        tracing::debug!(%provider, "registered generation backend");
        self.backends.insert(provider, backend);
    }

    pub fn get(&self, provider: &str) -> Option<Arc<dyn Generator>> {
        self.backends.get(provider).cloned()
    }

    pub fn contains(&self, provider: &str) -> bool {
        self.backends.contains_key(provider)
    }

    pub fn providers(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.backends.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
