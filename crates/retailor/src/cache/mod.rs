//! Content-addressed result cache.
//!
//! One JSON file per fingerprint under the cache root. The fingerprint is a
//! SHA-256 over the request's five identity fields, each length-prefixed so
//! distinct field splits can never collide ("a" + "bc" vs "ab" + "c").
//! Tailoring bounds are deliberately not part of the identity: the same
//! inputs ask for the same output no matter how many retries were allowed.
//!
//! Absence of an entry only ever means "not computed yet". A file that fails
//! to decode is logged and treated as a miss, and the next store overwrites
//! nothing because stores are skipped when the entry already exists.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::errors::TailorError;
use crate::refine::TailoringResult;

/// Hex-encoded SHA-256 request identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Computes the fingerprint over the five identity fields, in canonical
    /// order, each prefixed with its byte length.
    pub fn compute(
        resume_text: &str,
        jd_text: &str,
        instructions: &str,
        provider: &str,
        job_title: &str,
    ) -> Self {
        let mut hasher = Sha256::new();
        for field in [resume_text, jd_text, instructions, provider, job_title] {
            hasher.update((field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
        Fingerprint(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// On-disk cache entry: the result plus enough metadata to audit it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub fingerprint: Fingerprint,
    pub created_at: DateTime<Utc>,
    pub result: TailoringResult,
}

/// Filesystem-backed cache keyed by [`Fingerprint`].
#[derive(Debug, Clone)]
pub struct ContentCache {
    root: PathBuf,
}

impl ContentCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.root.join(format!("{fingerprint}.json"))
    }

    /// Loads a cached result, or `None` when the fingerprint has never been
    /// computed. A corrupt entry is reported and treated as a miss.
    pub async fn load(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<TailoringResult>, TailorError> {
        let path = self.entry_path(fingerprint);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) => {
                debug!(%fingerprint, "cache hit");
                Ok(Some(entry.result))
            }
            Err(e) => {
                warn!(%fingerprint, error = %e, "discarding undecodable cache entry");
                Ok(None)
            }
        }
    }

    /// Persists a result. A fingerprint already on disk is left untouched;
    /// identical inputs produce identical results, so the first write wins.
    pub async fn store(
        &self,
        fingerprint: &Fingerprint,
        result: &TailoringResult,
    ) -> Result<(), TailorError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.entry_path(fingerprint);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            debug!(%fingerprint, "cache entry already present, keeping existing");
            return Ok(());
        }
        let entry = CacheEntry {
            fingerprint: fingerprint.clone(),
            created_at: Utc::now(),
            result: result.clone(),
        };
        let json = serde_json::to_string_pretty(&entry)
            .map_err(|e| anyhow::anyhow!("serializing cache entry: {e}"))?;
        tokio::fs::write(&path, json).await?;
        debug!(%fingerprint, path = %path.display(), "cached tailoring result");
        Ok(())
    }

    pub async fn contains(&self, fingerprint: &Fingerprint) -> bool {
        tokio::fs::try_exists(self.entry_path(fingerprint))
            .await
            .unwrap_or(false)
    }

    /// Deletes every entry and reports how many were removed.
    pub async fn purge(&self) -> Result<usize, TailorError> {
        let mut removed = 0;
        let mut dir = match tokio::fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                tokio::fs::remove_file(&path).await?;
                removed += 1;
            }
        }
        debug!(removed, "purged cache");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable() {
        let a = Fingerprint::compute("resume", "jd", "notes", "openai", "Backend Engineer");
        let b = Fingerprint::compute("resume", "jd", "notes", "openai", "Backend Engineer");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_fingerprint_sensitive_to_each_field() {
        let base = Fingerprint::compute("r", "j", "i", "p", "t");
        assert_ne!(base, Fingerprint::compute("x", "j", "i", "p", "t"));
        assert_ne!(base, Fingerprint::compute("r", "x", "i", "p", "t"));
        assert_ne!(base, Fingerprint::compute("r", "j", "x", "p", "t"));
        assert_ne!(base, Fingerprint::compute("r", "j", "i", "x", "t"));
        assert_ne!(base, Fingerprint::compute("r", "j", "i", "p", "x"));
    }

    #[test]
    fn test_length_prefix_blocks_field_shifting() {
        // Same concatenation, different field boundaries.
        let a = Fingerprint::compute("ab", "c", "", "", "");
        let b = Fingerprint::compute("a", "bc", "", "", "");
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_is_order_sensitive() {
        let a = Fingerprint::compute("resume", "jd", "", "p", "t");
        let b = Fingerprint::compute("jd", "resume", "", "p", "t");
        assert_ne!(a, b);
    }
}
