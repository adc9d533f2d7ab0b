//! Artifact packaging.
//!
//! Turns an accepted resume into output files under the artifact directory.
//! The contract is graceful degradation with one hard floor:
//!
//! * `txt` is written directly and MUST succeed; a txt failure fails the
//!   whole pipeline.
//! * `docx` goes through the configured [`DocumentCodec`], when there is one.
//! * `pdf` prefers converting the docx through the codec, then falls back to
//!   the built-in direct-draw writer in [`minipdf`].
//!
//! Every stage leaves a [`StageRecord`] stating which method produced the
//! file (or why it is absent), so callers can tell a first-choice pdf from a
//! fallback one. Filenames are derived from the job title and suffixed with
//! a timestamp when the name is already taken.

mod minipdf;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;
use tracing::{debug, warn};

use crate::errors::TailorError;

// ─────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ArtifactFormat {
    Txt,
    Docx,
    Pdf,
}

impl ArtifactFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ArtifactFormat::Txt => "txt",
            ArtifactFormat::Docx => "docx",
            ArtifactFormat::Pdf => "pdf",
        }
    }
}

/// How an artifact came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WriteMethod {
    /// Plain filesystem write.
    Plain,
    /// Written by the configured codec.
    NativeCodec,
    /// Converted from another artifact by the codec.
    Converted,
    /// Rendered by the built-in PDF writer.
    DirectDraw,
}

/// Provenance for one output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    pub format: ArtifactFormat,
    /// `None` when the format could not be produced at all.
    pub method: Option<WriteMethod>,
    /// True when the first-choice method for this format did not happen,
    /// whether or not a fallback saved the day.
    pub degraded: bool,
    pub detail: String,
}

/// Paths and provenance for one packaged resume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactSet {
    pub txt: PathBuf,
    pub docx: Option<PathBuf>,
    pub pdf: Option<PathBuf>,
    pub records: Vec<StageRecord>,
}

impl ArtifactSet {
    /// Formats that did not come out of their first-choice method.
    pub fn degraded_formats(&self) -> Vec<ArtifactFormat> {
        self.records
            .iter()
            .filter(|r| r.degraded)
            .map(|r| r.format)
            .collect()
    }
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("codec unavailable: {0}")]
    Unavailable(String),
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}

/// External document machinery: writes rich formats and converts between
/// them. Implementations typically shell out to an office suite or call a
/// document library; the pipeline only cares that both operations can fail.
#[async_trait]
pub trait DocumentCodec: Send + Sync {
    /// Writes `text` as `format` at `target`, returning the path actually
    /// written (usually `target`).
    async fn write(
        &self,
        format: ArtifactFormat,
        text: &str,
        target: &Path,
    ) -> Result<PathBuf, CodecError>;

    /// Converts an existing artifact to `format`, returning the new path.
    async fn convert(&self, source: &Path, format: ArtifactFormat) -> Result<PathBuf, CodecError>;
}

// ─────────────────────────────────────────────
// Pipeline
// ─────────────────────────────────────────────

pub struct ArtifactPipeline {
    output_dir: PathBuf,
    codec: Option<Arc<dyn DocumentCodec>>,
}

impl ArtifactPipeline {
    pub fn new(output_dir: impl Into<PathBuf>, codec: Option<Arc<dyn DocumentCodec>>) -> Self {
        Self {
            output_dir: output_dir.into(),
            codec,
        }
    }

    /// Packages `text` into txt, docx and pdf under the output directory.
    pub async fn package(&self, job_title: &str, text: &str) -> Result<ArtifactSet, TailorError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| {
                TailorError::Artifact(format!(
                    "creating artifact directory {}: {e}",
                    self.output_dir.display()
                ))
            })?;

        let stem = slugify(job_title);
        let mut records = Vec::new();

        // txt is the floor: it must land on disk or the whole run fails.
        let txt_path = self.reserve_path(&stem, ArtifactFormat::Txt).await;
        tokio::fs::write(&txt_path, text).await.map_err(|e| {
            TailorError::Artifact(format!("writing {}: {e}", txt_path.display()))
        })?;
        records.push(StageRecord {
            format: ArtifactFormat::Txt,
            method: Some(WriteMethod::Plain),
            degraded: false,
            detail: txt_path.display().to_string(),
        });
        debug!(path = %txt_path.display(), "wrote txt artifact");

        let docx_path = self.write_docx(&stem, text, &mut records).await;
        let pdf_path = self
            .write_pdf(&stem, text, docx_path.as_deref(), &mut records)
            .await;

        Ok(ArtifactSet {
            txt: txt_path,
            docx: docx_path,
            pdf: pdf_path,
            records,
        })
    }

    async fn write_docx(
        &self,
        stem: &str,
        text: &str,
        records: &mut Vec<StageRecord>,
    ) -> Option<PathBuf> {
        let Some(codec) = &self.codec else {
            records.push(StageRecord {
                format: ArtifactFormat::Docx,
                method: None,
                degraded: true,
                detail: "no document codec configured".to_string(),
            });
            return None;
        };
        let target = self.reserve_path(stem, ArtifactFormat::Docx).await;
        match codec.write(ArtifactFormat::Docx, text, &target).await {
            Ok(path) => {
                debug!(path = %path.display(), "wrote docx artifact");
                records.push(StageRecord {
                    format: ArtifactFormat::Docx,
                    method: Some(WriteMethod::NativeCodec),
                    degraded: false,
                    detail: path.display().to_string(),
                });
                Some(path)
            }
            Err(e) => {
                warn!(error = %e, "docx stage failed, continuing without it");
                records.push(StageRecord {
                    format: ArtifactFormat::Docx,
                    method: None,
                    degraded: true,
                    detail: e.to_string(),
                });
                None
            }
        }
    }

    async fn write_pdf(
        &self,
        stem: &str,
        text: &str,
        docx: Option<&Path>,
        records: &mut Vec<StageRecord>,
    ) -> Option<PathBuf> {
        // First choice: convert the docx through the codec.
        if let (Some(codec), Some(docx)) = (&self.codec, docx) {
            match codec.convert(docx, ArtifactFormat::Pdf).await {
                Ok(path) => {
                    debug!(path = %path.display(), "converted docx to pdf");
                    records.push(StageRecord {
                        format: ArtifactFormat::Pdf,
                        method: Some(WriteMethod::Converted),
                        degraded: false,
                        detail: path.display().to_string(),
                    });
                    return Some(path);
                }
                Err(e) => {
                    warn!(error = %e, "pdf conversion failed, falling back to direct draw");
                }
            }
        }

        let target = self.reserve_path(stem, ArtifactFormat::Pdf).await;
        match tokio::fs::write(&target, minipdf::render(text)).await {
            Ok(()) => {
                debug!(path = %target.display(), "direct-drew pdf artifact");
                records.push(StageRecord {
                    format: ArtifactFormat::Pdf,
                    method: Some(WriteMethod::DirectDraw),
                    degraded: true,
                    detail: format!(
                        "converter unavailable, rendered with the built-in writer at {}",
                        target.display()
                    ),
                });
                Some(target)
            }
            Err(e) => {
                warn!(error = %e, "direct-draw pdf failed");
                records.push(StageRecord {
                    format: ArtifactFormat::Pdf,
                    method: None,
                    degraded: true,
                    detail: e.to_string(),
                });
                None
            }
        }
    }

    /// First free path for `stem.ext`; on collision, appends a UTC timestamp
    /// and then a counter.
    async fn reserve_path(&self, stem: &str, format: ArtifactFormat) -> PathBuf {
        let ext = format.extension();
        let plain = self.output_dir.join(format!("{stem}.{ext}"));
        if !path_exists(&plain).await {
            return plain;
        }
        let stamp = Utc::now().format("%Y%m%d%H%M%S");
        let stamped = self.output_dir.join(format!("{stem}-{stamp}.{ext}"));
        if !path_exists(&stamped).await {
            return stamped;
        }
        let mut n = 2u32;
        loop {
            let candidate = self.output_dir.join(format!("{stem}-{stamp}-{n}.{ext}"));
            if !path_exists(&candidate).await {
                return candidate;
            }
            n += 1;
        }
    }
}

async fn path_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Lowercased alphanumeric stem with underscores, never empty.
fn slugify(job_title: &str) -> String {
    let mut slug = String::new();
    let mut last_was_separator = true;
    for c in job_title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_separator = false;
        } else if !last_was_separator {
            slug.push('_');
            last_was_separator = true;
        }
    }
    let slug = slug.trim_end_matches('_').to_string();
    if slug.is_empty() {
        "tailored_resume".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct WorkingCodec;

    #[async_trait]
    impl DocumentCodec for WorkingCodec {
        async fn write(
            &self,
            _format: ArtifactFormat,
            text: &str,
            target: &Path,
        ) -> Result<PathBuf, CodecError> {
            tokio::fs::write(target, text).await?;
            Ok(target.to_path_buf())
        }

        async fn convert(
            &self,
            source: &Path,
            format: ArtifactFormat,
        ) -> Result<PathBuf, CodecError> {
            let target = source.with_extension(format.extension());
            tokio::fs::copy(source, &target).await?;
            Ok(target)
        }
    }

    struct BrokenCodec;

    #[async_trait]
    impl DocumentCodec for BrokenCodec {
        async fn write(
            &self,
            _format: ArtifactFormat,
            _text: &str,
            _target: &Path,
        ) -> Result<PathBuf, CodecError> {
            Err(CodecError::Unavailable("office suite not installed".into()))
        }

        async fn convert(
            &self,
            _source: &Path,
            _format: ArtifactFormat,
        ) -> Result<PathBuf, CodecError> {
            Err(CodecError::Unavailable("office suite not installed".into()))
        }
    }

    #[tokio::test]
    async fn test_full_chain_with_working_codec() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = ArtifactPipeline::new(dir.path(), Some(Arc::new(WorkingCodec)));
        let set = pipeline
            .package("Backend Engineer", "resume body")
            .await
            .unwrap();

        assert!(set.txt.exists());
        assert!(set.docx.as_ref().unwrap().exists());
        assert!(set.pdf.as_ref().unwrap().exists());
        assert!(set.degraded_formats().is_empty());
        assert_eq!(set.records.len(), 3);
    }

    #[tokio::test]
    async fn test_broken_codec_degrades_but_txt_survives() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = ArtifactPipeline::new(dir.path(), Some(Arc::new(BrokenCodec)));
        let set = pipeline.package("QA Lead", "resume body").await.unwrap();

        assert!(set.txt.exists());
        assert!(set.docx.is_none());
        // Direct draw still produces a pdf, marked degraded.
        let pdf = set.pdf.as_ref().expect("fallback pdf");
        assert!(pdf.exists());
        let degraded = set.degraded_formats();
        assert!(degraded.contains(&ArtifactFormat::Docx));
        assert!(degraded.contains(&ArtifactFormat::Pdf));
    }

    #[tokio::test]
    async fn test_no_codec_still_produces_txt_and_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = ArtifactPipeline::new(dir.path(), None);
        let set = pipeline.package("", "resume body").await.unwrap();

        assert!(set.txt.ends_with("tailored_resume.txt"));
        assert!(set.docx.is_none());
        assert!(set.pdf.is_some());
        let pdf_bytes = tokio::fs::read(set.pdf.unwrap()).await.unwrap();
        assert!(pdf_bytes.starts_with(b"%PDF-1.4"));
    }

    #[tokio::test]
    async fn test_collision_appends_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = ArtifactPipeline::new(dir.path(), None);
        let first = pipeline.package("Data Engineer", "v1").await.unwrap();
        let second = pipeline.package("Data Engineer", "v2").await.unwrap();

        assert_ne!(first.txt, second.txt);
        assert_eq!(
            tokio::fs::read_to_string(&first.txt).await.unwrap(),
            "v1"
        );
        assert_eq!(
            tokio::fs::read_to_string(&second.txt).await.unwrap(),
            "v2"
        );
        let name = second.txt.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("data_engineer-"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Backend Engineer"), "backend_engineer");
        assert_eq!(slugify("Sr. C++ Dev (Remote)"), "sr_c_dev_remote");
        assert_eq!(slugify("!!!"), "tailored_resume");
        assert_eq!(slugify(""), "tailored_resume");
    }
}
