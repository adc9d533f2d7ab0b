//! Error taxonomy for the tailoring core.

use thiserror::Error;

use crate::cache::Fingerprint;
use crate::quality::QualityReport;
use crate::queue::JobFailure;

#[derive(Debug, Error)]
pub enum TailorError {
    /// The generation backend failed. Fatal for the current job; the core
    /// never retries a failed generation internally.
    #[error("generation failed: {0}")]
    Generation(String),

    /// The reviewer collaborator failed.
    #[error("review failed: {0}")]
    Review(String),

    /// The refinement loops exhausted their budgets without clearing the
    /// quality gate. Carries the best report and text seen so callers can
    /// accept a best-effort result if they choose.
    #[error("quality gate not met: {reason}")]
    QualityGate {
        reason: String,
        report: Box<QualityReport>,
        best_text: String,
    },

    /// Every output stage failed, including plain text.
    #[error("artifact packaging failed: {0}")]
    Artifact(String),

    /// Cache directory could not be read or written.
    #[error("cache I/O failed: {0}")]
    Cache(#[from] std::io::Error),

    /// No backend is registered under the requested provider id.
    #[error("no generation backend registered for provider '{0}'")]
    UnknownProvider(String),

    /// The fingerprint is not queued, not running, and not cached.
    #[error("unknown fingerprint {0}")]
    UnknownFingerprint(Fingerprint),

    /// The submission channel is full; the job was not accepted.
    #[error("tailoring queue is saturated")]
    QueueSaturated,

    /// An asynchronous job ran and failed; the stored failure is attached.
    #[error("tailoring job failed: {}", .0.reason)]
    JobFailed(JobFailure),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
