//! retailor: a resume tailoring refinement engine.
//!
//! Give it a resume, a job description and a generation backend; it profiles
//! the JD, scores the match, rewrites the resume through bounded
//! generate-score-retry loops with an independent reviewer gate, then
//! packages the accepted text as txt/docx/pdf artifacts. Results are cached
//! by a content fingerprint so identical requests are never generated twice,
//! and a bounded background queue with deduplication serves fire-and-poll
//! callers.
//!
//! The deterministic parts (profiling, scoring, the quality rubric) run with
//! no model in the loop; the generator and reviewer are traits the host
//! plugs in. See [`RefinementService`] for the front door.

pub mod artifacts;
pub mod cache;
pub mod config;
pub mod errors;
pub mod generator;
pub mod profile;
pub mod quality;
pub mod queue;
pub mod refine;
pub mod scoring;
pub mod service;
pub mod telemetry;

pub use artifacts::{ArtifactFormat, ArtifactSet, CodecError, DocumentCodec, WriteMethod};
pub use cache::{ContentCache, Fingerprint};
pub use config::TailorConfig;
pub use errors::TailorError;
pub use generator::{Generator, GeneratorError, GeneratorRegistry};
pub use profile::{JobDescriptionProfile, Priority, SeniorityLevel, SkillCategory};
pub use quality::{Grade, QualityReport};
pub use queue::{JobFailure, JobState};
pub use refine::reviewer::{Reviewer, ReviewerError, ReviewerVerdict, RubricReviewer};
pub use refine::{ReviewPassRecord, ReviewPhase, TailorRequest, TailoringResult};
pub use scoring::MatchScore;
pub use service::{PollOutcome, RefinementService};
