//! The tailoring service facade.
//!
//! [`RefinementService`] is the explicit composition root: profiling, scoring,
//! the refinement loops, caching, the background queue and artifact packaging
//! behind one struct. Hosts construct it with their own generator registry,
//! reviewer and document codec; nothing in here is global state.
//!
//! Synchronous callers use [`RefinementService::tailor`]; fire-and-poll
//! callers use [`RefinementService::submit`] and [`RefinementService::poll`].
//! Both paths share one [`ContentCache`], so a cached fingerprint never
//! reaches the generator again no matter which door it comes through.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::artifacts::{ArtifactPipeline, DocumentCodec};
use crate::cache::{ContentCache, Fingerprint};
use crate::config::TailorConfig;
use crate::errors::TailorError;
use crate::generator::GeneratorRegistry;
use crate::profile::{self, JobDescriptionProfile};
use crate::quality::{self, QualityReport};
use crate::queue::{JobQueue, JobState};
use crate::refine::reviewer::{Reviewer, RubricReviewer};
use crate::refine::{self, TailorRequest, TailoringResult};
use crate::scoring::{self, MatchScore};

/// What a poll observed within its timeout.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    Ready(TailoringResult),
    Pending,
}

impl PollOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, PollOutcome::Ready(_))
    }
}

/// Executes one request end to end: cache check, refinement, packaging,
/// cache fill. Shared by the synchronous path and the queue worker.
struct Engine {
    config: TailorConfig,
    cache: ContentCache,
    registry: GeneratorRegistry,
    reviewer: Arc<dyn Reviewer>,
    pipeline: ArtifactPipeline,
}

impl Engine {
    async fn run(&self, request: TailorRequest) -> Result<TailoringResult, TailorError> {
        let fingerprint = request.fingerprint();
        if let Some(hit) = self.cache.load(&fingerprint).await? {
            info!(%fingerprint, "serving tailoring result from cache");
            return Ok(hit);
        }

        let generator = self
            .registry
            .get(&request.provider)
            .ok_or_else(|| TailorError::UnknownProvider(request.provider.clone()))?;

        let request = self.with_default_bounds(request);
        let outcome =
            refine::refine_resume(generator.as_ref(), self.reviewer.as_ref(), &request).await?;
        let artifacts = self
            .pipeline
            .package(&request.job_title, &outcome.final_text)
            .await?;

        let result = TailoringResult {
            final_text: outcome.final_text,
            artifacts,
            score_before: outcome.score_before,
            score_after: outcome.score_after,
            report: outcome.report,
            review_log: outcome.review_log,
        };
        self.cache.store(&fingerprint, &result).await?;
        info!(
            %fingerprint,
            score = result.score_after.weighted_score,
            grade = %result.report.grade,
            "tailoring complete"
        );
        Ok(result)
    }

    fn with_default_bounds(&self, mut request: TailorRequest) -> TailorRequest {
        request.max_review_iterations = Some(
            request
                .max_review_iterations
                .unwrap_or(self.config.max_review_iterations),
        );
        request.max_reviewer_passes = Some(
            request
                .max_reviewer_passes
                .unwrap_or(self.config.max_reviewer_passes),
        );
        request
    }
}

/// The crate's front door.
pub struct RefinementService {
    engine: Arc<Engine>,
    queue: JobQueue,
}

impl RefinementService {
    /// Builds the service and spawns its worker task. Must be called inside
    /// a Tokio runtime.
    pub fn new(
        config: TailorConfig,
        registry: GeneratorRegistry,
        reviewer: Arc<dyn Reviewer>,
        codec: Option<Arc<dyn DocumentCodec>>,
    ) -> Self {
        let queue_capacity = config.queue_capacity;
        let engine = Arc::new(Engine {
            cache: ContentCache::new(&config.cache_dir),
            pipeline: ArtifactPipeline::new(&config.artifact_dir, codec),
            registry,
            reviewer,
            config,
        });

        let worker_engine = Arc::clone(&engine);
        let queue = JobQueue::new(queue_capacity, move |request| {
            let engine = Arc::clone(&worker_engine);
            async move { engine.run(request).await }
        });

        Self { engine, queue }
    }

    /// Convenience constructor using the deterministic rubric reviewer and
    /// no document codec.
    pub fn with_rubric_reviewer(config: TailorConfig, registry: GeneratorRegistry) -> Self {
        Self::new(config, registry, Arc::new(RubricReviewer), None)
    }

    pub fn config(&self) -> &TailorConfig {
        &self.engine.config
    }

    /// Profiles a job description. Pure; no generator involved.
    pub fn analyze_jd(&self, jd_text: &str) -> JobDescriptionProfile {
        profile::analyze_jd(jd_text)
    }

    /// Scores a resume against a job description. Pure; no generator
    /// involved.
    pub fn score(&self, resume_text: &str, jd_text: &str) -> MatchScore {
        scoring::score(resume_text, jd_text)
    }

    /// Runs the quality rubric over a candidate without tailoring anything.
    pub fn evaluate(&self, original: &str, candidate: &str, jd_text: &str) -> QualityReport {
        let profile = profile::analyze_jd(jd_text);
        quality::evaluate(original, candidate, &profile)
    }

    /// Tailors synchronously: blocks until the result (or error) is in hand.
    pub async fn tailor(&self, request: TailorRequest) -> Result<TailoringResult, TailorError> {
        self.engine.run(request).await
    }

    /// Enqueues a tailoring job and returns its fingerprint. Never blocks;
    /// a saturated queue is an error. Identical requests already queued or
    /// running share one slot.
    pub fn submit(&self, request: TailorRequest) -> Result<Fingerprint, TailorError> {
        if !self.engine.registry.contains(&request.provider) {
            return Err(TailorError::UnknownProvider(request.provider.clone()));
        }
        self.queue.submit(request)
    }

    /// Waits up to `timeout` for a submitted job. Finished jobs are handed
    /// out once from the queue and afterwards served from the cache; a
    /// fingerprint that is neither tracked nor cached is unknown.
    pub async fn poll(
        &self,
        fingerprint: &Fingerprint,
        timeout: Duration,
    ) -> Result<PollOutcome, TailorError> {
        match self.queue.wait(fingerprint, timeout).await {
            Some(JobState::Done(result)) => Ok(PollOutcome::Ready(result)),
            Some(JobState::Failed(failure)) => Err(TailorError::JobFailed(failure)),
            Some(_) => Ok(PollOutcome::Pending),
            None => match self.engine.cache.load(fingerprint).await? {
                Some(result) => Ok(PollOutcome::Ready(result)),
                None => Err(TailorError::UnknownFingerprint(fingerprint.clone())),
            },
        }
    }

    /// Jobs currently tracked by the queue.
    pub fn queue_depth(&self) -> usize {
        self.queue.depth()
    }

    pub async fn is_cached(&self, fingerprint: &Fingerprint) -> bool {
        self.engine.cache.contains(fingerprint).await
    }

    /// Empties the result cache, returning how many entries were removed.
    pub async fn purge_cache(&self) -> Result<usize, TailorError> {
        self.engine.cache.purge().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_submit_rejects_unknown_provider() {
        let dir = tempfile::tempdir().unwrap();
        let config = TailorConfig {
            cache_dir: dir.path().join("cache"),
            artifact_dir: dir.path().join("artifacts"),
            ..TailorConfig::default()
        };
        let service = RefinementService::with_rubric_reviewer(config, GeneratorRegistry::new());

        let request = TailorRequest {
            resume_text: "resume".to_string(),
            jd_text: "jd".to_string(),
            instructions: String::new(),
            provider: "nobody-registered-this".to_string(),
            job_title: String::new(),
            max_review_iterations: None,
            max_reviewer_passes: None,
        };
        let err = service.submit(request).expect_err("provider unknown");
        assert!(matches!(err, TailorError::UnknownProvider(p) if p == "nobody-registered-this"));
    }

    #[tokio::test]
    async fn test_poll_unknown_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let config = TailorConfig {
            cache_dir: dir.path().join("cache"),
            artifact_dir: dir.path().join("artifacts"),
            ..TailorConfig::default()
        };
        let service = RefinementService::with_rubric_reviewer(config, GeneratorRegistry::new());

        let fingerprint = Fingerprint::compute("r", "j", "i", "p", "t");
        let err = service
            .poll(&fingerprint, Duration::from_millis(10))
            .await
            .expect_err("nothing queued or cached");
        assert!(matches!(err, TailorError::UnknownFingerprint(_)));
    }

    #[tokio::test]
    async fn test_pure_operations_need_no_backend() {
        let dir = tempfile::tempdir().unwrap();
        let config = TailorConfig {
            cache_dir: dir.path().join("cache"),
            artifact_dir: dir.path().join("artifacts"),
            ..TailorConfig::default()
        };
        let service = RefinementService::with_rubric_reviewer(config, GeneratorRegistry::new());

        let profile = service.analyze_jd("Requirements: Python and AWS");
        assert_eq!(profile.high_priority, vec!["Python", "AWS"]);

        let score = service.score("Python on AWS", "Requirements: Python and AWS");
        assert_eq!(score.weighted_score, 100.0);

        let report = service.evaluate("", "no structure at all", "Requirements: Python");
        assert!(report.should_retry());
    }
}
