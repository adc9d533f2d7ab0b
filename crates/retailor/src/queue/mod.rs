//! Background tailoring queue.
//!
//! A bounded submission channel feeding one worker task, plus an in-memory
//! map of live jobs keyed by fingerprint. The map is what makes submission
//! idempotent: an identical request arriving while its twin is queued or
//! running gets the existing handle instead of a second slot, so duplicate
//! submissions never cause duplicate work.
//!
//! State flows through a `watch` channel per job, which gives `wait` cheap
//! timeout-based polling without busy loops. Retrieving a terminal state
//! removes the job from the map; later polls for that fingerprint are served
//! from the cache by the service layer.
//!
//! Submission never blocks. A full channel is an explicit
//! [`TailorError::QueueSaturated`] and the caller decides what to do about
//! backpressure.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::cache::Fingerprint;
use crate::errors::TailorError;
use crate::quality::QualityReport;
use crate::refine::{TailorRequest, TailoringResult};

/// Stored form of a failed job: enough to explain the failure and let the
/// caller salvage the best attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobFailure {
    pub reason: String,
    pub report: Option<QualityReport>,
    pub best_text: Option<String>,
}

impl JobFailure {
    fn from_error(err: &TailorError) -> Self {
        match err {
            TailorError::QualityGate {
                reason,
                report,
                best_text,
            } => JobFailure {
                reason: reason.clone(),
                report: Some(report.as_ref().clone()),
                best_text: Some(best_text.clone()),
            },
            other => JobFailure {
                reason: other.to_string(),
                report: None,
                best_text: None,
            },
        }
    }
}

/// Lifecycle of one queued job.
#[derive(Debug, Clone)]
pub enum JobState {
    Queued,
    Running,
    Done(TailoringResult),
    Failed(JobFailure),
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done(_) | JobState::Failed(_))
    }

    fn label(&self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::Running => "running",
            JobState::Done(_) => "done",
            JobState::Failed(_) => "failed",
        }
    }
}

struct QueuedJob {
    fingerprint: Fingerprint,
    request: TailorRequest,
}

type PendingMap = HashMap<Fingerprint, watch::Sender<JobState>>;

/// Bounded single-worker queue with fingerprint deduplication.
pub struct JobQueue {
    pending: Arc<Mutex<PendingMap>>,
    submit_tx: mpsc::Sender<QueuedJob>,
}

impl JobQueue {
    /// Starts the worker task and returns the queue. Must be called inside a
    /// Tokio runtime. `runner` executes one request to completion; the queue
    /// owns state bookkeeping around it.
    pub fn new<F, Fut>(capacity: usize, runner: F) -> Self
    where
        F: Fn(TailorRequest) -> Fut + Send + 'static,
        Fut: Future<Output = Result<TailoringResult, TailorError>> + Send + 'static,
    {
        let capacity = capacity.max(1);
        let (submit_tx, mut submit_rx) = mpsc::channel::<QueuedJob>(capacity);
        let pending: Arc<Mutex<PendingMap>> = Arc::new(Mutex::new(HashMap::new()));

        let worker_pending = Arc::clone(&pending);
        tokio::spawn(async move {
            while let Some(job) = submit_rx.recv().await {
                let fingerprint = job.fingerprint;
                update_state(&worker_pending, &fingerprint, JobState::Running);
                info!(%fingerprint, "tailoring job started");

                let state = match runner(job.request).await {
                    Ok(result) => JobState::Done(result),
                    Err(e) => {
                        error!(%fingerprint, error = %e, "tailoring job failed");
                        JobState::Failed(JobFailure::from_error(&e))
                    }
                };
                info!(%fingerprint, state = state.label(), "tailoring job finished");
                update_state(&worker_pending, &fingerprint, state);
            }
            debug!("tailoring worker shut down");
        });

        Self { pending, submit_tx }
    }

    /// Enqueues a request, deduplicating on its fingerprint. Returns the
    /// fingerprint to poll. Never blocks.
    pub fn submit(&self, request: TailorRequest) -> Result<Fingerprint, TailorError> {
        let fingerprint = request.fingerprint();

        {
            let mut pending = lock_pending(&self.pending);
            if pending.contains_key(&fingerprint) {
                debug!(%fingerprint, "identical job already tracked, reusing its handle");
                return Ok(fingerprint);
            }
            let (state_tx, _) = watch::channel(JobState::Queued);
            pending.insert(fingerprint.clone(), state_tx);
        }

        match self.submit_tx.try_send(QueuedJob {
            fingerprint: fingerprint.clone(),
            request,
        }) {
            Ok(()) => {
                info!(%fingerprint, "tailoring job queued");
                Ok(fingerprint)
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                lock_pending(&self.pending).remove(&fingerprint);
                warn!(%fingerprint, "submission rejected, queue is saturated");
                Err(TailorError::QueueSaturated)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                lock_pending(&self.pending).remove(&fingerprint);
                Err(anyhow::anyhow!("tailoring worker has shut down").into())
            }
        }
    }

    /// Waits up to `timeout` for the job to reach a terminal state.
    ///
    /// `None` means the fingerprint is not tracked here (finished earlier or
    /// never submitted). A terminal state is removed from the map on the way
    /// out; the caller owns the returned value.
    pub async fn wait(&self, fingerprint: &Fingerprint, timeout: Duration) -> Option<JobState> {
        let mut state_rx = lock_pending(&self.pending).get(fingerprint)?.subscribe();

        let deadline = Instant::now() + timeout;
        loop {
            let state = state_rx.borrow_and_update().clone();
            if state.is_terminal() {
                lock_pending(&self.pending).remove(fingerprint);
                debug!(%fingerprint, "terminal job handed to caller");
                return Some(state);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Some(state);
            }
            match tokio::time::timeout(remaining, state_rx.changed()).await {
                Ok(Ok(())) => continue,
                // Sender dropped: another poller collected the terminal
                // state first. The receiver still holds the last value.
                Ok(Err(_)) => {
                    let state = state_rx.borrow().clone();
                    return Some(state);
                }
                Err(_elapsed) => {
                    let state = state_rx.borrow().clone();
                    return Some(state);
                }
            }
        }
    }

    /// Number of jobs currently tracked (queued or running, plus finished
    /// ones nobody has collected yet).
    pub fn depth(&self) -> usize {
        lock_pending(&self.pending).len()
    }
}

fn update_state(pending: &Mutex<PendingMap>, fingerprint: &Fingerprint, state: JobState) {
    if let Some(state_tx) = lock_pending(pending).get(fingerprint) {
        state_tx.send_replace(state);
    }
}

fn lock_pending(pending: &Mutex<PendingMap>) -> MutexGuard<'_, PendingMap> {
    pending.lock().expect("pending job map mutex poisoned")
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::artifacts::ArtifactSet;
    use crate::quality;
    use crate::scoring;

    fn request(marker: &str) -> TailorRequest {
        TailorRequest {
            resume_text: format!("Experience\nSkills: {marker}"),
            jd_text: "Python required".to_string(),
            instructions: String::new(),
            provider: "stub".to_string(),
            job_title: "Engineer".to_string(),
            max_review_iterations: None,
            max_reviewer_passes: None,
        }
    }

    fn result_for(text: &str) -> TailoringResult {
        let profile = crate::profile::analyze_jd("Python");
        TailoringResult {
            final_text: text.to_string(),
            artifacts: ArtifactSet {
                txt: "out.txt".into(),
                docx: None,
                pdf: None,
                records: vec![],
            },
            score_before: scoring::score_against_profile("", &profile),
            score_after: scoring::score_against_profile(text, &profile),
            report: quality::evaluate("", text, &profile),
            review_log: vec![],
        }
    }

    #[tokio::test]
    async fn test_submit_run_and_wait() {
        let queue = JobQueue::new(4, |req| async move { Ok(result_for(&req.resume_text)) });
        let fingerprint = queue.submit(request("alpha")).expect("accepted");

        let state = queue
            .wait(&fingerprint, Duration::from_secs(5))
            .await
            .expect("tracked");
        match state {
            JobState::Done(result) => assert!(result.final_text.contains("alpha")),
            other => panic!("expected done, got {}", other.label()),
        }
        // Terminal retrieval removes the slot.
        assert_eq!(queue.depth(), 0);
        assert!(queue.wait(&fingerprint, Duration::from_millis(10)).await.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_submission_runs_once() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let queue = JobQueue::new(4, move |req| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(result_for(&req.resume_text))
            }
        });

        let first = queue.submit(request("beta")).expect("accepted");
        let second = queue.submit(request("beta")).expect("deduplicated");
        assert_eq!(first, second);

        let state = queue.wait(&first, Duration::from_secs(5)).await.expect("tracked");
        assert!(state.is_terminal());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_wait_times_out_with_live_state() {
        let queue = JobQueue::new(4, |req| async move {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(result_for(&req.resume_text))
        });
        let fingerprint = queue.submit(request("gamma")).expect("accepted");

        let state = queue
            .wait(&fingerprint, Duration::from_millis(50))
            .await
            .expect("tracked");
        assert!(!state.is_terminal());
        // Still tracked for a later poll.
        assert_eq!(queue.depth(), 1);
    }

    #[tokio::test]
    async fn test_saturated_queue_rejects() {
        // Worker parks on the first job; capacity one fills with the second.
        let queue = JobQueue::new(1, |req| async move {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(result_for(&req.resume_text))
        });

        queue.submit(request("one")).expect("accepted");
        // Give the worker a beat to pull the first job off the channel.
        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.submit(request("two")).expect("buffered");
        let err = queue.submit(request("three")).expect_err("full");
        assert!(matches!(err, TailorError::QueueSaturated));
        // The rejected fingerprint is not left dangling in the map.
        assert_eq!(queue.depth(), 2);
    }

    #[tokio::test]
    async fn test_failed_job_reports_failure() {
        let queue = JobQueue::new(4, |_req| async move {
            Err(TailorError::Generation("backend melted".to_string()))
        });
        let fingerprint = queue.submit(request("delta")).expect("accepted");

        let state = queue.wait(&fingerprint, Duration::from_secs(5)).await.expect("tracked");
        match state {
            JobState::Failed(failure) => {
                assert!(failure.reason.contains("backend melted"));
                assert!(failure.report.is_none());
            }
            other => panic!("expected failed, got {}", other.label()),
        }
    }
}
