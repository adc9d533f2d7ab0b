//! Refinement orchestration.
//!
//! Two bounded loops around the generation seam:
//!
//! 1. The tailoring loop. Generate a candidate, run the quality rubric, stop
//!    when [`QualityReport::should_retry`] clears or the iteration budget is
//!    spent. Each retry feeds the previous pass's missing keywords and issues
//!    back into the instructions, and rewrites the newest candidate rather
//!    than the original resume.
//! 2. The reviewer loop. An independent [`Reviewer`] judges the accepted
//!    candidate; each rejection triggers one fix regeneration, up to its own
//!    budget.
//!
//! Generator invocations are therefore bounded by the two budgets added
//! together. A budget of zero is treated as one: every request gets at least
//! one real tailoring pass.
//!
//! If the reviewer budget runs out without a passing verdict the whole run
//! fails with [`TailorError::QualityGate`], carrying the best-scoring text
//! and report seen anywhere in the run so the caller can still accept a
//! best-effort result.

pub mod prompts;
pub mod reviewer;

use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::{debug, info};

use crate::artifacts::ArtifactSet;
use crate::cache::Fingerprint;
use crate::config::{DEFAULT_MAX_REVIEWER_PASSES, DEFAULT_MAX_REVIEW_ITERATIONS};
use crate::errors::TailorError;
use crate::generator::Generator;
use crate::profile;
use crate::quality::{self, QualityReport};
use crate::refine::reviewer::{Reviewer, REVIEWER_PASS_SCORE, REVIEWER_RELAXED_SCORE};
use crate::scoring::{self, MatchScore};

// ─────────────────────────────────────────────
// Request and result types
// ─────────────────────────────────────────────

/// One tailoring request. The first five fields are the request's identity
/// for caching and deduplication; the bounds are execution knobs and do not
/// affect the fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TailorRequest {
    pub resume_text: String,
    pub jd_text: String,
    #[serde(default)]
    pub instructions: String,
    pub provider: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub max_review_iterations: Option<u32>,
    #[serde(default)]
    pub max_reviewer_passes: Option<u32>,
}

impl TailorRequest {
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::compute(
            &self.resume_text,
            &self.jd_text,
            &self.instructions,
            &self.provider,
            &self.job_title,
        )
    }
}

/// Which loop produced a [`ReviewPassRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReviewPhase {
    Tailoring,
    Reviewer,
}

/// One entry in the refinement audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewPassRecord {
    /// 1-based index within the phase.
    pub iteration: u32,
    pub phase: ReviewPhase,
    pub score: f64,
    pub critical_issues: usize,
    /// Issues from the previous pass of the same phase no longer present.
    pub auto_fixed: usize,
    pub passed: bool,
}

/// Everything the refinement loops produced, before packaging.
#[derive(Debug, Clone)]
pub struct RefinementOutcome {
    pub final_text: String,
    pub score_before: MatchScore,
    pub score_after: MatchScore,
    pub report: QualityReport,
    pub review_log: Vec<ReviewPassRecord>,
    /// Ordered rubric reports, one per quality evaluation in the run.
    pub report_history: Vec<QualityReport>,
}

/// The caller-facing result of a completed tailoring job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TailoringResult {
    pub final_text: String,
    pub artifacts: ArtifactSet,
    pub score_before: MatchScore,
    pub score_after: MatchScore,
    pub report: QualityReport,
    pub review_log: Vec<ReviewPassRecord>,
}

/// Internal state machine, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
enum RefinementState {
    Init,
    Tailoring,
    Scoring,
    Accepted,
    Retrying,
    ReviewerPass,
    ReviewerAccepted,
    ReviewerRetrying,
    Succeeded,
    Failed,
}

fn advance(state: &mut RefinementState, next: RefinementState) {
    debug!(from = %state, to = %next, "refinement state");
    *state = next;
}

// ─────────────────────────────────────────────
// Orchestration
// ─────────────────────────────────────────────

/// Runs the full two-loop refinement for one request.
pub async fn refine_resume(
    generator: &dyn Generator,
    reviewer: &dyn Reviewer,
    request: &TailorRequest,
) -> Result<RefinementOutcome, TailorError> {
    let max_iterations = request
        .max_review_iterations
        .unwrap_or(DEFAULT_MAX_REVIEW_ITERATIONS)
        .max(1);
    let max_reviewer_passes = request
        .max_reviewer_passes
        .unwrap_or(DEFAULT_MAX_REVIEWER_PASSES)
        .max(1);

    let profile = profile::analyze_jd(&request.jd_text);
    let score_before = scoring::score_against_profile(&request.resume_text, &profile);

    let mut state = RefinementState::Init;
    let mut review_log: Vec<ReviewPassRecord> = Vec::new();
    let mut report_history: Vec<QualityReport> = Vec::new();
    // Highest-composite (text, report) pair seen anywhere in the run.
    let mut best: Option<(String, QualityReport)> = None;

    // Loop 1: tailoring until the rubric clears or the budget is spent.
    let mut base_text = request.resume_text.clone();
    let mut instructions = request.instructions.clone();
    let mut carried: Option<(String, QualityReport)> = None;

    for iteration in 1..=max_iterations {
        advance(&mut state, RefinementState::Tailoring);
        let prompt = prompts::build_tailor_prompt(&base_text, &request.jd_text, &instructions);
        let candidate = generator
            .generate(&prompt)
            .await
            .map_err(|e| TailorError::Generation(e.to_string()))?;

        advance(&mut state, RefinementState::Scoring);
        let report = quality::evaluate(&request.resume_text, &candidate, &profile);
        let auto_fixed = report_history
            .last()
            .map(|prev| prev.issue_count().saturating_sub(report.issue_count()))
            .unwrap_or(0);
        report_history.push(report.clone());

        let passed = !report.should_retry();
        review_log.push(ReviewPassRecord {
            iteration,
            phase: ReviewPhase::Tailoring,
            score: report.composite_score,
            critical_issues: report.critical_issues.len(),
            auto_fixed,
            passed,
        });
        info!(
            iteration,
            score = report.composite_score,
            grade = %report.grade,
            criticals = report.critical_issues.len(),
            passed,
            "tailoring pass scored"
        );

        if best
            .as_ref()
            .map_or(true, |(_, b)| report.composite_score > b.composite_score)
        {
            best = Some((candidate.clone(), report.clone()));
        }

        if passed {
            advance(&mut state, RefinementState::Accepted);
            carried = Some((candidate, report));
            break;
        }
        if iteration == max_iterations {
            // Budget spent; the best attempt goes to the reviewer anyway.
            advance(&mut state, RefinementState::Accepted);
            carried = best.clone();
            break;
        }

        advance(&mut state, RefinementState::Retrying);
        instructions = format!(
            "{}\n\n{}",
            request.instructions,
            prompts::build_retry_feedback(&report)
        );
        base_text = candidate;
    }

    let (mut current_text, mut current_report) = carried
        .ok_or_else(|| anyhow::anyhow!("tailoring loop completed without producing a candidate"))?;

    // Loop 2: independent reviewer with its own regeneration budget.
    let mut regenerations = 0u32;
    let mut prev_reviewer_criticals: Option<usize> = None;
    loop {
        advance(&mut state, RefinementState::ReviewerPass);
        let verdict = reviewer
            .review(&current_text, &request.resume_text, &profile)
            .await
            .map_err(|e| TailorError::Review(e.to_string()))?;

        let passed = verdict.passes();
        review_log.push(ReviewPassRecord {
            iteration: regenerations + 1,
            phase: ReviewPhase::Reviewer,
            score: verdict.overall_score,
            critical_issues: verdict.critical_issues.len(),
            auto_fixed: prev_reviewer_criticals
                .map(|prev| prev.saturating_sub(verdict.critical_issues.len()))
                .unwrap_or(0),
            passed,
        });
        info!(
            pass = regenerations + 1,
            score = verdict.overall_score,
            criticals = verdict.critical_issues.len(),
            passed,
            "reviewer pass scored"
        );

        if passed {
            advance(&mut state, RefinementState::ReviewerAccepted);
            break;
        }
        if regenerations >= max_reviewer_passes {
            advance(&mut state, RefinementState::Failed);
            let (best_text, best_report) = best.ok_or_else(|| {
                anyhow::anyhow!("no candidate was evaluated before the reviewer gate")
            })?;
            return Err(TailorError::QualityGate {
                reason: format!(
                    "reviewer score {:.0} after {} fix passes (needs {:.0} clean, or {:.0} with a single advisory issue)",
                    verdict.overall_score,
                    regenerations,
                    REVIEWER_PASS_SCORE,
                    REVIEWER_RELAXED_SCORE
                ),
                report: Box::new(best_report),
                best_text,
            });
        }

        advance(&mut state, RefinementState::ReviewerRetrying);
        regenerations += 1;
        prev_reviewer_criticals = Some(verdict.critical_issues.len());
        let fix_instructions = format!(
            "{}\n\n{}",
            request.instructions,
            prompts::build_reviewer_feedback(&verdict)
        );
        let prompt =
            prompts::build_tailor_prompt(&current_text, &request.jd_text, &fix_instructions);
        current_text = generator
            .generate(&prompt)
            .await
            .map_err(|e| TailorError::Generation(e.to_string()))?;
        current_report = quality::evaluate(&request.resume_text, &current_text, &profile);
        report_history.push(current_report.clone());
        if best
            .as_ref()
            .map_or(true, |(_, b)| current_report.composite_score > b.composite_score)
        {
            best = Some((current_text.clone(), current_report.clone()));
        }
    }

    advance(&mut state, RefinementState::Succeeded);
    let score_after = scoring::score_against_profile(&current_text, &profile);
    info!(
        score_before = score_before.weighted_score,
        score_after = score_after.weighted_score,
        passes = review_log.len(),
        "refinement complete"
    );

    Ok(RefinementOutcome {
        final_text: current_text,
        score_before,
        score_after,
        report: current_report,
        review_log,
        report_history,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::reviewer::RubricReviewer;
    use super::*;
    use crate::generator::GeneratorError;

    const JD: &str = "Requirements: Python, Django, PostgreSQL, AWS";

    fn request(max_iterations: u32, max_passes: u32) -> TailorRequest {
        TailorRequest {
            resume_text: "Experience\n- Built web tools\nSkills: spreadsheets".to_string(),
            jd_text: JD.to_string(),
            instructions: String::new(),
            provider: "scripted".to_string(),
            job_title: "Backend Engineer".to_string(),
            max_review_iterations: Some(max_iterations),
            max_reviewer_passes: Some(max_passes),
        }
    }

    /// A resume that clears the rubric and the reviewer in one pass.
    fn polished_resume() -> String {
        let mut lines = vec![
            "Jane Doe".to_string(),
            "jane@example.com | (555) 123-4567".to_string(),
            String::new(),
            "Summary".to_string(),
            "Backend engineer with eight years building Python platforms on AWS for consumer products.".to_string(),
            String::new(),
            "Experience".to_string(),
            "Acme Corp, Senior Backend Engineer, 2019 to present".to_string(),
        ];
        for i in 0..6 {
            let tech = if i % 3 == 0 { "Django" } else { "the platform" };
            lines.push(format!(
                "- Designed and shipped {tech} checkout component {i} that reduced page latency for millions of weekly shoppers",
            ));
        }
        lines.push("Initech, Backend Engineer, 2015 to 2019".to_string());
        for i in 0..6 {
            let tech = if i % 3 == 0 { "PostgreSQL" } else { "internal" };
            lines.push(format!(
                "- Built and automated {tech} reporting pipeline {i} that improved analyst turnaround from days to hours across teams",
            ));
        }
        lines.push(String::new());
        lines.push("Skills: Python, Django, PostgreSQL, AWS".to_string());
        lines.push(String::new());
        lines.push("Education".to_string());
        lines.push("B.S. Computer Science, State University, 2015".to_string());
        lines.join("\n")
    }

    struct Scripted {
        responses: Mutex<Vec<String>>,
        prompts: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(responses: Vec<String>) -> Self {
            Self {
                responses: Mutex::new(responses),
                prompts: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn prompt(&self, index: usize) -> String {
            self.prompts.lock().unwrap()[index].clone()
        }
    }

    #[async_trait]
    impl Generator for Scripted {
        async fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            let mut responses = self.responses.lock().unwrap();
            if responses.len() > 1 {
                Ok(responses.remove(0))
            } else {
                Ok(responses[0].clone())
            }
        }
    }

    struct Failing;

    #[async_trait]
    impl Generator for Failing {
        async fn generate(&self, _prompt: &str) -> Result<String, GeneratorError> {
            Err(GeneratorError::Unavailable("socket closed".to_string()))
        }
    }

    #[tokio::test]
    async fn test_accepts_on_first_pass_when_rubric_clears() {
        let generator = Scripted::new(vec![polished_resume()]);
        let outcome = refine_resume(&generator, &RubricReviewer, &request(3, 2))
            .await
            .expect("polished text passes in one round");

        assert_eq!(generator.calls(), 1);
        assert_eq!(outcome.review_log.len(), 2);
        assert_eq!(outcome.review_log[0].phase, ReviewPhase::Tailoring);
        assert!(outcome.review_log[0].passed);
        assert_eq!(outcome.review_log[1].phase, ReviewPhase::Reviewer);
        assert!(outcome.review_log[1].passed);
        assert_eq!(outcome.score_after.weighted_score, 100.0);
        assert!(outcome.score_after.weighted_score > outcome.score_before.weighted_score);
    }

    #[tokio::test]
    async fn test_retry_feedback_rewrites_previous_output() {
        let weak = "Experience\n- Improved Python tooling\nSkills: Python, UNIQUE-MARKER".to_string();
        let generator = Scripted::new(vec![weak.clone(), polished_resume()]);
        let outcome = refine_resume(&generator, &RubricReviewer, &request(3, 2))
            .await
            .expect("second pass clears");

        assert_eq!(generator.calls(), 2);
        let second_prompt = generator.prompt(1);
        // The retry rewrites the previous candidate, not the original resume.
        assert!(second_prompt.contains("UNIQUE-MARKER"));
        // And its feedback names a keyword the weak pass missed.
        assert!(second_prompt.contains("AWS"));
        assert!(!outcome.review_log[0].passed);
        assert!(outcome.review_log[1].passed);
    }

    #[tokio::test]
    async fn test_generator_calls_bounded_by_both_budgets() {
        let generator = Scripted::new(vec!["nothing useful here".to_string()]);
        let err = refine_resume(&generator, &RubricReviewer, &request(2, 2))
            .await
            .expect_err("garbage never clears the gate");

        assert_eq!(generator.calls(), 4);
        match err {
            TailorError::QualityGate { report, .. } => {
                assert!(report.should_retry());
            }
            other => panic!("expected QualityGate, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_quality_gate_carries_best_attempt() {
        let bare = "keyboard mouse monitor".to_string();
        let better = "Experience\n- Built tools\nSkills: typing BEST-ATTEMPT".to_string();
        let generator = Scripted::new(vec![bare.clone(), better, bare]);
        let err = refine_resume(&generator, &RubricReviewer, &request(2, 1))
            .await
            .expect_err("never clears");

        match err {
            TailorError::QualityGate {
                best_text, reason, ..
            } => {
                assert!(best_text.contains("BEST-ATTEMPT"));
                assert!(reason.contains("reviewer score"));
            }
            other => panic!("expected QualityGate, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_generation_failure_is_fatal_without_retry() {
        let err = refine_resume(&Failing, &RubricReviewer, &request(3, 2))
            .await
            .expect_err("backend failure surfaces");
        assert!(matches!(err, TailorError::Generation(_)));
    }

    #[tokio::test]
    async fn test_zero_budgets_clamp_to_one_pass() {
        let generator = Scripted::new(vec![polished_resume()]);
        let outcome = refine_resume(&generator, &RubricReviewer, &request(0, 0))
            .await
            .expect("one pass still runs");
        assert_eq!(generator.calls(), 1);
        assert_eq!(outcome.review_log.len(), 2);
    }
}
