//! Reviewer seam and the built-in rubric reviewer.
//!
//! The reviewer is a second, independent judge run after the tailoring loop
//! has accepted a candidate. Hosts can plug in an external reviewer (an LLM,
//! a human queue); [`RubricReviewer`] is the deterministic default that
//! derives its verdict from the quality rubric, so the full pipeline works
//! with no model in the loop.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::profile::JobDescriptionProfile;
use crate::quality;

/// Reviewer score at or above which a clean resume passes.
pub const REVIEWER_PASS_SCORE: f64 = 85.0;
/// Relaxed floor: at or above this, one advisory critical is tolerated.
pub const REVIEWER_RELAXED_SCORE: f64 = 92.0;

#[derive(Debug, Error)]
pub enum ReviewerError {
    #[error("reviewer unavailable: {0}")]
    Unavailable(String),
    #[error("{0}")]
    Other(String),
}

/// A single issue the reviewer insists on. Advisory issues are tolerated at
/// the relaxed threshold; non-advisory ones always block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewerIssue {
    pub description: String,
    pub advisory: bool,
}

/// One reviewer pass over a candidate resume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewerVerdict {
    pub overall_score: f64,
    pub critical_issues: Vec<ReviewerIssue>,
    pub suggestions: Vec<String>,
}

impl ReviewerVerdict {
    /// Acceptance rule: a clean pass needs [`REVIEWER_PASS_SCORE`] with no
    /// critical issues; [`REVIEWER_RELAXED_SCORE`] tolerates exactly one
    /// advisory critical.
    pub fn passes(&self) -> bool {
        if self.overall_score >= REVIEWER_PASS_SCORE && self.critical_issues.is_empty() {
            return true;
        }
        self.overall_score >= REVIEWER_RELAXED_SCORE
            && self.critical_issues.len() <= 1
            && self.critical_issues.iter().all(|issue| issue.advisory)
    }
}

#[async_trait]
pub trait Reviewer: Send + Sync {
    /// Judges a candidate against the original resume and the JD profile.
    async fn review(
        &self,
        candidate: &str,
        original: &str,
        profile: &JobDescriptionProfile,
    ) -> Result<ReviewerVerdict, ReviewerError>;
}

/// Deterministic reviewer backed by the quality rubric. Its score is the
/// rubric's composite score; rubric criticals become blocking issues and
/// rubric warnings become advisory ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct RubricReviewer;

#[async_trait]
impl Reviewer for RubricReviewer {
    async fn review(
        &self,
        candidate: &str,
        original: &str,
        profile: &JobDescriptionProfile,
    ) -> Result<ReviewerVerdict, ReviewerError> {
        let report = quality::evaluate(original, candidate, profile);
        let critical_issues = report
            .critical_issues
            .iter()
            .map(|issue| ReviewerIssue {
                description: issue.clone(),
                advisory: false,
            })
            .chain(report.warnings.iter().map(|warning| ReviewerIssue {
                description: warning.clone(),
                advisory: true,
            }))
            .collect();
        Ok(ReviewerVerdict {
            overall_score: report.composite_score,
            critical_issues,
            suggestions: report.suggestions.clone(),
        })
    }
}
