//! Prompt templates for the tailoring and review-fix passes.
//!
//! Templates use `{placeholder}` markers filled by simple replacement. Keep
//! the rules numbered; backends follow numbered constraints more reliably
//! than prose.

use crate::quality::QualityReport;
use crate::refine::reviewer::ReviewerVerdict;

pub const TAILOR_PROMPT_TEMPLATE: &str = r#"You are rewriting a resume so it is optimized for one specific job posting.

REWRITE RULES:
1. Preserve every factual claim: employers, titles, dates, metrics. Never invent experience the candidate does not have.
2. Weave the posting's terminology into existing bullets wherever it is truthful to do so.
3. Keep the layout machine-parseable: clear section headings, one bullet per line, no tables.
4. Keep the candidate's voice; strengthen verbs without inflating claims.
5. Return ONLY the rewritten resume text. No commentary, no code fences.

TARGET JOB POSTING:
{job_description}

ADDITIONAL INSTRUCTIONS:
{instructions}

RESUME TO REWRITE:
{resume}"#;

/// Builds the full tailoring prompt from the current base text.
pub fn build_tailor_prompt(base_text: &str, jd_text: &str, instructions: &str) -> String {
    let instructions = if instructions.trim().is_empty() {
        "(none)"
    } else {
        instructions
    };
    TAILOR_PROMPT_TEMPLATE
        .replace("{job_description}", jd_text)
        .replace("{instructions}", instructions)
        .replace("{resume}", base_text)
}

/// Feedback paragraph appended to the instructions between tailoring passes.
/// Derived from the previous pass's report: missing keywords first, then the
/// concrete issues.
pub fn build_retry_feedback(report: &QualityReport) -> String {
    let mut lines = vec!["FEEDBACK ON THE PREVIOUS ATTEMPT (address every point):".to_string()];
    if !report.missing_keywords.is_empty() {
        let preview: Vec<&str> = report
            .missing_keywords
            .iter()
            .map(String::as_str)
            .take(8)
            .collect();
        lines.push(format!(
            "- Work these keywords in where truthful: {}",
            preview.join(", ")
        ));
    }
    for issue in &report.critical_issues {
        lines.push(format!("- {issue}"));
    }
    for warning in &report.warnings {
        lines.push(format!("- {warning}"));
    }
    lines.join("\n")
}

/// Feedback paragraph for a reviewer-requested fix pass.
pub fn build_reviewer_feedback(verdict: &ReviewerVerdict) -> String {
    let mut lines = vec![format!(
        "A reviewer scored this resume {:.0}/100 and requires fixes before it can ship:",
        verdict.overall_score
    )];
    for issue in &verdict.critical_issues {
        lines.push(format!("- {}", issue.description));
    }
    for suggestion in verdict.suggestions.iter().take(5) {
        lines.push(format!("- {suggestion}"));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tailor_prompt_fills_all_placeholders() {
        let prompt = build_tailor_prompt("MY RESUME", "THE JOB", "be brief");
        assert!(prompt.contains("MY RESUME"));
        assert!(prompt.contains("THE JOB"));
        assert!(prompt.contains("be brief"));
        assert!(!prompt.contains("{resume}"));
        assert!(!prompt.contains("{job_description}"));
        assert!(!prompt.contains("{instructions}"));
    }

    #[test]
    fn test_empty_instructions_marked_none() {
        let prompt = build_tailor_prompt("r", "j", "   ");
        assert!(prompt.contains("(none)"));
    }
}
