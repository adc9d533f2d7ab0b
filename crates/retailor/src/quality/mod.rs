//! Resume quality validation.
//!
//! Runs the full rubric over a candidate resume and produces a
//! [`QualityReport`]: keyword scores, structural section checks, readability
//! heuristics, keyword density, issue lists in three severities, and a
//! composite 0-100 score with a letter grade. The report also answers the one
//! question the refinement loop asks: [`QualityReport::should_retry`].
//!
//! Every check is deterministic text analysis. Reports are computed fresh on
//! each pass and never mutated afterwards.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::profile::{JobDescriptionProfile, SkillCategory, CATEGORY_TABLE};
use crate::scoring::{self, MatchScore};

// ─────────────────────────────────────────────
// Rubric constants
// ─────────────────────────────────────────────

/// Unweighted ATS score below this is a critical issue.
const ATS_CRITICAL_FLOOR: f64 = 50.0;
/// Weighted score below this forces a retry even without critical issues.
const RETRY_WEIGHTED_FLOOR: f64 = 75.0;
/// Ideal average sentence length in words.
const TARGET_SENTENCE_LENGTH: f64 = 17.5;
/// Bullet-to-line ratio earning full bullet credit.
const BULLET_RATIO_TARGET: f64 = 0.30;
/// Distinct action-verb hits earning full verb credit.
const ACTION_VERB_TARGET: usize = 10;
/// Healthy keyword density band, in percent of total words.
const DENSITY_RANGE: (f64, f64) = (1.5, 6.0);
/// Healthy resume length band, in words.
const WORD_COUNT_RANGE: (usize, usize) = (200, 1000);

// ─────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────

/// Which conventional resume sections were detected.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SectionFlags {
    pub contact: bool,
    pub summary: bool,
    pub experience: bool,
    pub skills: bool,
    pub education: bool,
}

impl SectionFlags {
    fn present_count(self) -> usize {
        [
            self.contact,
            self.summary,
            self.experience,
            self.skills,
            self.education,
        ]
        .iter()
        .filter(|&&b| b)
        .count()
    }
}

/// Letter grade derived from the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(composite: f64) -> Self {
        if composite >= 90.0 {
            Grade::A
        } else if composite >= 80.0 {
            Grade::B
        } else if composite >= 70.0 {
            Grade::C
        } else if composite >= 60.0 {
            Grade::D
        } else {
            Grade::F
        }
    }

    /// Higher is better; useful for comparing grades.
    pub fn rank(self) -> u8 {
        match self {
            Grade::A => 5,
            Grade::B => 4,
            Grade::C => 3,
            Grade::D => 2,
            Grade::F => 1,
        }
    }

    pub fn is_failing(self) -> bool {
        matches!(self, Grade::D | Grade::F)
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let letter = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        f.write_str(letter)
    }
}

/// Full rubric output for one candidate resume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    /// Unweighted keyword match percentage.
    pub ats_score: f64,
    /// Priority-weighted keyword match percentage.
    pub weighted_ats_score: f64,
    /// Section presence, as a percentage of the five conventional sections.
    pub structure_score: f64,
    /// Sentence length, bullet usage and action-verb blend, 0-100.
    pub readability_score: f64,
    /// Technical keyword occurrences per hundred words.
    pub keyword_density: f64,
    /// Share of the JD's high-priority keywords present in the resume.
    pub keyword_coverage: f64,
    pub word_count: usize,
    pub sections: SectionFlags,
    /// JD keywords the resume still lacks, highest priority first.
    pub missing_keywords: Vec<String>,
    pub critical_issues: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
    pub composite_score: f64,
    pub grade: Grade,
}

impl QualityReport {
    /// Whether the refinement loop should ask the generator for another pass.
    pub fn should_retry(&self) -> bool {
        !self.critical_issues.is_empty()
            || self.weighted_ats_score < RETRY_WEIGHTED_FLOOR
            || self.grade.is_failing()
    }

    pub fn issue_count(&self) -> usize {
        self.critical_issues.len() + self.warnings.len()
    }
}

// ─────────────────────────────────────────────
// Section and readability detection
// ─────────────────────────────────────────────

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}").expect("email pattern compiles")
});
static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+?\d[\d\s().-]{7,}\d").expect("phone pattern compiles"));
static SUMMARY_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:summary|objective|profile|about me)\b").expect("summary pattern compiles")
});
static EXPERIENCE_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:experience|employment|work history|career)\b")
        .expect("experience pattern compiles")
});
static SKILLS_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:skills|technologies|technical skills|competencies|tech stack)\b")
        .expect("skills pattern compiles")
});
static EDUCATION_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:education|university|college|degree|bachelor|master|phd)\b")
        .expect("education pattern compiles")
});

static ACTION_VERBS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:built|led|designed|implemented|launched|shipped|improved|reduced|increased|migrated|automated|optimized|delivered|managed|created|developed|architected|deployed|scaled|mentored|streamlined|refactored|established|drove|owned)\b",
    )
    .expect("action verb pattern compiles")
});

fn detect_sections(text: &str) -> SectionFlags {
    SectionFlags {
        contact: EMAIL.is_match(text) || PHONE.is_match(text),
        summary: SUMMARY_HEADER.is_match(text),
        experience: EXPERIENCE_HEADER.is_match(text),
        skills: SKILLS_HEADER.is_match(text),
        education: EDUCATION_HEADER.is_match(text),
    }
}

/// Blend of sentence length closeness, bullet usage and action-verb count.
fn readability_score(text: &str) -> (f64, usize) {
    let sentences: Vec<&str> = text
        .split(['.', '!', '?', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    let sentence_component = if sentences.is_empty() {
        0.0
    } else {
        let total_words: usize = sentences.iter().map(|s| s.split_whitespace().count()).sum();
        let avg = total_words as f64 / sentences.len() as f64;
        let closeness = 1.0 - ((avg - TARGET_SENTENCE_LENGTH).abs() / TARGET_SENTENCE_LENGTH);
        closeness.clamp(0.0, 1.0) * 100.0
    };

    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let bullet_component = if lines.is_empty() {
        0.0
    } else {
        let bullets = lines
            .iter()
            .filter(|l| l.starts_with(['-', '*', '\u{2022}', '\u{2013}', '\u{00b7}']))
            .count();
        let ratio = bullets as f64 / lines.len() as f64;
        (ratio / BULLET_RATIO_TARGET).min(1.0) * 100.0
    };

    let verb_hits = ACTION_VERBS.find_iter(text).count();
    let verb_component = (verb_hits as f64 / ACTION_VERB_TARGET as f64).min(1.0) * 100.0;

    let blended = 0.4 * sentence_component + 0.3 * bullet_component + 0.3 * verb_component;
    (blended, verb_hits)
}

/// Occurrences of any technical-table keyword per hundred words. Soft skills
/// do not count as technical.
fn keyword_density(text: &str, word_count: usize) -> f64 {
    if word_count == 0 {
        return 0.0;
    }
    let hits: usize = CATEGORY_TABLE
        .iter()
        .filter(|c| c.category != SkillCategory::SoftSkills)
        .flat_map(|c| c.keywords.iter())
        .map(|kw| kw.regex.find_iter(text).count())
        .sum();
    hits as f64 / word_count as f64 * 100.0
}

fn coverage(score: &MatchScore) -> f64 {
    let total_high = score.matched.high.len() + score.missing.high.len();
    if total_high == 0 {
        return 100.0;
    }
    score.matched.high.len() as f64 / total_high as f64 * 100.0
}

// ─────────────────────────────────────────────
// Evaluation
// ─────────────────────────────────────────────

/// Runs the full rubric over a candidate resume.
///
/// `original` is the pre-tailoring resume; it only feeds the content-loss
/// check, never the scores.
pub fn evaluate(
    original: &str,
    candidate: &str,
    profile: &JobDescriptionProfile,
) -> QualityReport {
    let match_score = scoring::score_against_profile(candidate, profile);
    let sections = detect_sections(candidate);
    let word_count = candidate.split_whitespace().count();
    let structure_score = sections.present_count() as f64 / 5.0 * 100.0;
    let (readability, verb_hits) = readability_score(candidate);
    let density = keyword_density(candidate, word_count);
    let keyword_coverage = coverage(&match_score);

    let mut critical_issues = Vec::new();
    let mut warnings = Vec::new();
    let mut suggestions = Vec::new();

    // With an empty profile there is nothing to match, so the keyword floor
    // does not apply.
    if !profile.is_empty() && match_score.simple_score < ATS_CRITICAL_FLOOR {
        critical_issues.push(format!(
            "ATS keyword score {:.0} is below {:.0}; the resume misses most of the job's keywords",
            match_score.simple_score, ATS_CRITICAL_FLOOR
        ));
    }
    if !sections.experience {
        critical_issues.push("No experience section detected".to_string());
    }
    if !sections.skills {
        critical_issues.push("No skills section detected".to_string());
    }

    if word_count > 0 && density < DENSITY_RANGE.0 {
        warnings.push(format!(
            "Keyword density {density:.1}% is thin; the resume barely mentions the job's technologies"
        ));
    } else if density > DENSITY_RANGE.1 {
        warnings.push(format!(
            "Keyword density {density:.1}% reads as keyword stuffing"
        ));
    }
    if word_count < WORD_COUNT_RANGE.0 {
        warnings.push(format!(
            "Resume is short at {word_count} words (aim for {}-{})",
            WORD_COUNT_RANGE.0, WORD_COUNT_RANGE.1
        ));
    } else if word_count > WORD_COUNT_RANGE.1 {
        warnings.push(format!(
            "Resume is long at {word_count} words (aim for {}-{})",
            WORD_COUNT_RANGE.0, WORD_COUNT_RANGE.1
        ));
    }

    if !sections.summary {
        suggestions.push("Add a summary or objective line near the top".to_string());
    }
    if !sections.contact {
        suggestions.push("No contact details detected".to_string());
    }
    if !sections.education {
        suggestions.push("No education section detected".to_string());
    }
    if verb_hits < ACTION_VERB_TARGET {
        suggestions.push(format!(
            "Only {verb_hits} action verbs found; lead bullets with stronger verbs"
        ));
    }
    let original_words = original.split_whitespace().count();
    if original_words > 0 && word_count * 2 < original_words {
        suggestions.push("The rewrite dropped over half of the original content".to_string());
    }
    if !match_score.missing.high.is_empty() {
        let preview: Vec<&str> = match_score
            .missing
            .high
            .iter()
            .map(String::as_str)
            .take(5)
            .collect();
        suggestions.push(format!(
            "Work in missing high-priority keywords: {}",
            preview.join(", ")
        ));
    }

    let critical_penalty = (20.0 - 20.0 * critical_issues.len() as f64).max(0.0);
    let composite_score = (0.4 * match_score.weighted_score
        + 0.2 * structure_score
        + 0.2 * readability
        + critical_penalty)
        .clamp(0.0, 100.0);
    let grade = Grade::from_score(composite_score);

    let missing_keywords: Vec<String> = match_score
        .missing
        .high
        .iter()
        .chain(match_score.missing.medium.iter())
        .cloned()
        .collect();

    tracing::debug!(
        composite = composite_score,
        %grade,
        criticals = critical_issues.len(),
        "evaluated candidate resume"
    );

    QualityReport {
        ats_score: match_score.simple_score,
        weighted_ats_score: match_score.weighted_score,
        structure_score,
        readability_score: readability,
        keyword_density: density,
        keyword_coverage,
        word_count,
        sections,
        missing_keywords,
        critical_issues,
        warnings,
        suggestions,
        composite_score,
        grade,
    }
}
