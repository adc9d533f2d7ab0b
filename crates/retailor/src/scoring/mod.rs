//! Resume-vs-JD match scoring.
//!
//! Algorithm:
//! 1. Tokenize both texts: lowercase, strip punctuation (keeping `+` and `#`
//!    inside tokens), drop stop words and sub-three-character noise.
//! 2. Expand both token sets through the synonym classes so "k8s" on a resume
//!    satisfies "Kubernetes" in the JD and vice versa.
//! 3. A profile keyword counts as matched when every one of its tokens is
//!    covered by the expanded resume set. Multi-token keywords ("SQL Server")
//!    need all their tokens.
//! 4. Two scores come out: a simple matched/total ratio, and a weighted ratio
//!    where high-priority keywords count three, medium two, low one. Both are
//!    percentages in [0, 100]; an empty keyword set scores zero.
//!
//! Scoring is pure and deterministic. The same resume and JD always produce
//! the same numbers, which is what makes the refinement loop's retry decision
//! reproducible.

mod synonyms;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::profile::{self, JobDescriptionProfile, Priority};

// ─────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────

/// Keywords grouped by priority bucket.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriorityBuckets {
    pub high: Vec<String>,
    pub medium: Vec<String>,
    pub low: Vec<String>,
}

impl PriorityBuckets {
    pub fn is_empty(&self) -> bool {
        self.high.is_empty() && self.medium.is_empty() && self.low.is_empty()
    }

    pub fn total(&self) -> usize {
        self.high.len() + self.medium.len() + self.low.len()
    }

    /// Keywords in descending priority order.
    pub fn flattened(&self) -> Vec<&str> {
        self.high
            .iter()
            .chain(self.medium.iter())
            .chain(self.low.iter())
            .map(String::as_str)
            .collect()
    }
}

/// Result of scoring one resume against one job description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchScore {
    /// Unweighted matched/total percentage.
    pub simple_score: f64,
    /// Priority-weighted percentage. This is the number the refinement loop
    /// gates on.
    pub weighted_score: f64,
    pub matched: PriorityBuckets,
    pub missing: PriorityBuckets,
    pub recommendation: String,
}

// ─────────────────────────────────────────────
// Scoring
// ─────────────────────────────────────────────

/// Scores a resume against an already-built profile.
pub fn score_against_profile(resume_text: &str, profile: &JobDescriptionProfile) -> MatchScore {
    let resume_tokens = expand(tokenize(resume_text));

    let mut matched = PriorityBuckets::default();
    let mut missing = PriorityBuckets::default();
    let mut matched_weight = 0u32;
    let mut total_weight = 0u32;

    let buckets = [
        (Priority::High, &profile.high_priority),
        (Priority::Medium, &profile.medium_priority),
        (Priority::Low, &profile.low_priority),
    ];
    for (priority, keywords) in buckets {
        for keyword in keywords {
            total_weight += priority.weight();
            if keyword_matches(keyword, &resume_tokens) {
                matched_weight += priority.weight();
                bucket_mut(&mut matched, priority).push(keyword.clone());
            } else {
                bucket_mut(&mut missing, priority).push(keyword.clone());
            }
        }
    }

    let total = matched.total() + missing.total();
    let simple_score = percentage(matched.total() as f64, total as f64);
    let weighted_score = percentage(f64::from(matched_weight), f64::from(total_weight));
    let recommendation = build_recommendation(weighted_score, &missing);

    MatchScore {
        simple_score,
        weighted_score,
        matched,
        missing,
        recommendation,
    }
}

/// Convenience wrapper: profiles the JD, then scores against it.
pub fn score(resume_text: &str, jd_text: &str) -> MatchScore {
    let profile = profile::analyze_jd(jd_text);
    score_against_profile(resume_text, &profile)
}

fn bucket_mut(buckets: &mut PriorityBuckets, priority: Priority) -> &mut Vec<String> {
    match priority {
        Priority::High => &mut buckets.high,
        Priority::Medium => &mut buckets.medium,
        Priority::Low => &mut buckets.low,
    }
}

fn percentage(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        0.0
    } else {
        (part / whole * 100.0).clamp(0.0, 100.0)
    }
}

/// A keyword matches when every one of its tokens (or a synonym of each) is
/// present in the expanded resume token set.
fn keyword_matches(keyword: &str, resume_tokens: &HashSet<String>) -> bool {
    let kw_tokens = tokenize(keyword);
    if kw_tokens.is_empty() {
        return false;
    }
    kw_tokens.iter().all(|token| {
        if resume_tokens.contains(token) {
            return true;
        }
        match synonyms::SYNONYM_MAP.get(token.as_str()) {
            Some(class) => class.iter().any(|syn| resume_tokens.contains(*syn)),
            None => false,
        }
    })
}

/// Lowercases, strips punctuation (keeping `+` and `#` inside tokens), and
/// drops stop words plus short noise tokens.
pub(crate) fn tokenize(text: &str) -> HashSet<String> {
    let lowered = text.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '+' || c == '#' {
                c
            } else {
                ' '
            }
        })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|token| !synonyms::STOP_WORDS.contains(token))
        .filter(|token| token.len() >= 3 || synonyms::SHORT_TOKEN_ALLOW_LIST.contains(token))
        .map(str::to_string)
        .collect()
}

/// Adds every synonym-class member for tokens already in the set.
fn expand(tokens: HashSet<String>) -> HashSet<String> {
    let mut expanded = tokens.clone();
    for token in &tokens {
        if let Some(class) = synonyms::SYNONYM_MAP.get(token.as_str()) {
            expanded.extend(class.iter().map(|s| s.to_string()));
        }
    }
    expanded
}

fn build_recommendation(weighted_score: f64, missing: &PriorityBuckets) -> String {
    if weighted_score >= 80.0 {
        return "Strong match. The resume already covers most of what the posting asks for."
            .to_string();
    }
    let top_missing: Vec<&str> = missing.flattened().into_iter().take(3).collect();
    if weighted_score >= 60.0 {
        format!(
            "Moderate match. Work these into the resume where truthful: {}.",
            top_missing.join(", ")
        )
    } else if top_missing.is_empty() {
        "No recognizable keywords to match against.".to_string()
    } else {
        format!(
            "Low match. The resume misses most high-priority keywords ({}). A substantial rewrite is recommended.",
            top_missing.join(", ")
        )
    }
}
