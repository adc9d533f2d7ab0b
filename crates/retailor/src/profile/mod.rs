//! Job-description profiling.
//!
//! Pure, deterministic extraction of a structured [`JobDescriptionProfile`]
//! from raw JD text. No network calls, no generator involvement: everything
//! here is regex tables plus span bookkeeping, so two runs over the same text
//! always agree.
//!
//! Keyword priority starts from the category's declared priority and is then
//! adjusted by position: a keyword that only ever appears inside a
//! nice-to-have span is demoted to medium, whatever its category says.

mod tables;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub(crate) use tables::CATEGORY_TABLE;

// ─────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────

/// Skill category labels, in table order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    Languages,
    Frameworks,
    Databases,
    Cloud,
    Devops,
    Methodologies,
    SoftSkills,
}

/// Keyword priority. Drives the scorer's weights: high counts three, medium
/// two, low one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn weight(self) -> u32 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SeniorityLevel {
    Junior,
    Mid,
    Senior,
    Lead,
}

/// Years-of-experience demand parsed from phrases like "3+ years" or
/// "3-5 years". A bare "5 years" reads as an exact demand (min == max);
/// a trailing plus leaves the range open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceRange {
    pub min_years: u32,
    pub max_years: Option<u32>,
}

/// One profiled category: the label plus every canonical keyword found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryHits {
    pub category: SkillCategory,
    pub keywords: Vec<String>,
}

/// Structured profile of a job description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDescriptionProfile {
    /// Canonical keywords grouped by category, in table order. Categories
    /// with no hits are omitted.
    pub categories: Vec<CategoryHits>,
    /// Keywords bucketed by final priority (category priority, then the
    /// nice-to-have demotion). Every extracted keyword appears in exactly
    /// one bucket.
    pub high_priority: Vec<String>,
    pub medium_priority: Vec<String>,
    pub low_priority: Vec<String>,
    pub experience: Option<ExperienceRange>,
    pub seniority: Option<SeniorityLevel>,
}

impl JobDescriptionProfile {
    /// Total number of distinct keywords extracted.
    pub fn keyword_count(&self) -> usize {
        self.high_priority.len() + self.medium_priority.len() + self.low_priority.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyword_count() == 0
    }
}

// ─────────────────────────────────────────────
// Analysis
// ─────────────────────────────────────────────

/// Builds a [`JobDescriptionProfile`] from raw JD text.
///
/// Empty or keyword-free text yields an empty profile rather than an error;
/// downstream scoring treats that as "nothing to match against".
pub fn analyze_jd(text: &str) -> JobDescriptionProfile {
    let spans = requirement_spans(text);

    let mut categories = Vec::new();
    let mut high_priority = Vec::new();
    let mut medium_priority = Vec::new();
    let mut low_priority = Vec::new();

    for category in CATEGORY_TABLE.iter() {
        let mut hits = Vec::new();
        for kw in &category.keywords {
            let mut matched = false;
            let mut in_required = false;
            for m in kw.regex.find_iter(text) {
                matched = true;
                if spans.classify(m.start()) == SpanKind::Required {
                    in_required = true;
                    break;
                }
            }
            if !matched {
                continue;
            }
            hits.push(kw.canonical.to_string());

            // Demotion applies only to keywords the JD itself marks optional.
            let priority = if in_required {
                category.priority
            } else {
                category.priority.min_with(Priority::Medium)
            };
            match priority {
                Priority::High => high_priority.push(kw.canonical.to_string()),
                Priority::Medium => medium_priority.push(kw.canonical.to_string()),
                Priority::Low => low_priority.push(kw.canonical.to_string()),
            }
        }
        if !hits.is_empty() {
            categories.push(CategoryHits {
                category: category.category,
                keywords: hits,
            });
        }
    }

    let profile = JobDescriptionProfile {
        categories,
        high_priority,
        medium_priority,
        low_priority,
        experience: extract_experience(text),
        seniority: extract_seniority(text),
    };

    tracing::debug!(
        keywords = profile.keyword_count(),
        seniority = ?profile.seniority,
        "profiled job description"
    );
    profile
}

impl Priority {
    /// The lower of two priorities (high > medium > low).
    fn min_with(self, other: Priority) -> Priority {
        if self.weight() <= other.weight() {
            self
        } else {
            other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpanKind {
    Required,
    NiceToHave,
}

/// Byte offsets where the JD switches between required and nice-to-have
/// phrasing. Text before any boundary counts as required.
struct RequirementSpans {
    boundaries: Vec<(usize, SpanKind)>,
}

impl RequirementSpans {
    fn classify(&self, offset: usize) -> SpanKind {
        let mut kind = SpanKind::Required;
        for &(start, boundary_kind) in &self.boundaries {
            if start > offset {
                break;
            }
            kind = boundary_kind;
        }
        kind
    }
}

fn requirement_spans(text: &str) -> RequirementSpans {
    let mut boundaries: Vec<(usize, SpanKind)> = tables::REQUIRED_BOUNDARY
        .find_iter(text)
        .map(|m| (m.start(), SpanKind::Required))
        .chain(
            tables::NICE_TO_HAVE_BOUNDARY
                .find_iter(text)
                .map(|m| (m.start(), SpanKind::NiceToHave)),
        )
        .collect();
    boundaries.sort_by_key(|&(start, _)| start);
    RequirementSpans { boundaries }
}

fn extract_experience(text: &str) -> Option<ExperienceRange> {
    let caps = tables::EXPERIENCE_RANGE.captures(text)?;
    let min_years: u32 = caps.get(1)?.as_str().parse().ok()?;
    let max_years = match (caps.get(2), caps.get(3)) {
        (Some(max), _) => max.as_str().parse().ok(),
        (None, Some(_plus)) => None,
        (None, None) => Some(min_years),
    };
    Some(ExperienceRange {
        min_years,
        max_years,
    })
}

fn extract_seniority(text: &str) -> Option<SeniorityLevel> {
    tables::SENIORITY_TABLE
        .iter()
        .find(|(_, regex)| regex.is_match(text))
        .map(|(level, _)| *level)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_JD: &str = "Senior Backend Engineer
We are looking for a senior engineer to join our platform team.

Requirements:
- 5+ years of experience with Python and Django
- Strong PostgreSQL and Redis skills
- AWS deployment experience

Nice to have:
- Kubernetes and Terraform
- Rust";

    #[test]
    fn test_extracts_keywords_by_category() {
        let profile = analyze_jd(SAMPLE_JD);
        let languages = profile
            .categories
            .iter()
            .find(|c| c.category == SkillCategory::Languages)
            .expect("languages present");
        assert!(languages.keywords.contains(&"Python".to_string()));
        assert!(languages.keywords.contains(&"Rust".to_string()));

        let databases = profile
            .categories
            .iter()
            .find(|c| c.category == SkillCategory::Databases)
            .expect("databases present");
        assert_eq!(databases.keywords, vec!["PostgreSQL", "Redis"]);
    }

    #[test]
    fn test_nice_to_have_keywords_demoted() {
        let profile = analyze_jd(SAMPLE_JD);
        // Rust is a language (high category) but only appears after the
        // nice-to-have boundary.
        assert!(!profile.high_priority.contains(&"Rust".to_string()));
        assert!(profile.medium_priority.contains(&"Rust".to_string()));
        // Python appears in the requirements span and stays high.
        assert!(profile.high_priority.contains(&"Python".to_string()));
    }

    #[test]
    fn test_requirements_after_nice_to_have_stay_required() {
        let text = "Bonus: familiarity with Kafka. Requirements: Python, PostgreSQL.";
        let profile = analyze_jd(text);
        assert!(profile.high_priority.contains(&"Python".to_string()));
        assert!(profile.high_priority.contains(&"PostgreSQL".to_string()));
    }

    #[test]
    fn test_canonicalizes_aliases() {
        let profile = analyze_jd("We use golang, k8s and postgres in production.");
        assert!(profile.high_priority.contains(&"Go".to_string()));
        assert!(profile.high_priority.contains(&"PostgreSQL".to_string()));
        assert!(profile.medium_priority.contains(&"Kubernetes".to_string()));
    }

    #[test]
    fn test_experience_open_range() {
        let profile = analyze_jd(SAMPLE_JD);
        assert_eq!(
            profile.experience,
            Some(ExperienceRange {
                min_years: 5,
                max_years: None
            })
        );
    }

    #[test]
    fn test_experience_closed_range() {
        let profile = analyze_jd("3-5 years of experience required");
        assert_eq!(
            profile.experience,
            Some(ExperienceRange {
                min_years: 3,
                max_years: Some(5)
            })
        );
    }

    #[test]
    fn test_seniority_first_match_wins() {
        assert_eq!(
            analyze_jd(SAMPLE_JD).seniority,
            Some(SeniorityLevel::Senior)
        );
        assert_eq!(
            analyze_jd("Junior developer wanted, will grow into a senior role").seniority,
            Some(SeniorityLevel::Junior)
        );
        assert_eq!(analyze_jd("Backend position").seniority, None);
    }

    #[test]
    fn test_empty_text_yields_empty_profile() {
        let profile = analyze_jd("");
        assert!(profile.is_empty());
        assert!(profile.categories.is_empty());
        assert_eq!(profile.experience, None);
        assert_eq!(profile.seniority, None);
    }

    #[test]
    fn test_keyword_listed_once_per_bucket() {
        let profile = analyze_jd("Python, python, PYTHON everywhere");
        let count = profile
            .high_priority
            .iter()
            .filter(|k| *k == "Python")
            .count();
        assert_eq!(count, 1);
    }
}
