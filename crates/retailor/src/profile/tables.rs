//! Static keyword tables for job-description profiling.
//!
//! One table row per category: the category label, its declared priority, and
//! the keyword set. Each keyword carries the canonical display form plus a
//! regex matching its aliases ("golang" and bare "go" both canonicalize to
//! "Go"). Patterns are compiled once through `Lazy` at first use; a pattern
//! that fails to compile is a programming error, not a runtime condition.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Priority, SeniorityLevel, SkillCategory};

pub(crate) struct KeywordSpec {
    pub canonical: &'static str,
    pub pattern: &'static str,
}

pub(crate) struct CategorySpec {
    pub category: SkillCategory,
    pub priority: Priority,
    pub keywords: &'static [KeywordSpec],
}

macro_rules! kw {
    ($canonical:literal, $pattern:literal) => {
        KeywordSpec {
            canonical: $canonical,
            pattern: $pattern,
        }
    };
}

const LANGUAGES: &[KeywordSpec] = &[
    kw!("Python", r"\bpython\b"),
    kw!("Java", r"\bjava\b"),
    kw!("JavaScript", r"\bjavascript\b|\bjs\b"),
    kw!("TypeScript", r"\btypescript\b|\bts\b"),
    kw!("Go", r"\bgolang\b|\bgo\b"),
    kw!("Rust", r"\brust\b"),
    kw!("C++", r"\bc\+\+"),
    kw!("C#", r"\bc#|\bcsharp\b"),
    kw!("Ruby", r"\bruby\b"),
    kw!("PHP", r"\bphp\b"),
    kw!("Swift", r"\bswift\b"),
    kw!("Kotlin", r"\bkotlin\b"),
    kw!("Scala", r"\bscala\b"),
    kw!("Perl", r"\bperl\b"),
    kw!("Haskell", r"\bhaskell\b"),
];

const FRAMEWORKS: &[KeywordSpec] = &[
    kw!("React", r"\breact(?:\.?js)?\b"),
    kw!("Angular", r"\bangular(?:js)?\b"),
    kw!("Vue", r"\bvue(?:\.?js)?\b"),
    kw!("Svelte", r"\bsvelte\b"),
    kw!("Django", r"\bdjango\b"),
    kw!("Flask", r"\bflask\b"),
    kw!("FastAPI", r"\bfastapi\b"),
    kw!("Spring", r"\bspring(?:\s+boot)?\b"),
    kw!("Rails", r"\brails\b|\bruby on rails\b"),
    kw!("Express", r"\bexpress(?:\.?js)?\b"),
    kw!("Next.js", r"\bnext\.?js\b"),
    kw!("Node.js", r"\bnode(?:\.?js)?\b"),
    kw!(".NET", r"\.net\b|\bdotnet\b"),
    kw!("Laravel", r"\blaravel\b"),
    kw!("GraphQL", r"\bgraphql\b"),
    kw!("gRPC", r"\bgrpc\b"),
];

const DATABASES: &[KeywordSpec] = &[
    kw!("PostgreSQL", r"\bpostgres(?:ql)?\b"),
    kw!("MySQL", r"\bmysql\b"),
    kw!("SQLite", r"\bsqlite\b"),
    kw!("MongoDB", r"\bmongo(?:db)?\b"),
    kw!("Redis", r"\bredis\b"),
    kw!("Cassandra", r"\bcassandra\b"),
    kw!("DynamoDB", r"\bdynamodb\b"),
    kw!("Elasticsearch", r"\belastic\s*search\b|\belasticsearch\b"),
    kw!("Oracle", r"\boracle\b"),
    kw!("SQL Server", r"\bsql\s+server\b"),
    kw!("SQL", r"\bsql\b"),
    kw!("Snowflake", r"\bsnowflake\b"),
];

const CLOUD: &[KeywordSpec] = &[
    kw!("AWS", r"\baws\b|\bamazon web services\b"),
    kw!("Azure", r"\bazure\b"),
    kw!("GCP", r"\bgcp\b|\bgoogle cloud\b"),
    kw!("Heroku", r"\bheroku\b"),
    kw!("DigitalOcean", r"\bdigital\s*ocean\b"),
    kw!("Cloudflare", r"\bcloudflare\b"),
];

const DEVOPS: &[KeywordSpec] = &[
    kw!("Docker", r"\bdocker\b"),
    kw!("Kubernetes", r"\bkubernetes\b|\bk8s\b"),
    kw!("Terraform", r"\bterraform\b"),
    kw!("Ansible", r"\bansible\b"),
    kw!("Jenkins", r"\bjenkins\b"),
    kw!("CI/CD", r"\bci\s*/\s*cd\b|\bcicd\b|\bcontinuous integration\b|\bcontinuous deliver(?:y|ies)\b|\bcontinuous deployment\b"),
    kw!("Git", r"\bgit\b"),
    kw!("GitHub Actions", r"\bgithub actions\b"),
    kw!("Prometheus", r"\bprometheus\b"),
    kw!("Grafana", r"\bgrafana\b"),
    kw!("Nginx", r"\bnginx\b"),
    kw!("Linux", r"\blinux\b"),
    kw!("Helm", r"\bhelm\b"),
];

const METHODOLOGIES: &[KeywordSpec] = &[
    kw!("Agile", r"\bagile\b"),
    kw!("Scrum", r"\bscrum\b"),
    kw!("Kanban", r"\bkanban\b"),
    kw!("TDD", r"\btdd\b|\btest[- ]driven development\b"),
    kw!("Microservices", r"\bmicro\s*services?\b"),
    kw!("REST", r"\brest(?:ful)?\b"),
    kw!("Machine Learning", r"\bmachine learning\b|\bml\b"),
    kw!("Deep Learning", r"\bdeep learning\b"),
    kw!("ETL", r"\betl\b"),
];

const SOFT_SKILLS: &[KeywordSpec] = &[
    kw!("Leadership", r"\bleadership\b|\blead(?:ing)? teams?\b"),
    kw!("Communication", r"\bcommunication\b"),
    kw!("Collaboration", r"\bcollaborat(?:e|ion|ive)\b"),
    kw!("Teamwork", r"\bteamwork\b|\bteam player\b"),
    kw!("Problem Solving", r"\bproblem[- ]solving\b"),
    kw!("Mentoring", r"\bmentor(?:ing|ship)?\b"),
    kw!("Stakeholder Management", r"\bstakeholders?\b"),
    kw!("Time Management", r"\btime management\b"),
];

/// The full profiling table, in the order categories appear in the profile.
pub(crate) const CATEGORY_SPECS: &[CategorySpec] = &[
    CategorySpec {
        category: SkillCategory::Languages,
        priority: Priority::High,
        keywords: LANGUAGES,
    },
    CategorySpec {
        category: SkillCategory::Frameworks,
        priority: Priority::High,
        keywords: FRAMEWORKS,
    },
    CategorySpec {
        category: SkillCategory::Databases,
        priority: Priority::High,
        keywords: DATABASES,
    },
    CategorySpec {
        category: SkillCategory::Cloud,
        priority: Priority::High,
        keywords: CLOUD,
    },
    CategorySpec {
        category: SkillCategory::Devops,
        priority: Priority::Medium,
        keywords: DEVOPS,
    },
    CategorySpec {
        category: SkillCategory::Methodologies,
        priority: Priority::Medium,
        keywords: METHODOLOGIES,
    },
    CategorySpec {
        category: SkillCategory::SoftSkills,
        priority: Priority::Low,
        keywords: SOFT_SKILLS,
    },
];

pub(crate) struct CompiledKeyword {
    pub canonical: &'static str,
    pub regex: Regex,
}

pub(crate) struct CompiledCategory {
    pub category: SkillCategory,
    pub priority: Priority,
    pub keywords: Vec<CompiledKeyword>,
}

/// Compiled form of [`CATEGORY_SPECS`]. Built once, shared for the process
/// lifetime.
pub(crate) static CATEGORY_TABLE: Lazy<Vec<CompiledCategory>> = Lazy::new(|| {
    CATEGORY_SPECS
        .iter()
        .map(|spec| CompiledCategory {
            category: spec.category,
            priority: spec.priority,
            keywords: spec
                .keywords
                .iter()
                .map(|kw| CompiledKeyword {
                    canonical: kw.canonical,
                    regex: compile(kw.pattern),
                })
                .collect(),
        })
        .collect()
});

/// Boundary phrases opening a requirements-style span.
const REQUIRED_BOUNDARY_PATTERN: &str =
    r"\brequirements?\b|\bqualifications?\b|\bmust[- ]haves?\b|\bwhat you(?:'ll)? need\b";

/// Boundary phrases opening a nice-to-have span.
const NICE_TO_HAVE_BOUNDARY_PATTERN: &str =
    r"\bnice[- ]to[- ]have\b|\bpreferred\b|\bbonus\b|\ba plus\b|\bplus:\s";

pub(crate) static REQUIRED_BOUNDARY: Lazy<Regex> = Lazy::new(|| compile(REQUIRED_BOUNDARY_PATTERN));
pub(crate) static NICE_TO_HAVE_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| compile(NICE_TO_HAVE_BOUNDARY_PATTERN));

/// Experience phrases: "5 years", "3+ years", "3-5 yrs".
pub(crate) static EXPERIENCE_RANGE: Lazy<Regex> =
    Lazy::new(|| compile(r"(\d{1,2})\s*(?:[-\u{2013}]\s*(\d{1,2})|(\+))?\s*(?:years?|yrs?)\b"));

/// Seniority tables, checked in order; the first matching level wins.
pub(crate) static SENIORITY_TABLE: Lazy<Vec<(SeniorityLevel, Regex)>> = Lazy::new(|| {
    vec![
        (
            SeniorityLevel::Junior,
            compile(r"\bjunior\b|\bentry[- ]level\b|\bgraduate\b|\bintern(?:ship)?\b"),
        ),
        (
            SeniorityLevel::Mid,
            compile(r"\bmid[- ]level\b|\bintermediate\b"),
        ),
        (SeniorityLevel::Senior, compile(r"\bsenior\b|\bsr\.?\s")),
        (
            SeniorityLevel::Lead,
            compile(r"\blead\b|\bprincipal\b|\bstaff\b|\barchitect\b|\bhead of\b"),
        ),
    ]
});

fn compile(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){pattern}"))
        .unwrap_or_else(|e| panic!("static keyword pattern '{pattern}' must compile: {e}"))
}
