//! Token-level vocabulary for the match scorer: stop words, short tokens
//! worth keeping, and interchangeable-token classes.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

/// Common words dropped from token sets before matching.
pub(crate) const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "have", "i", "in", "is",
    "it", "its", "me", "my", "of", "on", "or", "our", "than", "that", "the", "their", "them",
    "they", "this", "to", "was", "we", "were", "will", "with", "you", "your",
];

/// Tokens shorter than three characters that still carry signal. Everything
/// else that short is noise and gets dropped.
pub(crate) const SHORT_TOKEN_ALLOW_LIST: &[&str] = &[
    "ai", "c#", "cd", "ci", "db", "go", "js", "ml", "qa", "ts", "ui", "ux",
];

/// Interchangeable-token classes. Matching treats every member of a class as
/// present when any member is. Classes are directional only in the sense of
/// membership: "cicd" expands to both "ci" and "cd", but a bare "cd" expands
/// to "cicd" without picking up "ci".
pub(crate) const SYNONYM_CLASSES: &[&[&str]] = &[
    &["kubernetes", "k8s"],
    &["javascript", "js"],
    &["typescript", "ts"],
    &["golang", "go"],
    &["postgresql", "postgres"],
    &["mongodb", "mongo"],
    &["cicd", "ci"],
    &["cicd", "cd"],
    &["nodejs", "node"],
    &["nodejs", "js"],
    &["dotnet", "net"],
];

/// token -> union of every class containing it (including the token itself).
pub(crate) static SYNONYM_MAP: Lazy<HashMap<&'static str, HashSet<&'static str>>> =
    Lazy::new(|| {
        let mut map: HashMap<&'static str, HashSet<&'static str>> = HashMap::new();
        for class in SYNONYM_CLASSES {
            for member in *class {
                let entry = map.entry(member).or_default();
                for other in *class {
                    entry.insert(other);
                }
            }
        }
        map
    });
