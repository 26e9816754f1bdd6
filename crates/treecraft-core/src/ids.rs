//! Tree identifier and slug generation.

use regex::Regex;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

const SLUG_SUFFIX_LEN: usize = 8;
const SLUG_MAX_STEM_LEN: usize = 48;
const FALLBACK_SLUG_STEM: &str = "tree";

/// Produces tree ids (unique within a user's collection) and slugs (unique
/// across the system, best effort).
pub trait IdGenerator {
    fn tree_id(&self) -> String;

    fn slug(&self, title: &str) -> String;
}

/// Random v4 UUID ids; slugs are the normalized title plus a random suffix.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn tree_id(&self) -> String {
        Uuid::new_v4().to_string()
    }

    fn slug(&self, title: &str) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{}-{}", slug_stem(title), &suffix[..SLUG_SUFFIX_LEN])
    }
}

/// Deterministic ids (`tree-1`, `tree-2`, ...) for tests and fixtures.
#[derive(Debug, Default)]
pub struct SequenceIdGenerator {
    next: AtomicU64,
}

impl SequenceIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl IdGenerator for SequenceIdGenerator {
    fn tree_id(&self) -> String {
        format!("tree-{}", self.bump())
    }

    fn slug(&self, title: &str) -> String {
        format!("{}-{}", slug_stem(title), self.bump())
    }
}

fn non_slug_chars_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("slug regex must compile"))
}

/// Lowercase, collapse every non-alphanumeric run into `-`, trim dashes.
pub fn slug_stem(title: &str) -> String {
    let lowered = title.to_lowercase();
    let collapsed = non_slug_chars_re().replace_all(&lowered, "-");
    let stem: String = collapsed
        .trim_matches('-')
        .chars()
        .take(SLUG_MAX_STEM_LEN)
        .collect();
    let stem = stem.trim_end_matches('-');
    if stem.is_empty() {
        FALLBACK_SLUG_STEM.to_string()
    } else {
        stem.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_stem_normalizes_titles() {
        assert_eq!(slug_stem("Intro to Linear Algebra!"), "intro-to-linear-algebra");
        assert_eq!(slug_stem("  --C++ & Rust--  "), "c-rust");
        assert_eq!(slug_stem("???"), FALLBACK_SLUG_STEM);
    }

    #[test]
    fn uuid_slugs_differ_for_same_title() {
        let ids = UuidIdGenerator;
        let first = ids.slug("Algebra");
        let second = ids.slug("Algebra");
        assert!(first.starts_with("algebra-"));
        assert_ne!(first, second);
        assert_ne!(ids.tree_id(), ids.tree_id());
    }

    #[test]
    fn sequence_ids_are_deterministic() {
        let ids = SequenceIdGenerator::new();
        assert_eq!(ids.tree_id(), "tree-1");
        assert_eq!(ids.slug("Algebra"), "algebra-2");
    }
}
