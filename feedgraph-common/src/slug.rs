//! URL slugs for posts.

use serde::Serialize;
use std::{collections::HashSet, fmt::Display};
use unicode_normalization::UnicodeNormalization;

/// Longest base slug. Leaves room for a `-<n>` suffix within the 250
/// character column.
pub const SLUG_BASE_MAX_LEN: usize = 240;

/// Base used when a title contains nothing that survives slugification.
pub const FALLBACK_SLUG: &str = "post";

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Wraps a slug read back from storage.
    #[must_use]
    pub fn from_stored(slug: String) -> Self {
        Self(slug)
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl Display for Slug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Folds to ASCII through NFKD, lowercases, keeps letters, digits, `_` and
/// `-`, and joins words with single hyphens.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_separator = false;

    for c in title.nfkd() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else if c == '-' || c.is_whitespace() {
            pending_separator = true;
        }
    }

    let trimmed = slug.trim_matches(|c| c == '-' || c == '_');
    let mut base: String = trimmed.chars().take(SLUG_BASE_MAX_LEN).collect();
    while base.ends_with(['-', '_']) {
        base.pop();
    }

    if base.is_empty() {
        FALLBACK_SLUG.to_owned()
    } else {
        base
    }
}

/// Picks `base` if it is free, otherwise `base-1`, `base-2`, ... whichever is
/// the first one not in `taken`.
#[must_use]
pub fn unique_slug<'a>(base: &str, taken: impl IntoIterator<Item = &'a str>) -> Slug {
    let taken: HashSet<&str> = taken.into_iter().collect();
    if !taken.contains(base) {
        return Slug(base.to_owned());
    }

    (1u64..)
        .map(|counter| format!("{base}-{counter}"))
        .find(|candidate| !taken.contains(candidate.as_str()))
        .map(Slug)
        .unwrap_or_default()
}
