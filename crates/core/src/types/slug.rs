//! URL-safe store slugs.
//!
//! A slug is derived from a store's display name and made unique by appending
//! `-<n>` when other stores already use the same base.

use core::fmt;
use std::collections::HashSet;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Base used when a name contains no ASCII letters or digits at all.
pub const FALLBACK_SLUG: &str = "store";

/// Errors that can occur when parsing or matching a [`Slug`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum SlugError {
    /// The input string is empty.
    #[error("slug cannot be empty")]
    Empty,
    /// The input contains a character outside `[a-z0-9-]`.
    #[error("slug may only contain lowercase letters, digits and hyphens (found {0:?})")]
    InvalidCharacter(char),
    /// The collision pattern could not be compiled.
    #[error("invalid slug pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// A URL-safe store identifier.
///
/// ```
/// use storefinder_core::Slug;
///
/// let slug = Slug::from_name("  Wes's Coffee & Donuts! ");
/// assert_eq!(slug.as_str(), "wes-s-coffee-donuts");
/// assert_eq!(slug.with_suffix(2).as_str(), "wes-s-coffee-donuts-2");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Derive the base slug for a display name.
    ///
    /// Lowercases, replaces every run of characters that are not ASCII
    /// letters or digits with a single `-`, and strips hyphens from both
    /// ends. Names that leave nothing behind fall back to [`FALLBACK_SLUG`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let mut out = String::with_capacity(name.len());
        let mut pending_hyphen = false;

        for c in name.trim().chars() {
            if c.is_ascii_alphanumeric() {
                if pending_hyphen && !out.is_empty() {
                    out.push('-');
                }
                pending_hyphen = false;
                out.push(c.to_ascii_lowercase());
            } else {
                pending_hyphen = true;
            }
        }

        if out.is_empty() {
            out.push_str(FALLBACK_SLUG);
        }

        Self(out)
    }

    /// Parse an existing slug, e.g. one taken from a URL.
    ///
    /// # Errors
    ///
    /// Returns `SlugError::Empty` or `SlugError::InvalidCharacter`.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if s.is_empty() {
            return Err(SlugError::Empty);
        }
        if let Some(bad) = s
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
        {
            return Err(SlugError::InvalidCharacter(bad));
        }
        Ok(Self(s.to_owned()))
    }

    /// Wrap a slug loaded from storage without re-validating it.
    ///
    /// Historical slugs are kept verbatim even if they would not be produced
    /// by [`Slug::from_name`] today.
    #[must_use]
    pub const fn from_stored(s: String) -> Self {
        Self(s)
    }

    /// Returns `<self>-<n>`.
    #[must_use]
    pub fn with_suffix(&self, n: usize) -> Self {
        Self(format!("{}-{n}", self.0))
    }

    /// Pick the slug to assign given the existing slugs that match this base
    /// (see [`Slug::collision_pattern`]).
    ///
    /// No collisions keeps the base; `n` collisions yield `<base>-<n+1>`,
    /// stepping upward past any suffix another store already holds.
    #[must_use]
    pub fn next_available(&self, taken: &[Self]) -> Self {
        if taken.is_empty() {
            return self.clone();
        }

        let held: HashSet<String> = taken.iter().map(|s| s.0.to_ascii_lowercase()).collect();
        (taken.len() + 1..)
            .map(|n| self.with_suffix(n))
            .find(|candidate| !held.contains(&candidate.0.to_ascii_lowercase()))
            .unwrap_or_else(|| self.clone())
    }

    /// Regular expression matching this base optionally followed by
    /// `-<digits>`, anchored at both ends.
    ///
    /// The syntax is shared by the `regex` crate and `PostgreSQL`'s `~*`
    /// operator.
    #[must_use]
    pub fn collision_pattern(&self) -> String {
        format!("^({})(-[0-9]*)?$", regex::escape(&self.0))
    }

    /// Compile [`Slug::collision_pattern`] as a case-insensitive matcher.
    ///
    /// # Errors
    ///
    /// Returns `SlugError::Pattern` if the pattern fails to compile.
    pub fn collision_matcher(&self) -> Result<Regex, SlugError> {
        Ok(RegexBuilder::new(&self.collision_pattern())
            .case_insensitive(true)
            .build()?)
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Slug` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Slug {
    type Err = SlugError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_basic() {
        assert_eq!(Slug::from_name("Test").as_str(), "test");
        assert_eq!(Slug::from_name("Big Al's BBQ").as_str(), "big-al-s-bbq");
    }

    #[test]
    fn test_from_name_collapses_runs_and_trims() {
        assert_eq!(
            Slug::from_name("  --Coffee   &&  Tea--  ").as_str(),
            "coffee-tea"
        );
    }

    #[test]
    fn test_from_name_non_ascii_is_separator() {
        assert_eq!(Slug::from_name("Café Olé 2").as_str(), "caf-ol-2");
    }

    #[test]
    fn test_from_name_fallback() {
        assert_eq!(Slug::from_name("!!!").as_str(), FALLBACK_SLUG);
        assert_eq!(Slug::from_name("").as_str(), FALLBACK_SLUG);
    }

    fn stored(slugs: &[&str]) -> Vec<Slug> {
        slugs.iter().map(|s| Slug::from_stored((*s).to_owned())).collect()
    }

    #[test]
    fn test_next_available() {
        let base = Slug::from_name("test");
        assert_eq!(base.next_available(&[]).as_str(), "test");
        assert_eq!(base.next_available(&stored(&["test"])).as_str(), "test-2");
        assert_eq!(
            base.next_available(&stored(&["test", "test-2", "test-3", "test-4"]))
                .as_str(),
            "test-5"
        );
    }

    #[test]
    fn test_next_available_skips_held_suffix() {
        let base = Slug::from_name("test");
        assert_eq!(
            base.next_available(&stored(&["test", "test-3"])).as_str(),
            "test-4"
        );
        assert_eq!(
            base.next_available(&stored(&["TEST-2"])).as_str(),
            "test-3"
        );
    }

    #[test]
    fn test_next_available_counts_duplicates() {
        let base = Slug::from_name("race");
        assert_eq!(
            base.next_available(&stored(&["race", "race"])).as_str(),
            "race-3"
        );
    }

    #[test]
    fn test_collision_matcher() {
        let matcher = Slug::from_name("test").collision_matcher().unwrap();
        assert!(matcher.is_match("test"));
        assert!(matcher.is_match("test-2"));
        assert!(matcher.is_match("TEST-10"));
        assert!(matcher.is_match("test-"));
        assert!(!matcher.is_match("test-kitchen"));
        assert!(!matcher.is_match("testing"));
        assert!(!matcher.is_match("a-test"));
    }

    #[test]
    fn test_collision_matcher_hyphenated_base() {
        let matcher = Slug::from_name("big al").collision_matcher().unwrap();
        assert!(matcher.is_match("big-al"));
        assert!(matcher.is_match("big-al-3"));
        assert!(!matcher.is_match("big"));
    }

    #[test]
    fn test_parse() {
        assert!(Slug::parse("coffee-2").is_ok());
        assert!(matches!(Slug::parse(""), Err(SlugError::Empty)));
        assert!(matches!(
            Slug::parse("Coffee"),
            Err(SlugError::InvalidCharacter('C'))
        ));
        assert!(matches!(
            Slug::parse("a b"),
            Err(SlugError::InvalidCharacter(' '))
        ));
    }
}
