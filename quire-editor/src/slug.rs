//! Slug helpers shared by the heading indexer and post URLs.
use unicode_normalization::UnicodeNormalization;

/// Turn arbitrary text into a URL-safe, lowercase, hyphenated token.
///
/// Non-ASCII letters are folded to their ASCII base where Unicode
/// decomposition allows it ("Crème" becomes "creme"); anything else outside
/// `[a-z0-9]` is dropped. Runs of whitespace, `-` and `_` become a single `-`
/// and the result never starts or ends with one.
#[must_use]
pub fn slugify(text: &str) -> String {
  let mut slug = String::with_capacity(text.len());
  let mut pending_dash = false;

  for c in text.nfkd() {
    if c.is_ascii_alphanumeric() {
      if pending_dash && !slug.is_empty() {
        slug.push('-');
      }
      pending_dash = false;
      slug.push(c.to_ascii_lowercase());
    } else if c.is_whitespace() || c == '-' || c == '_' {
      pending_dash = true;
    }
  }

  slug
}

/// Derive a heading anchor id.
///
/// Lowercases, removes characters outside `[a-z0-9\s-]`, collapses whitespace
/// runs into `-`, collapses repeated `-` and trims them from both ends.
#[must_use]
pub fn anchor_slug(text: &str) -> String {
  let mut anchor = String::with_capacity(text.len());
  let mut pending_dash = false;

  for c in text.to_lowercase().chars() {
    if c.is_ascii_lowercase() || c.is_ascii_digit() {
      if pending_dash && !anchor.is_empty() {
        anchor.push('-');
      }
      pending_dash = false;
      anchor.push(c);
    } else if c.is_whitespace() || c == '-' {
      pending_dash = true;
    }
  }

  anchor
}

/// Check a slug against the post URL rules: `[a-z0-9-]` only, no doubled
/// hyphens and no hyphen at either end.
#[must_use]
pub fn is_valid_slug(slug: &str) -> bool {
  slug
    .chars()
    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    && !slug.contains("--")
    && !slug.starts_with('-')
    && !slug.ends_with('-')
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn slugify_basic() {
    assert_eq!(slugify("Hello World"), "hello-world");
    assert_eq!(slugify("What's New?"), "whats-new");
    assert_eq!(slugify("  Spaces  "), "spaces");
    assert_eq!(slugify("snake_case and kebab-case"), "snake-case-and-kebab-case");
    assert_eq!(slugify("My Post!!"), "my-post");
  }

  #[test]
  fn slugify_folds_accents() {
    assert_eq!(slugify("Crème Brûlée"), "creme-brulee");
    assert_eq!(slugify("naïve café"), "naive-cafe");
  }

  #[test]
  fn slugify_drops_unfoldable_characters() {
    assert_eq!(slugify("日本語"), "");
    assert_eq!(slugify("rust 🦀 tips"), "rust-tips");
  }

  #[test]
  fn slugify_is_idempotent() {
    for input in [
      "",
      "-",
      "--a--b--",
      "  Über  straße ",
      "1. Introduction",
      "a_b-c d",
      "already-a-slug",
    ] {
      let once = slugify(input);
      assert_eq!(slugify(&once), once, "not idempotent for {input:?}");
      assert!(is_valid_slug(&once), "invalid slug {once:?} for {input:?}");
    }
  }

  #[test]
  fn anchor_slug_keeps_digits_and_drops_punctuation() {
    assert_eq!(anchor_slug("1. Introduction"), "1-introduction");
    assert_eq!(anchor_slug("What's -- new?"), "whats-new");
    assert_eq!(anchor_slug("  trailing -  "), "trailing");
  }

  #[test]
  fn slug_validation() {
    assert!(is_valid_slug("my-post-2"));
    assert!(!is_valid_slug("My Post!!"));
    assert!(!is_valid_slug("double--dash"));
    assert!(!is_valid_slug("-leading"));
  }
}
