//! Accessibility checks over serialized markup.
//!
//! Each category is checked once. A category with issues yields a single
//! finding carrying the number of occurrences and costs a fixed penalty by
//! severity, however many times it occurs. Categories without issues are
//! listed as passes.
use std::fmt;

use serde::Serialize;

use crate::{analysis::BodyFacts, utils::count_words};

/// Link texts that say nothing about the destination.
const NON_DESCRIPTIVE_LINK_TEXT: &[&str] =
  &["click here", "here", "link", "read more", "more", "this"];

/// Paragraphs longer than this many words are flagged.
const LONG_PARAGRAPH_WORDS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Error,
  Warning,
  Info,
}

impl Severity {
  #[must_use]
  pub const fn penalty(self) -> u8 {
    match self {
      Self::Error => 20,
      Self::Warning => 10,
      Self::Info => 5,
    }
  }
}

impl fmt::Display for Severity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Error => "error",
      Self::Warning => "warning",
      Self::Info => "info",
    })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
  ImageAlt,
  HeadingOrder,
  LinkText,
  TableHeaders,
  ParagraphLength,
}

impl Category {
  pub const ALL: [Self; 5] = [
    Self::ImageAlt,
    Self::HeadingOrder,
    Self::LinkText,
    Self::TableHeaders,
    Self::ParagraphLength,
  ];

  #[must_use]
  pub const fn severity(self) -> Severity {
    match self {
      Self::ImageAlt => Severity::Error,
      Self::HeadingOrder | Self::LinkText | Self::TableHeaders => Severity::Warning,
      Self::ParagraphLength => Severity::Info,
    }
  }

  #[must_use]
  pub const fn pass_message(self) -> &'static str {
    match self {
      Self::ImageAlt => "All images have alt text",
      Self::HeadingOrder => "Heading levels do not skip",
      Self::LinkText => "Link texts are descriptive",
      Self::TableHeaders => "All tables have header cells",
      Self::ParagraphLength => "Paragraphs are of readable length",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
  pub category: Category,
  pub severity: Severity,
  pub count:    usize,
  pub message:  String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessibilityReport {
  pub score:    u8,
  pub findings: Vec<Finding>,
  pub passes:   Vec<String>,
}

impl AccessibilityReport {
  #[must_use]
  pub fn errors(&self) -> impl Iterator<Item = &Finding> {
    self
      .findings
      .iter()
      .filter(|finding| finding.severity == Severity::Error)
  }
}

fn is_non_descriptive(text: &str) -> bool {
  let text = text.trim().to_lowercase();
  text.chars().count() < 3 || NON_DESCRIPTIVE_LINK_TEXT.contains(&text.as_str())
}

fn occurrences(category: Category, facts: &BodyFacts) -> (usize, String) {
  match category {
    Category::ImageAlt => {
      let count = facts.images.iter().filter(|image| !image.has_alt()).count();
      (count, format!("{count} image(s) have no alt text"))
    },
    Category::HeadingOrder => {
      let skips: Vec<String> = facts
        .headings
        .windows(2)
        .filter(|pair| pair[1].level > pair[0].level + 1)
        .map(|pair| format!("H{} to H{}", pair[0].level, pair[1].level))
        .collect();
      (
        skips.len(),
        format!("Heading levels skip: {}", skips.join(", ")),
      )
    },
    Category::LinkText => {
      let texts: Vec<&str> = facts
        .links
        .iter()
        .filter(|link| is_non_descriptive(&link.text))
        .map(|link| link.text.as_str())
        .collect();
      let quoted: Vec<String> = texts.iter().map(|t| format!("\"{t}\"")).collect();
      (
        texts.len(),
        format!(
          "{} link(s) have non-descriptive text: {}",
          texts.len(),
          quoted.join(", ")
        ),
      )
    },
    Category::TableHeaders => {
      let count = facts.tables.iter().filter(|table| !table.has_header).count();
      (count, format!("{count} table(s) have no header cells"))
    },
    Category::ParagraphLength => {
      let count = facts
        .paragraphs
        .iter()
        .filter(|p| count_words(p) > LONG_PARAGRAPH_WORDS)
        .count();
      (
        count,
        format!("{count} paragraph(s) are longer than {LONG_PARAGRAPH_WORDS} words"),
      )
    },
  }
}

/// Check markup for accessibility problems.
#[must_use]
pub fn check_accessibility(markup: &str) -> AccessibilityReport {
  check_facts(&BodyFacts::extract(markup))
}

/// Check already extracted body facts.
#[must_use]
pub fn check_facts(facts: &BodyFacts) -> AccessibilityReport {
  let mut findings = Vec::new();
  let mut passes = Vec::new();
  let mut penalty: u8 = 0;

  for category in Category::ALL {
    let (count, message) = occurrences(category, facts);
    if count == 0 {
      passes.push(category.pass_message().to_string());
      continue;
    }
    let severity = category.severity();
    penalty = penalty.saturating_add(severity.penalty());
    findings.push(Finding {
      category,
      severity,
      count,
      message,
    });
  }

  AccessibilityReport {
    score: 100_u8.saturating_sub(penalty),
    findings,
    passes,
  }
}
