//! The individual sub-scores. Each scorer returns the points earned out of
//! its section's weight plus the findings that explain them.
use std::fmt;

use log::error;
use regex::Regex;
use serde::Serialize;

use super::{input::ContentInput, text::BodyFacts};
use crate::slug::is_valid_slug;

/// A scored aspect of the content, with its weight in the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
  Title,
  Description,
  Keywords,
  Body,
  Headings,
  Images,
  Links,
  Readability,
  Slug,
  Metadata,
  Social,
}

impl Section {
  pub const ALL: [Self; 11] = [
    Self::Title,
    Self::Description,
    Self::Keywords,
    Self::Body,
    Self::Headings,
    Self::Images,
    Self::Links,
    Self::Readability,
    Self::Slug,
    Self::Metadata,
    Self::Social,
  ];

  #[must_use]
  pub const fn weight(self) -> u32 {
    match self {
      Self::Title | Self::Keywords => 15,
      Self::Body => 20,
      Self::Description
      | Self::Headings
      | Self::Images
      | Self::Links
      | Self::Readability
      | Self::Social => 10,
      Self::Slug | Self::Metadata => 5,
    }
  }

  #[must_use]
  pub const fn label(self) -> &'static str {
    match self {
      Self::Title => "title",
      Self::Description => "description",
      Self::Keywords => "keywords",
      Self::Body => "body",
      Self::Headings => "headings",
      Self::Images => "images",
      Self::Links => "links",
      Self::Readability => "readability",
      Self::Slug => "slug",
      Self::Metadata => "metadata",
      Self::Social => "social",
    }
  }
}

impl fmt::Display for Section {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

/// Points earned by one section and the findings behind them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionScore {
  pub points:   f64,
  pub weight:   u32,
  pub findings: Vec<String>,
}

impl SectionScore {
  fn new(section: Section) -> Self {
    Self {
      points:   0.0,
      weight:   section.weight(),
      findings: Vec::new(),
    }
  }

  /// Add `fraction` of the weight.
  fn credit(&mut self, fraction: f64) {
    self.points += f64::from(self.weight) * fraction;
  }

  fn note(&mut self, finding: impl Into<String>) {
    self.findings.push(finding.into());
  }

  /// Whether the section earned less than 70% of its weight.
  #[must_use]
  pub fn needs_work(&self) -> bool {
    self.points < f64::from(self.weight) * 0.7
  }
}

/// `\b` only holds next to a word character. Next to a symbol such as the
/// `+` of `C++`, `\B` asserts the neighbour is not a word character either.
fn edge_assertion(edge: Option<char>) -> &'static str {
  if edge.is_some_and(|c| c.is_alphanumeric() || c == '_') {
    r"\b"
  } else {
    r"\B"
  }
}

fn keyword_pattern(keyword: &str) -> Option<Regex> {
  let keyword = keyword.trim();
  if keyword.is_empty() {
    return None;
  }
  Regex::new(&format!(
    r"(?i){}{}{}",
    edge_assertion(keyword.chars().next()),
    regex::escape(keyword),
    edge_assertion(keyword.chars().next_back())
  ))
  .map_err(|e| error!("Failed to compile keyword pattern for '{keyword}': {e}"))
  .ok()
}

fn contains_keyword(haystack: &str, keyword: &str) -> bool {
  keyword_pattern(keyword).is_some_and(|re| re.is_match(haystack))
}

fn ratio(part: usize, whole: usize) -> f64 {
  if whole == 0 {
    0.0
  } else {
    part as f64 / whole as f64
  }
}

/// Shared shape of the title and description scorers: 60% for length, 40%
/// for keyword coverage.
fn length_and_keywords(
  section: Section,
  name: &str,
  text: &str,
  range: (usize, usize),
  input: &ContentInput,
) -> SectionScore {
  let mut score = SectionScore::new(section);
  let text = text.trim();
  let len = text.chars().count();
  let (min, max) = range;

  if len == 0 {
    score.note(format!("{name} is missing"));
  } else if len < min {
    score.credit(0.6 * 0.5);
    score.note(format!(
      "{name} is too short ({len} characters; aim for {min}-{max})"
    ));
  } else if len > max {
    score.credit(0.6 * 0.5);
    score.note(format!(
      "{name} is too long ({len} characters; aim for {min}-{max})"
    ));
  } else {
    score.credit(0.6);
    score.note(format!("{name} length is good ({len} characters)"));
  }

  let keywords: Vec<&str> = input.target_keywords().collect();
  if !keywords.is_empty() && len > 0 {
    let found = keywords
      .iter()
      .filter(|keyword| contains_keyword(text, keyword))
      .count();
    score.credit(0.4 * ratio(found, keywords.len()));
    if found == 0 {
      score.note(format!("{name} does not contain any target keyword"));
    } else {
      score.note(format!(
        "{name} contains {found} of {} target keywords",
        keywords.len()
      ));
    }
  }
  score
}

pub fn title(input: &ContentInput) -> SectionScore {
  length_and_keywords(Section::Title, "Title", &input.title, (30, 60), input)
}

pub fn description(input: &ContentInput) -> SectionScore {
  length_and_keywords(
    Section::Description,
    "Description",
    &input.description,
    (120, 160),
    input,
  )
}

pub fn keywords(input: &ContentInput, facts: &BodyFacts) -> SectionScore {
  let mut score = SectionScore::new(Section::Keywords);
  let keywords: Vec<&str> = input.target_keywords().collect();
  if keywords.is_empty() {
    score.note("No target keywords set");
    return score;
  }

  let occurrences: usize = keywords
    .iter()
    .filter_map(|keyword| keyword_pattern(keyword))
    .map(|re| re.find_iter(&facts.visible_text).count())
    .sum();
  let density = ratio(occurrences, facts.word_count()) * 100.0;

  if density > 5.0 {
    score.credit(0.3);
    score.note(format!(
      "Keyword density is too high ({density:.1}%); this reads as keyword stuffing"
    ));
  } else if density >= 0.5 {
    score.credit(0.9);
    score.note(format!("Keyword density is good ({density:.1}%)"));
  } else {
    score.credit(0.3);
    score.note(format!("Keyword density is too low ({density:.1}%)"));
  }

  let first_paragraph = facts.paragraphs.first().map_or("", String::as_str);
  if keywords
    .iter()
    .any(|keyword| contains_keyword(first_paragraph, keyword))
  {
    score.credit(0.1);
    score.note("A target keyword appears in the first paragraph");
  } else {
    score.note("No target keyword in the first paragraph");
  }
  score
}

pub fn body(facts: &BodyFacts) -> SectionScore {
  let mut score = SectionScore::new(Section::Body);
  let len = facts.visible_len();
  if len < 1000 {
    score.note(format!(
      "Content is too short ({len} characters; aim for at least 1000)"
    ));
  } else if len < 3000 {
    score.credit(0.5);
    score.note(format!("Content length is acceptable ({len} characters)"));
  } else {
    score.credit(0.7);
    score.note(format!("Content length is good ({len} characters)"));
  }

  let paragraphs = facts.paragraphs.len();
  score.credit(0.3 * ratio(paragraphs.min(3), 3));
  if paragraphs < 3 {
    score.note(format!(
      "Only {paragraphs} paragraph(s); break the text into at least 3"
    ));
  }
  score
}

pub fn headings(facts: &BodyFacts) -> SectionScore {
  let mut score = SectionScore::new(Section::Headings);
  let count = facts.headings.len();
  score.credit(ratio(count.min(3), 3));
  if count == 0 {
    score.note("No headings; add subheadings to structure the content");
  } else {
    score.note(format!("{count} heading(s) found"));
  }
  let h1 = facts.headings.iter().filter(|h| h.level == 1).count();
  if h1 > 1 {
    score.note(format!("Multiple H1 headings found ({h1})"));
  }
  score
}

pub fn images(facts: &BodyFacts) -> SectionScore {
  let mut score = SectionScore::new(Section::Images);
  let total = facts.images.len();
  if total == 0 {
    score.note("No images found");
    return score;
  }
  let with_alt = facts.images.iter().filter(|image| image.has_alt()).count();
  score.credit(ratio(with_alt, total));
  if with_alt == total {
    score.note(format!("All {total} image(s) have alt text"));
  } else {
    score.note(format!("{} of {total} image(s) lack alt text", total - with_alt));
  }
  score
}

pub fn links(facts: &BodyFacts) -> SectionScore {
  let mut score = SectionScore::new(Section::Links);
  let total = facts.links.len();
  score.credit(ratio(total.min(3), 3));
  if total == 0 {
    score.note("No links found");
  } else {
    let external = facts.links.iter().filter(|link| link.is_external()).count();
    score.note(format!(
      "{} internal and {external} external link(s)",
      total - external
    ));
  }
  score
}

pub fn readability(facts: &BodyFacts) -> SectionScore {
  let mut score = SectionScore::new(Section::Readability);
  let total = facts.paragraphs.len();
  if total == 0 {
    score.note("No paragraphs to assess");
    return score;
  }
  let lengths: Vec<usize> = facts
    .paragraphs
    .iter()
    .map(|p| p.chars().count())
    .collect();
  let short = lengths.iter().filter(|len| **len < 40).count();
  let long = lengths.iter().filter(|len| **len > 1000).count();
  score.credit(ratio(total - short - long, total));
  if short > 0 {
    score.note(format!("{short} paragraph(s) shorter than 40 characters"));
  }
  if long > 0 {
    score.note(format!("{long} paragraph(s) longer than 1000 characters"));
  }
  if short == 0 && long == 0 {
    score.note("Paragraph lengths are balanced");
  }
  score
}

pub fn slug(input: &ContentInput) -> SectionScore {
  let mut score = SectionScore::new(Section::Slug);
  let slug = input.slug.as_str();
  if slug.is_empty() {
    score.note("Slug is missing");
    return score;
  }

  let len = slug.chars().count();
  if (3..=75).contains(&len) {
    score.credit(0.5);
  } else {
    score.note(format!("Slug length should be 3-75 characters (is {len})"));
  }

  if is_valid_slug(slug) {
    score.credit(0.5);
    score.note("Slug format is good");
  } else if slug
    .chars()
    .any(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'))
  {
    score.note("Slug contains invalid characters (use a-z, 0-9 and hyphens)");
  } else {
    score.note("Slug has doubled, leading or trailing hyphens");
  }
  score
}

pub fn metadata(input: &ContentInput) -> SectionScore {
  let mut score = SectionScore::new(Section::Metadata);
  let meta = &input.metadata;
  let checks = [
    (!meta.title.trim().is_empty(), "SEO title"),
    (!meta.description.trim().is_empty(), "SEO description"),
    (meta.keywords.iter().any(|k| !k.trim().is_empty()), "SEO keywords"),
    (!meta.canonical_url.trim().is_empty(), "Canonical URL"),
  ];
  for (present, name) in checks {
    if present {
      score.credit(0.25);
    } else {
      score.note(format!("{name} is missing"));
    }
  }
  if score.findings.is_empty() {
    score.note("All metadata fields are set");
  }
  score
}

pub fn social(input: &ContentInput) -> SectionScore {
  let mut score = SectionScore::new(Section::Social);
  let targets = [
    ("Primary", &input.social.primary),
    ("Secondary", &input.social.secondary),
  ];
  for (name, target) in targets {
    let parts = [
      (&target.title, 2.0, "title"),
      (&target.description, 2.0, "description"),
      (&target.image, 1.0, "image"),
    ];
    for (value, points, part) in parts {
      if value.trim().is_empty() {
        score.note(format!("{name} sharing {part} is missing"));
      } else {
        score.points += points;
      }
    }
  }
  if score.findings.is_empty() {
    score.note("Sharing previews are complete");
  }
  score
}
