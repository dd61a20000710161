//! Content quality scoring.
//!
//! [`analyze`] is a pure function: it grades exactly the fields it is given
//! against weighted heuristics and never touches the document. The weights
//! add up to 120 and the sum is normalized to a percentage.
use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

pub mod input;
pub mod sections;
pub mod text;

pub use input::{ContentInput, SeoMetadata, SharingTarget, SocialFields};
pub use sections::{Section, SectionScore};
pub use text::{BodyFacts, DocumentStats};

/// Letter-style band for an overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Rating {
  VeryPoor,
  Poor,
  Average,
  Good,
  Excellent,
}

impl Rating {
  #[must_use]
  pub const fn from_percent(percent: u8) -> Self {
    match percent {
      80.. => Self::Excellent,
      60..=79 => Self::Good,
      40..=59 => Self::Average,
      20..=39 => Self::Poor,
      _ => Self::VeryPoor,
    }
  }
}

impl fmt::Display for Rating {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Excellent => "Excellent",
      Self::Good => "Good",
      Self::Average => "Average",
      Self::Poor => "Poor",
      Self::VeryPoor => "Very Poor",
    })
  }
}

/// Sections checked for recommendations, in priority order.
const RECOMMENDATION_ORDER: [Section; 5] = [
  Section::Title,
  Section::Description,
  Section::Body,
  Section::Metadata,
  Section::Social,
];

const fn recommendation(section: Section) -> &'static str {
  match section {
    Section::Title => {
      "Write a title of 30-60 characters that includes your target keywords"
    },
    Section::Description => {
      "Write a description of 120-160 characters that includes your target \
       keywords"
    },
    Section::Body => "Expand the content to at least 1000 characters across several paragraphs",
    Section::Metadata => "Fill in the SEO title, description, keywords and canonical URL",
    Section::Social => "Add titles, descriptions and images for social sharing",
    _ => "",
  }
}

/// The result of scoring a post.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentAnalysis {
  pub overall_score_percent: u8,
  pub rating:                Rating,
  pub sections:              IndexMap<Section, SectionScore>,
  /// At most three, most important first.
  pub top_recommendations:   Vec<String>,
  /// Issues reported independently of the score.
  pub warnings:              Vec<String>,
  pub social_score_percent:  u8,
}

impl ContentAnalysis {
  /// Findings for one section, empty if it was not scored.
  #[must_use]
  pub fn feedback(&self, section: Section) -> &[String] {
    self
      .sections
      .get(&section)
      .map_or(&[], |score| score.findings.as_slice())
  }

  /// Every finding across all sections.
  pub fn all_findings(&self) -> impl Iterator<Item = &str> {
    self
      .sections
      .values()
      .flat_map(|score| score.findings.iter().map(String::as_str))
  }
}

fn percent(points: f64, of: f64) -> u8 {
  if of <= 0.0 {
    return 0;
  }
  (points / of * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Score a post.
#[must_use]
pub fn analyze(input: &ContentInput) -> ContentAnalysis {
  analyze_with_facts(input, &BodyFacts::extract(&input.body))
}

/// Score a post whose body has already been reduced to [`BodyFacts`].
#[must_use]
pub fn analyze_with_facts(input: &ContentInput, facts: &BodyFacts) -> ContentAnalysis {
  let mut scores = IndexMap::with_capacity(Section::ALL.len());
  for section in Section::ALL {
    let score = match section {
      Section::Title => sections::title(input),
      Section::Description => sections::description(input),
      Section::Keywords => sections::keywords(input, facts),
      Section::Body => sections::body(facts),
      Section::Headings => sections::headings(facts),
      Section::Images => sections::images(facts),
      Section::Links => sections::links(facts),
      Section::Readability => sections::readability(facts),
      Section::Slug => sections::slug(input),
      Section::Metadata => sections::metadata(input),
      Section::Social => sections::social(input),
    };
    scores.insert(section, score);
  }

  let total: f64 = scores.values().map(|score| score.points).sum();
  let max: u32 = scores.values().map(|score| score.weight).sum();
  let overall_score_percent = percent(total, f64::from(max));

  let top_recommendations = RECOMMENDATION_ORDER
    .iter()
    .filter(|section| scores.get(*section).is_some_and(SectionScore::needs_work))
    .map(|section| recommendation(*section).to_string())
    .take(3)
    .collect();

  let mut warnings = Vec::new();
  if input.metadata.no_index {
    warnings.push(
      "This post is marked no-index and will be hidden from search engines"
        .to_string(),
    );
  }

  let social_score_percent = scores
    .get(&Section::Social)
    .map_or(0, |score| percent(score.points, f64::from(score.weight)));

  ContentAnalysis {
    overall_score_percent,
    rating: Rating::from_percent(overall_score_percent),
    sections: scores,
    top_recommendations,
    warnings,
    social_score_percent,
  }
}
