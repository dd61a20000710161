#![allow(clippy::expect_used, reason = "Fine in tests")]
use std::time::{Duration, Instant};

use quire_editor::{
  ContentAnalysis,
  ContentInput,
  DocumentStats,
  EditorSession,
  LiveAnalysis,
  NodePath,
  PostFields,
  Rating,
  Section,
  SessionOptions,
  a11y::{Category, Severity},
  analyze,
  check_accessibility,
};

fn body_of_length(chars: usize) -> String {
  // Three paragraphs, so only the length varies between calls.
  let per_paragraph = chars / 3;
  let paragraph = "lorem ipsum ".repeat(per_paragraph / 12 + 1);
  let paragraph: String = paragraph.chars().take(per_paragraph).collect();
  format!("<p>{paragraph}</p><p>{paragraph}</p><p>{paragraph}</p>")
}

#[test]
fn longer_bodies_never_score_lower() {
  let mut previous = f64::MIN;
  for length in (500..=3500).step_by(250) {
    let input = ContentInput {
      body: body_of_length(length),
      ..ContentInput::default()
    };
    let points = analyze(&input)
      .sections
      .get(&Section::Body)
      .map(|score| score.points)
      .expect("body is always scored");
    assert!(
      points >= previous,
      "body score dropped from {previous} to {points} at {length} characters"
    );
    previous = points;
  }
}

#[test]
fn short_everything_lands_in_the_bottom_band() {
  let input = ContentInput {
    title: "a".repeat(25),
    description: "b".repeat(100),
    slug: "My Post!!".to_string(),
    body: format!("<p>{}</p>", "c".repeat(400)),
    ..ContentInput::default()
  };
  let analysis = analyze(&input);

  let has = |section: Section, needle: &str| {
    analysis
      .feedback(section)
      .iter()
      .any(|finding| finding.contains(needle))
  };
  assert!(has(Section::Title, "Title is too short"));
  assert!(has(Section::Description, "Description is too short"));
  assert!(has(Section::Body, "Content is too short"));
  assert!(has(Section::Slug, "invalid characters"));
  assert!(
    analysis.rating <= Rating::Poor,
    "expected Poor or Very Poor, got {} ({}%)",
    analysis.rating,
    analysis.overall_score_percent
  );
}

#[test]
fn image_without_alt_is_one_error() {
  let report = check_accessibility("<p>Intro text for the image.</p><img src=\"photo.png\">");
  let errors: Vec<_> = report.errors().collect();
  assert_eq!(errors.len(), 1, "got {:?}", report.findings);
  assert_eq!(errors[0].category, Category::ImageAlt);
  assert!(errors[0].message.contains("alt text"));
  assert_eq!(report.score, 100 - Severity::Error.penalty());
}

#[test]
fn seo_fields_fall_back_to_general_fields() {
  let mut fields = PostFields::default();
  fields.set_title("Writing accessible blog posts with good headings");
  fields.set_description("How to structure posts so readers and crawlers can follow them.");
  fields.edit(quire_editor::Field::SeoTitle, "  ");

  let input = fields.analysis_input("<p>body</p>");
  assert_eq!(input.title, fields.title());
  assert_eq!(input.slug, "writing-accessible-blog-posts-with-good-headings");
}

#[test]
fn reading_time_rounds_up() {
  let words = vec!["word"; 226].join(" ");
  let stats = DocumentStats::of_markup(&format!("<p>{words}</p>"), 225);
  assert_eq!(stats.word_count, 226);
  assert_eq!(stats.estimated_read_minutes, 2);
}

#[test]
fn reports_serialize_with_camel_case_keys() {
  let analysis = analyze(&ContentInput::default());
  let json = serde_json::to_value(&analysis).expect("serializable");
  assert!(json.get("overallScorePercent").is_some(), "got {json}");
  assert!(json.get("topRecommendations").is_some(), "got {json}");

  let stats = DocumentStats::of_markup("<p>one two</p>", 225);
  let json = serde_json::to_value(stats).expect("serializable");
  assert_eq!(json.get("wordCount").and_then(serde_json::Value::as_u64), Some(2));
}

#[test]
fn live_analysis_waits_for_a_quiet_period() {
  let start = Instant::now();
  let mut live = LiveAnalysis::new(Duration::from_millis(300), 225);
  live.changed(start, ContentInput {
    body: "<img src=\"a.png\">".to_string(),
    ..ContentInput::default()
  });
  assert!(live.poll(start + Duration::from_millis(299)).is_none());

  let score = live
    .poll(start + Duration::from_millis(300))
    .map(|report| report.accessibility.score);
  assert_eq!(score, Some(80));
  assert!(live.latest().is_some());
}

fn section_points(analysis: &ContentAnalysis, section: Section) -> f64 {
  analysis
    .sections
    .get(&section)
    .map(|score| score.points)
    .expect("every section is scored")
}

#[test]
fn toc_and_table_wrappers_are_not_prose_paragraphs() {
  let prose = "<h2>Sun</h2><p>Tomatoes need at least six hours of direct sun every day.</p>\
               <h2>Water</h2><p>Water deeply at the base twice a week, never on the leaves.</p>\
               <table><tr><th>Week</th><th>Litres</th></tr><tr><td>1</td><td>2</td></tr></table>";
  let (mut session, error) = EditorSession::from_markup(prose, SessionOptions::default());
  assert!(error.is_none(), "got {error:?}");
  session
    .document_mut()
    .expect("structured mode")
    .set_cursor(&NodePath::root(), 0)
    .expect("cursor at the top");
  let entries = session.insert_toc().expect("toc inserted");
  assert_eq!(entries.len(), 2);

  let analyze_body = |body: String| {
    analyze(&ContentInput {
      body,
      ..ContentInput::default()
    })
  };
  let before = analyze_body(prose.to_string());
  let after = analyze_body(session.markup());

  assert!(
    (section_points(&after, Section::Readability) - f64::from(Section::Readability.weight())).abs()
      < f64::EPSILON,
    "got {:?}",
    after.feedback(Section::Readability)
  );
  assert!(
    (section_points(&before, Section::Body) - section_points(&after, Section::Body)).abs()
      < f64::EPSILON
  );
}

#[test]
fn symbol_keywords_earn_title_credit() {
  let analysis = analyze(&ContentInput {
    title: "Modern C++ patterns for embedded firmware".to_string(),
    keywords: vec!["C++".to_string()],
    ..ContentInput::default()
  });
  assert!(
    analysis
      .feedback(Section::Title)
      .iter()
      .any(|finding| finding == "Title contains 1 of 1 target keywords"),
    "got {:?}",
    analysis.feedback(Section::Title)
  );
}
