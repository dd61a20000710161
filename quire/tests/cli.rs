#![allow(clippy::expect_used, reason = "Fine in tests")]
use std::{fs, path::PathBuf};

use clap::Parser;
use quire::{
  cli::{Cli, Commands},
  commands::{self, PostMeta, render},
};
use quire_config::Config;
use tempfile::TempDir;

const POST: &str = "<h1>Growing tomatoes</h1><p>Tomatoes like sun and steady \
                    water.</p><h2>Soil</h2><p>Loose, rich soil.</p><h2>Water</h2><p>Water \
                    deeply twice a week.</p>";

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
  let path = dir.path().join(name);
  fs::write(&path, content).expect("write fixture");
  path
}

#[test]
fn parses_global_flags_after_the_subcommand() {
  let cli = Cli::try_parse_from([
    "quire",
    "analyze",
    "post.html",
    "--keyword",
    "tomatoes",
    "-k",
    "soil",
    "--json",
    "--config",
    "analysis.debounce_ms=100",
  ])
  .expect("arguments parse");

  assert!(cli.json);
  assert_eq!(cli.config_overrides, vec!["analysis.debounce_ms=100"]);
  assert!(matches!(
    &cli.command,
    Commands::Analyze { file, keywords, .. }
      if file == &PathBuf::from("post.html") && keywords == &["tomatoes", "soil"]
  ));
}

#[test]
fn validate_requires_a_file() {
  assert!(Cli::try_parse_from(["quire", "validate"]).is_err());
}

#[test]
fn init_refuses_to_overwrite_without_force() {
  let dir = TempDir::new().expect("tempdir");
  let path = dir.path().join("quire.toml");

  commands::init(&path, "toml", false).expect("first init");
  assert!(commands::init(&path, "toml", false).is_err());
  commands::init(&path, "toml", true).expect("forced init");

  let config = Config::from_file(&path).expect("generated config loads");
  assert_eq!(config, Config::default());
}

#[test]
fn analyze_falls_back_to_the_first_heading_for_the_title() {
  let dir = TempDir::new().expect("tempdir");
  let path = write(&dir, "post.html", POST);

  let report = commands::analyze_file(&path, PostMeta::default(), &Config::default())
    .expect("analysis runs");
  assert!(
    !report
      .analysis
      .all_findings()
      .any(|finding| finding == "Title is missing")
  );
  assert!(report.stats.word_count > 10);

  let json = render(&report, true).expect("renders as JSON");
  let value: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");
  assert!(value["analysis"]["overallScorePercent"].is_u64());
}

#[test]
fn toc_writes_numbered_headings_and_contents() {
  let dir = TempDir::new().expect("tempdir");
  let input = write(&dir, "post.html", POST);
  let output = dir.path().join("out/post.html");

  let report =
    commands::toc_file(&input, Some(&output), &Config::default()).expect("toc inserted");
  assert!(report.markup.is_none());
  let labels: Vec<String> = report.entries.iter().map(|entry| entry.label()).collect();
  assert_eq!(labels, ["1. Growing tomatoes", "1.1. Soil", "1.2. Water"]);

  let written = fs::read_to_string(&output).expect("output written");
  assert!(written.contains("id=\"soil\""));
  assert!(written.contains("href=\"#water\""));
}

#[test]
fn toc_rejects_markup_the_editor_cannot_parse() {
  let dir = TempDir::new().expect("tempdir");
  let input = write(&dir, "broken.html", "<h1>Open");
  assert!(commands::toc_file(&input, None, &Config::default()).is_err());
}

#[test]
fn validate_reports_positions() {
  let dir = TempDir::new().expect("tempdir");
  let good = write(&dir, "good.html", POST);
  let bad = write(&dir, "bad.html", "<p>one</p>\n<p>two</em>");

  let report = commands::validate(&[good, bad]);
  assert!(!report.all_valid());
  assert!(report.results[0].valid);
  assert_eq!(report.results[1].line, Some(2));

  let text = render(&report, false).expect("renders as text");
  assert!(text.contains("bad.html:2:"));
}

#[test]
fn import_then_export_markdown() {
  let dir = TempDir::new().expect("tempdir");
  let input = write(&dir, "notes.md", "# Notes\n\nSome **bold** text.\n");
  let markup_path = dir.path().join("notes.html");
  let export_path = dir.path().join("notes.export.md");

  assert!(
    commands::import(&input, Some(&markup_path))
      .expect("import succeeds")
      .is_none()
  );
  commands::export(&markup_path, &export_path, "Notes").expect("export succeeds");

  let markdown = fs::read_to_string(&export_path).expect("export written");
  assert!(markdown.contains("# Notes"));
  assert!(markdown.contains("**bold**"));
}

#[test]
fn audit_lists_worst_posts_first() {
  let dir = TempDir::new().expect("tempdir");
  write(&dir, "empty.html", "<p>Hi</p>");
  fs::create_dir(dir.path().join("drafts")).expect("subdir");
  write(&dir, "drafts/full.html", POST);
  write(&dir, "ignored.txt", "not a post");

  let report = commands::audit(dir.path(), &Config::default()).expect("audit runs");
  assert_eq!(report.posts.len(), 2);
  assert!(report.posts[0].score_percent <= report.posts[1].score_percent);
  assert_eq!(report.posts[0].file, PathBuf::from("empty.html"));

  let text = render(&report, false).expect("renders as text");
  assert!(text.starts_with("Post"));
}

#[test]
fn audit_rejects_a_file() {
  let dir = TempDir::new().expect("tempdir");
  let file = write(&dir, "post.html", POST);
  assert!(commands::audit(&file, &Config::default()).is_err());
}
