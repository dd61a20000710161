#![allow(clippy::expect_used, reason = "Fine in tests")]
use std::{
  fs,
  time::{Duration, Instant},
};

use quire_editor::{
  Autosave,
  AutosaveOptions,
  autosave::NoticeKind,
  convert::{export_file, import_file, import_markdown},
  parse,
};
use tempfile::TempDir;

#[test]
fn autosave_writes_snapshots_to_disk() {
  let dir = TempDir::new().expect("temp dir");
  let options = AutosaveOptions {
    snapshot_path: dir.path().join("drafts/post.html"),
    interval: Duration::from_secs(10),
    ..AutosaveOptions::default()
  };
  let mut autosave = Autosave::to_file(&options);
  let start = Instant::now();

  let kind = autosave.tick(start, "<p>first</p>").map(|notice| notice.kind);
  assert_eq!(kind, Some(NoticeKind::Saved));
  autosave.tick(start + Duration::from_secs(11), "<p>second</p>");

  let saved = fs::read_to_string(&options.snapshot_path).expect("snapshot exists");
  assert_eq!(saved, "<p>second</p>");
  assert!(!dir.path().join("drafts/post.html.tmp").exists());
}

#[test]
fn autosave_failure_is_a_notice_not_an_error() {
  let dir = TempDir::new().expect("temp dir");
  // A directory where the snapshot file should be makes every write fail.
  let blocked = dir.path().join("blocked");
  fs::create_dir_all(blocked.join("post.html")).expect("blocking dir");
  let options = AutosaveOptions {
    snapshot_path: blocked.join("post.html"),
    ..AutosaveOptions::default()
  };
  let mut autosave = Autosave::to_file(&options);

  let kind = autosave
    .tick(Instant::now(), "<p>x</p>")
    .map(|notice| notice.kind);
  assert_eq!(kind, Some(NoticeKind::Failed));
  let leftovers: Vec<_> = fs::read_dir(&blocked)
    .expect("blocked dir is readable")
    .filter_map(Result::ok)
    .map(|entry| entry.file_name())
    .collect();
  assert_eq!(leftovers, vec!["post.html"], "staging file left behind");
  autosave.dismiss_notice();
  assert!(autosave.notice().is_none());
}

#[test]
fn import_dispatches_on_extension() {
  let dir = TempDir::new().expect("temp dir");

  let html = dir.path().join("post.html");
  fs::write(&html, "<!DOCTYPE html><title>x</title><h1>Hi</h1><p>there").expect("write");
  assert_eq!(import_file(&html).expect("html imports"), "<h1>Hi</h1>\n<p>there</p>");

  let text = dir.path().join("notes.txt");
  fs::write(&text, "one & two\nthree").expect("write");
  assert_eq!(
    import_file(&text).expect("text imports"),
    "<p>one &amp; two<br>three</p>"
  );

  let markdown = dir.path().join("post.md");
  fs::write(&markdown, "# Title\n\nSome **bold** text.\n\n- a\n- b\n").expect("write");
  let markup = import_file(&markdown).expect("markdown imports");
  assert!(markup.starts_with("<h1>Title</h1>"), "got {markup}");
  assert!(markup.contains("<strong>bold</strong>"), "got {markup}");
  assert!(markup.contains("<ul><li>"), "got {markup}");
}

#[test]
fn imported_markdown_is_canonical() {
  let markup = import_markdown("| a | b |\n|---|---|\n| 1 | 2 |\n").expect("table imports");
  let document = parse(&markup).expect("canonical markup parses");
  assert_eq!(quire_editor::serialize(&document), markup);
}

#[test]
fn export_writes_html_and_markdown() {
  let dir = TempDir::new().expect("temp dir");
  let markup = "<h1>Title &amp; more</h1>\n<p>Some <b>bold</b> text</p>";

  let html = dir.path().join("out/post.html");
  export_file(&html, markup, "Title & more").expect("html export");
  let page = fs::read_to_string(&html).expect("exported");
  assert!(page.starts_with("<!DOCTYPE html>"));
  assert!(page.contains("<title>Title &amp; more</title>"));
  assert!(page.contains(markup));

  let md = dir.path().join("post.md");
  export_file(&md, markup, "ignored").expect("markdown export");
  assert_eq!(
    fs::read_to_string(&md).expect("exported"),
    "# Title & more\n\nSome **bold** text\n"
  );
}
