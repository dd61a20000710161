#![allow(clippy::expect_used, reason = "Fine in tests")]
use quire_editor::{
  Dimensions,
  EditorError,
  EditorMode,
  EditorSession,
  MediaAttrs,
  NodeKind,
  NodePath,
  ResizeEvent,
  ResizeLimits,
  ResizeMachine,
  ResizeOutcome,
  SessionOptions,
  resize::{Corner, Point},
  slug::{anchor_slug, is_valid_slug},
  slugify,
  toc::Navigation,
};

fn drag_to(
  machine: &mut ResizeMachine,
  media: &MediaAttrs,
  corner: Corner,
  dx: f64,
  dy: f64,
  free_aspect: bool,
) -> ResizeOutcome {
  machine.handle(
    ResizeEvent::DragStart {
      corner,
      pointer: Point::new(0.0, 0.0),
      intrinsic: Dimensions::new(1, 1),
    },
    media,
  );
  machine.handle(
    ResizeEvent::DragMove {
      pointer: Point::new(dx, dy),
      free_aspect,
    },
    media,
  );
  machine.handle(ResizeEvent::DragEnd, media)
}

#[test]
fn committed_height_follows_the_aspect_ratio() {
  let limits = ResizeLimits::default();
  for (w, h) in [(400_u32, 300_u32), (640, 480), (333, 217), (1920, 1080)] {
    for dx in [-150.0, -37.0, 12.0, 55.5, 300.0] {
      for dy in [-80.0, 0.0, 41.0] {
        let media = MediaAttrs::new("a.png").with_size(Dimensions::new(w, h));
        let mut machine = ResizeMachine::new(limits);
        let outcome = drag_to(&mut machine, &media, Corner::SouthEast, dx, dy, false);

        if let ResizeOutcome::Commit(size) = outcome {
          let expected =
            (f64::from(size.width) * f64::from(h) / f64::from(w)).round() as u32;
          assert_eq!(size.height, expected, "{w}x{h} dragged by ({dx}, {dy})");
          assert!(size.width >= limits.min_width && size.height >= limits.min_height);
        } else {
          assert_eq!(
            machine.state(),
            quire_editor::resize::ResizeState::Idle,
            "non-committing drag must settle, got {outcome:?}"
          );
        }
      }
    }
  }
}

#[test]
fn drags_below_the_floor_never_commit_below_it() {
  let media = MediaAttrs::new("a.png").with_size(Dimensions::new(100, 60));
  let mut machine = ResizeMachine::new(ResizeLimits::default());
  let outcome = drag_to(&mut machine, &media, Corner::SouthEast, -90.0, 0.0, false);
  assert_eq!(outcome, ResizeOutcome::Reverted);
}

#[test]
fn pointer_events_after_commit_are_ignored() {
  let media = MediaAttrs::new("a.png").with_size(Dimensions::new(200, 100));
  let mut machine = ResizeMachine::new(ResizeLimits::default());
  let outcome = drag_to(&mut machine, &media, Corner::SouthEast, 50.0, 0.0, false);
  assert!(matches!(outcome, ResizeOutcome::Commit(_)), "got {outcome:?}");
  assert!(!machine.wants_pointer_events());
  assert_eq!(machine.handle(ResizeEvent::DragEnd, &media), ResizeOutcome::Ignored);
  machine.finish_commit();
  machine.finish_commit();
  assert_eq!(machine.handle(ResizeEvent::DragEnd, &media), ResizeOutcome::Ignored);
}

#[test]
fn slugify_is_idempotent_and_well_formed() {
  let inputs = [
    "Hello, World!",
    "  --Leading and trailing--  ",
    "Crème brûlée à la mode",
    "My Post!!",
    "snake_case_and   spaces",
    "日本語 only",
    "",
    "---",
    "1.2. Numbered heading",
  ];
  for input in inputs {
    let once = slugify(input);
    assert_eq!(slugify(&once), once, "not idempotent for {input:?}");
    assert!(
      once.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'),
      "bad characters in {once:?}"
    );
    assert!(!once.starts_with('-') && !once.ends_with('-'), "edge hyphen in {once:?}");
    assert!(once.is_empty() || is_valid_slug(&once), "{once:?} should be valid");
  }
  assert_eq!(slugify("Crème brûlée"), "creme-brulee");
  assert_eq!(anchor_slug("2.1. Getting Started"), "21-getting-started");
}

#[test]
fn generated_ordinals_reset_under_shallower_headings() {
  let (mut session, error) = EditorSession::from_markup(
    "<h1>A</h1><h2>B</h2><h2>C</h2><h1>D</h1>",
    SessionOptions::default(),
  );
  assert!(error.is_none());

  let entries = session.insert_toc().expect("toc inserts");
  let ordinals: Vec<&str> = entries.iter().map(|e| e.ordinal.as_str()).collect();
  assert_eq!(ordinals, vec!["1.", "1.1.", "1.2.", "2."]);
  let anchors: Vec<&str> = entries.iter().map(|e| e.anchor_id.as_str()).collect();
  assert_eq!(anchors, vec!["a", "b", "c", "d"]);
}

#[test]
fn toc_is_inserted_at_the_cursor_and_links_resolve() {
  let (mut session, _) = EditorSession::from_markup(
    "<h2>✅ Setup</h2><p>text</p><h2>Usage</h2>",
    SessionOptions::default(),
  );
  session
    .document_mut()
    .expect("structured")
    .set_cursor(&NodePath::root(), 0)
    .expect("cursor at the top");
  session.insert_toc().expect("toc inserts");

  let markup = session.markup();
  assert!(
    markup.starts_with("<ul><li><p><a href=\"#setup\">1. Setup</a></p></li>"),
    "got {markup}"
  );
  assert!(markup.contains("<h2 id=\"setup\" data-ordinal=\"1.\">"), "got {markup}");

  let document = session.document().expect("structured");
  let first_heading = document
    .descendants()
    .find(|(_, node)| node.kind() == NodeKind::Heading)
    .map(|(path, _)| path)
    .expect("heading exists");
  assert_eq!(
    session.follow_link("#setup"),
    Navigation::ScrollTo {
      path: first_heading,
    }
  );
  assert_eq!(
    session.follow_link("#nowhere"),
    Navigation::MissingAnchor {
      anchor: "nowhere".to_string(),
    }
  );
  assert_eq!(session.follow_link("https://example.com"), Navigation::External);
}

#[test]
fn decimal_numbers_are_not_mistaken_for_ordinals() {
  let (mut session, error) = EditorSession::from_markup(
    "<h2>1.5 million users</h2><h2>2. Next steps</h2>",
    SessionOptions::default(),
  );
  assert!(error.is_none());

  let entries = session.insert_toc().expect("toc inserts");
  assert_eq!(entries[0].display_text, "1.5 million users");
  assert_eq!(entries[0].ordinal, "1.");
  assert_eq!(entries[1].display_text, "Next steps");
  assert_eq!(entries[1].ordinal, "2.");
}

#[test]
fn refused_toc_leaves_headings_untouched() {
  let original = "<h2>Setup</h2>\n<p>text</p>";
  let (mut session, _) = EditorSession::from_markup(original, SessionOptions::default());
  session
    .document_mut()
    .expect("structured")
    .set_cursor(&NodePath::root().child(1), 0)
    .expect("cursor inside the paragraph");

  assert!(matches!(session.insert_toc(), Err(EditorError::Document(_))));
  assert_eq!(session.markup(), original);
}

#[test]
fn empty_document_gets_no_toc() {
  let mut session = EditorSession::default();
  let entries = session.insert_toc().expect("nothing to index");
  assert!(entries.is_empty());
  assert_eq!(session.markup(), "");
}

#[test]
fn failed_mode_switch_keeps_raw_text_and_mode() {
  let mut session = EditorSession::default();
  session.switch_to_raw();
  let broken = "<table><tr><td>1</td></tr><tr><td>2</td><td>3</td></tr></table>";
  session.set_raw_markup(broken).expect("raw mode accepts text");

  let error = session.switch_to_structured().expect_err("ragged table");
  assert!(matches!(error, EditorError::Parse(_)), "got {error:?}");
  assert_eq!(session.mode(), EditorMode::RawMarkup);
  assert_eq!(session.markup(), broken);

  session
    .set_raw_markup("<p>fixed</p>")
    .expect("raw mode accepts text");
  session.switch_to_structured().expect("valid markup");
  assert_eq!(session.mode(), EditorMode::Structured);
  assert_eq!(session.markup(), "<p>fixed</p>");
}

#[test]
fn unparseable_stored_markup_opens_in_raw_mode() {
  let (session, error) =
    EditorSession::from_markup("<p>open", SessionOptions::default());
  assert!(error.is_some());
  assert_eq!(session.mode(), EditorMode::RawMarkup);
  assert_eq!(session.raw_markup(), Some("<p>open"));
}

#[test]
fn valid_image_is_inserted_as_data_uri() {
  // 1x1 transparent PNG header is enough for sniffing.
  let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];
  let mut session = EditorSession::default();
  let path = session
    .insert_image(&png, Some("image/png"), "Logo")
    .expect("png is accepted");
  let media = session
    .document()
    .expect("structured")
    .node(&path)
    .and_then(MediaAttrs::of)
    .expect("media node inserted");
  assert!(media.src.starts_with("data:image/png;base64,"));
  assert_eq!(media.alt.as_deref(), Some("Logo"));
}

#[test]
fn oversized_image_is_rejected_before_mutation() {
  let options = SessionOptions {
    upload: quire_editor::UploadLimits {
      max_bytes: 4,
      ..quire_editor::UploadLimits::default()
    },
    ..SessionOptions::default()
  };
  let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
  let mut session = EditorSession::new(options);
  let error = session
    .insert_image(&png, Some("image/png"), "x")
    .expect_err("too large");
  assert!(matches!(error, EditorError::Upload(_)), "got {error:?}");
  assert_eq!(session.markup(), "");
}
