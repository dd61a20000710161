//! An editing session over one post body.
//!
//! Exactly one representation is canonical at a time: the structured
//! [`Document`] or the raw markup string. Switching to raw always succeeds;
//! switching back parses the text and, on failure, stays in raw mode with the
//! text untouched.
use std::{collections::HashMap, fmt};

use log::{debug, warn};
use serde::Serialize;

use crate::{
  analysis::DocumentStats,
  document::{Document, MediaAttrs, NodePath, media::size_patch},
  error::{DocumentError, EditorError, EditorResult},
  markup::{parse, serialize},
  resize::{ResizeEvent, ResizeLimits, ResizeMachine, ResizeOutcome},
  toc::{IndexerOptions, Navigation, TocEntry, index_headings, resolve_anchor, toc_fragment},
  upload::{UploadLimits, validate_image},
};

/// Which representation is canonical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EditorMode {
  Structured,
  RawMarkup,
}

impl fmt::Display for EditorMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Structured => "structured",
      Self::RawMarkup => "raw markup",
    })
  }
}

/// The canonical content of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Canonical {
  Structured(Document),
  Raw(String),
}

/// Tunables for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
  pub resize:           ResizeLimits,
  pub upload:           UploadLimits,
  pub indexer:          IndexerOptions,
  pub words_per_minute: u32,
}

impl Default for SessionOptions {
  fn default() -> Self {
    Self {
      resize:           ResizeLimits::default(),
      upload:           UploadLimits::default(),
      indexer:          IndexerOptions::default(),
      words_per_minute: 225,
    }
  }
}

#[derive(Debug)]
pub struct EditorSession {
  canonical: Canonical,
  options:   SessionOptions,
  /// One state machine per media node being resized, keyed by path. Cleared
  /// on any edit that can move nodes.
  resizers:  HashMap<NodePath, ResizeMachine>,
}

impl Default for EditorSession {
  fn default() -> Self {
    Self::new(SessionOptions::default())
  }
}

impl EditorSession {
  /// An empty document in structured mode.
  #[must_use]
  pub fn new(options: SessionOptions) -> Self {
    Self {
      canonical: Canonical::Structured(Document::new()),
      options,
      resizers: HashMap::new(),
    }
  }

  /// Open stored markup. Markup that does not parse opens in raw mode so the
  /// author can repair it; the error is returned alongside.
  #[must_use]
  pub fn from_markup(markup: &str, options: SessionOptions) -> (Self, Option<EditorError>) {
    let mut session = Self::new(options);
    match parse(markup) {
      Ok(document) => {
        session.canonical = Canonical::Structured(document);
        (session, None)
      },
      Err(e) => {
        warn!("Stored markup does not parse, opening in raw mode: {e}");
        session.canonical = Canonical::Raw(markup.to_string());
        (session, Some(e.into()))
      },
    }
  }

  #[must_use]
  pub const fn mode(&self) -> EditorMode {
    match self.canonical {
      Canonical::Structured(_) => EditorMode::Structured,
      Canonical::Raw(_) => EditorMode::RawMarkup,
    }
  }

  #[must_use]
  pub const fn canonical(&self) -> &Canonical {
    &self.canonical
  }

  #[must_use]
  pub const fn options(&self) -> &SessionOptions {
    &self.options
  }

  /// The canonical markup, serialized if the session is structured.
  #[must_use]
  pub fn markup(&self) -> String {
    match &self.canonical {
      Canonical::Structured(document) => serialize(document),
      Canonical::Raw(text) => text.clone(),
    }
  }

  /// Make the markup canonical. Always succeeds.
  pub fn switch_to_raw(&mut self) {
    if let Canonical::Structured(document) = &self.canonical {
      debug!("Switching to raw markup mode");
      self.canonical = Canonical::Raw(serialize(document));
      self.resizers.clear();
    }
  }

  /// Parse the raw markup and make the tree canonical.
  ///
  /// # Errors
  ///
  /// Returns [`EditorError::Parse`] if the text does not parse. The session
  /// stays in raw mode and the text is kept as it was.
  pub fn switch_to_structured(&mut self) -> EditorResult<()> {
    let Canonical::Raw(text) = &self.canonical else {
      return Ok(());
    };
    match parse(text) {
      Ok(document) => {
        debug!("Switching to structured mode");
        self.canonical = Canonical::Structured(document);
        Ok(())
      },
      Err(e) => {
        warn!("Refusing to leave raw markup mode: {e}");
        Err(e.into())
      },
    }
  }

  /// Replace the raw text.
  ///
  /// # Errors
  ///
  /// Returns [`EditorError::Mode`] unless the session is in raw mode.
  pub fn set_raw_markup(&mut self, text: impl Into<String>) -> EditorResult<()> {
    let actual = self.mode();
    if let Canonical::Raw(raw) = &mut self.canonical {
      *raw = text.into();
      return Ok(());
    }
    Err(EditorError::Mode {
      expected: EditorMode::RawMarkup,
      actual,
    })
  }

  #[must_use]
  pub fn raw_markup(&self) -> Option<&str> {
    match &self.canonical {
      Canonical::Raw(raw) => Some(raw),
      Canonical::Structured(_) => None,
    }
  }

  const fn wrong_mode(&self, expected: EditorMode) -> EditorError {
    EditorError::Mode {
      expected,
      actual: self.mode(),
    }
  }

  /// The tree.
  ///
  /// # Errors
  ///
  /// Returns [`EditorError::Mode`] unless the session is structured.
  pub fn document(&self) -> EditorResult<&Document> {
    match &self.canonical {
      Canonical::Structured(document) => Ok(document),
      Canonical::Raw(_) => Err(self.wrong_mode(EditorMode::Structured)),
    }
  }

  /// The tree, for structural edits. Any in-flight resize is dropped since
  /// the edit may move nodes.
  ///
  /// # Errors
  ///
  /// Returns [`EditorError::Mode`] unless the session is structured.
  pub fn document_mut(&mut self) -> EditorResult<&mut Document> {
    let expected = self.wrong_mode(EditorMode::Structured);
    self.resizers.clear();
    match &mut self.canonical {
      Canonical::Structured(document) => Ok(document),
      Canonical::Raw(_) => Err(expected),
    }
  }

  /// Feed a pointer event to the resize machine of the media node at `path`.
  ///
  /// A commit writes both dimensions in a single attribute update.
  ///
  /// # Errors
  ///
  /// Returns an error if the session is not structured or `path` does not
  /// point at a media node.
  pub fn resize_media(
    &mut self,
    path: &NodePath,
    event: ResizeEvent,
  ) -> EditorResult<ResizeOutcome> {
    let limits = self.options.resize;
    let Canonical::Structured(document) = &mut self.canonical else {
      return Err(EditorError::Mode {
        expected: EditorMode::Structured,
        actual:   EditorMode::RawMarkup,
      });
    };
    let media = document
      .node(path)
      .and_then(MediaAttrs::of)
      .ok_or_else(|| DocumentError::InvalidPath(path.clone()))?;

    let machine = self
      .resizers
      .entry(path.clone())
      .or_insert_with(|| ResizeMachine::new(limits));
    let outcome = machine.handle(event, &media);

    if let ResizeOutcome::Commit(size) = outcome {
      let written = document.update_attributes(path, &size_patch(Some(size)));
      machine.finish_commit();
      written?;
      debug!("Resized media at {path} to {}x{}", size.width, size.height);
    }
    if !machine.wants_pointer_events() {
      self.resizers.remove(path);
    }
    Ok(outcome)
  }

  /// Index the headings and insert a table of contents at the selection.
  ///
  /// Returns the entries, or an empty list without touching the document when
  /// there are no headings.
  ///
  /// # Errors
  ///
  /// Returns an error if the session is not structured or the list cannot be
  /// placed at the selection. Headings are left as they were on error.
  pub fn insert_toc(&mut self) -> EditorResult<Vec<TocEntry>> {
    let indexer = self.options.indexer;
    let document = self.document_mut()?;
    // Index and insert on a draft so a refused insert leaves no renumbered
    // headings behind.
    let mut draft = document.clone();
    let entries = index_headings(&mut draft, indexer)?;
    if let Some(fragment) = toc_fragment(&entries) {
      draft.insert_at_selection(vec![fragment])?;
    }
    *document = draft;
    Ok(entries)
  }

  /// Validate an image payload and insert it at the selection as a data URI.
  ///
  /// # Errors
  ///
  /// Returns [`EditorError::Upload`] before any change to the document when
  /// the payload is rejected.
  pub fn insert_image(
    &mut self,
    bytes: &[u8],
    declared_mime: Option<&str>,
    alt: &str,
  ) -> EditorResult<NodePath> {
    self.document()?;
    let image = validate_image(bytes, declared_mime, &self.options.upload)?;
    let node = MediaAttrs::new(image.data_uri).with_alt(alt).into_node()?;
    Ok(self.document_mut()?.insert_at_selection(vec![node])?)
  }

  /// Word count and reading time of the canonical markup.
  #[must_use]
  pub fn stats(&self) -> DocumentStats {
    DocumentStats::of_markup(&self.markup(), self.options.words_per_minute)
  }

  /// Where an in-document link leads. Raw mode has nothing to scroll to.
  #[must_use]
  pub fn follow_link(&self, href: &str) -> Navigation {
    match &self.canonical {
      Canonical::Structured(document) => resolve_anchor(document, href),
      Canonical::Raw(_) if href.starts_with('#') => {
        Navigation::MissingAnchor {
          anchor: href.trim_start_matches('#').to_string(),
        }
      },
      Canonical::Raw(_) => Navigation::External,
    }
  }
}
