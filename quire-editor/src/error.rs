//! Error types for the editing engine.
//!
//! Nothing in this crate is fatal to the host process: the worst outcome of
//! any error here is "stay in the current mode" or "reject this one edit".
use std::{fmt, io};

use thiserror::Error;

use crate::document::NodePath;

/// Result type for engine operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Top-level error type for the engine.
#[derive(Debug, Error)]
pub enum EditorError {
  #[error("{0}")]
  Parse(#[from] ParseError),

  #[error("Document error: {0}")]
  Document(#[from] DocumentError),

  #[error("Upload rejected: {0}")]
  Upload(#[from] UploadError),

  #[error("Autosave failed: {0}")]
  Autosave(#[from] AutosaveError),

  #[error("Operation requires {expected} mode, but the editor is in {actual} mode")]
  Mode {
    expected: crate::session::EditorMode,
    actual:   crate::session::EditorMode,
  },

  #[error("I/O error: {0}")]
  Io(#[from] io::Error),
}

/// What went wrong while parsing raw markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
  /// An element was opened and never closed.
  UnterminatedTag(String),
  /// A closing tag appeared with nothing open to close.
  UnexpectedClosingTag(String),
  /// A closing tag does not match the innermost open element.
  MismatchedClosingTag { expected: String, found: String },
  /// A `<` that does not start a well-formed tag.
  MalformedTag,
  /// `<!--` without a matching `-->`.
  UnterminatedComment,
  /// `<td>`/`<th>` outside of a table row.
  StrayTableCell,
  /// `<tr>` outside of a table.
  StrayTableRow,
  /// A table row whose width differs from the first row.
  RaggedTable { row: usize, expected: usize, found: usize },
  /// A block element inside inline-only content, e.g. a heading in a paragraph.
  InvalidNesting { child: String, parent: String },
}

impl fmt::Display for ParseErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::UnterminatedTag(tag) => write!(f, "<{tag}> is never closed"),
      Self::UnexpectedClosingTag(tag) => {
        write!(f, "</{tag}> has no matching opening tag")
      },
      Self::MismatchedClosingTag { expected, found } => {
        write!(f, "expected </{expected}> but found </{found}>")
      },
      Self::MalformedTag => write!(f, "malformed tag"),
      Self::UnterminatedComment => write!(f, "comment is never closed"),
      Self::StrayTableCell => write!(f, "table cell outside of a table row"),
      Self::StrayTableRow => write!(f, "table row outside of a table"),
      Self::RaggedTable {
        row,
        expected,
        found,
      } => {
        write!(
          f,
          "table row {row} has {found} cells, expected {expected} to match the \
           first row"
        )
      },
      Self::InvalidNesting { child, parent } => {
        write!(f, "<{child}> is not allowed inside <{parent}>")
      },
    }
  }
}

/// Raw markup failed to parse into a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Markup error at line {line}, column {column}: {kind}")]
pub struct ParseError {
  pub kind:   ParseErrorKind,
  /// Byte offset into the source.
  pub offset: usize,
  /// 1-based line.
  pub line:   usize,
  /// 1-based column, counted in characters.
  pub column: usize,
}

impl ParseError {
  /// Build an error, resolving `offset` into a line and column of `source`.
  #[must_use]
  pub fn at(kind: ParseErrorKind, source: &str, offset: usize) -> Self {
    let offset = offset.min(source.len());
    let before = source.get(..offset).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let column = before
      .rsplit('\n')
      .next()
      .map_or(1, |tail| tail.chars().count() + 1);
    Self {
      kind,
      offset,
      line,
      column,
    }
  }
}

/// A structural edit was refused by the document schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
  #[error("No node at path {0}")]
  InvalidPath(NodePath),

  #[error("Range {from}..{to} is out of bounds for a node with {len} children")]
  InvalidRange { from: usize, to: usize, len: usize },

  #[error("{child} is not allowed inside {parent}")]
  InvalidContent { parent: String, child: String },

  #[error("Invalid attribute '{name}' on {kind}: {reason}")]
  InvalidAttribute {
    kind:   String,
    name:   String,
    reason: String,
  },

  #[error("Table row {row} is {found} cells wide, expected {expected}")]
  RaggedTable {
    row:      usize,
    expected: usize,
    found:    usize,
  },

  #[error("The document root cannot be replaced or removed")]
  RootImmutable,
}

/// An image payload was refused before touching the document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
  #[error("image is {size} bytes, the limit is {limit} bytes")]
  TooLarge { size: usize, limit: usize },

  #[error("'{0}' is not an accepted image type")]
  NotAnImage(String),

  #[error("the file is empty")]
  Empty,
}

/// A snapshot could not be written to the side channel.
#[derive(Debug, Error)]
pub enum AutosaveError {
  #[error("I/O error: {0}")]
  Io(#[from] io::Error),

  #[error("{0}")]
  Sink(String),
}
