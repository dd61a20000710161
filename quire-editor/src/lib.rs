//! # quire-editor - structured editing and content analysis for blog posts
//!
//! The engine behind a rich-text post editor. It keeps a post body as a
//! schema-checked node tree, converts it to and from an HTML-subset markup,
//! numbers and indexes headings, and scores the post for search-engine
//! quality and accessibility.
//!
//! ## Quick Start
//!
//! ```rust
//! use quire_editor::{EditorSession, SessionOptions, analyze, check_accessibility};
//!
//! let (mut session, error) =
//!   EditorSession::from_markup("<h1>Hello</h1><p>World</p>", SessionOptions::default());
//! assert!(error.is_none());
//!
//! // Raw editing and back
//! session.switch_to_raw();
//! session.set_raw_markup("<h1>Hello</h1><p>Brave new world</p>").ok();
//! session.switch_to_structured().ok();
//!
//! let report = check_accessibility(&session.markup());
//! assert_eq!(report.score, 100);
//! ```
//!
//! ## Scoring
//!
//! ```rust
//! use quire_editor::{PostFields, analyze};
//!
//! let mut fields = PostFields::default();
//! fields.set_title("A short guide to writing titles that rank");
//! let analysis = analyze(&fields.analysis_input("<p>Body text</p>"));
//! println!("{}% ({})", analysis.overall_score_percent, analysis.rating);
//! ```

pub mod a11y;
pub mod analysis;
pub mod autosave;
pub mod convert;
pub mod document;
pub mod error;
pub mod fields;
pub mod live;
pub mod markup;
pub mod resize;
pub mod session;
pub mod slug;
pub mod toc;
pub mod upload;
mod utils;

pub use crate::{
  a11y::{AccessibilityReport, check_accessibility},
  analysis::{ContentAnalysis, ContentInput, DocumentStats, Rating, Section, analyze},
  autosave::{Autosave, AutosaveOptions, FileSnapshotSink, SnapshotSink},
  document::{Dimensions, Document, DocumentNode, MediaAttrs, NodeKind, NodePath},
  error::{EditorError, EditorResult, ParseError, ParseErrorKind},
  fields::{Field, PostFields},
  live::{Debouncer, LiveAnalysis, LiveReport},
  markup::{parse, serialize},
  resize::{ResizeEvent, ResizeLimits, ResizeMachine, ResizeOutcome},
  session::{EditorMode, EditorSession, SessionOptions},
  slug::slugify,
  toc::{IndexerOptions, Navigation, TocEntry, index_headings},
  upload::{UploadLimits, validate_image},
};
