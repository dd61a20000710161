//! Heading indexing, outline ordinals and table-of-contents generation.
//!
//! [`index_headings`] walks the document in reading order, writes a fresh
//! `anchorId` and `ordinal` onto every heading and returns the entries that
//! make up the table of contents. Running it again over an unchanged document
//! changes nothing.
use std::{collections::HashMap, sync::LazyLock};

use log::{debug, error};
use regex::Regex;
use serde::Serialize;

use crate::{
  document::{
    Attrs,
    Document,
    DocumentNode,
    HeadingAttrs,
    Mark,
    NodeKind,
    NodePath,
  },
  error::DocumentError,
  markup::serialize_node,
  slug::anchor_slug,
  utils::{collapse_whitespace, never_matching_regex},
};

/// Author-written outline numbers such as `1.` or `2.3.`, followed by
/// whitespace so that decimals like `1.5 million` stay part of the text.
static ORDINAL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(\d+(?:\.\d+)*)\.(?:\s+|$)").unwrap_or_else(|e| {
    error!("Failed to compile ORDINAL_PREFIX regex: {e}");
    never_matching_regex()
  })
});

/// Characters authors use as visual flourishes in headings.
const DECORATIVE_GLYPHS: &[char] = &[
  '✓', '✔', '✅', '☑', '•', '◦', '▪', '▫', '●', '○', '■', '□', '►', '▶', '➤',
  '→', '★', '☆', '✦', '✧', '❖', '♦', '◆',
];

const fn is_variation_selector(c: char) -> bool {
  matches!(c, '\u{FE00}'..='\u{FE0F}')
}

/// Remove decorative glyphs and normalize whitespace.
#[must_use]
pub fn strip_decorations(text: &str) -> String {
  let kept: String = text
    .chars()
    .filter(|c| !DECORATIVE_GLYPHS.contains(c) && !is_variation_selector(*c))
    .collect();
  collapse_whitespace(&kept)
}

/// Split an author-written ordinal off the front of `text`.
///
/// Returns the ordinal with its trailing dot (`"2.3."`) and the remaining
/// text.
#[must_use]
pub fn split_ordinal(text: &str) -> (Option<String>, &str) {
  match ORDINAL_PREFIX.captures(text) {
    Some(captures) => {
      let whole = captures.get(0).map_or(0, |m| m.end());
      let ordinal = captures.get(1).map(|m| format!("{}.", m.as_str()));
      (ordinal, text[whole..].trim_start())
    },
    None => (None, text),
  }
}

/// Options for [`index_headings`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexerOptions {
  /// Append `-1`, `-2`, ... to anchors that repeat an earlier one. Off by
  /// default: two headings with the same text then share an anchor.
  pub deduplicate_anchors: bool,
}

/// One line of the table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TocEntry {
  pub level:        u8,
  pub display_text: String,
  pub anchor_id:    String,
  pub ordinal:      String,
  #[serde(skip)]
  pub path:         NodePath,
}

impl TocEntry {
  /// The label shown in the table of contents.
  #[must_use]
  pub fn label(&self) -> String {
    if self.ordinal.is_empty() {
      self.display_text.clone()
    } else {
      format!("{} {}", self.ordinal, self.display_text)
    }
  }
}

/// Standard outline counters, relative to the shallowest heading level.
#[derive(Debug)]
struct Outline {
  base:     u8,
  counters: Vec<u32>,
}

impl Outline {
  fn new(base: u8) -> Self {
    Self {
      base,
      counters: Vec::new(),
    }
  }

  fn depth(&self, level: u8) -> usize {
    usize::from(level.saturating_sub(self.base))
  }

  fn next(&mut self, level: u8) -> String {
    let depth = self.depth(level);
    // Skipped intermediate levels count as their first section.
    while self.counters.len() <= depth {
      self.counters.push(if self.counters.len() < depth { 1 } else { 0 });
    }
    self.counters.truncate(depth + 1);
    if let Some(last) = self.counters.last_mut() {
      *last += 1;
    }
    self.render()
  }

  /// Adopt an author-written ordinal when it has the heading's depth.
  fn reseat(&mut self, level: u8, ordinal: &str) {
    let numbers: Option<Vec<u32>> = ordinal
      .trim_end_matches('.')
      .split('.')
      .map(|part| part.parse().ok())
      .collect();
    match numbers {
      Some(numbers) if numbers.len() == self.depth(level) + 1 => {
        self.counters = numbers;
      },
      _ => {
        debug!("Ordinal '{ordinal}' does not match heading depth; counters kept");
      },
    }
  }

  fn render(&self) -> String {
    let mut out = String::new();
    for counter in &self.counters {
      out.push_str(&counter.to_string());
      out.push('.');
    }
    out
  }
}

struct Found {
  path:    NodePath,
  level:   u8,
  text:    String,
  current: HeadingAttrs,
}

fn collect_headings(document: &Document) -> Vec<Found> {
  document
    .descendants()
    .filter_map(|(path, node)| {
      HeadingAttrs::of(node).map(|current| {
        Found {
          path,
          level: current.level,
          text: node.text_content(),
          current,
        }
      })
    })
    .collect()
}

/// Assign anchors and ordinals to every heading and return the TOC entries.
///
/// # Errors
///
/// Returns [`DocumentError`] if writing a heading's attributes fails; the
/// headings written before the failure keep their new attributes.
pub fn index_headings(
  document: &mut Document,
  options: IndexerOptions,
) -> Result<Vec<TocEntry>, DocumentError> {
  let headings = collect_headings(document);
  let Some(base) = headings.iter().map(|h| h.level).min() else {
    return Ok(Vec::new());
  };

  let mut outline = Outline::new(base);
  let mut seen: HashMap<String, usize> = HashMap::new();
  let mut entries = Vec::with_capacity(headings.len());

  for (index, heading) in headings.into_iter().enumerate() {
    let stripped = strip_decorations(&heading.text);
    let (explicit, rest) = split_ordinal(&stripped);

    let ordinal = match explicit {
      Some(ordinal) => {
        outline.reseat(heading.level, &ordinal);
        ordinal
      },
      None => outline.next(heading.level),
    };

    let mut anchor_id = anchor_slug(&stripped);
    if anchor_id.is_empty() {
      anchor_id = format!("section-{}", index + 1);
    }
    if options.deduplicate_anchors {
      let count = seen.entry(anchor_id.clone()).or_insert(0);
      if *count > 0 {
        anchor_id = format!("{anchor_id}-{count}");
      }
      *count += 1;
    }

    let unchanged = heading.current.anchor_id.as_deref() == Some(anchor_id.as_str())
      && heading.current.ordinal.as_deref() == Some(ordinal.as_str());
    if !unchanged {
      let patch = Attrs::new()
        .with("anchorId", anchor_id.as_str())
        .with("ordinal", ordinal.as_str());
      document.update_attributes(&heading.path, &patch)?;
    }

    entries.push(TocEntry {
      level: heading.level,
      display_text: rest.to_string(),
      anchor_id,
      ordinal,
      path: heading.path,
    });
  }

  debug!("Indexed {} heading(s)", entries.len());
  Ok(entries)
}

/// Build the bullet list inserted as the table of contents, or `None` when
/// there are no entries.
#[must_use]
pub fn toc_fragment(entries: &[TocEntry]) -> Option<DocumentNode> {
  if entries.is_empty() {
    return None;
  }
  let items = entries
    .iter()
    .map(|entry| {
      let link = DocumentNode::text(entry.label(), vec![Mark::Link {
        href:   format!("#{}", entry.anchor_id),
        target: None,
      }]);
      let paragraph =
        DocumentNode::create(NodeKind::Paragraph, Attrs::new(), vec![link])?;
      DocumentNode::create(NodeKind::ListItem, Attrs::new(), vec![paragraph])
    })
    .collect::<Result<Vec<_>, DocumentError>>()
    .ok()?;
  DocumentNode::create(NodeKind::BulletList, Attrs::new(), items).ok()
}

/// Markup of the table-of-contents fragment; empty when there are no entries.
#[must_use]
pub fn toc_markup(entries: &[TocEntry]) -> String {
  toc_fragment(entries)
    .map(|fragment| serialize_node(&fragment))
    .unwrap_or_default()
}

/// What the UI should do when a link is followed inside the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Navigation {
  /// Suppress default navigation and scroll the heading into view.
  ScrollTo { path: NodePath },
  /// An in-page anchor with no heading behind it.
  MissingAnchor { anchor: String },
  /// Not an in-page link; let the default navigation happen.
  External,
}

/// Resolve `href` against the document's heading anchors.
#[must_use]
pub fn resolve_anchor(document: &Document, href: &str) -> Navigation {
  let Some(anchor) = href.strip_prefix('#') else {
    return Navigation::External;
  };
  document
    .descendants()
    .find(|(_, node)| {
      node.kind() == NodeKind::Heading
        && node.attrs().text("anchorId") == Some(anchor)
    })
    .map_or_else(
      || {
        Navigation::MissingAnchor {
          anchor: anchor.to_string(),
        }
      },
      |(path, _)| Navigation::ScrollTo { path },
    )
}
