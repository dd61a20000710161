//! Attribute and content rules for each node kind.
use super::node::{AttrValue, Attrs, DocumentNode, NodeKind};
use crate::error::DocumentError;

/// Attribute names each kind accepts, in serialization order.
#[must_use]
pub const fn allowed_attrs(kind: NodeKind) -> &'static [&'static str] {
  match kind {
    NodeKind::Heading => &["level", "anchorId", "ordinal"],
    NodeKind::CodeBlock => &["language"],
    NodeKind::OrderedList => &["start"],
    NodeKind::TableCell => &["header", "colspan", "rowspan"],
    NodeKind::ResizableMedia => &["src", "alt", "title", "width", "height"],
    NodeKind::Youtube => &["src", "width", "height", "start"],
    _ => &[],
  }
}

/// Default attributes for a freshly created node.
#[must_use]
pub fn default_attrs(kind: NodeKind) -> Attrs {
  match kind {
    NodeKind::Heading => {
      Attrs::new()
        .with("level", 1_i64)
        .with("anchorId", AttrValue::Null)
        .with("ordinal", AttrValue::Null)
    },
    NodeKind::CodeBlock => Attrs::new().with("language", AttrValue::Null),
    NodeKind::OrderedList => Attrs::new().with("start", 1_i64),
    NodeKind::TableCell => {
      Attrs::new()
        .with("header", false)
        .with("colspan", 1_i64)
        .with("rowspan", 1_i64)
    },
    NodeKind::ResizableMedia => {
      Attrs::new()
        .with("src", "")
        .with("alt", AttrValue::Null)
        .with("title", AttrValue::Null)
        .with("width", AttrValue::Null)
        .with("height", AttrValue::Null)
    },
    NodeKind::Youtube => {
      Attrs::new()
        .with("src", "")
        .with("width", 640_i64)
        .with("height", 480_i64)
        .with("start", 0_i64)
    },
    _ => Attrs::new(),
  }
}

fn invalid(kind: NodeKind, name: &str, reason: &str) -> DocumentError {
  DocumentError::InvalidAttribute {
    kind:   kind.name().to_string(),
    name:   name.to_string(),
    reason: reason.to_string(),
  }
}

fn expect_number(
  kind: NodeKind,
  attrs: &Attrs,
  name: &str,
  min: i64,
  max: i64,
  nullable: bool,
) -> Result<(), DocumentError> {
  match attrs.get(name) {
    Some(AttrValue::Number(n)) if (min..=max).contains(n) => Ok(()),
    Some(AttrValue::Number(_)) => {
      Err(invalid(kind, name, &format!("must be between {min} and {max}")))
    },
    Some(AttrValue::Null) | None if nullable => Ok(()),
    _ => Err(invalid(kind, name, "must be a number")),
  }
}

fn expect_text(
  kind: NodeKind,
  attrs: &Attrs,
  name: &str,
  nullable: bool,
) -> Result<(), DocumentError> {
  match attrs.get(name) {
    Some(AttrValue::Text(_)) => Ok(()),
    Some(AttrValue::Null) | None if nullable => Ok(()),
    _ => Err(invalid(kind, name, "must be text")),
  }
}

/// Like [`expect_text`], but an empty string is refused too: markup has no
/// way to tell an empty value from a missing one.
fn expect_filled_text(
  kind: NodeKind,
  attrs: &Attrs,
  name: &str,
  nullable: bool,
) -> Result<(), DocumentError> {
  expect_text(kind, attrs, name, nullable)?;
  if attrs.text(name).is_some_and(str::is_empty) {
    return Err(invalid(kind, name, "must not be empty"));
  }
  Ok(())
}

/// Validate a complete attribute set for `kind`.
///
/// # Errors
///
/// Returns [`DocumentError::InvalidAttribute`] for unknown names, wrongly
/// typed values, empty strings where markup cannot carry them, out-of-range
/// numbers, or media dimensions set one without the other.
pub fn check_attrs(kind: NodeKind, attrs: &Attrs) -> Result<(), DocumentError> {
  let allowed = allowed_attrs(kind);
  if let Some((name, _)) = attrs.iter().find(|(name, _)| !allowed.contains(name))
  {
    return Err(invalid(kind, name, "unknown attribute"));
  }

  match kind {
    NodeKind::Heading => {
      expect_number(kind, attrs, "level", 1, 6, false)?;
      expect_filled_text(kind, attrs, "anchorId", true)?;
      expect_filled_text(kind, attrs, "ordinal", true)?;
    },
    NodeKind::CodeBlock => expect_filled_text(kind, attrs, "language", true)?,
    NodeKind::OrderedList => {
      expect_number(kind, attrs, "start", 0, i64::from(u32::MAX), false)?;
    },
    NodeKind::TableCell => {
      if !matches!(attrs.get("header"), Some(AttrValue::Bool(_))) {
        return Err(invalid(kind, "header", "must be a boolean"));
      }
      expect_number(kind, attrs, "colspan", 1, 1000, false)?;
      expect_number(kind, attrs, "rowspan", 1, 65534, false)?;
    },
    NodeKind::ResizableMedia => {
      expect_filled_text(kind, attrs, "src", false)?;
      expect_text(kind, attrs, "alt", true)?;
      expect_filled_text(kind, attrs, "title", true)?;
      let max = i64::from(u32::MAX);
      expect_number(kind, attrs, "width", 1, max, true)?;
      expect_number(kind, attrs, "height", 1, max, true)?;
      let width = attrs.get("width").is_some_and(|v| !v.is_null());
      let height = attrs.get("height").is_some_and(|v| !v.is_null());
      if width != height {
        return Err(invalid(
          kind,
          if width { "height" } else { "width" },
          "width and height must be set together",
        ));
      }
    },
    NodeKind::Youtube => {
      expect_filled_text(kind, attrs, "src", false)?;
      let max = i64::from(u32::MAX);
      expect_number(kind, attrs, "width", 1, max, false)?;
      expect_number(kind, attrs, "height", 1, max, false)?;
      expect_number(kind, attrs, "start", 0, max, false)?;
    },
    _ => {},
  }
  Ok(())
}

fn refuse(parent: NodeKind, child: &DocumentNode) -> DocumentError {
  DocumentError::InvalidContent {
    parent: parent.name().to_string(),
    child:  child.kind().name().to_string(),
  }
}

fn all_children(
  parent: NodeKind,
  children: &[DocumentNode],
  accept: impl Fn(&DocumentNode) -> bool,
) -> Result<(), DocumentError> {
  match children.iter().find(|child| !accept(child)) {
    Some(child) => Err(refuse(parent, child)),
    None => Ok(()),
  }
}

fn span(cell: &DocumentNode, name: &str) -> usize {
  cell
    .attrs()
    .number(name)
    .and_then(|span| usize::try_from(span).ok())
    .unwrap_or(1)
    .max(1)
}

/// Width of each table row in columns, counting column spans and the cells
/// that a `rowspan` in an earlier row carries down into it.
#[must_use]
pub fn row_widths(rows: &[DocumentNode]) -> Vec<usize> {
  // Rows each column is still covered for by a cell from above.
  let mut carried: Vec<usize> = Vec::new();
  let mut widths = Vec::with_capacity(rows.len());
  for row in rows {
    let mut next: Vec<usize> =
      carried.iter().map(|left| left.saturating_sub(1)).collect();
    let mut column = 0;
    for cell in row.children() {
      while carried.get(column).is_some_and(|left| *left > 0) {
        column += 1;
      }
      let colspan = span(cell, "colspan");
      let rowspan = span(cell, "rowspan");
      if next.len() < column + colspan {
        next.resize(column + colspan, 0);
      }
      for left in &mut next[column..column + colspan] {
        *left = rowspan - 1;
      }
      column += colspan;
    }
    let covered = carried
      .iter()
      .rposition(|left| *left > 0)
      .map_or(0, |last| last + 1);
    widths.push(column.max(covered));
    carried = next;
  }
  widths
}

/// Check that `children` is valid content for a node of `kind`.
///
/// # Errors
///
/// Returns [`DocumentError::InvalidContent`] for a child the parent cannot
/// hold, and [`DocumentError::RaggedTable`] for tables whose rows differ in
/// width.
pub fn check_content(
  kind: NodeKind,
  children: &[DocumentNode],
) -> Result<(), DocumentError> {
  match kind {
    NodeKind::Doc
    | NodeKind::ListItem
    | NodeKind::Blockquote
    | NodeKind::TableCell => all_children(kind, children, |c| c.kind().is_block()),
    NodeKind::Paragraph | NodeKind::Heading => {
      all_children(kind, children, |c| c.kind().is_inline())
    },
    NodeKind::BulletList | NodeKind::OrderedList => {
      all_children(kind, children, |c| c.kind() == NodeKind::ListItem)
    },
    NodeKind::TableRow => {
      all_children(kind, children, |c| c.kind() == NodeKind::TableCell)
    },
    NodeKind::Table => {
      all_children(kind, children, |c| c.kind() == NodeKind::TableRow)?;
      let mut widths = row_widths(children).into_iter();
      if let Some(expected) = widths.next() {
        if let Some((index, found)) =
          widths.enumerate().find(|(_, width)| *width != expected)
        {
          return Err(DocumentError::RaggedTable {
            row: index + 2,
            expected,
            found,
          });
        }
      }
      Ok(())
    },
    NodeKind::CodeBlock => {
      all_children(kind, children, |c| {
        c.kind() == NodeKind::Text && c.marks().is_empty()
      })
    },
    NodeKind::Text
    | NodeKind::HardBreak
    | NodeKind::ResizableMedia
    | NodeKind::Youtube => {
      match children.first() {
        Some(child) => Err(refuse(kind, child)),
        None => Ok(()),
      }
    },
  }
}
