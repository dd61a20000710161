//! Node, mark and attribute types for the document tree.
use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use super::schema;
use crate::error::DocumentError;

/// Every kind of node the document tree can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
  /// The single root of a document.
  Doc,
  Text,
  Paragraph,
  Heading,
  BulletList,
  OrderedList,
  ListItem,
  Blockquote,
  CodeBlock,
  Table,
  TableRow,
  TableCell,
  /// An image with explicit, interactively editable dimensions.
  ResizableMedia,
  /// An embedded video frame.
  Youtube,
  HardBreak,
}

impl NodeKind {
  /// Schema name, as used in error messages and JSON dumps.
  #[must_use]
  pub const fn name(self) -> &'static str {
    match self {
      Self::Doc => "doc",
      Self::Text => "text",
      Self::Paragraph => "paragraph",
      Self::Heading => "heading",
      Self::BulletList => "bulletList",
      Self::OrderedList => "orderedList",
      Self::ListItem => "listItem",
      Self::Blockquote => "blockquote",
      Self::CodeBlock => "codeBlock",
      Self::Table => "table",
      Self::TableRow => "tableRow",
      Self::TableCell => "tableCell",
      Self::ResizableMedia => "resizableMedia",
      Self::Youtube => "youtube",
      Self::HardBreak => "hardBreak",
    }
  }

  /// Whether the node may appear where block content is expected.
  #[must_use]
  pub const fn is_block(self) -> bool {
    matches!(
      self,
      Self::Paragraph
        | Self::Heading
        | Self::BulletList
        | Self::OrderedList
        | Self::Blockquote
        | Self::CodeBlock
        | Self::Table
        | Self::ResizableMedia
        | Self::Youtube
    )
  }

  /// Whether the node may appear inside paragraphs and headings.
  ///
  /// Media is both: it can stand alone between blocks or float in a line.
  #[must_use]
  pub const fn is_inline(self) -> bool {
    matches!(self, Self::Text | Self::HardBreak | Self::ResizableMedia)
  }

  /// Leaf kinds never carry children.
  #[must_use]
  pub const fn is_leaf(self) -> bool {
    matches!(
      self,
      Self::Text | Self::HardBreak | Self::ResizableMedia | Self::Youtube
    )
  }
}

impl fmt::Display for NodeKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
  Null,
  Bool(bool),
  Number(i64),
  Text(String),
}

impl AttrValue {
  #[must_use]
  pub const fn is_null(&self) -> bool {
    matches!(self, Self::Null)
  }
}

impl From<&str> for AttrValue {
  fn from(value: &str) -> Self {
    Self::Text(value.to_string())
  }
}

impl From<String> for AttrValue {
  fn from(value: String) -> Self {
    Self::Text(value)
  }
}

impl From<i64> for AttrValue {
  fn from(value: i64) -> Self {
    Self::Number(value)
  }
}

impl From<u32> for AttrValue {
  fn from(value: u32) -> Self {
    Self::Number(i64::from(value))
  }
}

impl From<bool> for AttrValue {
  fn from(value: bool) -> Self {
    Self::Bool(value)
  }
}

impl<T: Into<Self>> From<Option<T>> for AttrValue {
  fn from(value: Option<T>) -> Self {
    value.map_or(Self::Null, Into::into)
  }
}

/// Ordered, kind-specific attribute bag.
///
/// The same type doubles as a patch for `update_attributes`: every entry of
/// the patch overwrites the node's value, and `Null` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Attrs(IndexMap<String, AttrValue>);

impl Attrs {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Builder-style insert.
  #[must_use]
  pub fn with(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
    self.set(name, value);
    self
  }

  pub fn set(&mut self, name: &str, value: impl Into<AttrValue>) {
    self.0.insert(name.to_string(), value.into());
  }

  #[must_use]
  pub fn get(&self, name: &str) -> Option<&AttrValue> {
    self.0.get(name)
  }

  /// Text value, `None` when absent, null or not text.
  #[must_use]
  pub fn text(&self, name: &str) -> Option<&str> {
    match self.0.get(name) {
      Some(AttrValue::Text(value)) => Some(value),
      _ => None,
    }
  }

  #[must_use]
  pub fn number(&self, name: &str) -> Option<i64> {
    match self.0.get(name) {
      Some(AttrValue::Number(value)) => Some(*value),
      _ => None,
    }
  }

  #[must_use]
  pub fn flag(&self, name: &str) -> bool {
    matches!(self.0.get(name), Some(AttrValue::Bool(true)))
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
    self.0.iter().map(|(name, value)| (name.as_str(), value))
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Apply `patch` on top of these attributes.
  #[must_use]
  pub fn merged(&self, patch: &Self) -> Self {
    let mut merged = self.clone();
    for (name, value) in &patch.0 {
      merged.0.insert(name.clone(), value.clone());
    }
    merged
  }
}

/// Inline formatting applied to a text node.
///
/// Links are marks rather than nodes, so a link can span differently
/// formatted runs of text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Mark {
  Link {
    href:   String,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<String>,
  },
  Bold,
  Italic,
  Underline,
  Strike,
  Code,
}

impl Mark {
  /// Nesting rank; lower ranks wrap higher ones when serialized.
  #[must_use]
  pub const fn rank(&self) -> u8 {
    match self {
      Self::Link { .. } => 0,
      Self::Bold => 1,
      Self::Italic => 2,
      Self::Underline => 3,
      Self::Strike => 4,
      Self::Code => 5,
    }
  }
}

/// Sort marks into nesting order, keeping only the innermost of each rank.
#[must_use]
pub fn normalize_marks(marks: Vec<Mark>) -> Vec<Mark> {
  let mut normalized: Vec<Mark> = Vec::with_capacity(marks.len());
  for mark in marks {
    if let Some(existing) =
      normalized.iter_mut().find(|m| m.rank() == mark.rank())
    {
      *existing = mark;
    } else {
      normalized.push(mark);
    }
  }
  normalized.sort_by_key(Mark::rank);
  normalized
}

/// A node in the document tree.
///
/// Fields are private so that every node in a tree has passed the schema:
/// nodes are built with [`DocumentNode::create`] (or the text helpers) and
/// changed by swapping in rebuilt subtrees through [`super::Document`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentNode {
  kind:     NodeKind,
  #[serde(skip_serializing_if = "Attrs::is_empty")]
  attrs:    Attrs,
  #[serde(skip_serializing_if = "Vec::is_empty", rename = "content")]
  children: Vec<Self>,
  #[serde(skip_serializing_if = "String::is_empty")]
  text:     String,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  marks:    Vec<Mark>,
}

impl DocumentNode {
  /// Create a node of any non-text kind.
  ///
  /// Attributes are merged over the kind's defaults and validated, and the
  /// children are checked against the kind's content rule.
  ///
  /// # Errors
  ///
  /// Returns [`DocumentError`] when the attributes or children violate the
  /// schema, or when `kind` is [`NodeKind::Text`] (use [`Self::text`]).
  pub fn create(
    kind: NodeKind,
    attrs: Attrs,
    children: Vec<Self>,
  ) -> Result<Self, DocumentError> {
    if kind == NodeKind::Text {
      return Err(DocumentError::InvalidContent {
        parent: "createNode".to_string(),
        child:  "text (use a text constructor)".to_string(),
      });
    }
    let attrs = schema::default_attrs(kind).merged(&attrs);
    schema::check_attrs(kind, &attrs)?;
    schema::check_content(kind, &children)?;
    Ok(Self {
      kind,
      attrs,
      children,
      text: String::new(),
      marks: Vec::new(),
    })
  }

  /// A text node with the given marks.
  #[must_use]
  pub fn text(text: impl Into<String>, marks: Vec<Mark>) -> Self {
    Self {
      kind:     NodeKind::Text,
      attrs:    Attrs::new(),
      children: Vec::new(),
      text:     text.into(),
      marks:    normalize_marks(marks),
    }
  }

  /// An unformatted text node.
  #[must_use]
  pub fn plain(text: impl Into<String>) -> Self {
    Self::text(text, Vec::new())
  }

  #[must_use]
  pub fn hard_break() -> Self {
    Self {
      kind:     NodeKind::HardBreak,
      attrs:    Attrs::new(),
      children: Vec::new(),
      text:     String::new(),
      marks:    Vec::new(),
    }
  }

  /// An empty document root.
  #[must_use]
  pub fn empty_doc() -> Self {
    Self {
      kind:     NodeKind::Doc,
      attrs:    Attrs::new(),
      children: Vec::new(),
      text:     String::new(),
      marks:    Vec::new(),
    }
  }

  /// A paragraph holding a single unformatted run.
  #[must_use]
  pub fn plain_paragraph(text: impl Into<String>) -> Self {
    let text = text.into();
    let children = if text.is_empty() {
      Vec::new()
    } else {
      vec![Self::plain(text)]
    };
    Self {
      kind: NodeKind::Paragraph,
      attrs: Attrs::new(),
      children,
      text: String::new(),
      marks: Vec::new(),
    }
  }

  /// A heading of `level` with a single unformatted run.
  ///
  /// # Errors
  ///
  /// Returns [`DocumentError::InvalidAttribute`] if `level` is not 1 to 6.
  pub fn plain_heading(
    level: u8,
    text: impl Into<String>,
  ) -> Result<Self, DocumentError> {
    Self::create(
      NodeKind::Heading,
      Attrs::new().with("level", i64::from(level)),
      vec![Self::plain(text)],
    )
  }

  #[must_use]
  pub const fn kind(&self) -> NodeKind {
    self.kind
  }

  #[must_use]
  pub const fn attrs(&self) -> &Attrs {
    &self.attrs
  }

  #[must_use]
  pub fn children(&self) -> &[Self] {
    &self.children
  }

  /// Text of a text node; empty for every other kind.
  #[must_use]
  pub fn text_value(&self) -> &str {
    &self.text
  }

  #[must_use]
  pub fn marks(&self) -> &[Mark] {
    &self.marks
  }

  #[must_use]
  pub fn has_mark(&self, mark: &Mark) -> bool {
    self.marks.contains(mark)
  }

  /// Concatenated text of this node and all of its descendants.
  #[must_use]
  pub fn text_content(&self) -> String {
    let mut out = String::new();
    self.collect_text(&mut out);
    out
  }

  fn collect_text(&self, out: &mut String) {
    if self.kind == NodeKind::Text {
      out.push_str(&self.text);
    }
    for child in &self.children {
      child.collect_text(out);
    }
  }

  /// Rebuild this node with patched attributes.
  pub(crate) fn with_attrs(&self, patch: &Attrs) -> Result<Self, DocumentError> {
    if self.kind == NodeKind::Text {
      return Err(DocumentError::InvalidAttribute {
        kind:   self.kind.name().to_string(),
        name:   patch.iter().next().map_or_else(String::new, |(n, _)| n.to_string()),
        reason: "text nodes carry marks, not attributes".to_string(),
      });
    }
    let attrs = self.attrs.merged(patch);
    schema::check_attrs(self.kind, &attrs)?;
    Ok(Self {
      kind: self.kind,
      attrs,
      children: self.children.clone(),
      text: String::new(),
      marks: Vec::new(),
    })
  }

  pub(crate) const fn children_mut(&mut self) -> &mut Vec<Self> {
    &mut self.children
  }

  pub(crate) fn child_mut(&mut self, index: usize) -> Option<&mut Self> {
    self.children.get_mut(index)
  }
}

/// Typed view of a heading node's attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingAttrs {
  pub level:     u8,
  pub anchor_id: Option<String>,
  pub ordinal:   Option<String>,
}

impl HeadingAttrs {
  /// Read the attributes of `node` if it is a heading.
  #[must_use]
  pub fn of(node: &DocumentNode) -> Option<Self> {
    if node.kind() != NodeKind::Heading {
      return None;
    }
    let attrs = node.attrs();
    Some(Self {
      level:     attrs
        .number("level")
        .and_then(|level| u8::try_from(level).ok())
        .unwrap_or(1),
      anchor_id: attrs.text("anchorId").map(str::to_string),
      ordinal:   attrs.text("ordinal").map(str::to_string),
    })
  }
}
