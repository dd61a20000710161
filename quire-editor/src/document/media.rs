//! Typed access to resizable media nodes.
use serde::Serialize;

use super::node::{AttrValue, Attrs, DocumentNode, NodeKind};
use crate::error::DocumentError;

/// A width/height pair in logical units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
  pub width:  u32,
  pub height: u32,
}

impl Dimensions {
  #[must_use]
  pub const fn new(width: u32, height: u32) -> Self {
    Self { width, height }
  }
}

/// Attributes of a [`NodeKind::ResizableMedia`] node.
///
/// `width` and `height` are both `Some` or both `None`; with `None` the
/// renderer falls back to the image's intrinsic size.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MediaAttrs {
  pub src:   String,
  pub alt:   Option<String>,
  pub title: Option<String>,
  pub size:  Option<Dimensions>,
}

impl MediaAttrs {
  #[must_use]
  pub fn new(src: impl Into<String>) -> Self {
    Self {
      src: src.into(),
      ..Self::default()
    }
  }

  #[must_use]
  pub fn with_alt(mut self, alt: impl Into<String>) -> Self {
    self.alt = Some(alt.into());
    self
  }

  #[must_use]
  pub const fn with_size(mut self, size: Dimensions) -> Self {
    self.size = Some(size);
    self
  }

  /// Read the attributes of `node` if it is a media node.
  #[must_use]
  pub fn of(node: &DocumentNode) -> Option<Self> {
    if node.kind() != NodeKind::ResizableMedia {
      return None;
    }
    let attrs = node.attrs();
    let dimension =
      |name: &str| attrs.number(name).and_then(|v| u32::try_from(v).ok());
    let size = match (dimension("width"), dimension("height")) {
      (Some(width), Some(height)) => Some(Dimensions::new(width, height)),
      _ => None,
    };
    Some(Self {
      src: attrs.text("src").unwrap_or_default().to_string(),
      alt: attrs.text("alt").map(str::to_string),
      title: attrs.text("title").map(str::to_string),
      size,
    })
  }

  #[must_use]
  pub fn to_attrs(&self) -> Attrs {
    Attrs::new()
      .with("src", self.src.as_str())
      .with("alt", self.alt.clone())
      .with("title", self.title.clone())
      .with("width", self.size.map(|s| s.width))
      .with("height", self.size.map(|s| s.height))
  }

  /// Build the media node.
  ///
  /// # Errors
  ///
  /// Returns [`DocumentError::InvalidAttribute`] when `src` is empty.
  pub fn into_node(self) -> Result<DocumentNode, DocumentError> {
    DocumentNode::create(NodeKind::ResizableMedia, self.to_attrs(), Vec::new())
  }
}

/// Patch writing both dimensions at once.
#[must_use]
pub fn size_patch(size: Option<Dimensions>) -> Attrs {
  Attrs::new()
    .with("width", size.map_or(AttrValue::Null, |s| s.width.into()))
    .with("height", size.map_or(AttrValue::Null, |s| s.height.into()))
}
