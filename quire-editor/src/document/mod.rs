//! The document model: an ordered tree of typed nodes.
//!
//! A [`Document`] owns exactly one root node of kind [`NodeKind::Doc`].
//! Nodes are addressed by [`NodePath`]s (child indices from the root), and
//! every mutation goes through [`Document::replace_range`] or
//! [`Document::update_attributes`], which swap whole subtrees and hand the
//! replaced ones back to the caller.
use std::fmt;

use log::trace;
use serde::Serialize;

pub mod media;
pub mod node;
pub mod schema;

pub use media::{Dimensions, MediaAttrs};
pub use node::{
  AttrValue,
  Attrs,
  DocumentNode,
  HeadingAttrs,
  Mark,
  NodeKind,
};

use crate::error::DocumentError;

/// Address of a node: the child index taken at each level from the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodePath(Vec<usize>);

impl NodePath {
  /// The path of the root node.
  #[must_use]
  pub const fn root() -> Self {
    Self(Vec::new())
  }

  #[must_use]
  pub fn child(&self, index: usize) -> Self {
    let mut path = self.0.clone();
    path.push(index);
    Self(path)
  }

  /// The parent path and this node's index within it.
  #[must_use]
  pub fn split_last(&self) -> Option<(Self, usize)> {
    let (last, rest) = self.0.split_last()?;
    Some((Self(rest.to_vec()), *last))
  }

  #[must_use]
  pub fn indices(&self) -> &[usize] {
    &self.0
  }

  #[must_use]
  pub fn is_root(&self) -> bool {
    self.0.is_empty()
  }

  #[must_use]
  pub fn depth(&self) -> usize {
    self.0.len()
  }
}

impl From<Vec<usize>> for NodePath {
  fn from(indices: Vec<usize>) -> Self {
    Self(indices)
  }
}

impl fmt::Display for NodePath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.0.is_empty() {
      return f.write_str("/");
    }
    for index in &self.0 {
      write!(f, "/{index}")?;
    }
    Ok(())
  }
}

/// Where the author is working.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Selection {
  /// A position between two children of `parent`.
  Cursor { parent: NodePath, offset: usize },
  /// A whole node.
  Node { path: NodePath },
}

impl Default for Selection {
  fn default() -> Self {
    Self::Cursor {
      parent: NodePath::root(),
      offset: 0,
    }
  }
}

/// Depth-first, document-order iterator over `(path, node)` pairs.
pub struct Descendants<'a> {
  stack: Vec<(NodePath, &'a DocumentNode)>,
}

impl<'a> Iterator for Descendants<'a> {
  type Item = (NodePath, &'a DocumentNode);

  fn next(&mut self) -> Option<Self::Item> {
    let (path, node) = self.stack.pop()?;
    for (index, child) in node.children().iter().enumerate().rev() {
      self.stack.push((path.child(index), child));
    }
    Some((path, node))
  }
}

/// A rich document being edited in structured mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
  root:      DocumentNode,
  selection: Selection,
  revision:  u64,
}

impl Default for Document {
  fn default() -> Self {
    Self::new()
  }
}

impl Document {
  /// An empty document.
  #[must_use]
  pub fn new() -> Self {
    Self {
      root:      DocumentNode::empty_doc(),
      selection: Selection::default(),
      revision:  0,
    }
  }

  /// Wrap an existing root node.
  ///
  /// # Errors
  ///
  /// Returns [`DocumentError::InvalidContent`] if `root` is not a `doc` node.
  pub fn from_root(root: DocumentNode) -> Result<Self, DocumentError> {
    if root.kind() != NodeKind::Doc {
      return Err(DocumentError::InvalidContent {
        parent: "document root".to_string(),
        child:  root.kind().name().to_string(),
      });
    }
    Ok(Self {
      root,
      selection: Selection::default(),
      revision: 0,
    })
  }

  /// Build a document from top-level blocks.
  ///
  /// # Errors
  ///
  /// Returns [`DocumentError::InvalidContent`] if any node is not a block.
  pub fn from_blocks(blocks: Vec<DocumentNode>) -> Result<Self, DocumentError> {
    Self::from_root(DocumentNode::create(NodeKind::Doc, Attrs::new(), blocks)?)
  }

  #[must_use]
  pub const fn root(&self) -> &DocumentNode {
    &self.root
  }

  /// Monotonic counter bumped by every successful mutation.
  #[must_use]
  pub const fn revision(&self) -> u64 {
    self.revision
  }

  #[must_use]
  pub const fn selection(&self) -> &Selection {
    &self.selection
  }

  #[must_use]
  pub fn node(&self, path: &NodePath) -> Option<&DocumentNode> {
    path
      .indices()
      .iter()
      .try_fold(&self.root, |node, &index| node.children().get(index))
  }

  fn node_mut(&mut self, path: &NodePath) -> Result<&mut DocumentNode, DocumentError> {
    let mut node = &mut self.root;
    for &index in path.indices() {
      node = node
        .child_mut(index)
        .ok_or_else(|| DocumentError::InvalidPath(path.clone()))?;
    }
    Ok(node)
  }

  /// Every node in document order, starting with the root.
  #[must_use]
  pub fn descendants(&self) -> Descendants<'_> {
    Descendants {
      stack: vec![(NodePath::root(), &self.root)],
    }
  }

  /// Replace the children `from..to` of the node at `parent` with `nodes`.
  ///
  /// The parent's new content is checked against the schema before it is
  /// committed; on error the document is left untouched. Returns the removed
  /// children. The selection becomes a cursor just after the inserted nodes.
  ///
  /// # Errors
  ///
  /// Returns [`DocumentError`] for a missing parent, an out-of-bounds range or
  /// content the parent cannot hold.
  pub fn replace_range(
    &mut self,
    parent: &NodePath,
    from: usize,
    to: usize,
    nodes: Vec<DocumentNode>,
  ) -> Result<Vec<DocumentNode>, DocumentError> {
    let target = self.node_mut(parent)?;
    let len = target.children().len();
    if from > to || to > len {
      return Err(DocumentError::InvalidRange { from, to, len });
    }

    let inserted = nodes.len();
    let mut candidate: Vec<DocumentNode> = target.children()[..from].to_vec();
    candidate.extend(nodes);
    candidate.extend_from_slice(&target.children()[to..]);
    schema::check_content(target.kind(), &candidate)?;

    let previous = std::mem::replace(target.children_mut(), candidate);
    let removed = previous.into_iter().skip(from).take(to - from).collect();

    self.revision += 1;
    self.selection = Selection::Cursor {
      parent: parent.clone(),
      offset: from + inserted,
    };
    trace!(
      "replace_range {parent} {from}..{to}: inserted {inserted} node(s), rev {}",
      self.revision
    );
    Ok(removed)
  }

  /// Replace the single node at `path`.
  ///
  /// # Errors
  ///
  /// Returns [`DocumentError::RootImmutable`] for the root path, otherwise the
  /// errors of [`Self::replace_range`].
  pub fn replace_node(
    &mut self,
    path: &NodePath,
    node: DocumentNode,
  ) -> Result<DocumentNode, DocumentError> {
    let (parent, index) =
      path.split_last().ok_or(DocumentError::RootImmutable)?;
    let mut removed = self.replace_range(&parent, index, index + 1, vec![node])?;
    removed.pop().ok_or_else(|| DocumentError::InvalidPath(path.clone()))
  }

  /// Patch the attributes of the node at `path`.
  ///
  /// The node is rebuilt with the merged attributes and swapped in as a whole;
  /// the previous node is returned. A failed patch leaves the document
  /// unchanged.
  ///
  /// # Errors
  ///
  /// Returns [`DocumentError`] for a missing node or an invalid patch.
  pub fn update_attributes(
    &mut self,
    path: &NodePath,
    patch: &Attrs,
  ) -> Result<DocumentNode, DocumentError> {
    let target = self.node_mut(path)?;
    let rebuilt = target.with_attrs(patch)?;
    let previous = std::mem::replace(target, rebuilt);
    self.revision += 1;
    trace!("update_attributes {path}: rev {}", self.revision);
    Ok(previous)
  }

  /// Select the whole node at `path`.
  ///
  /// # Errors
  ///
  /// Returns [`DocumentError::InvalidPath`] if there is no node there.
  pub fn select_node(&mut self, path: &NodePath) -> Result<&DocumentNode, DocumentError> {
    if self.node(path).is_none() {
      return Err(DocumentError::InvalidPath(path.clone()));
    }
    self.selection = Selection::Node { path: path.clone() };
    self
      .node(path)
      .ok_or_else(|| DocumentError::InvalidPath(path.clone()))
  }

  /// Place the cursor between two children of `parent`.
  ///
  /// # Errors
  ///
  /// Returns [`DocumentError`] if `parent` is missing or `offset` is past its
  /// last child.
  pub fn set_cursor(
    &mut self,
    parent: &NodePath,
    offset: usize,
  ) -> Result<(), DocumentError> {
    let len = self
      .node(parent)
      .ok_or_else(|| DocumentError::InvalidPath(parent.clone()))?
      .children()
      .len();
    if offset > len {
      return Err(DocumentError::InvalidRange {
        from: offset,
        to: offset,
        len,
      });
    }
    self.selection = Selection::Cursor {
      parent: parent.clone(),
      offset,
    };
    Ok(())
  }

  /// Insert `nodes` at the selection: a selected node is replaced, a cursor
  /// inserts in place. Returns the path of the first inserted node.
  ///
  /// # Errors
  ///
  /// Returns [`DocumentError`] when the nodes cannot live at the selection.
  pub fn insert_at_selection(
    &mut self,
    nodes: Vec<DocumentNode>,
  ) -> Result<NodePath, DocumentError> {
    let (parent, from, to) = match &self.selection {
      Selection::Cursor { parent, offset } => (parent.clone(), *offset, *offset),
      Selection::Node { path } => {
        let (parent, index) =
          path.split_last().ok_or(DocumentError::RootImmutable)?;
        (parent, index, index + 1)
      },
    };
    self.replace_range(&parent, from, to, nodes)?;
    Ok(parent.child(from))
  }

  /// Concatenated text of the whole document.
  #[must_use]
  pub fn text_content(&self) -> String {
    self.root.text_content()
  }
}
