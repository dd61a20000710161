//! Build a [`Document`] from raw markup.
//!
//! The builder keeps a stack of open frames. Element frames become nodes when
//! they close; mark frames only colour the text emitted while they are open;
//! transparent frames (`div`, `span`, `tbody` and anything unknown) add no
//! structure of their own. Inline content that shows up where blocks are
//! expected is wrapped in an implicit paragraph, closed again by the next
//! block or by the end of its container.
use log::debug;

use super::tokenizer::{Token, VOID_ELEMENTS, tokenize};
use crate::{
  document::{
    Attrs,
    Document,
    DocumentNode,
    Mark,
    NodeKind,
    node::normalize_marks,
  },
  error::{DocumentError, ParseError, ParseErrorKind},
};

#[derive(Debug)]
enum Frame {
  Element {
    tag:      String,
    kind:     NodeKind,
    attrs:    Attrs,
    children: Vec<DocumentNode>,
    offset:   usize,
    implicit: bool,
  },
  Mark {
    tag:    String,
    mark:   Mark,
    offset: usize,
  },
  Transparent {
    tag:    String,
    inline: bool,
    offset: usize,
  },
  /// An embedded frame (`iframe`, or the `div` wrapping one). Its content is
  /// fallback text and is discarded.
  Embed {
    tag:    String,
    node:   Option<DocumentNode>,
    offset: usize,
  },
  /// `script`, `style` and similar: dropped wholesale.
  Discard { tag: String, offset: usize },
}

impl Frame {
  fn tag(&self) -> &str {
    match self {
      Self::Element { tag, .. }
      | Self::Mark { tag, .. }
      | Self::Transparent { tag, .. }
      | Self::Embed { tag, .. }
      | Self::Discard { tag, .. } => tag,
    }
  }

  const fn offset(&self) -> usize {
    match self {
      Self::Element { offset, .. }
      | Self::Mark { offset, .. }
      | Self::Transparent { offset, .. }
      | Self::Embed { offset, .. }
      | Self::Discard { offset, .. } => *offset,
    }
  }

  const fn is_implicit(&self) -> bool {
    matches!(self, Self::Element { implicit: true, .. })
  }
}

/// Where content emitted right now would land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
  /// Inside a paragraph, heading, or an open mark.
  Inline,
  /// Directly inside a node of this kind.
  Block(NodeKind),
  /// Inside an embed or a discarded element.
  Opaque,
}

const fn accepts_blocks(kind: NodeKind) -> bool {
  matches!(
    kind,
    NodeKind::Doc
      | NodeKind::ListItem
      | NodeKind::Blockquote
      | NodeKind::TableCell
  )
}

fn mark_for(tag: &str, attrs: &[(String, String)]) -> Option<Mark> {
  let mark = match tag {
    "a" => {
      Mark::Link {
        href:   attr(attrs, "href").unwrap_or_default().to_string(),
        target: attr(attrs, "target").map(str::to_string),
      }
    },
    "strong" | "b" => Mark::Bold,
    "em" | "i" => Mark::Italic,
    "u" => Mark::Underline,
    "s" | "del" | "strike" => Mark::Strike,
    "code" => Mark::Code,
    _ => return None,
  };
  Some(mark)
}

fn attr<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
  attrs
    .iter()
    .find(|(n, _)| n == name)
    .map(|(_, value)| value.as_str())
}

fn numeric(attrs: &[(String, String)], name: &str) -> Option<i64> {
  attr(attrs, name)
    .and_then(|value| value.trim().parse::<i64>().ok())
    .filter(|n| *n > 0)
}

fn non_empty(attrs: &[(String, String)], name: &str) -> Option<String> {
  attr(attrs, name)
    .filter(|value| !value.is_empty())
    .map(str::to_string)
}

fn media_node(attrs: &[(String, String)]) -> Option<DocumentNode> {
  let src = non_empty(attrs, "src")?;
  let mut node_attrs = Attrs::new()
    .with("src", src)
    .with("alt", attr(attrs, "alt").map(str::to_string))
    .with("title", non_empty(attrs, "title"));
  if let (Some(width), Some(height)) =
    (numeric(attrs, "width"), numeric(attrs, "height"))
  {
    node_attrs.set("width", width);
    node_attrs.set("height", height);
  }
  DocumentNode::create(NodeKind::ResizableMedia, node_attrs, Vec::new()).ok()
}

fn embed_node(attrs: &[(String, String)]) -> Option<DocumentNode> {
  let src = non_empty(attrs, "src")?;
  let node_attrs = Attrs::new()
    .with("src", src)
    .with("width", numeric(attrs, "width").unwrap_or(640))
    .with("height", numeric(attrs, "height").unwrap_or(480))
    .with("start", numeric(attrs, "data-start").unwrap_or(0));
  DocumentNode::create(NodeKind::Youtube, node_attrs, Vec::new()).ok()
}

/// Element tags that open a node, with their kind and attributes.
fn element_for(tag: &str, attrs: &[(String, String)]) -> Option<(NodeKind, Attrs)> {
  let element = match tag {
    "p" => (NodeKind::Paragraph, Attrs::new()),
    "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
      let level = i64::from(tag.as_bytes()[1] - b'0');
      let mut heading = Attrs::new().with("level", level);
      if let Some(id) = non_empty(attrs, "id") {
        heading.set("anchorId", id);
      }
      if let Some(ordinal) = non_empty(attrs, "data-ordinal") {
        heading.set("ordinal", ordinal);
      }
      (NodeKind::Heading, heading)
    },
    "ul" => (NodeKind::BulletList, Attrs::new()),
    "ol" => {
      let start = attr(attrs, "start")
        .and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|n| *n >= 0)
        .unwrap_or(1);
      (NodeKind::OrderedList, Attrs::new().with("start", start))
    },
    "li" => (NodeKind::ListItem, Attrs::new()),
    "blockquote" => (NodeKind::Blockquote, Attrs::new()),
    "pre" => (NodeKind::CodeBlock, Attrs::new()),
    "table" => (NodeKind::Table, Attrs::new()),
    "tr" => (NodeKind::TableRow, Attrs::new()),
    "td" | "th" => {
      (
        NodeKind::TableCell,
        Attrs::new()
          .with("header", tag == "th")
          .with("colspan", numeric(attrs, "colspan").unwrap_or(1))
          .with("rowspan", numeric(attrs, "rowspan").unwrap_or(1)),
      )
    },
    _ => return None,
  };
  Some(element)
}

struct Builder<'a> {
  src:    &'a str,
  blocks: Vec<DocumentNode>,
  stack:  Vec<Frame>,
}

impl<'a> Builder<'a> {
  const fn new(src: &'a str) -> Self {
    Self {
      src,
      blocks: Vec::new(),
      stack: Vec::new(),
    }
  }

  fn error(&self, kind: ParseErrorKind, offset: usize) -> ParseError {
    ParseError::at(kind, self.src, offset)
  }

  fn context(&self) -> Context {
    for frame in self.stack.iter().rev() {
      match frame {
        Frame::Mark { .. } | Frame::Transparent { inline: true, .. } => {
          return Context::Inline;
        },
        Frame::Element {
          kind: NodeKind::Paragraph | NodeKind::Heading,
          ..
        } => return Context::Inline,
        Frame::Element { kind, .. } => return Context::Block(*kind),
        Frame::Transparent { inline: false, .. } => {},
        Frame::Embed { .. } | Frame::Discard { .. } => return Context::Opaque,
      }
    }
    Context::Block(NodeKind::Doc)
  }

  /// Tag of the innermost frame that makes the context inline.
  fn inline_owner(&self) -> String {
    self
      .stack
      .iter()
      .rev()
      .find(|frame| {
        matches!(
          frame,
          Frame::Mark { .. }
            | Frame::Transparent { inline: true, .. }
            | Frame::Element {
              kind: NodeKind::Paragraph | NodeKind::Heading,
              ..
            }
        )
      })
      .map_or_else(|| "p".to_string(), |frame| frame.tag().to_string())
  }

  fn element_children(&mut self) -> &mut Vec<DocumentNode> {
    self
      .stack
      .iter_mut()
      .rev()
      .find_map(|frame| {
        match frame {
          Frame::Element { children, .. } => Some(children),
          _ => None,
        }
      })
      .unwrap_or(&mut self.blocks)
  }

  fn open_implicit_paragraph(&mut self, offset: usize) {
    self.stack.push(Frame::Element {
      tag: "p".to_string(),
      kind: NodeKind::Paragraph,
      attrs: Attrs::new(),
      children: Vec::new(),
      offset,
      implicit: true,
    });
  }

  /// Make the current context inline, opening an implicit paragraph when a
  /// block container is current.
  fn ensure_inline(&mut self, what: &str, offset: usize) -> Result<bool, ParseError> {
    match self.context() {
      Context::Inline => Ok(true),
      Context::Block(kind) if accepts_blocks(kind) => {
        self.open_implicit_paragraph(offset);
        Ok(true)
      },
      Context::Block(kind) => {
        Err(self.error(
          ParseErrorKind::InvalidNesting {
            child:  what.to_string(),
            parent: kind.name().to_string(),
          },
          offset,
        ))
      },
      Context::Opaque => Ok(false),
    }
  }

  /// Close implicit paragraphs so a block can be placed, and check the
  /// container accepts `kind`.
  fn ensure_block(
    &mut self,
    tag: &str,
    kind: NodeKind,
    offset: usize,
  ) -> Result<bool, ParseError> {
    self.close_implicit();
    match self.context() {
      Context::Opaque => Ok(false),
      Context::Inline => {
        Err(self.error(
          ParseErrorKind::InvalidNesting {
            child:  tag.to_string(),
            parent: self.inline_owner(),
          },
          offset,
        ))
      },
      Context::Block(parent) => {
        let fits = match kind {
          NodeKind::ListItem => {
            matches!(parent, NodeKind::BulletList | NodeKind::OrderedList)
          },
          NodeKind::TableRow => parent == NodeKind::Table,
          NodeKind::TableCell => parent == NodeKind::TableRow,
          _ => accepts_blocks(parent),
        };
        if fits {
          return Ok(true);
        }
        let error = match kind {
          NodeKind::TableCell => ParseErrorKind::StrayTableCell,
          NodeKind::TableRow => ParseErrorKind::StrayTableRow,
          _ => {
            ParseErrorKind::InvalidNesting {
              child:  tag.to_string(),
              parent: parent.name().to_string(),
            }
          },
        };
        Err(self.error(error, offset))
      },
    }
  }

  fn close_implicit(&mut self) {
    while self.stack.last().is_some_and(Frame::is_implicit) {
      if let Some(frame) = self.stack.pop() {
        // Implicit paragraphs hold only inline content and always fit.
        let _ = self.finalize(frame);
      }
    }
  }

  fn active_marks(&self) -> Vec<Mark> {
    let mut marks = Vec::new();
    for frame in self.stack.iter().rev() {
      match frame {
        Frame::Mark { mark, .. } => marks.push(mark.clone()),
        Frame::Element { .. } => break,
        _ => {},
      }
    }
    marks.reverse();
    normalize_marks(marks)
  }

  fn push_text(&mut self, text: String, offset: usize) -> Result<(), ParseError> {
    if text.is_empty() {
      return Ok(());
    }
    if self.context() != Context::Inline && text.trim().is_empty() {
      return Ok(());
    }
    if !self.ensure_inline("text", offset)? {
      return Ok(());
    }
    let marks = self.active_marks();
    let children = self.element_children();
    match children.last() {
      Some(last) if last.kind() == NodeKind::Text && last.marks() == marks.as_slice() => {
        let merged = format!("{}{text}", last.text_value());
        if let Some(slot) = children.last_mut() {
          *slot = DocumentNode::text(merged, marks);
        }
      },
      _ => children.push(DocumentNode::text(text, marks)),
    }
    Ok(())
  }

  fn start_tag(
    &mut self,
    name: String,
    attrs: &[(String, String)],
    self_closing: bool,
    offset: usize,
  ) -> Result<(), ParseError> {
    if self.context() == Context::Opaque {
      return match self.stack.last() {
        Some(Frame::Discard { .. }) => {
          if !self_closing && !VOID_ELEMENTS.contains(&name.as_str()) {
            self.stack.push(Frame::Discard { tag: name, offset });
          }
          Ok(())
        },
        Some(Frame::Embed { tag, .. }) if tag == "div" && name == "iframe" => {
          let node = embed_node(attrs);
          if let Some(Frame::Embed { node: slot, .. }) = self.stack.last_mut() {
            *slot = node;
          }
          if !self_closing {
            self.stack.push(Frame::Embed {
              tag: name,
              node: None,
              offset,
            });
          }
          Ok(())
        },
        Some(frame) => {
          Err(self.error(
            ParseErrorKind::InvalidNesting {
              child:  name,
              parent: frame.tag().to_string(),
            },
            offset,
          ))
        },
        None => Ok(()),
      };
    }

    let is_void = VOID_ELEMENTS.contains(&name.as_str());

    match name.as_str() {
      "br" => {
        if self.ensure_inline("br", offset)? {
          self.element_children().push(DocumentNode::hard_break());
        }
        return Ok(());
      },
      "img" => {
        let Some(node) = media_node(attrs) else {
          debug!("Dropping <img> without a src at byte {offset}");
          return Ok(());
        };
        match self.context() {
          Context::Block(kind) if accepts_blocks(kind) => {
            self.element_children().push(node);
          },
          _ => {
            if self.ensure_inline("img", offset)? {
              self.element_children().push(node);
            }
          },
        }
        return Ok(());
      },
      "iframe" => {
        if self.ensure_block("iframe", NodeKind::Youtube, offset)? && !self_closing {
          self.stack.push(Frame::Embed {
            tag: name,
            node: embed_node(attrs),
            offset,
          });
        } else if self_closing {
          if let Some(node) = embed_node(attrs) {
            self.element_children().push(node);
          }
        }
        return Ok(());
      },
      "div" if attr(attrs, "data-youtube-video").is_some() => {
        if self.ensure_block("div", NodeKind::Youtube, offset)? && !self_closing {
          self.stack.push(Frame::Embed {
            tag: name,
            node: None,
            offset,
          });
        }
        return Ok(());
      },
      "script" | "style" | "textarea" | "template" | "head" | "title" => {
        if !self_closing {
          self.stack.push(Frame::Discard { tag: name, offset });
        }
        return Ok(());
      },
      _ => {},
    }

    if is_void {
      debug!("Ignoring unsupported void element <{name}>");
      return Ok(());
    }

    if let Some(mark) = mark_for(&name, attrs) {
      if self.ensure_inline(&name, offset)? && !self_closing {
        self.stack.push(Frame::Mark {
          tag: name,
          mark,
          offset,
        });
      }
      return Ok(());
    }

    if let Some((kind, node_attrs)) = element_for(&name, attrs) {
      if self.ensure_block(&name, kind, offset)? {
        let frame = Frame::Element {
          tag: name,
          kind,
          attrs: node_attrs,
          children: Vec::new(),
          offset,
          implicit: false,
        };
        if self_closing {
          self.finalize(frame)?;
        } else {
          self.stack.push(frame);
        }
      }
      return Ok(());
    }

    if !self_closing {
      let inline = self.context() == Context::Inline;
      self.stack.push(Frame::Transparent {
        tag: name,
        inline,
        offset,
      });
    }
    Ok(())
  }

  fn end_tag(&mut self, name: &str, offset: usize) -> Result<(), ParseError> {
    if VOID_ELEMENTS.contains(&name) {
      return Ok(());
    }
    self.close_implicit();

    let top_matches = self.stack.last().is_some_and(|frame| frame.tag() == name);
    if !top_matches {
      let open = self.stack.iter().any(|frame| frame.tag() == name);
      let kind = match self.stack.last() {
        Some(top) if open => {
          ParseErrorKind::MismatchedClosingTag {
            expected: top.tag().to_string(),
            found:    name.to_string(),
          }
        },
        _ => ParseErrorKind::UnexpectedClosingTag(name.to_string()),
      };
      return Err(self.error(kind, offset));
    }

    if let Some(frame) = self.stack.pop() {
      self.finalize(frame)?;
    }
    Ok(())
  }

  fn raw_text(&mut self, raw: &str, offset: usize) -> Result<(), ParseError> {
    let Some(Frame::Element {
      kind: NodeKind::CodeBlock,
      attrs,
      children,
      ..
    }) = self.stack.last_mut()
    else {
      // Content of script/style and friends.
      return Ok(());
    };

    let tokens = tokenize(raw)
      .map_err(|err| ParseError::at(err.kind, self.src, offset + err.offset))?;
    let mut code = String::new();
    for token in tokens {
      match token {
        Token::StartTag { name, attrs: tag_attrs, .. } => {
          if name == "code" && attrs.text("language").is_none() {
            if let Some(language) = attr(&tag_attrs, "class")
              .and_then(|class| {
                class
                  .split_whitespace()
                  .find_map(|c| c.strip_prefix("language-"))
              })
              .filter(|language| !language.is_empty())
            {
              attrs.set("language", language);
            }
          } else if name == "br" {
            code.push('\n');
          }
        },
        Token::Text { text, .. } => code.push_str(&text),
        Token::RawText { text, .. } => code.push_str(&text),
        Token::EndTag { .. } => {},
      }
    }
    if !code.is_empty() {
      children.push(DocumentNode::plain(code));
    }
    Ok(())
  }

  /// Turn a closed frame into a node and hand it to its parent.
  fn finalize(&mut self, frame: Frame) -> Result<(), ParseError> {
    match frame {
      Frame::Element {
        tag,
        kind,
        attrs,
        children,
        offset,
        ..
      } => {
        let node = DocumentNode::create(kind, attrs, children).map_err(|err| {
          let kind = match err {
            DocumentError::RaggedTable {
              row,
              expected,
              found,
            } => {
              ParseErrorKind::RaggedTable {
                row,
                expected,
                found,
              }
            },
            DocumentError::InvalidContent { child, .. } => {
              ParseErrorKind::InvalidNesting { child, parent: tag }
            },
            _ => ParseErrorKind::MalformedTag,
          };
          self.error(kind, offset)
        })?;
        self.element_children().push(node);
      },
      Frame::Embed {
        node: Some(node), ..
      } => {
        self.element_children().push(node);
      },
      _ => {},
    }
    Ok(())
  }

  fn finish(mut self) -> Result<Document, ParseError> {
    self.close_implicit();
    if let Some(frame) = self.stack.last() {
      return Err(self.error(
        ParseErrorKind::UnterminatedTag(frame.tag().to_string()),
        frame.offset(),
      ));
    }
    let blocks = std::mem::take(&mut self.blocks);
    let root = DocumentNode::create(NodeKind::Doc, Attrs::new(), blocks)
      .map_err(|err| {
        self.error(
          ParseErrorKind::InvalidNesting {
            child:  err.to_string(),
            parent: "document".to_string(),
          },
          0,
        )
      })?;
    Document::from_root(root).map_err(|_| self.error(ParseErrorKind::MalformedTag, 0))
  }
}

/// Parse raw markup into a document.
///
/// # Errors
///
/// Returns a [`ParseError`] describing the first structural problem:
/// unterminated or mismatched tags, stray table cells or rows, ragged tables,
/// and blocks nested where only inline content may go.
pub fn parse(src: &str) -> Result<Document, ParseError> {
  let mut builder = Builder::new(src);
  for token in tokenize(src)? {
    match token {
      Token::StartTag {
        name,
        attrs,
        self_closing,
        offset,
      } => builder.start_tag(name, &attrs, self_closing, offset)?,
      Token::EndTag { name, offset } => builder.end_tag(&name, offset)?,
      Token::Text { text, offset } => builder.push_text(text, offset)?,
      Token::RawText { text, offset } => builder.raw_text(&text, offset)?,
    }
  }
  builder.finish()
}
