//! Render a document as canonical markup.
//!
//! The output is stable: parsing it again yields an equal tree, and
//! serializing that tree yields the same string. Marks are always nested in
//! rank order, so a run that stays bold across several text nodes keeps a
//! single `<strong>` open.
use std::fmt::Write;

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::document::{Attrs, DocumentNode, Mark, NodeKind};

fn push_attr(out: &mut String, name: &str, value: &str) {
  let _ = write!(out, " {name}=\"{}\"", encode_double_quoted_attribute(value));
}

fn push_number_attr(out: &mut String, attrs: &Attrs, name: &str) {
  if let Some(value) = attrs.number(name) {
    let _ = write!(out, " {name}=\"{value}\"");
  }
}

fn open_mark(out: &mut String, mark: &Mark) {
  match mark {
    Mark::Link { href, target } => {
      out.push_str("<a");
      push_attr(out, "href", href);
      if let Some(target) = target {
        push_attr(out, "target", target);
      }
      out.push('>');
    },
    Mark::Bold => out.push_str("<strong>"),
    Mark::Italic => out.push_str("<em>"),
    Mark::Underline => out.push_str("<u>"),
    Mark::Strike => out.push_str("<s>"),
    Mark::Code => out.push_str("<code>"),
  }
}

const fn close_tag(mark: &Mark) -> &'static str {
  match mark {
    Mark::Link { .. } => "</a>",
    Mark::Bold => "</strong>",
    Mark::Italic => "</em>",
    Mark::Underline => "</u>",
    Mark::Strike => "</s>",
    Mark::Code => "</code>",
  }
}

fn close_marks(out: &mut String, open: &mut Vec<Mark>, keep: usize) {
  while open.len() > keep {
    if let Some(mark) = open.pop() {
      out.push_str(close_tag(&mark));
    }
  }
}

fn write_inline(out: &mut String, children: &[DocumentNode]) {
  let mut open: Vec<Mark> = Vec::new();
  for child in children {
    if child.kind() == NodeKind::Text {
      let marks = child.marks();
      let shared = open
        .iter()
        .zip(marks)
        .take_while(|(a, b)| a == b)
        .count();
      close_marks(out, &mut open, shared);
      for mark in &marks[shared..] {
        open_mark(out, mark);
        open.push(mark.clone());
      }
      out.push_str(&encode_text(child.text_value()));
    } else {
      close_marks(out, &mut open, 0);
      write_node(out, child);
    }
  }
  close_marks(out, &mut open, 0);
}

fn write_blocks(out: &mut String, children: &[DocumentNode]) {
  for child in children {
    write_node(out, child);
  }
}

fn write_media(out: &mut String, attrs: &Attrs) {
  out.push_str("<img");
  push_attr(out, "src", attrs.text("src").unwrap_or_default());
  if let Some(alt) = attrs.text("alt") {
    push_attr(out, "alt", alt);
  }
  if let Some(title) = attrs.text("title") {
    push_attr(out, "title", title);
  }
  push_number_attr(out, attrs, "width");
  push_number_attr(out, attrs, "height");
  out.push('>');
}

fn write_node(out: &mut String, node: &DocumentNode) {
  let attrs = node.attrs();
  match node.kind() {
    NodeKind::Doc => {
      for (index, child) in node.children().iter().enumerate() {
        if index > 0 {
          out.push('\n');
        }
        write_node(out, child);
      }
    },
    NodeKind::Text => write_inline(out, std::slice::from_ref(node)),
    NodeKind::Paragraph => {
      out.push_str("<p>");
      write_inline(out, node.children());
      out.push_str("</p>");
    },
    NodeKind::Heading => {
      let level = attrs.number("level").unwrap_or(1).clamp(1, 6);
      let _ = write!(out, "<h{level}");
      if let Some(anchor) = attrs.text("anchorId") {
        push_attr(out, "id", anchor);
      }
      if let Some(ordinal) = attrs.text("ordinal") {
        push_attr(out, "data-ordinal", ordinal);
      }
      out.push('>');
      write_inline(out, node.children());
      let _ = write!(out, "</h{level}>");
    },
    NodeKind::BulletList => {
      out.push_str("<ul>");
      write_blocks(out, node.children());
      out.push_str("</ul>");
    },
    NodeKind::OrderedList => {
      out.push_str("<ol");
      match attrs.number("start") {
        Some(start) if start != 1 => {
          let _ = write!(out, " start=\"{start}\"");
        },
        _ => {},
      }
      out.push('>');
      write_blocks(out, node.children());
      out.push_str("</ol>");
    },
    NodeKind::ListItem => {
      out.push_str("<li>");
      write_blocks(out, node.children());
      out.push_str("</li>");
    },
    NodeKind::Blockquote => {
      out.push_str("<blockquote>");
      write_blocks(out, node.children());
      out.push_str("</blockquote>");
    },
    NodeKind::CodeBlock => {
      out.push_str("<pre><code");
      if let Some(language) = attrs.text("language") {
        push_attr(out, "class", &format!("language-{language}"));
      }
      out.push('>');
      out.push_str(&encode_text(&node.text_content()));
      out.push_str("</code></pre>");
    },
    NodeKind::Table => {
      out.push_str("<table><tbody>");
      write_blocks(out, node.children());
      out.push_str("</tbody></table>");
    },
    NodeKind::TableRow => {
      out.push_str("<tr>");
      write_blocks(out, node.children());
      out.push_str("</tr>");
    },
    NodeKind::TableCell => {
      let tag = if attrs.flag("header") { "th" } else { "td" };
      let _ = write!(out, "<{tag}");
      for span in ["colspan", "rowspan"] {
        match attrs.number(span) {
          Some(n) if n != 1 => {
            let _ = write!(out, " {span}=\"{n}\"");
          },
          _ => {},
        }
      }
      out.push('>');
      write_blocks(out, node.children());
      let _ = write!(out, "</{tag}>");
    },
    NodeKind::ResizableMedia => write_media(out, attrs),
    NodeKind::Youtube => {
      out.push_str("<div data-youtube-video=\"\"><iframe");
      push_attr(out, "src", attrs.text("src").unwrap_or_default());
      push_number_attr(out, attrs, "width");
      push_number_attr(out, attrs, "height");
      out.push_str(" allowfullscreen=\"true\"");
      if let Some(start) = attrs.number("start").filter(|s| *s > 0) {
        let _ = write!(out, " data-start=\"{start}\"");
      }
      out.push_str("></iframe></div>");
    },
    NodeKind::HardBreak => out.push_str("<br>"),
  }
}

/// Serialize a node and its subtree.
#[must_use]
pub fn serialize_node(node: &DocumentNode) -> String {
  let mut out = String::new();
  write_node(&mut out, node);
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn shared_marks_stay_open_across_runs() {
    let para = DocumentNode::create(
      NodeKind::Paragraph,
      Attrs::new(),
      vec![
        DocumentNode::text("a", vec![Mark::Bold]),
        DocumentNode::text("b", vec![Mark::Bold, Mark::Italic]),
        DocumentNode::plain("c"),
      ],
    )
    .unwrap_or_else(|_| DocumentNode::plain_paragraph(""));
    assert_eq!(
      serialize_node(&para),
      "<p><strong>a<em>b</em></strong>c</p>"
    );
  }

  #[test]
  fn text_and_attributes_are_escaped() {
    let para = DocumentNode::create(
      NodeKind::Paragraph,
      Attrs::new(),
      vec![DocumentNode::text(
        "1 < 2 & \"x\"",
        vec![Mark::Link {
          href:   "https://a.test/?q=\"x\"".to_string(),
          target: None,
        }],
      )],
    )
    .unwrap_or_else(|_| DocumentNode::plain_paragraph(""));
    assert_eq!(
      serialize_node(&para),
      "<p><a href=\"https://a.test/?q=&quot;x&quot;\">1 &lt; 2 &amp; \"x\"</a></p>"
    );
  }

  #[test]
  fn ordered_list_start_is_omitted_when_default() {
    let item = DocumentNode::create(
      NodeKind::ListItem,
      Attrs::new(),
      vec![DocumentNode::plain_paragraph("x")],
    )
    .unwrap_or_else(|_| DocumentNode::plain_paragraph(""));
    let list =
      DocumentNode::create(NodeKind::OrderedList, Attrs::new(), vec![item])
        .unwrap_or_else(|_| DocumentNode::plain_paragraph(""));
    assert_eq!(serialize_node(&list), "<ol><li><p>x</p></li></ol>");
  }
}
