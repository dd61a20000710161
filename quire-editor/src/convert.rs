//! Import of external files into canonical markup, and export out of it.
//!
//! Imports go through the strict parser, so whatever comes back is markup the
//! structured editor accepts. Markdown export is a lossy approximation and is
//! never read back.
use std::{fmt::Write as _, fs, path::Path};

use comrak::{Options, markdown_to_html};
use html_escape::encode_text;
use kuchikikiki::{NodeRef, parse_html};
use log::debug;
use markup5ever::local_name;
use tendril::TendrilSink;

use crate::{
  document::{Document, DocumentNode, HeadingAttrs, Mark, NodeKind},
  error::{EditorResult, ParseError},
  markup::{parse, serialize},
};

/// Formats accepted by [`import_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
  Html,
  Markdown,
  Text,
}

impl ImportFormat {
  /// Guess the format from a file extension; anything unknown is plain text.
  #[must_use]
  pub fn from_path(path: &Path) -> Self {
    let extension = path
      .extension()
      .and_then(|ext| ext.to_str())
      .map(str::to_ascii_lowercase);
    match extension.as_deref() {
      Some("html" | "htm" | "xhtml") => Self::Html,
      Some("md" | "markdown" | "mdown") => Self::Markdown,
      _ => Self::Text,
    }
  }
}

/// Formats written by [`export_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
  Html,
  Markdown,
}

impl ExportFormat {
  #[must_use]
  pub fn from_path(path: &Path) -> Self {
    match path.extension().and_then(|ext| ext.to_str()) {
      Some(ext) if ext.eq_ignore_ascii_case("md") => Self::Markdown,
      _ => Self::Html,
    }
  }
}

/// Elements whose content is never part of a post body.
fn is_foreign(node: &NodeRef) -> bool {
  node.as_element().is_some_and(|element| {
    matches!(
      element.name.local,
      local_name!("script")
        | local_name!("style")
        | local_name!("template")
        | local_name!("noscript")
        | local_name!("form")
        | local_name!("nav")
    )
  })
}

/// Import an HTML document or fragment.
///
/// The input is first parsed leniently the way a browser would, which repairs
/// unclosed and misnested tags; the repaired body is then run through the
/// strict parser.
///
/// # Errors
///
/// Returns [`ParseError`] when the repaired markup still violates the document
/// schema, e.g. a ragged table.
pub fn import_html(html: &str) -> Result<String, ParseError> {
  let document = parse_html().one(html);

  let foreign: Vec<NodeRef> = document.descendants().filter(is_foreign).collect();
  for node in foreign {
    node.detach();
  }

  let mut body = Vec::new();
  if let Ok(found) = document.select_first("body") {
    for child in found.as_node().children() {
      if let Err(e) = child.serialize(&mut body) {
        debug!("Skipping unserializable node during import: {e}");
      }
    }
  }
  let body = String::from_utf8(body).unwrap_or_default();

  Ok(serialize(&parse(&body)?))
}

/// Import Markdown by rendering it to HTML first.
///
/// # Errors
///
/// Returns [`ParseError`] when the rendered HTML violates the document schema.
pub fn import_markdown(markdown: &str) -> Result<String, ParseError> {
  let mut options = Options::default();
  options.extension.strikethrough = true;
  options.extension.table = true;
  options.extension.autolink = true;
  import_html(&markdown_to_html(markdown, &options))
}

/// Wrap plain text in a single paragraph, keeping its line breaks.
#[must_use]
pub fn import_text(text: &str) -> String {
  let lines: Vec<String> = text
    .trim()
    .lines()
    .map(|line| encode_text(line).into_owned())
    .collect();
  if lines.is_empty() {
    return "<p></p>".to_string();
  }
  format!("<p>{}</p>", lines.join("<br>"))
}

/// Read `path` and convert it to canonical markup according to its extension.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails to parse.
pub fn import_file(path: &Path) -> EditorResult<String> {
  let content = fs::read_to_string(path)?;
  let format = ImportFormat::from_path(path);
  debug!("Importing {} as {format:?}", path.display());
  Ok(match format {
    ImportFormat::Html => import_html(&content)?,
    ImportFormat::Markdown => import_markdown(&content)?,
    ImportFormat::Text => import_text(&content),
  })
}

/// Wrap canonical markup in a standalone HTML page.
#[must_use]
pub fn export_html(markup: &str, title: &str) -> String {
  let title = if title.trim().is_empty() {
    "Untitled"
  } else {
    title.trim()
  };
  format!(
    "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta \
     charset=\"utf-8\">\n<meta name=\"viewport\" \
     content=\"width=device-width, initial-scale=1\">\n<title>{}</title>\n</\
     head>\n<body>\n<article>\n{markup}\n</article>\n</body>\n</html>\n",
    encode_text(title)
  )
}

fn inline_markdown(nodes: &[DocumentNode], out: &mut String) {
  for node in nodes {
    match node.kind() {
      NodeKind::Text => {
        let text = node.text_value();
        let bold = node.has_mark(&Mark::Bold);
        let italic = node.has_mark(&Mark::Italic);
        let wrap = match (bold, italic) {
          (true, true) => "***",
          (true, false) => "**",
          (false, true) => "*",
          (false, false) => "",
        };
        // Emphasis markers must hug the text, so surrounding spaces go outside.
        let trimmed = text.trim();
        if wrap.is_empty() || trimmed.is_empty() {
          out.push_str(text);
        } else {
          let lead = &text[..text.len() - text.trim_start().len()];
          let tail = &text[text.trim_end().len()..];
          let _ = write!(out, "{lead}{wrap}{trimmed}{wrap}{tail}");
        }
      },
      NodeKind::HardBreak => out.push_str("  \n"),
      NodeKind::ResizableMedia => {
        out.push_str(node.attrs().text("alt").unwrap_or_default());
      },
      _ => out.push_str(&node.text_content()),
    }
  }
}

fn block_markdown(node: &DocumentNode, indent: usize, blocks: &mut Vec<String>) {
  let pad = "  ".repeat(indent);
  match node.kind() {
    NodeKind::Heading => {
      let level = HeadingAttrs::of(node).map_or(1, |attrs| attrs.level);
      let mut line = format!("{} ", "#".repeat(usize::from(level.clamp(1, 6))));
      inline_markdown(node.children(), &mut line);
      blocks.push(line);
    },
    NodeKind::Paragraph => {
      let mut line = pad;
      inline_markdown(node.children(), &mut line);
      if !line.trim().is_empty() {
        blocks.push(line);
      }
    },
    NodeKind::BulletList => {
      let mut items = Vec::new();
      for item in node.children() {
        let mut inner = Vec::new();
        for child in item.children() {
          block_markdown(child, indent + 1, &mut inner);
        }
        let first = inner.first().map_or("", |line| line.trim_start());
        let mut entry = format!("{pad}- {first}");
        for rest in inner.iter().skip(1) {
          entry.push('\n');
          entry.push_str(rest);
        }
        items.push(entry);
      }
      blocks.push(items.join("\n"));
    },
    NodeKind::Blockquote
    | NodeKind::OrderedList
    | NodeKind::ListItem
    | NodeKind::Table
    | NodeKind::TableRow
    | NodeKind::Doc => {
      for child in node.children() {
        block_markdown(child, indent, blocks);
      }
    },
    NodeKind::TableCell => {
      let text = node.text_content();
      if !text.trim().is_empty() {
        blocks.push(format!("{pad}{}", text.trim()));
      }
    },
    NodeKind::ResizableMedia => {
      if let Some(alt) = node.attrs().text("alt").filter(|alt| !alt.is_empty()) {
        blocks.push(format!("{pad}{alt}"));
      }
    },
    NodeKind::CodeBlock | NodeKind::Text => {
      let text = node.text_content();
      if !text.trim().is_empty() {
        blocks.push(format!("{pad}{text}"));
      }
    },
    NodeKind::Youtube | NodeKind::HardBreak => {},
  }
}

/// A best-effort Markdown rendering of `document`.
///
/// Headings, paragraphs, bold, italic and bullet lists are kept; every other
/// construct degrades to its text.
#[must_use]
pub fn export_markdown(document: &Document) -> String {
  let mut blocks = Vec::new();
  block_markdown(document.root(), 0, &mut blocks);
  let mut out = blocks.join("\n\n");
  out.push('\n');
  out
}

/// Write canonical markup to `path`, as HTML or Markdown by extension.
///
/// # Errors
///
/// Returns an error if the markup cannot be parsed for a Markdown export or
/// the file cannot be written.
pub fn export_file(path: &Path, markup: &str, title: &str) -> EditorResult<()> {
  let content = match ExportFormat::from_path(path) {
    ExportFormat::Html => export_html(markup, title),
    ExportFormat::Markdown => export_markdown(&parse(markup)?),
  };
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    fs::create_dir_all(parent)?;
  }
  fs::write(path, content)?;
  debug!("Exported {}", path.display());
  Ok(())
}
