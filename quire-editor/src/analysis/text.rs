//! Facts extracted from serialized markup: visible text, paragraphs,
//! headings, images, links and tables.
//!
//! Both the content scorer and the accessibility checker read markup through
//! a lenient DOM parse here, so they work on anything an author pastes, not
//! only on canonical markup.
use kuchikikiki::{NodeRef, iter::NodeEdge, parse_html};
use serde::Serialize;
use tendril::TendrilSink;

use crate::utils::{collapse_whitespace, count_words};

/// Elements that separate words when their text is flattened.
const BREAKING_ELEMENTS: &[&str] = &[
  "p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "td", "th", "tr", "br", "div",
  "blockquote", "pre", "ul", "ol", "table", "section", "article",
];

/// Containers whose `<p>` children are wrappers around a list item or cell
/// rather than prose paragraphs.
const WRAPPING_ELEMENTS: &[&str] = &["li", "td", "th"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingFact {
  pub level: u8,
  pub text:  String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFact {
  pub src: Option<String>,
  pub alt: Option<String>,
}

impl ImageFact {
  #[must_use]
  pub fn has_alt(&self) -> bool {
    self.alt.as_deref().is_some_and(|alt| !alt.trim().is_empty())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkFact {
  pub href: String,
  pub text: String,
}

impl LinkFact {
  /// Links with a scheme or a protocol-relative prefix leave the site.
  #[must_use]
  pub fn is_external(&self) -> bool {
    let href = self.href.trim().to_ascii_lowercase();
    href.starts_with("http://") || href.starts_with("https://") || href.starts_with("//")
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableFact {
  pub has_header: bool,
}

/// Everything the analyzers need from a body of markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BodyFacts {
  /// Tag-stripped text with whitespace collapsed.
  pub visible_text: String,
  /// Prose paragraphs; the wrappers inside list items and table cells are
  /// not counted.
  pub paragraphs:   Vec<String>,
  pub headings:     Vec<HeadingFact>,
  pub images:       Vec<ImageFact>,
  pub links:        Vec<LinkFact>,
  pub tables:       Vec<TableFact>,
}

fn attribute(node: &NodeRef, name: &str) -> Option<String> {
  node
    .as_element()
    .and_then(|element| element.attributes.borrow().get(name).map(str::to_string))
}

fn is_wrapped(node: &NodeRef) -> bool {
  node.ancestors().any(|ancestor| {
    ancestor
      .as_element()
      .is_some_and(|element| WRAPPING_ELEMENTS.contains(&&*element.name.local))
  })
}

fn flatten_text(root: &NodeRef) -> String {
  let mut out = String::new();
  for edge in root.traverse() {
    let NodeEdge::Start(node) = edge else {
      continue;
    };
    if let Some(text) = node.as_text() {
      out.push_str(&text.borrow());
    } else if let Some(element) = node.as_element() {
      if BREAKING_ELEMENTS.contains(&&*element.name.local) {
        out.push(' ');
      }
    }
  }
  collapse_whitespace(&out)
}

impl BodyFacts {
  /// Parse `markup` and collect its facts.
  #[must_use]
  pub fn extract(markup: &str) -> Self {
    let document = parse_html().one(markup);

    // Script and style text is never visible.
    if let Ok(hidden) = document.select("script, style, template") {
      let hidden: Vec<NodeRef> = hidden.map(|n| n.as_node().clone()).collect();
      for node in hidden {
        node.detach();
      }
    }

    let mut facts = Self {
      visible_text: flatten_text(&document),
      ..Self::default()
    };

    if let Ok(paragraphs) = document.select("p") {
      facts.paragraphs = paragraphs
        .filter(|p| !is_wrapped(p.as_node()))
        .map(|p| flatten_text(p.as_node()))
        .filter(|text| !text.is_empty())
        .collect();
    }

    if let Ok(headings) = document.select("h1, h2, h3, h4, h5, h6") {
      facts.headings = headings
        .map(|heading| {
          let level = (*heading.name.local)
            .strip_prefix('h')
            .and_then(|n| n.parse().ok())
            .unwrap_or(1);
          HeadingFact {
            level,
            text: flatten_text(heading.as_node()),
          }
        })
        .collect();
    }

    if let Ok(images) = document.select("img") {
      facts.images = images
        .map(|img| {
          ImageFact {
            src: attribute(img.as_node(), "src"),
            alt: attribute(img.as_node(), "alt"),
          }
        })
        .collect();
    }

    if let Ok(links) = document.select("a[href]") {
      facts.links = links
        .map(|link| {
          LinkFact {
            href: attribute(link.as_node(), "href").unwrap_or_default(),
            text: flatten_text(link.as_node()),
          }
        })
        .collect();
    }

    if let Ok(tables) = document.select("table") {
      facts.tables = tables
        .map(|table| {
          let has_header = table
            .as_node()
            .select("th")
            .is_ok_and(|mut headers| headers.next().is_some());
          TableFact { has_header }
        })
        .collect();
    }

    facts
  }

  #[must_use]
  pub fn visible_len(&self) -> usize {
    self.visible_text.chars().count()
  }

  #[must_use]
  pub fn word_count(&self) -> usize {
    count_words(&self.visible_text)
  }
}

/// Word count and reading time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStats {
  pub word_count:             usize,
  pub estimated_read_minutes: usize,
}

impl DocumentStats {
  /// Stats for `markup`, read at `words_per_minute` (225 when zero).
  #[must_use]
  pub fn of_markup(markup: &str, words_per_minute: u32) -> Self {
    Self::from_facts(&BodyFacts::extract(markup), words_per_minute)
  }

  #[must_use]
  pub fn from_facts(facts: &BodyFacts, words_per_minute: u32) -> Self {
    let word_count = facts.word_count();
    let rate = if words_per_minute == 0 {
      225
    } else {
      words_per_minute as usize
    };
    Self {
      word_count,
      estimated_read_minutes: word_count.div_ceil(rate),
    }
  }
}
