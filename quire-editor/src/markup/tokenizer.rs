//! Strict tokenizer for the markup subset.
//!
//! Unlike a browser-grade HTML tokenizer this one refuses to guess: a tag
//! that never reaches its `>` or a comment without `-->` is an error, which
//! is what lets the raw editing mode reject broken input instead of silently
//! repairing it.
use std::borrow::Cow;

use crate::error::{ParseError, ParseErrorKind};

/// Elements whose content is taken verbatim up to the matching end tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["pre", "script", "style", "textarea"];

/// Elements that never have an end tag.
pub const VOID_ELEMENTS: &[&str] = &[
  "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta",
  "param", "source", "track", "wbr",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
  StartTag {
    name:         String,
    attrs:        Vec<(String, String)>,
    self_closing: bool,
    offset:       usize,
  },
  EndTag {
    name:   String,
    offset: usize,
  },
  Text {
    text:   String,
    offset: usize,
  },
  /// Verbatim content of a raw-text element, entities not yet decoded.
  RawText {
    text:   String,
    offset: usize,
  },
}

fn decode(text: &str) -> String {
  match html_escape::decode_html_entities(text) {
    Cow::Borrowed(s) => s.to_string(),
    Cow::Owned(s) => s,
  }
}

const fn is_name_char(b: u8) -> bool {
  b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

struct Cursor<'a> {
  src: &'a str,
  pos: usize,
}

impl<'a> Cursor<'a> {
  fn bytes(&self) -> &'a [u8] {
    self.src.as_bytes()
  }

  fn peek(&self) -> Option<u8> {
    self.bytes().get(self.pos).copied()
  }

  fn peek_at(&self, ahead: usize) -> Option<u8> {
    self.bytes().get(self.pos + ahead).copied()
  }

  fn rest(&self) -> &'a str {
    self.src.get(self.pos..).unwrap_or_default()
  }

  fn skip_whitespace(&mut self) {
    while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
      self.pos += 1;
    }
  }

  fn take_while(&mut self, accept: impl Fn(u8) -> bool) -> &'a str {
    let start = self.pos;
    while self.peek().is_some_and(&accept) {
      self.pos += 1;
    }
    self.src.get(start..self.pos).unwrap_or_default()
  }

  fn error(&self, kind: ParseErrorKind, offset: usize) -> ParseError {
    ParseError::at(kind, self.src, offset)
  }
}

/// Split `src` into tokens. Offsets are byte offsets into `src`.
///
/// # Errors
///
/// Returns a [`ParseError`] for malformed tags, unterminated comments and
/// raw-text elements that are never closed.
pub fn tokenize(src: &str) -> Result<Vec<Token>, ParseError> {
  let mut cursor = Cursor { src, pos: 0 };
  let mut tokens = Vec::new();

  while cursor.pos < src.len() {
    let start = cursor.pos;
    if cursor.peek() != Some(b'<') {
      let text = cursor.take_while(|b| b != b'<');
      tokens.push(Token::Text {
        text:   decode(text),
        offset: start,
      });
      continue;
    }

    match cursor.peek_at(1) {
      Some(b'!') if cursor.rest().starts_with("<!--") => {
        let end = cursor.rest()[4..]
          .find("-->")
          .ok_or_else(|| cursor.error(ParseErrorKind::UnterminatedComment, start))?;
        cursor.pos += 4 + end + 3;
      },
      Some(b'!' | b'?') => {
        let end = cursor
          .rest()
          .find('>')
          .ok_or_else(|| cursor.error(ParseErrorKind::MalformedTag, start))?;
        cursor.pos += end + 1;
      },
      Some(b'/') => {
        cursor.pos += 2;
        let name = cursor.take_while(is_name_char).to_ascii_lowercase();
        cursor.skip_whitespace();
        if name.is_empty() || cursor.peek() != Some(b'>') {
          return Err(cursor.error(ParseErrorKind::MalformedTag, start));
        }
        cursor.pos += 1;
        tokens.push(Token::EndTag {
          name,
          offset: start,
        });
      },
      Some(b) if b.is_ascii_alphabetic() => {
        let token = start_tag(&mut cursor, start)?;
        let raw_element = match &token {
          Token::StartTag {
            name,
            self_closing: false,
            ..
          } if RAW_TEXT_ELEMENTS.contains(&name.as_str()) => Some(name.clone()),
          _ => None,
        };
        tokens.push(token);
        if let Some(name) = raw_element {
          raw_text(&mut cursor, &name, start, &mut tokens)?;
        }
      },
      _ => {
        // A lone `<` that starts no tag is ordinary text.
        cursor.pos += 1;
        let more = cursor.take_while(|b| b != b'<');
        tokens.push(Token::Text {
          text:   format!("<{}", decode(more)),
          offset: start,
        });
      },
    }
  }

  Ok(tokens)
}

fn start_tag(cursor: &mut Cursor<'_>, start: usize) -> Result<Token, ParseError> {
  cursor.pos += 1;
  let name = cursor.take_while(is_name_char).to_ascii_lowercase();
  let mut attrs = Vec::new();

  loop {
    cursor.skip_whitespace();
    match cursor.peek() {
      None => return Err(cursor.error(ParseErrorKind::MalformedTag, start)),
      Some(b'>') => {
        cursor.pos += 1;
        return Ok(Token::StartTag {
          name,
          attrs,
          self_closing: false,
          offset: start,
        });
      },
      Some(b'/') if cursor.peek_at(1) == Some(b'>') => {
        cursor.pos += 2;
        return Ok(Token::StartTag {
          name,
          attrs,
          self_closing: true,
          offset: start,
        });
      },
      Some(b'<') => return Err(cursor.error(ParseErrorKind::MalformedTag, start)),
      Some(_) => {
        let attr_name = cursor
          .take_while(|b| {
            !b.is_ascii_whitespace() && !matches!(b, b'/' | b'>' | b'=' | b'<')
          })
          .to_ascii_lowercase();
        if attr_name.is_empty() {
          return Err(cursor.error(ParseErrorKind::MalformedTag, start));
        }
        cursor.skip_whitespace();
        let value = if cursor.peek() == Some(b'=') {
          cursor.pos += 1;
          cursor.skip_whitespace();
          attr_value(cursor, start)?
        } else {
          String::new()
        };
        attrs.push((attr_name, value));
      },
    }
  }
}

fn attr_value(cursor: &mut Cursor<'_>, start: usize) -> Result<String, ParseError> {
  match cursor.peek() {
    Some(quote @ (b'"' | b'\'')) => {
      cursor.pos += 1;
      let value = cursor.take_while(|b| b != quote);
      if cursor.peek() != Some(quote) {
        return Err(cursor.error(ParseErrorKind::MalformedTag, start));
      }
      cursor.pos += 1;
      Ok(decode(value))
    },
    Some(_) => {
      let value =
        cursor.take_while(|b| !b.is_ascii_whitespace() && b != b'>');
      Ok(decode(value))
    },
    None => Err(cursor.error(ParseErrorKind::MalformedTag, start)),
  }
}

fn raw_text(
  cursor: &mut Cursor<'_>,
  name: &str,
  open_offset: usize,
  tokens: &mut Vec<Token>,
) -> Result<(), ParseError> {
  let needle = format!("</{name}");
  let content_start = cursor.pos;
  let haystack = cursor.rest().to_ascii_lowercase();
  let Some(end) = haystack.find(&needle) else {
    return Err(cursor.error(
      ParseErrorKind::UnterminatedTag(name.to_string()),
      open_offset,
    ));
  };

  tokens.push(Token::RawText {
    text:   cursor.rest()[..end].to_string(),
    offset: content_start,
  });
  cursor.pos += end;

  let close_offset = cursor.pos;
  cursor.pos += needle.len();
  cursor.skip_whitespace();
  if cursor.peek() != Some(b'>') {
    return Err(cursor.error(ParseErrorKind::MalformedTag, close_offset));
  }
  cursor.pos += 1;
  tokens.push(Token::EndTag {
    name:   name.to_string(),
    offset: close_offset,
  });
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tokenizes_tags_text_and_entities() {
    let tokens = tokenize(r#"<p class="x">a &amp; b</p>"#).unwrap_or_default();
    assert_eq!(tokens.len(), 3);
    assert!(matches!(
      &tokens[0],
      Token::StartTag { name, attrs, .. }
        if name == "p" && attrs == &[("class".to_string(), "x".to_string())]
    ));
    assert!(matches!(&tokens[1], Token::Text { text, .. } if text == "a & b"));
  }

  #[test]
  fn lone_angle_bracket_is_text() {
    let tokens = tokenize("1 < 2").unwrap_or_default();
    let text: String = tokens
      .iter()
      .filter_map(|t| {
        match t {
          Token::Text { text, .. } => Some(text.as_str()),
          _ => None,
        }
      })
      .collect();
    assert_eq!(text, "1 < 2");
  }

  #[test]
  fn unterminated_tag_is_an_error() {
    let err = tokenize("<p>hello <strong").err();
    assert!(matches!(
      err,
      Some(ParseError {
        kind: ParseErrorKind::MalformedTag,
        ..
      })
    ));
  }

  #[test]
  fn unterminated_comment_is_an_error() {
    let err = tokenize("<p>a</p><!-- note").err();
    assert!(matches!(
      err,
      Some(ParseError {
        kind: ParseErrorKind::UnterminatedComment,
        ..
      })
    ));
  }

  #[test]
  fn pre_content_is_raw() {
    let tokens = tokenize("<pre><code><p>not a tag</p></code></pre>").unwrap_or_default();
    assert!(matches!(
      &tokens[1],
      Token::RawText { text, .. } if text == "<code><p>not a tag</p></code>"
    ));
  }
}
