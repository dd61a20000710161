//! Raw markup: the text form of a document used by the raw editing mode,
//! by export, and by the analyzers.
mod parser;
mod serializer;
pub mod tokenizer;

pub use parser::parse;
pub use serializer::serialize_node;

use crate::document::Document;

/// Serialize a whole document to canonical markup.
#[must_use]
pub fn serialize(document: &Document) -> String {
  serialize_node(document.root())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn canonical_markup_is_a_fixed_point() {
    let inputs = [
      "<p>Hello <b>bold <i>both</i></b> plain</p>",
      "<h2 id=\"intro\">Intro</h2><p>text<br>more</p>",
      "<ul><li>one</li><li>two <a href=\"/x\">link</a></li></ul>",
      "<table><tr><th>a</th><th>b</th></tr><tr><td>1</td><td>2</td></tr></table>",
      "<pre><code class=\"language-rust\">fn main() { 1 &lt; 2 }</code></pre>",
      "<p><img src=\"a.png\" alt=\"A\" width=\"200\" height=\"100\"></p>",
    ];
    for input in inputs {
      let first = serialize(&parse(input).unwrap_or_default());
      let second = serialize(&parse(&first).unwrap_or_default());
      assert_eq!(first, second, "unstable for {input}");
      assert!(!first.is_empty());
    }
  }
}
