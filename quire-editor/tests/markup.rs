#![allow(clippy::expect_used, reason = "Fine in tests")]
use quire_editor::{
  Dimensions,
  Document,
  DocumentNode,
  MediaAttrs,
  NodeKind,
  NodePath,
  ParseErrorKind,
  document::{Attrs, Mark},
  parse,
  serialize,
};

fn cell(text: &str, header: bool) -> DocumentNode {
  DocumentNode::create(
    NodeKind::TableCell,
    Attrs::new().with("header", header),
    vec![DocumentNode::plain_paragraph(text)],
  )
  .expect("valid cell")
}

fn row(cells: Vec<DocumentNode>) -> DocumentNode {
  DocumentNode::create(NodeKind::TableRow, Attrs::new(), cells).expect("valid row")
}

/// A document built only through structural edits.
fn edited_document() -> Document {
  let mut document = Document::new();

  document
    .insert_at_selection(vec![
      DocumentNode::plain_heading(1, "Intro & <setup>").expect("valid heading"),
      DocumentNode::create(NodeKind::Paragraph, Attrs::new(), vec![
        DocumentNode::plain("Plain "),
        DocumentNode::text("strong", vec![Mark::Bold]),
        DocumentNode::text(" and both", vec![Mark::Bold, Mark::Italic]),
        DocumentNode::hard_break(),
        DocumentNode::text("a link", vec![Mark::Link {
          href:   "https://example.com/?a=1&b=2".to_string(),
          target: None,
        }]),
      ])
      .expect("valid paragraph"),
    ])
    .expect("blocks fit in the root");

  let list = DocumentNode::create(NodeKind::OrderedList, Attrs::new().with("start", 3_i64), vec![
    DocumentNode::create(NodeKind::ListItem, Attrs::new(), vec![
      DocumentNode::plain_paragraph("third"),
    ])
    .expect("valid item"),
  ])
  .expect("valid list");
  let table = DocumentNode::create(NodeKind::Table, Attrs::new(), vec![
    row(vec![cell("Name", true), cell("Value", true)]),
    row(vec![cell("width", false), cell("120", false)]),
  ])
  .expect("valid table");
  let image = MediaAttrs::new("photo.png")
    .with_alt("A \"quoted\" photo")
    .with_size(Dimensions::new(120, 80))
    .into_node()
    .expect("valid media");
  let code = DocumentNode::create(
    NodeKind::CodeBlock,
    Attrs::new().with("language", "rust"),
    vec![DocumentNode::plain("fn main() {\n    1 < 2;\n}")],
  )
  .expect("valid code block");

  document
    .insert_at_selection(vec![list, table, image, code])
    .expect("blocks fit in the root");
  document
}

#[test]
fn edited_documents_survive_one_round_trip() {
  let document = edited_document();
  let first = serialize(&document);
  let reparsed = parse(&first).expect("serializer output parses");
  assert_eq!(serialize(&reparsed), first);
}

#[test]
fn attribute_edits_survive_round_trip() {
  let mut document = edited_document();
  let image = document
    .descendants()
    .find(|(_, node)| node.kind() == NodeKind::ResizableMedia)
    .map(|(path, _)| path)
    .expect("document has an image");
  document
    .update_attributes(&image, &Attrs::new().with("title", "Caption <b>"))
    .expect("title is a valid attribute");

  let first = serialize(&document);
  assert!(first.contains("title=\"Caption &lt;b&gt;\""), "got {first}");
  assert_eq!(serialize(&parse(&first).expect("parses")), first);
}

#[test]
fn text_and_attributes_are_escaped() {
  let markup = serialize(&edited_document());
  assert!(markup.contains("Intro &amp; &lt;setup&gt;"), "got {markup}");
  assert!(markup.contains("href=\"https://example.com/?a=1&amp;b=2\""), "got {markup}");
  assert!(markup.contains("alt=\"A &quot;quoted&quot; photo\""), "got {markup}");
  assert!(markup.contains("<ol start=\"3\">"), "got {markup}");
}

#[test]
fn shared_outer_marks_stay_open() {
  let markup = serialize(&edited_document());
  assert!(
    markup.contains("<strong>strong<em> and both</em></strong>"),
    "got {markup}"
  );
}

#[test]
fn entities_are_decoded_on_parse() {
  let document = parse("<p>&lt;tag&gt; &amp; caf&eacute; &#8212; &#x41;</p>").expect("parses");
  assert_eq!(document.text_content(), "<tag> & café \u{2014} A");
}

#[test]
fn inline_content_at_top_level_is_wrapped() {
  let document = parse("loose <b>text</b>\n\n<p>next</p>").expect("parses");
  let kinds: Vec<NodeKind> = document.root().children().iter().map(DocumentNode::kind).collect();
  assert_eq!(kinds, vec![NodeKind::Paragraph, NodeKind::Paragraph]);
}

#[test]
fn structural_errors_carry_position() {
  let error = parse("<p>one</p>\n<p>two <b>bold</p>").expect_err("mismatched tag");
  assert_eq!(error.line, 2);
  assert!(
    matches!(error.kind, ParseErrorKind::MismatchedClosingTag { .. }),
    "got {:?}",
    error.kind
  );
}

#[test]
fn heading_inside_paragraph_is_invalid_nesting() {
  let error = parse("<p>text <h2>heading</h2></p>").expect_err("invalid nesting");
  assert!(
    matches!(error.kind, ParseErrorKind::InvalidNesting { .. }),
    "got {:?}",
    error.kind
  );
}

#[test]
fn ragged_tables_are_rejected() {
  let error = parse("<table><tr><td>1</td><td>2</td></tr><tr><td>3</td></tr></table>")
    .expect_err("ragged table");
  assert!(
    matches!(error.kind, ParseErrorKind::RaggedTable { row: 2, expected: 2, found: 1 }),
    "got {:?}",
    error.kind
  );
}

#[test]
fn row_spans_fill_columns_in_later_rows() {
  let markup = "<table><tbody><tr><td rowspan=\"2\"><p>a</p></td><td><p>b</p></td></tr><tr><td><p>c</p></td></tr></tbody></table>";
  let document = parse(markup).expect("spanned table is rectangular");
  assert_eq!(serialize(&document), markup);

  let wide = parse(
    "<table><tr><th colspan=\"2\">h</th><th>x</th></tr><tr><td>1</td><td rowspan=\"2\">2</td><td>3</td></tr><tr><td>4</td><td>5</td></tr></table>",
  );
  assert!(wide.is_ok(), "got {wide:?}");
}

#[test]
fn row_spans_make_extra_cells_ragged() {
  let error = parse(
    "<table><tr><td rowspan=\"2\">a</td><td>b</td></tr><tr><td>c</td><td>d</td></tr></table>",
  )
  .expect_err("second row is three columns wide");
  assert!(
    matches!(error.kind, ParseErrorKind::RaggedTable { row: 2, expected: 2, found: 3 }),
    "got {:?}",
    error.kind
  );
}

#[test]
fn stray_cells_and_unclosed_tags() {
  let error = parse("<td>cell</td>").expect_err("stray cell");
  assert_eq!(error.kind, ParseErrorKind::StrayTableCell);

  let error = parse("<ul><li>never closed").expect_err("unterminated");
  assert!(
    matches!(error.kind, ParseErrorKind::UnterminatedTag(_)),
    "got {:?}",
    error.kind
  );
}

#[test]
fn empty_markup_is_an_empty_document() {
  let document = parse("").expect("empty markup parses");
  assert!(document.root().children().is_empty());
  assert_eq!(serialize(&document), "");
  assert!(document.node(&NodePath::root()).is_some());
}

#[test]
fn empty_values_markup_cannot_carry_are_refused() {
  assert!(DocumentNode::create(NodeKind::Youtube, Attrs::new(), Vec::new()).is_err());
  assert!(
    DocumentNode::create(NodeKind::CodeBlock, Attrs::new().with("language", ""), Vec::new())
      .is_err()
  );

  let mut document = parse("<h2>Intro</h2><p><img src=\"a.png\"></p>").expect("parses");
  let heading = NodePath::root().child(0);
  let image = NodePath::root().child(1).child(0);
  assert!(
    document
      .update_attributes(&heading, &Attrs::new().with("anchorId", ""))
      .is_err()
  );
  assert!(
    document
      .update_attributes(&image, &Attrs::new().with("title", ""))
      .is_err()
  );
  assert_eq!(serialize(&document), "<h2>Intro</h2>\n<p><img src=\"a.png\"></p>");
}

#[test]
fn embeds_and_empty_alt_survive_round_trip() {
  let embed = DocumentNode::create(
    NodeKind::Youtube,
    Attrs::new()
      .with("src", "https://www.youtube.com/embed/abc")
      .with("start", 42_i64),
    Vec::new(),
  )
  .expect("embed with a source");
  let decorative = MediaAttrs::new("rule.png")
    .with_alt("")
    .into_node()
    .expect("empty alt marks a decorative image");
  let paragraph = DocumentNode::create(NodeKind::Paragraph, Attrs::new(), vec![decorative])
    .expect("media is inline content");
  let document = Document::from_blocks(vec![embed, paragraph]).expect("valid blocks");

  let first = serialize(&document);
  assert!(first.contains("data-start=\"42\""), "got {first}");
  assert!(first.contains("alt=\"\""), "got {first}");
  let reparsed = parse(&first).expect("serializer output parses");
  assert_eq!(reparsed.root().children().len(), 2);
  assert_eq!(serialize(&reparsed), first);
}
