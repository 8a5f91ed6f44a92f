// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, warn};

use crate::error::FeedError;

use super::{XmlDocument, XmlElement};

/// A node in the document tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
}

/// An element with its attributes and child nodes.
///
/// Text and attribute values are stored decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

/// A parsed XML document.
///
/// Holds every top-level element in source order; the first one is the
/// document element. Top-level text, declarations and DOCTYPEs are not kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub elements: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Direct child elements
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    fn collect_by_tag_name<'a>(&'a self, name: &str, found: &mut Vec<&'a Element>) {
        for child in self.child_elements() {
            if child.name == name {
                found.push(child);
            }
            child.collect_by_tag_name(name, found);
        }
    }

    fn write_text_content(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(text) | Node::CData(text) => out.push_str(text),
                Node::Element(element) => element.write_text_content(out),
                Node::Comment(_) => {}
            }
        }
    }

    fn write_xml(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (name, value) in &self.attributes {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&html_escape::encode_double_quoted_attribute(value));
            out.push('"');
        }

        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }

        out.push('>');
        for node in &self.children {
            match node {
                Node::Element(element) => element.write_xml(out),
                Node::Text(text) => out.push_str(&html_escape::encode_text(text)),
                Node::CData(text) => {
                    out.push_str("<![CDATA[");
                    out.push_str(text);
                    out.push_str("]]>");
                }
                Node::Comment(text) => {
                    out.push_str("<!--");
                    out.push_str(text);
                    out.push_str("-->");
                }
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

impl XmlElement for Element {
    fn first_element_by_tag_name(&self, name: &str) -> Option<&Self> {
        self.child_elements().find_map(|child| {
            if child.name == name {
                Some(child)
            } else {
                child.first_element_by_tag_name(name)
            }
        })
    }

    fn elements_by_tag_name(&self, name: &str) -> Vec<&Self> {
        let mut found = Vec::new();
        self.collect_by_tag_name(name, &mut found);
        found
    }

    fn text_content(&self) -> String {
        let mut text = String::new();
        self.write_text_content(&mut text);
        text
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl Document {
    /// Parse text into a tree, recovering from as much breakage as possible.
    ///
    /// End tags close back to the nearest open element of the same name and
    /// are ignored when no such element is open. Elements still open at the
    /// end of input are closed implicitly. A syntax error once an element has
    /// been seen drops the broken markup and parsing resumes at the next `<`.
    ///
    /// A bare `<` in text starts an element, so `<title>a < b</title>` nests
    /// whatever follows inside a bogus `< b` element until a matching end tag
    /// closes it.
    pub fn parse(xml: &str) -> Result<Self, FeedError> {
        let mut reader = lenient_reader(xml);
        let mut offset = 0;

        let mut builder = TreeBuilder::default();
        let mut buf = Vec::new();

        loop {
            let start = offset + reader.buffer_position() as usize;
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => builder.open(element_from_start(&e)),
                Ok(Event::Empty(e)) => builder.push(Node::Element(element_from_start(&e))),
                Ok(Event::End(e)) => builder.close(&String::from_utf8_lossy(e.name().as_ref())),
                Ok(Event::Text(e)) => {
                    let raw = String::from_utf8_lossy(&e);
                    builder.push(Node::Text(decode_entities(&raw)));
                }
                Ok(Event::CData(e)) => {
                    builder.push(Node::CData(String::from_utf8_lossy(&e).into_owned()));
                }
                Ok(Event::Comment(e)) => {
                    builder.push(Node::Comment(String::from_utf8_lossy(&e).into_owned()));
                }
                Ok(Event::Eof) => break,
                // Declarations, processing instructions and DOCTYPE
                Ok(_) => {}
                Err(e) => {
                    if builder.is_empty() {
                        return Err(FeedError::MalformedXml(format!("{e} at byte {start}")));
                    }
                    let Some(resume) = next_markup(xml, start) else {
                        warn!(error = %e, position = start, "Dropping malformed XML at end of input");
                        break;
                    };
                    warn!(error = %e, position = start, resume, "Skipping malformed XML");
                    reader = lenient_reader(&xml[resume..]);
                    offset = resume;
                }
            }
            buf.clear();
        }

        let document = builder.finish();
        if document.elements.is_empty() {
            return Err(FeedError::MalformedXml("document has no root element".to_string()));
        }
        Ok(document)
    }

    /// Serialize the tree back to XML text
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        for element in &self.elements {
            element.write_xml(&mut out);
        }
        out
    }
}

impl XmlDocument for Document {
    type Element = Element;

    fn document_element(&self) -> Option<&Element> {
        self.elements.first()
    }

    fn first_element_by_tag_name(&self, name: &str) -> Option<&Element> {
        self.elements.iter().find_map(|element| {
            if element.name == name {
                Some(element)
            } else {
                element.first_element_by_tag_name(name)
            }
        })
    }

    fn elements_by_tag_name(&self, name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        for element in &self.elements {
            if element.name == name {
                found.push(element);
            }
            element.collect_by_tag_name(name, &mut found);
        }
        found
    }
}

/// Builds the tree from a flat event stream, closing elements itself
#[derive(Default)]
struct TreeBuilder {
    open: Vec<Element>,
    document: Document,
}

impl TreeBuilder {
    fn is_empty(&self) -> bool {
        self.open.is_empty() && self.document.elements.is_empty()
    }

    fn open(&mut self, element: Element) {
        self.open.push(element);
    }

    fn push(&mut self, node: Node) {
        match self.open.last_mut() {
            Some(parent) => {
                if !matches!(&node, Node::Text(text) if text.is_empty()) {
                    parent.children.push(node);
                }
            }
            None => {
                if let Node::Element(element) = node {
                    self.document.elements.push(element);
                }
            }
        }
    }

    fn close(&mut self, name: &str) {
        let Some(index) = self.open.iter().rposition(|element| element.name == name) else {
            debug!(tag = name, "Ignoring unmatched end tag");
            return;
        };
        self.close_down_to(index);
    }

    fn close_down_to(&mut self, depth: usize) {
        while self.open.len() > depth {
            let Some(element) = self.open.pop() else {
                break;
            };
            self.push(Node::Element(element));
        }
    }

    fn finish(mut self) -> Document {
        if !self.open.is_empty() {
            debug!(unclosed = self.open.len(), "Closing elements left open at end of input");
        }
        self.close_down_to(0);
        self.document
    }
}

fn lenient_reader(xml: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(xml);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    reader
}

/// Byte offset of the first `<` after the construct starting at `from`
fn next_markup(xml: &str, from: usize) -> Option<usize> {
    xml.get(from..)?
        .char_indices()
        .skip(1)
        .find(|&(_, c)| c == '<')
        .map(|(index, _)| from + index)
}

fn element_from_start(start: &BytesStart<'_>) -> Element {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let attributes = start
        .attributes()
        .with_checks(false)
        .filter_map(|attr| match attr {
            Ok(attr) => {
                let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                let value = decode_entities(&String::from_utf8_lossy(&attr.value));
                Some((key, value))
            }
            Err(e) => {
                warn!(element = %name, error = %e, "Skipping malformed attribute");
                None
            }
        })
        .collect();

    Element {
        name,
        attributes,
        children: Vec::new(),
    }
}

/// Resolve character and entity references.
///
/// XML builtins, numeric references and HTML named entities are decoded;
/// anything else, including `&` with no reference, stays as written.
/// Entities declared in a DOCTYPE are never expanded.
fn decode_entities(raw: &str) -> String {
    html_escape::decode_html_entities(raw).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> Document {
        Document::parse(xml).unwrap()
    }

    #[test]
    fn parses_nested_elements_and_attributes() {
        let doc = parse(r#"<rss version="2.0"><channel><title>Show</title><item/></channel></rss>"#);
        let root = doc.document_element().unwrap();

        assert_eq!(root.name, "rss");
        assert_eq!(root.attribute("version"), Some("2.0"));
        assert_eq!(root.first_element_by_tag_name("title").unwrap().text_content(), "Show");
        assert_eq!(root.elements_by_tag_name("item").len(), 1);
    }

    #[test]
    fn lookup_searches_descendants_in_document_order() {
        let doc = parse("<a><b><title>first</title></b><title>second</title></a>");
        let root = doc.document_element().unwrap();

        assert_eq!(root.first_element_by_tag_name("title").unwrap().text_content(), "first");
        let all: Vec<_> = root
            .elements_by_tag_name("title")
            .into_iter()
            .map(|e| e.text_content())
            .collect();
        assert_eq!(all, vec!["first", "second"]);
    }

    #[test]
    fn element_lookup_excludes_itself_but_document_lookup_includes_root() {
        let doc = parse("<item><item>inner</item></item>");
        let root = doc.document_element().unwrap();

        assert_eq!(root.elements_by_tag_name("item").len(), 1);
        assert_eq!(doc.elements_by_tag_name("item").len(), 2);
        assert_eq!(doc.first_element_by_tag_name("item").unwrap().name, "item");
    }

    #[test]
    fn qualified_names_are_matched_literally() {
        let doc = parse(r#"<rss><itunes:image href="a.jpg"/><image><url>b.jpg</url></image></rss>"#);

        assert_eq!(
            doc.first_element_by_tag_name("itunes:image").unwrap().attribute("href"),
            Some("a.jpg")
        );
        assert_eq!(doc.first_element_by_tag_name("image").unwrap().text_content(), "b.jpg");
    }

    #[test]
    fn text_content_joins_text_and_cdata() {
        let doc = parse("<d>This is a <b>bold</b> <![CDATA[<p>move</p>]]><!-- note --></d>");
        assert_eq!(doc.document_element().unwrap().text_content(), "This is a bold <p>move</p>");
    }

    #[test]
    fn decodes_builtin_and_numeric_references() {
        let doc = parse(r#"<t a="x &quot;y&quot;">Test &amp; Podcast &#169; &#x263A;</t>"#);
        let root = doc.document_element().unwrap();

        assert_eq!(root.text_content(), "Test & Podcast \u{a9} \u{263a}");
        assert_eq!(root.attribute("a"), Some("x \"y\""));
    }

    #[test]
    fn keeps_unknown_entities_and_bare_ampersands() {
        let doc = parse("<t>Rock &roll; &amp; more & less</t>");
        assert_eq!(doc.document_element().unwrap().text_content(), "Rock &roll; & more & less");
    }

    #[test]
    fn does_not_expand_doctype_entities() {
        let doc = parse(
            r#"<!DOCTYPE rss [<!ENTITY secret SYSTEM "file:///etc/passwd">]><rss><t>&secret;</t></rss>"#,
        );
        assert_eq!(doc.document_element().unwrap().text_content(), "&secret;");
    }

    #[test]
    fn closes_elements_left_open() {
        let doc = parse("<rss><channel><item><title>Cut off");
        let root = doc.document_element().unwrap();

        assert_eq!(root.first_element_by_tag_name("title").unwrap().text_content(), "Cut off");
        assert_eq!(root.elements_by_tag_name("item").len(), 1);
    }

    #[test]
    fn mismatched_end_tag_closes_back_to_matching_element() {
        let doc = parse("<rss><channel><item><title>A</item><item><title>B</title></item></channel></rss>");
        let items = doc.elements_by_tag_name("item");

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].text_content(), "A");
        assert_eq!(items[1].text_content(), "B");
    }

    #[test]
    fn stray_end_tags_are_ignored() {
        let doc = parse("<rss></bogus><title>ok</title></rss></rss>");
        assert_eq!(doc.elements.len(), 1);
        assert_eq!(doc.document_element().unwrap().text_content(), "ok");
    }

    #[test]
    fn syntax_error_after_root_keeps_parsed_content() {
        let doc = parse("<rss><channel><title>A</title><item><tit");
        let root = doc.document_element().unwrap();

        assert_eq!(root.name, "rss");
        assert_eq!(root.first_element_by_tag_name("title").unwrap().text_content(), "A");
    }

    #[test]
    fn bad_markup_between_items_keeps_both_items() {
        let doc = parse(
            "<rss><channel><item><title>1</title></item><!foo><item><title>2</title></item></channel></rss>",
        );
        let titles: Vec<_> = doc
            .elements_by_tag_name("item")
            .into_iter()
            .map(|item| item.text_content())
            .collect();

        assert_eq!(titles, vec!["1", "2"]);
        assert_eq!(doc.elements.len(), 1);
    }

    #[test]
    fn bare_less_than_in_text_opens_a_bogus_element() {
        let doc = parse("<rss><title>a < b</title><item><title>1</title></item></rss>");
        let root = doc.document_element().unwrap();

        // the bogus element swallows the title's end tag and the item
        assert_eq!(root.first_element_by_tag_name("title").unwrap().text_content(), "a 1");
        assert_eq!(root.elements_by_tag_name("item").len(), 1);
    }

    #[test]
    fn next_markup_skips_the_current_construct() {
        let xml = "<!bad>é<item/>";
        assert_eq!(next_markup(xml, 0), Some(8));
        assert_eq!(next_markup(xml, 8), None);
        assert_eq!(next_markup(xml, 100), None);
    }

    #[test]
    fn unterminated_comment_without_elements_is_malformed() {
        let result = Document::parse("<!-- never closed");
        assert!(matches!(result, Err(FeedError::MalformedXml(_))));
    }

    #[test]
    fn document_without_elements_is_malformed() {
        let result = Document::parse("<?xml version=\"1.0\"?><!-- only a comment -->");
        match result {
            Err(FeedError::MalformedXml(message)) => assert!(message.contains("no root element")),
            other => panic!("Expected MalformedXml, got {other:?}"),
        }
    }

    #[test]
    fn keeps_additional_top_level_elements() {
        let doc = parse("<a><item/></a><b><item/></b>");

        assert_eq!(doc.elements.len(), 2);
        assert_eq!(doc.document_element().unwrap().name, "a");
        assert_eq!(doc.elements_by_tag_name("item").len(), 2);
    }

    #[test]
    fn serializes_with_escaping() {
        let mut root = Element::new("t");
        root.attributes.push(("q".to_string(), "say \"hi\" & <go>".to_string()));
        root.children.push(Node::Text("a < b & c".to_string()));
        root.children.push(Node::Element(Element::new("empty")));
        root.children.push(Node::CData("<raw/>".to_string()));
        let doc = Document {
            elements: vec![root],
        };

        assert_eq!(
            doc.to_xml(),
            r#"<t q="say &quot;hi&quot; &amp; &lt;go&gt;">a &lt; b &amp; c<empty/><![CDATA[<raw/>]]></t>"#
        );
    }

    #[test]
    fn serialized_tree_parses_back_to_the_same_tree() {
        let doc = parse(
            r#"<rss xmlns:itunes="x"><channel><title>A &amp; B &unknown;</title><!-- c --><item><enclosure url="u?a=1&amp;b=2"/></item></channel></rss>"#,
        );
        let reparsed = parse(&doc.to_xml());
        assert_eq!(reparsed, doc);
    }
}
