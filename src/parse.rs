//! XHTML templates parsed into tag trees.

use roxmltree::{Document, ParsingOptions};

use crate::error::{RenderError, RenderResult};
use crate::kinds::KindTable;
use crate::node::{Child, Node};

/// Root element wrapping a fragment, so that it can hold several elements
const WRAPPER: &str = "__weft_root__";

fn wrap(xml: &str) -> String {
    format!("<{0}>{1}</{0}>", WRAPPER, xml)
}

fn is_document(source: &str) -> bool {
    let start = source.trim_start();
    start.starts_with("<?xml")
        || start
            .get(..9)
            .is_some_and(|s| s.eq_ignore_ascii_case("<!doctype"))
}

/// Parse a fragment (any number of top-level elements) or a whole document.
///
/// Elements get their kind from `kinds`, `<input>` using its `type` attribute.
pub fn parse_xhtml(source: &str, kinds: &KindTable) -> RenderResult<Vec<Node>> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };

    if is_document(source) {
        let doc = Document::parse_with_options(source, options)?;
        return Ok(vec![convert(doc.root_element(), kinds)]);
    }

    let wrapped = wrap(source);
    let doc = Document::parse_with_options(&wrapped, options)?;
    let nodes: Vec<Node> = doc
        .root_element()
        .children()
        .filter(|n| n.is_element())
        .map(|n| convert(n, kinds))
        .collect();

    if nodes.is_empty() {
        return Err(RenderError::EmptyDocument);
    }
    tracing::debug!("parsed {} top-level elements", nodes.len());
    Ok(nodes)
}

fn convert(element: roxmltree::Node, kinds: &KindTable) -> Node {
    let tag = element.tag_name().name();
    let kind = kinds.resolve(tag, element.attribute("type"));
    let mut node = Node::new(tag, kind);
    for attr in element.attributes() {
        let prefix = attr
            .namespace()
            .and_then(|uri| element.lookup_prefix(uri))
            .filter(|prefix| !prefix.is_empty());
        match prefix {
            Some(prefix) => node.set(&format!("{}:{}", prefix, attr.name()), attr.value()),
            None => node.set(attr.name(), attr.value()),
        }
    }
    for child in element.children() {
        if child.is_element() {
            node.push(convert(child, kinds));
        } else if child.is_text() {
            if let Some(text) = child.text() {
                node.push(Child::Text(text.to_string()));
            }
        }
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::TagKind;

    #[test]
    fn test_fragment_with_several_roots() {
        let nodes = parse_xhtml(
            r#"<p>a &amp; b</p><input type="checkbox" name="x"/>"#,
            &KindTable::xhtml(),
        )
        .unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].text(), "a & b");
        assert_eq!(nodes[1].kind(), TagKind::CheckboxInput);
    }

    #[test]
    fn test_document() {
        let nodes = parse_xhtml(
            "<?xml version=\"1.0\"?>\n<html><body><form/></body></html>",
            &KindTable::xhtml(),
        )
        .unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].find_all("form")[0].kind(), TagKind::Form);
    }

    #[test]
    fn test_prefixed_attributes() {
        let nodes = parse_xhtml(
            r#"<p xml:lang="fr" xmlns:x="urn:x" x:role="note" class="a">salut</p>"#,
            &KindTable::xhtml(),
        )
        .unwrap();
        assert_eq!(nodes[0].get("xml:lang"), Some("fr"));
        assert_eq!(nodes[0].get("x:role"), Some("note"));
        assert_eq!(nodes[0].get("class"), Some("a"));
        assert_eq!(nodes[0].get("lang"), None);
    }

    #[test]
    fn test_empty_and_invalid() {
        assert_eq!(parse_xhtml("just text", &KindTable::xhtml()), Err(RenderError::EmptyDocument));
        assert!(matches!(
            parse_xhtml("<p>", &KindTable::xhtml()),
            Err(RenderError::XmlError(_))
        ));
    }
}
