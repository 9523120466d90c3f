//! Tag tree nodes and their serialization.

use std::fmt::{self, Write};

use crate::error::{RenderError, RenderResult};
use crate::kinds::TagKind;

/// Elements serialized without a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "hr", "img", "input", "link", "meta", "param",
];

/// Elements whose text content is written unescaped
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// A markup element
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    tag: String,
    kind: TagKind,
    attrs: Vec<(String, String)>,
    children: Vec<Child>,
    /// Set on the block holding the session hidden fields of a form
    session_fields: bool,
}

/// Content of a node
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    Text(String),
    Element(Node),
    /// Already serialized markup, written verbatim
    Raw(String),
    Fragment(Vec<Child>),
}

impl Node {
    pub fn new(tag: impl Into<String>, kind: TagKind) -> Self {
        Self {
            tag: tag.into(),
            kind,
            attrs: Vec::new(),
            children: Vec::new(),
            session_fields: false,
        }
    }

    /// A generic element, outside of any kind table
    pub fn generic(tag: impl Into<String>) -> Self {
        Self::new(tag, TagKind::Generic)
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn kind(&self) -> TagKind {
        self.kind
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has(&self, name: &str) -> bool {
        self.attrs.iter().any(|(n, _)| n == name)
    }

    /// Set an attribute verbatim, keeping its position if it already exists
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(slot) = self.attrs.iter_mut().find(|(n, _)| n == name) {
            slot.1 = value;
        } else {
            self.attrs.push((name.to_string(), value));
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.attrs.iter().position(|(n, _)| n == name)?;
        Some(self.attrs.remove(index).1)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn children(&self) -> &[Child] {
        &self.children
    }

    /// Append a child as is, without any dispatch
    pub fn push(&mut self, child: impl Into<Child>) {
        self.children.push(child.into());
    }

    /// Builder form of [`Node::set`]
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Builder form of [`Node::push`]
    pub fn child(mut self, child: impl Into<Child>) -> Self {
        self.push(child);
        self
    }

    pub(crate) fn mark_session_fields(&mut self) {
        self.session_fields = true;
    }

    /// Drop the session hidden fields of every form in this subtree,
    /// this node included
    pub(crate) fn strip_form_session_fields(&mut self) {
        if self.kind == TagKind::Form {
            self.children
                .retain(|c| !matches!(c, Child::Element(n) if n.session_fields));
        }
        for child in &mut self.children {
            child.strip_form_session_fields();
        }
    }

    /// Set or clear the selection state of a radio, checkbox or option.
    ///
    /// With [`Selection::Values`] the element is selected when its `value`
    /// attribute is one of the values.
    pub fn set_selected(&mut self, selection: impl Into<Selection>) -> RenderResult<()> {
        let attribute = self
            .kind
            .selection_attribute()
            .ok_or_else(|| RenderError::NotSelectable {
                tag: self.tag.clone(),
            })?;
        let selected = match selection.into() {
            Selection::Flag(flag) => flag,
            Selection::Values(values) => self
                .get("value")
                .map(|v| values.iter().any(|s| s == v))
                .unwrap_or(false),
        };
        self.remove(attribute);
        if selected {
            self.set(attribute, attribute);
        }
        Ok(())
    }

    /// Concatenated text content
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.collect_text(&mut out);
        }
        out
    }

    /// Depth-first search of descendant elements by tag name
    pub fn find_all(&self, tag: &str) -> Vec<&Node> {
        let mut found = Vec::new();
        for child in &self.children {
            child.find_all_into(tag, &mut found);
        }
        found
    }

    /// Descendant element with the given `id` attribute
    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.children
            .iter_mut()
            .find_map(|child| child.find_by_id_mut(id))
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = self.write_html(&mut out);
        out
    }

    pub fn write_html(&self, out: &mut String) -> fmt::Result {
        write!(out, "<{}", self.tag)?;
        for (name, value) in &self.attrs {
            write!(out, " {}=\"{}\"", name, escape_html(value))?;
        }
        write!(out, ">")?;

        if VOID_ELEMENTS.contains(&self.tag.as_str()) && self.children.is_empty() {
            return Ok(());
        }

        let raw = RAW_TEXT_ELEMENTS.contains(&self.tag.as_str());
        for child in &self.children {
            child.write_html_inner(out, raw)?;
        }
        write!(out, "</{}>", self.tag)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

impl Child {
    pub fn as_element(&self) -> Option<&Node> {
        match self {
            Child::Element(n) => Some(n),
            _ => None,
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        let _ = self.write_html_inner(&mut out, false);
        out
    }

    fn write_html_inner(&self, out: &mut String, raw: bool) -> fmt::Result {
        match self {
            Child::Text(t) if raw => out.write_str(t),
            Child::Text(t) => out.write_str(&escape_html(t)),
            Child::Raw(markup) => out.write_str(markup),
            Child::Element(node) => node.write_html(out),
            Child::Fragment(children) => {
                for child in children {
                    child.write_html_inner(out, raw)?;
                }
                Ok(())
            }
        }
    }

    fn strip_form_session_fields(&mut self) {
        match self {
            Child::Element(node) => node.strip_form_session_fields(),
            Child::Fragment(children) => {
                for child in children {
                    child.strip_form_session_fields();
                }
            }
            _ => {}
        }
    }

    fn find_by_id_mut(&mut self, id: &str) -> Option<&mut Node> {
        match self {
            Child::Element(node) => {
                if node.get("id") == Some(id) {
                    return Some(node);
                }
                node.find_by_id_mut(id)
            }
            Child::Fragment(children) => children.iter_mut().find_map(|c| c.find_by_id_mut(id)),
            _ => None,
        }
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Child::Text(t) => out.push_str(t),
            Child::Element(node) => {
                for child in &node.children {
                    child.collect_text(out);
                }
            }
            Child::Fragment(children) => {
                for child in children {
                    child.collect_text(out);
                }
            }
            Child::Raw(_) => {}
        }
    }

    fn find_all_into<'a>(&'a self, tag: &str, found: &mut Vec<&'a Node>) {
        match self {
            Child::Element(node) => {
                if node.tag == tag {
                    found.push(node);
                }
                for child in &node.children {
                    child.find_all_into(tag, found);
                }
            }
            Child::Fragment(children) => {
                for child in children {
                    child.find_all_into(tag, found);
                }
            }
            _ => {}
        }
    }
}

/// Argument of [`Node::set_selected`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Flag(bool),
    Values(Vec<String>),
}

impl From<bool> for Selection {
    fn from(flag: bool) -> Self {
        Selection::Flag(flag)
    }
}

impl From<Vec<&str>> for Selection {
    fn from(values: Vec<&str>) -> Self {
        Selection::Values(values.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for Selection {
    fn from(values: Vec<String>) -> Self {
        Selection::Values(values)
    }
}

impl From<Node> for Child {
    fn from(node: Node) -> Self {
        Child::Element(node)
    }
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Child::Text(text.to_string())
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Child::Text(text)
    }
}

impl From<Vec<Child>> for Child {
    fn from(children: Vec<Child>) -> Self {
        Child::Fragment(children)
    }
}

impl From<Vec<Node>> for Child {
    fn from(nodes: Vec<Node>) -> Self {
        Child::Fragment(nodes.into_iter().map(Child::Element).collect())
    }
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_keeps_position() {
        let mut node = Node::generic("div");
        node.set("id", "a");
        node.set("class", "b");
        node.set("id", "c");
        let attrs: Vec<_> = node.attributes().collect();
        assert_eq!(attrs, vec![("id", "c"), ("class", "b")]);
    }

    #[test]
    fn test_serialization() {
        let node = Node::generic("p")
            .with("title", "a \"quote\"")
            .child("1 < 2")
            .child(Node::generic("br"));
        assert_eq!(node.to_html(), "<p title=\"a &quot;quote&quot;\">1 &lt; 2<br></p>");
    }

    #[test]
    fn test_script_text_unescaped() {
        let node = Node::generic("script").child("if (a < b) {}");
        assert_eq!(node.to_html(), "<script>if (a < b) {}</script>");
    }

    #[test]
    fn test_find_all_and_text() {
        let node = Node::generic("ul")
            .child(Node::generic("li").child("one"))
            .child(Child::Fragment(vec![Node::generic("li").child("two").into()]));
        assert_eq!(node.find_all("li").len(), 2);
        assert_eq!(node.text(), "onetwo");
    }

    #[test]
    fn test_find_by_id_mut() {
        let mut form = Node::generic("form")
            .child(
                Node::generic("div")
                    .with("id", "outer")
                    .child(Node::generic("input").with("id", "inner")),
            )
            .child(Child::Fragment(vec![Node::generic("p").with("id", "last").into()]));

        form.find_by_id_mut("inner").unwrap().set("value", "x");
        assert_eq!(form.find_all("input")[0].get("value"), Some("x"));
        assert_eq!(form.find_by_id_mut("outer").unwrap().tag(), "div");
        assert_eq!(form.find_by_id_mut("last").unwrap().tag(), "p");
        assert!(form.find_by_id_mut("missing").is_none());
    }

    #[test]
    fn test_set_selected() {
        let mut option = Node::new("option", TagKind::Option).with("value", "b");
        option.set_selected(vec!["a", "b"]).unwrap();
        assert_eq!(option.get("selected"), Some("selected"));
        option.set_selected(false).unwrap();
        assert!(!option.has("selected"));

        let mut checkbox = Node::new("input", TagKind::CheckboxInput);
        checkbox.set_selected(true).unwrap();
        assert_eq!(checkbox.get("checked"), Some("checked"));

        assert_eq!(
            Node::generic("div").set_selected(true),
            Err(RenderError::NotSelectable { tag: "div".to_string() })
        );
    }
}
