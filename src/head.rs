//! Head resources (styles and scripts) collected during a render pass.

use serde::Serialize;
use std::collections::HashMap;

use crate::codegen::{ClientFunction, CodeGenerator};
use crate::error::RenderResult;
use crate::kinds::TagKind;
use crate::node::{Child, Node};
use crate::url::absolute_url;

/// Client function receiving the head payload of an asynchronous update
pub const LOADER_FUNCTION: &str = "weft_loadAll";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadMode {
    /// Rendered as a `<head>` element
    Full,
    /// Rendered as a call to [`LOADER_FUNCTION`]
    Async,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Css,
    Js,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Identity {
    Name(String),
    Url(String),
}

/// A registered style or script
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadResource {
    pub kind: ResourceKind,
    pub identity: Identity,
    pub order: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

/// Accumulates the css and javascript used by every rendered view
#[derive(Debug, Clone)]
pub struct HeadAggregator {
    mode: HeadMode,
    static_url: String,
    /// Extra `<head>` children: title, meta...
    root: Vec<Node>,
    named_css: HashMap<String, (u64, String)>,
    css_urls: HashMap<String, u64>,
    named_js: HashMap<String, (u64, String)>,
    js_urls: HashMap<String, u64>,
    anonymous_css: Vec<(u64, String)>,
    anonymous_js: Vec<(u64, String)>,
    order: u64,
}

impl HeadAggregator {
    pub fn new(mode: HeadMode, static_url: impl Into<String>) -> Self {
        Self {
            mode,
            static_url: static_url.into(),
            root: Vec::new(),
            named_css: HashMap::new(),
            css_urls: HashMap::new(),
            named_js: HashMap::new(),
            js_urls: HashMap::new(),
            anonymous_css: Vec::new(),
            anonymous_js: Vec::new(),
            order: 0,
        }
    }

    pub fn mode(&self) -> HeadMode {
        self.mode
    }

    pub fn static_url(&self) -> &str {
        &self.static_url
    }

    fn next_order(&mut self) -> u64 {
        let order = self.order;
        self.order += 1;
        order
    }

    /// Add a `<title>`, `<meta>`... to the head
    pub fn push(&mut self, node: Node) {
        self.root.push(node);
    }

    /// Memorize a named inline css style. The first registration of a name wins.
    pub fn css(&mut self, name: &str, style: impl Into<String>) {
        if self.named_css.contains_key(name) {
            tracing::trace!("css '{}' already registered", name);
            return;
        }
        let order = self.next_order();
        self.named_css.insert(name.to_string(), (order, style.into()));
    }

    /// Memorize a css URL, relative to the static contents
    pub fn css_url(&mut self, url: &str) {
        let url = absolute_url(url, &self.static_url);
        if self.css_urls.contains_key(&url) {
            tracing::trace!("css url '{}' already registered", url);
            return;
        }
        let order = self.next_order();
        self.css_urls.insert(url, order);
    }

    /// Memorize a named inline javascript code. The first registration of a name wins.
    pub fn javascript(&mut self, name: &str, script: impl Into<String>) {
        if self.named_js.contains_key(name) {
            tracing::trace!("javascript '{}' already registered", name);
            return;
        }
        let order = self.next_order();
        self.named_js.insert(name.to_string(), (order, script.into()));
    }

    /// Transcode `function` and memorize it as named javascript code
    pub fn javascript_function(
        &mut self,
        name: &str,
        function: &ClientFunction,
        codegen: &dyn CodeGenerator,
    ) {
        if let Some(url) = codegen.runtime_url() {
            self.javascript_url(url);
        }
        let code = codegen.transcode(function);
        self.javascript(name, code.0);
    }

    /// Memorize a javascript URL, relative to the static contents
    pub fn javascript_url(&mut self, url: &str) {
        let url = absolute_url(url, &self.static_url);
        if self.js_urls.contains_key(&url) {
            tracing::trace!("javascript url '{}' already registered", url);
            return;
        }
        let order = self.next_order();
        self.js_urls.insert(url, order);
    }

    /// Memorize an anonymous inline css style
    pub fn anonymous_css(&mut self, style: impl Into<String>) {
        let order = self.next_order();
        self.anonymous_css.push((order, style.into()));
    }

    /// Memorize an anonymous inline javascript code
    pub fn anonymous_javascript(&mut self, script: impl Into<String>) {
        let order = self.next_order();
        self.anonymous_js.push((order, script.into()));
    }

    /// Handle a `<style>` or `<script>` element added somewhere in the tree.
    ///
    /// Returns the element back when it must stay inline (full mode). In
    /// async mode the element content is absorbed and `None` is returned.
    pub fn absorb(&mut self, node: Node) -> Option<Node> {
        if self.mode == HeadMode::Full {
            return Some(node);
        }
        match node.kind() {
            TagKind::Style => {
                self.anonymous_css(node.text());
                None
            }
            TagKind::Script => {
                match node.get("src") {
                    Some(src) => self.javascript_url(src),
                    None => self.anonymous_javascript(node.text()),
                }
                None
            }
            _ => Some(node),
        }
    }

    /// Every registered resource, in registration order
    pub fn resources(&self) -> Vec<HeadResource> {
        let mut resources: Vec<HeadResource> = Vec::new();
        for (name, (order, css)) in &self.named_css {
            resources.push(HeadResource {
                kind: ResourceKind::Css,
                identity: Identity::Name(name.clone()),
                order: *order,
                payload: Some(css.clone()),
            });
        }
        for (url, order) in &self.css_urls {
            resources.push(HeadResource {
                kind: ResourceKind::Css,
                identity: Identity::Url(url.clone()),
                order: *order,
                payload: None,
            });
        }
        for (name, (order, js)) in &self.named_js {
            resources.push(HeadResource {
                kind: ResourceKind::Js,
                identity: Identity::Name(name.clone()),
                order: *order,
                payload: Some(js.clone()),
            });
        }
        for (url, order) in &self.js_urls {
            resources.push(HeadResource {
                kind: ResourceKind::Js,
                identity: Identity::Url(url.clone()),
                order: *order,
                payload: None,
            });
        }
        resources.sort_by_key(|r| r.order);
        resources
    }

    pub fn named_css(&self) -> Vec<(String, String)> {
        sorted_named(&self.named_css)
    }

    pub fn css_urls(&self) -> Vec<String> {
        sorted_urls(&self.css_urls)
    }

    pub fn named_javascript(&self) -> Vec<(String, String)> {
        sorted_named(&self.named_js)
    }

    pub fn javascript_urls(&self) -> Vec<String> {
        sorted_urls(&self.js_urls)
    }

    fn joined_anonymous(entries: &[(u64, String)]) -> String {
        let mut entries: Vec<_> = entries.iter().collect();
        entries.sort_by_key(|(order, _)| *order);
        entries
            .into_iter()
            .map(|(_, text)| text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Build the `<head>` element
    pub fn render_head(&self) -> Node {
        let mut head = Node::generic("head");
        for node in &self.root {
            head.push(node.clone());
        }

        let css: Vec<String> = self.named_css().into_iter().map(|(_, css)| css).collect();
        if !css.is_empty() {
            head.push(
                Node::new("style", TagKind::Style)
                    .with("type", "text/css")
                    .child(css.join("\n")),
            );
        }

        for url in self.css_urls() {
            head.push(
                Node::generic("link")
                    .with("rel", "stylesheet")
                    .with("type", "text/css")
                    .with("href", url),
            );
        }

        let js: Vec<String> = self
            .named_javascript()
            .into_iter()
            .map(|(_, js)| js)
            .collect();
        if !js.is_empty() {
            head.push(
                Node::new("script", TagKind::Script)
                    .with("type", "text/javascript")
                    .child(js.join("\n")),
            );
        }

        for url in self.javascript_urls() {
            head.push(
                Node::new("script", TagKind::Script)
                    .with("type", "text/javascript")
                    .with("src", url),
            );
        }

        head
    }

    /// Build the loader call delivering the resources of an async update
    pub fn render_loader(&self) -> RenderResult<String> {
        Ok(format!(
            "{}({}, {}, {}, {}, {}, {})",
            LOADER_FUNCTION,
            serde_json::to_string(&self.named_css())?,
            serde_json::to_string(&Self::joined_anonymous(&self.anonymous_css))?,
            serde_json::to_string(&self.css_urls())?,
            serde_json::to_string(&self.named_javascript())?,
            serde_json::to_string(&Self::joined_anonymous(&self.anonymous_js))?,
            serde_json::to_string(&self.javascript_urls())?,
        ))
    }

    /// Render according to the mode: the `<head>` markup or the loader call
    pub fn render(&self) -> RenderResult<Child> {
        match self.mode {
            HeadMode::Full => Ok(Child::Element(self.render_head())),
            HeadMode::Async => Ok(Child::Raw(self.render_loader()?)),
        }
    }
}

fn sorted_named(map: &HashMap<String, (u64, String)>) -> Vec<(String, String)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by_key(|(_, (order, _))| *order);
    entries
        .into_iter()
        .map(|(name, (_, text))| (name.clone(), text.clone()))
        .collect()
}

fn sorted_urls(map: &HashMap<String, u64>) -> Vec<String> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by_key(|(_, order)| **order);
    entries.into_iter().map(|(url, _)| url.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::JsCodeGenerator;

    #[test]
    fn test_duplicate_name_keeps_first() {
        let mut head = HeadAggregator::new(HeadMode::Full, "/static");
        head.css("s1", "body{color:red}");
        head.css_url("theme.css");
        head.css("s1", "body{color:blue}");

        let resources = head.resources();
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].identity, Identity::Name("s1".into()));
        assert_eq!(resources[0].order, 0);
        assert_eq!(resources[0].payload.as_deref(), Some("body{color:red}"));
        assert_eq!(resources[1].identity, Identity::Url("/static/theme.css".into()));
        assert_eq!(resources[1].order, 1);
    }

    #[test]
    fn test_interleaved_registration_order() {
        let mut head = HeadAggregator::new(HeadMode::Full, "/static");
        head.css_url("a.css");
        head.css("first", "p{}");
        head.css_url("b.css");
        head.css("second", "q{}");
        head.css_url("/static/a.css");
        head.javascript_url("x.js");
        head.javascript("init", "go();");
        head.javascript_url("y.js");
        head.css("first", "r{}");

        let identities: Vec<(ResourceKind, Identity, u64)> = head
            .resources()
            .into_iter()
            .map(|r| (r.kind, r.identity, r.order))
            .collect();
        assert_eq!(
            identities,
            vec![
                (ResourceKind::Css, Identity::Url("/static/a.css".into()), 0),
                (ResourceKind::Css, Identity::Name("first".into()), 1),
                (ResourceKind::Css, Identity::Url("/static/b.css".into()), 2),
                (ResourceKind::Css, Identity::Name("second".into()), 3),
                (ResourceKind::Js, Identity::Url("/static/x.js".into()), 4),
                (ResourceKind::Js, Identity::Name("init".into()), 5),
                (ResourceKind::Js, Identity::Url("/static/y.js".into()), 6),
            ]
        );
        assert_eq!(
            head.css_urls(),
            vec!["/static/a.css".to_string(), "/static/b.css".to_string()]
        );
    }

    #[test]
    fn test_extra_children_before_styles() {
        let mut head = HeadAggregator::new(HeadMode::Full, "");
        head.css("s1", "p{}");
        head.push(Node::generic("title").child("Accounts"));
        head.javascript_url("/a.js");
        assert_eq!(
            head.render_head().to_html(),
            "<head><title>Accounts</title>\
             <style type=\"text/css\">p{}</style>\
             <script type=\"text/javascript\" src=\"/a.js\"></script></head>"
        );
    }

    #[test]
    fn test_duplicate_url_after_resolution() {
        let mut head = HeadAggregator::new(HeadMode::Full, "/static");
        head.javascript_url("app.js");
        head.javascript_url("/static/app.js");
        assert_eq!(head.javascript_urls(), vec!["/static/app.js".to_string()]);
    }

    #[test]
    fn test_no_empty_inline_blocks() {
        let mut head = HeadAggregator::new(HeadMode::Full, "");
        head.css_url("/a.css");
        head.javascript_url("/a.js");
        assert_eq!(
            head.render_head().to_html(),
            "<head><link rel=\"stylesheet\" type=\"text/css\" href=\"/a.css\">\
             <script type=\"text/javascript\" src=\"/a.js\"></script></head>"
        );
    }

    #[test]
    fn test_function_registers_runtime() {
        let mut head = HeadAggregator::new(HeadMode::Full, "");
        let gen = JsCodeGenerator::with_runtime("/static/runtime.js");
        head.javascript_function("hello", &ClientFunction::new("hello", &[], "return 1;"), &gen);
        assert_eq!(head.javascript_urls(), vec!["/static/runtime.js".to_string()]);
        assert_eq!(
            head.named_javascript(),
            vec![("hello".to_string(), "function hello() {return 1;}".to_string())]
        );
    }

    #[test]
    fn test_async_absorbs_styles_and_scripts() {
        let mut head = HeadAggregator::new(HeadMode::Async, "/s");
        let style = Node::new("style", TagKind::Style).child("p{}");
        let script = Node::new("script", TagKind::Script).with("src", "x.js");
        assert!(head.absorb(style).is_none());
        assert!(head.absorb(script).is_none());
        head.anonymous_css("a{}");
        assert_eq!(
            head.render_loader().unwrap(),
            "weft_loadAll([], \"p{}\\na{}\", [], [], \"\", [\"/s/x.js\"])"
        );
    }

    #[test]
    fn test_full_mode_keeps_inline() {
        let mut head = HeadAggregator::new(HeadMode::Full, "");
        let style = Node::new("style", TagKind::Style).child("p{}");
        assert!(head.absorb(style).is_some());
    }
}
