//! Attribute values and the handlers setting them on a node.
//!
//! A value is dispatched to the handler registered for its kind. Handlers
//! are looked up in specificity order, so registering a handler for a new
//! kind never changes how the existing kinds are set.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::codegen::{ClientFunction, GeneratedCode};
use crate::error::{RenderError, RenderResult};
use crate::kinds::{TagKind, PRIORITY_NAVIGATION};
use crate::node::Node;
use crate::render::Renderer;
use crate::update::UpdateDirective;
use crate::url::absolute_url;

/// Value given to an attribute
#[derive(Debug, Clone)]
pub enum AttrValue {
    Text(String),
    Function(ClientFunction),
    Code(GeneratedCode),
    Update(UpdateDirective),
}

/// Kinds of attribute values, most specific first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueKind {
    Update,
    Function,
    Code,
    Text,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Update => "update",
            ValueKind::Function => "function",
            ValueKind::Code => "code",
            ValueKind::Text => "text",
        };
        f.write_str(name)
    }
}

impl AttrValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            AttrValue::Text(_) => ValueKind::Text,
            AttrValue::Function(_) => ValueKind::Function,
            AttrValue::Code(_) => ValueKind::Code,
            AttrValue::Update(_) => ValueKind::Update,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<ClientFunction> for AttrValue {
    fn from(function: ClientFunction) -> Self {
        AttrValue::Function(function)
    }
}

impl From<GeneratedCode> for AttrValue {
    fn from(code: GeneratedCode) -> Self {
        AttrValue::Code(code)
    }
}

impl From<UpdateDirective> for AttrValue {
    fn from(update: UpdateDirective) -> Self {
        AttrValue::Update(update)
    }
}

/// Sets one kind of attribute value on a node
pub trait AttributeHandler {
    fn set(
        &self,
        h: &mut Renderer,
        node: &mut Node,
        name: &str,
        value: AttrValue,
    ) -> RenderResult<()>;
}

/// Registers an asynchronous callback and sets the client update expression
pub struct UpdateHandler;

impl AttributeHandler for UpdateHandler {
    fn set(
        &self,
        h: &mut Renderer,
        node: &mut Node,
        name: &str,
        value: AttrValue,
    ) -> RenderResult<()> {
        let kind = value.kind();
        let AttrValue::Update(update) = value else {
            return Err(unsupported(node, name, kind));
        };
        let priority = node
            .kind()
            .action_record()
            .map(|record| record.priority)
            .unwrap_or(PRIORITY_NAVIGATION);
        let code = update.generate_action(priority, h)?;
        node.set(name, code);
        Ok(())
    }
}

/// Transcodes a client function and sets it as generated code
pub struct FunctionHandler;

impl AttributeHandler for FunctionHandler {
    fn set(
        &self,
        h: &mut Renderer,
        node: &mut Node,
        name: &str,
        value: AttrValue,
    ) -> RenderResult<()> {
        let kind = value.kind();
        let AttrValue::Function(function) = value else {
            return Err(unsupported(node, name, kind));
        };
        let codegen = h.codegen();
        if let Some(url) = codegen.runtime_url() {
            h.head().javascript_url(url);
        }
        let code = codegen.transcode(&function);
        h.set_attribute(node, name, AttrValue::Code(code))
    }
}

/// Sets the invocation of generated code, bound to the current renderer
pub struct CodeHandler;

impl AttributeHandler for CodeHandler {
    fn set(
        &self,
        h: &mut Renderer,
        node: &mut Node,
        name: &str,
        value: AttrValue,
    ) -> RenderResult<()> {
        let kind = value.kind();
        let AttrValue::Code(code) = value else {
            return Err(unsupported(node, name, kind));
        };
        let invocation = h.codegen().invocation(&code, h.id());
        node.set(name, invocation);
        Ok(())
    }
}

/// Sets text, resolving link and image urls
pub struct TextHandler;

impl AttributeHandler for TextHandler {
    fn set(
        &self,
        h: &mut Renderer,
        node: &mut Node,
        name: &str,
        value: AttrValue,
    ) -> RenderResult<()> {
        let kind = value.kind();
        let AttrValue::Text(text) = value else {
            return Err(unsupported(node, name, kind));
        };
        let text = match (node.kind(), name) {
            (TagKind::Anchor, "href") => absolute_url(&text, h.url()),
            (TagKind::Img, "src") => absolute_url(&text, h.static_url()),
            _ => text,
        };
        node.set(name, text);
        Ok(())
    }
}

fn unsupported(node: &Node, attribute: &str, kind: ValueKind) -> RenderError {
    RenderError::UnsupportedValueKind {
        tag: node.tag().to_string(),
        attribute: attribute.to_string(),
        kind: kind.to_string(),
    }
}

/// Handler registry keyed by value kind
#[derive(Clone)]
pub struct AttributeDispatcher {
    handlers: BTreeMap<ValueKind, Rc<dyn AttributeHandler>>,
}

impl AttributeDispatcher {
    /// A dispatcher without any handler
    pub fn empty() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// A dispatcher handling every [`ValueKind`]
    pub fn xhtml() -> Self {
        let mut dispatcher = Self::empty();
        dispatcher.register(ValueKind::Update, Rc::new(UpdateHandler));
        dispatcher.register(ValueKind::Function, Rc::new(FunctionHandler));
        dispatcher.register(ValueKind::Code, Rc::new(CodeHandler));
        dispatcher.register(ValueKind::Text, Rc::new(TextHandler));
        dispatcher
    }

    /// Register (or replace) the handler of a value kind
    pub fn register(&mut self, kind: ValueKind, handler: Rc<dyn AttributeHandler>) {
        self.handlers.insert(kind, handler);
    }

    /// Registered kinds, most specific first
    pub fn kinds(&self) -> Vec<ValueKind> {
        self.handlers.keys().copied().collect()
    }

    pub fn dispatch(
        &self,
        h: &mut Renderer,
        node: &mut Node,
        name: &str,
        value: AttrValue,
    ) -> RenderResult<()> {
        let handler = self
            .handlers
            .get(&value.kind())
            .cloned()
            .ok_or_else(|| unsupported(node, name, value.kind()))?;
        handler.set(h, node, name, value)
    }
}

impl Default for AttributeDispatcher {
    fn default() -> Self {
        Self::xhtml()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_in_specificity_order() {
        assert_eq!(
            AttributeDispatcher::xhtml().kinds(),
            vec![ValueKind::Update, ValueKind::Function, ValueKind::Code, ValueKind::Text]
        );
        assert!(AttributeDispatcher::empty().kinds().is_empty());
    }

    #[test]
    fn test_value_kinds() {
        assert_eq!(AttrValue::from("x").kind(), ValueKind::Text);
        assert_eq!(AttrValue::from(GeneratedCode::from("f()")).kind(), ValueKind::Code);
        assert_eq!(AttrValue::from(UpdateDirective::new()).kind(), ValueKind::Update);
    }
}
