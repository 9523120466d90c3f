//! Renderers: build the tag tree of the components, in synchronous (full
//! page) or asynchronous (partial update) mode.
//!
//! A render pass starts with a root renderer from [`RendererBuilder`]. Each
//! rendered component gets a child renderer sharing the immutable request
//! core and the mutable pass state (head resources, rendered components, id
//! counter) of its parent.

use std::cell::{Cell, RefCell, RefMut};
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;

use crate::binder::{self, Bindable};
use crate::callbacks::{Action, CallbackHandle, CallbackRegistry, ImageGenerator, RenderAfter};
use crate::codegen::{ClientFunction, CodeGenerator, JsCodeGenerator};
use crate::component::{Component, ComponentId};
use crate::config::RenderConfig;
use crate::dispatch::{AttrValue, AttributeDispatcher};
use crate::error::{RenderError, RenderResult};
use crate::head::{HeadAggregator, HeadMode};
use crate::kinds::{KindTable, TagKind};
use crate::node::{Child, Node};
use crate::parse::parse_xhtml;
use crate::security::{GrantTable, Security, Subject};
use crate::session::{Request, Response, SessionStore};
use crate::update::PartialUpdate;
use crate::url::{absolute_url, has_scheme};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Full page, actions bound to form fields and links
    Sync,
    /// Partial update, links and submits bound to asynchronous requests
    Async,
}

/// Per-request state, never modified during the pass
struct RenderCore {
    config: RenderConfig,
    session: Option<Rc<dyn SessionStore>>,
    request: Request,
    response: Response,
    callbacks: Arc<dyn CallbackRegistry>,
    security: Arc<dyn Security>,
    codegen: Rc<dyn CodeGenerator>,
    kinds: KindTable,
    dispatcher: AttributeDispatcher,
}

/// Per-pass state, shared by all the renderers of a pass
struct PassState {
    head: HeadAggregator,
    rendered: HashSet<ComponentId>,
    last_id: u64,
}

/// Position of a renderer in the renderer tree
struct Frame {
    id: String,
    mode: RenderMode,
    /// Cleared once the renderer starts rendering a component
    async_root: Cell<bool>,
    /// Set when an update targets this frame, which must then be wrapped
    wrapper_to_generate: Cell<bool>,
    parent: Option<Rc<Frame>>,
}

impl Frame {
    /// Outermost frame of a chain of asynchronous frames
    fn async_root(self: &Rc<Self>) -> Rc<Frame> {
        match &self.parent {
            Some(parent) if parent.mode == RenderMode::Async && !parent.async_root.get() => {
                parent.async_root()
            }
            _ => Rc::clone(self),
        }
    }
}

/// Assembles the collaborators of a render pass
pub struct RendererBuilder {
    config: RenderConfig,
    callbacks: Arc<dyn CallbackRegistry>,
    session: Option<Rc<dyn SessionStore>>,
    request: Request,
    response: Response,
    security: Arc<dyn Security>,
    codegen: Rc<dyn CodeGenerator>,
    kinds: KindTable,
    dispatcher: AttributeDispatcher,
}

impl RendererBuilder {
    pub fn new(callbacks: Arc<dyn CallbackRegistry>) -> Self {
        Self {
            config: RenderConfig::default(),
            callbacks,
            session: None,
            request: Request::default(),
            response: Response::default(),
            security: Arc::new(GrantTable::new()),
            codegen: Rc::new(JsCodeGenerator::new()),
            kinds: KindTable::xhtml(),
            dispatcher: AttributeDispatcher::xhtml(),
        }
    }

    pub fn config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn session(mut self, session: Rc<dyn SessionStore>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn request(mut self, request: Request, response: Response) -> Self {
        self.request = request;
        self.response = response;
        self
    }

    pub fn security(mut self, security: Arc<dyn Security>) -> Self {
        self.security = security;
        self
    }

    pub fn codegen(mut self, codegen: Rc<dyn CodeGenerator>) -> Self {
        self.codegen = codegen;
        self
    }

    pub fn kinds(mut self, kinds: KindTable) -> Self {
        self.kinds = kinds;
        self
    }

    pub fn dispatcher(mut self, dispatcher: AttributeDispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Start a render pass
    pub fn build(self, mode: RenderMode) -> Renderer {
        let head_mode = match mode {
            RenderMode::Sync => HeadMode::Full,
            RenderMode::Async => HeadMode::Async,
        };
        let url = self.config.url.clone();
        let pass = PassState {
            head: HeadAggregator::new(head_mode, self.config.static_url.clone()),
            rendered: HashSet::new(),
            last_id: 0,
        };
        let core = RenderCore {
            config: self.config,
            session: self.session,
            request: self.request,
            response: self.response,
            callbacks: self.callbacks,
            security: self.security,
            codegen: self.codegen,
            kinds: self.kinds,
            dispatcher: self.dispatcher,
        };

        tracing::debug!("render pass started in {:?} mode at '{}'", mode, url);
        let pass = Rc::new(RefCell::new(pass));
        let frame = Rc::new(Frame {
            id: next_id(&pass, "id"),
            mode,
            async_root: Cell::new(true),
            wrapper_to_generate: Cell::new(false),
            parent: None,
        });
        Renderer {
            core: Rc::new(core),
            pass,
            frame,
            url,
            component: None,
            view: None,
        }
    }
}

fn next_id(pass: &RefCell<PassState>, prefix: &str) -> String {
    let mut pass = pass.borrow_mut();
    pass.last_id += 1;
    format!("{}{}", prefix, pass.last_id)
}

pub struct Renderer {
    core: Rc<RenderCore>,
    pass: Rc<RefCell<PassState>>,
    frame: Rc<Frame>,
    url: String,
    component: Option<ComponentId>,
    view: Option<String>,
}

impl Renderer {
    pub fn builder(callbacks: Arc<dyn CallbackRegistry>) -> RendererBuilder {
        RendererBuilder::new(callbacks)
    }

    pub fn mode(&self) -> RenderMode {
        self.frame.mode
    }

    /// Identifier of this renderer, unique in the pass
    pub fn id(&self) -> &str {
        &self.frame.id
    }

    /// Url of the component being rendered
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn static_url(&self) -> &str {
        &self.core.config.static_url
    }

    pub fn static_path(&self) -> &str {
        &self.core.config.static_path
    }

    pub fn current_component(&self) -> Option<ComponentId> {
        self.component
    }

    pub fn current_view(&self) -> Option<&str> {
        self.view.as_deref()
    }

    pub fn kinds(&self) -> &KindTable {
        &self.core.kinds
    }

    pub(crate) fn codegen(&self) -> Rc<dyn CodeGenerator> {
        Rc::clone(&self.core.codegen)
    }

    pub(crate) fn security(&self) -> Arc<dyn Security> {
        Arc::clone(&self.core.security)
    }

    /// Head resources of the pass
    pub fn head(&self) -> RefMut<'_, HeadAggregator> {
        RefMut::map(self.pass.borrow_mut(), |pass| &mut pass.head)
    }

    /// Register a client function in the head
    pub fn javascript_function(&self, name: &str, function: &ClientFunction) {
        let codegen = self.codegen();
        self.head().javascript_function(name, function, codegen.as_ref());
    }

    /// A new id, unique in the pass
    pub fn generate_id(&self, prefix: &str) -> String {
        next_id(&self.pass, prefix)
    }

    fn child(&self, mode: RenderMode) -> Renderer {
        self.child_with_id(mode, self.generate_id("id"))
    }

    fn child_with_id(&self, mode: RenderMode, id: String) -> Renderer {
        Renderer {
            core: Rc::clone(&self.core),
            pass: Rc::clone(&self.pass),
            frame: Rc::new(Frame {
                id,
                mode,
                async_root: Cell::new(true),
                wrapper_to_generate: Cell::new(false),
                parent: Some(Rc::clone(&self.frame)),
            }),
            url: self.url.clone(),
            component: self.component,
            view: self.view.clone(),
        }
    }

    /// A child renderer in asynchronous mode: the components rendered with
    /// it are updated in place instead of reloading the page
    pub fn async_renderer(&self) -> Renderer {
        self.child(RenderMode::Async)
    }

    // ---- Tag tree ----

    /// An element with the default attributes of its kind
    pub fn make_element(&self, tag: &str) -> Node {
        self.make_node(tag, None)
    }

    /// An `<input>` of the given type
    pub fn make_input(&self, input_type: &str) -> Node {
        self.make_node("input", Some(input_type))
    }

    fn make_node(&self, tag: &str, input_type: Option<&str>) -> Node {
        let kind = self.core.kinds.resolve(tag, input_type);
        let mut node = Node::new(tag, kind);
        if let Some(input_type) = input_type {
            node.set("type", input_type);
        }
        for (name, value) in kind.default_attributes() {
            node.set(name, *value);
        }
        match kind {
            TagKind::Form => self.add_session_id_to_form(&mut node),
            TagKind::Label => node.set("for", self.generate_id("id")),
            _ => {}
        }
        node
    }

    /// Build an element, setting its attributes then adding its children
    pub fn element(
        &mut self,
        tag: &str,
        attrs: Vec<(&str, AttrValue)>,
        children: Vec<Child>,
    ) -> RenderResult<Node> {
        let input_type = attrs.iter().find_map(|(name, value)| match value {
            AttrValue::Text(t) if *name == "type" => Some(t.clone()),
            _ => None,
        });
        let mut node = self.make_node(tag, input_type.as_deref());
        for (name, value) in attrs {
            self.set_attribute(&mut node, name, value)?;
        }
        for child in children {
            self.add_child(&mut node, child)?;
        }
        Ok(node)
    }

    /// Set an attribute through the handler of the value kind
    pub fn set_attribute(
        &mut self,
        node: &mut Node,
        name: &str,
        value: impl Into<AttrValue>,
    ) -> RenderResult<()> {
        let core = Rc::clone(&self.core);
        core.dispatcher.dispatch(self, node, name, value.into())
    }

    /// Add a child: fragments are flattened, styles and scripts go through
    /// the head, nested forms lose their session fields
    pub fn add_child(&mut self, node: &mut Node, child: impl Into<Child>) -> RenderResult<()> {
        match child.into() {
            Child::Fragment(children) => {
                for child in children {
                    self.add_child(node, child)?;
                }
            }
            Child::Element(mut element) => {
                if matches!(element.kind(), TagKind::Style | TagKind::Script) {
                    if let Some(element) = self.head().absorb(element) {
                        node.push(element);
                    }
                    return Ok(());
                }
                if node.kind() == TagKind::Form {
                    element.strip_form_session_fields();
                }
                node.push(element);
            }
            other => node.push(other),
        }
        Ok(())
    }

    /// Wrap an element with its error message
    pub fn decorate_error(&self, element: impl Into<Child>, error: Option<&str>) -> Child {
        let element = element.into();
        match error {
            None => element,
            Some(error) => Node::generic("div")
                .with("class", "error-field")
                .child(Node::generic("div").with("class", "error-input").child(element))
                .child(Node::generic("div").with("class", "error-message").child(error))
                .into(),
        }
    }

    pub fn parse_xhtml(&self, source: &str) -> RenderResult<Vec<Node>> {
        parse_xhtml(source, &self.core.kinds)
    }

    /// Parse a template file, relative to the static path
    pub fn parse_xhtml_file(&self, path: &str) -> RenderResult<Vec<Node>> {
        let path = absolute_url(path, self.static_path());
        let source = std::fs::read_to_string(&path).map_err(|e| RenderError::IoError {
            path: path.clone(),
            message: e.to_string(),
        })?;
        self.parse_xhtml(&source)
    }

    // ---- Actions ----

    /// Bind a server action on an action-capable element
    pub fn action(&self, node: &mut Node, bindable: impl Into<Bindable>) -> RenderResult<()> {
        binder::bind(self, node, bindable.into(), None, None)
    }

    /// Bind an action only run when `subject` (the current component by
    /// default) has all the `permissions`
    pub fn protected_action(
        &self,
        node: &mut Node,
        bindable: impl Into<Bindable>,
        permissions: &[&str],
        subject: Option<Subject>,
    ) -> RenderResult<()> {
        let permissions: Vec<String> = permissions.iter().map(|p| p.to_string()).collect();
        binder::bind(self, node, bindable.into(), Some(permissions.as_slice()), subject)
    }

    /// Make `img` display the data produced by `generator`
    pub fn image_action(&self, img: &mut Node, generator: ImageGenerator) -> RenderResult<()> {
        binder::bind(self, img, Bindable::Image(generator), None, None)
    }

    pub fn pre_action(&self, form: &mut Node, action: Action) -> RenderResult<()> {
        binder::pre_action(self, form, action)
    }

    pub fn post_action(&self, form: &mut Node, action: Action) -> RenderResult<()> {
        binder::post_action(self, form, action)
    }

    /// Register a callback owned by the component being rendered
    pub fn register_callback(
        &self,
        priority: u8,
        action: Option<Action>,
        render: Option<RenderAfter>,
    ) -> RenderResult<CallbackHandle> {
        let component = self.component.ok_or_else(|| RenderError::NoCurrentComponent {
            operation: "register_callback".to_string(),
        })?;
        Ok(self.core.callbacks.register(component, priority, action, render))
    }

    /// Id of the frame replaced by an update generated from this renderer.
    ///
    /// Only an asynchronous frame rendering a component is wrapped by
    /// [`Renderer::end_rendering`].
    pub(crate) fn async_root_id(&self) -> RenderResult<String> {
        let root = self.frame.async_root();
        if root.mode != RenderMode::Async || root.async_root.get() {
            return Err(RenderError::NoAsyncFrame {
                frame: root.id.clone(),
            });
        }
        root.wrapper_to_generate.set(true);
        Ok(root.id.clone())
    }

    // ---- Components ----

    /// Render a view of a component with a child renderer
    pub fn render(&self, component: &dyn Component, view: Option<&str>) -> RenderResult<Child> {
        self.child(self.mode()).render_in_frame(component, view)
    }

    fn render_in_frame(
        mut self,
        component: &dyn Component,
        view: Option<&str>,
    ) -> RenderResult<Child> {
        self.start_rendering(component, view);
        let output = component.render(&mut self, view)?;
        Ok(self.end_rendering(output))
    }

    pub fn start_rendering(&mut self, component: &dyn Component, view: Option<&str>) {
        let id = component.id();
        self.component = Some(id);
        self.view = view.map(str::to_string);
        if let Some(segment) = component.url() {
            self.url = format!(
                "{}/{}",
                self.url.trim_end_matches('/'),
                segment.trim_start_matches('/')
            );
        }

        let first_visit = self.pass.borrow_mut().rendered.insert(id);
        if first_visit {
            self.core.callbacks.invalidate_all(id);
        }
        if self.mode() == RenderMode::Async {
            self.frame.async_root.set(false);
        }
        tracing::debug!("rendering {} view {:?} in frame {}", id, view, self.frame.id);
    }

    pub fn end_rendering(&self, output: Child) -> Child {
        if self.mode() == RenderMode::Async && self.frame.wrapper_to_generate.get() {
            tracing::debug!("wrapping frame {} for asynchronous updates", self.frame.id);
            return Node::generic("div").with("id", &self.frame.id).child(output).into();
        }
        output
    }

    // ---- Session ----

    /// Append the session hidden fields to a form
    pub fn add_session_id_to_form(&self, form: &mut Node) {
        let Some(session) = &self.core.session else {
            return;
        };
        let fields = session.hidden_fields(&self.core.request, &self.core.response);
        if fields.is_empty() {
            return;
        }
        let mut block = Node::generic("div");
        for field in fields {
            block.push(field);
        }
        block.mark_session_fields();
        form.push(block);
    }

    /// Append the session parameters, then `params`, to the query string of
    /// `url`. A relative `url` is taken relative to the current url.
    pub fn add_session_id_to_url(&self, url: &str, params: &[String], sep: Option<&str>) -> String {
        let sep = sep.unwrap_or("&");
        let url = if url.starts_with('/') || has_scheme(url) {
            url.to_string()
        } else {
            format!("{}/{}", self.url.trim_end_matches('/'), url)
        };

        let mut query: Vec<String> = match &self.core.session {
            Some(session) => session.query_params(&self.core.request, &self.core.response),
            None => Vec::new(),
        };
        query.extend(params.iter().cloned());
        if query.is_empty() {
            return url;
        }
        let joiner = if url.contains('?') { sep } else { "?" };
        format!("{}{}{}", url, joiner, query.join(sep))
    }

    // ---- Outputs ----

    /// Serialize a whole page, head resources included
    pub fn render_document(&self, body: impl Into<Child>) -> String {
        let body = match body.into() {
            Child::Element(node) if node.tag() == "body" => node,
            other => Node::generic("body").child(other),
        };
        let html = Node::generic("html")
            .child(self.head().render_head())
            .child(body);
        format!("<!DOCTYPE html>\n{}", html)
    }

    /// Re-render a view as the answer to an asynchronous request. The view
    /// is rendered in a frame identified by `target`, so the replacement
    /// keeps the id of the element it replaces.
    pub fn render_update(
        &self,
        component: &dyn Component,
        view: Option<&str>,
        target: &str,
    ) -> RenderResult<PartialUpdate> {
        let output = self
            .child_with_id(self.mode(), target.to_string())
            .render_in_frame(component, view)?;
        let head = self.head().render_loader()?;
        Ok(PartialUpdate {
            target: target.to_string(),
            html: output.to_html(),
            head,
        })
    }
}
