//! # weft-xhtml
//!
//! Server-side XHTML tag trees for component based web applications.
//!
//! ## Features
//! - Tag trees built from code or parsed from XHTML templates
//! - Server actions bound on links, form fields, buttons and images
//! - Synchronous rendering (full page) and asynchronous rendering (partial
//!   updates replacing a part of the page)
//! - Deduplicated head resources: named and url styles and scripts
//! - Session and continuation ids carried by forms and urls
//!
//! ## Example
//! ```ignore
//! use std::sync::Arc;
//! use weft_xhtml::{
//!     action, Child, Component, ComponentId, MemoryCallbacks, RenderMode, RenderResult, Renderer,
//! };
//!
//! struct Counter(ComponentId);
//!
//! impl Component for Counter {
//!     fn id(&self) -> ComponentId {
//!         self.0
//!     }
//!
//!     fn render(&self, h: &mut Renderer, _view: Option<&str>) -> RenderResult<Child> {
//!         let mut link = h.element("a", vec![], vec!["increment".into()])?;
//!         h.action(&mut link, action(|_| Ok(())))?;
//!         Ok(link.into())
//!     }
//! }
//!
//! let h = Renderer::builder(Arc::new(MemoryCallbacks::new())).build(RenderMode::Sync);
//! let body = h.render(&Counter(ComponentId::fresh()), None)?;
//! let page = h.render_document(body);
//! ```

pub mod binder;
pub mod callbacks;
pub mod codegen;
pub mod component;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod head;
pub mod kinds;
pub mod node;
pub mod parse;
pub mod render;
pub mod security;
pub mod session;
pub mod update;
pub mod url;

pub use binder::Bindable;
pub use callbacks::{
    action, Action, CallbackHandle, CallbackRegistry, GeneratedResponse, ImageGenerator,
    MemoryCallbacks, RenderAfter, Submitted,
};
pub use codegen::{ClientFunction, CodeGenerator, GeneratedCode, JsCodeGenerator};
pub use component::{Component, ComponentId};
pub use config::RenderConfig;
pub use dispatch::{AttrValue, AttributeDispatcher, AttributeHandler, ValueKind};
pub use error::{ActionError, RenderError, RenderResult};
pub use head::{HeadAggregator, HeadMode, LOADER_FUNCTION};
pub use kinds::{KindTable, TagKind};
pub use node::{Child, Node, Selection};
pub use parse::parse_xhtml;
pub use render::{RenderMode, Renderer, RendererBuilder};
pub use security::{GrantTable, Security, Subject};
pub use session::{Request, Response, SessionIds, SessionStore};
pub use update::{PartialUpdate, UpdateDirective, UpdateTarget, UPDATE_FUNCTION};
pub use url::absolute_url;
