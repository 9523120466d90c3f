use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::RenderResult;
use crate::node::Child;
use crate::render::Renderer;

/// Identity of a component, stable across render passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(pub u64);

impl ComponentId {
    /// A fresh identifier, unique within the process
    pub fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ComponentId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Something able to render itself with a renderer
pub trait Component {
    fn id(&self) -> ComponentId;

    /// Segment appended to the url of the renderers below this component
    fn url(&self) -> Option<&str> {
        None
    }

    /// Build the tree of the view `view` (the default view when `None`)
    fn render(&self, h: &mut Renderer, view: Option<&str>) -> RenderResult<Child>;
}
