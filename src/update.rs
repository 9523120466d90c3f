//! Asynchronous updates: the directive bound on an element, and the partial
//! response produced once the targeted view is re-rendered.

use serde::Serialize;

use crate::callbacks::{Action, RenderAfter};
use crate::component::ComponentId;
use crate::error::{RenderError, RenderResult};
use crate::render::Renderer;

/// Client function fetching `url` and replacing the element `id` with the answer
pub const UPDATE_FUNCTION: &str = "weft_updateNode";

/// Client function applying a [`PartialUpdate`]
pub const REPLACE_FUNCTION: &str = "weft_replaceNode";

/// Query parameter carrying the handle of an asynchronous callback
pub const ACTION_PARAM: &str = "_a";

/// The view re-rendered after an asynchronous action, and where it goes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateTarget {
    pub component: ComponentId,
    pub view: Option<String>,
    pub dom_id: String,
}

/// Request an action, then replace a part of the page with a re-rendered view.
///
/// By default the current component is re-rendered with the current view,
/// replacing the outermost asynchronous frame enclosing the element.
#[derive(Clone, Default)]
pub struct UpdateDirective {
    action: Option<Action>,
    component: Option<ComponentId>,
    view: Option<String>,
    dom_id: Option<String>,
}

impl std::fmt::Debug for UpdateDirective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateDirective")
            .field("action", &self.action.as_ref().map(|_| ".."))
            .field("component", &self.component)
            .field("view", &self.view)
            .field("dom_id", &self.dom_id)
            .finish()
    }
}

impl UpdateDirective {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    /// Re-render `component` with `view` instead of the current ones
    pub fn render(mut self, component: ComponentId, view: Option<&str>) -> Self {
        self.component = Some(component);
        self.view = view.map(str::to_string);
        self
    }

    /// Replace the element `dom_id` instead of the enclosing async frame
    pub fn target(mut self, dom_id: impl Into<String>) -> Self {
        self.dom_id = Some(dom_id.into());
        self
    }

    pub fn action(&self) -> Option<&Action> {
        self.action.as_ref()
    }

    pub(crate) fn map_action(mut self, f: impl FnOnce(Action) -> Action) -> Self {
        self.action = self.action.map(f);
        self
    }

    /// Register the callback and build the client expression requesting it
    pub fn generate_action(&self, priority: u8, h: &Renderer) -> RenderResult<String> {
        let (component, view) = match self.component {
            Some(component) => (component, self.view.clone()),
            None => {
                let component = h
                    .current_component()
                    .ok_or_else(|| RenderError::NoCurrentComponent {
                        operation: "update".to_string(),
                    })?;
                (component, h.current_view().map(str::to_string))
            }
        };
        let dom_id = match &self.dom_id {
            Some(id) => id.clone(),
            None => h.async_root_id()?,
        };

        let target = UpdateTarget {
            component,
            view,
            dom_id: dom_id.clone(),
        };
        let handle =
            h.register_callback(priority, self.action.clone(), Some(RenderAfter::Update(target)))?;
        let url = h.add_session_id_to_url("", &[format!("{}={}", ACTION_PARAM, handle)], None);

        Ok(format!(
            "{}({}, {}); return false;",
            UPDATE_FUNCTION,
            serde_json::to_string(&dom_id)?,
            serde_json::to_string(&url)?
        ))
    }
}

/// Answer to an asynchronous request: the re-rendered markup of a view and
/// the head resources it needs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartialUpdate {
    pub target: String,
    pub html: String,
    pub head: String,
}

impl PartialUpdate {
    /// Client code loading the head resources then swapping the markup
    pub fn to_js(&self) -> RenderResult<String> {
        Ok(format!(
            "{};\n{}({}, {});",
            self.head,
            REPLACE_FUNCTION,
            serde_json::to_string(&self.target)?,
            serde_json::to_string(&self.html)?
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_update_js() {
        let update = PartialUpdate {
            target: "id3".to_string(),
            html: "<p class=\"x\">ok</p>".to_string(),
            head: "weft_loadAll([], \"\", [], [], \"\", [])".to_string(),
        };
        assert_eq!(
            update.to_js().unwrap(),
            "weft_loadAll([], \"\", [], [], \"\", []);\nweft_replaceNode(\"id3\", \"<p class=\\\"x\\\">ok</p>\");"
        );
    }
}
