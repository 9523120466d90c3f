//! Callback registration: the contract between the tag tree and the server
//! actions it triggers.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::component::ComponentId;
use crate::error::ActionError;
use crate::update::UpdateTarget;

/// Content type used when an image format cannot be recognized
pub const FALLBACK_IMAGE_TYPE: &str = "image/*";

/// Opaque token naming a registered action
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallbackHandle(pub String);

impl CallbackHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallbackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Value delivered to an action by a submitted request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Submitted {
    None,
    Value(String),
    Values(Vec<String>),
}

impl From<&str> for Submitted {
    fn from(value: &str) -> Self {
        Submitted::Value(value.to_string())
    }
}

impl From<Vec<&str>> for Submitted {
    fn from(values: Vec<&str>) -> Self {
        Submitted::Values(values.into_iter().map(str::to_string).collect())
    }
}

pub type Action = Arc<dyn Fn(Submitted) -> Result<(), ActionError> + Send + Sync>;

/// Wrap a closure into an [`Action`]
pub fn action<F>(f: F) -> Action
where
    F: Fn(Submitted) -> Result<(), ActionError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Produces the bytes of a dynamically generated image
pub type ImageGenerator = Arc<dyn Fn() -> Result<Vec<u8>, ActionError> + Send + Sync>;

/// What to send back once the action of a callback has run
#[derive(Clone)]
pub enum RenderAfter {
    /// Re-render a component view as a partial update
    Update(UpdateTarget),
    /// Answer with generated image data
    Image(ImageGenerator),
}

impl fmt::Debug for RenderAfter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderAfter::Update(target) => f.debug_tuple("Update").field(target).finish(),
            RenderAfter::Image(_) => f.write_str("Image(..)"),
        }
    }
}

/// A generated, non-markup response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedResponse {
    pub content_type: String,
    pub body: Vec<u8>,
}

impl GeneratedResponse {
    /// Wrap image bytes, guessing their content type
    pub fn image(body: Vec<u8>) -> Self {
        let content_type = image::guess_format(&body)
            .map(|format| format.to_mime_type().to_string())
            .unwrap_or_else(|_| FALLBACK_IMAGE_TYPE.to_string());
        Self { content_type, body }
    }
}

/// Callback registry collaborator
pub trait CallbackRegistry: Send + Sync {
    /// Register `action` for `component`, returning the handle to put in the markup
    fn register(
        &self,
        component: ComponentId,
        priority: u8,
        action: Option<Action>,
        render: Option<RenderAfter>,
    ) -> CallbackHandle;

    /// Forget every callback of `component`. Calling it twice is harmless.
    fn invalidate_all(&self, component: ComponentId);
}

struct Entry {
    component: ComponentId,
    priority: u8,
    action: Option<Action>,
    render: Option<RenderAfter>,
}

/// In-memory callback registry
#[derive(Default)]
pub struct MemoryCallbacks {
    next_id: AtomicU64,
    entries: DashMap<CallbackHandle, Entry>,
}

impl MemoryCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, handle: &str) -> bool {
        self.entries.contains_key(&CallbackHandle(handle.to_string()))
    }

    /// Handles currently registered by `component`
    pub fn handles_of(&self, component: ComponentId) -> Vec<CallbackHandle> {
        let mut handles: Vec<CallbackHandle> = self
            .entries
            .iter()
            .filter(|e| e.value().component == component)
            .map(|e| e.key().clone())
            .collect();
        handles.sort_by(|a, b| a.0.cmp(&b.0));
        handles
    }

    /// Run one callback
    pub fn invoke(
        &self,
        handle: &str,
        value: Submitted,
    ) -> Result<Option<RenderAfter>, ActionError> {
        let key = CallbackHandle(handle.to_string());
        let (action, render) = {
            let entry = self
                .entries
                .get(&key)
                .ok_or_else(|| ActionError::UnknownHandle {
                    handle: handle.to_string(),
                })?;
            (entry.action.clone(), entry.render.clone())
        };
        // The entry guard is released before running user code
        if let Some(action) = action {
            action(value)?;
        }
        Ok(render)
    }

    /// Run the callbacks named by the parameters of a submitted request, in
    /// priority order. Unknown parameters are ignored. Returns the last
    /// render-after step found.
    pub fn process(
        &self,
        params: &[(&str, Submitted)],
    ) -> Result<Option<RenderAfter>, ActionError> {
        let mut calls: Vec<(u8, u64, &str, &Submitted)> = Vec::new();
        for (name, value) in params {
            let key = CallbackHandle(name.to_string());
            if let Some(entry) = self.entries.get(&key) {
                calls.push((entry.priority, sequence_of(name), *name, value));
            }
        }
        calls.sort_by_key(|(priority, seq, _, _)| (*priority, *seq));

        let mut render = None;
        for (_, _, name, value) in calls {
            if let Some(r) = self.invoke(name, value.clone())? {
                render = Some(r);
            }
        }
        Ok(render)
    }

    /// Produce the response of an image callback
    pub fn generate(&self, handle: &str) -> Result<GeneratedResponse, ActionError> {
        match self.invoke(handle, Submitted::None)? {
            Some(RenderAfter::Image(generator)) => Ok(GeneratedResponse::image(generator()?)),
            _ => Err(ActionError::Failed(format!(
                "callback '{}' does not generate a response",
                handle
            ))),
        }
    }
}

fn sequence_of(handle: &str) -> u64 {
    let digits = handle.len().saturating_sub(8);
    handle
        .get(digits..)
        .and_then(|s| s.parse().ok())
        .unwrap_or(u64::MAX)
}

impl CallbackRegistry for MemoryCallbacks {
    fn register(
        &self,
        component: ComponentId,
        priority: u8,
        action: Option<Action>,
        render: Option<RenderAfter>,
    ) -> CallbackHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let handle = CallbackHandle(format!("_action{}{:08}", priority, id));
        tracing::debug!("registered {} for component {}", handle, component);
        self.entries.insert(
            handle.clone(),
            Entry {
                component,
                priority,
                action,
                render,
            },
        );
        handle
    }

    fn invalidate_all(&self, component: ComponentId) {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.component != component);
        tracing::debug!(
            "invalidated {} callbacks of component {}",
            before - self.entries.len(),
            component
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_register_and_invalidate() {
        let callbacks = MemoryCallbacks::new();
        let c1 = ComponentId(1);
        let h1 = callbacks.register(c1, 1, None, None);
        let h2 = callbacks.register(ComponentId(2), 4, None, None);
        assert_ne!(h1, h2);
        assert!(h1.as_str().starts_with("_action1"));

        callbacks.invalidate_all(c1);
        callbacks.invalidate_all(c1);
        assert!(!callbacks.contains(h1.as_str()));
        assert!(callbacks.contains(h2.as_str()));
    }

    #[test]
    fn test_process_in_priority_order() {
        let callbacks = MemoryCallbacks::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let l = log.clone();
        let submit = callbacks.register(
            ComponentId(1),
            4,
            Some(action(move |_| {
                l.lock().unwrap().push("submit".to_string());
                Ok(())
            })),
            None,
        );
        let l = log.clone();
        let field = callbacks.register(
            ComponentId(1),
            1,
            Some(action(move |v| {
                l.lock().unwrap().push(format!("field={:?}", v));
                Ok(())
            })),
            None,
        );

        callbacks
            .process(&[
                (submit.as_str(), Submitted::None),
                (field.as_str(), "x".into()),
                ("other", Submitted::None),
            ])
            .unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["field=Value(\"x\")".to_string(), "submit".to_string()]
        );
    }

    #[test]
    fn test_unknown_handle() {
        let callbacks = MemoryCallbacks::new();
        assert!(matches!(
            callbacks.invoke("_action100000000", Submitted::None),
            Err(ActionError::UnknownHandle { .. })
        ));
    }

    #[test]
    fn test_image_content_type() {
        let png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert_eq!(GeneratedResponse::image(png).content_type, "image/png");
        assert_eq!(GeneratedResponse::image(b"not an image".to_vec()).content_type, "image/*");
    }
}
