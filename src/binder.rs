//! Binding server actions on the action-capable elements.

use std::sync::Arc;

use crate::callbacks::{action, Action, ImageGenerator, RenderAfter, Submitted};
use crate::error::{RenderError, RenderResult};
use crate::kinds::{
    ActionRecord, TagKind, PRIORITY_ASYNC_LINK, PRIORITY_GENERATED, PRIORITY_PRE_ACTION,
    PRIORITY_PRE_SUBMIT,
};
use crate::node::Node;
use crate::render::{RenderMode, Renderer};
use crate::security::{guard, Subject};
use crate::update::UpdateDirective;

/// What can be bound on an element
#[derive(Clone)]
pub enum Bindable {
    /// Server action, run when the element is submitted or clicked
    Action(Action),
    /// Action followed by a partial re-rendering
    Update(UpdateDirective),
    /// Generator of the data of an `<img>`
    Image(ImageGenerator),
}

impl From<Action> for Bindable {
    fn from(action: Action) -> Self {
        Bindable::Action(action)
    }
}

impl From<UpdateDirective> for Bindable {
    fn from(update: UpdateDirective) -> Self {
        Bindable::Update(update)
    }
}

impl Bindable {
    fn map_action(self, f: impl FnOnce(Action) -> Action) -> Self {
        match self {
            Bindable::Action(a) => Bindable::Action(f(a)),
            Bindable::Update(u) => Bindable::Update(u.map_action(f)),
            image => image,
        }
    }
}

/// Bind `bindable` on `node`, protected by `permissions` when given
pub(crate) fn bind(
    h: &Renderer,
    node: &mut Node,
    bindable: Bindable,
    permissions: Option<&[String]>,
    subject: Option<Subject>,
) -> RenderResult<()> {
    let record = node
        .kind()
        .action_record()
        .ok_or_else(|| not_actionable(node))?;

    let bindable = match node.kind() {
        TagKind::TextArea => bindable.map_action(strip_carriage_returns),
        TagKind::Select if node.has("multiple") => bindable.map_action(always_list),
        _ => bindable,
    };
    let bindable = match permissions {
        Some(permissions) => {
            let subject = subject
                .or_else(|| h.current_component().map(Subject::Component))
                .ok_or(RenderError::MissingSubject)?;
            let security = h.security();
            bindable.map_action(|a| guard(security, permissions, subject, a))
        }
        None => bindable,
    };

    match bindable {
        Bindable::Image(generator) if node.kind() == TagKind::Img => bind_image(h, node, generator),
        Bindable::Image(_) => Err(not_actionable(node)),
        _ if node.kind() == TagKind::Img => Err(not_actionable(node)),
        Bindable::Update(update) => bind_async(h, node, record, update),
        Bindable::Action(a) if h.mode() == RenderMode::Async && record.async_via_update => {
            bind_async(h, node, record, UpdateDirective::new().with_action(a))
        }
        Bindable::Action(a) => bind_sync(h, node, record, a),
    }
}

fn bind_sync(
    h: &Renderer,
    node: &mut Node,
    record: ActionRecord,
    action: Action,
) -> RenderResult<()> {
    let handle = h.register_callback(record.priority, Some(action), None)?;
    if node.kind() == TagKind::Anchor {
        let href = node.get("href").unwrap_or("");
        let (url, fragment) = match href.find('#') {
            Some(i) => href.split_at(i),
            None => (href, ""),
        };
        let href = h.add_session_id_to_url(url, &[handle.to_string()], None) + fragment;
        node.set("href", href);
    } else {
        node.set(record.sync_attribute, handle.to_string());
    }
    Ok(())
}

fn bind_async(
    h: &Renderer,
    node: &mut Node,
    record: ActionRecord,
    update: UpdateDirective,
) -> RenderResult<()> {
    if node.kind() == TagKind::Anchor {
        node.set("href", "#");
        node.set("onclick", update.generate_action(PRIORITY_ASYNC_LINK, h)?);
    } else {
        node.set(record.async_attribute, update.generate_action(record.priority, h)?);
    }
    Ok(())
}

fn bind_image(h: &Renderer, node: &mut Node, generator: ImageGenerator) -> RenderResult<()> {
    let handle =
        h.register_callback(PRIORITY_GENERATED, None, Some(RenderAfter::Image(generator)))?;
    node.set("src", h.add_session_id_to_url("", &[handle.to_string()], Some(";")));
    Ok(())
}

/// Register `action` to run before the field actions of `form`
pub(crate) fn pre_action(h: &Renderer, form: &mut Node, action: Action) -> RenderResult<()> {
    form_hook(h, form, PRIORITY_PRE_ACTION, action)
}

/// Register `action` to run after the field actions of `form`, before its submit action
pub(crate) fn post_action(h: &Renderer, form: &mut Node, action: Action) -> RenderResult<()> {
    form_hook(h, form, PRIORITY_PRE_SUBMIT, action)
}

fn form_hook(h: &Renderer, form: &mut Node, priority: u8, action: Action) -> RenderResult<()> {
    if form.kind() != TagKind::Form {
        return Err(not_actionable(form));
    }
    let handle = h.register_callback(priority, Some(action), None)?;
    let input = Node::new("input", TagKind::HiddenInput)
        .with("type", "hidden")
        .with("name", handle.to_string());
    form.push(Node::generic("div").child(input));
    Ok(())
}

fn not_actionable(node: &Node) -> RenderError {
    RenderError::NotActionable {
        tag: node.tag().to_string(),
    }
}

fn strip_carriage_returns(inner: Action) -> Action {
    action(move |value| {
        let value = match value {
            Submitted::Value(v) => Submitted::Value(v.replace('\r', "")),
            Submitted::Values(vs) => {
                Submitted::Values(vs.into_iter().map(|v| v.replace('\r', "")).collect())
            }
            Submitted::None => Submitted::None,
        };
        inner(value)
    })
}

fn always_list(inner: Action) -> Action {
    Arc::new(move |value| {
        let values = match value {
            Submitted::None => Vec::new(),
            Submitted::Value(v) => vec![v],
            Submitted::Values(vs) => vs,
        };
        inner(Submitted::Values(values))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recorder() -> (Action, Arc<Mutex<Vec<Submitted>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let r = received.clone();
        (
            action(move |v| {
                r.lock().unwrap().push(v);
                Ok(())
            }),
            received,
        )
    }

    #[test]
    fn test_textarea_strips_carriage_returns() {
        let (inner, received) = recorder();
        strip_carriage_returns(inner)("a\r\nb".into()).unwrap();
        assert_eq!(*received.lock().unwrap(), vec![Submitted::from("a\nb")]);
    }

    #[test]
    fn test_select_multiple_always_list() {
        let (inner, received) = recorder();
        let wrapped = always_list(inner);
        wrapped("a".into()).unwrap();
        wrapped(vec!["a", "b"].into()).unwrap();
        wrapped(Submitted::None).unwrap();
        assert_eq!(
            *received.lock().unwrap(),
            vec![
                Submitted::from(vec!["a"]),
                Submitted::from(vec!["a", "b"]),
                Submitted::Values(vec![]),
            ]
        );
    }
}
