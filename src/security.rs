//! Permission checks wrapped around actions.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::callbacks::{Action, Submitted};
use crate::component::ComponentId;
use crate::error::ActionError;

/// Whose permissions are checked when an action runs
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Subject {
    Component(ComponentId),
    Named(String),
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Component(id) => write!(f, "{}", id),
            Subject::Named(name) => f.write_str(name),
        }
    }
}

impl From<ComponentId> for Subject {
    fn from(id: ComponentId) -> Self {
        Subject::Component(id)
    }
}

/// Permission collaborator
pub trait Security: Send + Sync {
    fn has_permission(&self, permission: &str, subject: &Subject) -> bool;
}

/// Wrap `action` so it only runs when `subject` holds every permission
pub fn guard(
    security: Arc<dyn Security>,
    permissions: &[String],
    subject: Subject,
    action: Action,
) -> Action {
    let permissions = permissions.to_vec();
    Arc::new(move |value: Submitted| {
        if permissions
            .iter()
            .all(|p| security.has_permission(p, &subject))
        {
            action(value)
        } else {
            tracing::debug!("permission denied for {}: {:?}", subject, permissions);
            Err(ActionError::PermissionDenied {
                subject: subject.to_string(),
                permissions: permissions.clone(),
            })
        }
    })
}

/// Fixed table of granted permissions
#[derive(Debug, Clone, Default)]
pub struct GrantTable {
    grants: HashMap<Subject, HashSet<String>>,
}

impl GrantTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(mut self, subject: impl Into<Subject>, permission: &str) -> Self {
        self.grants
            .entry(subject.into())
            .or_default()
            .insert(permission.to_string());
        self
    }
}

impl Security for GrantTable {
    fn has_permission(&self, permission: &str, subject: &Subject) -> bool {
        self.grants
            .get(subject)
            .map(|granted| granted.contains(permission))
            .unwrap_or(false)
    }
}
