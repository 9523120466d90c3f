use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

/// Failures raised while building or rendering a tag tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Unsupported value kind '{kind}' for attribute '{attribute}' of <{tag}>")]
    UnsupportedValueKind {
        tag: String,
        attribute: String,
        kind: String,
    },

    #[error("Permissions given without a subject and no component is being rendered")]
    MissingSubject,

    #[error("<{tag}> cannot carry an action")]
    NotActionable { tag: String },

    #[error("<{tag}> has no selection state")]
    NotSelectable { tag: String },

    #[error("Nothing is being rendered: '{operation}' needs a current component")]
    NoCurrentComponent { operation: String },

    #[error("No asynchronous frame encloses '{frame}': the update needs an explicit target")]
    NoAsyncFrame { frame: String },

    #[error("XML parse error: {0}")]
    XmlError(String),

    #[error("Empty document: no elements found")]
    EmptyDocument,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("I/O error on '{path}': {message}")]
    IoError { path: String, message: String },
}

impl From<roxmltree::Error> for RenderError {
    fn from(err: roxmltree::Error) -> Self {
        RenderError::XmlError(err.to_string())
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for RenderError {
    fn from(err: serde_yaml::Error) -> Self {
        RenderError::ConfigError(err.to_string())
    }
}

impl From<std::fmt::Error> for RenderError {
    fn from(err: std::fmt::Error) -> Self {
        RenderError::SerializationError(err.to_string())
    }
}

/// Failures raised when a registered callback is invoked.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    #[error("Permission denied: '{subject}' lacks {permissions:?}")]
    PermissionDenied {
        subject: String,
        permissions: Vec<String>,
    },

    #[error("Unknown callback handle '{handle}'")]
    UnknownHandle { handle: String },

    #[error("Action failed: {0}")]
    Failed(String),
}
