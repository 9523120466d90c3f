//! Session collaborator: where the session and continuation ids come from.

use crate::kinds::TagKind;
use crate::node::Node;

/// The parts of the incoming request the renderer hands to the session store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
    pub path: String,
    pub params: Vec<(String, String)>,
}

/// The parts of the outgoing response the session store may update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
}

pub trait SessionStore {
    /// Hidden `<input>`s carrying the session state of a form
    fn hidden_fields(&self, request: &Request, response: &Response) -> Vec<Node>;

    /// `key=value` query parameters carrying the session state of a url
    fn query_params(&self, request: &Request, response: &Response) -> Vec<String>;
}

/// A session identified by a fixed session id and continuation id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIds {
    pub session_id: String,
    pub continuation_id: String,
}

impl SessionIds {
    pub const SESSION_PARAM: &'static str = "_s";
    pub const CONTINUATION_PARAM: &'static str = "_c";

    pub fn new(session_id: impl Into<String>, continuation_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            continuation_id: continuation_id.into(),
        }
    }

    fn pairs(&self) -> [(&'static str, &str); 2] {
        [
            (Self::SESSION_PARAM, self.session_id.as_str()),
            (Self::CONTINUATION_PARAM, self.continuation_id.as_str()),
        ]
    }
}

impl SessionStore for SessionIds {
    fn hidden_fields(&self, _request: &Request, _response: &Response) -> Vec<Node> {
        self.pairs()
            .iter()
            .map(|(name, value)| {
                Node::new("input", TagKind::HiddenInput)
                    .with("type", "hidden")
                    .with("name", *name)
                    .with("value", *value)
            })
            .collect()
    }

    fn query_params(&self, _request: &Request, _response: &Response) -> Vec<String> {
        self.pairs()
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids() {
        let ids = SessionIds::new("42", "7");
        let (req, resp) = (Request::default(), Response::default());
        assert_eq!(ids.query_params(&req, &resp), vec!["_s=42", "_c=7"]);

        let fields = ids.hidden_fields(&req, &resp);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[1].to_html(), "<input type=\"hidden\" name=\"_c\" value=\"7\">");
    }
}
