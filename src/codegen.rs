//! Client-side code generation.
//!
//! Server code never runs in the browser: functions meant for the client are
//! described as [`ClientFunction`]s and transcoded by a [`CodeGenerator`].

use serde::{Deserialize, Serialize};

/// A function to be executed by the browser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientFunction {
    pub name: String,
    pub params: Vec<String>,
    pub body: String,
}

impl ClientFunction {
    pub fn new(name: impl Into<String>, params: &[&str], body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: params.iter().map(|p| p.to_string()).collect(),
            body: body.into(),
        }
    }
}

/// Executable client-side code, already transcoded
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeneratedCode(pub String);

impl GeneratedCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GeneratedCode {
    fn from(code: &str) -> Self {
        GeneratedCode(code.to_string())
    }
}

/// Code-generation collaborator
pub trait CodeGenerator {
    /// Transcode a function into executable client code
    fn transcode(&self, function: &ClientFunction) -> GeneratedCode;

    /// Expression invoking `code` from an element attribute, bound to the
    /// renderer identified by `renderer_id`
    fn invocation(&self, code: &GeneratedCode, renderer_id: &str) -> String;

    /// Script the transcoded code depends on, if any
    fn runtime_url(&self) -> Option<&str> {
        None
    }
}

/// Plain javascript generator
#[derive(Debug, Clone, Default)]
pub struct JsCodeGenerator {
    runtime_url: Option<String>,
}

impl JsCodeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generator whose transcoded code needs `url` loaded first
    pub fn with_runtime(url: impl Into<String>) -> Self {
        Self {
            runtime_url: Some(url.into()),
        }
    }
}

impl CodeGenerator for JsCodeGenerator {
    fn transcode(&self, function: &ClientFunction) -> GeneratedCode {
        GeneratedCode(format!(
            "function {}({}) {{{}}}",
            function.name,
            function.params.join(", "),
            function.body
        ))
    }

    fn invocation(&self, code: &GeneratedCode, renderer_id: &str) -> String {
        let code = code.as_str().trim();
        if code.starts_with("function") {
            let id = serde_json::Value::String(renderer_id.to_string());
            format!("return ({}).call(this, {});", code, id)
        } else {
            code.to_string()
        }
    }

    fn runtime_url(&self) -> Option<&str> {
        self.runtime_url.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcode() {
        let f = ClientFunction::new("greet", &["who"], "alert(who);");
        let code = JsCodeGenerator::new().transcode(&f);
        assert_eq!(code.as_str(), "function greet(who) {alert(who);}");
    }

    #[test]
    fn test_invocation() {
        let gen = JsCodeGenerator::new();
        assert_eq!(gen.invocation(&"alert(1)".into(), "id1"), "alert(1)");
        assert_eq!(
            gen.invocation(&"function f() {}".into(), "id1"),
            "return (function f() {}).call(this, \"id1\");"
        );
    }
}
