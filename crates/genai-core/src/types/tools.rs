//! Tool declarations and the callable-tool seam used by automatic function calling.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::content::{FunctionCall, Part};
use crate::errors::Result;

// ─────────────────────────────────────────────────────────────────────────────
// Declarations
// ─────────────────────────────────────────────────────────────────────────────

/// A function the model may call.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDeclaration {
    /// Function name; unique within one request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// What the function does.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// OpenAPI-style parameter schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    /// JSON Schema for the parameters; alternative to `parameters`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters_json_schema: Option<Value>,
    /// Schema of the returned value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    /// `BLOCKING` or `NON_BLOCKING` (direct backend only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub behavior: Option<String>,
}

impl FunctionDeclaration {
    /// Declaration with a name, description and parameter schema.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: Some(name.into()),
            description: Some(description.into()),
            parameters: Some(parameters),
            ..Self::default()
        }
    }
}

/// A tool made of function declarations and/or built-in capabilities.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// Caller functions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_declarations: Option<Vec<FunctionDeclaration>>,
    /// Search grounding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_search: Option<Value>,
    /// Legacy search-retrieval grounding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_search_retrieval: Option<Value>,
    /// Built-in code execution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_execution: Option<Value>,
    /// URL context retrieval.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_context: Option<Value>,
    /// Data-store retrieval (managed backend only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrieval: Option<Value>,
    /// Enterprise web search (managed backend only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enterprise_web_search: Option<Value>,
}

impl Tool {
    /// A tool wrapping function declarations.
    #[must_use]
    pub fn functions(declarations: Vec<FunctionDeclaration>) -> Self {
        Self {
            function_declarations: Some(declarations),
            ..Self::default()
        }
    }
}

/// Function-calling mode and allow-list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCallingConfig {
    /// `AUTO`, `ANY`, `NONE` or `VALIDATED`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Functions the model may call when `mode` is `ANY`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_function_names: Option<Vec<String>>,
}

/// Tool configuration shared by all tools in a request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolConfig {
    /// Function-calling settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_calling_config: Option<FunctionCallingConfig>,
    /// Retrieval settings (lat/lng, language).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrieval_config: Option<Value>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Callable tools
// ─────────────────────────────────────────────────────────────────────────────

/// A caller-supplied tool the automatic function-calling loop may invoke.
#[async_trait]
pub trait CallableTool: Send + Sync {
    /// Declaration sent to the model.
    fn declaration(&self) -> Tool;

    /// Execute the given calls, returning one function-response part per call.
    async fn call_tool(&self, calls: &[FunctionCall]) -> Result<Vec<Part>>;
}

/// A tool entry in a request: either a plain declaration or a callable tool whose
/// declaration is sent and whose calls may be executed automatically.
#[derive(Clone)]
pub enum ToolUnion {
    /// Declaration only; function calls are returned to the caller.
    Declarative(Tool),
    /// Declaration plus an implementation.
    Callable(Arc<dyn CallableTool>),
}

impl ToolUnion {
    /// The declaration sent on the wire.
    #[must_use]
    pub fn declaration(&self) -> Tool {
        match self {
            Self::Declarative(tool) => tool.clone(),
            Self::Callable(callable) => callable.declaration(),
        }
    }

    /// The callable implementation, if any.
    #[must_use]
    pub fn as_callable(&self) -> Option<&Arc<dyn CallableTool>> {
        match self {
            Self::Declarative(_) => None,
            Self::Callable(c) => Some(c),
        }
    }
}

impl From<Tool> for ToolUnion {
    fn from(tool: Tool) -> Self {
        Self::Declarative(tool)
    }
}

impl fmt::Debug for ToolUnion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declarative(tool) => f.debug_tuple("Declarative").field(tool).finish(),
            Self::Callable(c) => f.debug_tuple("Callable").field(&c.declaration()).finish(),
        }
    }
}

impl Serialize for ToolUnion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.declaration().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ToolUnion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Tool::deserialize(deserializer).map(Self::Declarative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl CallableTool for Echo {
        fn declaration(&self) -> Tool {
            Tool::functions(vec![FunctionDeclaration::new("echo", "Echo", json!({}))])
        }

        async fn call_tool(&self, calls: &[FunctionCall]) -> Result<Vec<Part>> {
            Ok(calls
                .iter()
                .map(|c| Part::function_response("echo", c.args.clone().unwrap_or_default()))
                .collect())
        }
    }

    #[test]
    fn callable_serializes_as_declaration() {
        let tool = ToolUnion::Callable(Arc::new(Echo));
        let json = serde_json::to_value(&tool).unwrap();
        assert_eq!(json["functionDeclarations"][0]["name"], "echo");
    }

    #[test]
    fn deserializes_as_declarative() {
        let tool: ToolUnion = serde_json::from_value(json!({"codeExecution": {}})).unwrap();
        assert!(tool.as_callable().is_none());
        assert!(tool.declaration().code_execution.is_some());
    }
}
