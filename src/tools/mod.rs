//! Tool registry and definitions.
//!
//! Provides the infrastructure for registering and dispatching MCP tools.

pub mod collections;
pub mod repository;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::client::{ApiClient, ApiResponse};
use crate::error::{McpError, Result};

/// A tool definition for the MCP tools/list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    /// Tool name (e.g., "list_controls")
    pub name: String,
    /// Tool description
    pub description: String,
    /// JSON Schema for the input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: JsonValue,
}

impl ToolDef {
    /// Create a new tool definition.
    pub fn new(name: &str, description: &str, input_schema: JsonValue) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}

/// Registry of all available tools.
pub struct ToolRegistry {
    tools: Vec<ToolDef>,
}

impl ToolRegistry {
    /// Create a new registry with all tools registered.
    pub fn new() -> Self {
        let mut tools = Vec::new();

        tools.extend(collections::tools());
        tools.extend(repository::tools());

        Self { tools }
    }

    /// Get all tool definitions.
    pub fn tools(&self) -> &[ToolDef] {
        &self.tools
    }

    /// Dispatch a tool call to the appropriate handler.
    ///
    /// Argument problems are returned as `Err`; upstream failures come back
    /// as `Ok(ApiResponse::Failure(..))`.
    pub async fn dispatch(
        &self,
        client: &ApiClient,
        name: &str,
        args: Map<String, JsonValue>,
    ) -> Result<ApiResponse> {
        if name == repository::FRAMEWORK_SCOPES_TOOL {
            repository::dispatch(client, name, args).await
        } else if let Some(collection) = collections::find(name) {
            collections::dispatch(client, collection, args).await
        } else {
            Err(McpError::UnknownTool(name.to_string()))
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper macro for creating JSON Schema for tool input parameters.
///
/// Each property is written `"name": type => "description"`.
#[macro_export]
macro_rules! schema {
    // Object with required and optional properties
    (object {
        required: { $($req_name:literal : $req_type:tt => $req_desc:expr),* $(,)? },
        optional: { $($opt_name:literal : $opt_type:tt => $opt_desc:expr),* $(,)? }
    }) => {{
        let mut required = Vec::new();
        $(required.push($req_name);)*

        let mut props = serde_json::Map::new();
        $(props.insert($req_name.to_string(), $crate::schema!(@prop $req_type, $req_desc));)*
        $(props.insert($opt_name.to_string(), $crate::schema!(@prop $opt_type, $opt_desc));)*

        serde_json::json!({
            "type": "object",
            "properties": props,
            "required": required
        })
    }};

    // Object with only optional properties
    (object {
        optional: { $($opt_name:literal : $opt_type:tt => $opt_desc:expr),* $(,)? }
    }) => {{
        let mut props = serde_json::Map::new();
        $(props.insert($opt_name.to_string(), $crate::schema!(@prop $opt_type, $opt_desc));)*

        serde_json::json!({
            "type": "object",
            "properties": props,
            "required": []
        })
    }};

    (@prop $type:tt, $desc:expr) => {{
        let mut prop = $crate::schema!(@type $type);
        prop["description"] = serde_json::Value::String($desc.to_string());
        prop
    }};

    // Type mappings
    (@type string) => { serde_json::json!({"type": "string"}) };
    (@type integer) => { serde_json::json!({"type": "integer"}) };
    (@type boolean) => { serde_json::json!({"type": "boolean"}) };
    (@type string_or_integer) => { serde_json::json!({"type": ["string", "integer"]}) };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lists_all_tools() {
        let registry = ToolRegistry::new();
        let names: Vec<&str> = registry.tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names.len(), 11);
        assert!(names.contains(&"list_controls"));
        assert!(names.contains(&"list_tprm_vendors"));
        assert!(names.contains(&"list_repository_framework_scopes"));
    }

    #[test]
    fn test_tool_names_unique() {
        let registry = ToolRegistry::new();
        let mut names: Vec<&str> = registry.tools().iter().map(|t| t.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), registry.tools().len());
    }

    #[test]
    fn test_schema_macro() {
        let schema = schema!(object {
            required: { "id": string => "Identifier" },
            optional: { "flag": boolean => "A flag" }
        });
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], serde_json::json!(["id"]));
        assert_eq!(schema["properties"]["id"]["type"], "string");
        assert_eq!(schema["properties"]["flag"]["description"], "A flag");
    }

    #[test]
    fn test_tool_def_serializes_input_schema_camel_case() {
        let def = ToolDef::new("t", "d", serde_json::json!({}));
        let json = serde_json::to_value(&def).unwrap();
        assert!(json.get("inputSchema").is_some());
    }
}
