//! Repository-scoped tools.
//!
//! Tools: list_repository_framework_scopes

use reqwest::Url;
use serde_json::{Map, Value as JsonValue};

use crate::client::{ApiClient, ApiResponse};
use crate::convert::{get_optional_bool, get_string_arg};
use crate::error::{McpError, Result};
use crate::schema;
use crate::tools::collections::relationship_params;
use crate::tools::ToolDef;

/// Name of the framework scopes tool.
pub const FRAMEWORK_SCOPES_TOOL: &str = "list_repository_framework_scopes";

/// Get all repository tool definitions.
pub fn tools() -> Vec<ToolDef> {
    vec![ToolDef::new(
        FRAMEWORK_SCOPES_TOOL,
        "List framework scopes for a repository",
        schema!(object {
            required: { "repository_id": string_or_integer => "ID of the repository" },
            optional: {
                "include_relationships": boolean => "Include relationship data (default: false)",
            }
        }),
    )]
}

/// Upstream path of a repository's framework asset scopes.
///
/// The id is percent-encoded as a single path segment, so `/`, `?` or `#`
/// inside it cannot change which URL is requested.
pub fn framework_scopes_path(repository_id: &str) -> Result<String> {
    let mut url = Url::parse("http://localhost/").map_err(|e| McpError::Internal(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| McpError::Internal("URL cannot carry a path".to_string()))?
        .clear()
        .extend(["repositories", repository_id, "framework_asset_scopes"]);
    Ok(url.path().to_string())
}

/// Dispatch a repository tool call.
pub async fn dispatch(
    client: &ApiClient,
    name: &str,
    args: Map<String, JsonValue>,
) -> Result<ApiResponse> {
    match name {
        FRAMEWORK_SCOPES_TOOL => {
            let repository_id = get_string_arg(&args, "repository_id")?;
            let include = get_optional_bool(&args, "include_relationships")?.unwrap_or(false);

            let path = framework_scopes_path(&repository_id)?;
            Ok(client.get(&path, &relationship_params(include)).await)
        }

        _ => Err(McpError::UnknownTool(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framework_scopes_path() {
        assert_eq!(
            framework_scopes_path("r-42").unwrap(),
            "/repositories/r-42/framework_asset_scopes"
        );
    }

    #[test]
    fn test_framework_scopes_path_encodes_id() {
        assert_eq!(
            framework_scopes_path("a/b?c#d").unwrap(),
            "/repositories/a%2Fb%3Fc%23d/framework_asset_scopes"
        );
    }

    #[test]
    fn test_schema_requires_repository_id() {
        let tools = tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(
            tools[0].input_schema["required"],
            serde_json::json!(["repository_id"])
        );
        assert!(tools[0].input_schema["properties"].get("page").is_none());
    }
}
