//! Paginated resource collection tools.
//!
//! Tools: list_controls, list_tests, list_users, list_devices, list_frameworks,
//!        list_vendors, list_tprm_vendors, list_integration_connections,
//!        list_user_accounts, list_repositories

use serde_json::{Map, Value as JsonValue};

use crate::client::{ApiClient, ApiResponse, QueryParams};
use crate::convert::{get_optional_bool, get_optional_string, get_optional_i64};
use crate::error::Result;
use crate::schema;
use crate::tools::ToolDef;

/// Page requested when the caller does not pass `page`.
pub const DEFAULT_PAGE: i64 = 1;
/// Page size requested when the caller does not pass `per_page`.
pub const DEFAULT_PER_PAGE: i64 = 100;

/// A REST collection exposed as a list tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collection {
    /// Tool name.
    pub tool: &'static str,
    /// Upstream path, relative to the base URL.
    pub path: &'static str,
    /// Tool description.
    pub description: &'static str,
    /// Plural noun used in the search parameter description.
    pub noun: &'static str,
}

/// Every collection tool, in the order they are listed.
pub const COLLECTIONS: &[Collection] = &[
    Collection {
        tool: "list_controls",
        path: "/controls",
        description: "List security controls with filtering support",
        noun: "controls",
    },
    Collection {
        tool: "list_tests",
        path: "/tests",
        description: "List compliance tests with filtering support",
        noun: "tests",
    },
    Collection {
        tool: "list_users",
        path: "/users",
        description: "List users with filtering support",
        noun: "users",
    },
    Collection {
        tool: "list_devices",
        path: "/devices",
        description: "List devices with filtering support",
        noun: "devices",
    },
    Collection {
        tool: "list_frameworks",
        path: "/frameworks",
        description: "List compliance frameworks with filtering support",
        noun: "frameworks",
    },
    Collection {
        tool: "list_vendors",
        path: "/vendors",
        description: "List vendors (legacy) with filtering support",
        noun: "vendors",
    },
    Collection {
        tool: "list_tprm_vendors",
        path: "/tprm/vendors",
        description: "List third-party risk management (TPRM) vendors with filtering support",
        noun: "vendors",
    },
    Collection {
        tool: "list_integration_connections",
        path: "/integration_connections",
        description: "List integration connections with filtering support",
        noun: "connections",
    },
    Collection {
        tool: "list_user_accounts",
        path: "/user_accounts",
        description: "List user accounts with filtering support",
        noun: "accounts",
    },
    Collection {
        tool: "list_repositories",
        path: "/repositories",
        description: "List repositories with filtering support",
        noun: "repositories",
    },
];

/// Look up a collection by tool name.
pub fn find(tool: &str) -> Option<&'static Collection> {
    COLLECTIONS.iter().find(|c| c.tool == tool)
}

/// Get all collection tool definitions.
pub fn tools() -> Vec<ToolDef> {
    COLLECTIONS
        .iter()
        .map(|c| {
            ToolDef::new(
                c.tool,
                c.description,
                schema!(object {
                    optional: {
                        "page": integer => "Page number for pagination (default: 1)",
                        "per_page": integer => "Items per page (default: 100)",
                        "search_query": string =>
                            format!("Lucene search query to filter {}", c.noun),
                        "include_relationships": boolean =>
                            "Include relationship data (default: false)",
                    }
                }),
            )
        })
        .collect()
}

/// Parsed arguments of a collection tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    /// Page number.
    pub page: i64,
    /// Items per page.
    pub per_page: i64,
    /// Free-text filter, forwarded as `q`.
    pub search_query: Option<String>,
    /// Request embedded related entities.
    pub include_relationships: bool,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
            search_query: None,
            include_relationships: false,
        }
    }
}

impl ListParams {
    /// Extract parameters from tool arguments, applying defaults.
    pub fn from_args(args: &Map<String, JsonValue>) -> Result<Self> {
        Ok(Self {
            page: get_optional_i64(args, "page")?.unwrap_or(DEFAULT_PAGE),
            per_page: get_optional_i64(args, "per_page")?.unwrap_or(DEFAULT_PER_PAGE),
            // An empty query filters nothing, so it is not sent.
            search_query: get_optional_string(args, "search_query")?.filter(|q| !q.is_empty()),
            include_relationships: get_optional_bool(args, "include_relationships")?
                .unwrap_or(false),
        })
    }

    /// Query string parameters for the upstream request.
    pub fn to_query(&self) -> QueryParams {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("per_page", self.per_page.to_string()),
        ];
        if let Some(q) = &self.search_query {
            params.push(("q", q.clone()));
        }
        params.extend(relationship_params(self.include_relationships));
        params
    }
}

/// `relationships=true&include=true` when requested, nothing otherwise.
pub fn relationship_params(include_relationships: bool) -> QueryParams {
    if include_relationships {
        vec![
            ("relationships", "true".to_string()),
            ("include", "true".to_string()),
        ]
    } else {
        Vec::new()
    }
}

/// Dispatch a collection tool call.
pub async fn dispatch(
    client: &ApiClient,
    collection: &Collection,
    args: Map<String, JsonValue>,
) -> Result<ApiResponse> {
    let params = ListParams::from_args(&args)?;
    tracing::debug!(tool = collection.tool, ?params, "list collection");
    Ok(client.get(collection.path, &params.to_query()).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: JsonValue) -> Map<String, JsonValue> {
        match value {
            JsonValue::Object(m) => m,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_defaults() {
        let params = ListParams::from_args(&Map::new()).unwrap();
        assert_eq!(params, ListParams::default());
        assert_eq!(
            params.to_query(),
            vec![("page", "1".to_string()), ("per_page", "100".to_string())]
        );
    }

    #[test]
    fn test_all_params() {
        let params = ListParams::from_args(&args(json!({
            "page": 2,
            "per_page": 10,
            "search_query": "name:SOC*",
            "include_relationships": true
        })))
        .unwrap();
        assert_eq!(
            params.to_query(),
            vec![
                ("page", "2".to_string()),
                ("per_page", "10".to_string()),
                ("q", "name:SOC*".to_string()),
                ("relationships", "true".to_string()),
                ("include", "true".to_string()),
            ]
        );
    }

    #[test]
    fn test_relationships_false_adds_nothing() {
        let params =
            ListParams::from_args(&args(json!({"include_relationships": false}))).unwrap();
        let keys: Vec<&str> = params.to_query().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["page", "per_page"]);
    }

    #[test]
    fn test_empty_search_query_is_dropped() {
        let params = ListParams::from_args(&args(json!({"search_query": ""}))).unwrap();
        assert_eq!(params.search_query, None);
    }

    #[test]
    fn test_out_of_range_pages_are_forwarded() {
        let params = ListParams::from_args(&args(json!({"page": -1, "per_page": 2.0}))).unwrap();
        assert_eq!(
            params.to_query(),
            vec![("page", "-1".to_string()), ("per_page", "2".to_string())]
        );
    }

    #[test]
    fn test_invalid_page() {
        assert!(ListParams::from_args(&args(json!({"page": "first"}))).is_err());
    }

    #[test]
    fn test_find() {
        assert_eq!(find("list_tprm_vendors").unwrap().path, "/tprm/vendors");
        assert_eq!(
            find("list_integration_connections").unwrap().path,
            "/integration_connections"
        );
        assert!(find("list_repository_framework_scopes").is_none());
        assert!(find("delete_controls").is_none());
    }

    #[test]
    fn test_tool_schemas() {
        for tool in tools() {
            let props = &tool.input_schema["properties"];
            assert_eq!(props["page"]["type"], "integer");
            assert_eq!(props["per_page"]["type"], "integer");
            assert_eq!(props["search_query"]["type"], "string");
            assert_eq!(props["include_relationships"]["type"], "boolean");
            assert_eq!(tool.input_schema["required"], json!([]));
        }
    }
}
