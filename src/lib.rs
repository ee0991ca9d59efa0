//! # compliance-mcp
//!
//! MCP (Model Context Protocol) server giving AI agents read-only access to a
//! compliance platform's REST API.
//!
//! Each tool maps onto one upstream resource collection and issues a single
//! authenticated GET request. The decoded JSON body is returned as-is; HTTP
//! and transport failures come back as `{"error": "..."}` instead of failing
//! the call.
//!
//! ## Tools
//!
//! `list_controls`, `list_tests`, `list_users`, `list_devices`,
//! `list_frameworks`, `list_vendors`, `list_tprm_vendors`,
//! `list_integration_connections`, `list_user_accounts`,
//! `list_repositories` and `list_repository_framework_scopes`.
//!
//! ## Usage
//!
//! Credentials are read from `COMPLIANCE_API_KEY` and `COMPLIANCE_API_SECRET`
//! (and optionally `COMPLIANCE_API_URL`):
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "compliance": {
//!       "command": "/path/to/compliance-mcp",
//!       "env": {
//!         "COMPLIANCE_API_KEY": "...",
//!         "COMPLIANCE_API_SECRET": "..."
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! ## Library Usage
//!
//! ```no_run
//! use compliance_mcp::{ApiClient, Config, McpServer};
//!
//! # async fn run() -> compliance_mcp::Result<()> {
//! let config = Config::from_env()?;
//! let server = McpServer::new(ApiClient::new(config));
//! server.run().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod client;
mod config;
mod convert;
mod error;
mod server;
mod tools;

pub use client::{ApiClient, ApiResponse, QueryParams, REQUEST_TIMEOUT};
pub use config::{Config, API_KEY_VAR, API_SECRET_VAR, API_URL_VAR, DEFAULT_BASE_URL};
pub use error::{McpError, Result};
pub use server::{JsonRpcRequest, JsonRpcResponse, McpServer};
pub use tools::collections::{Collection, ListParams, COLLECTIONS};
pub use tools::{ToolDef, ToolRegistry};
