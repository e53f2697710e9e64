use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::{auth::auth_details_from_json, ConnectorError, ProviderRegistry};
use rmcp::model::*;

pub const SERVER_NAME: &str = "sra-mcp-server";

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct AuthState {
    authorized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    authorized_at: Option<String>,
}

/// MCP server over a [`ProviderRegistry`]. Tools keep their bare names and
/// are routed through the registry's tool index.
pub struct McpServer {
    registry: Arc<ProviderRegistry>,
    auth_status: Arc<Mutex<HashMap<String, AuthState>>>,
}

impl McpServer {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            auth_status: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Aggregated capabilities from all connectors
    pub async fn get_capabilities(&self) -> ServerCapabilities {
        let mut capabilities = ServerCapabilities::default();
        for connector in self.registry.providers.values() {
            let conn_caps = connector.capabilities().await;
            if conn_caps.tools.is_some() {
                capabilities.tools = conn_caps.tools;
            }
            if conn_caps.resources.is_some() {
                capabilities.resources = conn_caps.resources;
            }
            if conn_caps.prompts.is_some() {
                capabilities.prompts = conn_caps.prompts;
            }
        }
        capabilities
    }

    pub async fn handle_initialize(
        &self,
        request: InitializeRequestParam,
    ) -> Result<InitializeResult, ConnectorError> {
        info!(
            target: "mcp.server",
            client = %request.client_info.name,
            protocol = ?request.protocol_version,
            "MCP server initializing"
        );

        let instructions: Vec<&str> = self
            .registry
            .providers
            .values()
            .filter_map(|c| c.instructions())
            .collect();

        Ok(InitializeResult {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: self.get_capabilities().await,
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                title: Some("AWS Security Reference Architecture".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: (!instructions.is_empty()).then(|| instructions.join("\n\n")),
        })
    }

    pub async fn handle_list_resources(
        &self,
        request: Option<PaginatedRequestParam>,
    ) -> Result<ListResourcesResult, ConnectorError> {
        let mut all_resources = Vec::new();
        for (name, connector) in self.registry.providers.iter() {
            match connector.list_resources(request.clone()).await {
                Ok(response) => all_resources.extend(response.resources),
                Err(e) => error!(target: "mcp.server", connector = %name, error = %e, "listing resources failed"),
            }
        }
        Ok(ListResourcesResult {
            resources: all_resources,
            next_cursor: None,
        })
    }

    pub async fn handle_list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
    ) -> Result<ListToolsResult, ConnectorError> {
        Ok(ListToolsResult {
            tools: self.registry.get_provider_tools().await,
            next_cursor: None,
        })
    }

    pub async fn handle_call_tool(
        &self,
        request: CallToolRequestParam,
    ) -> Result<CallToolResult, ConnectorError> {
        let connector = self
            .registry
            .provider_for_tool(request.name.as_ref())
            .ok_or_else(|| ConnectorError::ToolNotFound(request.name.to_string()))?
            .clone();
        let tool = request.name.to_string();
        let result = connector.call_tool(request).await;
        match &result {
            Ok(_) => debug!(target: "mcp.server", %tool, "tool call succeeded"),
            Err(e) if e.is_validation() => {
                warn!(target: "mcp.server", %tool, error = %e, "tool call rejected")
            }
            Err(e) => error!(target: "mcp.server", %tool, error = %e, "tool call failed"),
        }
        result
    }

    pub async fn handle_list_prompts(
        &self,
        request: Option<PaginatedRequestParam>,
    ) -> Result<ListPromptsResult, ConnectorError> {
        let mut all_prompts = Vec::new();
        for (name, connector) in self.registry.providers.iter() {
            match connector.list_prompts(request.clone()).await {
                Ok(response) => all_prompts.extend(response.prompts),
                Err(e) => error!(target: "mcp.server", connector = %name, error = %e, "listing prompts failed"),
            }
        }
        Ok(ListPromptsResult {
            prompts: all_prompts,
            next_cursor: None,
        })
    }

    /// Apply secrets to the connector keyed by `provider`, then verify them.
    pub async fn handle_set_secrets(&self, params: &Value) -> Result<Value, ConnectorError> {
        let provider = params
            .get("provider")
            .and_then(|v| v.as_str())
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ConnectorError::InvalidParams("Missing provider".to_string()))?;
        let secrets = params
            .get("secrets")
            .and_then(|v| v.as_object())
            .cloned()
            .unwrap_or_default();

        let connector = self
            .registry
            .get_by_credential_provider(provider)
            .ok_or_else(|| ConnectorError::InvalidParams(format!("Unknown provider: {provider}")))?
            .clone();
        let verified = match connector
            .set_auth_details(auth_details_from_json(secrets))
            .await
        {
            Ok(()) => connector.test_auth().await,
            Err(e) => Err(e),
        };
        if let Err(e) = verified {
            self.auth_status.lock().await.remove(provider);
            warn!(target: "mcp.server", %provider, error = %e, "credentials rejected");
            return Err(e);
        }

        self.auth_status.lock().await.insert(
            provider.to_string(),
            AuthState {
                authorized: true,
                authorized_at: Some(chrono::Utc::now().to_rfc3339()),
            },
        );
        info!(target: "mcp.server", %provider, "credentials updated");
        Ok(json!({"ok": true}))
    }

    pub async fn handle_authorization_status(&self) -> Value {
        let status = self.auth_status.lock().await.clone();
        let mut providers: Vec<Value> = Vec::new();
        for connector in self.registry.providers.values() {
            let provider = connector.credential_provider();
            // Cached state only supplies the timestamp.
            let authorized = connector.test_auth().await.is_ok();
            let state = AuthState {
                authorized,
                authorized_at: status
                    .get(provider)
                    .filter(|_| authorized)
                    .and_then(|s| s.authorized_at.clone()),
            };
            let mut configured: Vec<String> = connector
                .get_auth_details()
                .await
                .map(|details| details.into_keys().collect())
                .unwrap_or_default();
            configured.sort();
            providers.push(json!({
                "provider": provider,
                "authorized": state.authorized,
                "authorized_at": state.authorized_at,
                "configured": configured,
            }));
        }
        json!({ "providers": providers })
    }

    pub fn handle_authorization_describe(&self) -> Value {
        let schemes: Vec<Value> = self
            .registry
            .providers
            .values()
            .map(|c| {
                json!({
                    "provider": c.credential_provider(),
                    "type": "api_key",
                    "schema": c.config_schema().to_json_schema(),
                    "requires_auth": "optional",
                })
            })
            .collect();
        json!({ "schemes": schemes })
    }
}

fn to_value<T: serde::Serialize>(
    result: Result<T, ConnectorError>,
) -> Result<Value, serde_json::Value> {
    result
        .and_then(|r| serde_json::to_value(r).map_err(ConnectorError::SerdeJson))
        .map_err(|e| e.to_jsonrpc_error())
}

fn invalid_params(e: serde_json::Error) -> Value {
    ConnectorError::InvalidParams(e.to_string()).to_jsonrpc_error()
}

/// JSON-RPC message handler for the MCP server
pub struct JsonRpcHandler {
    server: McpServer,
}

impl JsonRpcHandler {
    pub fn new(server: McpServer) -> Self {
        Self { server }
    }

    /// Process one JSON-RPC message. Notifications (no `id`) yield `None`.
    pub async fn handle_request(&self, request: Value) -> Option<Value> {
        let id = request.get("id").cloned();
        let method = request
            .get("method")
            .and_then(|m| m.as_str())
            .unwrap_or("")
            .to_string();
        let params = request
            .get("params")
            .cloned()
            .filter(|p| !p.is_null())
            .unwrap_or(json!({}));
        debug!(target: "mcp.jsonrpc", %method, has_id = id.is_some(), "handling message");

        if request.get("jsonrpc").and_then(|v| v.as_str()) != Some("2.0") || method.is_empty() {
            if id.is_none() && method.is_empty() {
                // a response or junk without an id: nothing to answer
                return None;
            }
            return Some(json!({
                "jsonrpc": "2.0",
                "error": {"code": -32600, "message": "Invalid Request"},
                "id": id.unwrap_or(Value::Null),
            }));
        }

        let result: Result<Value, Value> = match method.as_str() {
            "initialize" => match serde_json::from_value::<InitializeRequestParam>(params) {
                Ok(req) => to_value(self.server.handle_initialize(req).await),
                Err(e) => Err(invalid_params(e)),
            },
            "notifications/initialized" | "notifications/cancelled" => {
                debug!(target: "mcp.jsonrpc", %method, "notification");
                Ok(Value::Null)
            }
            "ping" => Ok(json!({})),
            "tools/list" => match serde_json::from_value::<Option<PaginatedRequestParam>>(params) {
                Ok(req) => to_value(self.server.handle_list_tools(req).await),
                Err(e) => Err(invalid_params(e)),
            },
            "tools/call" => match serde_json::from_value::<CallToolRequestParam>(params) {
                Ok(req) => to_value(self.server.handle_call_tool(req).await),
                Err(e) => Err(invalid_params(e)),
            },
            "resources/list" => {
                match serde_json::from_value::<Option<PaginatedRequestParam>>(params) {
                    Ok(req) => to_value(self.server.handle_list_resources(req).await),
                    Err(e) => Err(invalid_params(e)),
                }
            }
            "prompts/list" => match serde_json::from_value::<Option<PaginatedRequestParam>>(params) {
                Ok(req) => to_value(self.server.handle_list_prompts(req).await),
                Err(e) => Err(invalid_params(e)),
            },
            "secrets/set" => self
                .server
                .handle_set_secrets(&params)
                .await
                .map_err(|e| e.to_jsonrpc_error()),
            "authorization/status" => Ok(self.server.handle_authorization_status().await),
            "authorization/describe" => Ok(self.server.handle_authorization_describe()),
            _ => Err(ConnectorError::MethodNotFound.to_jsonrpc_error()),
        };

        let id = id?;
        Some(match result {
            Ok(result) => json!({
                "jsonrpc": "2.0",
                "result": result,
                "id": id,
            }),
            Err(error) => json!({
                "jsonrpc": "2.0",
                "error": error,
                "id": id,
            }),
        })
    }

    /// Parse and handle one raw line. Malformed JSON gets a -32700 reply.
    pub async fn handle_message(&self, raw: &str) -> Option<Value> {
        match serde_json::from_str::<Value>(raw) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                error!(target: "mcp.jsonrpc", error = %e, "failed to parse JSON-RPC message");
                Some(json!({
                    "jsonrpc": "2.0",
                    "error": {
                        "code": -32700,
                        "message": "Parse error",
                        "data": e.to_string()
                    },
                    "id": null
                }))
            }
        }
    }
}
