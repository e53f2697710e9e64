// src/lib.rs
pub mod auth;
pub mod capabilities;
pub mod config;
pub mod connectors;
pub mod error;
pub mod logging;
pub mod mcp_server;
pub mod transport;
pub mod utils;

use std::collections::HashMap;
use std::sync::Arc;

// Re-export the rmcp types downstream crates need
pub use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, InitializeRequestParam,
    InitializeResult, ListPromptsResult, ListResourcesResult, ListToolsResult,
    PaginatedRequestParam, ProtocolVersion, RawContent, ServerCapabilities, Tool,
};

use crate::auth::AuthDetails;
pub use crate::capabilities::ConnectorConfigSchema;
pub use crate::config::Config;
pub use crate::error::{ConnectorError, ErrorKind};
use async_trait::async_trait;

#[async_trait]
pub trait Connector: Send + Sync {
    /// Returns the unique name of the connector.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Provider key used by `secrets/set` and `authorization/status`.
    /// Defaults to the connector name.
    fn credential_provider(&self) -> &'static str {
        self.name()
    }

    async fn capabilities(&self) -> ServerCapabilities;

    /// Usage notes returned to the client in `initialize`.
    fn instructions(&self) -> Option<&'static str> {
        None
    }

    async fn list_tools(
        &self,
        request: Option<PaginatedRequestParam>,
    ) -> Result<ListToolsResult, ConnectorError>;

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
    ) -> Result<CallToolResult, ConnectorError>;

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
    ) -> Result<ListResourcesResult, ConnectorError> {
        Ok(ListResourcesResult {
            resources: Vec::new(),
            next_cursor: None,
        })
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
    ) -> Result<ListPromptsResult, ConnectorError> {
        Ok(ListPromptsResult {
            prompts: Vec::new(),
            next_cursor: None,
        })
    }

    // --- Authentication and configuration ---

    async fn get_auth_details(&self) -> Result<AuthDetails, ConnectorError>;
    /// Connectors keep credentials behind their own interior lock.
    async fn set_auth_details(&self, details: AuthDetails) -> Result<(), ConnectorError>;
    async fn test_auth(&self) -> Result<(), ConnectorError>;
    fn config_schema(&self) -> ConnectorConfigSchema;
}

/// Connectors by name, plus an index from tool name to owning connector.
pub struct ProviderRegistry {
    pub providers: HashMap<String, Arc<dyn Connector>>,
    tool_index: HashMap<String, String>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        ProviderRegistry {
            providers: HashMap::new(),
            tool_index: HashMap::new(),
        }
    }

    /// Register a connector and index its tools. Tool names must be unique
    /// across connectors; a clash is a configuration error.
    pub async fn register_provider(
        &mut self,
        provider: Arc<dyn Connector>,
    ) -> Result<(), ConnectorError> {
        let name = provider.name().to_string();
        let tools = provider.list_tools(None).await?.tools;
        for tool in &tools {
            if let Some(owner) = self.tool_index.get(tool.name.as_ref()) {
                if owner != &name {
                    return Err(ConnectorError::Config(format!(
                        "tool {} is provided by both {} and {}",
                        tool.name, owner, name
                    )));
                }
            }
        }
        for tool in tools {
            self.tool_index.insert(tool.name.to_string(), name.clone());
        }
        self.providers.insert(name, provider);
        Ok(())
    }

    pub fn get_provider(&self, name: &str) -> Option<&Arc<dyn Connector>> {
        self.providers.get(name)
    }

    /// Connector whose credentials are keyed by `provider`.
    pub fn get_by_credential_provider(&self, provider: &str) -> Option<&Arc<dyn Connector>> {
        self.providers
            .get(provider)
            .or_else(|| self.providers.values().find(|c| c.credential_provider() == provider))
    }

    pub fn provider_for_tool(&self, tool: &str) -> Option<&Arc<dyn Connector>> {
        self.tool_index
            .get(tool)
            .and_then(|name| self.providers.get(name))
    }

    pub fn list_providers(&self) -> Vec<ServerInfo> {
        let mut infos: Vec<ServerInfo> = self
            .providers
            .iter()
            .map(|(name, connector)| ServerInfo {
                name: name.clone(),
                description: connector.description().to_string(),
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    pub async fn get_provider_tools(&self) -> Vec<Tool> {
        let mut names: Vec<&String> = self.providers.keys().collect();
        names.sort();
        let mut all_tools = Vec::new();
        for name in names {
            if let Ok(response) = self.providers[name].list_tools(None).await {
                all_tools.extend(response.tools);
            }
        }
        all_tools
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry with the SRA connector built from `config`.
pub async fn build_registry(config: &Config) -> Result<ProviderRegistry, ConnectorError> {
    let mut registry = ProviderRegistry::new();
    let connector = connectors::sra::SraConnector::new(config)?;
    registry.register_provider(Arc::new(connector)).await?;
    Ok(registry)
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub description: String,
}
