// src/error.rs
use serde_json::json;

/// Coarse classification surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input: empty phrase, non-positive limit, out-of-range index, bad URL.
    Validation,
    /// Upstream unreachable, non-success status or malformed upstream response.
    Request,
    /// Protocol-level faults inside the server itself.
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Request error: {0}")]
    Request(String),

    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("{service} returned status {status}")]
    UpstreamStatus {
        service: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("Malformed response from {service}: {message}")]
    MalformedResponse {
        service: &'static str,
        message: String,
    },

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Method not found")]
    MethodNotFound,

    #[error("Parse error")]
    ParseError,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ConnectorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConnectorError::Validation(_)
            | ConnectorError::InvalidParams(_)
            | ConnectorError::Authentication(_) => ErrorKind::Validation,
            ConnectorError::Request(_)
            | ConnectorError::HttpRequest(_)
            | ConnectorError::UpstreamStatus { .. }
            | ConnectorError::MalformedResponse { .. } => ErrorKind::Request,
            _ => ErrorKind::Internal,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    pub fn is_request(&self) -> bool {
        self.kind() == ErrorKind::Request
    }

    pub fn code_str(&self) -> &'static str {
        match self {
            ConnectorError::Validation(_) => "invalid_input",
            ConnectorError::InvalidParams(_) => "invalid_params",
            ConnectorError::Authentication(_) => "auth_failed",
            ConnectorError::ToolNotFound(_) => "tool_not_found",
            ConnectorError::MethodNotFound => "method_not_found",
            ConnectorError::ParseError => "parse_error",
            ConnectorError::Config(_) => "config_error",
            ConnectorError::HttpRequest(e) if e.is_timeout() => "timeout",
            ConnectorError::Request(_)
            | ConnectorError::HttpRequest(_)
            | ConnectorError::UpstreamStatus { .. }
            | ConnectorError::MalformedResponse { .. } => "upstream_error",
            _ => "internal_error",
        }
    }

    pub fn to_jsonrpc_error(&self) -> serde_json::Value {
        let code = match self {
            ConnectorError::MethodNotFound => -32601,
            ConnectorError::ParseError => -32700,
            ConnectorError::ToolNotFound(_) => -32602,
            err if err.is_validation() => -32602,
            _ => -32603,
        };

        json!({
            "code": code,
            "message": self.to_string(),
            "data": { "code": self.code_str() },
        })
    }
}
