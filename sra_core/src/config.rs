use std::time::Duration;

use crate::error::ConnectorError;

pub const SEARCH_API_URL: &str = "https://proxy.search.docs.aws.amazon.com/search";
pub const RECOMMENDATIONS_API_URL: &str =
    "https://contentrecs-api.docs.aws.amazon.com/v1/recommendations";
pub const GITHUB_API_URL: &str = "https://api.github.com";
pub const GITHUB_RAW_URL: &str = "https://raw.githubusercontent.com";
pub const DOCS_ORIGIN: &str = "https://docs.aws.amazon.com";
pub const GITHUB_WEB_ORIGIN: &str = "https://github.com";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_LOG_LEVEL: &str = "warn";

pub const SRA_REPOSITORIES: &[&str] = &[
    "awslabs/sra-verify",
    "aws-samples/aws-security-reference-architecture-examples",
];

/// Runtime settings, sourced from the environment (and an optional `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub github_token: Option<String>,
    pub search_api_url: String,
    pub recommendations_api_url: String,
    pub github_api_url: String,
    pub github_raw_url: String,
    /// Where docs.aws.amazon.com URLs are actually fetched from.
    pub docs_origin: String,
    /// Where github.com page URLs are actually fetched from.
    pub github_web_origin: String,
    pub http_timeout: Duration,
    pub connect_timeout: Duration,
    pub bind_addr: String,
    pub repositories: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            github_token: None,
            search_api_url: SEARCH_API_URL.to_string(),
            recommendations_api_url: RECOMMENDATIONS_API_URL.to_string(),
            github_api_url: GITHUB_API_URL.to_string(),
            github_raw_url: GITHUB_RAW_URL.to_string(),
            docs_origin: DOCS_ORIGIN.to_string(),
            github_web_origin: GITHUB_WEB_ORIGIN.to_string(),
            http_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            repositories: SRA_REPOSITORIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Config {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConnectorError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConnectorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        if let Some(level) = get("SRA_LOG_LEVEL").or_else(|| get("FASTMCP_LOG_LEVEL")) {
            config.log_level = level;
        }
        config.github_token = get("GITHUB_TOKEN");
        if let Some(v) = get("SRA_SEARCH_API_URL") {
            config.search_api_url = v;
        }
        if let Some(v) = get("SRA_RECOMMENDATIONS_API_URL") {
            config.recommendations_api_url = v;
        }
        if let Some(v) = get("SRA_GITHUB_API_URL") {
            config.github_api_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("SRA_GITHUB_RAW_URL") {
            config.github_raw_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("SRA_DOCS_ORIGIN") {
            config.docs_origin = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("SRA_GITHUB_WEB_ORIGIN") {
            config.github_web_origin = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("SRA_HTTP_TIMEOUT_SECS") {
            let secs: u64 = v.trim().parse().map_err(|_| {
                ConnectorError::Config(format!("SRA_HTTP_TIMEOUT_SECS must be an integer, got {v:?}"))
            })?;
            if secs == 0 {
                return Err(ConnectorError::Config(
                    "SRA_HTTP_TIMEOUT_SECS must be positive".to_string(),
                ));
            }
            config.http_timeout = Duration::from_secs(secs);
        }
        if let Some(v) = get("SRA_MCP_BIND") {
            config.bind_addr = v;
        }

        Ok(config)
    }
}
