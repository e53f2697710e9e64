use crate::error::ConnectorError;
use url::Url;

pub const MAX_LIMIT: usize = 50;
pub const MAX_CONTENT_LENGTH: i64 = 1_000_000;

const DOCS_HOST: &str = "docs.aws.amazon.com";
const GITHUB_HOST: &str = "github.com";

pub fn search_phrase(phrase: &str) -> Result<&str, ConnectorError> {
    let trimmed = phrase.trim();
    if trimmed.is_empty() {
        return Err(ConnectorError::Validation(
            "search_phrase must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

/// Positive limits are capped at the provider maximum.
pub fn limit(limit: i64) -> Result<usize, ConnectorError> {
    if limit <= 0 {
        return Err(ConnectorError::Validation(format!(
            "limit must be a positive integer, got {limit}"
        )));
    }
    Ok(usize::try_from(limit).unwrap_or(MAX_LIMIT).min(MAX_LIMIT))
}

pub fn window(max_length: i64, start_index: i64) -> Result<(usize, usize), ConnectorError> {
    if max_length <= 0 || max_length >= MAX_CONTENT_LENGTH {
        return Err(ConnectorError::Validation(format!(
            "max_length must be between 1 and {}, got {max_length}",
            MAX_CONTENT_LENGTH - 1
        )));
    }
    if start_index < 0 {
        return Err(ConnectorError::Validation(format!(
            "start_index must be >= 0, got {start_index}"
        )));
    }
    let start = usize::try_from(start_index)
        .map_err(|_| ConnectorError::Validation("start_index out of range".to_string()))?;
    // max_length < MAX_CONTENT_LENGTH so the cast is lossless.
    Ok((max_length as usize, start))
}

fn parse_http(url: &str) -> Result<Url, ConnectorError> {
    let parsed = Url::parse(url.trim())
        .map_err(|e| ConnectorError::Validation(format!("invalid URL {url:?}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(ConnectorError::Validation(format!(
            "URL scheme must be http or https, got {other}"
        ))),
    }
}

/// URLs `read_content` accepts: AWS documentation or GitHub.
pub fn readable_url(url: &str) -> Result<Url, ConnectorError> {
    let parsed = parse_http(url)?;
    match parsed.host_str() {
        Some(DOCS_HOST) | Some(GITHUB_HOST) => Ok(parsed),
        _ => Err(ConnectorError::Validation(format!(
            "URL must be from the {DOCS_HOST} domain or GitHub, got {url}"
        ))),
    }
}

pub fn documentation_url(url: &str) -> Result<Url, ConnectorError> {
    let parsed = parse_http(url)?;
    if parsed.host_str() == Some(DOCS_HOST) {
        Ok(parsed)
    } else {
        Err(ConnectorError::Validation(format!(
            "URL must be from the {DOCS_HOST} domain, got {url}"
        )))
    }
}
