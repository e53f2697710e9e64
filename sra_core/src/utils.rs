use crate::config::Config;
use crate::error::ConnectorError;
use rmcp::model::{CallToolResult, Content};
use serde::Serialize;
use serde_json::{Map as JsonMap, Value as JsonValue};
use url::Url;

pub const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) ",
    "Chrome/91.0.4472.124 Safari/537.36 ModelContextProtocol/",
    env!("CARGO_PKG_VERSION"),
    " (AWS Security Reference Architecture Server)"
);

pub const SESSION_HEADER: &str = "X-MCP-Session-Id";

pub fn build_http_client(config: &Config) -> Result<reqwest::Client, ConnectorError> {
    reqwest::Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.http_timeout)
        .pool_max_idle_per_host(4)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ConnectorError::InternalError(format!("failed to build http client: {}", e)))
}

/// Turn a non-2xx response into a request error tagged with the upstream service.
pub fn ensure_success(
    response: reqwest::Response,
    service: &'static str,
) -> Result<reqwest::Response, ConnectorError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ConnectorError::UpstreamStatus { service, status })
    }
}

/// Append `session=<id>` to `url`, keeping any query it already carries.
pub fn with_session(url: &str, session_id: &str) -> Result<Url, ConnectorError> {
    let mut parsed = Url::parse(url)
        .map_err(|e| ConnectorError::Validation(format!("invalid URL {url:?}: {e}")))?;
    parsed.query_pairs_mut().append_pair("session", session_id);
    Ok(parsed)
}

pub fn strip_multiple_newlines(text: &str) -> String {
    let mut result = String::new();
    let mut in_code_block = false;
    let mut consecutive_blank = 0;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("```") {
            in_code_block = !in_code_block;
        }

        if trimmed.is_empty() && !in_code_block {
            consecutive_blank += 1;
            if consecutive_blank > 1 {
                continue;
            }
        } else {
            consecutive_blank = 0;
        }

        if !result.is_empty() {
            result.push('\n');
        }
        result.push_str(line.trim_end());
    }

    result.trim_matches('\n').to_string()
}

pub fn clean_html_entities(text: &str) -> String {
    let mut cleaned = text.to_string();
    // Upstream excerpts are sometimes double-encoded.
    for _ in 0..2 {
        let decoded = html_escape::decode_html_entities(&cleaned).into_owned();
        if decoded == cleaned {
            break;
        }
        cleaned = decoded;
    }
    cleaned
}

/// First `max_chars` characters of `text`, with `...` appended when cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

const RESULT_LIST_KEYS: &[&str] = &["results", "recommendations", "content"];

const QUERY_FIELD_KEYS: &[&str] = &["search_phrase", "url"];

fn maybe_attach_no_results_message(map: &mut JsonMap<String, JsonValue>) -> Option<String> {
    let empty_key = RESULT_LIST_KEYS.iter().find(|key| match map.get(**key) {
        Some(JsonValue::Array(items)) => items.is_empty(),
        Some(JsonValue::String(s)) => s.is_empty(),
        Some(JsonValue::Null) => true,
        _ => false,
    })?;

    let query_hint = QUERY_FIELD_KEYS
        .iter()
        .find_map(|key| map.get(*key).and_then(|v| v.as_str()))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let message = match query_hint {
        Some(query) => format!("No {} found for \"{}\".", empty_key, query),
        None => format!("No {} found for the requested input.", empty_key),
    };

    map.entry("message".to_string())
        .or_insert(JsonValue::String(message.clone()));
    map.entry("no_results".to_string())
        .or_insert(JsonValue::Bool(true));
    Some(message)
}

/// Build a CallToolResult carrying structured JSON, plus a text block for
/// clients that only render text content.
pub fn structured_result_with_text<T: Serialize>(
    data: &T,
    text_fallback: Option<String>,
) -> Result<CallToolResult, ConnectorError> {
    let value = serde_json::to_value(data)?;

    let mut map: JsonMap<String, JsonValue> = match value {
        JsonValue::Object(m) => m,
        other => {
            let mut m = JsonMap::new();
            m.insert("data".to_string(), other);
            m
        }
    };

    let no_results = maybe_attach_no_results_message(&mut map);

    let text = match (text_fallback, no_results) {
        (Some(text), _) if !text.is_empty() => Some(text),
        (_, Some(message)) => Some(message),
        (Some(_), None) | (None, None) => None,
    };

    Ok(CallToolResult {
        content: text.map(|t| vec![Content::text(t)]).unwrap_or_default(),
        structured_content: Some(JsonValue::Object(map)),
        is_error: Some(false),
        meta: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collapses_blank_runs_outside_code() {
        let text = "# Title\n\n\n\nBody\n```\na\n\n\nb\n```\n\n\nEnd\n";
        let out = strip_multiple_newlines(text);
        assert_eq!(out, "# Title\n\nBody\n```\na\n\n\nb\n```\n\nEnd");
    }

    #[test]
    fn decodes_double_encoded_entities() {
        assert_eq!(clean_html_entities("AWS &amp;amp; SRA"), "AWS & SRA");
        assert_eq!(clean_html_entities("it&#39;s"), "it's");
    }

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé...");
        assert_eq!(truncate_chars("abc", 3), "abc");
    }

    #[test]
    fn session_is_appended_to_existing_query() {
        let url = with_session("https://docs.aws.amazon.com/a.html?x=1", "abc").unwrap();
        assert_eq!(url.as_str(), "https://docs.aws.amazon.com/a.html?x=1&session=abc");
        assert!(with_session("not a url", "abc").unwrap_err().is_validation());
    }

    #[test]
    fn empty_results_get_a_message() {
        let result = structured_result_with_text(
            &json!({"search_phrase": "kms", "results": []}),
            None,
        )
        .unwrap();
        let structured = result.structured_content.unwrap();
        assert_eq!(structured["no_results"], true);
        assert_eq!(structured["message"], "No results found for \"kms\".");
        assert_eq!(result.content.len(), 1);
    }

    #[test]
    fn populated_results_are_left_alone() {
        let result = structured_result_with_text(
            &json!({"results": [{"url": "https://docs.aws.amazon.com/"}]}),
            Some("1 result".into()),
        )
        .unwrap();
        let structured = result.structured_content.unwrap();
        assert!(structured.get("no_results").is_none());
    }
}
