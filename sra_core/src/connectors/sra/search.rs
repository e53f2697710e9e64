use std::collections::HashSet;

use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::types::SearchResult;
use crate::error::ConnectorError;
use crate::utils::{clean_html_entities, ensure_success, with_session, SESSION_HEADER};

const SERVICE: &str = "documentation search";
const SRA_GUIDE: &str = "AWS Security Reference Architecture";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    suggestions: Vec<Suggestion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Suggestion {
    text_excerpt_suggestion: Option<TextExcerptSuggestion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextExcerptSuggestion {
    link: Option<String>,
    title: Option<String>,
    summary: Option<String>,
    suggestion_body: Option<String>,
    context: Option<String>,
}

/// Client for the AWS documentation search API, scoped to the SRA guide.
#[derive(Clone)]
pub struct SearchClient {
    client: reqwest::Client,
    endpoint: String,
    session_id: String,
}

impl SearchClient {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            session_id: session_id.into(),
        }
    }

    /// `phrase` and `limit` arrive already validated by the connector.
    pub async fn search(
        &self,
        phrase: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>, ConnectorError> {
        let body = json!({
            "textQuery": { "input": phrase },
            "contextAttributes": [
                { "key": "aws-docs-search-guide", "value": SRA_GUIDE }
            ],
            "acceptSuggestionBody": "RawText",
            "locales": ["en_us"],
        });

        let url = with_session(&self.endpoint, &self.session_id)?;
        debug!(target: "connector.sra.search", phrase, limit, "querying documentation search");

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(SESSION_HEADER, &self.session_id)
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(response, SERVICE)?;
        let text = response.text().await?;
        let parsed: SearchResponse =
            serde_json::from_str(&text).map_err(|e| ConnectorError::MalformedResponse {
                service: SERVICE,
                message: e.to_string(),
            })?;

        let results = parse_search_results(parsed, limit);
        debug!(target: "connector.sra.search", phrase, count = results.len(), "documentation search done");
        Ok(results)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn parse_search_results(response: SearchResponse, limit: usize) -> Vec<SearchResult> {
    let mut seen = HashSet::new();
    response
        .suggestions
        .into_iter()
        .filter_map(|s| s.text_excerpt_suggestion)
        .filter_map(|s| {
            let url = non_empty(s.link)?;
            let excerpt = non_empty(s.summary)
                .or_else(|| non_empty(s.suggestion_body))
                .or_else(|| non_empty(s.context))
                .map(|e| clean_html_entities(&e));
            Some((url, s.title.unwrap_or_default(), excerpt))
        })
        .filter(|(url, _, _)| seen.insert(url.clone()))
        .take(limit)
        .enumerate()
        .map(|(i, (url, title, excerpt))| SearchResult {
            rank_order: i + 1,
            title: clean_html_entities(&title),
            url,
            excerpt,
        })
        .collect()
}
