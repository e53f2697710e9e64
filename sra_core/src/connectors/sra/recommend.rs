use futures::stream::{self, StreamExt};
use serde::Deserialize;
use tracing::debug;

use super::types::RecommendationResult;
use super::validate;
use crate::error::ConnectorError;
use crate::utils::{clean_html_entities, ensure_success, with_session};

const SERVICE: &str = "recommendations";

/// Upper bound on recommendation requests in flight for `recommend_many`.
pub const MAX_CONCURRENT_REQUESTS: usize = 5;

pub const SECURITY_KEYWORDS: &[&str] = &[
    "security",
    "compliance",
    "governance",
    "audit",
    "protection",
    "sra",
    "reference architecture",
    "securityhub",
    "iam",
    "identity",
    "permission",
    "encryption",
    "kms",
    "guard",
    "firewall",
    "waf",
    "shield",
    "detective",
    "inspector",
    "macie",
    "security incident response",
];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecommendationResponse {
    highly_rated: Option<Category<Item>>,
    journey: Option<Category<JourneyGroup>>,
    new: Option<Category<Item>>,
    similar: Option<Category<Item>>,
}

#[derive(Debug, Deserialize)]
struct Category<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Item {
    #[serde(default)]
    url: String,
    #[serde(default)]
    asset_title: String,
    #[serde(rename = "abstract")]
    summary: Option<String>,
    date_created: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JourneyGroup {
    intent: Option<String>,
    #[serde(default)]
    urls: Vec<Item>,
}

fn to_result(item: Item, context: Option<String>) -> RecommendationResult {
    RecommendationResult {
        title: clean_html_entities(&item.asset_title),
        url: item.url,
        context: context.map(|c| clean_html_entities(&c)),
    }
}

fn parse_recommendation_results(data: RecommendationResponse) -> Vec<RecommendationResult> {
    let mut results = Vec::new();

    if let Some(category) = data.highly_rated {
        results.extend(category.items.into_iter().map(|item| {
            let context = item.summary.clone();
            to_result(item, context)
        }));
    }

    if let Some(category) = data.journey {
        for group in category.items {
            let context = group
                .intent
                .filter(|i| !i.is_empty())
                .map(|i| format!("Intent: {i}"));
            results.extend(group.urls.into_iter().map(|item| to_result(item, context.clone())));
        }
    }

    if let Some(category) = data.new {
        results.extend(category.items.into_iter().map(|item| {
            let context = match item.date_created.as_deref() {
                Some(date) if !date.is_empty() => format!("New content added on {date}"),
                _ => "New content".to_string(),
            };
            to_result(item, Some(context))
        }));
    }

    if let Some(category) = data.similar {
        results.extend(category.items.into_iter().map(|item| {
            let context = item
                .summary
                .clone()
                .unwrap_or_else(|| "Similar content".to_string());
            to_result(item, Some(context))
        }));
    }

    results
}

pub fn is_security_related(result: &RecommendationResult) -> bool {
    let url = result.url.to_lowercase();
    let title = result.title.to_lowercase();
    let context = result.context.as_deref().unwrap_or_default().to_lowercase();
    SECURITY_KEYWORDS
        .iter()
        .any(|k| url.contains(k) || title.contains(k) || context.contains(k))
}

/// Security-related recommendations first, then the rest, each group in
/// upstream order, cut to `limit`.
pub fn prioritize_security(
    results: Vec<RecommendationResult>,
    limit: usize,
) -> Vec<RecommendationResult> {
    let (mut ordered, rest): (Vec<_>, Vec<_>) = results.into_iter().partition(is_security_related);
    ordered.extend(rest);
    ordered.truncate(limit);
    ordered
}

/// Client for the documentation recommendations API.
#[derive(Clone)]
pub struct RecommendationClient {
    client: reqwest::Client,
    endpoint: String,
    session_id: String,
}

impl RecommendationClient {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            session_id: session_id.into(),
        }
    }

    pub async fn recommend(&self, url: &str) -> Result<Vec<RecommendationResult>, ConnectorError> {
        let page = validate::documentation_url(url)?;

        let request_url = with_session(&self.endpoint, &self.session_id)?;
        debug!(target: "connector.sra.recommend", url = %page, "requesting recommendations");
        let response = self
            .client
            .get(request_url)
            .query(&[("path", page.as_str())])
            .send()
            .await?;
        let response = ensure_success(response, SERVICE)?;
        let text = response.text().await?;
        let data: RecommendationResponse = if text.trim().is_empty() {
            RecommendationResponse::default()
        } else {
            serde_json::from_str(&text).map_err(|e| ConnectorError::MalformedResponse {
                service: SERVICE,
                message: e.to_string(),
            })?
        };

        let results = parse_recommendation_results(data);
        debug!(target: "connector.sra.recommend", url = %page, count = results.len(), "recommendations done");
        Ok(results)
    }

    /// Recommendations for several pages, at most [`MAX_CONCURRENT_REQUESTS`]
    /// in flight. Output order matches `urls`.
    pub async fn recommend_many(
        &self,
        urls: &[String],
    ) -> Vec<(String, Result<Vec<RecommendationResult>, ConnectorError>)> {
        stream::iter(urls.iter().cloned())
            .map(|url| async move {
                let result = self.recommend(&url).await;
                (url, result)
            })
            .buffered(MAX_CONCURRENT_REQUESTS)
            .collect()
            .await
    }
}
