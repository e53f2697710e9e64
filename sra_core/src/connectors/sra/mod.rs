pub mod fetch;
pub mod github;
pub mod markdown;
pub mod recommend;
pub mod search;
pub mod types;
pub mod validate;
pub mod window;

use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use rmcp::model::*;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::AuthDetails;
use crate::capabilities::{ConnectorConfigSchema, Field, FieldType};
use crate::config::Config;
use crate::error::ConnectorError;
use crate::utils::{build_http_client, structured_result_with_text};
use crate::Connector;

pub use fetch::PageFetcher;
pub use github::{GitHubClient, RetryPolicy};
pub use recommend::RecommendationClient;
pub use search::SearchClient;
pub use types::{
    ContentKind, ContentWindow, ReadContentArgs, RecommendArgs, RecommendationResult,
    SearchContentArgs, SearchResult,
};

pub const SEARCH_CONTENT: &str = "search_content";
pub const READ_CONTENT: &str = "read_content";
pub const RECOMMEND: &str = "recommend";

const INSTRUCTIONS: &str = "\
Tools for the AWS Security Reference Architecture (SRA): a holistic set of guidelines for \
deploying the full complement of AWS security services in a multi-account environment.

- Use search_content to find SRA documentation and content from the SRA GitHub repositories \
(awslabs/sra-verify, aws-samples/aws-security-reference-architecture-examples).
- Use read_content with a docs.aws.amazon.com or github.com URL to read it as markdown. For \
long pages call it again with start_index set to the previous next_start_index.
- Use recommend on a documentation URL to discover related security content. The New section \
surfaces recently released features.
- Always cite the documentation URL when answering.";

fn schema_of<T: JsonSchema>() -> Arc<Map<String, Value>> {
    let schema = schemars::schema_for!(T);
    let mut object = match serde_json::to_value(schema) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    object.remove("$schema");
    object.remove("title");
    object.remove("description");
    object
        .entry("type".to_string())
        .or_insert_with(|| json!("object"));
    Arc::new(object)
}

static TOOLS: Lazy<Vec<Tool>> = Lazy::new(|| {
    vec![
        Tool {
            name: Cow::Borrowed(SEARCH_CONTENT),
            title: Some("Search SRA content".to_string()),
            description: Some(Cow::Borrowed(
                "Search AWS Security Reference Architecture documentation and the SRA GitHub \
repositories. Returns an equal mix of documentation pages and GitHub code, issues and pull \
requests, ranked 1..n. GitHub titles are prefixed with [Code], [Issue] or [PR]. Use specific \
security terms, e.g. search_phrase=\"Security Hub delegated administrator\".",
            )),
            input_schema: schema_of::<SearchContentArgs>(),
            output_schema: None,
            annotations: None,
            icons: None,
        },
        Tool {
            name: Cow::Borrowed(READ_CONTENT),
            title: Some("Read SRA content".to_string()),
            description: Some(Cow::Borrowed(
                "Fetch an SRA documentation page, GitHub file, issue or pull request and convert \
it to markdown. Returns at most max_length characters starting at start_index; when the content \
is truncated the response carries next_start_index. Example: \
url=\"https://docs.aws.amazon.com/prescriptive-guidance/latest/security-reference-architecture/welcome.html\".",
            )),
            input_schema: schema_of::<ReadContentArgs>(),
            output_schema: None,
            annotations: None,
            icons: None,
        },
        Tool {
            name: Cow::Borrowed(RECOMMEND),
            title: Some("Recommend related content".to_string()),
            description: Some(Cow::Borrowed(
                "Recommend documentation related to a docs.aws.amazon.com page, security and \
compliance content first. Categories: highly rated, journey (commonly viewed next), new and \
similar. Use a service welcome page and look for 'New content' to find recent releases.",
            )),
            input_schema: schema_of::<RecommendArgs>(),
            output_schema: None,
            annotations: None,
            icons: None,
        },
    ]
});

fn parse_args<T: DeserializeOwned>(
    tool: &str,
    arguments: Option<Map<String, Value>>,
) -> Result<T, ConnectorError> {
    serde_json::from_value(Value::Object(arguments.unwrap_or_default()))
        .map_err(|e| ConnectorError::InvalidParams(format!("{tool}: {e}")))
}

/// Combine documentation and GitHub results. GitHub gets `limit / 2` slots and
/// documentation the rest; a source that comes up short cedes its slots.
/// Results alternate between sources, duplicates (by URL) are dropped and the
/// merged list is ranked from 1.
pub fn merge_search_results(
    docs: Vec<SearchResult>,
    github: Vec<SearchResult>,
    limit: usize,
) -> Vec<SearchResult> {
    let mut seen = HashSet::new();
    let docs = distinct_urls(docs, &mut seen);
    let github = distinct_urls(github, &mut seen);

    let github_quota = limit / 2;
    let docs_quota = limit - github_quota;
    let docs_take = docs
        .len()
        .min(docs_quota.max(limit.saturating_sub(github.len())));
    let github_take = github.len().min(limit - docs_take);

    let mut docs = docs.into_iter().take(docs_take);
    let mut github = github.into_iter().take(github_take);
    let mut merged = Vec::with_capacity(limit);

    loop {
        let next_doc = docs.next();
        let next_gh = github.next();
        if next_doc.is_none() && next_gh.is_none() {
            break;
        }
        merged.extend(next_doc.into_iter().chain(next_gh));
    }

    merged.truncate(limit);
    for (i, result) in merged.iter_mut().enumerate() {
        result.rank_order = i + 1;
    }
    merged
}

/// Drop empty and already-seen URLs. Documentation claims its URLs first.
fn distinct_urls(results: Vec<SearchResult>, seen: &mut HashSet<String>) -> Vec<SearchResult> {
    results
        .into_iter()
        .filter(|r| !r.url.is_empty() && seen.insert(r.url.clone()))
        .collect()
}

fn render_search_results(results: &[SearchResult]) -> Option<String> {
    if results.is_empty() {
        return None;
    }
    let lines: Vec<String> = results
        .iter()
        .map(|r| {
            let mut entry = format!("{}. {}\n   {}", r.rank_order, r.title, r.url);
            if let Some(excerpt) = &r.excerpt {
                entry.push_str(&format!("\n   {}", excerpt));
            }
            entry
        })
        .collect();
    Some(lines.join("\n\n"))
}

fn render_recommendations(results: &[RecommendationResult]) -> Option<String> {
    if results.is_empty() {
        return None;
    }
    let lines: Vec<String> = results
        .iter()
        .map(|r| match &r.context {
            Some(context) => format!("- {} ({})\n  {}", r.title, r.url, context),
            None => format!("- {} ({})", r.title, r.url),
        })
        .collect();
    Some(lines.join("\n"))
}

/// The SRA tool surface: documentation search, page reading and recommendations.
#[derive(Clone)]
pub struct SraConnector {
    search: SearchClient,
    fetcher: PageFetcher,
    recommendations: RecommendationClient,
    github: GitHubClient,
    session_id: String,
}

impl SraConnector {
    pub fn new(config: &Config) -> Result<Self, ConnectorError> {
        Self::with_retry(config, RetryPolicy::default())
    }

    pub fn with_retry(config: &Config, retry: RetryPolicy) -> Result<Self, ConnectorError> {
        let client = build_http_client(config)?;
        let session_id = Uuid::new_v4().to_string();
        let github = GitHubClient::new(client.clone(), config).with_retry(retry);
        Ok(Self {
            search: SearchClient::new(client.clone(), &config.search_api_url, &session_id),
            fetcher: PageFetcher::new(client.clone(), config, &session_id, github.clone()),
            recommendations: RecommendationClient::new(
                client,
                &config.recommendations_api_url,
                &session_id,
            ),
            github,
            session_id,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn github(&self) -> &GitHubClient {
        &self.github
    }

    /// Documentation results merged with GitHub results. The documentation
    /// search must succeed; GitHub is best-effort.
    pub async fn search_content(
        &self,
        search_phrase: &str,
        limit: i64,
    ) -> Result<Vec<SearchResult>, ConnectorError> {
        let phrase = validate::search_phrase(search_phrase)?;
        let capped = validate::limit(limit)?;

        let (docs, github) = tokio::join!(
            self.search.search(phrase, capped),
            self.github.search(phrase, capped)
        );
        let docs = docs?;
        let github = github.unwrap_or_else(|e| {
            warn!(target: "connector.sra", phrase, error = %e, "GitHub search failed");
            Vec::new()
        });

        debug!(
            target: "connector.sra",
            phrase,
            docs = docs.len(),
            github = github.len(),
            "merging search results"
        );
        Ok(merge_search_results(docs, github, capped))
    }

    pub async fn read_content(
        &self,
        url: &str,
        max_length: i64,
        start_index: i64,
    ) -> Result<ContentWindow, ConnectorError> {
        self.fetcher.read(url, max_length, start_index).await
    }

    /// Recommendations with security-related pages first, cut to `limit`.
    pub async fn recommend(
        &self,
        url: &str,
        limit: i64,
    ) -> Result<Vec<RecommendationResult>, ConnectorError> {
        let limit = validate::limit(limit)?;
        let results = self.recommendations.recommend(url).await?;
        Ok(recommend::prioritize_security(results, limit))
    }

    pub async fn recommend_many(
        &self,
        urls: &[String],
        limit: i64,
    ) -> Result<Vec<(String, Result<Vec<RecommendationResult>, ConnectorError>)>, ConnectorError>
    {
        let limit = validate::limit(limit)?;
        let batches = self.recommendations.recommend_many(urls).await;
        Ok(batches
            .into_iter()
            .map(|(url, result)| {
                let result = result.map(|r| recommend::prioritize_security(r, limit));
                (url, result)
            })
            .collect())
    }
}

#[async_trait]
impl Connector for SraConnector {
    fn name(&self) -> &'static str {
        "sra"
    }

    fn description(&self) -> &'static str {
        "AWS Security Reference Architecture documentation, recommendations and GitHub content"
    }

    fn credential_provider(&self) -> &'static str {
        "github"
    }

    async fn capabilities(&self) -> ServerCapabilities {
        ServerCapabilities {
            tools: Some(ToolsCapability { list_changed: None }),
            ..Default::default()
        }
    }

    fn instructions(&self) -> Option<&'static str> {
        Some(INSTRUCTIONS)
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
    ) -> Result<ListToolsResult, ConnectorError> {
        Ok(ListToolsResult {
            tools: TOOLS.clone(),
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
    ) -> Result<CallToolResult, ConnectorError> {
        let name = request.name.as_ref();
        debug!(target: "connector.sra", tool = name, "call_tool");

        match name {
            SEARCH_CONTENT => {
                let args: SearchContentArgs = parse_args(name, request.arguments)?;
                let results = self.search_content(&args.search_phrase, args.limit).await?;
                let text = render_search_results(&results);
                structured_result_with_text(
                    &json!({ "search_phrase": args.search_phrase, "results": results }),
                    text,
                )
            }
            READ_CONTENT => {
                let args: ReadContentArgs = parse_args(name, request.arguments)?;
                let page = self
                    .read_content(&args.url, args.max_length, args.start_index)
                    .await?;
                let text = window::render(&page);
                structured_result_with_text(&page, Some(text))
            }
            RECOMMEND => {
                let args: RecommendArgs = parse_args(name, request.arguments)?;
                let results = self.recommend(&args.url, args.limit).await?;
                let text = render_recommendations(&results);
                structured_result_with_text(
                    &json!({ "url": args.url, "recommendations": results }),
                    text,
                )
            }
            other => Err(ConnectorError::ToolNotFound(other.to_string())),
        }
    }

    async fn get_auth_details(&self) -> Result<AuthDetails, ConnectorError> {
        let mut details = AuthDetails::new();
        if self.github.has_token().await {
            details.insert("token".to_string(), "********".to_string());
        }
        Ok(details)
    }

    async fn set_auth_details(&self, details: AuthDetails) -> Result<(), ConnectorError> {
        let token = details
            .get("token")
            .or_else(|| details.get("GITHUB_TOKEN"))
            .cloned();
        self.github.set_token(token).await;
        Ok(())
    }

    async fn test_auth(&self) -> Result<(), ConnectorError> {
        if self.github.has_token().await {
            Ok(())
        } else {
            Err(ConnectorError::Authentication(
                "GitHub token not configured".to_string(),
            ))
        }
    }

    fn config_schema(&self) -> ConnectorConfigSchema {
        ConnectorConfigSchema {
            fields: vec![Field {
                name: "token".to_string(),
                label: "GitHub Token".to_string(),
                field_type: FieldType::Secret,
                required: false,
                description: Some(
                    "Personal access token. Enables GitHub code search and raises rate limits."
                        .to_string(),
                ),
            }],
        }
    }
}
