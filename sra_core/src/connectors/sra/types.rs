use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub rank_order: usize,
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Documentation,
    Markdown,
    GithubIssue,
    GithubPullRequest,
    Code,
}

impl ContentKind {
    pub fn label(&self) -> &'static str {
        match self {
            ContentKind::Documentation | ContentKind::Markdown => "Documentation",
            ContentKind::GithubIssue => "GitHub Issue",
            ContentKind::GithubPullRequest => "Pull Request",
            ContentKind::Code => "Code",
        }
    }
}

/// One page of converted content, counted in characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentWindow {
    pub url: String,
    pub kind: ContentKind,
    pub content: String,
    pub start_index: usize,
    pub total_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_start_index: Option<usize>,
}

// --- Tool arguments ---

fn default_limit() -> i64 {
    10
}

fn default_max_length() -> i64 {
    5000
}

/// Search AWS Security Reference Architecture documentation and the SRA GitHub repositories.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchContentArgs {
    /// Search phrase, e.g. "multi-account logging" or "Security Hub delegated admin".
    pub search_phrase: String,
    /// Maximum number of results to return (1-50).
    #[serde(default = "default_limit")]
    #[schemars(range(min = 1, max = 50))]
    pub limit: i64,
}

/// Fetch an SRA documentation page or GitHub resource as markdown.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadContentArgs {
    /// URL on docs.aws.amazon.com or github.com.
    pub url: String,
    /// Maximum number of characters to return.
    #[serde(default = "default_max_length")]
    #[schemars(range(min = 1, max = 999999))]
    pub max_length: i64,
    /// Character offset to start from; use the previous response's next_start_index to continue.
    #[serde(default)]
    #[schemars(range(min = 0))]
    pub start_index: i64,
}

/// Recommend documentation pages related to a docs.aws.amazon.com URL.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RecommendArgs {
    /// Documentation page URL to get recommendations for.
    pub url: String,
    /// Maximum number of results to return (1-50).
    #[serde(default = "default_limit")]
    #[schemars(range(min = 1, max = 50))]
    pub limit: i64,
}
