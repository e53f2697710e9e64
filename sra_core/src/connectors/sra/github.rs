use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::types::SearchResult;
use crate::config::Config;
use crate::error::ConnectorError;
use crate::utils::{ensure_success, truncate_chars};

const SERVICE: &str = "GitHub";
const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const EXCERPT_CHARS: usize = 200;

/// Transport-level retry for GitHub calls. Status errors are returned as-is.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

#[derive(Debug, Deserialize)]
struct SearchPage<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct CodeItem {
    #[serde(default)]
    name: String,
    #[serde(default)]
    path: String,
    #[serde(default)]
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct IssueItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    html_url: String,
    body: Option<String>,
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Issue {
    #[serde(default)]
    title: String,
    body: Option<String>,
    #[serde(default)]
    comments: u64,
}

#[derive(Debug, Deserialize)]
struct PullRequest {
    #[serde(default)]
    title: String,
    body: Option<String>,
    #[serde(default)]
    commits: u64,
    #[serde(default)]
    comments: u64,
}

#[derive(Debug, Deserialize)]
struct Comment {
    user: Option<User>,
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct User {
    login: String,
}

#[derive(Debug, Deserialize)]
struct CommitRef {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    sha: String,
    commit: CommitMessage,
    #[serde(default)]
    files: Vec<CommitFile>,
}

#[derive(Debug, Deserialize)]
struct CommitMessage {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct CommitFile {
    filename: String,
    #[serde(default)]
    status: String,
    patch: Option<String>,
}

/// REST client for the SRA GitHub repositories.
#[derive(Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    api_url: String,
    raw_url: String,
    repositories: Vec<String>,
    token: Arc<RwLock<Option<String>>>,
    retry: RetryPolicy,
}

impl GitHubClient {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            api_url: config.github_api_url.clone(),
            raw_url: config.github_raw_url.clone(),
            repositories: config.repositories.clone(),
            token: Arc::new(RwLock::new(config.github_token.clone())),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token.filter(|t| !t.trim().is_empty());
    }

    pub async fn has_token(&self) -> bool {
        self.token.read().await.is_some()
    }

    async fn send_with_retry(
        &self,
        url: &str,
        query: &[(&str, String)],
        accept: &str,
    ) -> Result<reqwest::Response, ConnectorError> {
        let token = self.token.read().await.clone();
        let mut attempt = 0;
        loop {
            let mut request = self.client.get(url).query(query).header(ACCEPT, accept);
            if let Some(token) = &token {
                request = request.header(AUTHORIZATION, format!("Bearer {token}"));
            }
            match request.send().await {
                Ok(response) => return ensure_success(response, SERVICE),
                Err(e) if (e.is_connect() || e.is_timeout()) && attempt + 1 < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        target: "connector.sra.github",
                        %url,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying GitHub request"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(ConnectorError::HttpRequest(e)),
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ConnectorError> {
        let url = format!("{}{}", self.api_url, path);
        let response = self.send_with_retry(&url, query, GITHUB_ACCEPT).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ConnectorError::MalformedResponse {
            service: SERVICE,
            message: e.to_string(),
        })
    }

    /// Code (token only) and issue search across the SRA repositories.
    /// The limit is split across repositories and hits are interleaved by
    /// their rank within each repository. Individual query failures are
    /// logged and skipped.
    pub async fn search(
        &self,
        phrase: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>, ConnectorError> {
        if limit == 0 || self.repositories.is_empty() {
            return Ok(Vec::new());
        }
        let with_code = self.has_token().await;
        let per_repo = limit.div_ceil(self.repositories.len());
        let mut per_repo_hits = Vec::with_capacity(self.repositories.len());

        for repo in &self.repositories {
            let query = vec![
                ("q", format!("{phrase} repo:{repo}")),
                ("per_page", per_repo.to_string()),
            ];
            let mut hits: Vec<(String, String, Option<String>)> = Vec::new();

            if with_code {
                match self.get_json::<SearchPage<CodeItem>>("/search/code", &query).await {
                    Ok(page) => hits.extend(page.items.into_iter().map(|item| {
                        (
                            item.html_url,
                            format!("[Code] {} - {}", item.name, repo),
                            Some(item.path).filter(|p| !p.is_empty()),
                        )
                    })),
                    Err(e) => {
                        warn!(target: "connector.sra.github", %repo, error = %e, "code search failed")
                    }
                }
            }

            match self.get_json::<SearchPage<IssueItem>>("/search/issues", &query).await {
                Ok(page) => hits.extend(page.items.into_iter().map(|item| {
                    let tag = if item.pull_request.is_some() { "[PR]" } else { "[Issue]" };
                    (
                        item.html_url,
                        format!("{tag} {} - {}", item.title, repo),
                        item.body
                            .filter(|b| !b.trim().is_empty())
                            .map(|b| truncate_chars(&b, EXCERPT_CHARS)),
                    )
                })),
                Err(e) => {
                    warn!(target: "connector.sra.github", %repo, error = %e, "issue search failed")
                }
            }

            hits.retain(|(url, _, _)| !url.is_empty());
            per_repo_hits.push(hits);
        }

        let results: Vec<SearchResult> = interleave(per_repo_hits)
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(i, (url, title, excerpt))| SearchResult {
                rank_order: i + 1,
                title,
                url,
                excerpt,
            })
            .collect();
        debug!(target: "connector.sra.github", phrase, count = results.len(), with_code, "github search done");
        Ok(results)
    }

    async fn comments_markdown(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<String, ConnectorError> {
        let comments: Vec<Comment> = self
            .get_json(&format!("/repos/{owner}/{repo}/issues/{number}/comments"), &[])
            .await?;
        let mut out = String::from("\n\n## Comments\n\n");
        for comment in comments {
            let login = comment.user.map(|u| u.login).unwrap_or_else(|| "unknown".to_string());
            out.push_str(&format!("{}: {}\n\n", login, comment.body.unwrap_or_default()));
        }
        Ok(out)
    }

    pub async fn issue_markdown(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<String, ConnectorError> {
        let issue: Issue = self
            .get_json(&format!("/repos/{owner}/{repo}/issues/{number}"), &[])
            .await?;
        let mut out = format!("# {}\n\n{}", issue.title, issue.body.unwrap_or_default());
        if issue.comments > 0 {
            out.push_str(&self.comments_markdown(owner, repo, number).await?);
        }
        Ok(out.trim_end().to_string())
    }

    async fn commits_markdown(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<String, ConnectorError> {
        let commits: Vec<CommitRef> = self
            .get_json(&format!("/repos/{owner}/{repo}/pulls/{number}/commits"), &[])
            .await?;
        let mut out = String::from("\n\n## Commits\n\n");
        for commit in commits {
            let detail: CommitDetail = self
                .get_json(&format!("/repos/{owner}/{repo}/commits/{}", commit.sha), &[])
                .await?;
            let short: String = detail.sha.chars().take(7).collect();
            out.push_str(&format!("### {short}\n\n{}\n\n", detail.commit.message.trim()));
            if detail.files.is_empty() {
                out.push_str("No files were changed\n\n");
                continue;
            }
            for file in detail.files {
                out.push_str(&format!("- `{}` ({})\n", file.filename, file.status));
                if let Some(patch) = file.patch.filter(|p| !p.is_empty()) {
                    out.push_str(&format!("\n```diff\n{patch}\n```\n"));
                }
            }
            out.push('\n');
        }
        Ok(out)
    }

    pub async fn pull_request_markdown(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<String, ConnectorError> {
        let pr: PullRequest = self
            .get_json(&format!("/repos/{owner}/{repo}/pulls/{number}"), &[])
            .await?;
        let mut out = format!("# {}\n\n{}", pr.title, pr.body.unwrap_or_default());
        if pr.commits > 0 {
            out.push_str(&self.commits_markdown(owner, repo, number).await?);
        }
        if pr.comments > 0 {
            out.push_str(&self.comments_markdown(owner, repo, number).await?);
        }
        Ok(out.trim_end().to_string())
    }

    /// Raw file contents for `owner/repo` at `reference`.
    pub async fn raw_file(
        &self,
        owner: &str,
        repo: &str,
        reference: &str,
        path: &str,
    ) -> Result<String, ConnectorError> {
        let url = format!("{}/{owner}/{repo}/{reference}/{path}", self.raw_url);
        let response = self.send_with_retry(&url, &[], "*/*").await?;
        Ok(response.text().await?)
    }
}

/// Round-robin over the lists: every first entry, then every second, and so on.
fn interleave<T>(lists: Vec<Vec<T>>) -> Vec<T> {
    let mut iters: Vec<_> = lists.into_iter().map(Vec::into_iter).collect();
    let mut out = Vec::new();
    loop {
        let before = out.len();
        for iter in iters.iter_mut() {
            out.extend(iter.next());
        }
        if out.len() == before {
            return out;
        }
    }
}
