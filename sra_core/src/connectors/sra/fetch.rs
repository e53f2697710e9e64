use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, warn};
use url::Url;

use super::github::GitHubClient;
use super::markdown::{extract_content_from_html, is_html_content};
use super::types::{ContentKind, ContentWindow};
use super::validate;
use super::window::char_window;
use crate::config::Config;
use crate::error::ConnectorError;
use crate::utils::{ensure_success, with_session, SESSION_HEADER};

const SERVICE: &str = "documentation page";
const GITHUB_HOST: &str = "github.com";

/// How a readable URL is turned into markdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    HtmlPage,
    MarkdownFile,
    Issue {
        owner: String,
        repo: String,
        number: u64,
    },
    PullRequest {
        owner: String,
        repo: String,
        number: u64,
    },
    /// Repository content. `blob` holds `(ref, path)` for
    /// `github.com/<owner>/<repo>/blob/<ref>/<path>`; other pages are read as HTML.
    Code {
        owner: String,
        repo: String,
        blob: Option<(String, String)>,
    },
    Other,
}

static GITHUB_ITEM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/(?P<owner>[^/]+)/(?P<repo>[^/]+)/(?P<kind>issues|pull)/(?P<number>[0-9]+)(?:/|$)")
        .expect("valid GitHub item pattern")
});

static GITHUB_BLOB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/(?P<owner>[^/]+)/(?P<repo>[^/]+)/blob/(?P<reference>[^/]+)/(?P<path>.*[^/])$")
        .expect("valid GitHub blob pattern")
});

static GITHUB_REPO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/(?P<owner>[^/]+)/(?P<repo>[^/]+)").expect("valid GitHub repo pattern")
});

fn github_route(path: &str) -> Route {
    if let Some(caps) = GITHUB_ITEM_RE.captures(path) {
        if let Ok(number) = caps["number"].parse() {
            let (owner, repo) = (caps["owner"].to_string(), caps["repo"].to_string());
            return if &caps["kind"] == "issues" {
                Route::Issue { owner, repo, number }
            } else {
                Route::PullRequest { owner, repo, number }
            };
        }
    }
    if let Some(caps) = GITHUB_BLOB_RE.captures(path) {
        return Route::Code {
            owner: caps["owner"].to_string(),
            repo: caps["repo"].to_string(),
            blob: Some((caps["reference"].to_string(), caps["path"].to_string())),
        };
    }
    match GITHUB_REPO_RE.captures(path) {
        Some(caps) => Route::Code {
            owner: caps["owner"].to_string(),
            repo: caps["repo"].to_string(),
            blob: None,
        },
        None => Route::Other,
    }
}

pub fn route(url: &Url) -> Route {
    let path = url.path();
    if url.host_str() == Some(GITHUB_HOST) {
        github_route(path)
    } else if path.ends_with(".html") {
        Route::HtmlPage
    } else if path.ends_with(".md") {
        Route::MarkdownFile
    } else {
        Route::Other
    }
}

fn fence(code: &str) -> String {
    format!("```\n{}\n```", code.trim_end_matches('\n'))
}

/// Reads documentation pages and GitHub resources as markdown.
#[derive(Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
    session_id: String,
    docs_origin: String,
    github_web_origin: String,
    github: GitHubClient,
}

impl PageFetcher {
    pub fn new(
        client: reqwest::Client,
        config: &Config,
        session_id: impl Into<String>,
        github: GitHubClient,
    ) -> Self {
        Self {
            client,
            session_id: session_id.into(),
            docs_origin: config.docs_origin.clone(),
            github_web_origin: config.github_web_origin.clone(),
            github,
        }
    }

    /// Map a public URL onto the configured origin for its host.
    fn resolve(&self, url: &Url) -> Result<Url, ConnectorError> {
        let origin = if url.host_str() == Some(GITHUB_HOST) {
            &self.github_web_origin
        } else {
            &self.docs_origin
        };
        let mut target = format!("{}{}", origin, url.path());
        if let Some(query) = url.query() {
            target.push('?');
            target.push_str(query);
        }
        with_session(&target, &self.session_id)
    }

    async fn fetch_page(&self, url: &Url) -> Result<(String, String), ConnectorError> {
        let target = self.resolve(url)?;
        debug!(target: "connector.sra.fetch", url = %url, "fetching page");
        let response = self
            .client
            .get(target)
            .header(SESSION_HEADER, &self.session_id)
            .send()
            .await?;
        let response = ensure_success(response, SERVICE)?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.text().await?;
        Ok((body, content_type))
    }

    async fn read_html(&self, url: &Url) -> Result<String, ConnectorError> {
        let (body, content_type) = self.fetch_page(url).await?;
        if is_html_content(&body, &content_type) {
            Ok(extract_content_from_html(&body))
        } else {
            Ok(body)
        }
    }

    /// Full converted document for a validated URL.
    pub async fn read_document(&self, url: &Url) -> Result<(ContentKind, String), ConnectorError> {
        match route(url) {
            Route::HtmlPage => Ok((ContentKind::Documentation, self.read_html(url).await?)),
            Route::MarkdownFile => {
                let (body, _) = self.fetch_page(url).await?;
                Ok((ContentKind::Markdown, body))
            }
            Route::Issue { owner, repo, number } => Ok((
                ContentKind::GithubIssue,
                self.github.issue_markdown(&owner, &repo, number).await?,
            )),
            Route::PullRequest { owner, repo, number } => Ok((
                ContentKind::GithubPullRequest,
                self.github.pull_request_markdown(&owner, &repo, number).await?,
            )),
            Route::Code { owner, repo, blob } => {
                if let Some((reference, path)) = blob {
                    match self.github.raw_file(&owner, &repo, &reference, &path).await {
                        Ok(code) if path.ends_with(".md") => return Ok((ContentKind::Markdown, code)),
                        Ok(code) => return Ok((ContentKind::Code, fence(&code))),
                        Err(e) => warn!(
                            target: "connector.sra.fetch",
                            url = %url,
                            error = %e,
                            "raw fetch failed, reading the page instead"
                        ),
                    }
                }
                Ok((ContentKind::Code, self.read_html(url).await?))
            }
            Route::Other => {
                let (body, content_type) = self.fetch_page(url).await?;
                if is_html_content(&body, &content_type) {
                    Ok((ContentKind::Documentation, extract_content_from_html(&body)))
                } else {
                    Ok((ContentKind::Code, fence(&body)))
                }
            }
        }
    }

    pub async fn read(
        &self,
        url: &str,
        max_length: i64,
        start_index: i64,
    ) -> Result<ContentWindow, ConnectorError> {
        let parsed = validate::readable_url(url)?;
        let (max_length, start_index) = validate::window(max_length, start_index)?;
        let (kind, content) = self.read_document(&parsed).await?;
        let window = char_window(url.trim(), kind, &content, start_index, max_length);
        if let Some(next) = window.next_start_index {
            debug!(
                target: "connector.sra.fetch",
                %url,
                next,
                total = window.total_length,
                "content truncated"
            );
        }
        Ok(window)
    }
}
