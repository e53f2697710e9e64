//! In-process stand-in for the AWS documentation and GitHub endpoints.
#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sra_core::connectors::sra::{RetryPolicy, SraConnector};
use sra_core::Config;

pub const WELCOME_URL: &str =
    "https://docs.aws.amazon.com/prescriptive-guidance/latest/security-reference-architecture/welcome.html";
pub const LONG_URL: &str = "https://docs.aws.amazon.com/prescriptive-guidance/latest/security-reference-architecture/long.html";

pub fn long_page_text() -> String {
    (0..400)
        .map(|i| format!("Paragraph {i:03} about centralized security tooling."))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Requests the mock has seen, as `METHOD path?query` plus selected headers.
#[derive(Clone, Default)]
pub struct Recorder {
    pub requests: Arc<Mutex<Vec<String>>>,
    pub auth_headers: Arc<Mutex<Vec<String>>>,
    pub session_headers: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    fn record(&self, line: String, headers: &HeaderMap) {
        self.requests.lock().unwrap().push(line);
        if let Some(v) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
            self.auth_headers.lock().unwrap().push(v.to_string());
        }
        if let Some(v) = headers.get("x-mcp-session-id").and_then(|v| v.to_str().ok()) {
            self.session_headers.lock().unwrap().push(v.to_string());
        }
    }

    pub fn saw(&self, needle: &str) -> bool {
        self.requests.lock().unwrap().iter().any(|r| r.contains(needle))
    }

    pub fn count(&self, needle: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.contains(needle))
            .count()
    }
}

pub struct MockServer {
    pub base: String,
    pub recorder: Recorder,
}

impl MockServer {
    pub async fn start() -> Self {
        let recorder = Recorder::default();
        let app = Router::new()
            .route("/search", post(docs_search))
            .route("/recommendations", get(recommendations))
            .route("/docs/*path", get(docs_page))
            .route("/web/*path", get(github_page))
            .route("/raw/*path", get(raw_file))
            .route("/api/search/issues", get(github_issue_search))
            .route("/api/search/code", get(github_code_search))
            .route("/api/repos/:owner/:repo/issues/:number", get(github_issue))
            .route(
                "/api/repos/:owner/:repo/issues/:number/comments",
                get(github_comments),
            )
            .route("/api/repos/:owner/:repo/pulls/:number", get(github_pull))
            .route(
                "/api/repos/:owner/:repo/pulls/:number/commits",
                get(github_pull_commits),
            )
            .route("/api/repos/:owner/:repo/commits/:sha", get(github_commit))
            .with_state(recorder.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            recorder,
        }
    }

    pub fn config(&self) -> Config {
        Config {
            search_api_url: format!("{}/search", self.base),
            recommendations_api_url: format!("{}/recommendations", self.base),
            github_api_url: format!("{}/api", self.base),
            github_raw_url: format!("{}/raw", self.base),
            docs_origin: format!("{}/docs", self.base),
            github_web_origin: format!("{}/web", self.base),
            http_timeout: Duration::from_secs(5),
            ..Config::default()
        }
    }

    pub fn connector(&self) -> SraConnector {
        SraConnector::with_retry(&self.config(), fast_retry()).unwrap()
    }

    pub fn connector_with_token(&self, token: &str) -> SraConnector {
        let config = Config {
            github_token: Some(token.to_string()),
            ..self.config()
        };
        SraConnector::with_retry(&config, fast_retry()).unwrap()
    }
}

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 5,
        base_delay: Duration::from_millis(5),
    }
}

fn line(method: &str, path: &str, query: &HashMap<String, String>) -> String {
    let mut pairs: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
    pairs.sort();
    format!("{method} {path}?{}", pairs.join("&"))
}

fn suggestion(i: usize, topic: &str) -> Value {
    json!({"textExcerptSuggestion": {
        "link": format!("https://docs.aws.amazon.com/prescriptive-guidance/latest/security-reference-architecture/{topic}-{i}.html"),
        "title": format!("{topic} page {i}"),
        "summary": format!("Summary of {topic} &amp; security {i}"),
    }})
}

async fn docs_search(
    State(rec): State<Recorder>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    rec.record(line("POST", "/search", &query), &headers);
    if !query.contains_key("session")
        || body["contextAttributes"][0]["value"] != "AWS Security Reference Architecture"
    {
        return StatusCode::BAD_REQUEST.into_response();
    }
    let input = body["textQuery"]["input"].as_str().unwrap_or_default();
    match input {
        "upstream down" => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        "garbled" => (StatusCode::OK, "<html>not json</html>").into_response(),
        "nothing" => Json(json!({"suggestions": []})).into_response(),
        _ => {
            let items: Vec<Value> = (1..=6).map(|i| suggestion(i, "logging")).collect();
            Json(json!({ "suggestions": items })).into_response()
        }
    }
}

async fn recommendations(
    State(rec): State<Recorder>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    rec.record(line("GET", "/recommendations", &query), &headers);
    let path = query.get("path").cloned().unwrap_or_default();
    if path.contains("empty") {
        return Json(json!({})).into_response();
    }
    if path.contains("broken") {
        return (StatusCode::OK, "not json").into_response();
    }
    if path.contains("error") {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    Json(json!({
        "highlyRated": {"items": [
            {"url": "https://docs.aws.amazon.com/ec2/latest/userguide/instance-types.html", "assetTitle": "Instance types", "abstract": "Choose compute"},
            {"url": "https://docs.aws.amazon.com/securityhub/latest/userguide/what-is-securityhub.html", "assetTitle": "What is Security Hub?", "abstract": "Security posture"}
        ]},
        "journey": {"items": [
            {"intent": "Set up", "urls": [
                {"url": "https://docs.aws.amazon.com/s3/latest/userguide/pricing.html", "assetTitle": "S3 pricing"}
            ]}
        ]},
        "new": {"items": [
            {"url": "https://docs.aws.amazon.com/guardduty/latest/ug/new.html", "assetTitle": "GuardDuty runtime monitoring", "dateCreated": "2024-05-01"}
        ]},
        "similar": {"items": [
            {"url": "https://docs.aws.amazon.com/lambda/latest/dg/welcome.html", "assetTitle": "Lambda"}
        ]}
    }))
    .into_response()
}

fn html_page(body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>SRA</title></head><body>\
<nav>Navigation links</nav><main><h1>AWS SRA</h1>{body}</main>\
<footer>Footer text</footer></body></html>"
    )
}

async fn docs_page(
    State(rec): State<Recorder>,
    Path(path): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    rec.record(line("GET", &format!("/docs/{path}"), &query), &headers);
    let html = |body: String| {
        (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            html_page(&body),
        )
            .into_response()
    };
    match path.as_str() {
        p if p.ends_with("welcome.html") => html(
            "<p>The AWS Security Reference Architecture is a holistic set of guidelines.</p>\
<h2>Security Tooling account</h2><p>Delegated administrator for Security Hub.</p>"
                .to_string(),
        ),
        p if p.ends_with("long.html") => html(format!("<p>{}</p>", long_page_text())),
        p if p.ends_with("guide.md") => (
            [(header::CONTENT_TYPE, "text/markdown")],
            "# Guide\n\nPlain markdown body.",
        )
            .into_response(),
        p if p.ends_with("policy.json") => (
            [(header::CONTENT_TYPE, "application/json")],
            "{\"Version\": \"2012-10-17\"}",
        )
            .into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn github_page(
    State(rec): State<Recorder>,
    Path(path): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    rec.record(line("GET", &format!("/web/{path}"), &query), &headers);
    (
        [(header::CONTENT_TYPE, "text/html")],
        html_page("<p>Rendered repository page</p>"),
    )
        .into_response()
}

async fn raw_file(
    State(rec): State<Recorder>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Response {
    rec.record(format!("GET /raw/{path}"), &headers);
    if path.ends_with("missing.py") {
        return StatusCode::NOT_FOUND.into_response();
    }
    if path.ends_with("README.md") {
        return "# SRA Verify\n\nSecurity checks.".into_response();
    }
    "def check():\n    return 'securityhub enabled'\n".into_response()
}

async fn github_issue_search(
    State(rec): State<Recorder>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    rec.record(line("GET", "/api/search/issues", &query), &headers);
    let q = query.get("q").cloned().unwrap_or_default();
    if q.contains("upstream down") {
        return StatusCode::FORBIDDEN.into_response();
    }
    let repo = q.split("repo:").nth(1).unwrap_or_default().to_string();
    let slug = repo.replace('/', "-");
    Json(json!({"items": [
        {
            "title": format!("Logging question {slug}"),
            "html_url": format!("https://github.com/{repo}/issues/11"),
            "body": "x".repeat(250),
        },
        {
            "title": format!("Add log archive {slug}"),
            "html_url": format!("https://github.com/{repo}/pull/12"),
            "body": "Short body",
            "pull_request": {"url": "https://api.github.com/pulls/12"}
        }
    ]}))
    .into_response()
}

async fn github_code_search(
    State(rec): State<Recorder>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    rec.record(line("GET", "/api/search/code", &query), &headers);
    if headers.get(header::AUTHORIZATION).is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let q = query.get("q").cloned().unwrap_or_default();
    let repo = q.split("repo:").nth(1).unwrap_or_default().to_string();
    Json(json!({"items": [
        {
            "name": "sra_logging.py",
            "path": "sraverify/checks/sra_logging.py",
            "html_url": format!("https://github.com/{repo}/blob/main/sraverify/checks/sra_logging.py"),
        }
    ]}))
    .into_response()
}

async fn github_issue(
    State(rec): State<Recorder>,
    Path((owner, repo, number)): Path<(String, String, u64)>,
    headers: HeaderMap,
) -> Response {
    rec.record(format!("GET /api/repos/{owner}/{repo}/issues/{number}"), &headers);
    if number == 404 {
        return StatusCode::NOT_FOUND.into_response();
    }
    let comments = if number == 1 { 0 } else { 2 };
    Json(json!({
        "title": "Test Issue Title",
        "body": "Test issue body content",
        "comments": comments,
    }))
    .into_response()
}

async fn github_comments(
    State(rec): State<Recorder>,
    Path((owner, repo, number)): Path<(String, String, u64)>,
    headers: HeaderMap,
) -> Json<Value> {
    rec.record(
        format!("GET /api/repos/{owner}/{repo}/issues/{number}/comments"),
        &headers,
    );
    Json(json!([
        {"user": {"login": "user1"}, "body": "Comment 1"},
        {"user": {"login": "user2"}, "body": "Comment 2"}
    ]))
}

async fn github_pull(
    State(rec): State<Recorder>,
    Path((owner, repo, number)): Path<(String, String, u64)>,
    headers: HeaderMap,
) -> Json<Value> {
    rec.record(format!("GET /api/repos/{owner}/{repo}/pulls/{number}"), &headers);
    Json(json!({
        "title": "Test PR Title",
        "body": "Test PR body content",
        "commits": 2,
        "comments": 0,
    }))
}

async fn github_pull_commits(
    State(rec): State<Recorder>,
    Path((owner, repo, number)): Path<(String, String, u64)>,
    headers: HeaderMap,
) -> Json<Value> {
    rec.record(
        format!("GET /api/repos/{owner}/{repo}/pulls/{number}/commits"),
        &headers,
    );
    Json(json!([
        {"sha": "aaaaaaa1111111"},
        {"sha": "bbbbbbb2222222"}
    ]))
}

async fn github_commit(
    State(rec): State<Recorder>,
    Path((owner, repo, sha)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Json<Value> {
    rec.record(format!("GET /api/repos/{owner}/{repo}/commits/{sha}"), &headers);
    if sha.starts_with("aaaa") {
        Json(json!({
            "sha": sha,
            "commit": {"message": "Enable org trail\n\nAdds CloudTrail"},
            "files": [
                {"filename": "trail.yaml", "status": "modified", "patch": "@@ -1 +1 @@\n-old\n+new"}
            ]
        }))
    } else {
        Json(json!({
            "sha": sha,
            "commit": {"message": "Empty merge"},
            "files": []
        }))
    }
}
