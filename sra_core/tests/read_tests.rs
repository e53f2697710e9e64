mod common;

use common::{long_page_text, MockServer, LONG_URL, WELCOME_URL};
use sra_core::connectors::sra::ContentKind;

#[tokio::test]
async fn test_read_documentation_page_as_markdown() {
    let server = MockServer::start().await;
    let connector = server.connector();

    let page = connector.read_content(WELCOME_URL, 5000, 0).await.unwrap();

    assert_eq!(page.kind, ContentKind::Documentation);
    assert_eq!(page.url, WELCOME_URL);
    assert!(page.content.contains("# AWS SRA"));
    assert!(page.content.contains("Security Tooling account"));
    assert!(!page.content.contains("Navigation links"));
    assert!(!page.content.contains("Footer text"));
    assert_eq!(page.next_start_index, None);
    assert!(server.recorder.saw(&format!(
        "GET /docs/prescriptive-guidance/latest/security-reference-architecture/welcome.html?session={}",
        connector.session_id()
    )));
}

#[tokio::test]
async fn test_long_page_is_read_in_windows() {
    let server = MockServer::start().await;
    let connector = server.connector();

    let first = connector.read_content(LONG_URL, 5000, 0).await.unwrap();
    assert_eq!(first.content.chars().count(), 5000);
    assert_eq!(first.next_start_index, Some(5000));
    assert!(first.total_length > 5000);

    let mut full = first.content.clone();
    let mut next = first.next_start_index;
    while let Some(start) = next {
        let page = connector
            .read_content(LONG_URL, 5000, start as i64)
            .await
            .unwrap();
        assert!(page.content.chars().count() <= 5000);
        assert_eq!(page.start_index, start);
        full.push_str(&page.content);
        next = page.next_start_index;
    }
    assert_eq!(full.chars().count(), first.total_length);
    assert!(full.contains(&long_page_text()[..200]));
    assert!(full.contains("Paragraph 399"));
}

#[tokio::test]
async fn test_reading_past_the_end_is_empty() {
    let server = MockServer::start().await;
    let connector = server.connector();

    let whole = connector.read_content(WELCOME_URL, 5000, 0).await.unwrap();
    let past = connector
        .read_content(WELCOME_URL, 5000, whole.total_length as i64 + 10)
        .await
        .unwrap();
    assert_eq!(past.content, "");
    assert_eq!(past.next_start_index, None);
    assert_eq!(past.total_length, whole.total_length);
}

#[tokio::test]
async fn test_missing_page_is_a_request_error() {
    let server = MockServer::start().await;
    let connector = server.connector();

    let err = connector
        .read_content("https://docs.aws.amazon.com/missing/page.html", 5000, 0)
        .await
        .unwrap_err();
    assert!(err.is_request(), "unexpected error: {err}");
}

#[tokio::test]
async fn test_read_rejects_other_hosts_and_bad_windows() {
    let server = MockServer::start().await;
    let connector = server.connector();

    for url in [
        "https://example.com/page.html",
        "https://docs.aws.amazon.com.evil.example/page.html",
        "not a url",
    ] {
        let err = connector.read_content(url, 5000, 0).await.unwrap_err();
        assert!(err.is_validation(), "{url} gave {err}");
    }
    assert!(connector
        .read_content(WELCOME_URL, 0, 0)
        .await
        .unwrap_err()
        .is_validation());
    assert!(connector
        .read_content(WELCOME_URL, 5000, -1)
        .await
        .unwrap_err()
        .is_validation());
    assert!(server.recorder.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_markdown_and_plain_files() {
    let server = MockServer::start().await;
    let connector = server.connector();

    let md = connector
        .read_content("https://docs.aws.amazon.com/sra/guide.md", 5000, 0)
        .await
        .unwrap();
    assert_eq!(md.kind, ContentKind::Markdown);
    assert_eq!(md.content, "# Guide\n\nPlain markdown body.");

    let json = connector
        .read_content("https://docs.aws.amazon.com/iam/policy.json", 5000, 0)
        .await
        .unwrap();
    assert_eq!(json.kind, ContentKind::Code);
    assert_eq!(json.content, "```\n{\"Version\": \"2012-10-17\"}\n```");
}

#[tokio::test]
async fn test_github_issue_with_comments() {
    let server = MockServer::start().await;
    let connector = server.connector();

    let page = connector
        .read_content("https://github.com/awslabs/sra-verify/issues/5", 5000, 0)
        .await
        .unwrap();

    assert_eq!(page.kind, ContentKind::GithubIssue);
    assert_eq!(
        page.content,
        "# Test Issue Title\n\nTest issue body content\n\n## Comments\n\nuser1: Comment 1\n\nuser2: Comment 2"
    );
}

#[tokio::test]
async fn test_github_issue_without_comments_skips_comment_fetch() {
    let server = MockServer::start().await;
    let connector = server.connector();

    let page = connector
        .read_content("https://github.com/awslabs/sra-verify/issues/1", 5000, 0)
        .await
        .unwrap();

    assert_eq!(page.content, "# Test Issue Title\n\nTest issue body content");
    assert!(!server.recorder.saw("/comments"));
}

#[tokio::test]
async fn test_missing_github_issue_is_a_request_error() {
    let server = MockServer::start().await;
    let connector = server.connector();

    let err = connector
        .read_content("https://github.com/awslabs/sra-verify/issues/404", 5000, 0)
        .await
        .unwrap_err();
    assert!(err.is_request(), "unexpected error: {err}");
}

#[tokio::test]
async fn test_github_pull_request_lists_commits_and_diffs() {
    let server = MockServer::start().await;
    let connector = server.connector();

    let page = connector
        .read_content(
            "https://github.com/aws-samples/aws-security-reference-architecture-examples/pull/7",
            5000,
            0,
        )
        .await
        .unwrap();

    assert_eq!(page.kind, ContentKind::GithubPullRequest);
    let content = &page.content;
    assert!(content.starts_with("# Test PR Title\n\nTest PR body content"));
    assert!(content.contains("## Commits"));
    assert!(content.contains("### aaaaaaa\n\nEnable org trail"));
    assert!(content.contains("- `trail.yaml` (modified)"));
    assert!(content.contains("```diff\n@@ -1 +1 @@\n-old\n+new\n```"));
    assert!(content.contains("### bbbbbbb\n\nEmpty merge\n\nNo files were changed"));
    assert!(!content.contains("## Comments"));
}

#[tokio::test]
async fn test_github_blob_is_read_raw() {
    let server = MockServer::start().await;
    let connector = server.connector();

    let code = connector
        .read_content(
            "https://github.com/awslabs/sra-verify/blob/main/sraverify/checks/sra_securityhub.py",
            5000,
            0,
        )
        .await
        .unwrap();
    assert_eq!(code.kind, ContentKind::Code);
    assert_eq!(
        code.content,
        "```\ndef check():\n    return 'securityhub enabled'\n```"
    );
    assert!(server
        .recorder
        .saw("GET /raw/awslabs/sra-verify/main/sraverify/checks/sra_securityhub.py"));

    let readme = connector
        .read_content("https://github.com/awslabs/sra-verify/blob/main/README.md", 5000, 0)
        .await
        .unwrap();
    assert_eq!(readme.kind, ContentKind::Markdown);
    assert_eq!(readme.content, "# SRA Verify\n\nSecurity checks.");
}

#[tokio::test]
async fn test_github_blob_falls_back_to_the_page() {
    let server = MockServer::start().await;
    let connector = server.connector();

    let page = connector
        .read_content(
            "https://github.com/awslabs/sra-verify/blob/main/missing.py",
            5000,
            0,
        )
        .await
        .unwrap();
    assert_eq!(page.kind, ContentKind::Code);
    assert!(page.content.contains("Rendered repository page"));
    assert!(server
        .recorder
        .saw("GET /web/awslabs/sra-verify/blob/main/missing.py"));
}

#[tokio::test]
async fn test_github_repository_page_is_read_as_html() {
    let server = MockServer::start().await;
    let connector = server.connector();

    let page = connector
        .read_content("https://github.com/awslabs/sra-verify", 5000, 0)
        .await
        .unwrap();
    assert_eq!(page.kind, ContentKind::Code);
    assert!(page.content.contains("Rendered repository page"));
    assert!(!server.recorder.saw("/raw/"));
}
