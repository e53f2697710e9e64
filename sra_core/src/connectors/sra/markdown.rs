use crate::utils::strip_multiple_newlines;
use htmd::HtmlToMarkdown;
use scraper::{ElementRef, Html, Selector};

/// Main-content containers on AWS documentation pages, most specific first.
const CONTENT_SELECTORS: &[&str] = &[
    "main",
    "article",
    "#main-content",
    ".main-content",
    "#content",
    ".content",
    "div[role='main']",
    "#awsdocs-content",
    ".awsui-article",
];

/// Page chrome that survives inside the main container.
const NAV_SELECTORS: &[&str] = &[
    "noscript",
    ".prev-next",
    "#main-col-footer",
    ".awsdocs-page-utilities",
    "#quick-feedback-yes",
    "#quick-feedback-no",
    ".page-loading-indicator",
    "#tools-panel",
    ".doc-cookie-banner",
    "awsdocs-copyright",
    "awsdocs-thumb-feedback",
];

const TAGS_TO_STRIP: &[&str] = &[
    "script",
    "style",
    "noscript",
    "meta",
    "link",
    "footer",
    "nav",
    "aside",
    "header",
    "button",
    "awsdocs-cookie-consent-container",
    "awsdocs-feedback-container",
    "awsdocs-page-header",
    "awsdocs-page-header-container",
    "awsdocs-filter-selector",
    "awsdocs-breadcrumb-container",
    "awsdocs-page-footer",
    "awsdocs-page-footer-container",
    "awsdocs-footer",
];

/// Heuristic from response headers and the first bytes of the body.
pub fn is_html_content(page_raw: &str, content_type: &str) -> bool {
    let head: String = page_raw.chars().take(100).collect();
    head.to_ascii_lowercase().contains("<html")
        || content_type.contains("text/html")
        || content_type.is_empty()
}

fn main_element(html: &Html) -> ElementRef<'_> {
    for selector_str in CONTENT_SELECTORS.iter().chain(["body"].iter()) {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(element) = html.select(&selector).next() {
                return element;
            }
        }
    }
    html.root_element()
}

/// Serialized main container with navigation chrome cut out.
pub fn find_main_content(html: &Html) -> String {
    let main = main_element(html);
    let mut cleaned = main.html();
    for selector_str in NAV_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        for element in main.select(&selector) {
            cleaned = cleaned.replacen(&element.html(), "", 1);
        }
    }
    cleaned
}

pub fn html_to_markdown(html: &str) -> String {
    let converter = HtmlToMarkdown::builder()
        .skip_tags(TAGS_TO_STRIP.to_vec())
        .build();
    converter.convert(html).unwrap_or_else(|_| html.to_string())
}

/// Extract the documentation body of an HTML page as markdown.
pub fn extract_content_from_html(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }
    let document = Html::parse_document(html);
    let main = find_main_content(&document);
    strip_multiple_newlines(&html_to_markdown(&main))
}
